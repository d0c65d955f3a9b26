//! CLI output formatting utilities.

use crate::chunk_store::VideoSummary;
use crate::rag::ScoredChunk;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::sync::OnceLock;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a stored video.
    pub fn video_info(video: &VideoSummary) {
        println!(
            "  {} {} ({} chunks, {} dims, {})",
            style("*").cyan(),
            style(&video.video_id).bold(),
            video.chunk_count,
            video.dimensions,
            style(video.ingested_at.format("%Y-%m-%d %H:%M")).dim()
        );
    }

    /// Print an answer with its citations highlighted.
    pub fn answer(label: &str, content: &str) {
        println!("\n{} {}\n", style(label).cyan().bold(), highlight_citations(content));
    }

    /// Print a retrieved chunk with a link to its moment in the video.
    pub fn source(video_id: &str, source: &ScoredChunk) {
        println!(
            "\n{} [{}] (score: {:.2})",
            style(">>").green(),
            style(source.chunk.timestamp).cyan(),
            source.score
        );
        println!("   {}", content_preview(&source.chunk.text, 200));
        println!("   {}", style(source.chunk.timestamp.seek_url(video_id)).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

fn citation_markup() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[\d{2,}:\d{2}\]").expect("citation regex is valid"))
}

/// Render `[MM:SS]` citations in a distinct style.
fn highlight_citations(content: &str) -> String {
    citation_markup()
        .replace_all(content, |caps: &regex::Captures| style(&caps[0]).cyan().bold().to_string())
        .into_owned()
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("abcdef", 3), "abc...");
        assert_eq!(content_preview("ééééé", 2), "éé...");
    }

    #[test]
    fn test_highlight_keeps_text() {
        console::set_colors_enabled(false);
        assert_eq!(highlight_citations("see [01:30] now"), "see [01:30] now");
    }
}
