//! List command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::App;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    preflight::check(Operation::Browse)?;
    let app = App::new(settings)?;

    let videos = match app.store().list().await {
        Ok(videos) => videos,
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    };

    if videos.is_empty() {
        Output::info("No videos ingested yet. Use 'scrub ingest <video_id>' to add one.");
        return Ok(());
    }

    Output::header(&format!("Ingested Videos ({})", videos.len()));
    println!();

    for video in &videos {
        Output::video_info(video);
    }

    let total_chunks: usize = videos.iter().map(|v| v.chunk_count).sum();
    println!();
    Output::kv("Total videos", &videos.len().to_string());
    Output::kv("Total chunks", &total_chunks.to_string());

    Ok(())
}
