//! Interactive chat about a single video.

use super::ask::print_reply;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::ingest::IngestOutcome;
use crate::rag::COULD_NOT_ANSWER;
use crate::App;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(video_id: &str, model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.chat.model = model;
    }

    let app = App::new(settings)?;
    let mut session = app.session(video_id);

    let spinner = Output::spinner("Preparing video...");
    let started = session.start().await;
    spinner.finish_and_clear();

    match started {
        Ok(IngestOutcome::Created(set)) => {
            Output::success(&format!("Ingested {} ({} chunks)", video_id, set.len()));
        }
        Ok(IngestOutcome::Existing(set)) => {
            Output::info(&format!("Loaded {} ({} chunks)", video_id, set.len()));
        }
        Err(e) => {
            Output::error(&format!("Could not prepare video: {}", e));
            return Err(e.into());
        }
    }

    println!("\n{}", style(format!("Scrub Chat: {}", video_id)).bold().cyan());
    println!("{}\n", style("Type your questions, or 'exit' to quit.").dim());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let reply = session.ask(input).await;
        spinner.finish_and_clear();

        match reply {
            Ok(reply) => print_reply(video_id, &reply),
            Err(e) => {
                Output::answer("Scrub:", COULD_NOT_ANSWER);
                Output::error(&format!("{}", e));
            }
        }
    }

    Ok(())
}
