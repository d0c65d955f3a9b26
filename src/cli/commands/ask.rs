//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::Reply;
use crate::App;
use anyhow::Result;

/// Run the ask command: ingest if needed, then answer one question.
pub async fn run_ask(video_id: &str, question: &str, top_k: Option<usize>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(k) = top_k {
        settings.retrieval.top_k = k;
    }

    let app = App::new(settings)?;
    let mut session = app.session(video_id);

    let spinner = Output::spinner("Preparing video...");
    let started = session.start().await;
    spinner.finish_and_clear();
    started?;

    let spinner = Output::spinner("Thinking...");
    let reply = session.ask(question).await;
    spinner.finish_and_clear();

    print_reply(session.video_id(), &reply?);
    Ok(())
}

/// Print an answer, its sources, and any unbacked citations.
pub(super) fn print_reply(video_id: &str, reply: &Reply) {
    Output::answer("Answer:", reply.turn.content());

    if !reply.grounding.is_grounded() {
        let missing: Vec<String> = reply.grounding.ungrounded.iter().map(|t| format!("[{}]", t)).collect();
        Output::warning(&format!("Cited but not retrieved: {}", missing.join(", ")));
    }

    if !reply.sources.is_empty() {
        Output::header("Sources");
        for source in &reply.sources {
            Output::source(video_id, source);
        }
        println!();
    }
}
