//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::ingest::IngestOutcome;
use crate::App;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::info;

/// Ingest every video, at most `concurrency` at a time.
pub async fn run_ingest(video_ids: &[String], concurrency: usize, settings: Settings) -> Result<()> {
    preflight::check(Operation::Ingest)?;
    let app = App::new(settings)?;
    let ingestor = app.ingestor();

    let spinner = Output::spinner(&format!("Ingesting {} video(s)...", video_ids.len()));

    let results: Vec<_> = stream::iter(video_ids.iter().cloned())
        .map(|video_id| {
            let ingestor = ingestor.clone();
            async move {
                let result = ingestor.ingest(&video_id).await;
                (video_id, result)
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    spinner.finish_and_clear();

    let mut failed = 0;
    for (video_id, result) in &results {
        match result {
            Ok(IngestOutcome::Created(set)) => {
                Output::success(&format!("Ingested {} ({} chunks)", video_id, set.len()));
            }
            Ok(IngestOutcome::Existing(set)) => {
                Output::info(&format!("Already ingested {} ({} chunks)", video_id, set.len()));
            }
            Err(e) => {
                failed += 1;
                Output::error(&format!("{}: {}", video_id, e));
            }
        }
    }

    info!("Ingested {} of {} videos", results.len() - failed, results.len());

    if failed > 0 {
        anyhow::bail!("{} of {} videos failed to ingest", failed, results.len());
    }

    Ok(())
}
