//! Forget command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::App;
use anyhow::Result;

/// Delete a video's chunk set.
pub async fn run_forget(video_id: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Browse)?;
    let app = App::new(settings)?;

    if app.store().delete(video_id.trim()).await? {
        Output::success(&format!("Forgot video {}", video_id));
    } else {
        Output::warning(&format!("No chunks stored for video {}", video_id));
    }

    Ok(())
}
