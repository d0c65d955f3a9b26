//! Scrub - Chat with a video
//!
//! Ingest a video once, then ask questions about it. Answers are grounded in
//! the video's own timestamped chunks and cite them as `[MM:SS]`, so every
//! claim links back to a moment you can seek to.
//!
//! # Architecture
//!
//! - `chunk_store` - Durable per-video chunk sets (SQLite or memory)
//! - `media` - Media-understanding service that chunks and embeds a video
//! - `ingest` - Idempotent ingestion coordinator
//! - `embedding` - Question embedding
//! - `llm` - Answer generation
//! - `rag` - Retrieval, grounding checks and chat sessions
//! - `app` - Wiring of all of the above from configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use scrub::app::App;
//! use scrub::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::new(Settings::load()?)?;
//!
//!     let mut session = app.session("dQw4w9WgXcQ");
//!     session.start().await?;
//!
//!     let reply = session.ask("What is the chorus about?").await?;
//!     println!("{}", reply.turn.content());
//!
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod chunk_store;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod media;
pub mod openai;
pub mod rag;
pub mod timestamp;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use error::{Result, ScrubError};
