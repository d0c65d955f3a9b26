//! Media-understanding service boundary.
//!
//! The service watches a video and returns timestamped summaries, each
//! already embedded. Scrub never looks at the video itself.

mod http;

pub use http::HttpMediaService;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One chunk as returned by the media service, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChunk {
    /// Offset of this chunk in milliseconds.
    pub timestamp_ms: u64,
    /// Summary of what happens in this window.
    pub summary: String,
    /// Embedding values. Some services send these as strings.
    pub embedding: Vec<serde_json::Value>,
}

/// Result of analyzing one video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaAnalysis {
    /// Chunks in video order.
    pub chunks: Vec<RawChunk>,
    /// Model used for the chunk embeddings, when reported.
    #[serde(default)]
    pub embedding_model: Option<String>,
}

/// Trait for media-understanding backends.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Transcribe, chunk and embed a video.
    ///
    /// Any failure is reported as [`crate::ScrubError::Ingestion`].
    async fn analyze(&self, video_id: &str) -> Result<MediaAnalysis>;
}
