//! Durable storage of per-video chunk sets.
//!
//! A video has at most one chunk set. Sets are written once and never
//! updated in place; a second `put` for the same video is a conflict.

mod codec;
mod memory;
mod sqlite;

pub use codec::{decode_vector, encode_vector};
pub use memory::MemoryChunkStore;
pub use sqlite::SqliteChunkStore;

use crate::error::{Result, ScrubError};
use crate::timestamp::Timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped, embedded unit of video content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Offset into the video.
    pub timestamp: Timestamp,
    /// Summary or transcript text for this window.
    pub text: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(timestamp: Timestamp, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            timestamp,
            text: text.into(),
            embedding,
        }
    }
}

/// All chunks for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoChunkSet {
    /// External video identifier.
    pub video_id: String,
    /// Chunks in video order.
    pub chunks: Vec<Chunk>,
    /// Name of the model that produced the embeddings, when known.
    pub embedding_model: Option<String>,
    /// When this set was ingested.
    pub ingested_at: DateTime<Utc>,
}

impl VideoChunkSet {
    /// Create a new chunk set stamped with the current time.
    pub fn new(video_id: impl Into<String>, chunks: Vec<Chunk>, embedding_model: Option<String>) -> Self {
        Self {
            video_id: video_id.into(),
            chunks,
            embedding_model,
            ingested_at: Utc::now(),
        }
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the set has no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Dimensionality shared by every chunk embedding.
    ///
    /// Returns `None` for an empty set and fails if chunks disagree.
    pub fn dimensions(&self) -> Result<Option<usize>> {
        let mut chunks = self.chunks.iter();
        let Some(first) = chunks.next() else {
            return Ok(None);
        };

        let dims = first.embedding.len();
        if let Some(other) = chunks.find(|c| c.embedding.len() != dims) {
            return Err(ScrubError::EmbeddingSpace(format!(
                "video {} mixes {}-dimensional and {}-dimensional embeddings (chunk at {})",
                self.video_id,
                dims,
                other.embedding.len(),
                other.timestamp
            )));
        }

        Ok(Some(dims))
    }

    /// Summary view of this set.
    pub fn summary(&self) -> VideoSummary {
        VideoSummary {
            video_id: self.video_id.clone(),
            chunk_count: self.chunks.len(),
            dimensions: self.chunks.first().map(|c| c.embedding.len()).unwrap_or(0),
            embedding_model: self.embedding_model.clone(),
            ingested_at: self.ingested_at,
        }
    }
}

/// Summary information about a stored chunk set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub chunk_count: usize,
    pub dimensions: usize,
    pub embedding_model: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

/// Trait for chunk store implementations.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Fetch the complete chunk set for a video, if one exists.
    async fn get(&self, video_id: &str) -> Result<Option<VideoChunkSet>>;

    /// Persist a new chunk set.
    ///
    /// Fails with [`ScrubError::Conflict`] if the video already has one.
    async fn put(&self, set: VideoChunkSet) -> Result<VideoChunkSet>;

    /// List stored sets, most recently ingested first.
    async fn list(&self) -> Result<Vec<VideoSummary>>;

    /// Remove a video's chunk set. Returns whether anything was removed.
    async fn delete(&self, video_id: &str) -> Result<bool>;
}
