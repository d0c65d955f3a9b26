//! Similarity ranking of a video's chunks against a question.

use crate::chunk_store::{Chunk, ChunkStore, VideoChunkSet};
use crate::error::{Result, ScrubError};
use crate::timestamp::Timestamp;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A chunk with its similarity to the question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// Chunks selected for one question, best match first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RetrievalContext {
    chunks: Vec<ScoredChunk>,
}

impl RetrievalContext {
    pub fn new(chunks: Vec<ScoredChunk>) -> Self {
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.chunks.iter()
    }

    pub fn first(&self) -> Option<&ScoredChunk> {
        self.chunks.first()
    }

    /// Whether a chunk at `timestamp` is part of this context.
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.chunks.iter().any(|c| c.chunk.timestamp == timestamp)
    }
}

impl<'a> IntoIterator for &'a RetrievalContext {
    type Item = &'a ScoredChunk;
    type IntoIter = std::slice::Iter<'a, ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Compute cosine similarity between two vectors of equal length.
///
/// A zero vector has similarity 0 with everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ScrubError::EmbeddingSpace(format!(
            "cannot compare {}-dimensional and {}-dimensional vectors",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Err(ScrubError::EmbeddingSpace("cannot compare empty vectors".to_string()));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (norm_a * norm_b))
}

/// Rank a chunk set against a query embedding and keep the top `k`.
///
/// Ordering is by descending similarity, then ascending timestamp, then
/// position in the set, so the result is fully deterministic.
pub fn rank(set: &VideoChunkSet, query_embedding: &[f32], k: usize) -> Result<RetrievalContext> {
    let dims = set
        .dimensions()?
        .ok_or_else(|| ScrubError::NotFound(set.video_id.clone()))?;

    if dims != query_embedding.len() {
        return Err(ScrubError::EmbeddingSpace(format!(
            "query embedding has {} dimensions but video {} was embedded with {}",
            query_embedding.len(),
            set.video_id,
            dims
        )));
    }

    let mut scored: Vec<(usize, f32)> = Vec::with_capacity(set.len());
    for (index, chunk) in set.chunks.iter().enumerate() {
        let score = cosine_similarity(query_embedding, &chunk.embedding)?;
        // NaN would otherwise sort above every real score
        let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
        scored.push((index, score));
    }

    scored.sort_by(|(ia, sa), (ib, sb)| {
        sb.total_cmp(sa)
            .then_with(|| set.chunks[*ia].timestamp.cmp(&set.chunks[*ib].timestamp))
            .then_with(|| ia.cmp(ib))
    });
    scored.truncate(k);

    Ok(RetrievalContext::new(
        scored
            .into_iter()
            .map(|(index, score)| ScoredChunk {
                chunk: set.chunks[index].clone(),
                score,
            })
            .collect(),
    ))
}

/// Loads chunk sets and ranks them against questions.
pub struct Retriever {
    store: Arc<dyn ChunkStore>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever returning `top_k` chunks by default.
    pub fn new(store: Arc<dyn ChunkStore>, top_k: usize) -> Self {
        Self { store, top_k }
    }

    /// Default number of chunks per question.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Load a video's chunk set. Absent and empty sets are both `NotFound`.
    ///
    /// Pair with [`rank`] to select the chunks for a question.
    #[instrument(skip(self))]
    pub async fn load(&self, video_id: &str) -> Result<VideoChunkSet> {
        let video_id = video_id.trim();
        match self.store.get(video_id).await? {
            Some(set) if !set.is_empty() => {
                debug!("Loaded {} chunks for video {}", set.len(), video_id);
                Ok(set)
            }
            _ => Err(ScrubError::NotFound(video_id.to_string())),
        }
    }
}
