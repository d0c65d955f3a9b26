//! Ingestion coordinator.
//!
//! Turns a video id into a stored chunk set, asking the media service only
//! when the store has nothing for the video yet.

use crate::chunk_store::{Chunk, ChunkStore, VideoChunkSet};
use crate::error::{Result, ScrubError};
use crate::media::{MediaAnalysis, MediaService, RawChunk};
use crate::timestamp::Timestamp;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Result of an ingestion request.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// The video was already stored; nothing was fetched.
    Existing(VideoChunkSet),
    /// The video was analyzed and stored by this call.
    Created(VideoChunkSet),
}

impl IngestOutcome {
    /// The stored chunk set.
    pub fn chunk_set(&self) -> &VideoChunkSet {
        match self {
            IngestOutcome::Existing(set) | IngestOutcome::Created(set) => set,
        }
    }

    /// Take the stored chunk set.
    pub fn into_chunk_set(self) -> VideoChunkSet {
        match self {
            IngestOutcome::Existing(set) | IngestOutcome::Created(set) => set,
        }
    }

    /// Whether this call created the set.
    pub fn is_created(&self) -> bool {
        matches!(self, IngestOutcome::Created(_))
    }
}

/// Coordinates the media service and the chunk store.
pub struct Ingestor {
    store: Arc<dyn ChunkStore>,
    media: Arc<dyn MediaService>,
}

impl Ingestor {
    /// Create an ingestor over the given store and media service.
    pub fn new(store: Arc<dyn ChunkStore>, media: Arc<dyn MediaService>) -> Self {
        Self { store, media }
    }

    /// Get a reference to the chunk store.
    pub fn store(&self) -> Arc<dyn ChunkStore> {
        self.store.clone()
    }

    /// Ensure `video_id` has a stored chunk set and return it.
    ///
    /// External failures are not retried. If another caller stores the same
    /// video first, its set is returned and this call's batch is dropped.
    #[instrument(skip(self))]
    pub async fn ingest(&self, video_id: &str) -> Result<IngestOutcome> {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return Err(ScrubError::InvalidInput("video id is empty".to_string()));
        }

        if let Some(existing) = self.store.get(video_id).await? {
            info!("Video {} already has {} chunks, skipping analysis", video_id, existing.len());
            return Ok(IngestOutcome::Existing(existing));
        }

        info!("Analyzing video {}", video_id);
        let analysis = self.media.analyze(video_id).await.map_err(|e| match e {
            ScrubError::Ingestion(_) => e,
            other => ScrubError::Ingestion(other.to_string()),
        })?;

        let set = normalize(video_id, analysis)?;
        debug!("Normalized {} chunks for video {}", set.len(), video_id);

        match self.store.put(set).await {
            Ok(stored) => {
                info!("Ingested {} chunks for video {}", stored.len(), video_id);
                Ok(IngestOutcome::Created(stored))
            }
            Err(ScrubError::Conflict(_)) => {
                info!("Video {} was stored concurrently, using the existing set", video_id);
                self.store
                    .get(video_id)
                    .await?
                    .map(IngestOutcome::Existing)
                    .ok_or_else(|| {
                        ScrubError::Store(format!(
                            "chunk set for {} conflicted on write but could not be read back",
                            video_id
                        ))
                    })
            }
            Err(e) => Err(e),
        }
    }
}

/// Convert a media service response into a chunk set.
///
/// Millisecond offsets become `MM:SS` timestamps and embedding values are
/// coerced to numbers. The whole batch is rejected if it is empty or if any
/// chunk's embedding length differs from the others.
pub fn normalize(video_id: &str, analysis: MediaAnalysis) -> Result<VideoChunkSet> {
    if analysis.chunks.is_empty() {
        return Err(ScrubError::Ingestion(format!(
            "media service returned no chunks for video {}",
            video_id
        )));
    }

    let mut chunks = Vec::with_capacity(analysis.chunks.len());
    let mut dims: Option<usize> = None;

    for (index, raw) in analysis.chunks.into_iter().enumerate() {
        let RawChunk {
            timestamp_ms,
            summary,
            embedding,
        } = raw;

        let embedding = coerce_embedding(&embedding)
            .map_err(|reason| ScrubError::Ingestion(format!("chunk {}: {}", index, reason)))?;

        match dims {
            None if embedding.is_empty() => {
                return Err(ScrubError::Ingestion(format!("chunk {} has an empty embedding", index)));
            }
            None => dims = Some(embedding.len()),
            Some(expected) if expected != embedding.len() => {
                return Err(ScrubError::Ingestion(format!(
                    "inconsistent embedding space: chunk {} has {} dimensions, expected {}",
                    index,
                    embedding.len(),
                    expected
                )));
            }
            Some(_) => {}
        }

        chunks.push(Chunk::new(Timestamp::from_millis(timestamp_ms), summary, embedding));
    }

    Ok(VideoChunkSet::new(video_id, chunks, analysis.embedding_model))
}

fn coerce_embedding(values: &[Value]) -> std::result::Result<Vec<f32>, String> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match number.map(|n| n as f32) {
                Some(n) if n.is_finite() => Ok(n),
                _ => Err(format!("embedding value {} is not a finite number: {}", i, value)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_store::MemoryChunkStore;
    use crate::test_support::{raw_chunk, scenario_analysis, FakeMedia};

    fn ingestor(media: FakeMedia) -> (Ingestor, Arc<MemoryChunkStore>, Arc<FakeMedia>) {
        let store = Arc::new(MemoryChunkStore::new());
        let media = Arc::new(media);
        (Ingestor::new(store.clone(), media.clone()), store, media)
    }

    #[test]
    fn test_normalize_converts_timestamps_and_strings() {
        let analysis = MediaAnalysis {
            chunks: vec![
                raw_chunk(0, "intro", &[0.5, 0.25]),
                RawChunk {
                    timestamp_ms: 90_500,
                    summary: "main topic".to_string(),
                    embedding: vec![serde_json::json!("0.125"), serde_json::json!(" -1.5 ")],
                },
            ],
            embedding_model: None,
        };

        let set = normalize("abc123", analysis).unwrap();
        assert_eq!(set.video_id, "abc123");
        assert_eq!(set.chunks[0].timestamp.to_string(), "00:00");
        assert_eq!(set.chunks[1].timestamp.to_string(), "01:30");
        assert_eq!(set.chunks[1].embedding, vec![0.125, -1.5]);
    }

    #[test]
    fn test_normalize_rejects_inconsistent_dimensions() {
        let analysis = MediaAnalysis {
            chunks: vec![raw_chunk(0, "a", &[1.0, 0.0]), raw_chunk(1000, "b", &[1.0, 0.0, 0.0])],
            embedding_model: None,
        };
        let err = normalize("v", analysis).unwrap_err();
        assert!(matches!(err, ScrubError::Ingestion(msg) if msg.contains("inconsistent")));
    }

    #[test]
    fn test_normalize_rejects_bad_values_and_empty_batches() {
        let analysis = MediaAnalysis {
            chunks: vec![RawChunk {
                timestamp_ms: 0,
                summary: "a".to_string(),
                embedding: vec![serde_json::json!("zero"), serde_json::json!(1.0)],
            }],
            embedding_model: None,
        };
        assert!(matches!(normalize("v", analysis), Err(ScrubError::Ingestion(_))));

        assert!(matches!(
            normalize("v", MediaAnalysis::default()),
            Err(ScrubError::Ingestion(_))
        ));

        let analysis = MediaAnalysis {
            chunks: vec![raw_chunk(0, "a", &[])],
            embedding_model: None,
        };
        assert!(matches!(normalize("v", analysis), Err(ScrubError::Ingestion(_))));
    }

    #[test]
    fn test_normalize_rejects_values_beyond_f32_range() {
        for huge in [serde_json::json!(1.0e39), serde_json::json!("-1e39")] {
            let analysis = MediaAnalysis {
                chunks: vec![RawChunk {
                    timestamp_ms: 0,
                    summary: "a".to_string(),
                    embedding: vec![huge, serde_json::json!("0.5")],
                }],
                embedding_model: None,
            };
            let err = normalize("v", analysis).unwrap_err();
            assert!(matches!(err, ScrubError::Ingestion(msg) if msg.contains("not a finite number")));
        }
    }

    #[tokio::test]
    async fn test_second_ingest_uses_stored_set() {
        let (ingestor, store, media) = ingestor(FakeMedia::returning(scenario_analysis()));

        let first = ingestor.ingest("abc123").await.unwrap();
        assert!(first.is_created());
        assert_eq!(first.chunk_set().len(), 3);

        let second = ingestor.ingest("abc123").await.unwrap();
        assert!(!second.is_created());
        assert_eq!(second.chunk_set().chunks, first.chunk_set().chunks);

        assert_eq!(media.calls(), 1);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_ingest_stores_one_set() {
        // Both callers miss the fast path before either writes
        let (ingestor, store, media) = ingestor(FakeMedia::returning(scenario_analysis()).with_rendezvous(2));

        let (a, b) = tokio::join!(ingestor.ingest("xyz"), ingestor.ingest("xyz"));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(media.calls(), 2);
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert_eq!([a.is_created(), b.is_created()].iter().filter(|c| **c).count(), 1);

        assert_eq!(a.chunk_set().video_id, "xyz");
        assert_eq!(b.chunk_set().video_id, "xyz");
        assert_eq!(a.chunk_set().len(), b.chunk_set().len());
        assert_eq!(a.chunk_set().chunks, b.chunk_set().chunks);
    }

    #[tokio::test]
    async fn test_media_failure_is_ingestion_error_and_stores_nothing() {
        let (ingestor, store, _) = ingestor(FakeMedia::failing());

        let err = ingestor.ingest("abc123").await.unwrap_err();
        assert!(matches!(err, ScrubError::Ingestion(msg) if msg.contains("quota")));
        assert!(store.get("abc123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_video_id_is_rejected() {
        let (ingestor, _, media) = ingestor(FakeMedia::returning(scenario_analysis()));
        assert!(matches!(ingestor.ingest("  ").await, Err(ScrubError::InvalidInput(_))));
        assert_eq!(media.calls(), 0);
    }
}
