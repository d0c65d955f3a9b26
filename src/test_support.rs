//! Scripted collaborators for unit tests.

use crate::embedding::Embedder;
use crate::error::{Result, ScrubError};
use crate::llm::{ChatModel, CompletionRequest};
use crate::media::{MediaAnalysis, MediaService, RawChunk};
use crate::timestamp::Timestamp;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

pub fn raw_chunk(timestamp_ms: u64, summary: &str, embedding: &[f32]) -> RawChunk {
    RawChunk {
        timestamp_ms,
        summary: summary.to_string(),
        embedding: embedding.iter().map(|v| serde_json::json!(v)).collect(),
    }
}

/// The three-chunk video used across tests: intro, main topic, summary.
pub fn scenario_analysis() -> MediaAnalysis {
    MediaAnalysis {
        chunks: vec![
            raw_chunk(0, "intro", &[1.0, 0.0, 0.0]),
            raw_chunk(90_000, "main topic", &[0.0, 1.0, 0.0]),
            raw_chunk(225_000, "summary", &[0.0, 0.0, 1.0]),
        ],
        embedding_model: Some("fake-embed".to_string()),
    }
}

/// Media service returning a fixed analysis, or failing.
pub struct FakeMedia {
    analysis: Option<MediaAnalysis>,
    calls: AtomicUsize,
    barrier: Option<Arc<Barrier>>,
}

impl FakeMedia {
    pub fn returning(analysis: MediaAnalysis) -> Self {
        Self {
            analysis: Some(analysis),
            calls: AtomicUsize::new(0),
            barrier: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            analysis: None,
            calls: AtomicUsize::new(0),
            barrier: None,
        }
    }

    /// Hold every call until `n` callers are inside `analyze`.
    pub fn with_rendezvous(mut self, n: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaService for FakeMedia {
    async fn analyze(&self, _video_id: &str) -> Result<MediaAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        self.analysis
            .clone()
            .ok_or_else(|| ScrubError::Ingestion("quota exceeded".to_string()))
    }
}

/// Embedder mapping known texts to fixed vectors.
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    model: String,
    fail: bool,
}

impl FakeEmbedder {
    pub fn new(fallback: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback,
            model: "fake-embed".to_string(),
            fail: false,
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(ScrubError::ExternalService("embedding service unavailable".to_string()));
        }
        Ok(self.vectors.get(text).cloned().unwrap_or_else(|| self.fallback.clone()))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.fallback.len()
    }
}

/// What the fake chat model was last asked.
#[derive(Debug, Clone, Default)]
pub struct SeenRequest {
    pub context: Vec<Timestamp>,
    pub history_len: usize,
    pub user_text: String,
}

/// Chat model that answers with a fixed text.
pub struct FakeChatModel {
    answer: Option<String>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl FakeChatModel {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        self.seen.lock().unwrap().push(SeenRequest {
            context: request.context.iter().map(|c| c.chunk.timestamp).collect(),
            history_len: request.history.len(),
            user_text: request.user_text.to_string(),
        });
        self.answer
            .clone()
            .ok_or_else(|| ScrubError::ExternalService("LLM unavailable".to_string()))
    }
}
