//! Wiring of stores and service clients from settings.
//!
//! Every client is built once here and shared through `Arc`s.

use crate::chunk_store::{ChunkStore, MemoryChunkStore, SqliteChunkStore};
use crate::config::{Prompts, Settings, StoreProvider};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::ingest::Ingestor;
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::media::{HttpMediaService, MediaService};
use crate::rag::{ConversationEngine, Retriever, Session};
use std::sync::Arc;
use tracing::info;

/// Shared components for ingestion and conversation.
pub struct App {
    settings: Settings,
    store: Arc<dyn ChunkStore>,
    ingestor: Arc<Ingestor>,
    engine: Arc<ConversationEngine>,
}

impl App {
    /// Build every component from configuration.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let store: Arc<dyn ChunkStore> = match settings.store.provider {
            StoreProvider::Sqlite => Arc::new(SqliteChunkStore::new(&settings.sqlite_path())?),
            StoreProvider::Memory => {
                info!("Using in-memory chunk store; nothing will be persisted");
                Arc::new(MemoryChunkStore::new())
            }
        };

        let media: Arc<dyn MediaService> = Arc::new(HttpMediaService::new(&settings.media)?);

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )?);

        let chat_model: Arc<dyn ChatModel> = Arc::new(
            OpenAIChatModel::new(&settings.chat.model, settings.chat.temperature)?.with_prompts(prompts),
        );

        Ok(Self::with_components(settings, store, media, embedder, chat_model))
    }

    /// Assemble an app from already-built components.
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn ChunkStore>,
        media: Arc<dyn MediaService>,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
    ) -> Self {
        let ingestor = Arc::new(Ingestor::new(store.clone(), media));
        let retriever = Retriever::new(store.clone(), settings.retrieval.top_k);
        let engine = Arc::new(
            ConversationEngine::new(retriever, embedder, chat_model)
                .with_max_history_turns(settings.chat.max_history_turns),
        );

        Self {
            settings,
            store,
            ingestor,
            engine,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> Arc<dyn ChunkStore> {
        self.store.clone()
    }

    pub fn ingestor(&self) -> Arc<Ingestor> {
        self.ingestor.clone()
    }

    pub fn engine(&self) -> Arc<ConversationEngine> {
        self.engine.clone()
    }

    /// Start a fresh chat session for a video.
    pub fn session(&self, video_id: &str) -> Session {
        Session::new(video_id, self.ingestor.clone(), self.engine.clone())
    }
}
