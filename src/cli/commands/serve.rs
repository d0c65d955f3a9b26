//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for ingestion, chat and stored videos. Clients
//! own the conversation: each `/chat` call carries the history so far.

use crate::chunk_store::VideoSummary;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::ScrubError;
use crate::rag::ConversationTurn;
use crate::timestamp::Timestamp;
use crate::App;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    app: App,
    /// Why `/chat` cannot answer, when a pre-flight check failed at startup.
    chat_unavailable: Option<String>,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let chat_unavailable = match preflight::check(Operation::Ask) {
        Ok(()) => None,
        Err(e) => {
            Output::warning(&format!("{}. /chat will fail until this is fixed.", e));
            Some(e.to_string())
        }
    };

    let state = Arc::new(AppState {
        app: App::new(settings)?,
        chat_unavailable,
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Scrub API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Ingest", "POST   /ingest");
    Output::kv("Chat", "POST   /chat");
    Output::kv("List Videos", "GET    /videos");
    Output::kv("Get Video", "GET    /videos/:video_id");
    Output::kv("Forget Video", "DELETE /videos/:video_id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .route("/chat", post(chat))
        .route("/videos", get(list_videos))
        .route("/videos/{video_id}", get(get_video).delete(forget_video))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct IngestRequest {
    video_id: String,
}

#[derive(Serialize)]
struct IngestResponse {
    video_id: String,
    created: bool,
    chunk_count: usize,
}

#[derive(Deserialize)]
struct ChatRequest {
    video_id: String,
    #[serde(default)]
    history: Vec<ConversationTurn>,
    content: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: ConversationTurn,
    history: Vec<ConversationTurn>,
    sources: Vec<SourceInfo>,
    ungrounded: Vec<Timestamp>,
}

#[derive(Serialize)]
struct SourceInfo {
    timestamp: Timestamp,
    text: String,
    score: f32,
    url: String,
}

#[derive(Serialize)]
struct VideoListResponse {
    videos: Vec<VideoSummary>,
    total: usize,
}

#[derive(Serialize)]
struct VideoDetailResponse {
    #[serde(flatten)]
    summary: VideoSummary,
    chunks: Vec<ChunkInfo>,
}

#[derive(Serialize)]
struct ChunkInfo {
    timestamp: Timestamp,
    text: String,
    url: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A library error rendered as a JSON body with a matching status.
struct ApiError(ScrubError);

impl From<ScrubError> for ApiError {
    fn from(e: ScrubError) -> Self {
        Self(e)
    }
}

fn status_for(error: &ScrubError) -> StatusCode {
    match error {
        ScrubError::NotFound(_) => StatusCode::NOT_FOUND,
        ScrubError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ScrubError::Conflict(_) => StatusCode::CONFLICT,
        ScrubError::EmbeddingSpace(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScrubError::Ingestion(_) | ScrubError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let outcome = state.app.ingestor().ingest(req.video_id.trim()).await?;

    Ok(Json(IngestResponse {
        created: outcome.is_created(),
        chunk_count: outcome.chunk_set().len(),
        video_id: outcome.into_chunk_set().video_id,
    }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if let Some(reason) = &state.chat_unavailable {
        return Err(ScrubError::Config(reason.clone()).into());
    }

    let video_id = req.video_id.trim();
    let mut history = req.history;
    let reply = state
        .app
        .engine()
        .respond(video_id, &mut history, &req.content)
        .await?;

    let sources = reply
        .sources
        .iter()
        .map(|s| SourceInfo {
            timestamp: s.chunk.timestamp,
            text: s.chunk.text.clone(),
            score: s.score,
            url: s.chunk.timestamp.seek_url(video_id),
        })
        .collect();

    Ok(Json(ChatResponse {
        reply: reply.turn,
        history,
        sources,
        ungrounded: reply.grounding.ungrounded,
    }))
}

async fn list_videos(State(state): State<Arc<AppState>>) -> Result<Json<VideoListResponse>, ApiError> {
    let videos = state.app.store().list().await?;
    Ok(Json(VideoListResponse {
        total: videos.len(),
        videos,
    }))
}

async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoDetailResponse>, ApiError> {
    let video_id = video_id.trim();
    let set = state
        .app
        .store()
        .get(video_id)
        .await?
        .ok_or_else(|| ScrubError::NotFound(video_id.to_string()))?;

    Ok(Json(VideoDetailResponse {
        summary: set.summary(),
        chunks: set
            .chunks
            .into_iter()
            .map(|c| ChunkInfo {
                url: c.timestamp.seek_url(video_id),
                timestamp: c.timestamp,
                text: c.text,
            })
            .collect(),
    }))
}

async fn forget_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let video_id = video_id.trim();
    if state.app.store().delete(video_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ScrubError::NotFound(video_id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_store::MemoryChunkStore;
    use crate::test_support::{scenario_analysis, FakeChatModel, FakeEmbedder, FakeMedia};

    fn state(answer: &str) -> Arc<AppState> {
        let app = App::with_components(
            Settings::default(),
            Arc::new(MemoryChunkStore::new()),
            Arc::new(FakeMedia::returning(scenario_analysis())),
            Arc::new(FakeEmbedder::new(vec![0.1, 0.9, 0.2])),
            Arc::new(FakeChatModel::answering(answer)),
        );
        Arc::new(AppState {
            app,
            chat_unavailable: None,
        })
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&ScrubError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&ScrubError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&ScrubError::EmbeddingSpace("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(&ScrubError::Ingestion("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&ScrubError::ExternalService("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&ScrubError::Config("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_chat_before_ingest_is_not_found() {
        let state = state("The main topic starts at [01:30].");
        let req = ChatRequest {
            video_id: "abc123".to_string(),
            history: Vec::new(),
            content: "What is the main topic?".to_string(),
        };

        let response = chat(State(state), Json(req)).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ingest_then_chat() {
        let state = state("The main topic starts at [01:30].");

        let Json(ingested) = ingest(
            State(state.clone()),
            Json(IngestRequest {
                video_id: "abc123".to_string(),
            }),
        )
        .await
        .map_err(|e| e.0)
        .unwrap();
        assert!(ingested.created);
        assert_eq!(ingested.chunk_count, 3);

        let req = ChatRequest {
            video_id: "abc123".to_string(),
            history: vec![
                ConversationTurn::user("hi"),
                ConversationTurn::assistant("Hello! Ask me about the video."),
            ],
            content: "What is the main topic?".to_string(),
        };
        let Json(body) = chat(State(state), Json(req)).await.map_err(|e| e.0).unwrap();

        assert_eq!(body.reply.content(), "The main topic starts at [01:30].");
        assert_eq!(body.history.len(), 4);
        assert_eq!(body.sources[0].timestamp.to_string(), "01:30");
        assert!(body.ungrounded.is_empty());
    }

    #[tokio::test]
    async fn test_chat_without_api_key_is_config_error() {
        let app = App::with_components(
            Settings::default(),
            Arc::new(MemoryChunkStore::new()),
            Arc::new(FakeMedia::returning(scenario_analysis())),
            Arc::new(FakeEmbedder::new(vec![0.1, 0.9, 0.2])),
            Arc::new(FakeChatModel::failing()),
        );
        let state = Arc::new(AppState {
            app,
            chat_unavailable: Some("OPENAI_API_KEY not set".to_string()),
        });

        let req = ChatRequest {
            video_id: "abc123".to_string(),
            history: Vec::new(),
            content: "What is the main topic?".to_string(),
        };
        let err = chat(State(state), Json(req)).await.map(|_| ()).unwrap_err();
        assert!(matches!(err.0, ScrubError::Config(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_video_ids_are_trimmed_everywhere() {
        let state = state("The main topic starts at [01:30].");

        ingest(
            State(state.clone()),
            Json(IngestRequest {
                video_id: " abc123 ".to_string(),
            }),
        )
        .await
        .map_err(|e| e.0)
        .unwrap();

        let req = ChatRequest {
            video_id: " abc123".to_string(),
            history: Vec::new(),
            content: "What is the main topic?".to_string(),
        };
        let Json(body) = chat(State(state.clone()), Json(req)).await.map_err(|e| e.0).unwrap();
        assert_eq!(body.sources[0].url, "https://www.youtube.com/watch?v=abc123&t=90s");

        let Json(detail) = get_video(State(state.clone()), Path("abc123 ".to_string()))
            .await
            .map_err(|e| e.0)
            .unwrap();
        assert_eq!(detail.summary.video_id, "abc123");

        let status = forget_video(State(state), Path(" abc123".to_string()))
            .await
            .map_err(|e| e.0)
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_forget_missing_video() {
        let state = state("unused");
        let response = forget_video(State(state), Path("nope".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_router_builds() {
        let _ = router(state("unused"));
    }
}
