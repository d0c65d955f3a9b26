//! A chat session about one video.
//!
//! `Idle -> AwaitingIngestion -> Ready -> (Retrieving -> Generating -> Ready)*`.
//! A failed ingestion ends the session in `Failed`; start a new one to retry.

use super::engine::{ConversationEngine, Reply};
use super::ConversationTurn;
use crate::error::{Result, ScrubError};
use crate::ingest::{IngestOutcome, Ingestor};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Text of the assistant turn appended when a question could not be answered.
pub const COULD_NOT_ANSWER: &str = "Sorry, I could not answer that question.";

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingIngestion,
    Ready,
    Retrieving,
    Generating,
    Failed,
}

/// One user's conversation about one video.
///
/// `ask` takes `&mut self`, so turns cannot interleave.
pub struct Session {
    video_id: String,
    ingestor: Arc<Ingestor>,
    engine: Arc<ConversationEngine>,
    state: SessionState,
    history: Vec<ConversationTurn>,
}

impl Session {
    pub fn new(video_id: impl Into<String>, ingestor: Arc<Ingestor>, engine: Arc<ConversationEngine>) -> Self {
        Self {
            video_id: video_id.into(),
            ingestor,
            engine,
            state: SessionState::Idle,
            history: Vec::new(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Ingest the video (or reuse its stored chunks) and become ready.
    #[instrument(skip(self), fields(video_id = %self.video_id))]
    pub async fn start(&mut self) -> Result<IngestOutcome> {
        if self.state != SessionState::Idle {
            return Err(ScrubError::InvalidInput(format!(
                "session for {} was already started",
                self.video_id
            )));
        }

        self.state = SessionState::AwaitingIngestion;
        match self.ingestor.ingest(&self.video_id).await {
            Ok(outcome) => {
                info!("Session ready with {} chunks", outcome.chunk_set().len());
                self.state = SessionState::Ready;
                Ok(outcome)
            }
            Err(e) => {
                warn!("Ingestion failed, ending session: {}", e);
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Ask one question.
    ///
    /// On failure the question and a "could not answer" reply are appended
    /// and the error is returned; earlier history is untouched.
    #[instrument(skip(self, user_text), fields(video_id = %self.video_id))]
    pub async fn ask(&mut self, user_text: &str) -> Result<Reply> {
        match self.state {
            // Retrieving/Generating here means the previous call was dropped
            // mid-turn; it appended nothing, so continuing is safe.
            SessionState::Ready | SessionState::Retrieving | SessionState::Generating => {}
            other => {
                return Err(ScrubError::InvalidInput(format!(
                    "cannot ask a question while the session is {:?}",
                    other
                )));
            }
        }

        self.state = SessionState::Retrieving;
        let context = match self.engine.gather_context(&self.video_id, user_text).await {
            Ok(context) => context,
            Err(e) => return Err(self.fail_turn(user_text, e)),
        };

        self.state = SessionState::Generating;
        let reply = match self.engine.generate(&self.history, user_text, context).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail_turn(user_text, e)),
        };

        self.history.push(ConversationTurn::user(user_text));
        self.history.push(reply.turn.clone());
        self.state = SessionState::Ready;
        Ok(reply)
    }

    fn fail_turn(&mut self, user_text: &str, error: ScrubError) -> ScrubError {
        warn!("Could not answer question: {}", error);
        self.history.push(ConversationTurn::user(user_text));
        self.history.push(ConversationTurn::assistant(COULD_NOT_ANSWER));
        self.state = SessionState::Ready;
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_store::MemoryChunkStore;
    use crate::rag::{Retriever, Role};
    use crate::test_support::{scenario_analysis, FakeChatModel, FakeEmbedder, FakeMedia};

    fn session(media: FakeMedia, chat: FakeChatModel) -> Session {
        let store = Arc::new(MemoryChunkStore::new());
        let ingestor = Arc::new(Ingestor::new(store.clone(), Arc::new(media)));
        let embedder = FakeEmbedder::new(vec![1.0, 0.0, 0.0]).with("what is the main topic", vec![0.0, 1.0, 0.0]);
        let engine = Arc::new(ConversationEngine::new(
            Retriever::new(store, 2),
            Arc::new(embedder),
            Arc::new(chat),
        ));
        Session::new("abc123", ingestor, engine)
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let mut session = session(
            FakeMedia::returning(scenario_analysis()),
            FakeChatModel::answering("See [01:30]."),
        );
        assert_eq!(session.state(), SessionState::Idle);

        let outcome = session.start().await.unwrap();
        assert!(outcome.is_created());
        assert_eq!(session.state(), SessionState::Ready);

        let reply = session.ask("what is the main topic").await.unwrap();
        assert_eq!(reply.sources.first().unwrap().chunk.text, "main topic");
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.history().len(), 2);

        session.ask("and then?").await.unwrap();
        assert_eq!(session.history().len(), 4);
        assert!(matches!(session.start().await, Err(ScrubError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_cannot_ask_before_ready() {
        let mut session = session(
            FakeMedia::returning(scenario_analysis()),
            FakeChatModel::answering("unused"),
        );
        let err = session.ask("hello").await.unwrap_err();
        assert!(matches!(err, ScrubError::InvalidInput(_)));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_failed_ingestion_ends_session() {
        let mut session = session(FakeMedia::failing(), FakeChatModel::answering("unused"));

        let err = session.start().await.unwrap_err();
        assert!(matches!(err, ScrubError::Ingestion(_)));
        assert_eq!(session.state(), SessionState::Failed);

        assert!(matches!(session.ask("hello").await, Err(ScrubError::InvalidInput(_))));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_appends_could_not_answer() {
        let mut session = session(FakeMedia::returning(scenario_analysis()), FakeChatModel::failing());
        session.start().await.unwrap();

        let err = session.ask("what is the main topic").await.unwrap_err();
        assert!(matches!(err, ScrubError::ExternalService(_)));
        assert_eq!(session.state(), SessionState::Ready);

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role(), Role::User);
        assert_eq!(history[1].role(), Role::Assistant);
        assert_eq!(history[1].content(), COULD_NOT_ANSWER);
    }
}
