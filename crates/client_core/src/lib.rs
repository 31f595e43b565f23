use std::{fmt::Display, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use shared::{
    domain::{IndexId, IndexSummary, ModelConfig, SessionId, Source, Turn},
    error::BackendError,
    protocol::{ChatAnswer, HealthStatus, IndexCreated, ModelInitialized},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

pub mod error;
pub mod events;
pub mod format;
pub mod highlight;
pub mod http_backend;
pub mod state;
pub mod transcript;
pub mod uploads;

pub use error::{SessionError, ValidationError};
pub use events::{NoticeLevel, SessionEvent, SetupStatus, SetupStep};
pub use http_backend::HttpBackend;
pub use state::{Command, SessionPhase};
pub use uploads::{StageOutcome, StagedDocument};

use crate::{
    transcript::{SourceSet, Transcript},
    uploads::UploadSet,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const INDEX_PENDING_STATUS: &str = "Procesando documentos...";
const MODEL_PENDING_STATUS: &str = "Inicializando modelo...";
const UNSUPPORTED_FILE_NOTICE: &str = "Solo se permiten archivos PDF";

fn welcome_message(indexed_documents: usize) -> String {
    format!(
        "¡Chatbot listo! He procesado {indexed_documents} documento(s). ¿Qué te gustaría saber sobre ellos?"
    )
}

fn chat_failure_message(err: &BackendError) -> String {
    format!("Lo siento, ocurrió un error: {err}")
}

/// Remote index builder and chat model.
#[async_trait]
pub trait RagBackend: Send + Sync {
    async fn create_index(&self, documents: &[StagedDocument])
        -> Result<IndexCreated, BackendError>;
    async fn initialize_model(&self, config: &ModelConfig)
        -> Result<ModelInitialized, BackendError>;
    async fn chat(&self, session: &ChatSession, question: &str) -> Result<ChatAnswer, BackendError>;
    async fn summarize(&self, filename: &str) -> Result<String, BackendError>;
    async fn health(&self) -> Result<HealthStatus, BackendError>;
}

/// An initialized model bound to one index. Messages can only be sent while
/// one is open.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub session_id: SessionId,
    pub index_id: IndexId,
    pub config: ModelConfig,
    pub model_label: String,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Answered,
    /// The backend failed; the failure was appended to the transcript.
    Failed(BackendError),
    /// Blank input, or another message is still in flight.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub staged_files: Vec<String>,
    pub index: Option<IndexSummary>,
    pub session: Option<ChatSession>,
    pub transcript: Vec<Turn>,
    pub sources: Vec<Source>,
    pub chat_busy: bool,
}

impl SessionSnapshot {
    pub fn can_create_index(&self) -> bool {
        !self.staged_files.is_empty()
            && state::guard(self.phase, self.chat_busy, Command::CreateIndex).is_ok()
    }

    pub fn can_send(&self) -> bool {
        !self.chat_busy && state::guard(self.phase, false, Command::SendMessage).is_ok()
    }
}

#[derive(Default)]
struct SessionInner {
    phase: SessionPhase,
    uploads: UploadSet,
    index: Option<IndexSummary>,
    session: Option<ChatSession>,
    transcript: Transcript,
    sources: SourceSet,
    chat_busy: bool,
}

/// Owns all session state and enforces the upload → index → model → chat order.
pub struct SessionController {
    backend: Arc<dyn RagBackend>,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn RagBackend>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            backend,
            inner: Mutex::new(SessionInner::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot {
            phase: inner.phase,
            staged_files: inner.uploads.names(),
            index: inner.index.clone(),
            session: inner.session.clone(),
            transcript: inner.transcript.turns().to_vec(),
            sources: inner.sources.as_slice().to_vec(),
            chat_busy: inner.chat_busy,
        }
    }

    /// Keywords of the latest question, used to highlight source snippets.
    pub async fn highlight_keywords(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .transcript
            .last_user_text()
            .map(highlight::extract_keywords)
            .unwrap_or_default()
    }

    pub async fn stage_file(&self, document: StagedDocument) -> Result<StageOutcome, SessionError> {
        if !document.is_pdf() {
            debug!(file = document.name(), content_type = document.content_type(), "rejecting non-pdf file");
            self.notice(NoticeLevel::Error, UNSUPPORTED_FILE_NOTICE);
            return Err(SessionError::UnsupportedFileType {
                filename: document.name().to_string(),
            });
        }

        let mut inner = self.inner.lock().await;
        let name = document.name().to_string();
        let outcome = inner.uploads.insert(document);
        if outcome == StageOutcome::Duplicate {
            debug!(file = %name, "file already staged");
            return Ok(outcome);
        }
        self.uploads_changed(&mut inner);
        Ok(outcome)
    }

    /// Stages every file independently; a rejected file does not affect the others.
    pub async fn stage_files(
        &self,
        documents: impl IntoIterator<Item = StagedDocument>,
    ) -> Vec<Result<StageOutcome, SessionError>> {
        let mut outcomes = Vec::new();
        for document in documents {
            outcomes.push(self.stage_file(document).await);
        }
        outcomes
    }

    pub async fn unstage_file(&self, name: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.uploads.remove(name) {
            return false;
        }
        self.uploads_changed(&mut inner);
        true
    }

    pub async fn create_index(&self) -> Result<IndexSummary, SessionError> {
        let (documents, previous) = {
            let mut inner = self.inner.lock().await;
            if let Err(err) = state::guard(inner.phase, inner.chat_busy, Command::CreateIndex) {
                return Err(self.reject(err));
            }
            if inner.uploads.is_empty() {
                return Err(self.reject(ValidationError::EmptyUploadSet));
            }
            let previous = inner.phase;
            self.transition(&mut inner, SessionPhase::IndexPending);
            self.setup_status(SetupStep::Index, SetupStatus::Pending, INDEX_PENDING_STATUS);
            (inner.uploads.documents().to_vec(), previous)
        };

        info!(files = documents.len(), "creating vector index");
        let result = self.backend.create_index(&documents).await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(created) => {
                let summary = IndexSummary {
                    index_id: IndexId::new(),
                    files: created.files,
                    created_at: Utc::now(),
                    message: created.message,
                };
                inner.index = Some(summary.clone());
                if let Some(closed) = inner.session.take() {
                    info!(session_id = %closed.session_id, "closing chat session bound to the replaced index");
                }
                self.transition(&mut inner, SessionPhase::IndexReady);
                self.setup_status(SetupStep::Index, SetupStatus::Success, &summary.message);
                info!(index_id = %summary.index_id, files = summary.files.len(), "vector index ready");
                Ok(summary)
            }
            Err(err) => {
                warn!(error = %err, "vector index creation failed");
                let has_uploads = !inner.uploads.is_empty();
                self.transition(&mut inner, previous.settle_uploads(has_uploads));
                self.setup_status(SetupStep::Index, SetupStatus::Error, &err.to_string());
                Err(err.into())
            }
        }
    }

    /// Validates `config` locally; a short label or differently cased id is
    /// sent as the catalogue repo id.
    pub async fn initialize_model(&self, mut config: ModelConfig) -> Result<ChatSession, SessionError> {
        let choice = match config.validate() {
            Ok(choice) => choice,
            Err(err) => return Err(self.reject(err.into())),
        };
        config.model_name = choice.repo_id().to_string();

        let (index_id, indexed_documents, previous) = {
            let mut inner = self.inner.lock().await;
            if let Err(err) = state::guard(inner.phase, inner.chat_busy, Command::InitModel) {
                return Err(self.reject(err));
            }
            let Some(index) = inner.index.as_ref() else {
                return Err(self.reject(ValidationError::IndexRequired));
            };
            let index_id = index.index_id;
            let indexed_documents = index.files.len();
            let previous = inner.phase;
            self.transition(&mut inner, SessionPhase::ModelPending);
            self.setup_status(SetupStep::Model, SetupStatus::Pending, MODEL_PENDING_STATUS);
            (index_id, indexed_documents, previous)
        };

        info!(model = %config.model_name, temperature = config.temperature, max_tokens = config.max_tokens, top_k = config.top_k, "initializing chat model");
        let result = self.backend.initialize_model(&config).await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(initialized) => {
                let session = ChatSession {
                    session_id: SessionId::new(),
                    index_id,
                    model_label: initialized
                        .model_label
                        .unwrap_or_else(|| choice.label().to_string()),
                    config,
                    opened_at: Utc::now(),
                };
                inner.session = Some(session.clone());
                self.transition(&mut inner, SessionPhase::ModelReady);
                self.setup_status(SetupStep::Model, SetupStatus::Success, &initialized.message);
                self.replace_sources(&mut inner, Vec::new(), Vec::new());
                self.append_turn(&mut inner, Turn::assistant(welcome_message(indexed_documents)));
                info!(session_id = %session.session_id, model = %session.model_label, "chat session opened");
                Ok(session)
            }
            Err(err) => {
                warn!(error = %err, "model initialization failed");
                self.transition(&mut inner, previous);
                self.setup_status(SetupStep::Model, SetupStatus::Error, &err.to_string());
                Err(err.into())
            }
        }
    }

    pub async fn send_message(&self, text: &str) -> Result<SendOutcome, SessionError> {
        let question = text.trim();
        let session = {
            let mut inner = self.inner.lock().await;
            if inner.chat_busy {
                debug!("chat request already in flight; ignoring message");
                return Ok(SendOutcome::Ignored);
            }
            if question.is_empty() {
                return Ok(SendOutcome::Ignored);
            }
            if let Err(err) = state::guard(inner.phase, false, Command::SendMessage) {
                return Err(self.reject(err));
            }
            let Some(session) = inner.session.clone() else {
                return Err(self.reject(ValidationError::SessionRequired));
            };
            inner.chat_busy = true;
            self.emit(SessionEvent::ChatBusyChanged(true));
            self.append_turn(&mut inner, Turn::user(question));
            session
        };

        let result = self.backend.chat(&session, question).await;

        let mut inner = self.inner.lock().await;
        let outcome = match result {
            Ok(answer) => {
                debug!(sources = answer.sources.len(), "chat answer received");
                self.append_turn(&mut inner, Turn::assistant(answer.answer));
                self.replace_sources(&mut inner, answer.sources, highlight::extract_keywords(question));
                SendOutcome::Answered
            }
            Err(err) => {
                warn!(error = %err, "chat request failed");
                self.append_turn(&mut inner, Turn::assistant(chat_failure_message(&err)));
                self.replace_sources(&mut inner, Vec::new(), Vec::new());
                SendOutcome::Failed(err)
            }
        };
        inner.chat_busy = false;
        self.emit(SessionEvent::ChatBusyChanged(false));
        Ok(outcome)
    }

    pub async fn export_transcript(&self) -> Result<String, SessionError> {
        self.export_transcript_at(&Local::now()).await
    }

    /// Renders the transcript with `now` as the export date and time zone.
    pub async fn export_transcript_at<Tz>(&self, now: &DateTime<Tz>) -> Result<String, SessionError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let inner = self.inner.lock().await;
        if inner.transcript.is_empty() {
            return Err(self.reject(ValidationError::EmptyTranscript));
        }
        let files = inner
            .index
            .as_ref()
            .map(|index| index.files.clone())
            .unwrap_or_default();
        Ok(transcript::render_export(inner.transcript.turns(), &files, now))
    }

    pub async fn summarize_document(&self, filename: &str) -> Result<String, SessionError> {
        {
            let inner = self.inner.lock().await;
            if let Err(err) = state::guard(inner.phase, inner.chat_busy, Command::Summarize) {
                return Err(self.reject(err));
            }
            let indexed = inner
                .index
                .as_ref()
                .is_some_and(|index| index.files.iter().any(|file| file == filename));
            if !indexed {
                return Err(self.reject(ValidationError::UnknownDocument(filename.to_string())));
            }
        }

        match self.backend.summarize(filename).await {
            Ok(summary) => {
                self.emit(SessionEvent::SummaryReady {
                    filename: filename.to_string(),
                    summary: summary.clone(),
                });
                Ok(summary)
            }
            Err(err) => {
                warn!(file = filename, error = %err, "document summary failed");
                self.notice(NoticeLevel::Error, &err.to_string());
                Err(err.into())
            }
        }
    }

    pub async fn check_health(&self) -> Result<HealthStatus, SessionError> {
        let status = self.backend.health().await?;
        debug!(status = %status.status, version = %status.version, "backend health");
        Ok(status)
    }

    /// Drops uploads, index, session and conversation.
    pub async fn reset(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        if let Err(err) = state::guard(inner.phase, inner.chat_busy, Command::Reset) {
            return Err(self.reject(err));
        }
        inner.uploads.clear();
        inner.index = None;
        inner.session = None;
        inner.transcript.clear();
        self.replace_sources(&mut inner, Vec::new(), Vec::new());
        self.emit(SessionEvent::UploadsChanged { files: Vec::new() });
        self.transition(&mut inner, SessionPhase::Empty);
        info!("session reset");
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        // No subscriber is not an error.
        let _ = self.events.send(event);
    }

    fn notice(&self, level: NoticeLevel, message: &str) {
        self.emit(SessionEvent::Notice {
            level,
            message: message.to_string(),
        });
    }

    fn reject(&self, err: ValidationError) -> SessionError {
        debug!(reason = %err, "command rejected");
        self.notice(err.notice_level(), &err.to_string());
        err.into()
    }

    fn setup_status(&self, step: SetupStep, status: SetupStatus, message: &str) {
        self.emit(SessionEvent::SetupStatusChanged {
            step,
            status,
            message: message.to_string(),
        });
    }

    fn transition(&self, inner: &mut SessionInner, to: SessionPhase) {
        let from = inner.phase;
        if from == to {
            return;
        }
        inner.phase = to;
        debug!(?from, ?to, "session phase changed");
        self.emit(SessionEvent::PhaseChanged { from, to });
    }

    fn uploads_changed(&self, inner: &mut SessionInner) {
        self.emit(SessionEvent::UploadsChanged {
            files: inner.uploads.names(),
        });
        let next = inner.phase.settle_uploads(!inner.uploads.is_empty());
        self.transition(inner, next);
    }

    fn append_turn(&self, inner: &mut SessionInner, turn: Turn) {
        inner.transcript.push(turn.clone());
        self.emit(SessionEvent::TurnAppended(turn));
    }

    fn replace_sources(&self, inner: &mut SessionInner, sources: Vec<Source>, keywords: Vec<String>) {
        inner.sources.replace(sources.clone());
        self.emit(SessionEvent::SourcesReplaced { sources, keywords });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
