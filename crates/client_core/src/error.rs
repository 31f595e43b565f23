use shared::error::{BackendError, ModelConfigError};
use thiserror::Error;

use crate::{events::NoticeLevel, state::SessionPhase};

/// A command was issued in a state that does not allow it. Nothing was sent
/// to the backend and no state changed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Por favor, suba al menos un documento PDF")]
    EmptyUploadSet,
    #[error("Primero debe crear la base de datos vectorial")]
    IndexRequired,
    #[error("Primero debe inicializar el chatbot")]
    SessionRequired,
    #[error("No hay conversación para exportar")]
    EmptyTranscript,
    #[error("Espere a que termine la operación en curso ({phase})")]
    RequestPending { phase: SessionPhase },
    #[error("Espere a que termine la consulta en curso")]
    ChatBusy,
    #[error(transparent)]
    InvalidModelConfig(#[from] ModelConfigError),
    #[error("El documento {0} no forma parte de la base de datos vectorial")]
    UnknownDocument(String),
}

impl ValidationError {
    pub fn notice_level(&self) -> NoticeLevel {
        match self {
            ValidationError::EmptyTranscript => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Solo se permiten archivos PDF ({filename})")]
    UnsupportedFileType { filename: String },
}

impl SessionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}
