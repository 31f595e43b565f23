use thiserror::Error;

/// Failure reported by, or while talking to, the backend service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The service answered but did not report success.
    #[error("{0}")]
    Rejected(String),
    #[error("no se pudo contactar con el servidor: {0}")]
    Transport(String),
    #[error("respuesta inválida del servidor: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn rejected(error: Option<String>, fallback: &str) -> Self {
        Self::Rejected(
            error
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelConfigError {
    #[error("Modelo no válido: {0}")]
    UnknownModel(String),
    #[error("temperatura fuera de rango: {0}")]
    TemperatureOutOfRange(f64),
    #[error("máximo de tokens fuera de rango: {0}")]
    MaxTokensOutOfRange(u32),
    #[error("top-k fuera de rango: {0}")]
    TopKOutOfRange(u32),
}
