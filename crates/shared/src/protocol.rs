//! Request and response bodies of the RAG backend HTTP API.
//!
//! The service reports failures as `{"error": "..."}` (usually with a 4xx/5xx
//! status) and successes with `"success": true`, so every response body keeps
//! all fields optional and is converted with `into_result`.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ModelConfig, Source},
    error::BackendError,
};

pub const UPLOAD_FIELD: &str = "files[]";
pub const PDF_MIME: &str = "application/pdf";

pub const CREATE_INDEX_FAILED: &str = "Error al crear la base de datos";
pub const INITIALIZE_MODEL_FAILED: &str = "Error al inicializar el modelo";
pub const CHAT_FAILED: &str = "Error al procesar la consulta";
pub const SUMMARIZE_FAILED: &str = "Error al generar el resumen";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIndexResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCreated {
    pub message: String,
    pub files: Vec<String>,
}

impl CreateIndexResponse {
    pub fn into_result(self) -> Result<IndexCreated, BackendError> {
        if !self.success {
            return Err(BackendError::rejected(self.error, CREATE_INDEX_FAILED));
        }
        Ok(IndexCreated {
            message: self.message.unwrap_or_default(),
            files: self.files,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeModelRequest {
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_k: u32,
}

impl From<&ModelConfig> for InitializeModelRequest {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model_name: config.model_name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_k: config.top_k,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializeModelResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInitialized {
    pub message: String,
    pub model_label: Option<String>,
}

impl InitializeModelResponse {
    pub fn into_result(self) -> Result<ModelInitialized, BackendError> {
        if !self.success {
            return Err(BackendError::rejected(self.error, INITIALIZE_MODEL_FAILED));
        }
        Ok(ModelInitialized {
            message: self.message.unwrap_or_default(),
            model_label: self.model,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
}

impl ChatResponse {
    pub fn into_result(self) -> Result<ChatAnswer, BackendError> {
        if !self.success {
            return Err(BackendError::rejected(self.error, CHAT_FAILED));
        }
        Ok(ChatAnswer {
            answer: self.answer.unwrap_or_default(),
            sources: self.sources,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SummaryResponse {
    pub fn into_result(self) -> Result<String, BackendError> {
        if !self.success {
            return Err(BackendError::rejected(self.error, SUMMARIZE_FAILED));
        }
        Ok(self.summary.unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub version: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_success_body_decodes_sources() {
        let body = r#"{
            "success": true,
            "answer": "**Sí**",
            "sources": [{"content": "Esto dice algo", "page": 1, "filename": "a.pdf"}]
        }"#;
        let response: ChatResponse = serde_json::from_str(body).expect("decode");
        let answer = response.into_result().expect("success");
        assert_eq!(answer.answer, "**Sí**");
        assert_eq!(
            answer.sources,
            vec![Source {
                page: 1,
                filename: "a.pdf".into(),
                content: "Esto dice algo".into(),
            }]
        );
    }

    #[test]
    fn error_body_without_success_is_rejected_with_server_message() {
        let response: CreateIndexResponse =
            serde_json::from_str(r#"{"error": "El archivo x.txt no es un PDF válido"}"#)
                .expect("decode");
        assert_eq!(
            response.into_result(),
            Err(BackendError::Rejected(
                "El archivo x.txt no es un PDF válido".into()
            ))
        );
    }

    #[test]
    fn missing_error_falls_back_to_operation_default() {
        let response: InitializeModelResponse =
            serde_json::from_str(r#"{"success": false}"#).expect("decode");
        assert_eq!(
            response.into_result(),
            Err(BackendError::Rejected(INITIALIZE_MODEL_FAILED.into()))
        );
    }

    #[test]
    fn initialize_request_mirrors_model_config() {
        let request = InitializeModelRequest::from(&ModelConfig::default());
        let json = serde_json::to_value(&request).expect("encode");
        assert_eq!(json["model_name"], "meta-llama/Meta-Llama-3-8B-Instruct");
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["max_tokens"], 2048);
        assert_eq!(json["top_k"], 3);
    }
}
