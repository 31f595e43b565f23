use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::ModelConfig,
    error::BackendError,
    protocol::{
        ChatAnswer, ChatRequest, ChatResponse, CreateIndexResponse, HealthStatus, IndexCreated,
        InitializeModelRequest, InitializeModelResponse, ModelInitialized, SummaryResponse,
        PDF_MIME, UPLOAD_FIELD,
    },
};
use tracing::debug;
use url::Url;

use crate::{uploads::StagedDocument, ChatSession, RagBackend};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// `RagBackend` over the service's JSON/multipart HTTP API.
pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self, BackendError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(server_url.trim())
            .map_err(|err| BackendError::Transport(format!("invalid server url {server_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Transport(format!(
                "invalid server url {server_url}"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|err| BackendError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    fn summary_endpoint(&self, filename: &str) -> Result<Url, BackendError> {
        let mut url = self.endpoint("api/summarize/")?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Transport("server url cannot take a path".to_string()))?
            .pop_if_empty()
            .push(filename);
        Ok(url)
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

/// Decodes the JSON body whatever the HTTP status: the service reports
/// rejections as JSON bodies on 4xx/5xx responses.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&body).map_err(|err| {
        let preview: String = String::from_utf8_lossy(&body).chars().take(200).collect();
        BackendError::Decode(format!("HTTP {status}: {err}: {preview}"))
    })
}

#[async_trait]
impl RagBackend for HttpBackend {
    async fn create_index(
        &self,
        documents: &[StagedDocument],
    ) -> Result<IndexCreated, BackendError> {
        let mut form = Form::new();
        for document in documents {
            let part = Part::bytes(document.bytes().to_vec())
                .file_name(document.name().to_string())
                .mime_str(PDF_MIME)
                .map_err(transport)?;
            form = form.part(UPLOAD_FIELD, part);
        }
        debug!(files = documents.len(), "posting documents to /api/upload");

        let response = self
            .http
            .post(self.endpoint("api/upload")?)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        decode::<CreateIndexResponse>(response).await?.into_result()
    }

    async fn initialize_model(
        &self,
        config: &ModelConfig,
    ) -> Result<ModelInitialized, BackendError> {
        debug!(model = %config.model_name, "posting /api/initialize_model");
        let response = self
            .http
            .post(self.endpoint("api/initialize_model")?)
            .json(&InitializeModelRequest::from(config))
            .send()
            .await
            .map_err(transport)?;
        decode::<InitializeModelResponse>(response)
            .await?
            .into_result()
    }

    async fn chat(&self, session: &ChatSession, question: &str) -> Result<ChatAnswer, BackendError> {
        debug!(session_id = %session.session_id, "posting /api/chat");
        let response = self
            .http
            .post(self.endpoint("api/chat")?)
            .json(&ChatRequest {
                question: question.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;
        decode::<ChatResponse>(response).await?.into_result()
    }

    async fn summarize(&self, filename: &str) -> Result<String, BackendError> {
        let response = self
            .http
            .get(self.summary_endpoint(filename)?)
            .send()
            .await
            .map_err(transport)?;
        decode::<SummaryResponse>(response).await?.into_result()
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        let response = self
            .http
            .get(self.endpoint("api/health")?)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;
        decode(response).await
    }
}

#[cfg(test)]
#[path = "tests/http_backend_tests.rs"]
mod tests;
