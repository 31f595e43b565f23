use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use client_core::{http_backend::DEFAULT_SERVER_URL, transcript::EXPORT_FILE_NAME};
use serde::Deserialize;
use shared::domain::ModelConfig;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "pdf_chat.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_k: u32,
    pub export_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let model = ModelConfig::default();
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            model_name: model.model_name,
            temperature: model.temperature,
            max_tokens: model.max_tokens,
            top_k: model.top_k,
            export_path: PathBuf::from(EXPORT_FILE_NAME),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    model_name: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    top_k: Option<u32>,
    export_path: Option<PathBuf>,
}

impl Settings {
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model_name: self.model_name.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_k: self.top_k,
        }
    }

    pub fn apply_toml(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw).context("invalid settings file")?;
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.model_name {
            self.model_name = v;
        }
        if let Some(v) = file_cfg.temperature {
            self.temperature = v;
        }
        if let Some(v) = file_cfg.max_tokens {
            self.max_tokens = v;
        }
        if let Some(v) = file_cfg.top_k {
            self.top_k = v;
        }
        if let Some(v) = file_cfg.export_path {
            self.export_path = v;
        }
        Ok(())
    }

    /// Overlays `PDF_CHAT_SERVER_URL` and the `APP__*` variables. Unparseable
    /// numbers are ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("PDF_CHAT_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = var("APP__SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = var("APP__MODEL_NAME") {
            self.model_name = v;
        }
        if let Some(v) = var("APP__TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = v;
        }
        if let Some(v) = var("APP__MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_tokens = v;
        }
        if let Some(v) = var("APP__TOP_K").and_then(|v| v.parse().ok()) {
            self.top_k = v;
        }
        if let Some(v) = var("APP__EXPORT_PATH") {
            self.export_path = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.server_url)
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("server url '{}' must use http or https", self.server_url);
        }
        self.model_config()
            .validate()
            .with_context(|| format!("invalid model settings for '{}'", self.model_name))?;
        Ok(())
    }
}

/// Defaults, then the settings file, then the environment. An explicit
/// `path` must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
            settings.apply_toml(&raw)?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                settings.apply_toml(&raw)?;
            }
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
