use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ModelConfigError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(IndexId);
id_newtype!(SessionId);

pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=1.0;
pub const MAX_TOKENS_RANGE: std::ops::RangeInclusive<u32> = 1..=4096;
pub const TOP_K_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Heading used for this role in exported transcripts.
    pub fn export_label(self) -> &'static str {
        match self {
            Role::User => "Usuario",
            Role::Assistant => "Asistente",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A retrieved snippet backing an assistant answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub page: u32,
    pub filename: String,
    pub content: String,
}

/// Models the remote chain accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelChoice {
    Llama3_8B,
    Mistral7B,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 2] = [ModelChoice::Llama3_8B, ModelChoice::Mistral7B];

    pub fn repo_id(self) -> &'static str {
        match self {
            ModelChoice::Llama3_8B => "meta-llama/Meta-Llama-3-8B-Instruct",
            ModelChoice::Mistral7B => "mistralai/Mistral-7B-Instruct-v0.2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelChoice::Llama3_8B => "Llama-3-8B",
            ModelChoice::Mistral7B => "Mistral-7B",
        }
    }

    /// Accepts either the repository id or the short label, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|choice| {
            choice.repo_id().eq_ignore_ascii_case(name) || choice.label().eq_ignore_ascii_case(name)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_k: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: ModelChoice::Llama3_8B.repo_id().to_string(),
            temperature: 0.5,
            max_tokens: 2048,
            top_k: 3,
        }
    }
}

impl ModelConfig {
    pub fn new(choice: ModelChoice) -> Self {
        Self {
            model_name: choice.repo_id().to_string(),
            ..Self::default()
        }
    }

    pub fn choice(&self) -> Option<ModelChoice> {
        ModelChoice::from_name(&self.model_name)
    }

    pub fn validate(&self) -> Result<ModelChoice, ModelConfigError> {
        let choice = self
            .choice()
            .ok_or_else(|| ModelConfigError::UnknownModel(self.model_name.clone()))?;
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(ModelConfigError::TemperatureOutOfRange(self.temperature));
        }
        if !MAX_TOKENS_RANGE.contains(&self.max_tokens) {
            return Err(ModelConfigError::MaxTokensOutOfRange(self.max_tokens));
        }
        if !TOP_K_RANGE.contains(&self.top_k) {
            return Err(ModelConfigError::TopKOutOfRange(self.top_k));
        }
        Ok(choice)
    }
}

/// Client-side record of the vector index built by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub index_id: IndexId,
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub message: String,
}
