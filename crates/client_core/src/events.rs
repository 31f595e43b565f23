//! Events published to the presenter.

use shared::domain::{Source, Turn};

use crate::{
    highlight::{self, Marker},
    state::SessionPhase,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Index,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    UploadsChanged {
        files: Vec<String>,
    },
    /// Persistent status line of the index / model setup steps.
    SetupStatusChanged {
        step: SetupStep,
        status: SetupStatus,
        message: String,
    },
    TurnAppended(Turn),
    /// The sources of the latest answer, with the keywords of the question
    /// they answer.
    SourcesReplaced {
        sources: Vec<Source>,
        keywords: Vec<String>,
    },
    ChatBusyChanged(bool),
    SummaryReady {
        filename: String,
        summary: String,
    },
    Notice {
        level: NoticeLevel,
        message: String,
    },
}

/// A source ready for display: header line plus highlighted snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSource {
    pub heading: String,
    pub snippet: String,
}

pub fn render_sources(
    sources: &[Source],
    keywords: &[String],
    marker: Marker<'_>,
) -> Vec<RenderedSource> {
    sources
        .iter()
        .map(|source| RenderedSource {
            heading: format!("Página {} - {}", source.page, source.filename),
            snippet: highlight::highlight(&source.content, keywords, marker),
        })
        .collect()
}
