use std::fmt::{Display, Write as _};

use chrono::{DateTime, TimeZone};
use shared::domain::{Role, Source, Turn};

pub const EXPORT_FILE_NAME: &str = "conversacion-chatbot-rag.md";
pub const EXPORT_TITLE: &str = "# Conversación con Chatbot RAG PDF";

const EXPORT_DATE_FORMAT: &str = "%d/%m/%Y";
const EXPORT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Append-only conversation history.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| turn.text.as_str())
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }
}

/// Sources of the latest assistant turn. Replaced wholesale, never merged.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    sources: Vec<Source>,
}

impl SourceSet {
    pub fn replace(&mut self, sources: Vec<Source>) {
        self.sources = sources;
    }

    pub fn as_slice(&self) -> &[Source] {
        &self.sources
    }
}

/// Markdown rendering of a conversation. Turn timestamps are shown in the
/// time zone of `today`.
pub fn render_export<Tz>(turns: &[Turn], indexed_files: &[String], today: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    out.push_str(EXPORT_TITLE);
    out.push('\n');
    let _ = writeln!(out, "Fecha: {}", today.format(EXPORT_DATE_FORMAT));
    let _ = writeln!(out, "Documentos analizados: {}", indexed_files.join(", "));
    out.push('\n');

    let zone = today.timezone();
    for turn in turns {
        let local = turn.timestamp.with_timezone(&zone);
        let _ = writeln!(
            out,
            "## {} ({})",
            turn.role.export_label(),
            local.format(EXPORT_TIMESTAMP_FORMAT)
        );
        out.push_str(&turn.text);
        out.push_str("\n\n");
    }
    out
}
