//! Prints session events to the terminal.

use client_core::{
    events::{render_sources, RenderedSource},
    format::{format_bot_text_with, TextStyle},
    highlight::Marker,
    NoticeLevel, SessionEvent, SetupStatus, SetupStep,
};
use shared::domain::{Role, Source};
use tokio::sync::broadcast::{self, error::RecvError};

pub const TERMINAL_MARKER: Marker<'static> = Marker {
    open: "\x1b[1;33m",
    close: "\x1b[0m",
};

pub const TERMINAL_STYLE: TextStyle<'static> = TextStyle {
    bold: Marker {
        open: "\x1b[1m",
        close: "\x1b[22m",
    },
    italic: Marker {
        open: "\x1b[3m",
        close: "\x1b[23m",
    },
    paragraph_break: "\n\n",
    line_break: "\n",
};

pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::UploadsChanged { files } if files.is_empty() => {
            Some("No hay archivos seleccionados".to_string())
        }
        SessionEvent::UploadsChanged { files } => Some(format!("Archivos: {}", files.join(", "))),
        SessionEvent::SetupStatusChanged {
            step,
            status,
            message,
        } => {
            let step = match step {
                SetupStep::Index => "índice",
                SetupStep::Model => "modelo",
            };
            let status = match status {
                SetupStatus::Pending => "…",
                SetupStatus::Success => "ok",
                SetupStatus::Error => "error",
            };
            Some(format!("[{step} {status}] {message}"))
        }
        // The user's own turn is already on screen.
        SessionEvent::TurnAppended(turn) => match turn.role {
            Role::User => None,
            Role::Assistant => Some(format!(
                "Asistente: {}",
                format_bot_text_with(&turn.text, TERMINAL_STYLE)
            )),
        },
        SessionEvent::SourcesReplaced { sources, keywords } if !sources.is_empty() => {
            Some(render_source_block(sources, keywords))
        }
        SessionEvent::SourcesReplaced { .. } => None,
        SessionEvent::ChatBusyChanged(true) => Some("Escribiendo…".to_string()),
        SessionEvent::ChatBusyChanged(false) => None,
        SessionEvent::SummaryReady { filename, summary } => {
            Some(format!("Resumen de {filename}:\n{summary}"))
        }
        SessionEvent::Notice { level, message } => {
            let tag = match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Success => "ok",
                NoticeLevel::Warning => "aviso",
                NoticeLevel::Error => "error",
            };
            Some(format!("[{tag}] {message}"))
        }
        SessionEvent::PhaseChanged { .. } => None,
    }
}

pub fn render_source_block(sources: &[Source], keywords: &[String]) -> String {
    let mut out = String::from("Fuentes:");
    for RenderedSource { heading, snippet } in render_sources(sources, keywords, TERMINAL_MARKER) {
        out.push_str("\n  ");
        out.push_str(&heading);
        out.push_str("\n    ");
        out.push_str(&snippet);
    }
    out
}

pub async fn run(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let SessionEvent::PhaseChanged { from, to } = &event {
                    tracing::debug!(%from, %to, "session phase changed");
                }
                if let Some(line) = render_event(&event) {
                    println!("{line}");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "presenter lagged behind session events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::Turn;

    #[test]
    fn sources_are_listed_with_highlighted_snippets() {
        let sources = vec![Source {
            page: 2,
            filename: "contrato.pdf".to_string(),
            content: "El contrato vence en marzo".to_string(),
        }];
        let block = render_source_block(&sources, &["contrato".to_string()]);

        assert_eq!(
            block,
            "Fuentes:\n  Página 2 - contrato.pdf\n    El \x1b[1;33mcontrato\x1b[0m vence en marzo"
        );
    }

    #[test]
    fn user_turns_and_phase_changes_are_silent() {
        assert_eq!(render_event(&SessionEvent::TurnAppended(Turn::user("hola"))), None);
        assert_eq!(
            render_event(&SessionEvent::TurnAppended(Turn::assistant("¡Hola!"))),
            Some("Asistente: ¡Hola!".to_string())
        );
        assert_eq!(
            render_event(&SessionEvent::SourcesReplaced {
                sources: Vec::new(),
                keywords: Vec::new(),
            }),
            None
        );
    }

    #[test]
    fn assistant_markdown_is_styled() {
        assert_eq!(
            render_event(&SessionEvent::TurnAppended(Turn::assistant("**Sí**\n\n*ok*"))),
            Some("Asistente: \x1b[1mSí\x1b[22m\n\n\x1b[3mok\x1b[23m".to_string())
        );
    }

    #[test]
    fn setup_status_names_the_step() {
        let event = SessionEvent::SetupStatusChanged {
            step: SetupStep::Index,
            status: SetupStatus::Error,
            message: "Error al crear la base de datos".to_string(),
        };
        assert_eq!(
            render_event(&event),
            Some("[índice error] Error al crear la base de datos".to_string())
        );
    }
}
