//! Commands typed at the chat prompt.

use std::path::PathBuf;

use shared::domain::ModelChoice;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Add { paths: Vec<PathBuf> },
    Remove { name: String },
    Files,
    Index,
    Init { model: Option<ModelChoice> },
    Sources,
    Summary { filename: String },
    Export { path: Option<PathBuf> },
    Reset,
    Health,
    Status,
    Help,
    Quit,
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("comando desconocido: /{0}")]
    UnknownCommand(String),
    #[error("uso: {0}")]
    MissingArgument(&'static str),
    #[error("modelo desconocido: {0}")]
    UnknownModel(String),
}

pub const HELP: &str = "\
/add <ruta.pdf>...   agregar PDFs
/remove <nombre>     quitar un PDF
/files               listar PDFs
/index               crear la base de datos vectorial
/init [llama|mistral] inicializar el chatbot
/sources             mostrar las fuentes de la última respuesta
/summary <nombre>    resumir un documento
/export [ruta]       exportar la conversación
/reset               reiniciar la sesión
/health              estado del servidor
/status              estado de la sesión
/quit                salir
Cualquier otro texto se envía como pregunta.";

impl ReplCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ReplCommand::Add { .. } => "add",
            ReplCommand::Remove { .. } => "remove",
            ReplCommand::Files => "files",
            ReplCommand::Index => "index",
            ReplCommand::Init { .. } => "init",
            ReplCommand::Sources => "sources",
            ReplCommand::Summary { .. } => "summary",
            ReplCommand::Export { .. } => "export",
            ReplCommand::Reset => "reset",
            ReplCommand::Health => "health",
            ReplCommand::Status => "status",
            ReplCommand::Help => "help",
            ReplCommand::Quit => "quit",
            ReplCommand::Message(_) => "message",
        }
    }
}

/// Returns `None` for blank lines.
pub fn parse_line(line: &str) -> Option<Result<ReplCommand, ParseError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Ok(ReplCommand::Message(line.to_string())));
    };

    let (verb, arg) = match rest.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (rest, ""),
    };

    let command = match verb {
        "add" => {
            let paths: Vec<PathBuf> = arg.split_whitespace().map(PathBuf::from).collect();
            if paths.is_empty() {
                return Some(Err(ParseError::MissingArgument("/add <ruta.pdf>...")));
            }
            ReplCommand::Add { paths }
        }
        "remove" | "rm" => {
            if arg.is_empty() {
                return Some(Err(ParseError::MissingArgument("/remove <nombre>")));
            }
            ReplCommand::Remove {
                name: arg.to_string(),
            }
        }
        "files" | "ls" => ReplCommand::Files,
        "index" => ReplCommand::Index,
        "init" => {
            if arg.is_empty() {
                ReplCommand::Init { model: None }
            } else {
                match parse_model(arg) {
                    Some(choice) => ReplCommand::Init {
                        model: Some(choice),
                    },
                    None => return Some(Err(ParseError::UnknownModel(arg.to_string()))),
                }
            }
        }
        "sources" => ReplCommand::Sources,
        "summary" => {
            if arg.is_empty() {
                return Some(Err(ParseError::MissingArgument("/summary <nombre>")));
            }
            ReplCommand::Summary {
                filename: arg.to_string(),
            }
        }
        "export" => ReplCommand::Export {
            path: (!arg.is_empty()).then(|| PathBuf::from(arg)),
        },
        "reset" => ReplCommand::Reset,
        "health" => ReplCommand::Health,
        "status" => ReplCommand::Status,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => return Some(Err(ParseError::UnknownCommand(other.to_string()))),
    };
    Some(Ok(command))
}

/// Accepts a full repo id or a short alias.
fn parse_model(arg: &str) -> Option<ModelChoice> {
    if let Some(choice) = ModelChoice::from_name(arg) {
        return Some(choice);
    }
    let lower = arg.to_lowercase();
    ModelChoice::ALL
        .iter()
        .copied()
        .find(|choice| choice.label().to_lowercase().starts_with(&lower))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
