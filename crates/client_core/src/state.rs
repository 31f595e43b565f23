//! Session lifecycle and the table of which commands each phase accepts.

use std::fmt;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Empty,
    FilesStaged,
    IndexPending,
    IndexReady,
    ModelPending,
    ModelReady,
}

impl SessionPhase {
    pub fn is_pending(self) -> bool {
        matches!(self, SessionPhase::IndexPending | SessionPhase::ModelPending)
    }

    pub fn has_index(self) -> bool {
        matches!(
            self,
            SessionPhase::IndexReady | SessionPhase::ModelPending | SessionPhase::ModelReady
        )
    }

    /// Phase after the upload set changed. Only the pre-index phases follow
    /// the upload set; an existing index stays valid when files are removed.
    pub fn settle_uploads(self, has_uploads: bool) -> Self {
        match (self, has_uploads) {
            (SessionPhase::Empty, true) => SessionPhase::FilesStaged,
            (SessionPhase::FilesStaged, false) => SessionPhase::Empty,
            (phase, _) => phase,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Empty => "sin documentos",
            SessionPhase::FilesStaged => "documentos seleccionados",
            SessionPhase::IndexPending => "procesando documentos",
            SessionPhase::IndexReady => "base de datos lista",
            SessionPhase::ModelPending => "inicializando modelo",
            SessionPhase::ModelReady => "chatbot listo",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    StageFile,
    UnstageFile,
    CreateIndex,
    InitModel,
    SendMessage,
    Export,
    Summarize,
    Reset,
}

/// Central transition guard. Data preconditions (a non-empty upload set, a
/// non-empty transcript) are checked by the controller on top of this.
pub fn guard(phase: SessionPhase, chat_busy: bool, command: Command) -> Result<(), ValidationError> {
    use SessionPhase::*;

    let pending = || ValidationError::RequestPending { phase };
    match command {
        Command::StageFile | Command::UnstageFile | Command::Export => Ok(()),
        Command::CreateIndex => match phase {
            _ if phase.is_pending() => Err(pending()),
            _ if chat_busy => Err(ValidationError::ChatBusy),
            Empty => Err(ValidationError::EmptyUploadSet),
            _ => Ok(()),
        },
        Command::InitModel => match phase {
            _ if phase.is_pending() => Err(pending()),
            _ if chat_busy => Err(ValidationError::ChatBusy),
            _ if phase.has_index() => Ok(()),
            _ => Err(ValidationError::IndexRequired),
        },
        Command::SendMessage => match phase {
            ModelReady => Ok(()),
            ModelPending => Err(pending()),
            _ => Err(ValidationError::SessionRequired),
        },
        // A summary only needs the index, so it may overlap a model init.
        Command::Summarize => match phase {
            IndexPending => Err(pending()),
            _ if phase.has_index() => Ok(()),
            _ => Err(ValidationError::IndexRequired),
        },
        Command::Reset => match phase {
            _ if phase.is_pending() => Err(pending()),
            _ if chat_busy => Err(ValidationError::ChatBusy),
            _ => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_moves_between_empty_and_staged_only() {
        assert_eq!(
            SessionPhase::Empty.settle_uploads(true),
            SessionPhase::FilesStaged
        );
        assert_eq!(
            SessionPhase::FilesStaged.settle_uploads(false),
            SessionPhase::Empty
        );
        assert_eq!(
            SessionPhase::ModelReady.settle_uploads(false),
            SessionPhase::ModelReady
        );
        assert_eq!(
            SessionPhase::IndexPending.settle_uploads(false),
            SessionPhase::IndexPending
        );
    }

    #[test]
    fn summary_follows_index_availability() {
        assert_eq!(
            guard(SessionPhase::FilesStaged, false, Command::Summarize),
            Err(ValidationError::IndexRequired)
        );
        assert!(matches!(
            guard(SessionPhase::IndexPending, false, Command::Summarize),
            Err(ValidationError::RequestPending { .. })
        ));
        assert!(guard(SessionPhase::ModelPending, false, Command::Summarize).is_ok());
        assert!(guard(SessionPhase::ModelReady, true, Command::Summarize).is_ok());
    }

    #[test]
    fn index_creation_needs_staged_files() {
        assert_eq!(
            guard(SessionPhase::Empty, false, Command::CreateIndex),
            Err(ValidationError::EmptyUploadSet)
        );
        assert!(guard(SessionPhase::FilesStaged, false, Command::CreateIndex).is_ok());
        assert!(guard(SessionPhase::ModelReady, false, Command::CreateIndex).is_ok());
        assert!(matches!(
            guard(SessionPhase::IndexPending, false, Command::CreateIndex),
            Err(ValidationError::RequestPending { .. })
        ));
    }

    #[test]
    fn model_init_needs_index() {
        assert_eq!(
            guard(SessionPhase::FilesStaged, false, Command::InitModel),
            Err(ValidationError::IndexRequired)
        );
        assert!(guard(SessionPhase::IndexReady, false, Command::InitModel).is_ok());
        assert!(guard(SessionPhase::ModelReady, false, Command::InitModel).is_ok());
        assert_eq!(
            guard(SessionPhase::ModelReady, true, Command::InitModel),
            Err(ValidationError::ChatBusy)
        );
    }

    #[test]
    fn messages_need_open_session() {
        for phase in [
            SessionPhase::Empty,
            SessionPhase::FilesStaged,
            SessionPhase::IndexPending,
            SessionPhase::IndexReady,
        ] {
            assert_eq!(
                guard(phase, false, Command::SendMessage),
                Err(ValidationError::SessionRequired)
            );
        }
        assert!(guard(SessionPhase::ModelReady, false, Command::SendMessage).is_ok());
    }

    #[test]
    fn export_and_staging_are_always_allowed() {
        for phase in [
            SessionPhase::Empty,
            SessionPhase::IndexPending,
            SessionPhase::ModelReady,
        ] {
            assert!(guard(phase, true, Command::Export).is_ok());
            assert!(guard(phase, true, Command::StageFile).is_ok());
            assert!(guard(phase, true, Command::UnstageFile).is_ok());
        }
    }

    #[test]
    fn reset_waits_for_in_flight_work() {
        assert!(guard(SessionPhase::ModelReady, false, Command::Reset).is_ok());
        assert_eq!(
            guard(SessionPhase::ModelReady, true, Command::Reset),
            Err(ValidationError::ChatBusy)
        );
        assert!(guard(SessionPhase::ModelPending, false, Command::Reset).is_err());
    }
}
