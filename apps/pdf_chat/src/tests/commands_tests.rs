use super::*;

fn parsed(line: &str) -> ReplCommand {
    parse_line(line).expect("not blank").expect("valid command")
}

#[test]
fn blank_lines_are_skipped() {
    assert_eq!(parse_line("   "), None);
}

#[test]
fn plain_text_is_a_message() {
    assert_eq!(
        parsed("  ¿De qué trata el informe?  "),
        ReplCommand::Message("¿De qué trata el informe?".to_string())
    );
}

#[test]
fn add_takes_several_paths() {
    assert_eq!(
        parsed("/add a.pdf docs/b.pdf"),
        ReplCommand::Add {
            paths: vec![PathBuf::from("a.pdf"), PathBuf::from("docs/b.pdf")]
        }
    );
    assert_eq!(
        parse_line("/add"),
        Some(Err(ParseError::MissingArgument("/add <ruta.pdf>...")))
    );
}

#[test]
fn remove_and_summary_keep_spaces_in_names() {
    assert_eq!(
        parsed("/remove informe anual.pdf"),
        ReplCommand::Remove {
            name: "informe anual.pdf".to_string()
        }
    );
    assert_eq!(
        parsed("/summary informe anual.pdf"),
        ReplCommand::Summary {
            filename: "informe anual.pdf".to_string()
        }
    );
}

#[test]
fn init_accepts_aliases_and_repo_ids() {
    assert_eq!(parsed("/init"), ReplCommand::Init { model: None });
    assert_eq!(
        parsed("/init mistral"),
        ReplCommand::Init {
            model: Some(ModelChoice::Mistral7B)
        }
    );
    assert_eq!(
        parsed("/init meta-llama/Meta-Llama-3-8B-Instruct"),
        ReplCommand::Init {
            model: Some(ModelChoice::Llama3_8B)
        }
    );
    assert_eq!(
        parse_line("/init gpt"),
        Some(Err(ParseError::UnknownModel("gpt".to_string())))
    );
}

#[test]
fn export_path_is_optional() {
    assert_eq!(parsed("/export"), ReplCommand::Export { path: None });
    assert_eq!(
        parsed("/export /tmp/chat.md"),
        ReplCommand::Export {
            path: Some(PathBuf::from("/tmp/chat.md"))
        }
    );
}

#[test]
fn unknown_verbs_are_errors() {
    assert_eq!(
        parse_line("/frobnicate now"),
        Some(Err(ParseError::UnknownCommand("frobnicate".to_string())))
    );
    assert_eq!(parsed("/q").name(), "quit");
}
