use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn defaults_match_backend_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.server_url, "http://127.0.0.1:5000");
    assert_eq!(settings.model_config(), ModelConfig::default());
    assert_eq!(settings.export_path, PathBuf::from("conversacion-chatbot-rag.md"));
    settings.validate().expect("defaults are valid");
}

#[test]
fn toml_overrides_only_present_keys() {
    let mut settings = Settings::default();
    settings
        .apply_toml(
            r#"
            server_url = "http://rag.internal:8080"
            model_name = "mistralai/Mistral-7B-Instruct-v0.2"
            top_k = 5
            "#,
        )
        .expect("parse");

    assert_eq!(settings.server_url, "http://rag.internal:8080");
    assert_eq!(settings.model_name, "mistralai/Mistral-7B-Instruct-v0.2");
    assert_eq!(settings.top_k, 5);
    assert_eq!(settings.max_tokens, 2048);
}

#[test]
fn malformed_toml_is_an_error() {
    let mut settings = Settings::default();
    assert!(settings.apply_toml("top_k = \"many\"").is_err());
}

#[test]
fn env_overrides_file_and_skips_bad_numbers() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("APP__SERVER_URL", "https://rag.example.com"),
        ("APP__TEMPERATURE", "0.2"),
        ("APP__MAX_TOKENS", "lots"),
    ]);
    let mut settings = Settings::default();
    settings.apply_env(|key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_url, "https://rag.example.com");
    assert_eq!(settings.temperature, 0.2);
    assert_eq!(settings.max_tokens, 2048);
}

#[test]
fn validate_rejects_bad_url_and_model() {
    let mut settings = Settings {
        server_url: "ftp://rag".into(),
        ..Settings::default()
    };
    assert!(settings.validate().is_err());

    settings.server_url = DEFAULT_SERVER_URL.into();
    settings.model_name = "gpt-4o".into();
    assert!(settings.validate().is_err());
}

#[test]
fn explicit_settings_file_is_loaded() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("pdf_chat_settings_{suffix}.toml"));
    fs::write(&path, "max_tokens = 512\nexport_path = \"chat.md\"\n").expect("write");

    let settings = load_settings(Some(path.as_path())).expect("load");

    assert_eq!(settings.max_tokens, 512);
    assert_eq!(settings.export_path, PathBuf::from("chat.md"));
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn missing_explicit_settings_file_is_an_error() {
    let path = env::temp_dir().join("pdf_chat_settings_does_not_exist.toml");
    assert!(load_settings(Some(path.as_path())).is_err());
}
