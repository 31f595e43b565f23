use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    HttpBackend, SendOutcome, SessionController, SessionError, StageOutcome, StagedDocument,
};
use shared::domain::ModelConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod presenter;

use commands::{parse_line, ReplCommand, HELP};
use config::Settings;

#[derive(Parser, Debug)]
#[command(about = "Chat con documentos PDF sobre un servidor RAG")]
struct Args {
    /// Settings file; `pdf_chat.toml` is read when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    temperature: Option<f64>,
    #[arg(long)]
    max_tokens: Option<u32>,
    #[arg(long)]
    top_k: Option<u32>,
    #[arg(long)]
    export_path: Option<PathBuf>,
    /// PDFs to stage on startup.
    files: Vec<PathBuf>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.server_url {
            settings.server_url = v.clone();
        }
        if let Some(v) = &self.model {
            settings.model_name = v.clone();
        }
        if let Some(v) = self.temperature {
            settings.temperature = v;
        }
        if let Some(v) = self.max_tokens {
            settings.max_tokens = v;
        }
        if let Some(v) = self.top_k {
            settings.top_k = v;
        }
        if let Some(v) = &self.export_path {
            settings.export_path = v.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;
    tracing::info!(server_url = %settings.server_url, model = %settings.model_name, "starting pdf chat");

    let backend = HttpBackend::new(&settings.server_url)
        .with_context(|| format!("cannot use server url '{}'", settings.server_url))?;
    let controller = SessionController::new(Arc::new(backend));
    let presenter = tokio::spawn(presenter::run(controller.subscribe_events()));

    stage_paths(&controller, &args.files).await;
    println!("Escriba /help para ver los comandos.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match parse_line(&line) {
            None => continue,
            Some(Ok(command)) => command,
            Some(Err(err)) => {
                println!("{err}");
                continue;
            }
        };
        tracing::debug!(command = command.name(), "handling command");
        if command == ReplCommand::Quit {
            break;
        }
        if let Err(err) = handle(&controller, &settings, command).await {
            println!("Error: {err:#}");
        }
    }

    drop(controller);
    let _ = presenter.await;
    Ok(())
}

async fn handle(
    controller: &Arc<SessionController>,
    settings: &Settings,
    command: ReplCommand,
) -> Result<()> {
    match command {
        ReplCommand::Add { paths } => stage_paths(controller, &paths).await,
        ReplCommand::Remove { name } => {
            if !controller.unstage_file(&name).await {
                println!("{name} no está en la lista de archivos");
            }
        }
        ReplCommand::Files => {
            let snapshot = controller.snapshot().await;
            if snapshot.staged_files.is_empty() {
                println!("No hay archivos seleccionados");
            } else {
                for name in &snapshot.staged_files {
                    println!("  {name}");
                }
            }
        }
        ReplCommand::Index => log_rejection(controller.create_index().await),
        ReplCommand::Init { model } => {
            let config = match model {
                Some(choice) => ModelConfig {
                    model_name: choice.repo_id().to_string(),
                    ..settings.model_config()
                },
                None => settings.model_config(),
            };
            log_rejection(controller.initialize_model(config).await);
        }
        ReplCommand::Sources => {
            let snapshot = controller.snapshot().await;
            if snapshot.sources.is_empty() {
                println!("Sin fuentes para la última respuesta");
            } else {
                let keywords = controller.highlight_keywords().await;
                println!("{}", presenter::render_source_block(&snapshot.sources, &keywords));
            }
        }
        ReplCommand::Summary { filename } => {
            log_rejection(controller.summarize_document(&filename).await)
        }
        ReplCommand::Export { path } => {
            let markdown = match controller.export_transcript().await {
                Ok(markdown) => markdown,
                Err(err) => {
                    log_rejection::<()>(Err(err));
                    return Ok(());
                }
            };
            let path = path.unwrap_or_else(|| settings.export_path.clone());
            tokio::fs::write(&path, markdown)
                .await
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            println!("Conversación exportada exitosamente ({})", path.display());
        }
        ReplCommand::Reset => log_rejection(controller.reset().await),
        ReplCommand::Health => {
            let status = controller.check_health().await?;
            println!(
                "Servidor {} (versión {}, {})",
                status.status, status.version, status.timestamp
            );
        }
        ReplCommand::Status => {
            let snapshot = controller.snapshot().await;
            println!("Estado: {}", snapshot.phase);
            if let Some(index) = &snapshot.index {
                println!("Documentos indexados: {}", index.files.join(", "));
            }
            if let Some(session) = &snapshot.session {
                println!("Modelo: {}", session.model_label);
            }
            println!("Mensajes: {}", snapshot.transcript.len());
        }
        ReplCommand::Help => println!("{HELP}"),
        ReplCommand::Message(text) => match controller.send_message(&text).await {
            Ok(SendOutcome::Failed(err)) => tracing::debug!(error = %err, "chat failed"),
            Ok(SendOutcome::Answered | SendOutcome::Ignored) => {}
            Err(err) => tracing::debug!(error = %err, "message rejected"),
        },
        ReplCommand::Quit => {}
    }
    Ok(())
}

/// Rejections and backend failures already reach the presenter as events.
fn log_rejection<T>(result: Result<T, SessionError>) {
    if let Err(err) = result {
        tracing::debug!(error = %err, validation = err.is_validation(), "command not completed");
    }
}

async fn stage_paths(controller: &SessionController, paths: &[PathBuf]) {
    for path in paths {
        let document = match read_document(path).await {
            Ok(document) => document,
            Err(err) => {
                println!("Error: {err:#}");
                continue;
            }
        };
        let name = document.name().to_string();
        match controller.stage_file(document).await {
            Ok(StageOutcome::Duplicate) => println!("{name} ya está en la lista"),
            Ok(StageOutcome::Added) => {}
            Err(err) => tracing::debug!(file = %name, error = %err, "file not staged"),
        }
    }
}

async fn read_document(path: &std::path::Path) -> Result<StagedDocument> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("'{}' is not a file", path.display()))?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(StagedDocument::new(name, content_type.essence_str(), bytes))
}
