//! Bolo client binary - composition root.
//!
//! 1. Initialize tracing and load configuration
//! 2. Build the service client, recognizer and player from config
//! 3. Check that speech capture is available
//! 4. Restore the persisted identity, load languages and history
//! 5. Run the requested command (interactive chat by default)

mod cli;
mod commands;
mod repl;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use bolo_audio::PlaybackController;
use bolo_chat::{ConversationOrchestrator, LanguageSelector};
use bolo_client::{ChatService, HttpChatService};
use bolo_core::config::{BoloConfig, SpeechConfig};
use bolo_session::{FileKeyValueStore, SessionStore};
use bolo_speech::{CaptureController, RemoteRecognizer, SpeechRecognizer, UnsupportedRecognizer};

use cli::{CliArgs, Command};
use repl::Orchestrator;

/// File under the data directory holding the persisted identity.
const IDENTITY_FILE: &str = "identity.toml";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Log to stderr so the conversation on stdout stays readable.
fn init_tracing(level: &str) -> FilterHandle {
    let (filter, handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

fn build_recognizer(
    speech: &SpeechConfig,
    service: Arc<dyn ChatService>,
) -> Arc<dyn SpeechRecognizer> {
    match speech.engine.as_str() {
        "remote" => Arc::new(RemoteRecognizer::new(
            service,
            speech.resolved_input(),
            speech.chunk_ms,
        )),
        "disabled" => Arc::new(UnsupportedRecognizer),
        other => {
            tracing::warn!(engine = %other, "Unknown speech engine, capture unavailable");
            Arc::new(UnsupportedRecognizer)
        }
    }
}

async fn run_ask(orchestrator: &Orchestrator, text: &str) {
    let outcome = orchestrator.send_message(text).await;
    repl::print_outcome(&outcome);
    // Let the answer finish playing before the player is killed on exit.
    while orchestrator.playback().is_active().await {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing.
    let filter = init_tracing(args.log_level.as_deref().unwrap_or("info"));
    tracing::info!("Starting Bolo v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = BoloConfig::load_or_default(&config_file);
    args.apply(&mut config);
    if std::env::var("RUST_LOG").is_err() && args.log_level.is_none() {
        if let Err(e) = filter.reload(EnvFilter::new(&config.general.log_level)) {
            tracing::warn!(error = %e, "Could not apply configured log level");
        }
    }

    // Service.
    let timeout = match config.service.request_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let service: Arc<dyn ChatService> =
        Arc::new(HttpChatService::new(&config.service.base_url, timeout)?);
    tracing::info!(base_url = %config.service.base_url, "Service client ready");

    let command = args.command();
    match &command {
        Command::Health => {
            let health = service.health().await?;
            println!(
                "status: {}  census: {}  translation: {}",
                health.status, health.census_enabled, health.translation_enabled
            );
            if !health.is_ok() {
                return Err(format!("service reports status {}", health.status).into());
            }
            return Ok(());
        }
        Command::History { user } => {
            for record in service.user_history(user).await? {
                println!("session {}", record.session_id);
                for turn in record.turns() {
                    let who = if turn.is_user { "you" } else { "bolo" };
                    println!("  {}> {}", who, turn.text);
                }
            }
            return Ok(());
        }
        Command::Languages => {
            let selector =
                LanguageSelector::new(&config.language.default, config.language.fallback.clone());
            selector.load(service.as_ref()).await;
            for option in selector.options() {
                println!("{:<4} {}", option.code, option.name);
            }
            return Ok(());
        }
        Command::Chat | Command::Ask { .. } => {}
    }

    // Capability check.
    let capture = CaptureController::new(build_recognizer(&config.speech, Arc::clone(&service)));
    if !capture.is_supported() {
        eprintln!("Speech recognition is not supported on this system.");
        eprintln!("Set [speech] engine = \"remote\" in {} to enable it.", config_file.display());
        return Ok(());
    }

    // Storage.
    let data_dir = config.general.resolved_data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let session = SessionStore::new(FileKeyValueStore::new(data_dir.join(IDENTITY_FILE)));

    let orchestrator: Arc<Orchestrator> = Arc::new(
        ConversationOrchestrator::new(
            Arc::clone(&service),
            config.service.base_url.clone(),
            session,
            config.chat.clone(),
        )
        .with_capture(capture)
        .with_playback(PlaybackController::from_config(&config.playback))
        .with_languages(LanguageSelector::new(
            &config.language.default,
            config.language.fallback.clone(),
        )),
    );

    // Startup fetches.
    match orchestrator.restore().await {
        Ok(Some(identity)) => tracing::info!(user_id = %identity.user_id, "Resumed session"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Could not restore identity"),
    }
    orchestrator.load_languages().await;
    if let Some(ref language) = args.language {
        if let Err(e) = orchestrator.languages().select_fuzzy(language) {
            tracing::warn!(language = %language, error = %e, "Ignoring --language");
        }
    }
    if let Some(ref user) = args.user {
        let current = orchestrator.identity().map(|i| i.user_id);
        if current.as_deref() != Some(user.trim()) {
            if let Err(e) = orchestrator.login(user).await {
                eprintln!("Login failed: {}", e);
            }
        }
    }

    match command {
        Command::Ask { text } => run_ask(&orchestrator, &text.join(" ")).await,
        _ => repl::run(Arc::clone(&orchestrator)).await?,
    }
    Ok(())
}
