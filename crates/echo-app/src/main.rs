//! Echo application binary - composition root.
//!
//! 1. Resolve configuration (CLI > env > TOML > defaults) and install tracing
//! 2. Load the conversation log from its JSON file
//! 3. Connect the Ollama backend
//! 4. Start the axum API server

mod cli;

use std::sync::Arc;

use clap::Parser;

use echo_api::AppState;
use echo_chat::{ChatRelay, OllamaBackend};
use echo_storage::{MemoryFile, MemoryStore};

use cli::{load_config, CliArgs, ConfigSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Read before tracing exists; the outcome is logged below.
    let config_file = args.resolve_config_path();
    let (mut config, source) = load_config(&config_file);
    args.apply(&mut config);

    // Tracing. RUST_LOG wins over --log-level, which wins over the file.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Echo v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        ConfigSource::File => {
            tracing::info!(path = %config_file.display(), "Configuration loaded")
        }
        ConfigSource::Missing => {
            tracing::info!(path = %config_file.display(), "No config file, using defaults")
        }
        ConfigSource::Invalid(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    if args.write_config {
        if let ConfigSource::Invalid(_) = source {
            return Err(format!(
                "refusing to overwrite unreadable config at {}",
                config_file.display()
            )
            .into());
        }
        config.save(&config_file)?;
        return Ok(());
    }

    // Memory.
    let store = Arc::new(MemoryStore::open(MemoryFile::new(&config.memory.path)));

    // Inference backend.
    let backend = OllamaBackend::new(&config.inference)?;
    match backend.health_check().await {
        Ok(()) => tracing::info!(
            url = backend.base_url(),
            model = %config.inference.model,
            "Ollama reachable"
        ),
        Err(e) => tracing::warn!(
            url = backend.base_url(),
            error = %e,
            "Ollama not reachable yet, chat turns will fail until it is"
        ),
    }

    let relay = ChatRelay::new(store, Arc::new(backend), config.chat.clone());
    let state = AppState::new(relay);

    echo_api::start_server(&config.server, state).await?;

    Ok(())
}
