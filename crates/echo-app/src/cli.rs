//! CLI argument definitions for the Echo relay.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clap::Parser;

use echo_core::config::EchoConfig;
use echo_core::error::EchoError;

/// Echo - a chat relay between a front-end and a local Ollama model.
#[derive(Parser, Debug, Default)]
#[command(name = "echo", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Interface the API server binds to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// JSON file holding the conversation log.
    #[arg(short = 'm', long = "memory-file")]
    pub memory_file: Option<PathBuf>,

    /// Base URL of the Ollama server.
    #[arg(long = "ollama-url")]
    pub ollama_url: Option<String>,

    /// Ollama model tag.
    #[arg(long = "model")]
    pub model: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Write the resolved configuration to the config path and exit.
    #[arg(long = "write-config")]
    pub write_config: bool,
}

/// Where the configuration came from.
///
/// Config is read before the tracing subscriber exists, so the outcome is
/// kept and logged once logging is up.
#[derive(Debug)]
pub enum ConfigSource {
    /// Parsed from the file.
    File,
    /// No file at the path; defaults in use.
    Missing,
    /// The file exists but could not be read or parsed; defaults in use.
    Invalid(EchoError),
}

/// Read the config file without logging.
pub fn load_config(path: &Path) -> (EchoConfig, ConfigSource) {
    match EchoConfig::load(path) {
        Ok(config) => (config, ConfigSource::File),
        Err(EchoError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            (EchoConfig::default(), ConfigSource::Missing)
        }
        Err(e) => (EchoConfig::default(), ConfigSource::Invalid(e)),
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ECHO_CONFIG env var > ~/.echo/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ECHO_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        let env_port = std::env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok());
        self.port.or(env_port).unwrap_or(config_port)
    }

    /// Priority: --ollama-url flag > OLLAMA_URL env var > config file value.
    pub fn resolve_ollama_url(&self, config_url: &str) -> String {
        pick(self.ollama_url.as_deref(), env_var("OLLAMA_URL"), config_url)
    }

    /// Priority: --model flag > OLLAMA_MODEL env var > config file value.
    pub fn resolve_model(&self, config_model: &str) -> String {
        pick(self.model.as_deref(), env_var("OLLAMA_MODEL"), config_model)
    }

    /// Priority: --memory-file flag > ECHO_MEMORY_FILE env var > config file value.
    pub fn resolve_memory_file(&self, config_path: &str) -> String {
        let flag = self
            .memory_file
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());
        pick(flag.as_deref(), env_var("ECHO_MEMORY_FILE"), config_path)
    }

    /// Priority: --host flag > config file value.
    pub fn resolve_host(&self, config_host: &str) -> String {
        pick(self.host.as_deref(), None, config_host)
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        pick(self.log_level.as_deref(), None, config_level)
    }

    /// Fold every override into a loaded config.
    pub fn apply(&self, config: &mut EchoConfig) {
        config.server.port = self.resolve_port(config.server.port);
        config.server.host = self.resolve_host(&config.server.host);
        config.inference.url = self.resolve_ollama_url(&config.inference.url);
        config.inference.model = self.resolve_model(&config.inference.model);
        config.memory.path = self.resolve_memory_file(&config.memory.path);
        config.general.log_level = self.resolve_log_level(&config.general.log_level);
    }
}

/// Non-empty value of an environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn pick(flag: Option<&str>, env: Option<String>, config: &str) -> String {
    match (flag, env) {
        (Some(f), _) => f.to_string(),
        (None, Some(e)) => e,
        (None, None) => config.to_string(),
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".echo").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".echo").join("config.toml");
    }
    PathBuf::from("config.toml")
}
