//! CLI argument definitions for the Bolo client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bolo_core::config::BoloConfig;

/// Bolo: ask questions by voice or text in your language and hear the answer.
#[derive(Parser, Debug)]
#[command(name = "bolo", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the answering service.
    #[arg(short = 'u', long = "base-url")]
    pub base_url: Option<String>,

    /// Data directory for the persisted identity.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Language code or name to start with.
    #[arg(long = "language")]
    pub language: Option<String>,

    /// Log in as this user at startup.
    #[arg(long = "user")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive conversation (default).
    Chat,
    /// Ask one question, print and play the answer, then exit.
    Ask {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// List the languages the service offers.
    Languages,
    /// Print the past sessions of a user.
    History { user: String },
    /// Check that the service is up.
    Health,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > BOLO_CONFIG env var > ~/.bolo/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("BOLO_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the service base URL.
    ///
    /// Priority: --base-url flag > BOLO_BASE_URL env var > config file value.
    pub fn resolve_base_url(&self, config_url: &str) -> String {
        if let Some(ref url) = self.base_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("BOLO_BASE_URL") {
            if !url.trim().is_empty() {
                return url;
            }
        }
        config_url.to_string()
    }

    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut BoloConfig) {
        config.service.base_url = self.resolve_base_url(&config.service.base_url);
        if let Some(ref dir) = self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".bolo").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".bolo").join("config.toml");
    }
    PathBuf::from("config.toml")
}
