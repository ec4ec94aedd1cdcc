use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BoloError, Result};
use crate::language::{fallback_languages, DEFAULT_LANGUAGE};
use crate::types::LanguageOption;

/// Fixed bot turn shown when the answer service cannot produce a reply.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Sorry, I couldn't get an answer right now. Please try again.";

/// Top-level configuration for the Bolo client.
///
/// Loaded from `~/.bolo/config.toml` by default. Every section falls back to
/// its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoloConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl BoloConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BoloConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BoloError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the persisted identity and other local state.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.bolo".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl GeneralConfig {
    /// The data directory with a leading `~` expanded to the home directory.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }
}

/// Remote answering service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base address every endpoint and audio path is resolved against.
    pub base_url: String,
    /// Per-request timeout in seconds. 0 disables the timeout.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 0,
        }
    }
}

/// Language selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Code active at startup.
    pub default: String,
    /// Options offered when the service catalog is unavailable.
    pub fallback: Vec<LanguageOption>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_LANGUAGE.to_string(),
            fallback: fallback_languages(),
        }
    }
}

/// Speech capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognition engine: "remote" or "disabled".
    pub engine: String,
    /// WAV file the remote recognizer reads audio from.
    pub input: String,
    /// Audio window sent per recognition request, in milliseconds.
    pub chunk_ms: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: "remote".to_string(),
            input: "~/.bolo/capture.wav".to_string(),
            chunk_ms: 2000,
        }
    }
}

impl SpeechConfig {
    pub fn resolved_input(&self) -> PathBuf {
        expand_home(&self.input)
    }
}

/// Synthesized speech playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Whether synthesized answers are played at all.
    pub enabled: bool,
    /// External player executable.
    pub player: String,
    /// Arguments passed before the audio URL.
    pub player_args: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            player: "ffplay".to_string(),
            player_args: vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
            ],
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Bot turn appended when the answer request fails.
    pub fallback_message: String,
    /// Serialize the service round trips of concurrent sends so bot turns
    /// appear in the order the messages were sent. A hung request then holds
    /// back every later answer, so pair it with `request_timeout_secs`.
    pub serialize_turns: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            serialize_turns: false,
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = BoloConfig::default();
        assert_eq!(config.general.data_dir, "~/.bolo");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.service.base_url, "http://localhost:8000");
        assert_eq!(config.service.request_timeout_secs, 0);
        assert_eq!(config.language.default, "en");
        assert_eq!(config.language.fallback.len(), 6);
        assert_eq!(config.speech.engine, "remote");
        assert!(config.playback.enabled);
        assert!(!config.chat.serialize_turns);
        assert_eq!(config.chat.fallback_message, DEFAULT_FALLBACK_MESSAGE);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[service]
base_url = "https://census.example.org"
request_timeout_secs = 15

[language]
default = "hi"
fallback = [{ code = "en", name = "English" }]

[speech]
engine = "disabled"

[chat]
serialize_turns = true
"#;
        let file = create_temp_config(content);
        let config = BoloConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.service.base_url, "https://census.example.org");
        assert_eq!(config.service.request_timeout_secs, 15);
        assert_eq!(config.language.default, "hi");
        assert_eq!(config.language.fallback.len(), 1);
        assert_eq!(config.speech.engine, "disabled");
        assert_eq!(config.speech.chunk_ms, 2000);
        assert!(config.chat.serialize_turns);
        assert_eq!(config.chat.fallback_message, DEFAULT_FALLBACK_MESSAGE);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = BoloConfig::load_or_default(Path::new("/nonexistent/bolo.toml"));
        assert_eq!(config.general.data_dir, "~/.bolo");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[service\nbase_url = ");
        let err = BoloConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, BoloError::Config(_)));
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = BoloConfig::default();
        config.service.base_url = "http://10.0.0.2:8000".to_string();
        config.save(&path).unwrap();

        let reloaded = BoloConfig::load(&path).unwrap();
        assert_eq!(reloaded.service.base_url, "http://10.0.0.2:8000");
        assert_eq!(reloaded.language.fallback, config.language.fallback);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        let expanded = expand_home("~/.bolo");
        assert!(expanded.ends_with(".bolo"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
