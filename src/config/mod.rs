// src/config/mod.rs
// Configuration: CLI/env overrides, ~/.squad-goals/config.toml, defaults
//
// Resolution order is CLI flag > environment variable > config file > default.
// Clap handles the first two, so callers pass both in as `ConfigOverrides`.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{GoalError, Result};

pub const DEFAULT_CSV_PATH: &str = "~/.priv_goals/goals.csv";
pub const DEFAULT_CREDENTIALS_PATH: &str = "config/service_account.json";
pub const DEFAULT_SHEET_NAME: &str = "SQUAD GOALS";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Provider prefixes stripped from the model name before it goes on the wire
const PROVIDER_PREFIXES: &[&str] = &["openai", "ollama", "ollama_chat", "litellm_proxy"];

/// Which goal table backs the store. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    FlatFile,
    RemoteTable,
}

impl FromStr for StorageBackend {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "flat_file" => Ok(Self::FlatFile),
            "remote_table" => Ok(Self::RemoteTable),
            other => Err(GoalError::Config(format!(
                "invalid STORAGE_BACKEND '{other}': choose 'flat_file' or 'remote_table'"
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlatFile => write!(f, "flat_file"),
            Self::RemoteTable => write!(f, "remote_table"),
        }
    }
}

/// Contents of ~/.squad-goals/config.toml. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub storage_backend: Option<String>,
    pub goals_csv_path: Option<String>,
    pub google_sheets_credentials: Option<String>,
    pub google_sheets_name: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Load ~/.squad-goals/config.toml, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load a config file. A missing file yields defaults; an unreadable or
    /// malformed one is reported and also yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        // Runs before logging is set up
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Values from CLI flags or their environment variables
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub storage_backend: Option<String>,
    pub goals_csv_path: Option<String>,
    pub google_sheets_credentials: Option<String>,
    pub google_sheets_name: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Used only when no other API key is configured
    pub openai_api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub log_level: Option<String>,
}

/// Chat model endpoint settings
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Full model name, provider prefix included (e.g. `ollama_chat/llama3`)
    pub name: String,
    pub api_key: Option<String>,
    pub base_url: String,
}

impl ModelSettings {
    /// The model name the endpoint expects
    pub fn wire_name(&self) -> &str {
        match self.name.split_once('/') {
            Some((prefix, rest)) if PROVIDER_PREFIXES.contains(&prefix) => rest,
            _ => &self.name,
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StorageBackend,
    pub csv_path: PathBuf,
    pub credentials_path: PathBuf,
    pub sheet_name: String,
    pub model: ModelSettings,
    pub log_level: String,
}

impl AppConfig {
    pub fn resolve(overrides: ConfigOverrides, file: FileConfig) -> Result<Self> {
        let backend = overrides
            .storage_backend
            .or(file.storage_backend)
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or_default();

        let name = normalize_model_name(
            &overrides
                .model
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        );
        let is_ollama = is_ollama_model(&name);

        let api_key = overrides
            .api_key
            .or(file.api_key)
            .or(overrides.openai_api_key)
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() && !is_ollama {
            return Err(GoalError::Config(format!(
                "an API key is required for model '{name}' \
                 (set LITE_LLM_API_KEY, OPENAI_API_KEY or api_key in {})",
                config_path().display()
            )));
        }

        let base_url = overrides.api_base_url.or(file.api_base_url).unwrap_or_else(|| {
            if is_ollama {
                DEFAULT_OLLAMA_BASE_URL.to_string()
            } else {
                DEFAULT_API_BASE_URL.to_string()
            }
        });

        Ok(Self {
            backend,
            csv_path: PathBuf::from(
                overrides
                    .goals_csv_path
                    .or(file.goals_csv_path)
                    .unwrap_or_else(|| DEFAULT_CSV_PATH.to_string()),
            ),
            credentials_path: PathBuf::from(
                overrides
                    .google_sheets_credentials
                    .or(file.google_sheets_credentials)
                    .unwrap_or_else(|| DEFAULT_CREDENTIALS_PATH.to_string()),
            ),
            sheet_name: overrides
                .google_sheets_name
                .or(file.google_sheets_name)
                .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            model: ModelSettings {
                name,
                api_key,
                base_url,
            },
            log_level: overrides
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

/// Local ollama models need no API key.
fn is_ollama_model(name: &str) -> bool {
    name.starts_with("ollama")
}

/// `ollama/<model>` is served through the chat endpoint as `ollama_chat/<model>`.
pub fn normalize_model_name(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_prefix("ollama/") {
        Some(model) => format!("ollama_chat/{model}"),
        None => raw.to_string(),
    }
}

/// ~/.squad-goals
pub fn config_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".squad-goals")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn env_path() -> PathBuf {
    config_dir().join(".env")
}

pub fn history_path() -> PathBuf {
    config_dir().join("chat_history")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> ConfigOverrides {
        ConfigOverrides {
            api_key: Some("sk-test".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("flat_file".parse::<StorageBackend>().unwrap(), StorageBackend::FlatFile);
        assert_eq!(
            "remote_table".parse::<StorageBackend>().unwrap(),
            StorageBackend::RemoteTable
        );
        let err = "csv".parse::<StorageBackend>().unwrap_err();
        assert!(matches!(err, GoalError::Config(_)));
        assert!(err.to_string().contains("'csv'"));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::resolve(with_key(), FileConfig::default()).unwrap();
        assert_eq!(config.backend, StorageBackend::FlatFile);
        assert_eq!(config.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
        assert_eq!(config.credentials_path, PathBuf::from(DEFAULT_CREDENTIALS_PATH));
        assert_eq!(config.sheet_name, "SQUAD GOALS");
        assert_eq!(config.model.name, "gpt-4");
        assert_eq!(config.model.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_unknown_backend_is_fatal() {
        let overrides = ConfigOverrides {
            storage_backend: Some("google_sheets".into()),
            ..with_key()
        };
        assert!(AppConfig::resolve(overrides, FileConfig::default()).is_err());
    }

    #[test]
    fn test_overrides_beat_file() {
        let file: FileConfig = toml::from_str(
            r#"
            storage_backend = "remote_table"
            google_sheets_name = "From File"
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        let overrides = ConfigOverrides {
            google_sheets_name: Some("From Flag".into()),
            ..with_key()
        };

        let config = AppConfig::resolve(overrides, file).unwrap();
        assert_eq!(config.backend, StorageBackend::RemoteTable);
        assert_eq!(config.sheet_name, "From Flag");
        assert_eq!(config.model.name, "gpt-4o");
    }

    #[test]
    fn test_api_key_fallback_order() {
        let overrides = ConfigOverrides {
            openai_api_key: Some("sk-openai".into()),
            ..Default::default()
        };
        let config = AppConfig::resolve(overrides.clone(), FileConfig::default()).unwrap();
        assert_eq!(config.model.api_key.as_deref(), Some("sk-openai"));

        let file = FileConfig {
            api_key: Some("sk-file".into()),
            ..Default::default()
        };
        let config = AppConfig::resolve(overrides, file).unwrap();
        assert_eq!(config.model.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn test_missing_api_key_is_fatal_except_ollama() {
        assert!(AppConfig::resolve(ConfigOverrides::default(), FileConfig::default()).is_err());

        let overrides = ConfigOverrides {
            model: Some("ollama/llama3".into()),
            ..Default::default()
        };
        let config = AppConfig::resolve(overrides, FileConfig::default()).unwrap();
        assert!(config.model.api_key.is_none());
        assert_eq!(config.model.name, "ollama_chat/llama3");
        assert_eq!(config.model.wire_name(), "llama3");
        assert_eq!(config.model.base_url, DEFAULT_OLLAMA_BASE_URL);
    }

    #[test]
    fn test_wire_name_keeps_unknown_prefixes() {
        let settings = |name: &str| ModelSettings {
            name: name.into(),
            api_key: None,
            base_url: String::new(),
        };
        assert_eq!(settings("openai/gpt-4").wire_name(), "gpt-4");
        assert_eq!(settings("gpt-4").wire_name(), "gpt-4");
        assert_eq!(settings("meta-llama/Llama-3").wire_name(), "meta-llama/Llama-3");
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [not toml").unwrap();
        assert!(FileConfig::load_from(&path).model.is_none());
        assert!(FileConfig::load_from(&dir.path().join("absent.toml")).model.is_none());
    }

    #[test]
    fn test_paths_live_under_config_dir() {
        assert!(config_path().ends_with(".squad-goals/config.toml"));
        assert!(history_path().ends_with(".squad-goals/chat_history"));
        assert!(env_path().ends_with(".squad-goals/.env"));
    }
}
