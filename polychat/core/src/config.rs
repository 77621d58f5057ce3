//! Settings Layer
//!
//! Endpoint, credential, and last-known connectivity settings for both
//! backends. The settings store itself is owned by the host application;
//! this module only defines the shape the core reads, plus TOML/env loading
//! for hosts that want it.
//!
//! Adapters read settings at call time and never cache them, so a host can
//! swap the server URL or flip connectivity status between calls.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ChatError;

/// Last-known connectivity state of a backend server.
///
/// This is a status flag maintained by the host (e.g. from a periodic
/// health probe), not a fresh network check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// The backend answered its most recent probe.
    Connected,
    /// The backend is unreachable or has never been probed.
    #[default]
    Disconnected,
}

/// Settings for the local Ollama server.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OllamaSettings {
    /// Base URL of the server, e.g. `http://localhost:11434`.
    pub server: Option<String>,
    /// Last-known connectivity status.
    #[serde(default)]
    pub status: ServerStatus,
}

/// Settings for the hosted OpenAI-compatible API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenAiSettings {
    /// Base URL of the API. Defaults to the public endpoint.
    #[serde(default = "default_openai_server")]
    pub server: String,
    /// Bearer token for the `Authorization` header.
    pub api_key: Option<String>,
    /// Last-known connectivity status.
    #[serde(default)]
    pub status: ServerStatus,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            server: default_openai_server(),
            api_key: None,
            status: ServerStatus::default(),
        }
    }
}

fn default_openai_server() -> String {
    "https://api.openai.com".to_string()
}

/// Process-wide chat settings, read-only from the core's perspective.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Local Ollama server settings.
    #[serde(default)]
    pub ollama: OllamaSettings,
    /// Hosted API settings.
    #[serde(default)]
    pub openai: OpenAiSettings,
}

impl Settings {
    /// Build settings from environment variables.
    ///
    /// Fallback chains: `POLYCHAT_OLLAMA_SERVER` then `OLLAMA_HOST` for the
    /// local server, `POLYCHAT_OPENAI_BASE_URL` then `OPENAI_BASE_URL` for
    /// the hosted base URL, and `OPENAI_API_KEY` for the credential.
    #[must_use]
    pub fn from_env() -> Self {
        let ollama_server = std::env::var("POLYCHAT_OLLAMA_SERVER")
            .or_else(|_| std::env::var("OLLAMA_HOST"))
            .ok();
        let openai_server = std::env::var("POLYCHAT_OPENAI_BASE_URL")
            .or_else(|_| std::env::var("OPENAI_BASE_URL"))
            .unwrap_or_else(|_| default_openai_server());
        let api_key = std::env::var("OPENAI_API_KEY").ok();

        Self {
            ollama: OllamaSettings {
                server: ollama_server,
                status: ServerStatus::Disconnected,
            },
            openai: OpenAiSettings {
                server: openai_server,
                api_key,
                status: ServerStatus::Disconnected,
            },
        }
    }

    /// Load settings from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The Ollama server base URL, or `MissingConfiguration` if unset.
    pub fn ollama_server(&self) -> Result<&str, ChatError> {
        self.ollama
            .server
            .as_deref()
            .ok_or(ChatError::MissingConfiguration("ollama server URL"))
    }

    /// The hosted API key, or `MissingConfiguration` if unset.
    pub fn openai_api_key(&self) -> Result<&str, ChatError> {
        self.openai
            .api_key
            .as_deref()
            .ok_or(ChatError::MissingConfiguration("openai api key"))
    }
}

/// Default location of the settings file (`$XDG_CONFIG_HOME/polychat/settings.toml`).
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("polychat").join("settings.toml"))
}

/// Settings file loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for the settings shape.
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}
