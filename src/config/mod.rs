//! Startup configuration.
//!
//! Values come from the process environment (after `.env` has been loaded by
//! `main`). CLI flags may override the server and database settings afterwards.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::consts::{
    DEFAULT_API_VERSION, DEFAULT_DB_PATH, DEFAULT_DIALECT, DEFAULT_HOST, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MODEL, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_PORT, DEFAULT_TOOL_TIMEOUT_SECS,
    DEFAULT_TOP_K,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Connection details for the Azure OpenAI chat deployment.
#[derive(Clone)]
pub struct ModelSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub model: String,
    pub timeout: Duration,
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Knobs for the ReAct loop and the question prompt.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub dialect: String,
    pub top_k: usize,
    pub max_iterations: usize,
    pub tool_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub model: ModelSettings,
    pub agent: AgentSettings,
    pub db_path: PathBuf,
    pub allow_write: bool,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Read settings from the process environment. `overrides` is asked first.
    pub fn from_env_with<F>(overrides: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| overrides(key).or_else(|| std::env::var(key).ok()))
    }

    /// Read settings through an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let model = ModelSettings {
            endpoint: require("AZURE_ENDPOINT")?,
            api_key: require("OPENAI_API_KEY")?,
            api_version: get("OPENAI_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.into()),
            model: get("OPENAI_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            timeout: Duration::from_secs(parse_or(
                "OPENAI_TIMEOUT_SECS",
                get("OPENAI_TIMEOUT_SECS"),
                DEFAULT_MODEL_TIMEOUT_SECS,
            )?),
        };

        let agent = AgentSettings {
            dialect: get("SQL_DIALECT").unwrap_or_else(|| DEFAULT_DIALECT.into()),
            top_k: parse_or("AGENT_TOP_K", get("AGENT_TOP_K"), DEFAULT_TOP_K)?,
            max_iterations: parse_or(
                "AGENT_MAX_ITERATIONS",
                get("AGENT_MAX_ITERATIONS"),
                DEFAULT_MAX_ITERATIONS,
            )?,
            tool_timeout: Duration::from_secs(parse_or(
                "AGENT_TOOL_TIMEOUT_SECS",
                get("AGENT_TOOL_TIMEOUT_SECS"),
                DEFAULT_TOOL_TIMEOUT_SECS,
            )?),
        };

        Ok(Self {
            model,
            agent,
            db_path: get("SQL_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            allow_write: parse_or("SQL_ALLOW_WRITE", get("SQL_ALLOW_WRITE"), false)?,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
        })
    }

    /// Human-readable name of the database, taken from the file stem.
    pub fn database_name(&self) -> String {
        self.db_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "database".to_string())
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
