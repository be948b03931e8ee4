//! Error types for nudge.
//!
//! Suggestion generation and delivery never fail; absence of a suggestion is a
//! normal outcome. Errors exist only at the edges: parsing closed enumerations,
//! loading configuration, and talking to a reactor that has shut down.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NudgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Reactor error: {0}")]
    Reactor(#[from] ReactorError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseEnumError),
}

/// A value outside one of the closed enumerations (emotion, difficulty).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to load configuration from {path}: {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactorError {
    /// The reactor task has stopped; no further commands are accepted
    #[error("reactor is shut down")]
    Closed,
}
