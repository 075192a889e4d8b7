//! Unified error types for configuration, rollouts, and the agent seam.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// RolloutError
// ---------------------------------------------------------------------------

/// Errors when reading or writing saved session transcripts.
#[derive(Debug)]
pub enum RolloutError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for RolloutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{e}"),
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RolloutError {}

impl From<std::io::Error> for RolloutError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for RolloutError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

// ---------------------------------------------------------------------------
// AgentError
// ---------------------------------------------------------------------------

/// Errors surfaced by an agent run.
#[derive(Debug)]
pub enum AgentError {
    /// Network / reqwest-level error.
    Http(reqwest::Error),
    /// Non-2xx status from the model API.
    Status(u16, String),
    /// The provider returned a payload we could not interpret.
    InvalidResponse(String),
    /// Reading an attached input (image, file) failed.
    Input(String),
    /// Quiet mode was started without a prompt.
    EmptyPrompt,
    /// The run exceeded the configured turn cap.
    MaxTurnsReached,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
            Self::Input(msg) => write!(f, "input: {msg}"),
            Self::EmptyPrompt => write!(
                f,
                "Quiet mode requires a prompt string, e.g.,: codex -q 'Fix bug #123 in the foobar project'"
            ),
            Self::MaxTurnsReached => write!(f, "max agent turns reached"),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}
