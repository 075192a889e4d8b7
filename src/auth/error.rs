//! Auth subsystem error definitions.

use std::fmt;

/// Errors surfaced by credential resolution and login.
#[derive(Debug)]
pub enum AuthError {
    Io(std::io::Error),
    Http(reqwest::Error),
    Status(u16, String),
    Invalid(String),
    /// No credential available; carries the env var the user should set.
    MissingKey { env_var: String },
    /// Login needs a terminal but the session is not interactive.
    NotInteractive,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Http(err) => write!(f, "http: {err}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
            Self::Invalid(msg) => write!(f, "{msg}"),
            Self::MissingKey { env_var } => write!(
                f,
                "Missing API key. Set the environment variable {env_var} and re-run this command."
            ),
            Self::NotInteractive => write!(
                f,
                "no cached credentials and login requires an interactive terminal"
            ),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<std::io::Error> for AuthError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(value: serde_json::Error) -> Self {
        Self::Invalid(format!("invalid auth data: {value}"))
    }
}
