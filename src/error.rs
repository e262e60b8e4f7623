use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy surfaced at the command boundary. Every variant maps to a
/// human-readable message and a process exit code; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    NotFound(String),

    #[error("authentication failed (HTTP {status}); check your auth token")]
    Authentication { status: StatusCode },

    #[error("API request failed with HTTP {status}")]
    Api { status: StatusCode },

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Usage-level mistakes exit with 2 (matching clap); everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) => 2,
            _ => 1,
        }
    }

    /// Replace a generic endpoint-based not-found message with one naming the
    /// resource the user actually asked for.
    pub(crate) fn describe_not_found(self, what: impl Into<String>) -> Self {
        match self {
            Error::NotFound(_) => Error::NotFound(what.into()),
            other => other,
        }
    }
}
