// src/error.rs

//! Unified error handling for the outlet poller.

use std::fmt;

use thiserror::Error;

/// Result type alias for chargewatch operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Classification of a failed vendor request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request timed out
    Timeout,
    /// The vendor answered with a non-2xx status
    HttpStatus(u16),
    /// The body could not be decoded into the expected format
    ParseFailure,
    /// Connection, TLS or other I/O failure
    Network,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::HttpStatus(code) => write!(f, "HTTP {code}"),
            TransportErrorKind::ParseFailure => write!(f, "parse failure"),
            TransportErrorKind::Network => write!(f, "network"),
        }
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request could not be prepared
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration or directory source missing/invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The vendor rejected the configured session
    #[error("Liveness check failed: session or token is no longer accepted")]
    LivenessCheckFailed,

    /// A vendor request failed after all retry attempts
    #[error("Transport error ({kind}) for {url}: {message}")]
    Transport {
        url: String,
        kind: TransportErrorKind,
        message: String,
    },

    /// A vendor payload did not have the expected shape
    #[error("Parse error for {context}: {message}")]
    Parse { context: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a transport error.
    pub fn transport(
        url: impl Into<String>,
        kind: TransportErrorKind,
        message: impl fmt::Display,
    ) -> Self {
        Self::Transport {
            url: url.into(),
            kind,
            message: message.to_string(),
        }
    }

    /// Create a payload parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }
}
