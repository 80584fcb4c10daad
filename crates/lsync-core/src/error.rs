//! Application error types with rich context

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Launch Document Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed launch file at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        offset: usize,
        line: usize,
        column: usize,
    },

    #[error("Invalid regular expression '{value}': {source}")]
    Pattern {
        value: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid matcher in configuration #{index}: {message}")]
    InvalidMatcher { index: usize, message: String },

    #[error("Cannot patch document: {message}")]
    Patch { message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    // ─────────────────────────────────────────────────────────────
    // Build-Tool Integration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Build-tool query '{query}' failed: {message}")]
    Query { query: String, message: String },

    #[error("Build-tool query '{query}' timed out after {timeout:?}")]
    QueryTimeout { query: String, timeout: Duration },

    #[error("Build-tool integration unavailable: {message}")]
    IntegrationUnavailable { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn parse(message: impl Into<String>, offset: usize, line: usize, column: usize) -> Self {
        Self::Parse {
            message: message.into(),
            offset,
            line,
            column,
        }
    }

    pub fn pattern(value: impl Into<String>, source: regex::Error) -> Self {
        Self::Pattern {
            value: value.into(),
            source,
        }
    }

    pub fn invalid_matcher(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidMatcher {
            index,
            message: message.into(),
        }
    }

    pub fn patch(message: impl Into<String>) -> Self {
        Self::Patch {
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            query: query.into(),
            message: message.into(),
        }
    }

    pub fn query_timeout(query: impl Into<String>, timeout: Duration) -> Self {
        Self::QueryTimeout {
            query: query.into(),
            timeout,
        }
    }

    pub fn integration_unavailable(message: impl Into<String>) -> Self {
        Self::IntegrationUnavailable {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors only affect a single query or a single launch file;
    /// the engine keeps running after them.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Query { .. }
                | Error::QueryTimeout { .. }
                | Error::Parse { .. }
                | Error::Pattern { .. }
                | Error::InvalidMatcher { .. }
                | Error::Patch { .. }
                | Error::Write { .. }
        )
    }

    /// Check if this error should disable the feature for the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::IntegrationUnavailable { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
