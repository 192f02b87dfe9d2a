//! Application-wide error types.
//!
//! This module provides a unified error hierarchy for the application.
//! Library modules use specific error types via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - Module-specific errors ([`SpotifyError`], [`PlaybackError`]) for detailed handling
//! - All errors implement `std::error::Error` for compatibility
//!
//! # Example
//!
//! ```ignore
//! use unheard::error::{Error, Result};
//!
//! async fn rate(pool: &SqlitePool, id: &str) -> Result<()> {
//!     let track = db::get_track(pool, id).await?; // Database errors auto-convert
//!     Ok(())
//! }
//! ```

use crate::playback::PlaybackError;
use crate::spotify::SpotifyError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Remote catalog or playback API error
    #[error("Remote error: {0}")]
    Remote(#[from] SpotifyError),

    /// Playback could not be started or confirmed
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Entity missing from the catalog store
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Rejected input
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, SpotifyError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Remote(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("Track", "4uLU6hMCjMI75M1A2tKUQC");
        let msg = err.to_string();
        assert!(msg.contains("Track"));
        assert!(msg.contains("4uLU6hMCjMI75M1A2tKUQC"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::invalid("empty id").context("while rating track");
        let msg = err.to_string();
        assert!(msg.contains("while rating track"));
        assert!(msg.contains("empty id"));
    }

    #[test]
    fn test_remote_error_converts() {
        let err: Error = SpotifyError::RateLimited.into();
        assert!(matches!(err, Error::Remote(SpotifyError::RateLimited)));
    }

    #[test]
    fn test_result_ext() {
        let result: std::result::Result<(), SpotifyError> =
            Err(SpotifyError::Network("timeout".to_string()));
        let with_ctx = result.with_context("listing albums");
        assert!(with_ctx.unwrap_err().to_string().contains("listing albums"));
    }
}
