//! Error types for spotify-etl
//!
//! This module provides error handling for the library, including:
//! - The fetch-protocol taxonomy (transient attempt failures vs. exhausted retries)
//! - Authorization failures from the token refresh exchange
//! - Task graph errors (dependency cycles, missing declared outputs)
//! - Ambient carriers for I/O, network, and serialization failures

use thiserror::Error;

/// Result type alias for spotify-etl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for spotify-etl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues: the failing URL, the upstream
/// HTTP status, or the task and artifact involved.
#[derive(Debug, Error)]
pub enum Error {
    /// A single HTTP attempt against the API returned a non-success status.
    ///
    /// Recovered locally by the bounded retry in the fetcher; only surfaces
    /// to callers when wrapped into [`Error::RetryExhausted`].
    #[error("transient fetch error: {url} returned status {status}")]
    Transient {
        /// The URL of the failed request
        url: String,
        /// The HTTP status code returned by the server
        status: u16,
    },

    /// Every allowed attempt for one page fetch failed.
    ///
    /// Surfaces as a task failure and halts the requested task chain.
    #[error("retries exhausted: {url} still returning status {status} after {attempts} attempts")]
    RetryExhausted {
        /// The URL of the failed request
        url: String,
        /// The HTTP status code of the last attempt
        status: u16,
        /// How many attempts were made
        attempts: u32,
    },

    /// The token refresh exchange failed.
    ///
    /// Always fatal to the current task; never retried internally.
    #[error("token refresh failed with status {status}: {body}")]
    Auth {
        /// The HTTP status code returned by the authorization endpoint
        status: u16,
        /// The response body, which usually names the OAuth error
        body: String,
    },

    /// The declared task dependencies form a cycle.
    ///
    /// Detected before any task executes.
    #[error("dependency cycle detected at task '{task}'")]
    GraphCycle {
        /// A task that participates in the cycle
        task: String,
    },

    /// A task's `run` completed without publishing one of its declared outputs.
    #[error("task '{task}' finished without producing declared output '{artifact}'")]
    MissingOutput {
        /// The task that failed to publish
        task: String,
        /// The declared artifact that does not exist
        artifact: String,
    },

    /// A downstream task asked for an artifact that does not exist.
    #[error("artifact '{0}' not found in store")]
    ArtifactNotFound(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "credentials_path")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parse error
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true if the error is a transient page-fetch failure that the
    /// bounded retry in the fetcher is allowed to absorb.
    ///
    /// Everything else is permanent from the retry helper's point of view:
    /// auth failures need operator attention, and graph/artifact errors cannot
    /// be fixed by asking the server again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient { .. })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_is_retryable() {
        let err = Error::Transient {
            url: "https://api.example.com/v1/me/tracks".into(),
            status: 500,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn retry_exhausted_is_not_retryable() {
        let err = Error::RetryExhausted {
            url: "https://api.example.com/v1/me/tracks".into(),
            status: 500,
            attempts: 2,
        };
        assert!(
            !err.is_retryable(),
            "exhausted retries must surface, not loop"
        );
    }

    #[test]
    fn auth_is_not_retryable() {
        let err = Error::Auth {
            status: 400,
            body: "invalid_grant".into(),
        };
        assert!(!err.is_retryable(), "auth failures must surface immediately");
    }

    #[test]
    fn graph_and_artifact_errors_are_not_retryable() {
        assert!(!Error::GraphCycle {
            task: "albums".into()
        }
        .is_retryable());
        assert!(!Error::MissingOutput {
            task: "albums".into(),
            artifact: "albums".into(),
        }
        .is_retryable());
        assert!(!Error::ArtifactNotFound("albums".into()).is_retryable());
    }

    #[test]
    fn display_messages_name_the_failing_url() {
        let err = Error::RetryExhausted {
            url: "https://api.example.com/v1/albums".into(),
            status: 502,
            attempts: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("https://api.example.com/v1/albums"));
        assert!(msg.contains("502"));
        assert!(msg.contains("2 attempts"));
    }

    #[test]
    fn display_messages_name_the_failing_task() {
        let err = Error::MissingOutput {
            task: "saved_tracks".into(),
            artifact: "saved_album_ids".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("saved_tracks"));
        assert!(msg.contains("saved_album_ids"));
    }
}
