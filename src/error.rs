//! Error types for provisioning.
//!
//! Library code returns these typed errors; the `bootstrap-deps` binary wraps
//! them in `anyhow` at its edges.

use std::io;
use thiserror::Error;

/// Errors raised while configuring or driving a provisioning run.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Invalid flags, values or paths. Fatal before any stage runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The dependency manifest could not be parsed or failed validation.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// An external tool could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ProvisionError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }
}

impl From<toml::de::Error> for ProvisionError {
    fn from(e: toml::de::Error) -> Self {
        Self::Manifest(e.to_string())
    }
}

/// Errors from fetching a remote archive.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection, DNS, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("download interrupted")]
    Interrupted,
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Client errors (4xx) are permanent: a missing release asset will not
    /// appear on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status(code) => !(400..500).contains(code),
            FetchError::Transport(_) | FetchError::Io(_) => true,
            FetchError::Interrupted => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_not_retryable() {
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::Status(403).is_retryable());
    }

    #[test]
    fn test_server_and_transport_errors_are_retryable() {
        assert!(FetchError::Status(503).is_retryable());
        assert!(FetchError::Transport("timed out".into()).is_retryable());
        assert!(!FetchError::Interrupted.is_retryable());
    }

    #[test]
    fn test_configuration_error_display() {
        let err = ProvisionError::configuration("unexpected argument '--bogus'");
        assert_eq!(
            err.to_string(),
            "configuration error: unexpected argument '--bogus'"
        );
    }
}
