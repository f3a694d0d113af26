//! Error types for the console core.
//!
//! Failures fall into three kinds at the session layer:
//! - [`AuthError::Validation`] blocks a submission before any request is sent.
//! - [`AuthError::Exchange`] is a retryable acquisition failure; the session is untouched.
//! - [`SyncError::SessionInvalid`] is any failed authenticated request; the session is cleared.
//!
//! Transport failures and rejection statuses are not distinguished once they
//! reach the sync layer.

use thiserror::Error;

/// Error returned by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("network error: {message}")]
    Network { message: String },

    /// The server answered with a non-success status.
    #[error("request rejected with status {status}")]
    Status { status: u16 },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// An endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl TransportError {
    /// Whether the server explicitly rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransportError::Status { status: 401 | 403 })
    }
}

/// Error type for credential acquisition.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identifier is not a canonical UUID; nothing was sent.
    #[error("invalid account identifier: {input:?}")]
    Validation { input: String },

    /// The exchange request failed. The user may retry.
    #[error("could not connect: {message}")]
    Exchange { message: String },
}

impl AuthError {
    pub(crate) fn exchange(err: impl std::fmt::Display) -> Self {
        AuthError::Exchange {
            message: err.to_string(),
        }
    }
}

/// Error type for authenticated resource operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No credential is held; no request was issued.
    #[error("not authenticated")]
    NotAuthenticated,

    /// An authenticated request failed and the session was cleared.
    #[error("session invalidated: {message}")]
    SessionInvalid { message: String },

    /// The session changed while the request was in flight; its result was dropped.
    #[error("session changed while the request was in flight")]
    Superseded,

    /// A leaderboard name must not be empty; no request was issued.
    #[error("leaderboard name is empty")]
    EmptyName,
}

/// Error type for the public score listing.
#[derive(Debug, Error)]
pub enum ScoresError {
    /// The leaderboard identifier is empty.
    #[error("leaderboard identifier is empty")]
    EmptyIdentifier,

    /// The request failed.
    #[error("failed to load scores: {0}")]
    Transport(#[from] TransportError),
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("failed to read config from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file does not parse as a
    /// [`ConsoleConfig`](crate::config::ConsoleConfig).
    #[error("failed to parse config from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A configured URL is malformed.
    #[error("invalid {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    /// No platform configuration directory could be determined.
    #[error("configuration directory not available")]
    DirectoryUnavailable,
}

/// Top-level error type encompassing all console errors.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Error from credential acquisition.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Error from an authenticated resource operation.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Error from the score listing.
    #[error(transparent)]
    Scores(#[from] ScoresError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport error outside of the session policies.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_statuses() {
        assert!(TransportError::Status { status: 401 }.is_unauthorized());
        assert!(TransportError::Status { status: 403 }.is_unauthorized());
        assert!(!TransportError::Status { status: 500 }.is_unauthorized());
        assert!(
            !TransportError::Network {
                message: "refused".to_string()
            }
            .is_unauthorized()
        );
    }

    #[test]
    fn test_console_error_is_transparent() {
        let err: ConsoleError = SyncError::NotAuthenticated.into();
        assert_eq!(err.to_string(), "not authenticated");
    }
}
