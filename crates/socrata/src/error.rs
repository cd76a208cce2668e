//! Error taxonomy for the Socrata engine.

use thiserror::Error;

/// Failure talking to the upstream data provider.
///
/// Callers treat every variant as "remote fetch failed"; the variants only
/// exist so logs can tell an HTTP error from a dead network.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The provider answered with a non-2xx status.
    #[error("Socrata API error ({status} {status_text}): {body}")]
    Api {
        status: u16,
        status_text: String,
        body: String,
    },

    /// No response arrived (connect failure, timeout, reset).
    #[error("no response from Socrata API: {0}")]
    Unreachable(String),

    /// The request could not be constructed.
    #[error("failed to build Socrata request: {0}")]
    Request(String),

    /// A 2xx response whose body was not the JSON we asked for.
    #[error("malformed Socrata response: {0}")]
    InvalidBody(String),
}

impl RemoteError {
    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Api { .. } => "api",
            Self::Unreachable(_) => "unreachable",
            Self::Request(_) => "request",
            Self::InvalidBody(_) => "invalid_body",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The caller's request violates a precondition. Never retried.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("remote fetch failed: {0}")]
    RemoteFetchFailed(#[from] RemoteError),

    /// Unexpected local failure; the message keeps the original cause.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    pub(crate) fn internal(context: &str, cause: impl std::fmt::Display) -> Self {
        Self::Internal(format!("{context}: {cause}"))
    }

    pub fn is_invalid_params(&self) -> bool {
        matches!(self, Self::InvalidParams(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
