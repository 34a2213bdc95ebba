//! Failure taxonomy for calls to the remote product and sale services.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of remote call failures.
///
/// Clients map transport errors and HTTP statuses into one of these kinds;
/// the domain never sees `reqwest` types.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RemoteError {
    /// The requested resource does not exist (HTTP 404).
    #[error("not found")]
    NotFound,

    /// The service could not be reached or is temporarily down.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The service understood the request and refused it.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Anything that does not fit the other kinds.
    #[error("unknown remote failure: {0}")]
    Unknown(String),
}

impl RemoteError {
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::Unavailable(detail.into())
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::Unknown(detail.into())
    }

    /// Short machine-friendly name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::NotFound => "not_found",
            RemoteError::Unavailable(_) => "unavailable",
            RemoteError::Rejected(_) => "rejected",
            RemoteError::Unknown(_) => "unknown",
        }
    }
}
