//! Error types for the lakehouse client.
//!
//! # Design
//! Variants follow where a call failed: before any I/O (`MalformedRequest`,
//! `Serialization`, `AuthenticationFailed`), on the wire (`TransportFailure`,
//! `Cancelled`), or after a response arrived (`Api`, `DecodeFailure`). Errors
//! raised after a response keep its status code, so callers can still inspect
//! it.

use std::time::Duration;

use thiserror::Error;

/// Code reported when a non-2xx body does not match the error payload shape.
pub const UNKNOWN_ERROR_CODE: &str = "unknown";

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// One entry of the `errors` list in an error payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_info: Option<String>,
}

/// Errors returned by the request pipeline.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request could not be built. Raised before any network I/O.
    #[error("malformed request for {operation}: {reason}")]
    MalformedRequest {
        operation: &'static str,
        reason: String,
    },

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The authenticator refused to attach credentials. No request was sent.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Every permitted attempt failed at the transport level.
    #[error("transport failure after {attempts} attempt(s): {source}")]
    TransportFailure {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        errors: Vec<ErrorDetail>,
        headers: Vec<(String, String)>,
    },

    /// A 2xx body did not match the declared response shape.
    #[error("failed to decode HTTP {status} response: {reason}")]
    DecodeFailure { status: u16, reason: String },

    /// The caller cancelled the call.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub(crate) fn malformed(operation: &'static str, reason: impl Into<String>) -> Self {
        ApiError::MalformedRequest {
            operation,
            reason: reason.into(),
        }
    }

    /// HTTP status of the response that produced this error, if one arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::DecodeFailure { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Failures below the HTTP layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    /// The pipeline's per-attempt budget ran out.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    /// A timeout configured on the HTTP client itself fired.
    #[error("HTTP client timed out: {0}")]
    ClientTimeout(String),

    /// The backend refused to send the request at all. Never retried.
    #[error("request rejected before sending: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether sending the same request again could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Rejected(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            TransportError::Rejected(e.to_string())
        } else if e.is_timeout() {
            TransportError::ClientTimeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_request() || e.is_body() {
            TransportError::Io(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}
