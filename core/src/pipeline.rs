//! Dispatch and decode halves of the request pipeline.
//!
//! # Design
//! `dispatch` is the only part that suspends: it runs attempts through a
//! [`Transport`] under a per-attempt timeout, sleeps between retries, and
//! watches a cancellation token throughout. `decode` is synchronous and works
//! on any `HttpResponse`, so callers that execute requests themselves can use
//! it directly.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::{ApiError, ErrorDetail, Result, TransportError, UNKNOWN_ERROR_CODE};
use crate::http::{find_header, HttpRequest, HttpResponse};
use crate::operation::Operation;
use crate::transport::Transport;

/// Status, headers and decoded payload of one call.
///
/// `payload` is `None` when a successful response had no body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope<T> {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub payload: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }

    /// The payload, or `DecodeFailure` if the body was empty.
    pub fn require_payload(self) -> Result<T> {
        let status = self.status;
        self.payload.ok_or(ApiError::DecodeFailure {
            status,
            reason: "expected a response body, got none".to_string(),
        })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            status: self.status,
            headers: self.headers,
            payload: self.payload.map(f),
        }
    }
}

/// Per-call dispatch settings taken from the client configuration.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings<'a> {
    pub policy: &'a RetryPolicy,
    pub attempt_timeout: Duration,
    /// Whether failed attempts of this call may be retried at all.
    pub retryable: bool,
}

/// Send `request`, retrying per `settings`, until a response arrives, retries
/// run out, or `cancel` fires.
pub async fn dispatch<T: Transport>(
    transport: &T,
    operation: &Operation,
    request: &HttpRequest,
    settings: DispatchSettings<'_>,
    cancel: &CancellationToken,
) -> Result<HttpResponse> {
    let policy = settings.policy;
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let budget = match policy.deadline {
            Some(deadline) => settings
                .attempt_timeout
                .min(deadline.saturating_sub(started.elapsed())),
            None => settings.attempt_timeout,
        };
        debug!(
            operation = operation.name,
            method = %request.method,
            url = %request.url,
            attempt,
            "sending request"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = tokio::time::timeout(budget, transport.send(request)) => {
                result.unwrap_or(Err(TransportError::Timeout(budget)))
            }
        };

        let may_retry = settings.retryable && attempt <= policy.max_retries;
        let delay = policy.backoff(attempt);
        match outcome {
            Ok(response) => {
                if !(may_retry && policy.retries_status(response.status)) {
                    return Ok(response);
                }
                if !fits_deadline(policy, started, delay) {
                    debug!(operation = operation.name, attempt, "deadline reached, returning last response");
                    return Ok(response);
                }
                warn!(
                    operation = operation.name,
                    status = response.status,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "retryable status, retrying"
                );
            }
            Err(source) => {
                if !may_retry || !source.is_retryable() || !fits_deadline(policy, started, delay) {
                    return Err(ApiError::TransportFailure {
                        attempts: attempt,
                        source,
                    });
                }
                warn!(
                    operation = operation.name,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %source,
                    "request failed, retrying"
                );
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

// The next attempt must start, with some budget left, before the deadline.
fn fits_deadline(policy: &RetryPolicy, started: Instant, delay: Duration) -> bool {
    match policy.deadline {
        Some(deadline) => started.elapsed() + delay < deadline,
        None => true,
    }
}

/// Turn a response into an envelope with a typed payload, or an error.
pub fn decode<T: DeserializeOwned>(
    operation: &Operation,
    response: HttpResponse,
) -> Result<ResponseEnvelope<T>> {
    if !response.is_success() {
        return Err(api_error(response));
    }
    if response.status != operation.success_status {
        debug!(
            operation = operation.name,
            expected = operation.success_status,
            status = response.status,
            "success status differs from the documented one"
        );
    }

    let payload = if response.body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let value = serde_json::from_slice(&response.body).map_err(|e| {
            ApiError::DecodeFailure {
                status: response.status,
                reason: format!("{} response: {e}", operation.name),
            }
        })?;
        Some(value)
    };
    debug!(operation = operation.name, status = response.status, has_payload = payload.is_some(), "decoded response");

    Ok(ResponseEnvelope {
        status: response.status,
        headers: response.headers,
        payload,
    })
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

/// Map a non-2xx response to `ApiError::Api`.
fn api_error(response: HttpResponse) -> ApiError {
    let parsed = serde_json::from_slice::<ErrorPayload>(&response.body)
        .ok()
        .filter(|p| p.code.is_some() || p.message.is_some() || !p.errors.is_empty());

    let (code, message, errors) = match parsed {
        Some(payload) => {
            let first = payload.errors.first();
            let code = payload
                .code
                .or_else(|| first.map(|e| e.code.clone()).filter(|c| !c.is_empty()))
                .unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string());
            let message = payload
                .message
                .or_else(|| first.map(|e| e.message.clone()))
                .unwrap_or_default();
            (code, message, payload.errors)
        }
        None => (
            UNKNOWN_ERROR_CODE.to_string(),
            String::from_utf8_lossy(&response.body).trim().to_string(),
            Vec::new(),
        ),
    };

    ApiError::Api {
        status: response.status,
        code,
        message,
        errors,
        headers: response.headers,
    }
}
