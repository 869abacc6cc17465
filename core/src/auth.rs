//! Credential injection.
//!
//! An [`Authenticator`] is shared read-only by every call of a client and runs
//! once per call, after the request is built and before the first attempt.

use std::fmt;

use crate::error::{ApiError, Result};
use crate::http::HttpRequest;

pub const AUTHORIZATION: &str = "Authorization";
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

pub trait Authenticator: fmt::Debug + Send + Sync {
    /// Attach credentials to `request`. An error aborts the call before any
    /// network I/O.
    fn authenticate(&self, request: &mut HttpRequest) -> Result<()>;
}

/// Leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Authenticator for NoAuth {
    fn authenticate(&self, _request: &mut HttpRequest) -> Result<()> {
        Ok(())
    }
}

/// Sends `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerTokenAuthenticator {
    token: String,
}

impl BearerTokenAuthenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenAuthenticator")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Authenticator for BearerTokenAuthenticator {
    fn authenticate(&self, request: &mut HttpRequest) -> Result<()> {
        let token = checked_credential("bearer token", &self.token)?;
        request.set_header(AUTHORIZATION, format!("Bearer {token}"));
        Ok(())
    }
}

/// Sends an API key in a dedicated header.
#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    header: String,
    api_key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            header: DEFAULT_API_KEY_HEADER.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }
}

impl fmt::Debug for ApiKeyAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyAuthenticator")
            .field("header", &self.header)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Authenticator for ApiKeyAuthenticator {
    fn authenticate(&self, request: &mut HttpRequest) -> Result<()> {
        if self.header.is_empty() || !self.header.bytes().all(is_token_char) {
            return Err(ApiError::AuthenticationFailed(format!(
                "invalid API key header name {:?}",
                self.header
            )));
        }
        let key = checked_credential("API key", &self.api_key)?;
        request.set_header(self.header.clone(), key);
        Ok(())
    }
}

fn checked_credential<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::AuthenticationFailed(format!("{what} is empty")));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(ApiError::AuthenticationFailed(format!(
            "{what} contains control characters"
        )));
    }
    Ok(value)
}

// RFC 7230 `tchar`.
pub(crate) fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/catalogs".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[test]
    fn bearer_sets_authorization() {
        let mut req = request();
        BearerTokenAuthenticator::new("abc").authenticate(&mut req).unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
    }

    #[test]
    fn bearer_rejects_empty_and_control_characters() {
        for token in ["", "  ", "abc\r\nX-Injected: 1"] {
            let mut req = request();
            let err = BearerTokenAuthenticator::new(token)
                .authenticate(&mut req)
                .unwrap_err();
            assert!(matches!(err, ApiError::AuthenticationFailed(_)), "{token:?}");
            assert!(req.header(AUTHORIZATION).is_none());
        }
    }

    #[test]
    fn api_key_uses_configured_header() {
        let mut req = request();
        ApiKeyAuthenticator::new("k-123")
            .with_header("X-Lakehouse-Key")
            .authenticate(&mut req)
            .unwrap();
        assert_eq!(req.header("x-lakehouse-key"), Some("k-123"));

        let mut req = request();
        ApiKeyAuthenticator::new("k-123").authenticate(&mut req).unwrap();
        assert_eq!(req.header(DEFAULT_API_KEY_HEADER), Some("k-123"));
    }

    #[test]
    fn api_key_rejects_bad_header_name() {
        let mut req = request();
        let err = ApiKeyAuthenticator::new("k")
            .with_header("bad header")
            .authenticate(&mut req)
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationFailed(_)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let debug = format!("{:?}", BearerTokenAuthenticator::new("s3cret"));
        assert!(!debug.contains("s3cret"));
        let debug = format!("{:?}", ApiKeyAuthenticator::new("s3cret"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn no_auth_is_a_no_op() {
        let mut req = request();
        NoAuth.authenticate(&mut req).unwrap();
        assert!(req.headers.is_empty());
    }
}
