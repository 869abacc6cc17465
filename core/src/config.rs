use std::time::Duration;

use url::Url;

use crate::error::{ApiError, Result};
use crate::operation::INSTANCE_ID_HEADER;

pub const ENV_URL: &str = "LAKEHOUSE_URL";
pub const ENV_INSTANCE_ID: &str = "LAKEHOUSE_INSTANCE_ID";
pub const ENV_TIMEOUT_SECS: &str = "LAKEHOUSE_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "LAKEHOUSE_MAX_RETRIES";
pub const ENV_DISABLE_SSL_VERIFICATION: &str = "LAKEHOUSE_DISABLE_SSL_VERIFICATION";

const DEFAULT_USER_AGENT: &str = concat!("lakehouse-core/", env!("CARGO_PKG_VERSION"));

/// When and how failed attempts are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Retry non-idempotent methods too.
    pub retry_all_methods: bool,
    /// Response statuses that count as a failed attempt.
    pub retryable_statuses: Vec<u16>,
    /// Overall budget across all attempts and backoff sleeps.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            retry_all_methods: false,
            retryable_statuses: Vec::new(),
            deadline: None,
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `max_delay`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exp)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn retries_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub accept_invalid_certs: bool,
    /// Extra PEM-encoded root certificate to trust.
    pub root_certificate_pem: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub default_headers: Vec<(String, String)>,
    pub instance_id: Option<String>,
    /// Budget for a single attempt.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
    pub tls: TlsConfig,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&base_url.into())?,
            default_headers: Vec::new(),
            instance_id: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
            tls: TlsConfig::default(),
        })
    }

    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Read the configuration from `LAKEHOUSE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidConfig(format!("{ENV_URL} is not set")))?;
        let mut builder = ClientConfig::builder(url.trim());

        if let Some(instance_id) = lookup(ENV_INSTANCE_ID).filter(|v| !v.trim().is_empty()) {
            builder = builder.instance_id(instance_id.trim());
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            builder = builder.timeout(Duration::from_secs(parse_env(ENV_TIMEOUT_SECS, &secs)?));
        }
        if let Some(retries) = lookup(ENV_MAX_RETRIES) {
            builder = builder.max_retries(parse_env(ENV_MAX_RETRIES, &retries)?);
        }
        if let Some(flag) = lookup(ENV_DISABLE_SSL_VERIFICATION) {
            builder = builder.accept_invalid_certs(parse_env(ENV_DISABLE_SSL_VERIFICATION, &flag)?);
        }
        builder.build()
    }

    /// Headers sent on every request before operation and caller headers.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = self.default_headers.clone();
        if let Some(instance_id) = &self.instance_id {
            crate::http::set_header(&mut headers, INSTANCE_ID_HEADER, instance_id.clone());
        }
        headers
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let url = Url::parse(&with_scheme)
        .map_err(|e| ApiError::InvalidConfig(format!("invalid base URL {raw:?}: {e}")))?;
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ApiError::InvalidConfig(format!(
            "base URL {raw:?} must not carry a query or fragment"
        )));
    }
    Ok(url)
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidConfig(format!("{key} has invalid value {value:?}")))
}

pub struct ClientConfigBuilder {
    base_url: String,
    default_headers: Vec<(String, String)>,
    instance_id: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    user_agent: String,
    retry: RetryPolicy,
    tls: TlsConfig,
}

impl ClientConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: Vec::new(),
            instance_id: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
            tls: TlsConfig::default(),
        }
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        crate::http::set_header(&mut self.default_headers, name, value);
        self
    }

    pub fn instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.retry.max_retries = retries;
        self
    }

    pub fn retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry.base_delay = base;
        self.retry.max_delay = max;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.retry.deadline = Some(deadline);
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.tls.accept_invalid_certs = accept;
        self
    }

    pub fn root_certificate_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.tls.root_certificate_pem = Some(pem.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        if self.timeout.is_zero() {
            return Err(ApiError::InvalidConfig("timeout must be non-zero".to_string()));
        }
        let mut config = ClientConfig::new(self.base_url)?;
        config.default_headers = self.default_headers;
        config.instance_id = self.instance_id;
        config.timeout = self.timeout;
        config.connect_timeout = self.connect_timeout;
        config.user_agent = self.user_agent;
        config.retry = self.retry;
        config.tls = self.tls;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn bare_host_defaults_to_https() {
        let config = ClientConfig::new("lakehouse.example.com/api/v2").unwrap();
        assert_eq!(config.base_url.as_str(), "https://lakehouse.example.com/api/v2");
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn rejects_unparseable_or_query_urls() {
        assert!(matches!(ClientConfig::new("http://"), Err(ApiError::InvalidConfig(_))));
        assert!(matches!(
            ClientConfig::new("http://host/api?x=1"),
            Err(ApiError::InvalidConfig(_))
        ));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder("http://localhost:3000")
            .instance_id("crn:v1:1")
            .default_header("X-Team", "data")
            .timeout(Duration::from_secs(5))
            .max_retries(7)
            .retry_delays(Duration::from_millis(10), Duration::from_millis(80))
            .deadline(Duration::from_secs(20))
            .accept_invalid_certs(true)
            .build()
            .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(config.retry.deadline, Some(Duration::from_secs(20)));
        assert!(config.tls.accept_invalid_certs);

        let headers = config.request_headers();
        assert!(headers.contains(&("X-Team".to_string(), "data".to_string())));
        assert!(headers.contains(&(INSTANCE_ID_HEADER.to_string(), "crn:v1:1".to_string())));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = ClientConfig::builder("http://localhost")
            .timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(ApiError::InvalidConfig(_))));
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(500));
        assert_eq!(policy.backoff(64), Duration::from_millis(500));
    }

    #[test]
    fn from_lookup_reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_URL, "https://lakehouse.example.com/lakehouse/api/v2"),
            (ENV_INSTANCE_ID, "crn:v1:abc"),
            (ENV_TIMEOUT_SECS, "12"),
            (ENV_MAX_RETRIES, "1"),
            (ENV_DISABLE_SSL_VERIFICATION, "true"),
        ]))
        .unwrap();
        assert_eq!(config.base_url.path(), "/lakehouse/api/v2");
        assert_eq!(config.instance_id.as_deref(), Some("crn:v1:abc"));
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.retry.max_retries, 1);
        assert!(config.tls.accept_invalid_certs);
    }

    #[test]
    fn from_lookup_requires_url_and_valid_numbers() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[])),
            Err(ApiError::InvalidConfig(_))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(ENV_URL, "http://h"), (ENV_MAX_RETRIES, "many")])),
            Err(ApiError::InvalidConfig(_))
        ));
    }
}
