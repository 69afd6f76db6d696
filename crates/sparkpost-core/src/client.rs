//! HTTP transport shared by all SparkPost resources.
//!
//! [`ServiceClient`] owns the base URI, the API key and the `reqwest` client. Each
//! resource builds a path relative to the versioned API root and hands it to
//! [`Transport::request`], which performs the round-trip and translates failures
//! into [`Error::Api`].

use crate::config::SparkPostConfig;
use crate::error::{ApiError, Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default maximum number of retry attempts when retries are enabled
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default initial retry delay in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Default maximum retry delay in milliseconds
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;

const USER_AGENT: &str = concat!("sparkpost-rust/", env!("CARGO_PKG_VERSION"));

/// Retry policy with exponential backoff.
///
/// Only idempotent methods (GET, PUT, DELETE) are ever retried; POST requests are
/// sent exactly once regardless of the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Initial delay before first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: u32,
}

impl RetryPolicy {
    /// Exponential backoff starting at 500ms, capped at 5s, three retries.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            backoff_multiplier: 2,
        }
    }

    /// A policy that sends every request once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_multiplier: 1,
        }
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (1-based); zero for attempt 0.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = self.backoff_multiplier.saturating_pow(attempt - 1);
        let delay = self.initial_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }

    /// Number of retries allowed for the given method.
    #[must_use]
    pub fn retries_for(&self, method: &Method) -> u32 {
        if is_idempotent(method) {
            self.max_retries
        } else {
            0
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

fn is_idempotent(method: &Method) -> bool {
    [Method::GET, Method::PUT, Method::DELETE].contains(method)
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Retry policy
    pub retry_policy: RetryPolicy,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Whether to verify TLS certificates
    pub tls_verify: bool,
}

impl ClientConfig {
    /// Create a configuration with default timeouts and no retries.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            retry_policy: RetryPolicy::no_retry(),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            tls_verify: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 204, or a 2xx with an empty body
    NoContent,
    /// JSON body
    Json(Value),
}

impl ApiResponse {
    /// Returns the `results` member of an object body, or the whole body otherwise.
    ///
    /// [`ApiResponse::NoContent`] becomes [`Value::Null`].
    #[must_use]
    pub fn into_results(self) -> Value {
        match self {
            Self::NoContent => Value::Null,
            Self::Json(Value::Object(mut body)) => match body.remove("results") {
                Some(results) => results,
                None => Value::Object(body),
            },
            Self::Json(other) => other,
        }
    }

    /// Returns true for empty responses.
    #[must_use]
    pub const fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }
}

/// Request dispatch shared by every resource.
///
/// With the `mock` feature enabled, `MockTransport` is generated for tests.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `method` to `path` (relative to the API root) with an optional JSON body.
    async fn request(&self, method: Method, path: &str, body: Option<Value>)
        -> Result<ApiResponse>;
}

/// Builder for [`ServiceClient`].
#[derive(Debug, Clone)]
pub struct ServiceClientBuilder {
    base_url: Url,
    api_key: SecretString,
    user_agent: String,
    http_config: ClientConfig,
}

impl ServiceClientBuilder {
    /// Create a builder for the given API root and key.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url,
            api_key: SecretString::from(api_key.into()),
            user_agent: USER_AGENT.to_string(),
            http_config: ClientConfig::new(),
        })
    }

    /// Create a builder from a validated [`SparkPostConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &SparkPostConfig) -> Result<Self> {
        config.check()?;
        let http_config = ClientConfig::new()
            .with_timeout(config.timeout())
            .with_retry_policy(RetryPolicy::new().with_max_retries(config.max_retries));

        Ok(Self {
            base_url: config.api_url()?,
            api_key: config.api_key.clone(),
            user_agent: USER_AGENT.to_string(),
            http_config,
        })
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.http_config.retry_policy = retry;
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the key is blank or not a valid header value,
    /// or if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ServiceClient> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(Error::ConfigError("API key must not be empty".into()));
        }

        let mut base_url = self.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut authorization = HeaderValue::from_str(self.api_key.expose_secret())
            .map_err(|_| Error::ConfigError("API key is not a valid header value".into()))?;
        authorization.set_sensitive(true);

        let config = self.http_config;
        let mut builder = ClientBuilder::new()
            .user_agent(self.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host);

        if !config.tls_verify {
            warn!("TLS verification disabled for SparkPost client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        Ok(ServiceClient {
            http,
            base_url,
            authorization,
            retry_policy: config.retry_policy,
        })
    }
}

/// HTTP transport bound to one API root and key.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: Url,
    authorization: HeaderValue,
    retry_policy: RetryPolicy,
}

impl ServiceClient {
    /// Build a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or key is invalid.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        ServiceClientBuilder::new(base_url, api_key)?.build()
    }

    /// Build a client from a [`SparkPostConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &SparkPostConfig) -> Result<Self> {
        ServiceClientBuilder::from_config(config)?.build()
    }

    /// API root every path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Retry policy in effect.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid path `{path}`: {err}")))
    }

    /// Send a request, retrying idempotent methods according to the retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for non-success statuses, or a transport error if no
    /// response was received.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = self.build_url(path)?;
        let retries = self.retry_policy.retries_for(&method);
        let mut attempt = 0;

        loop {
            debug!(%method, path = %path, attempt, "Sending SparkPost request");

            match self.send_once(&method, &url, body).await {
                Err(err) if attempt < retries && err.is_retryable() => {
                    attempt += 1;
                    let delay = self.retry_policy.delay_for_attempt(attempt);
                    warn!(%method, path = %path, attempt, error = %err, ?delay, "Retrying SparkPost request");
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
                result => return result,
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .header(ACCEPT, "application/json");

        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse::NoContent);
        }

        if status.is_success() {
            let bytes = response.bytes().await?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(ApiResponse::NoContent);
            }
            let value = serde_json::from_slice(&bytes).map_err(|err| {
                Error::JsonError(format!("Failed to parse response from `{url}`: {err}"))
            })?;
            return Ok(ApiResponse::Json(value));
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                debug!(error = %err, url = %url, "Failed to read error response body");
                String::new()
            }
        };
        debug!(status = status.as_u16(), url = %url, "SparkPost request failed");
        Err(Error::Api(ApiError::new(status, url.as_str(), text)))
    }
}

#[async_trait]
impl Transport for ServiceClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        self.execute(method, path, body.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ServiceClient {
        ServiceClient::new(server.uri(), "fake-key").unwrap()
    }

    fn fast_retries(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_retries(max_retries)
            .with_initial_delay(Duration::ZERO)
    }

    #[test]
    fn test_retry_policy_delay_calculation() {
        let policy = RetryPolicy::new();
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(4000));
        // capped at max_delay
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(5000));
        assert_eq!(policy.delay_for_attempt(30), Duration::from_millis(5000));
    }

    #[test]
    fn test_retry_policy_skips_post() {
        let policy = RetryPolicy::new();
        assert_eq!(policy.retries_for(&Method::GET), DEFAULT_MAX_RETRIES);
        assert_eq!(policy.retries_for(&Method::DELETE), DEFAULT_MAX_RETRIES);
        assert_eq!(policy.retries_for(&Method::POST), 0);
    }

    #[test]
    fn test_default_config_sends_once() {
        assert_eq!(RetryPolicy::default(), RetryPolicy::no_retry());
        assert_eq!(ClientConfig::default().retry_policy.max_retries, 0);
    }

    #[test]
    fn test_api_response_into_results() {
        let wrapped = ApiResponse::Json(json!({"results": [{"id": "a"}]}));
        assert_eq!(wrapped.into_results(), json!([{"id": "a"}]));

        let bare = ApiResponse::Json(json!({"name": "pool"}));
        assert_eq!(bare.into_results(), json!({"name": "pool"}));

        assert!(ApiResponse::NoContent.is_no_content());
        assert_eq!(ApiResponse::NoContent.into_results(), Value::Null);
    }

    #[test]
    fn test_base_url_keeps_version_prefix() {
        let client = ServiceClient::new("https://api.sparkpost.com/api/v1", "fake-key").unwrap();
        assert_eq!(
            client.build_url("ip-pools/marketing").unwrap().as_str(),
            "https://api.sparkpost.com/api/v1/ip-pools/marketing"
        );
    }

    #[test]
    fn test_from_config_uses_api_url() {
        let config = SparkPostConfig::new("fake-key")
            .unwrap()
            .with_base_uri("api.eu.sparkpost.com")
            .with_max_retries(2);
        let client = ServiceClient::from_config(&config).unwrap();

        assert_eq!(
            client.base_url().as_str(),
            "https://api.eu.sparkpost.com/api/v1/"
        );
        assert_eq!(client.retry_policy().max_retries, 2);
    }

    #[test]
    fn test_invalid_api_key_header() {
        let result = ServiceClient::new("https://api.sparkpost.com/api/v1", "bad\nkey");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_blank_api_key_rejected() {
        for key in ["", "   "] {
            let result = ServiceClient::new("https://api.sparkpost.com/api/v1", key);
            assert_eq!(
                result.err(),
                Some(Error::ConfigError("API key must not be empty".to_string()))
            );
        }
    }

    #[tokio::test]
    async fn test_sends_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip-pools"))
            .and(header("Authorization", "fake-key"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let response = test_client(&server)
            .execute(Method::GET, "ip-pools", None)
            .await
            .unwrap();
        assert_eq!(response.into_results(), json!([]));
    }

    #[tokio::test]
    async fn test_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ip-pools"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"name": "marketing"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"results": {"id": "marketing"}})),
            )
            .mount(&server)
            .await;

        let body = json!({"name": "marketing"});
        let response = test_client(&server)
            .execute(Method::POST, "ip-pools", Some(&body))
            .await
            .unwrap();
        assert_eq!(response, ApiResponse::Json(json!({"results": {"id": "marketing"}})));
    }

    #[tokio::test]
    async fn test_no_content_and_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/ip-pools/a"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/ip-pools/b"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let a = client.execute(Method::DELETE, "ip-pools/a", None).await.unwrap();
        let b = client.execute(Method::DELETE, "ip-pools/b", None).await.unwrap();
        assert!(a.is_no_content());
        assert!(b.is_no_content());
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip-pools"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "errors": [{"message": "You failed", "description": "More Info"}]
            })))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .execute(Method::GET, "ip-pools", None)
            .await
            .unwrap_err();

        let Error::Api(api) = err else {
            panic!("expected API error");
        };
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.uri, format!("{}/ip-pools", server.uri()));
        assert_eq!(api.messages(), vec!["You failed: More Info".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip-pools"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .execute(Method::GET, "ip-pools", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::JsonError(_)));
    }

    #[tokio::test]
    async fn test_retries_idempotent_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip-pools"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ip-pools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ServiceClientBuilder::new(server.uri(), "fake-key")
            .unwrap()
            .with_retry_policy(fast_retries(2))
            .build()
            .unwrap();

        let response = client.execute(Method::GET, "ip-pools", None).await.unwrap();
        assert_eq!(response.into_results(), json!([]));
    }

    #[tokio::test]
    async fn test_post_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ip-pools"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = ServiceClientBuilder::new(server.uri(), "fake-key")
            .unwrap()
            .with_retry_policy(fast_retries(3))
            .build()
            .unwrap();

        let body = json!({"name": "marketing"});
        let err = client
            .execute(Method::POST, "ip-pools", Some(&body))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip-pools/foo.com"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = ServiceClientBuilder::new(server.uri(), "fake-key")
            .unwrap()
            .with_retry_policy(fast_retries(3))
            .build()
            .unwrap();

        let err = client
            .execute(Method::GET, "ip-pools/foo.com", None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
