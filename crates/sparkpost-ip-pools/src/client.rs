//! Asynchronous IP Pools client implementation.

use crate::models::IpPool;
use crate::Result;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use sparkpost_core::client::{
    ApiResponse, ClientConfig, RetryPolicy, ServiceClient, ServiceClientBuilder, Transport,
};
use sparkpost_core::config::SparkPostConfig;
use sparkpost_core::Error;
use std::sync::Arc;
use tracing::debug;

const USER_AGENT: &str = concat!("sparkpost-ip-pools/", env!("CARGO_PKG_VERSION"));
const COLLECTION: &str = "ip-pools";

/// Builder for [`IpPools`].
#[derive(Debug, Clone)]
pub struct IpPoolsBuilder {
    inner: ServiceClientBuilder,
}

impl IpPoolsBuilder {
    /// Create a builder for the given API root (e.g. `https://api.sparkpost.com/api/v1`).
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let builder = ServiceClientBuilder::new(base_url, api_key)?.with_user_agent(USER_AGENT);
        Ok(Self { inner: builder })
    }

    /// Create a builder from a [`SparkPostConfig`].
    pub fn from_config(config: &SparkPostConfig) -> Result<Self> {
        let builder = ServiceClientBuilder::from_config(config)?.with_user_agent(USER_AGENT);
        Ok(Self { inner: builder })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.inner = self.inner.with_retry_policy(retry);
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<IpPools> {
        let inner = self.inner.build()?;
        Ok(IpPools::from_client(inner))
    }
}

/// Client for the `/ip-pools` endpoints.
///
/// Payloads are forwarded as given and responses are returned as decoded JSON.
/// Any non-success status yields [`Error::Api`]; use [`Error::is_not_found`] to
/// tell a missing pool apart from other failures.
#[derive(Clone)]
pub struct IpPools {
    transport: Arc<dyn Transport>,
}

impl IpPools {
    /// Client for the default US endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&SparkPostConfig::new(api_key)?)
    }

    /// Client built from a [`SparkPostConfig`].
    pub fn from_config(config: &SparkPostConfig) -> Result<Self> {
        IpPoolsBuilder::from_config(config)?.build()
    }

    /// Start a builder for a custom API root.
    pub fn builder(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
    ) -> Result<IpPoolsBuilder> {
        IpPoolsBuilder::new(base_url, api_key)
    }

    /// Reuse an existing [`ServiceClient`], sharing its connection pool.
    #[must_use]
    pub fn from_client(client: ServiceClient) -> Self {
        Self::with_transport(Arc::new(client))
    }

    /// Use any [`Transport`] implementation.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Create an IP pool.
    ///
    /// Returns the decoded `results`, which holds the new pool's `id`.
    pub async fn create<B>(&self, fields: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(fields)?;
        self.transport
            .request(Method::POST, COLLECTION, Some(body))
            .await
            .map(ApiResponse::into_results)
    }

    /// Fetch a single IP pool.
    pub async fn get(&self, id: &str) -> Result<Value> {
        let path = pool_path(id)?;
        self.transport
            .request(Method::GET, &path, None)
            .await
            .map(ApiResponse::into_results)
    }

    /// List all IP pools in the order the API returns them.
    pub async fn list(&self) -> Result<Vec<Value>> {
        let results = self
            .transport
            .request(Method::GET, COLLECTION, None)
            .await?
            .into_results();

        match results {
            Value::Array(pools) => {
                debug!(count = pools.len(), "Listed IP pools");
                Ok(pools)
            }
            Value::Null => Ok(Vec::new()),
            other => Err(Error::JsonError(format!(
                "Expected a list of IP pools, got: {other}"
            ))),
        }
    }

    /// Update an IP pool.
    ///
    /// Returns the response body as sent by the API.
    pub async fn update<B>(&self, id: &str, fields: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let path = pool_path(id)?;
        let body = serde_json::to_value(fields)?;
        self.transport
            .request(Method::PUT, &path, Some(body))
            .await
            .map(ApiResponse::into_results)
    }

    /// Delete an IP pool. Its sending IPs move back to the default pool.
    ///
    /// Returns `true` once the API acknowledges the deletion.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let path = pool_path(id)?;
        let response = self.transport.request(Method::DELETE, &path, None).await?;
        debug!(id, empty = response.is_no_content(), "Deleted IP pool");
        Ok(true)
    }

    /// Fetch a single IP pool decoded into [`IpPool`].
    pub async fn get_pool(&self, id: &str) -> Result<IpPool> {
        let value = self.get(id).await?;
        serde_json::from_value(value).map_err(Error::from)
    }

    /// List all IP pools decoded into [`IpPool`].
    pub async fn list_pools(&self) -> Result<Vec<IpPool>> {
        self.list()
            .await?
            .into_iter()
            .map(|pool| serde_json::from_value(pool).map_err(Error::from))
            .collect()
    }
}

/// Path of a single pool. Ids that would resolve to another URL are rejected.
fn pool_path(id: &str) -> Result<String> {
    if id.is_empty() {
        return Err(Error::ValidationError(
            "IP pool id must not be empty".to_string(),
        ));
    }
    if id == "." || id == ".." || id.contains(['/', '?', '#']) {
        return Err(Error::ValidationError(format!(
            "IP pool id `{id}` is not a single path segment"
        )));
    }
    Ok(format!("{COLLECTION}/{id}"))
}
