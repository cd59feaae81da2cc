//! Reqwest-backed TestRail API v2 client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::gateway::Gateway;

/// HTTP connect timeout for API calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Authenticated client for one TestRail instance.
pub struct ApiClient {
    base_url: String,
    username: String,
    password: SecretString,
    http_client: reqwest::Client,
}

impl ApiClient {
    /// Create a client from configuration.
    pub fn new(config: &Config) -> SyncResult<Self> {
        Self::with_credentials(
            &config.url,
            &config.username,
            config.password.clone(),
            config.http_timeout,
        )
    }

    /// Create a client from explicit credentials.
    pub fn with_credentials(
        url: &str,
        username: &str,
        password: SecretString,
        timeout: Duration,
    ) -> SyncResult<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password,
            http_client,
        })
    }

    /// Full URL for an API path. TestRail routes every v2 call through
    /// `index.php?/api/v2/`.
    fn url(&self, path: &str) -> String {
        format!("{}/index.php?/api/v2/{}", self.base_url, path)
    }

    /// Turn a response into its JSON body, mapping non-2xx to `Remote`.
    ///
    /// Some write paths (e.g. `delete_suite`) answer 200 with an empty body;
    /// those become `Value::Null`.
    async fn into_json(response: reqwest::Response) -> SyncResult<Value> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SyncError::remote(status.as_u16(), &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Gateway for ApiClient {
    async fn get(&self, path: &str) -> SyncResult<Value> {
        debug!("GET {}", path);
        let response = self
            .http_client
            .get(self.url(path))
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await?;
        Self::into_json(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> SyncResult<Value> {
        debug!("POST {}", path);
        let response = self
            .http_client
            .post(self.url(path))
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(body)
            .send()
            .await?;
        Self::into_json(response).await
    }
}
