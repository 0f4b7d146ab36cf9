use crate::config::StoreProjectConfig;
use crate::shared::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Boundary to one project's remote persisted store.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// `None` means the path was never written (or was deleted).
    async fn read(&self, path: &str) -> GatewayResult<Option<Value>>;

    async fn write(&self, path: &str, data: &Value) -> GatewayResult<()>;

    /// Deleting an absent path is not an error.
    async fn remove(&self, path: &str) -> GatewayResult<()>;
}

/// HTTP document-store implementation. Paths address subtrees as
/// `{endpoint}/{path}.json`; a literal `null` body on read means the path
/// holds nothing.
#[derive(Debug)]
pub struct HttpStateStore {
    client: reqwest::Client,
    endpoint: String,
    auth_token: String,
}

impl HttpStateStore {
    /// Opens a handle for one project. The auth token is loaded from the
    /// project's secret file here, so a missing secret fails this project at
    /// handle creation without affecting any other.
    pub fn connect(config: &StoreProjectConfig) -> GatewayResult<Self> {
        let auth_token = std::fs::read_to_string(&config.secret_path)
            .map_err(|e| {
                GatewayError::Configuration(format!(
                    "failed to read store credentials at {}: {e}",
                    config.secret_path.display()
                ))
            })?
            .trim()
            .to_string();
        if auth_token.is_empty() {
            return Err(GatewayError::Configuration(format!(
                "store credentials at {} are empty",
                config.secret_path.display()
            )));
        }

        let client = reqwest::Client::builder().build().map_err(|e| {
            GatewayError::Configuration(format!("failed to build store client: {e}"))
        })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}.json", self.endpoint)
    }

    async fn check(response: reqwest::Response) -> GatewayResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::ExternalApi(format!(
                "state store returned {status}: {body}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl StateStore for HttpStateStore {
    async fn read(&self, path: &str) -> GatewayResult<Option<Value>> {
        let response = self
            .client
            .get(self.url(path))
            .query(&[("auth", self.auth_token.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::ExternalApi(format!("state store request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let data: Value = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                GatewayError::ExternalApi(format!("failed to decode state store response: {e}"))
            })?;

        Ok(if data.is_null() { None } else { Some(data) })
    }

    async fn write(&self, path: &str, data: &Value) -> GatewayResult<()> {
        let response = self
            .client
            .put(self.url(path))
            .query(&[("auth", self.auth_token.as_str())])
            .json(data)
            .send()
            .await
            .map_err(|e| GatewayError::ExternalApi(format!("state store request failed: {e}")))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> GatewayResult<()> {
        let response = self
            .client
            .delete(self.url(path))
            .query(&[("auth", self.auth_token.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::ExternalApi(format!("state store request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }
}

/// In-memory store used by tests and by the assignment registry's tests.
#[derive(Default)]
pub struct InMemoryStateStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn read(&self, path: &str) -> GatewayResult<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries.get(path).cloned())
    }

    async fn write(&self, path: &str, data: &Value) -> GatewayResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(path.to_string(), data.clone());
        Ok(())
    }

    async fn remove(&self, path: &str) -> GatewayResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(path);
        Ok(())
    }
}
