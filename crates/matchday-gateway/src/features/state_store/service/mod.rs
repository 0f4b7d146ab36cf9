use crate::config::StoreConfig;
use crate::features::state_store::repo::{HttpStateStore, StateStore};
use crate::shared::error::{GatewayError, GatewayResult};
use crate::shared::types::{StoreDeleteAck, StoreWriteAck};
use matchday_core::{Project, StoreReadResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Creates store handles on first use of a project.
pub trait StoreHandleFactory: Send + Sync {
    fn open(&self, project: Project) -> GatewayResult<Arc<dyn StateStore>>;
}

pub struct HttpStoreHandleFactory {
    config: StoreConfig,
}

impl HttpStoreHandleFactory {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }
}

impl StoreHandleFactory for HttpStoreHandleFactory {
    fn open(&self, project: Project) -> GatewayResult<Arc<dyn StateStore>> {
        let store = HttpStateStore::connect(self.config.project(project))?;
        Ok(Arc::new(store))
    }
}

/// State Store Client: project-scoped reads/writes with normalized
/// existence semantics. Handles are opened lazily and cached for the
/// process lifetime; a project whose credentials are missing fails alone.
pub struct StoreService {
    factory: Box<dyn StoreHandleFactory>,
    handles: RwLock<HashMap<Project, Arc<dyn StateStore>>>,
}

impl StoreService {
    pub fn new(factory: Box<dyn StoreHandleFactory>) -> Self {
        Self {
            factory,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Parse a caller-supplied project name. Anything outside dev/prod fails
    /// fast with a message naming both valid options and the offending value.
    pub fn parse_project(raw: &str) -> GatewayResult<Project> {
        raw.parse::<Project>().map_err(GatewayError::from)
    }

    async fn handle(&self, project: Project) -> GatewayResult<Arc<dyn StateStore>> {
        {
            let handles = self.handles.read().await;
            if let Some(handle) = handles.get(&project) {
                return Ok(handle.clone());
            }
        }

        let mut handles = self.handles.write().await;
        if let Some(handle) = handles.get(&project) {
            return Ok(handle.clone());
        }
        let handle = self.factory.open(project)?;
        info!(project = %project, "Opened state store handle");
        handles.insert(project, handle.clone());
        Ok(handle)
    }

    fn normalize_path(path: &str) -> GatewayResult<String> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(GatewayError::Validation(
                "Store path cannot be empty".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }

    pub async fn get(&self, project: Project, path: &str) -> GatewayResult<StoreReadResult> {
        let path = Self::normalize_path(path)?;
        let handle = self.handle(project).await?;
        let result = match handle.read(&path).await? {
            Some(data) => StoreReadResult::found(project, path, data),
            None => StoreReadResult::missing(project, path),
        };
        Ok(result)
    }

    pub async fn set(
        &self,
        project: Project,
        path: &str,
        data: &Value,
    ) -> GatewayResult<StoreWriteAck> {
        let path = Self::normalize_path(path)?;
        let handle = self.handle(project).await?;
        handle.write(&path, data).await?;
        info!(project = %project, path, "Wrote store path");
        Ok(StoreWriteAck {
            success: true,
            project,
            path,
        })
    }

    pub async fn delete(&self, project: Project, path: &str) -> GatewayResult<StoreDeleteAck> {
        let path = Self::normalize_path(path)?;
        let handle = self.handle(project).await?;
        handle.remove(&path).await?;
        info!(project = %project, path, "Deleted store path");
        Ok(StoreDeleteAck {
            success: true,
            project,
            path: path.clone(),
            message: format!("deleted {path}"),
        })
    }
}
