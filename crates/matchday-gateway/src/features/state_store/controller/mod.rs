use crate::features::compute_control::controller::to_value;
use crate::features::state_store::service::StoreService;
use crate::shared::error::GatewayResult;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Thin wrapper serializing store operations for the Tool Gateway.
pub struct StoreController {
    service: Arc<StoreService>,
}

impl StoreController {
    pub fn new(service: Arc<StoreService>) -> Self {
        Self { service }
    }

    pub async fn get(&self, project: &str, path: &str) -> GatewayResult<Value> {
        info!(project, path, "Received store get request");
        let project = StoreService::parse_project(project)?;
        let result = self.service.get(project, path).await?;
        to_value(result)
    }

    pub async fn set(&self, project: &str, path: &str, data: &Value) -> GatewayResult<Value> {
        info!(project, path, "Received store set request");
        let project = StoreService::parse_project(project)?;
        let ack = self.service.set(project, path, data).await?;
        to_value(ack)
    }

    pub async fn delete(&self, project: &str, path: &str) -> GatewayResult<Value> {
        info!(project, path, "Received store delete request");
        let project = StoreService::parse_project(project)?;
        let ack = self.service.delete(project, path).await?;
        to_value(ack)
    }
}
