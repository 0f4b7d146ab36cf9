use crate::features::compute_control::service::ComputeService;
use crate::shared::error::{GatewayError, GatewayResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Thin wrapper serializing compute operations for the Tool Gateway.
pub struct ComputeController {
    service: Arc<ComputeService>,
}

impl ComputeController {
    pub fn new(service: Arc<ComputeService>) -> Self {
        Self { service }
    }

    pub async fn list_instances(
        &self,
        tag_value: &str,
        state_filter: Option<&str>,
    ) -> GatewayResult<Value> {
        info!(tag_value, ?state_filter, "Received list instances request");
        let instances = self.service.list_instances(tag_value, state_filter).await?;
        to_value(instances)
    }

    pub async fn start_instance(&self, instance_id: &str) -> GatewayResult<Value> {
        info!(instance_id, "Received start instance request");
        let change = self.service.start_instance(instance_id).await?;
        to_value(change)
    }

    pub async fn stop_instance(&self, instance_id: &str) -> GatewayResult<Value> {
        info!(instance_id, "Received stop instance request");
        let change = self.service.stop_instance(instance_id).await?;
        to_value(change)
    }

    pub async fn list_images(&self, name_pattern: &str) -> GatewayResult<Value> {
        info!(name_pattern, "Received list images request");
        let images = self.service.list_images(name_pattern).await?;
        to_value(images)
    }
}

pub(crate) fn to_value<T: serde::Serialize>(value: T) -> GatewayResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| GatewayError::Storage(format!("failed to serialize response: {e}")))
}
