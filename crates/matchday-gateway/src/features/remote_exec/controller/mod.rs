use crate::features::compute_control::controller::to_value;
use crate::features::remote_exec::service::ExecService;
use crate::shared::error::GatewayResult;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Thin wrapper serializing dispatcher operations for the Tool Gateway.
pub struct ExecController {
    service: Arc<ExecService>,
}

impl ExecController {
    pub fn new(service: Arc<ExecService>) -> Self {
        Self { service }
    }

    pub async fn exec(&self, target: &str, command: &str, sudo: bool) -> GatewayResult<Value> {
        info!(target, sudo, "Received exec request");
        let result = self.service.exec(target, command, sudo).await?;
        to_value(result)
    }

    pub async fn multi_exec(
        &self,
        targets: &[String],
        command: &str,
        sudo: bool,
    ) -> GatewayResult<Value> {
        info!(target_count = targets.len(), sudo, "Received multi exec request");
        let result = self.service.multi_exec(targets, command, sudo).await?;
        to_value(result)
    }
}
