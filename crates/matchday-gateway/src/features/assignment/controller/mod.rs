use crate::features::assignment::service::RegistryService;
use crate::features::compute_control::controller::to_value;
use crate::shared::error::GatewayResult;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Thin wrapper serializing registry operations for the Tool Gateway.
pub struct RegistryController {
    service: Arc<RegistryService>,
}

impl RegistryController {
    pub fn new(service: Arc<RegistryService>) -> Self {
        Self { service }
    }

    pub async fn status(&self) -> GatewayResult<Value> {
        info!("Received pool status request");
        let status = self.service.status().await?;
        to_value(status)
    }

    pub async fn assign(&self, competition_id: &str, instance_id: &str) -> GatewayResult<Value> {
        info!(competition_id, instance_id, "Received assign request");
        let outcome = self.service.assign(competition_id, instance_id).await?;
        to_value(outcome)
    }

    pub async fn release(&self, instance_id: &str) -> GatewayResult<Value> {
        info!(instance_id, "Received release request");
        let closed = self.service.release(instance_id).await?;
        to_value(closed)
    }

    pub async fn reassign(&self, competition_id: &str, instance_id: &str) -> GatewayResult<Value> {
        info!(competition_id, instance_id, "Received reassign request");
        let outcome = self.service.reassign(competition_id, instance_id).await?;
        to_value(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::assignment::repo::InMemoryAssignmentRepository;
    use crate::features::compute_control::repo::InMemoryComputeApi;
    use crate::features::compute_control::service::ComputeService;
    use chrono::Utc;
    use matchday_core::{Instance, InstanceState};

    async fn controller() -> RegistryController {
        let compute_repo = Arc::new(InMemoryComputeApi::new());
        compute_repo
            .insert_instance(
                Instance {
                    instance_id: "i-0c01".to_string(),
                    name: "render-1".to_string(),
                    state: InstanceState::Running,
                    public_ip: None,
                    private_ip: None,
                    instance_type: "g5.xlarge".to_string(),
                    launch_time: Utc::now(),
                },
                "pool",
            )
            .await;

        let compute = Arc::new(ComputeService::new(compute_repo));
        let repo = Arc::new(InMemoryAssignmentRepository::new());
        RegistryController::new(Arc::new(RegistryService::new(compute, repo, "pool")))
    }

    #[tokio::test]
    async fn test_controller_assign_release_wire_shape() {
        let controller = controller().await;

        let outcome = controller.assign("comp-1", "i-0c01").await.unwrap();
        assert_eq!(outcome["assignment"]["competitionId"], "comp-1");
        assert_eq!(outcome["alreadyAssigned"], false);

        let closed = controller.release("i-0c01").await.unwrap();
        assert_eq!(closed["competitionId"], "comp-1");
        assert!(!closed["releasedAt"].is_null());
    }

    #[tokio::test]
    async fn test_controller_status_wire_shape() {
        let controller = controller().await;
        let status = controller.status().await.unwrap();
        let entries = status.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["available"], true);
        assert!(entries[0]["assignment"].is_null());
    }
}
