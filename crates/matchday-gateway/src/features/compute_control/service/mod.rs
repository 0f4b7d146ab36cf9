use crate::features::compute_control::repo::ComputeApi;
use crate::shared::error::{GatewayError, GatewayResult};
use matchday_core::{
    sort_images_newest_first, validate_image_id, validate_instance_id, Instance, InstanceState,
    InstanceStateChange, MachineImage,
};
use std::sync::Arc;
use tracing::info;

/// Compute Control Adapter: pure translation and error normalization over
/// the external compute API. No retries; transient failures are surfaced for
/// the caller to decide.
pub struct ComputeService {
    repo: Arc<dyn ComputeApi>,
}

impl ComputeService {
    pub fn new(repo: Arc<dyn ComputeApi>) -> Self {
        Self { repo }
    }

    /// List fleet instances for a tag value, optionally narrowed by state.
    /// An empty listing is a valid result, not an error.
    pub async fn list_instances(
        &self,
        tag_value: &str,
        state_filter: Option<&str>,
    ) -> GatewayResult<Vec<Instance>> {
        if tag_value.is_empty() {
            return Err(GatewayError::Validation(
                "Tag filter cannot be empty".to_string(),
            ));
        }

        let state = match state_filter {
            Some(raw) => Some(
                raw.parse::<InstanceState>()
                    .map_err(|e| GatewayError::Validation(e.to_string()))?,
            ),
            None => None,
        };

        let instances = self.repo.describe_instances(tag_value, state).await?;
        for instance in &instances {
            validate_instance_id(&instance.instance_id)?;
        }

        info!(tag_value, count = instances.len(), "Listed fleet instances");
        Ok(instances)
    }

    pub async fn start_instance(&self, instance_id: &str) -> GatewayResult<InstanceStateChange> {
        validate_instance_id(instance_id)?;
        // Starting an already-running instance is not guarded here; the
        // compute system's own idempotency or rejection is surfaced verbatim.
        let change = self.repo.start_instance(instance_id).await?;
        info!(
            instance_id,
            previous = %change.previous_state,
            current = %change.current_state,
            "Start requested"
        );
        Ok(change)
    }

    pub async fn stop_instance(&self, instance_id: &str) -> GatewayResult<InstanceStateChange> {
        validate_instance_id(instance_id)?;
        let change = self.repo.stop_instance(instance_id).await?;
        info!(
            instance_id,
            previous = %change.previous_state,
            current = %change.current_state,
            "Stop requested"
        );
        Ok(change)
    }

    /// List machine images matching a name pattern, newest first.
    pub async fn list_images(&self, name_pattern: &str) -> GatewayResult<Vec<MachineImage>> {
        let mut images = self.repo.describe_images(name_pattern).await?;
        for image in &images {
            validate_image_id(&image.ami_id)?;
        }
        sort_images_newest_first(&mut images);
        Ok(images)
    }
}
