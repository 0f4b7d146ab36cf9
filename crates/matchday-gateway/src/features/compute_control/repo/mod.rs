use crate::config::ComputeConfig;
use crate::shared::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use matchday_core::{Instance, InstanceState, InstanceStateChange, MachineImage};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Boundary to the external compute-control API.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// List instances carrying the project tag with the given tag value,
    /// optionally narrowed server-side by state.
    async fn describe_instances(
        &self,
        tag_value: &str,
        state: Option<InstanceState>,
    ) -> GatewayResult<Vec<Instance>>;

    async fn start_instance(&self, instance_id: &str) -> GatewayResult<InstanceStateChange>;

    async fn stop_instance(&self, instance_id: &str) -> GatewayResult<InstanceStateChange>;

    async fn describe_images(&self, name_pattern: &str) -> GatewayResult<Vec<MachineImage>>;
}

/// HTTP implementation against the compute-control endpoint.
pub struct HttpComputeApi {
    client: reqwest::Client,
    config: ComputeConfig,
}

impl HttpComputeApi {
    pub fn new(config: ComputeConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            GatewayError::Configuration(format!("failed to build compute API client: {e}"))
        })?;
        Ok(Self { client, config })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::ExternalApi(format!(
                "compute API returned {status}: {body}"
            )));
        }
        response.json::<T>().await.map_err(|e| {
            GatewayError::ExternalApi(format!("failed to decode compute API response: {e}"))
        })
    }
}

#[async_trait]
impl ComputeApi for HttpComputeApi {
    async fn describe_instances(
        &self,
        tag_value: &str,
        state: Option<InstanceState>,
    ) -> GatewayResult<Vec<Instance>> {
        let mut query = vec![
            ("region", self.config.region.clone()),
            ("tag", self.config.project_tag.clone()),
            ("tagValue", tag_value.to_string()),
        ];
        if let Some(state) = state {
            query.push(("state", state.as_str().to_string()));
        }

        let response = self
            .client
            .get(format!("{}/instances", self.config.endpoint))
            .query(&query)
            .send()
            .await
            .map_err(|e| GatewayError::ExternalApi(format!("compute API request failed: {e}")))?;
        Self::decode(response).await
    }

    async fn start_instance(&self, instance_id: &str) -> GatewayResult<InstanceStateChange> {
        let response = self
            .client
            .post(format!(
                "{}/instances/{instance_id}/start",
                self.config.endpoint
            ))
            .query(&[("region", self.config.region.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::ExternalApi(format!("compute API request failed: {e}")))?;
        Self::decode(response).await
    }

    async fn stop_instance(&self, instance_id: &str) -> GatewayResult<InstanceStateChange> {
        let response = self
            .client
            .post(format!(
                "{}/instances/{instance_id}/stop",
                self.config.endpoint
            ))
            .query(&[("region", self.config.region.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::ExternalApi(format!("compute API request failed: {e}")))?;
        Self::decode(response).await
    }

    async fn describe_images(&self, name_pattern: &str) -> GatewayResult<Vec<MachineImage>> {
        let response = self
            .client
            .get(format!("{}/images", self.config.endpoint))
            .query(&[
                ("region", self.config.region.as_str()),
                ("name", name_pattern),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::ExternalApi(format!("compute API request failed: {e}")))?;
        Self::decode(response).await
    }
}

/// In-memory compute backend used by tests.
#[derive(Default)]
pub struct InMemoryComputeApi {
    instances: RwLock<HashMap<String, (Instance, String)>>,
    images: RwLock<Vec<MachineImage>>,
}

impl InMemoryComputeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_instance(&self, instance: Instance, tag_value: impl Into<String>) {
        let mut instances = self.instances.write().await;
        instances.insert(instance.instance_id.clone(), (instance, tag_value.into()));
    }

    pub async fn insert_image(&self, image: MachineImage) {
        let mut images = self.images.write().await;
        images.push(image);
    }

    async fn change_state(
        &self,
        instance_id: &str,
        target: InstanceState,
        already: InstanceState,
    ) -> GatewayResult<InstanceStateChange> {
        let mut instances = self.instances.write().await;
        let (instance, _) = instances.get_mut(instance_id).ok_or_else(|| {
            GatewayError::ExternalApi(format!("instance {instance_id} not found"))
        })?;

        let previous = instance.state;
        let message = if previous == already {
            format!("instance {instance_id} is already {already}")
        } else {
            instance.state = target;
            format!("instance {instance_id}: {previous} -> {target}")
        };

        Ok(InstanceStateChange {
            instance_id: instance_id.to_string(),
            previous_state: previous,
            current_state: instance.state,
            message,
        })
    }
}

#[async_trait]
impl ComputeApi for InMemoryComputeApi {
    async fn describe_instances(
        &self,
        tag_value: &str,
        state: Option<InstanceState>,
    ) -> GatewayResult<Vec<Instance>> {
        let instances = self.instances.read().await;
        Ok(instances
            .values()
            .filter(|(instance, tag)| {
                tag == tag_value && state.map_or(true, |s| instance.state == s)
            })
            .map(|(instance, _)| instance.clone())
            .collect())
    }

    async fn start_instance(&self, instance_id: &str) -> GatewayResult<InstanceStateChange> {
        self.change_state(instance_id, InstanceState::Pending, InstanceState::Running)
            .await
    }

    async fn stop_instance(&self, instance_id: &str) -> GatewayResult<InstanceStateChange> {
        self.change_state(instance_id, InstanceState::Stopping, InstanceState::Stopped)
            .await
    }

    async fn describe_images(&self, name_pattern: &str) -> GatewayResult<Vec<MachineImage>> {
        let images = self.images.read().await;
        Ok(images
            .iter()
            .filter(|image| name_pattern.is_empty() || image.name.contains(name_pattern))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn instance(id: &str, state: InstanceState) -> Instance {
        Instance {
            instance_id: id.to_string(),
            name: format!("render-{id}"),
            state,
            public_ip: None,
            private_ip: Some("10.1.0.5".to_string()),
            instance_type: "g5.xlarge".to_string(),
            launch_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_describe_instances_filters_by_tag_and_state() {
        let repo = InMemoryComputeApi::new();
        repo.insert_instance(instance("i-01", InstanceState::Running), "pool")
            .await;
        repo.insert_instance(instance("i-02", InstanceState::Stopped), "pool")
            .await;
        repo.insert_instance(instance("i-03", InstanceState::Running), "scratch")
            .await;

        let all = repo.describe_instances("pool", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let running = repo
            .describe_instances("pool", Some(InstanceState::Running))
            .await
            .unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].instance_id, "i-01");
    }

    #[tokio::test]
    async fn test_describe_instances_empty_result_is_ok() {
        let repo = InMemoryComputeApi::new();
        let result = repo.describe_instances("pool", None).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_start_instance_transitions_state() {
        let repo = InMemoryComputeApi::new();
        repo.insert_instance(instance("i-01", InstanceState::Stopped), "pool")
            .await;

        let change = repo.start_instance("i-01").await.unwrap();
        assert_eq!(change.previous_state, InstanceState::Stopped);
        assert_eq!(change.current_state, InstanceState::Pending);
    }

    #[tokio::test]
    async fn test_start_instance_already_running_surfaces_backend_message() {
        let repo = InMemoryComputeApi::new();
        repo.insert_instance(instance("i-01", InstanceState::Running), "pool")
            .await;

        let change = repo.start_instance("i-01").await.unwrap();
        assert_eq!(change.previous_state, InstanceState::Running);
        assert_eq!(change.current_state, InstanceState::Running);
        assert!(change.message.contains("already"));
    }

    #[tokio::test]
    async fn test_start_instance_not_found() {
        let repo = InMemoryComputeApi::new();
        let err = repo.start_instance("i-ffff").await.unwrap_err();
        assert!(matches!(err, GatewayError::ExternalApi(_)));
    }

    #[tokio::test]
    async fn test_stop_instance_transitions_state() {
        let repo = InMemoryComputeApi::new();
        repo.insert_instance(instance("i-01", InstanceState::Running), "pool")
            .await;

        let change = repo.stop_instance("i-01").await.unwrap();
        assert_eq!(change.previous_state, InstanceState::Running);
        assert_eq!(change.current_state, InstanceState::Stopping);
    }
}
