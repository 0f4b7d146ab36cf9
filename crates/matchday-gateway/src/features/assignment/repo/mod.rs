use crate::features::state_store::service::StoreService;
use crate::shared::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use matchday_core::{Assignment, Project};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Boundary to the assignment region of the state store. The registry is
/// the only writer to this region.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Full record list for an instance, oldest first. An instance with no
    /// history yields an empty list.
    async fn records(&self, instance_id: &str) -> GatewayResult<Vec<Assignment>>;

    /// Replace the record list for an instance.
    async fn save(&self, instance_id: &str, records: &[Assignment]) -> GatewayResult<()>;
}

/// Persists assignment records through the state-store client, one document
/// per instance under the configured root.
pub struct StoreAssignmentRepository {
    store: Arc<StoreService>,
    project: Project,
    root: String,
}

impl StoreAssignmentRepository {
    pub fn new(store: Arc<StoreService>, project: Project, root: impl Into<String>) -> Self {
        Self {
            store,
            project,
            root: root.into(),
        }
    }

    fn path(&self, instance_id: &str) -> String {
        format!("{}/{instance_id}", self.root)
    }
}

#[async_trait]
impl AssignmentRepository for StoreAssignmentRepository {
    async fn records(&self, instance_id: &str) -> GatewayResult<Vec<Assignment>> {
        let result = self.store.get(self.project, &self.path(instance_id)).await?;
        if !result.exists {
            return Ok(Vec::new());
        }
        serde_json::from_value(result.data).map_err(|e| {
            GatewayError::Storage(format!(
                "malformed assignment records for {instance_id}: {e}"
            ))
        })
    }

    async fn save(&self, instance_id: &str, records: &[Assignment]) -> GatewayResult<()> {
        let data = serde_json::to_value(records).map_err(|e| {
            GatewayError::Storage(format!(
                "failed to encode assignment records for {instance_id}: {e}"
            ))
        })?;
        self.store
            .set(self.project, &self.path(instance_id), &data)
            .await?;
        Ok(())
    }
}

/// In-memory assignment region used by tests.
#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    records: RwLock<HashMap<String, Vec<Assignment>>>,
}

impl InMemoryAssignmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn records(&self, instance_id: &str) -> GatewayResult<Vec<Assignment>> {
        let records = self.records.read().await;
        Ok(records.get(instance_id).cloned().unwrap_or_default())
    }

    async fn save(&self, instance_id: &str, records: &[Assignment]) -> GatewayResult<()> {
        let mut map = self.records.write().await;
        map.insert(instance_id.to_string(), records.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::state_store::repo::{InMemoryStateStore, StateStore};
    use crate::features::state_store::service::StoreHandleFactory;

    struct InMemoryFactory;

    impl StoreHandleFactory for InMemoryFactory {
        fn open(&self, _project: Project) -> GatewayResult<Arc<dyn StateStore>> {
            Ok(Arc::new(InMemoryStateStore::new()))
        }
    }

    fn store_backed_repo() -> StoreAssignmentRepository {
        let store = Arc::new(StoreService::new(Box::new(InMemoryFactory)));
        StoreAssignmentRepository::new(store, Project::Prod, "fleet/assignments")
    }

    #[tokio::test]
    async fn test_records_empty_for_unknown_instance() {
        let repo = store_backed_repo();
        let records = repo.records("i-0001").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_reload_round_trips() {
        let repo = store_backed_repo();

        let mut first = Assignment::new("comp-1", "i-0001");
        first.close();
        let second = Assignment::new("comp-2", "i-0001");
        repo.save("i-0001", &[first, second]).await.unwrap();

        let records = repo.records("i-0001").await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].is_active());
        assert!(records[1].is_active());
        assert_eq!(records[1].competition_id, "comp-2");
    }

    #[tokio::test]
    async fn test_instances_keep_separate_histories() {
        let repo = store_backed_repo();
        repo.save("i-0001", &[Assignment::new("comp-1", "i-0001")])
            .await
            .unwrap();

        let other = repo.records("i-0002").await.unwrap();
        assert!(other.is_empty());
    }
}
