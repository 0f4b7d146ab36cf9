use crate::features::assignment::repo::AssignmentRepository;
use crate::features::compute_control::service::ComputeService;
use crate::shared::error::{GatewayError, GatewayResult};
use crate::shared::types::{AssignmentOutcome, PoolInstanceStatus};
use matchday_core::{validate_instance_id, Assignment, InstanceState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Pool/Assignment Registry.
///
/// Assign/release/reassign for one instance run as a critical section under
/// a per-instance mutex; the registry is the sole writer to the assignment
/// region, so the lock makes check-then-write safe. Status reads are
/// lock-free and may observe stale data.
pub struct RegistryService {
    compute: Arc<ComputeService>,
    repo: Arc<dyn AssignmentRepository>,
    pool_tag: String,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RegistryService {
    pub fn new(
        compute: Arc<ComputeService>,
        repo: Arc<dyn AssignmentRepository>,
        pool_tag: impl Into<String>,
    ) -> Self {
        Self {
            compute,
            repo,
            pool_tag: pool_tag.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn instance_lock(&self, instance_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(instance_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn validate_ids(competition_id: &str, instance_id: &str) -> GatewayResult<()> {
        if competition_id.trim().is_empty() {
            return Err(GatewayError::Validation(
                "Competition ID cannot be empty".to_string(),
            ));
        }
        validate_instance_id(instance_id)
            .map_err(|e| GatewayError::Validation(e.to_string()))
    }

    /// Pool-wide view: every known instance's compute state joined with its
    /// current assignment.
    pub async fn status(&self) -> GatewayResult<Vec<PoolInstanceStatus>> {
        let instances = self.compute.list_instances(&self.pool_tag, None).await?;

        let mut entries = Vec::with_capacity(instances.len());
        for instance in instances {
            let records = self.repo.records(&instance.instance_id).await?;
            let assignment = records.into_iter().find(|r| r.is_active());
            let available = assignment.is_none();
            entries.push(PoolInstanceStatus {
                instance,
                assignment,
                available,
            });
        }
        Ok(entries)
    }

    /// Bind an instance to a competition. Assigning an instance to the
    /// competition it already serves is a no-op success; an instance held by
    /// another competition is rejected.
    pub async fn assign(
        &self,
        competition_id: &str,
        instance_id: &str,
    ) -> GatewayResult<AssignmentOutcome> {
        Self::validate_ids(competition_id, instance_id)?;

        let lock = self.instance_lock(instance_id).await;
        let _guard = lock.lock().await;
        self.assign_locked(competition_id, instance_id).await
    }

    async fn assign_locked(
        &self,
        competition_id: &str,
        instance_id: &str,
    ) -> GatewayResult<AssignmentOutcome> {
        let mut records = self.repo.records(instance_id).await?;

        if let Some(active) = records.iter().find(|r| r.is_active()) {
            if active.competition_id == competition_id {
                return Ok(AssignmentOutcome {
                    assignment: active.clone(),
                    already_assigned: true,
                    message: format!(
                        "instance {instance_id} already assigned to {competition_id}"
                    ),
                });
            }
            return Err(GatewayError::AssignmentConflict(format!(
                "instance {instance_id} is already assigned to competition {}",
                active.competition_id
            )));
        }

        let assignment = Assignment::new(competition_id, instance_id);
        records.push(assignment.clone());
        self.repo.save(instance_id, &records).await?;
        info!(instance_id, competition_id, "Assigned instance");

        let message = self.ensure_running(instance_id).await;
        Ok(AssignmentOutcome {
            assignment,
            already_assigned: false,
            message,
        })
    }

    /// Start the instance if the pool listing shows it not running. The
    /// assignment stands even if the start fails; the outcome message
    /// carries the start error for the operator.
    async fn ensure_running(&self, instance_id: &str) -> String {
        let instances = match self.compute.list_instances(&self.pool_tag, None).await {
            Ok(instances) => instances,
            Err(err) => {
                warn!(instance_id, error = %err, "Pool state unavailable after assign");
                return format!("assigned; pool state unavailable: {err}");
            }
        };

        match instances.iter().find(|i| i.instance_id == instance_id) {
            Some(instance) if instance.state == InstanceState::Running => {
                format!("instance {instance_id} is running")
            }
            Some(_) => match self.compute.start_instance(instance_id).await {
                Ok(change) => change.message,
                Err(err) => {
                    warn!(instance_id, error = %err, "Start after assign failed");
                    format!("assigned; start failed: {err}")
                }
            },
            None => format!("instance {instance_id} not visible in pool listing"),
        }
    }

    /// Close the active assignment. The instance is not stopped.
    pub async fn release(&self, instance_id: &str) -> GatewayResult<Assignment> {
        let lock = self.instance_lock(instance_id).await;
        let _guard = lock.lock().await;
        self.release_locked(instance_id).await
    }

    async fn release_locked(&self, instance_id: &str) -> GatewayResult<Assignment> {
        let mut records = self.repo.records(instance_id).await?;

        let active = records.iter_mut().find(|r| r.is_active()).ok_or_else(|| {
            GatewayError::AssignmentNotFound(format!(
                "instance {instance_id} has no active assignment"
            ))
        })?;
        active.close();
        let closed = active.clone();

        self.repo.save(instance_id, &records).await?;
        info!(instance_id, competition_id = %closed.competition_id, "Released instance");
        Ok(closed)
    }

    /// Release-then-assign under one critical section, so no caller can
    /// observe the instance unassigned in between.
    pub async fn reassign(
        &self,
        competition_id: &str,
        instance_id: &str,
    ) -> GatewayResult<AssignmentOutcome> {
        Self::validate_ids(competition_id, instance_id)?;

        let lock = self.instance_lock(instance_id).await;
        let _guard = lock.lock().await;

        let released = self.release_locked(instance_id).await?;
        let mut outcome = self.assign_locked(competition_id, instance_id).await?;
        outcome.message = format!(
            "reassigned from {}: {}",
            released.competition_id, outcome.message
        );
        Ok(outcome)
    }
}
