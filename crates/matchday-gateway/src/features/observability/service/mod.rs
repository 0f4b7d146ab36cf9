use crate::features::observability::repo::ObservabilityRepository;
use std::sync::Arc;

pub struct ObservabilityService {
    repo: Arc<ObservabilityRepository>,
}

impl ObservabilityService {
    pub fn new(repo: Arc<ObservabilityRepository>) -> Self {
        Self { repo }
    }

    pub fn record_tool_request(&self, tool: &str, status: &str, seconds: f64) {
        self.repo.observe_tool_request(tool, status, seconds);
    }

    pub fn set_pool_assigned(&self, count: usize) {
        self.repo.set_pool_assigned_count(count as f64);
    }

    pub fn record_session_failure(&self) {
        self.repo.inc_remote_session_failure();
    }

    pub fn render_metrics(&self) -> Result<String, String> {
        self.repo.render_metrics()
    }
}
