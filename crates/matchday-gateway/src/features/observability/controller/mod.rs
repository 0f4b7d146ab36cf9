use crate::features::observability::repo::ObservabilityRepository;
use crate::features::observability::service::ObservabilityService;
use std::sync::Arc;

/// Metrics surface. Constructed once in main and passed explicitly into the
/// Tool Gateway and the HTTP server.
pub struct ObservabilityController {
    service: ObservabilityService,
}

impl ObservabilityController {
    pub fn new(service: ObservabilityService) -> Self {
        Self { service }
    }

    pub fn build() -> Result<Arc<Self>, String> {
        let repo = Arc::new(ObservabilityRepository::new()?);
        Ok(Arc::new(Self::new(ObservabilityService::new(repo))))
    }

    pub fn record_tool_request(&self, tool: &str, status: &str, seconds: f64) {
        self.service.record_tool_request(tool, status, seconds);
    }

    pub fn set_pool_assigned(&self, count: usize) {
        self.service.set_pool_assigned(count);
    }

    pub fn record_session_failure(&self) {
        self.service.record_session_failure();
    }

    pub fn render_metrics(&self) -> Result<String, String> {
        self.service.render_metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render_contains_known_metric_names() {
        let controller = ObservabilityController::build().unwrap();
        controller.record_tool_request("exec", "ok", 0.01);
        let rendered = controller.render_metrics().unwrap();
        assert!(rendered.contains("matchday_tool_request_total"));
    }

    #[test]
    fn test_pool_gauge_renders_current_value() {
        let controller = ObservabilityController::build().unwrap();
        controller.set_pool_assigned(3);
        let rendered = controller.render_metrics().unwrap();
        assert!(rendered.contains("matchday_pool_assigned_count 3"));
    }
}
