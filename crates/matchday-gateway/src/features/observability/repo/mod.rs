use prometheus::{
    opts, Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Registry, TextEncoder,
};

pub struct ObservabilityRepository {
    registry: Registry,
    tool_request_total: CounterVec,
    tool_request_latency_seconds: HistogramVec,
    pool_assigned_count: Gauge,
    remote_session_failure_total: Counter,
}

impl ObservabilityRepository {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();

        let tool_request_total = CounterVec::new(
            opts!("matchday_tool_request_total", "Tool Gateway request total"),
            &["tool", "status"],
        )
        .map_err(|e| e.to_string())?;
        let tool_request_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "matchday_tool_request_latency_seconds",
                "Tool Gateway request latency (seconds)",
            ),
            &["tool"],
        )
        .map_err(|e| e.to_string())?;
        let pool_assigned_count = Gauge::with_opts(opts!(
            "matchday_pool_assigned_count",
            "Instances with an active assignment"
        ))
        .map_err(|e| e.to_string())?;
        let remote_session_failure_total = Counter::with_opts(opts!(
            "matchday_remote_session_failure_total",
            "Remote-shell sessions that could not be established"
        ))
        .map_err(|e| e.to_string())?;

        registry
            .register(Box::new(tool_request_total.clone()))
            .map_err(|e| e.to_string())?;
        registry
            .register(Box::new(tool_request_latency_seconds.clone()))
            .map_err(|e| e.to_string())?;
        registry
            .register(Box::new(pool_assigned_count.clone()))
            .map_err(|e| e.to_string())?;
        registry
            .register(Box::new(remote_session_failure_total.clone()))
            .map_err(|e| e.to_string())?;

        Ok(Self {
            registry,
            tool_request_total,
            tool_request_latency_seconds,
            pool_assigned_count,
            remote_session_failure_total,
        })
    }

    pub fn observe_tool_request(&self, tool: &str, status: &str, seconds: f64) {
        self.tool_request_total
            .with_label_values(&[tool, status])
            .inc();
        self.tool_request_latency_seconds
            .with_label_values(&[tool])
            .observe(seconds);
    }

    pub fn set_pool_assigned_count(&self, count: f64) {
        self.pool_assigned_count.set(count);
    }

    pub fn inc_remote_session_failure(&self) {
        self.remote_session_failure_total.inc();
    }

    pub fn render_metrics(&self) -> Result<String, String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| e.to_string())?;
        String::from_utf8(buffer).map_err(|e| e.to_string())
    }
}
