use crate::features::assignment::controller::RegistryController;
use crate::features::compute_control::controller::ComputeController;
use crate::features::observability::controller::ObservabilityController;
use crate::features::remote_exec::controller::ExecController;
use crate::features::state_store::controller::StoreController;
use crate::shared::error::{GatewayError, GatewayResult};
use crate::shared::types::{
    AssignArgs, ExecArgs, InstanceIdArgs, ListImagesArgs, ListInstancesArgs, MultiExecArgs,
    StoreDeleteArgs, StoreGetArgs, StoreSetArgs,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Tool catalog exposed to callers.
pub const TOOLS: &[&str] = &[
    "list_instances",
    "list_images",
    "start_instance",
    "stop_instance",
    "exec",
    "multi_exec",
    "store_get",
    "store_set",
    "store_delete",
    "pool_status",
    "pool_assign",
    "pool_release",
    "pool_reassign",
];

/// Stateless router mapping a tool name plus argument record onto exactly
/// one component operation. Every call returns either a success payload or
/// a structured `{error, tool, args}` object, never an unhandled fault.
pub struct ToolGateway {
    compute: Arc<ComputeController>,
    exec: Arc<ExecController>,
    store: Arc<StoreController>,
    registry: Arc<RegistryController>,
    observability: Arc<ObservabilityController>,
}

impl ToolGateway {
    pub fn new(
        compute: Arc<ComputeController>,
        exec: Arc<ExecController>,
        store: Arc<StoreController>,
        registry: Arc<RegistryController>,
        observability: Arc<ObservabilityController>,
    ) -> Self {
        Self {
            compute,
            exec,
            store,
            registry,
            observability,
        }
    }

    pub async fn dispatch(&self, tool: &str, args: Value) -> Value {
        let started = Instant::now();
        let result = self.route(tool, &args).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        self.observability
            .record_tool_request(tool, status, started.elapsed().as_secs_f64());

        match result {
            Ok(payload) => payload,
            Err(err) => {
                warn!(tool, error = %err, "Tool call failed");
                json!({
                    "error": err.to_string(),
                    "tool": tool,
                    "args": args,
                })
            }
        }
    }

    async fn route(&self, tool: &str, args: &Value) -> GatewayResult<Value> {
        match tool {
            "list_instances" => {
                let args: ListInstancesArgs = decode(tool, args)?;
                self.compute
                    .list_instances(&args.tag_filter, args.state_filter.as_deref())
                    .await
            }
            "list_images" => {
                let args: ListImagesArgs = decode(tool, args)?;
                self.compute.list_images(&args.name_pattern).await
            }
            "start_instance" => {
                let args: InstanceIdArgs = decode(tool, args)?;
                self.compute.start_instance(&args.instance_id).await
            }
            "stop_instance" => {
                let args: InstanceIdArgs = decode(tool, args)?;
                self.compute.stop_instance(&args.instance_id).await
            }
            "exec" => {
                let args: ExecArgs = decode(tool, args)?;
                let result = self.exec.exec(&args.target, &args.command, args.sudo).await?;
                if !result["error"].is_null() {
                    self.observability.record_session_failure();
                }
                Ok(result)
            }
            "multi_exec" => {
                let args: MultiExecArgs = decode(tool, args)?;
                let result = self
                    .exec
                    .multi_exec(&args.targets, &args.command, args.sudo)
                    .await?;
                if let Some(results) = result["results"].as_array() {
                    for _ in results.iter().filter(|r| !r["error"].is_null()) {
                        self.observability.record_session_failure();
                    }
                }
                Ok(result)
            }
            "store_get" => {
                let args: StoreGetArgs = decode(tool, args)?;
                self.store.get(&args.project, &args.path).await
            }
            "store_set" => {
                let args: StoreSetArgs = decode(tool, args)?;
                self.store.set(&args.project, &args.path, &args.data).await
            }
            "store_delete" => {
                let args: StoreDeleteArgs = decode(tool, args)?;
                self.store.delete(&args.project, &args.path).await
            }
            "pool_status" => {
                let status = self.registry.status().await?;
                if let Some(entries) = status.as_array() {
                    let assigned = entries.iter().filter(|e| e["available"] == false).count();
                    self.observability.set_pool_assigned(assigned);
                }
                Ok(status)
            }
            "pool_assign" => {
                let args: AssignArgs = decode(tool, args)?;
                self.registry
                    .assign(&args.competition_id, &args.instance_id)
                    .await
            }
            "pool_release" => {
                let args: InstanceIdArgs = decode(tool, args)?;
                self.registry.release(&args.instance_id).await
            }
            "pool_reassign" => {
                let args: AssignArgs = decode(tool, args)?;
                self.registry
                    .reassign(&args.competition_id, &args.instance_id)
                    .await
            }
            other => Err(GatewayError::Validation(format!("unknown tool '{other}'"))),
        }
    }
}

/// Argument shape validation: missing required fields and wrong primitive
/// types are rejected here, before dispatch.
fn decode<T: DeserializeOwned>(tool: &str, args: &Value) -> GatewayResult<T> {
    serde_json::from_value(args.clone())
        .map_err(|e| GatewayError::Validation(format!("invalid arguments for {tool}: {e}")))
}
