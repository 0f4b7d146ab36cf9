use matchday_core::{Assignment, Instance, Project};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Tool argument records. Decoding one of these from the raw argument object
// is the Tool Gateway's shape validation: missing required fields and wrong
// primitive types are rejected before dispatch.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInstancesArgs {
    pub tag_filter: String,
    pub state_filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListImagesArgs {
    pub name_pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceIdArgs {
    pub instance_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecArgs {
    pub target: String,
    pub command: String,
    #[serde(default)]
    pub sudo: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiExecArgs {
    pub targets: Vec<String>,
    pub command: String,
    #[serde(default)]
    pub sudo: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreGetArgs {
    pub project: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSetArgs {
    pub project: String,
    pub path: String,
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDeleteArgs {
    pub project: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignArgs {
    pub competition_id: String,
    pub instance_id: String,
}

// Gateway-level response records.

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreWriteAck {
    pub success: bool,
    pub project: Project,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDeleteAck {
    pub success: bool,
    pub project: Project,
    pub path: String,
    pub message: String,
}

/// Outcome of an assign/reassign call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub assignment: Assignment,
    /// The instance was already assigned to this competition; nothing changed.
    pub already_assigned: bool,
    pub message: String,
}

/// One pool entry in a `pool_status` view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInstanceStatus {
    pub instance: Instance,
    pub assignment: Option<Assignment>,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exec_args_sudo_defaults_to_false() {
        let args: ExecArgs =
            serde_json::from_value(json!({"target": "render-1", "command": "uptime"})).unwrap();
        assert!(!args.sudo);
    }

    #[test]
    fn test_exec_args_missing_command_rejected() {
        let result = serde_json::from_value::<ExecArgs>(json!({"target": "render-1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_multi_exec_args_targets_must_be_array_of_strings() {
        let result =
            serde_json::from_value::<MultiExecArgs>(json!({"targets": "render-1", "command": "ls"}));
        assert!(result.is_err());

        let args: MultiExecArgs = serde_json::from_value(
            json!({"targets": ["render-1", "10.1.0.9"], "command": "ls", "sudo": true}),
        )
        .unwrap();
        assert_eq!(args.targets.len(), 2);
        assert!(args.sudo);
    }

    #[test]
    fn test_store_set_args_accept_nested_data() {
        let args: StoreSetArgs = serde_json::from_value(json!({
            "project": "dev",
            "path": "competitions/42/config",
            "data": {"overlay": {"theme": "dark"}, "fps": 50}
        }))
        .unwrap();
        assert_eq!(args.data["overlay"]["theme"], "dark");
    }

    #[test]
    fn test_assign_args_use_camel_case_keys() {
        let args: AssignArgs = serde_json::from_value(
            json!({"competitionId": "comp-1", "instanceId": "i-0001"}),
        )
        .unwrap();
        assert_eq!(args.competition_id, "comp-1");
        assert_eq!(args.instance_id, "i-0001");
    }
}
