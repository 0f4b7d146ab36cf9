use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("Invalid instance ID: {0}")]
    InvalidInstanceId(String),
    #[error("Invalid image ID: {0}")]
    InvalidImageId(String),
    #[error("Unknown instance state: {0}")]
    UnknownInstanceState(String),
    #[error("Unknown project '{0}': expected 'dev' or 'prod'")]
    UnknownProject(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Lifecycle state reported by the external compute system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
}

impl InstanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(InstanceState::Pending),
            "running" => Ok(InstanceState::Running),
            "stopping" => Ok(InstanceState::Stopping),
            "stopped" => Ok(InstanceState::Stopped),
            "shutting-down" => Ok(InstanceState::ShuttingDown),
            "terminated" => Ok(InstanceState::Terminated),
            other => Err(CoreError::UnknownInstanceState(other.to_string())),
        }
    }
}

/// A leased virtual machine tracked by the fleet.
///
/// Identity is `instance_id`, issued by the external compute system and
/// immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: String,
    pub name: String,
    pub state: InstanceState,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub instance_type: String,
    pub launch_time: DateTime<Utc>,
}

/// Validate an instance identifier against the `i-[hex]+` pattern.
///
/// A violation is a data-integrity error, not a business error: identifiers
/// are minted by the compute system and should never arrive malformed.
pub fn validate_instance_id(id: &str) -> Result<()> {
    match id.strip_prefix("i-") {
        Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_hexdigit()) => Ok(()),
        _ => Err(CoreError::InvalidInstanceId(id.to_string())),
    }
}

/// A bootable snapshot used to launch instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineImage {
    pub ami_id: String,
    pub name: String,
    pub state: String,
    pub creation_date: DateTime<Utc>,
    pub description: Option<String>,
}

/// Validate an image identifier against the `ami-[hex]+` pattern.
pub fn validate_image_id(id: &str) -> Result<()> {
    match id.strip_prefix("ami-") {
        Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_hexdigit()) => Ok(()),
        _ => Err(CoreError::InvalidImageId(id.to_string())),
    }
}

/// Sort images newest-first by creation date.
///
/// `sort_by` is stable, so images sharing a creation date keep their input
/// order.
pub fn sort_images_newest_first(images: &mut [MachineImage]) {
    images.sort_by(|a, b| b.creation_date.cmp(&a.creation_date));
}

/// Result of a state-change request against the compute system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStateChange {
    pub instance_id: String,
    pub previous_state: InstanceState,
    pub current_state: InstanceState,
    pub message: String,
}

/// A binding of one instance to one competition for some time interval.
///
/// Records are closed, never deleted: the full list per instance is the
/// audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub competition_id: String,
    pub instance_id: String,
    pub assigned_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn new(competition_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            competition_id: competition_id.into(),
            instance_id: instance_id.into(),
            assigned_at: Utc::now(),
            released_at: None,
        }
    }

    /// An assignment is active until it has been released.
    pub fn is_active(&self) -> bool {
        self.released_at.is_none()
    }

    pub fn close(&mut self) {
        self.released_at = Some(Utc::now());
    }
}

/// Exit code reported when a remote session could not be established.
pub const SESSION_FAILURE_EXIT_CODE: i32 = -1;

/// Outcome of one remote command against one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub target: String,
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub error: Option<String>,
}

impl CommandResult {
    /// The command actually ran; success is derived from the exit code.
    pub fn completed(
        target: impl Into<String>,
        command: impl Into<String>,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            command: command.into(),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            success: exit_code == 0,
            error: None,
        }
    }

    /// The remote session could not be established or was cut short.
    pub fn session_failure(
        target: impl Into<String>,
        command: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            command: command.into(),
            exit_code: SESSION_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of one command fanned out to many targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiCommandResult {
    pub command: String,
    pub results: Vec<CommandResult>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl MultiCommandResult {
    /// Counts are derived purely from each result's `success` field.
    pub fn from_results(command: impl Into<String>, results: Vec<CommandResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        let failure_count = results.len() - success_count;
        Self {
            command: command.into(),
            results,
            success_count,
            failure_count,
        }
    }
}

/// Deployment project scoping the state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Project {
    Dev,
    Prod,
}

impl Project {
    pub fn as_str(&self) -> &'static str {
        match self {
            Project::Dev => "dev",
            Project::Prod => "prod",
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Project {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dev" => Ok(Project::Dev),
            "prod" => Ok(Project::Prod),
            other => Err(CoreError::UnknownProject(other.to_string())),
        }
    }
}

/// Result of reading a path from the state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReadResult {
    pub project: Project,
    pub path: String,
    pub exists: bool,
    pub data: serde_json::Value,
}

impl StoreReadResult {
    pub fn found(project: Project, path: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            project,
            path: path.into(),
            exists: true,
            data,
        }
    }

    /// A path never written: `exists = false` and `data = null`.
    pub fn missing(project: Project, path: impl Into<String>) -> Self {
        Self {
            project,
            path: path.into(),
            exists: false,
            data: serde_json::Value::Null,
        }
    }
}
