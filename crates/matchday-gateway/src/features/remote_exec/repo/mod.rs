use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// One remote-shell invocation: resolved host, credentials, command, and the
/// two phase timeouts.
#[derive(Debug, Clone)]
pub struct ShellRequest {
    pub host: String,
    pub user: String,
    pub key_path: PathBuf,
    pub command: String,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ShellOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Transport-level failures. Display strings are a contract: callers match
/// on connection/timeout wording.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {host} failed: {cause}")]
    Connection { host: String, cause: String },
    #[error("timeout after {seconds}s waiting on {host}")]
    Timeout { host: String, seconds: u64 },
}

/// Boundary to the remote-shell transport.
#[async_trait]
pub trait ShellTransport: Send + Sync {
    async fn run(&self, request: &ShellRequest) -> Result<ShellOutput, TransportError>;
}

/// ssh reserves exit status 255 for transport failures; remote commands
/// cannot produce it.
const SSH_TRANSPORT_FAILURE: i32 = 255;

/// Drives the system `ssh` client as a child process.
pub struct SshTransport;

impl SshTransport {
    pub fn new() -> Self {
        Self
    }

    fn build_args(request: &ShellRequest) -> Vec<String> {
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", request.connect_timeout.as_secs()),
            "-i".to_string(),
            request.key_path.display().to_string(),
            format!("{}@{}", request.user, request.host),
            // One argv element: the remote shell handles pipes and redirects.
            request.command.clone(),
        ]
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShellTransport for SshTransport {
    async fn run(&self, request: &ShellRequest) -> Result<ShellOutput, TransportError> {
        let child = Command::new("ssh")
            .args(Self::build_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::Connection {
                host: request.host.clone(),
                cause: format!("failed to spawn ssh: {e}"),
            })?;

        // ConnectTimeout bounds the handshake inside ssh itself; the deadline
        // here additionally bounds the command phase. Dropping the child on
        // expiry kills the session, so no exit path leaks it.
        let deadline = request.connect_timeout + request.command_timeout;
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| TransportError::Connection {
                host: request.host.clone(),
                cause: format!("failed to collect ssh output: {e}"),
            })?,
            Err(_) => {
                return Err(TransportError::Timeout {
                    host: request.host.clone(),
                    seconds: deadline.as_secs(),
                })
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if exit_code == SSH_TRANSPORT_FAILURE {
            let cause = stderr
                .lines()
                .last()
                .unwrap_or("ssh transport failure")
                .trim()
                .to_string();
            return Err(TransportError::Connection {
                host: request.host.clone(),
                cause,
            });
        }

        Ok(ShellOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}
