use crate::config::ShellConfig;
use crate::features::remote_exec::repo::{ShellRequest, ShellTransport};
use crate::shared::error::{GatewayError, GatewayResult};
use matchday_core::{CommandResult, MultiCommandResult};
use std::sync::Arc;
use tracing::{info, warn};

const SUDO_PREFIX: &str = "sudo ";

/// Remote Command Dispatcher. Transport failures never propagate past this
/// service; they become `CommandResult`s with `success = false`.
#[derive(Clone)]
pub struct ExecService {
    transport: Arc<dyn ShellTransport>,
    config: Arc<ShellConfig>,
}

impl ExecService {
    pub fn new(transport: Arc<dyn ShellTransport>, config: ShellConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    /// Symbolic aliases resolve through the static table; anything else is
    /// treated as a literal address. Both behave identically downstream.
    fn resolve_target(&self, target: &str) -> String {
        self.config
            .aliases
            .get(target)
            .cloned()
            .unwrap_or_else(|| target.to_string())
    }

    fn effective_command(command: &str, sudo: bool) -> String {
        if sudo {
            format!("{SUDO_PREFIX}{command}")
        } else {
            command.to_string()
        }
    }

    /// Run one command against one target.
    pub async fn exec(
        &self,
        target: &str,
        command: &str,
        sudo: bool,
    ) -> GatewayResult<CommandResult> {
        if target.trim().is_empty() {
            return Err(GatewayError::Validation(
                "Target cannot be empty".to_string(),
            ));
        }
        if command.trim().is_empty() {
            return Err(GatewayError::Validation(
                "Command cannot be empty".to_string(),
            ));
        }

        let transmitted = Self::effective_command(command, sudo);
        let request = ShellRequest {
            host: self.resolve_target(target),
            user: self.config.user.clone(),
            key_path: self.config.key_path.clone(),
            command: transmitted.clone(),
            connect_timeout: self.config.connect_timeout,
            command_timeout: self.config.command_timeout,
        };

        let result = match self.transport.run(&request).await {
            Ok(output) => {
                info!(target, exit_code = output.exit_code, "Remote command finished");
                CommandResult::completed(
                    target,
                    transmitted,
                    output.exit_code,
                    output.stdout,
                    output.stderr,
                )
            }
            Err(err) => {
                warn!(target, error = %err, "Remote session failed");
                CommandResult::session_failure(target, transmitted, err.to_string())
            }
        };
        Ok(result)
    }

    /// Fan one command out to every target concurrently. One target's
    /// failure never aborts or affects any sibling.
    pub async fn multi_exec(
        &self,
        targets: &[String],
        command: &str,
        sudo: bool,
    ) -> GatewayResult<MultiCommandResult> {
        if targets.is_empty() {
            return Err(GatewayError::Validation(
                "Targets cannot be empty".to_string(),
            ));
        }
        if command.trim().is_empty() {
            return Err(GatewayError::Validation(
                "Command cannot be empty".to_string(),
            ));
        }

        let mut handles = Vec::with_capacity(targets.len());
        for target in targets {
            let service = self.clone();
            let task_target = target.clone();
            let task_command = command.to_string();
            let handle = tokio::spawn(async move {
                service.exec(&task_target, &task_command, sudo).await
            });
            handles.push((target.clone(), handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (target, handle) in handles {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => CommandResult::session_failure(&target, command, err.to_string()),
                Err(join_err) => CommandResult::session_failure(
                    &target,
                    command,
                    format!("dispatch task failed: {join_err}"),
                ),
            };
            results.push(result);
        }

        Ok(MultiCommandResult::from_results(command, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::remote_exec::repo::{ShellOutput, TransportError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    enum Scripted {
        Output(i32, &'static str, &'static str),
        Connection(&'static str),
        Timeout(u64),
    }

    /// Stub transport scripted per host; records every request it sees.
    struct ScriptedTransport {
        outcomes: HashMap<String, Scripted>,
        requests: Mutex<Vec<ShellRequest>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: HashMap<String, Scripted>) -> Self {
            Self {
                outcomes,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> ShellRequest {
            self.requests.lock().unwrap().last().unwrap().clone()
        }
    }

    #[async_trait]
    impl ShellTransport for ScriptedTransport {
        async fn run(&self, request: &ShellRequest) -> Result<ShellOutput, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            match self.outcomes.get(&request.host) {
                Some(Scripted::Output(code, stdout, stderr)) => Ok(ShellOutput {
                    exit_code: *code,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                }),
                Some(Scripted::Connection(cause)) => Err(TransportError::Connection {
                    host: request.host.clone(),
                    cause: cause.to_string(),
                }),
                Some(Scripted::Timeout(seconds)) => Err(TransportError::Timeout {
                    host: request.host.clone(),
                    seconds: *seconds,
                }),
                None => Err(TransportError::Connection {
                    host: request.host.clone(),
                    cause: "unknown host".to_string(),
                }),
            }
        }
    }

    fn config() -> ShellConfig {
        let mut aliases = HashMap::new();
        aliases.insert("render-1".to_string(), "10.1.0.5".to_string());
        ShellConfig {
            user: "broadcast".to_string(),
            key_path: PathBuf::from("/keys/fleet_ed25519"),
            aliases,
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(30),
        }
    }

    fn service_with(outcomes: HashMap<String, Scripted>) -> (ExecService, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(outcomes));
        (ExecService::new(transport.clone(), config()), transport)
    }

    #[tokio::test]
    async fn test_exec_success() {
        let (service, _) = service_with(HashMap::from([(
            "10.1.0.5".to_string(),
            Scripted::Output(0, "up 3 days\n", ""),
        )]));

        let result = service.exec("render-1", "uptime", false).await.unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "up 3 days\n");
        assert_eq!(result.target, "render-1");
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_exec_nonzero_exit_is_failure_not_error() {
        let (service, _) = service_with(HashMap::from([(
            "10.1.0.5".to_string(),
            Scripted::Output(2, "", "no such unit\n"),
        )]));

        let result = service
            .exec("render-1", "systemctl status gfx", false)
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 2);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_exec_resolves_alias_but_reports_requested_target() {
        let (service, transport) = service_with(HashMap::from([(
            "10.1.0.5".to_string(),
            Scripted::Output(0, "", ""),
        )]));

        let result = service.exec("render-1", "uptime", false).await.unwrap();
        assert_eq!(result.target, "render-1");
        assert_eq!(transport.last_request().host, "10.1.0.5");
    }

    #[tokio::test]
    async fn test_exec_literal_address_passes_through() {
        let (service, transport) = service_with(HashMap::from([(
            "192.0.2.9".to_string(),
            Scripted::Output(0, "", ""),
        )]));

        let result = service.exec("192.0.2.9", "uptime", false).await.unwrap();
        assert!(result.success);
        assert_eq!(transport.last_request().host, "192.0.2.9");
    }

    #[tokio::test]
    async fn test_exec_sudo_prefix_applied_exactly_once() {
        let (service, transport) = service_with(HashMap::from([(
            "10.1.0.5".to_string(),
            Scripted::Output(0, "", ""),
        )]));

        service
            .exec("render-1", "systemctl restart gfx-overlay", true)
            .await
            .unwrap();
        assert_eq!(
            transport.last_request().command,
            "sudo systemctl restart gfx-overlay"
        );
    }

    #[tokio::test]
    async fn test_exec_sudo_ignores_elevation_looking_substrings() {
        let (service, transport) = service_with(HashMap::from([(
            "10.1.0.5".to_string(),
            Scripted::Output(0, "", ""),
        )]));

        service
            .exec("render-1", "echo sudo-check && ls /var/log/sudo.log", true)
            .await
            .unwrap();
        let command = transport.last_request().command;
        assert_eq!(command, "sudo echo sudo-check && ls /var/log/sudo.log");
        assert_eq!(command.matches("sudo ").count(), 1);
    }

    #[tokio::test]
    async fn test_exec_without_sudo_leaves_command_untouched() {
        let (service, transport) = service_with(HashMap::from([(
            "10.1.0.5".to_string(),
            Scripted::Output(0, "", ""),
        )]));

        service.exec("render-1", "uptime", false).await.unwrap();
        assert_eq!(transport.last_request().command, "uptime");
    }

    #[tokio::test]
    async fn test_exec_connection_failure_becomes_result() {
        let (service, _) = service_with(HashMap::from([(
            "10.1.0.5".to_string(),
            Scripted::Connection("Connection refused"),
        )]));

        let result = service.exec("render-1", "uptime", false).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, matchday_core::SESSION_FAILURE_EXIT_CODE);
        let error = result.error.unwrap();
        assert!(error.contains("connection"));
        assert!(error.contains("refused"));
    }

    #[tokio::test]
    async fn test_exec_timeout_becomes_result() {
        let (service, _) = service_with(HashMap::from([(
            "10.1.0.5".to_string(),
            Scripted::Timeout(35),
        )]));

        let result = service.exec("render-1", "sleep 999", false).await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn test_exec_empty_target_rejected() {
        let (service, _) = service_with(HashMap::new());
        let err = service.exec("", "uptime", false).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_exec_empty_command_rejected() {
        let (service, _) = service_with(HashMap::new());
        let err = service.exec("render-1", "  ", false).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_multi_exec_isolates_failures() {
        let (service, _) = service_with(HashMap::from([
            ("10.1.0.5".to_string(), Scripted::Output(0, "ok\n", "")),
            ("10.1.0.6".to_string(), Scripted::Output(1, "", "bad\n")),
            ("10.1.0.7".to_string(), Scripted::Connection("No route to host")),
        ]));

        let targets = vec![
            "render-1".to_string(),
            "10.1.0.6".to_string(),
            "10.1.0.7".to_string(),
        ];
        let multi = service.multi_exec(&targets, "uptime", false).await.unwrap();

        assert_eq!(multi.results.len(), 3);
        assert_eq!(multi.success_count, 1);
        assert_eq!(multi.failure_count, 2);
        assert_eq!(multi.success_count + multi.failure_count, targets.len());

        for target in &targets {
            assert!(multi.results.iter().any(|r| &r.target == target));
        }

        let unreachable = multi
            .results
            .iter()
            .find(|r| r.target == "10.1.0.7")
            .unwrap();
        assert!(unreachable.error.as_ref().unwrap().contains("connection"));
    }

    #[tokio::test]
    async fn test_multi_exec_all_failures_still_reports_every_target() {
        let (service, _) = service_with(HashMap::new());
        let targets = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];

        let multi = service.multi_exec(&targets, "uptime", false).await.unwrap();
        assert_eq!(multi.success_count, 0);
        assert_eq!(multi.failure_count, 2);
    }

    #[tokio::test]
    async fn test_multi_exec_empty_targets_rejected() {
        let (service, _) = service_with(HashMap::new());
        let err = service.multi_exec(&[], "uptime", false).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_multi_exec_empty_target_entry_fails_only_that_entry() {
        let (service, _) = service_with(HashMap::from([(
            "10.1.0.5".to_string(),
            Scripted::Output(0, "", ""),
        )]));

        let targets = vec!["render-1".to_string(), "".to_string()];
        let multi = service.multi_exec(&targets, "uptime", false).await.unwrap();
        assert_eq!(multi.success_count, 1);
        assert_eq!(multi.failure_count, 1);
    }
}
