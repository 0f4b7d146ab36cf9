use crate::shared::error::{GatewayError, GatewayResult};
use matchday_core::Project;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Compute-control API settings.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    pub endpoint: String,
    /// Tag key identifying fleet instances; `tagFilter` arguments filter on
    /// this key's value.
    pub project_tag: String,
    pub region: String,
}

/// Remote-shell settings shared by every dispatched command.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub user: String,
    pub key_path: PathBuf,
    /// Symbolic target names resolved to fixed addresses.
    pub aliases: HashMap<String, String>,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StoreProjectConfig {
    pub endpoint: String,
    pub secret_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub dev: StoreProjectConfig,
    pub prod: StoreProjectConfig,
}

impl StoreConfig {
    pub fn project(&self, project: Project) -> &StoreProjectConfig {
        match project {
            Project::Dev => &self.dev,
            Project::Prod => &self.prod,
        }
    }
}

/// Pool/assignment registry settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Store project holding the assignment region.
    pub project: Project,
    /// Store path prefix for assignment records.
    pub assignment_root: String,
    /// Tag value identifying pool instances in the compute API.
    pub pool_tag: String,
}

/// Immutable process configuration, built once at startup and passed
/// explicitly into each component.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub compute: ComputeConfig,
    pub shell: ShellConfig,
    pub store: StoreConfig,
    pub registry: RegistryConfig,
}

impl GatewayConfig {
    pub fn from_env() -> GatewayResult<Self> {
        let registry_project = env_or("REGISTRY_PROJECT", "prod")
            .parse::<Project>()
            .map_err(GatewayError::from)?;

        Ok(Self {
            bind_addr: env_or("GATEWAY_ADDR", "127.0.0.1:8630"),
            compute: ComputeConfig {
                endpoint: env_or("COMPUTE_API_ENDPOINT", "http://127.0.0.1:8640"),
                project_tag: env_or("COMPUTE_PROJECT_TAG", "matchday:fleet"),
                region: env_or("COMPUTE_REGION", "eu-west-1"),
            },
            shell: ShellConfig {
                user: env_or("SSH_USER", "broadcast"),
                key_path: PathBuf::from(env_or(
                    "SSH_KEY_PATH",
                    "/etc/matchday/ssh/fleet_ed25519",
                )),
                aliases: parse_alias_table(&env_or("TARGET_ALIASES", "")),
                connect_timeout: parse_secs("SSH_CONNECT_TIMEOUT_SECS", 10)?,
                command_timeout: parse_secs("SSH_COMMAND_TIMEOUT_SECS", 120)?,
            },
            store: StoreConfig {
                dev: StoreProjectConfig {
                    endpoint: env_or("STORE_DEV_ENDPOINT", "http://127.0.0.1:8650/dev"),
                    secret_path: PathBuf::from(env_or(
                        "STORE_DEV_SECRET_PATH",
                        "/etc/matchday/secrets/store-dev.token",
                    )),
                },
                prod: StoreProjectConfig {
                    endpoint: env_or("STORE_PROD_ENDPOINT", "http://127.0.0.1:8650/prod"),
                    secret_path: PathBuf::from(env_or(
                        "STORE_PROD_SECRET_PATH",
                        "/etc/matchday/secrets/store-prod.token",
                    )),
                },
            },
            registry: RegistryConfig {
                project: registry_project,
                assignment_root: env_or("ASSIGNMENT_ROOT", "fleet/assignments"),
                pool_tag: env_or("POOL_TAG_VALUE", "pool"),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_secs(key: &str, default: u64) -> GatewayResult<Duration> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| {
                GatewayError::Configuration(format!("{key} must be an integer, got '{raw}'"))
            }),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

/// Parse an alias table of the form `name=host,name2=host2`. Entries without
/// an `=` are ignored.
pub fn parse_alias_table(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let (name, host) = entry.split_once('=')?;
            let name = name.trim();
            let host = host.trim();
            if name.is_empty() || host.is_empty() {
                return None;
            }
            Some((name.to_string(), host.to_string()))
        })
        .collect()
}
