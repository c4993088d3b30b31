#![forbid(unsafe_code)]
// Workspace clippy config forbids float types, but `serde` derive macros
// generate visitors that reference `f32`/`f64` even for integer structs.
#![allow(clippy::disallowed_types)]

use serde::Deserialize;
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed reading config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed parsing config: {0}")]
    Parse(String),
    #[error("invalid env: reference: {0}")]
    EnvRef(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeSection {
    #[serde(default = "default_node_label")]
    pub label: String,
}

fn default_node_label() -> String {
    "score-node".to_string()
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            label: default_node_label(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub chain_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default = "default_owner")]
    pub authorized_submitter: String,
}

fn default_owner() -> String {
    "acc-operator".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            authorized_submitter: default_owner(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Resolve `env:VAR` string values against the process environment.
fn resolve_env_refs(mut v: toml::Value) -> Result<toml::Value, ConfigError> {
    fn walk(v: &mut toml::Value) -> Result<(), ConfigError> {
        match v {
            toml::Value::String(s) => {
                if let Some(var) = s.strip_prefix("env:") {
                    let var = var.trim();
                    if var.is_empty() {
                        return Err(ConfigError::EnvRef("empty var name".to_string()));
                    }
                    let val = std::env::var(var).map_err(|_| {
                        ConfigError::EnvRef(format!("missing required environment variable: {var}"))
                    })?;
                    *s = val;
                }
            }
            toml::Value::Array(arr) => {
                for x in arr {
                    walk(x)?;
                }
            }
            toml::Value::Table(map) => {
                for (_, x) in map.iter_mut() {
                    walk(x)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    walk(&mut v)?;
    Ok(v)
}

pub fn load_config(path: &str) -> Result<NodeConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_string(),
        source: e,
    })?;
    let value: toml::Value = raw.parse().map_err(|e| ConfigError::Parse(format!("{e}")))?;
    let value = resolve_env_refs(value)?;
    value
        .try_into::<NodeConfig>()
        .map_err(|e| ConfigError::Parse(format!("{e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg: NodeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.node.label, "score-node");
        assert_eq!(cfg.server.bind_address, "0.0.0.0:3000");
        assert!(cfg.server.metrics_enabled);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn load_config_resolves_env_refs() {
        std::env::set_var("SCORE_NODE_TEST_OWNER", "acc-from-env");
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
[chain]
chain_id = 10

[ledger]
owner = "env:SCORE_NODE_TEST_OWNER"
"#
        )
        .unwrap();
        let cfg = load_config(f.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.chain.chain_id, 10);
        assert_eq!(cfg.ledger.owner, "acc-from-env");
    }

    #[test]
    fn load_config_reports_missing_env_var() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[ledger]\nowner = \"env:SCORE_NODE_TEST_MISSING\"").unwrap();
        let err = load_config(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::EnvRef(_)), "{err}");
    }
}
