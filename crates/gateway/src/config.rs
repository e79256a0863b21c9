//! Ambient startup configuration: where the gateway binds, where its
//! persisted files live, and CORS policy. Distinct from the rule-engine
//! [`scenariod_domain::Config`], which is mutable at runtime through the
//! control-plane API and persisted separately.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:*".to_string()]
}

impl Default for CorsConfig {
    fn default() -> Self {
        CorsConfig {
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8321
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("data/rules.json")
}

fn default_config_path() -> PathBuf {
    PathBuf::from("data/config.json")
}

fn default_max_concurrent() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            rules_path: default_rules_path(),
            config_path: default_config_path(),
            max_concurrent_requests: default_max_concurrent(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `path` if it exists (TOML), falling back to defaults, then
    /// apply environment variable overrides. Mirrors the layering the
    /// dashboard gateway uses for its own startup config.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
            toml::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))?
        } else {
            ServerConfig::default()
        };

        if let Ok(host) = std::env::var("SCENARIOD_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("SCENARIOD_PORT") {
            config.port = port
                .parse()
                .map_err(|_| anyhow::anyhow!("SCENARIOD_PORT must be a u16"))?;
        }
        if let Ok(rules_path) = std::env::var("SCENARIOD_RULES_PATH") {
            config.rules_path = PathBuf::from(rules_path);
        }
        if let Ok(config_path) = std::env::var("SCENARIOD_CONFIG_PATH") {
            config.config_path = PathBuf::from(config_path);
        }
        if let Ok(max_concurrent) = std::env::var("SCENARIOD_MAX_CONCURRENT_REQUESTS") {
            config.max_concurrent_requests = max_concurrent
                .parse()
                .map_err(|_| anyhow::anyhow!("SCENARIOD_MAX_CONCURRENT_REQUESTS must be a usize"))?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
