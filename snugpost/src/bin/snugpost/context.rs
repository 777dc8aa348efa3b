use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snugpost::EngineConfig;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "snugpost.toml";

/// Configuration stored in snugpost.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub redis: RedisSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

impl CliConfig {
    /// Loads `path`, or `snugpost.toml` in the current directory when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the Redis URL, expanding environment variables
    pub fn redis_url(&self, override_url: Option<&str>) -> Result<String> {
        let url = override_url.unwrap_or(self.redis.url.as_str());

        if url.starts_with("${") && url.ends_with('}') {
            let var_name = &url[2..url.len() - 1];
            std::env::var(var_name).with_context(|| format!("Environment variable {var_name} not set"))
        } else {
            Ok(url.to_string())
        }
    }
}
