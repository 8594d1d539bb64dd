//! # Server Configuration
//!
//! Settings are layered, lowest priority first:
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config <path>`)
//! 3. Environment variables
//! 4. CLI flags (`--host`, `--port`), applied by the caller
//!
//! ## Environment Variables
//!
//! - `SKILLGRAPH_RATE_LIMIT`: Requests per client per window (default: 100)
//! - `SKILLGRAPH_RATE_WINDOW_SECS`: Window length in seconds (default: 60)
//! - `SKILLGRAPH_GLOBAL_RPS`: Global requests per second (default: 100, 0 to disable)
//! - `SKILLGRAPH_MAX_NODES`: Node ceiling for `POST /validate` (default: 5000)
//! - `SKILLGRAPH_CORS_ORIGINS`: Comma-separated origins, or "*" for all

use serde::{Deserialize, Serialize};
use skillgraph_core::SkillGraphError;
use skillgraph_core::primitives::MAX_VALIDATION_NODES;
use std::path::Path;
use std::time::Duration;

pub const ENV_RATE_LIMIT: &str = "SKILLGRAPH_RATE_LIMIT";
pub const ENV_RATE_WINDOW_SECS: &str = "SKILLGRAPH_RATE_WINDOW_SECS";
pub const ENV_GLOBAL_RPS: &str = "SKILLGRAPH_GLOBAL_RPS";
pub const ENV_MAX_NODES: &str = "SKILLGRAPH_MAX_NODES";
pub const ENV_CORS_ORIGINS: &str = "SKILLGRAPH_CORS_ORIGINS";

/// Default request body ceiling (8 MiB): a 5 MiB corpus plus JSON overhead.
pub const DEFAULT_BODY_LIMIT: usize = 8 * 1024 * 1024;

// =============================================================================
// SERVER CONFIG
// =============================================================================

/// HTTP service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests allowed per client identity per window.
    pub rate_limit: u32,
    pub rate_window_secs: u64,
    /// Process-wide requests per second; 0 disables the global limiter.
    pub global_rps: u32,
    pub max_nodes: usize,
    pub body_limit_bytes: usize,
    /// Comma-separated allowed origins, `*` for any; localhost when unset.
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: 100,
            rate_window_secs: 60,
            global_rps: 100,
            max_nodes: MAX_VALIDATION_NODES,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// Load defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SkillGraphError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, SkillGraphError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SkillGraphError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SkillGraphError> {
        toml::from_str(content).map_err(|e| SkillGraphError::ConfigError(e.to_string()))
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(n) = parsed(&lookup, ENV_RATE_LIMIT) {
            self.rate_limit = n;
        }
        if let Some(n) = parsed(&lookup, ENV_RATE_WINDOW_SECS) {
            self.rate_window_secs = n;
        }
        if let Some(n) = parsed(&lookup, ENV_GLOBAL_RPS) {
            self.global_rps = n;
        }
        if let Some(n) = parsed(&lookup, ENV_MAX_NODES) {
            self.max_nodes = n;
        }
        if let Some(origins) = lookup(ENV_CORS_ORIGINS) {
            self.cors_origins = Some(origins);
        }
    }

    /// `host:port` for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: '{}'", key, raw);
            None
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
