// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Moderation Engine Configuration
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) covering:
// - Storage backend selection (in-memory or PostgreSQL)
// - Store and cache operation timeouts
// - Authorization cache TTLs
// - Report re-processing policy
// - Moderator tombstone retention

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::report::ReprocessPolicy;
use crate::domain::repository::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "warden/v1";
pub const KIND: &str = "ModerationConfig";

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// API version (must be "warden/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ModerationConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: ModerationConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Deployment name, defaults to the host name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationConfigSpec {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub reports: ReportsConfig,

    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageKind {
    #[default]
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageKind,

    /// PostgreSQL connection string (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Upper bound on any single repository call
    #[serde(with = "humantime_serde", default = "default_store_timeout")]
    pub operation_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// TTL for moderator, permission and admin answers
    #[serde(with = "humantime_serde", default = "default_authorization_ttl")]
    pub authorization_ttl: Duration,

    /// TTL for ban answers
    #[serde(with = "humantime_serde", default = "default_ban_ttl")]
    pub ban_ttl: Duration,

    /// Upper bound on any single cache call; slower calls count as a miss
    #[serde(with = "humantime_serde", default = "default_cache_timeout")]
    pub operation_timeout: Duration,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default)]
    pub reprocess_policy: ReprocessPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// How long removed moderators are kept before being reaped
    #[serde(with = "humantime_serde", default = "default_tombstone_retention")]
    pub moderator_tombstones: Duration,
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

fn default_store_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_authorization_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_ban_ttl() -> Duration {
    Duration::from_secs(60)
}

fn default_cache_timeout() -> Duration {
    Duration::from_millis(250)
}

fn default_max_entries() -> usize {
    100_000
}

fn default_tombstone_retention() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::InMemory,
            connection_string: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            operation_timeout: default_store_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            authorization_ttl: default_authorization_ttl(),
            ban_ttl: default_ban_ttl(),
            operation_timeout: default_cache_timeout(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            moderator_tombstones: default_tombstone_retention(),
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "warden".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                labels: None,
            },
            spec: ModerationConfigSpec::default(),
        }
    }
}

/// Resolve "env:VAR_NAME" indirection.
fn resolve_env_reference(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix("env:") {
        Some(var) => std::env::var(var)
            .map_err(|_| anyhow::anyhow!("Environment variable '{}' referenced by config is not set", var)),
        None => Ok(value.to_string()),
    }
}

impl StorageConfig {
    /// Translate into the repository factory's backend selector.
    pub fn backend(&self) -> anyhow::Result<StorageBackend> {
        match self.backend {
            StorageKind::InMemory => Ok(StorageBackend::InMemory),
            StorageKind::Postgres => {
                let raw = self
                    .connection_string
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("spec.storage.connection_string is required for the postgres backend"))?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string: resolve_env_reference(raw)?,
                    max_connections: self.max_connections,
                }))
            }
        }
    }
}

impl ModerationConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. WARDEN_CONFIG_PATH environment variable
    /// 2. ./warden-config.yaml (working directory)
    /// 3. ~/.warden/config.yaml (user home)
    /// 4. /etc/warden/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("WARDEN_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./warden-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".warden").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/warden/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("WARDEN_DATABASE_URL") {
            tracing::info!("Environment override: WARDEN_DATABASE_URL (postgres backend)");
            self.spec.storage.backend = StorageKind::Postgres;
            self.spec.storage.connection_string = Some(url);
        }

        if let Ok(val) = std::env::var("WARDEN_REPORT_REPROCESS_POLICY") {
            match val.parse::<ReprocessPolicy>() {
                Ok(policy) => {
                    tracing::info!("Environment override: WARDEN_REPORT_REPROCESS_POLICY={}", val);
                    self.spec.reports.reprocess_policy = policy;
                }
                Err(e) => tracing::warn!("Ignoring WARDEN_REPORT_REPROCESS_POLICY: {}", e),
            }
        }

        if let Ok(val) = std::env::var("WARDEN_CACHE_ENABLED") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => self.spec.cache.enabled = true,
                "false" | "0" | "no" | "off" => self.spec.cache.enabled = false,
                _ => tracing::warn!(
                    "Invalid value for WARDEN_CACHE_ENABLED: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!("Invalid apiVersion: '{}'. Must be '{}'", self.api_version, API_VERSION);
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let spec = &self.spec;

        if spec.storage.backend == StorageKind::Postgres {
            match spec.storage.connection_string.as_deref() {
                None | Some("") => anyhow::bail!("spec.storage.connection_string is required for the postgres backend"),
                _ => {}
            }
            if spec.storage.max_connections == 0 {
                anyhow::bail!("spec.storage.max_connections must be at least 1");
            }
        }

        if spec.store.operation_timeout.is_zero() {
            anyhow::bail!("spec.store.operation_timeout must be greater than zero");
        }

        if spec.cache.enabled {
            if spec.cache.authorization_ttl.is_zero() || spec.cache.ban_ttl.is_zero() {
                anyhow::bail!("spec.cache TTLs must be greater than zero when the cache is enabled");
            }
            if spec.cache.operation_timeout.is_zero() {
                anyhow::bail!("spec.cache.operation_timeout must be greater than zero");
            }
            if spec.cache.max_entries == 0 {
                anyhow::bail!("spec.cache.max_entries must be at least 1");
            }
        }

        Ok(())
    }
}
