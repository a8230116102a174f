use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::schema::WardenConfig;

/// Loads the Warden configuration and hands out shared snapshots.
pub struct ConfigLoader {
    config: Arc<RwLock<WardenConfig>>,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > WARDEN_CONFIG env > ~/.warden/warden.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("WARDEN_CONFIG") {
            return PathBuf::from(p);
        }
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".warden")
            .join("warden.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> warden_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let parsed = if config_path.exists() {
            info!(?config_path, "loading configuration");
            Self::parse_file(&config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            WardenConfig::default()
        };
        let config = Self::finalize(parsed)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    fn parse_file(path: &Path) -> warden_core::Result<WardenConfig> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str::<WardenConfig>(&raw).map_err(|e| {
            warden_core::WardenError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Layer env overrides on top of a parsed config, then validate it.
    /// Warnings are logged; errors reject the whole config.
    fn finalize(parsed: WardenConfig) -> warden_core::Result<WardenConfig> {
        let config = Self::apply_env_overrides(parsed);
        let warnings = config.validate().map_err(warden_core::WardenError::Config)?;
        for w in &warnings {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Get a read snapshot of the current config.
    pub fn get(&self) -> WardenConfig {
        self.config.read().clone()
    }

    /// Get a shared reference for subscription.
    pub fn shared(&self) -> Arc<RwLock<WardenConfig>> {
        Arc::clone(&self.config)
    }

    /// Path the config was loaded from.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (WARDEN_LOG_LEVEL, WARDEN_LOCK_LEASE_SECS, etc.)
    fn apply_env_overrides(mut config: WardenConfig) -> WardenConfig {
        if let Ok(v) = std::env::var("WARDEN_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("WARDEN_CONFIDENCE_FLOOR") {
            if let Ok(floor) = v.parse::<f64>() {
                config.trust.confidence_floor = floor;
            }
        }
        if let Ok(v) = std::env::var("WARDEN_LOCK_LEASE_SECS") {
            if let Ok(secs) = v.parse::<u64>() {
                config.locks.lease_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("WARDEN_MAX_RUN_DURATION_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                config.scheduler.max_run_duration_ms = ms;
            }
        }
        config
    }

    /// Reload the config from disk. An unreadable or invalid file leaves the
    /// current config in place.
    pub fn reload(&self) -> warden_core::Result<()> {
        if !self.config_path.exists() {
            return Err(warden_core::WardenError::Config(format!(
                "config file not found: {}",
                self.config_path.display()
            )));
        }
        let new_config = Self::finalize(Self::parse_file(&self.config_path)?)?;
        *self.config.write() = new_config;
        info!("configuration reloaded");
        Ok(())
    }
}
