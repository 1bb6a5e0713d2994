use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "GRADEBOOKD_CONFIG";
pub const WORKSPACE_ENV: &str = "GRADEBOOKD_WORKSPACE";
pub const LOG_ENV: &str = "GRADEBOOKD_LOG";

/// Startup settings. Everything is optional: with no config the daemon starts
/// on the in-memory store and logs at `info`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Workspace directory opened before the first request is read.
    pub workspace: Option<PathBuf>,
    /// `tracing` filter directive, e.g. `info` or `gradebookd=debug`.
    pub log_level: Option<String>,
}

impl DaemonConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("failed to deserialize daemon config")
    }

    /// Reads the file named by `GRADEBOOKD_CONFIG` (if set), then applies the
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ws) = lookup(WORKSPACE_ENV).filter(|v| !v.trim().is_empty()) {
            self.workspace = Some(PathBuf::from(ws));
        }
        if let Some(level) = lookup(LOG_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_level = Some(level);
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}
