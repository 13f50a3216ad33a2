//! Configuration types for lav.
//!
//! [`Config::load`] reads `~/.config/lav/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::load_from`] reads a
//! specific file. [`Config::defaults`] returns the same defaults without
//! touching the filesystem (useful in tests). Environment variables prefixed
//! with `LAV__` override file values (`LAV__VIEWER__PAGE_SIZE=50`).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::sort::{check_timestamp_format, DEFAULT_TIMESTAMP_FORMAT};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[viewer]
page_size           = 15
timestamp_format    = "%Y-%m-%d %H:%M:%S,%3f"
default_tenant      = ""
default_server_key  = ""
hidden_applications = ["STRATOS_ROOT"]
offload_sort        = true

[event_source]
kind       = "file"
timeout_ms = 5000

[event_source.properties]
directory = "logs"

[file_source]
kind       = "file"
timeout_ms = 5000

[file_source.properties]
directory = "logs"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub viewer: ViewerConfig,
    /// Source answering event queries.
    pub event_source: SourceSettings,
    /// Source answering log-file queries. Optional: without it the file
    /// operations of the viewer report the source as unavailable.
    #[serde(default)]
    pub file_source: Option<SourceSettings>,
}

/// `[viewer]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    /// Tenant used when a query leaves the tenant unconstrained.
    #[serde(default)]
    pub default_tenant: String,
    /// Server key used when a query leaves the server unconstrained.
    #[serde(default)]
    pub default_server_key: String,
    /// Application names never reported by the application listing.
    #[serde(default = "default_hidden_applications")]
    pub hidden_applications: Vec<String>,
    #[serde(default = "default_offload_sort")]
    pub offload_sort: bool,
}

fn default_page_size() -> usize { 15 }
fn default_timestamp_format() -> String { DEFAULT_TIMESTAMP_FORMAT.to_string() }
fn default_hidden_applications() -> Vec<String> { vec!["STRATOS_ROOT".to_string()] }
fn default_offload_sort() -> bool { true }

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            timestamp_format: default_timestamp_format(),
            default_tenant: String::new(),
            default_server_key: String::new(),
            hidden_applications: default_hidden_applications(),
            offload_sort: default_offload_sort(),
        }
    }
}

/// `[event_source]` / `[file_source]` sections: which provider backs the
/// source and the provider-specific properties handed to it.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    /// Provider name as registered in the source registry.
    pub kind: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

fn default_timeout_ms() -> u64 { 5000 }

impl SourceSettings {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            timeout_ms: default_timeout_ms(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// A property value, treating the empty string as absent.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/lav/config.toml`, layered on top of the built-in
    /// defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::load_from(&path)
    }

    /// Load a specific file, layered on top of the built-in defaults. The
    /// file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let cfg: Self = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("LAV").prefix_separator("__").separator("__"))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        check_timestamp_format(&self.viewer.timestamp_format)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("lav")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.viewer.page_size, 15);
        assert_eq!(cfg.viewer.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(cfg.viewer.hidden_applications, vec!["STRATOS_ROOT"]);
        assert!(cfg.viewer.offload_sort);
        assert_eq!(cfg.event_source.kind, "file");
        assert_eq!(cfg.event_source.property("directory"), Some("logs"));
        assert_eq!(cfg.event_source.timeout(), Duration::from_secs(5));
        assert!(cfg.file_source.is_some());
    }

    #[test]
    fn bad_timestamp_format_fails_validation() {
        let mut cfg = Config::defaults();
        assert!(cfg.validate().is_ok());
        cfg.viewer.timestamp_format = "%Y-%Q".to_string();
        assert!(matches!(cfg.validate(), Err(crate::error::ViewerError::Config(_))));
    }

    #[test]
    fn empty_property_is_absent() {
        let settings = SourceSettings::new("memory").with_property("columns", "");
        assert_eq!(settings.property("columns"), None);
        assert_eq!(settings.property("missing"), None);
    }
}
