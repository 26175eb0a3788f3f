//! Configuration management for the snapshot exporter
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (snapshot.toml)
//! - Environment variables (SNAPSHOT__*)
//!
//! ## Example config file (snapshot.toml):
//! ```toml
//! [export]
//! path = "/srv/game/devtools-snapshot"
//! output_format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Main configuration for the exporter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Export configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output directory override; blank means the host data directory
    #[serde(default)]
    pub path: String,

    /// Output format (pretty or compact)
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl SnapshotConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["snapshot.toml", ".snapshot.toml", "config/snapshot.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "registry", "snapshot") {
            let xdg_config = config_dir.config_dir().join("snapshot.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SNAPSHOT__EXPORT__PATH and friends
        builder = builder.add_source(
            Environment::with_prefix("SNAPSHOT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Output directory: the configured path, or `default_dir` when unset
    pub fn output_dir(&self, default_dir: &Path) -> PathBuf {
        let configured = self.export.path.trim();
        if configured.is_empty() {
            return normalize(default_dir);
        }
        normalize(Path::new(configured))
    }
}

/// Make a path absolute and collapse `.` and `..` lexically
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnapshotConfig::default();
        assert_eq!(config.export.output_format, OutputFormat::Pretty);
        assert!(config.export.path.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = SnapshotConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[export]"));
        assert!(toml_str.contains("output_format = \"pretty\""));
    }

    #[test]
    fn test_output_dir_override() {
        let data_dir = std::env::temp_dir().join("host-data");
        let mut config = SnapshotConfig::default();
        assert_eq!(config.output_dir(&data_dir), normalize(&data_dir));

        config.export.path = "   ".into();
        assert_eq!(config.output_dir(&data_dir), normalize(&data_dir));

        let custom = std::env::temp_dir().join("a").join("..").join("snapshot");
        config.export.path = custom.to_string_lossy().into_owned();
        assert_eq!(config.output_dir(&data_dir), normalize(&std::env::temp_dir()).join("snapshot"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[export]\noutput_format = \"compact\"\npath = \"/tmp/out\"\n").unwrap();

        let config = SnapshotConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.export.output_format, OutputFormat::Compact);
        assert_eq!(config.export.path, "/tmp/out");
    }
}
