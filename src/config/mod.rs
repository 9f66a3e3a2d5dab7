//! Configuration and constants
//!
//! `debforge.toml` is looked up in the workspace root first, then in the
//! user config directory. Every field is optional; unset fields fall back
//! to [`defaults`]. Command line flags override both.
//!
//! ```toml
//! [build]
//! distribution = "noble"
//! architecture = "arm64"
//! chroot_name = "-ci"
//! apt_server_config = ["deb [trusted=yes] http://localhost:8000 stable main"]
//!
//! [abi]
//! keep_temp = true
//! ```

pub mod defaults;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::infra::dirs::DebforgeDirs;
use crate::infra::filesystem;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "debforge.toml";

/// Settings file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebforgeConfig {
    /// Package build settings
    #[serde(default)]
    pub build: BuildSection,

    /// ABI check settings
    #[serde(default)]
    pub abi: AbiSection,
}

/// `[build]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Target distribution
    pub distribution: Option<String>,
    /// Target architecture
    pub architecture: Option<String>,
    /// sbuild chroot suffix
    pub chroot_name: Option<String>,
    /// Mirror used to bootstrap the chroot
    pub chroot_mirror: Option<String>,
    /// Extra repository lines passed to every build
    #[serde(default)]
    pub apt_server_config: Vec<String>,
    /// Produce source packages instead of binaries
    pub prepare_source: Option<bool>,
    /// Remove a half-created chroot after a failure
    pub cleanup: Option<bool>,
}

/// `[abi]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AbiSection {
    /// Repository the reference packages are fetched from
    pub apt_server_config: Option<String>,
    /// Keep scratch directories after the run
    pub keep_temp: Option<bool>,
    /// Compare types not reachable from exported symbols
    pub non_reachable_types: Option<bool>,
}

impl DebforgeConfig {
    /// Load the configuration for a workspace
    ///
    /// Uses `<workspace>/debforge.toml` when present, otherwise the user
    /// config file, otherwise defaults.
    pub fn load(workspace: Option<&Path>, dirs: &DebforgeDirs) -> Result<Self, ConfigError> {
        match Self::locate(workspace, dirs) {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::load_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// First existing configuration file
    pub fn locate(workspace: Option<&Path>, dirs: &DebforgeDirs) -> Option<PathBuf> {
        workspace
            .map(|w| w.join(CONFIG_FILE_NAME))
            .into_iter()
            .chain(std::iter::once(dirs.config_file()))
            .find(|p| p.is_file())
    }

    /// Parse a specific configuration file
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = filesystem::read_file(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Effective distribution
    pub fn distribution(&self) -> &str {
        self.build
            .distribution
            .as_deref()
            .unwrap_or(defaults::DEFAULT_DISTRIBUTION)
    }

    /// Effective architecture
    pub fn architecture(&self) -> &str {
        self.build
            .architecture
            .as_deref()
            .unwrap_or(defaults::DEFAULT_ARCHITECTURE)
    }

    /// Effective chroot suffix
    pub fn chroot_name(&self) -> &str {
        self.build
            .chroot_name
            .as_deref()
            .unwrap_or(defaults::DEFAULT_CHROOT_NAME)
    }

    /// Effective chroot mirror
    pub fn chroot_mirror(&self) -> &str {
        self.build
            .chroot_mirror
            .as_deref()
            .unwrap_or(defaults::DEFAULT_CHROOT_MIRROR)
    }

    /// Effective ABI reference repository
    pub fn abi_apt_server_config(&self) -> &str {
        self.abi
            .apt_server_config
            .as_deref()
            .unwrap_or(defaults::DEFAULT_ABI_APT_SERVER_CONFIG)
    }

    /// Whether ABI scratch directories are kept
    pub fn abi_keep_temp(&self) -> bool {
        self.abi.keep_temp.unwrap_or(true)
    }

    /// Whether `--non-reachable-types` is passed to abipkgdiff
    pub fn non_reachable_types(&self) -> bool {
        self.abi.non_reachable_types.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DebforgeConfig::default();
        assert_eq!(config.distribution(), "noble");
        assert_eq!(config.architecture(), "arm64");
        assert_eq!(config.abi_apt_server_config(), defaults::DEFAULT_ABI_APT_SERVER_CONFIG);
        assert!(config.abi_keep_temp());
    }

    #[test]
    fn test_workspace_file_wins() {
        let workspace = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        std::fs::write(workspace.path().join(CONFIG_FILE_NAME), "[build]\ndistribution = \"jammy\"\n").unwrap();
        std::fs::write(user.path().join("config.toml"), "[build]\ndistribution = \"oracular\"\n").unwrap();

        let dirs = DebforgeDirs::with_config_dir(user.path());
        let config = DebforgeConfig::load(Some(workspace.path()), &dirs).unwrap();
        assert_eq!(config.distribution(), "jammy");

        let config = DebforgeConfig::load(None, &dirs).unwrap();
        assert_eq!(config.distribution(), "oracular");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[build]\njobs = 4\n").unwrap();
        assert!(matches!(
            DebforgeConfig::load_file(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_repository_list() {
        let config: DebforgeConfig = toml::from_str(
            "[build]\napt_server_config = [\"deb http://a stable main\", \"\"]\n[abi]\nkeep_temp = false\n",
        )
        .unwrap();
        assert_eq!(config.build.apt_server_config.len(), 2);
        assert!(!config.abi_keep_temp());
    }
}
