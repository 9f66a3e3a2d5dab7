//! Directory management
//!
//! User config directory lookup and the workspace layout used by builds.
//!
//! `DEBFORGE_CONFIG_DIR` overrides the platform config directory.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::manifest_map::{CATEGORY_OSS, CATEGORY_PROP};
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "DEBFORGE_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "debforge";

/// Platform-specific directory provider
#[derive(Debug, Clone)]
pub struct DebforgeDirs {
    config_dir: PathBuf,
}

impl DebforgeDirs {
    /// Resolve directories from the environment or platform defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Use an explicit config directory
    #[must_use]
    pub fn with_config_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: dir.into(),
        }
    }

    /// Config directory
    ///
    /// - Linux: `$XDG_CONFIG_HOME/debforge` or `~/.config/debforge`
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// User configuration file
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        dirs::config_dir().map(|p| p.join(APP_NAME)).unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join(APP_NAME))
                .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
        })
    }
}

impl Default for DebforgeDirs {
    fn default() -> Self {
        Self::new()
    }
}

/// Paths derived from a build workspace
///
/// ```text
/// <workspace>/
///     sources/                 source trees with debian/control
///     debian_packages/
///         oss/ prop/           organized build output
///         temp/                sbuild build dir
///     build/<chroot>/          chroot mount point
///     manifest_map.txt         optional classification
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
    chroot_name: String,
}

impl WorkspaceLayout {
    /// Layout for a workspace and chroot
    pub fn new(root: impl Into<PathBuf>, chroot_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            chroot_name: chroot_name.into(),
        }
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source trees
    pub fn sources_dir(&self) -> PathBuf {
        self.root.join(defaults::SOURCES_DIR)
    }

    /// Organized package output, also served as a local repository
    pub fn deb_out_dir(&self) -> PathBuf {
        self.root.join(defaults::DEB_OUT_DIR)
    }

    /// sbuild build directory
    pub fn temp_dir(&self) -> PathBuf {
        self.deb_out_dir().join(defaults::TEMP_DIR)
    }

    /// Chroot mount point
    pub fn mount_dir(&self) -> PathBuf {
        self.root.join(defaults::BUILD_DIR).join(&self.chroot_name)
    }

    /// Manifest map file
    pub fn manifest_map(&self) -> PathBuf {
        self.root.join(defaults::MANIFEST_MAP_FILE)
    }

    /// Create the directory skeleton; the temp dir is always emptied
    pub fn prepare(&self) -> Result<(), FilesystemError> {
        let deb_out = self.deb_out_dir();
        for dir in [
            self.sources_dir(),
            self.mount_dir(),
            deb_out.join(CATEGORY_OSS),
            deb_out.join(CATEGORY_PROP),
        ] {
            filesystem::create_dir_all(&dir)?;
        }
        filesystem::recreate_dir(&self.temp_dir())
    }
}
