//! Default configuration values

/// Target distribution
pub const DEFAULT_DISTRIBUTION: &str = "noble";

/// Target architecture
pub const DEFAULT_ARCHITECTURE: &str = "arm64";

/// Suffix appended to the sbuild chroot name
pub const DEFAULT_CHROOT_NAME: &str = "-debforge";

/// Mirror the build chroot is bootstrapped from
pub const DEFAULT_CHROOT_MIRROR: &str = "http://ports.ubuntu.com";

/// Components enabled in the build chroot
pub const CHROOT_COMPONENTS: &str = "main,universe";

/// Repository the reference packages for ABI checks come from
pub const DEFAULT_ABI_APT_SERVER_CONFIG: &str =
    "deb [arch=arm64 trusted=yes] http://pkg.qualcomm.com noble/stable main";

/// Workspace subdirectory holding source trees
pub const SOURCES_DIR: &str = "sources";

/// Workspace subdirectory receiving built packages
pub const DEB_OUT_DIR: &str = "debian_packages";

/// Subdirectory of the package output used as sbuild build dir
pub const TEMP_DIR: &str = "temp";

/// Workspace subdirectory holding build chroots
pub const BUILD_DIR: &str = "build";

/// Optional open/proprietary classification file in the workspace
pub const MANIFEST_MAP_FILE: &str = "manifest_map.txt";

/// ABI report written next to the repository folders in multi-repo mode
pub const ABI_REPORT_FILE: &str = "abi_checker.log";
