//! Error types for debforge
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Control descriptor errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Descriptor declares no binary packages
    #[error("Invalid control file at '{path}': no Package entries declared")]
    NoPackages { path: PathBuf },

    /// Failed to read the descriptor
    #[error("Failed to read control file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to walk the source tree
    #[error("Failed to scan source tree '{path}': {error}")]
    ScanError { path: PathBuf, error: String },
}

/// Dependency resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// Dependency cycle left vertices unresolved
    ///
    /// `forced` is the vertex pushed into the queue when the sort stalled.
    #[error("Cycle detected in dependencies, unresolved packages: {}", unresolved.join(", "))]
    CircularDependency {
        unresolved: Vec<String>,
        forced: Option<String>,
    },

    /// Requested package is produced by no descriptor
    #[error("Package '{name}' not found")]
    PackageNotFound { name: String },
}

/// Build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// External tool exited non-zero; its captured log has already been surfaced
    #[error("{tool} failed for {target} (exit code {code:?})")]
    ToolFailed {
        tool: String,
        target: String,
        code: Option<i32>,
        log: String,
    },

    /// Build failed for another reason
    #[error("Build failed for package '{package}': {error}")]
    BuildFailed { package: String, error: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Dependency resolution failed
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// Filesystem failure while staging or organizing artifacts
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Process could not be spawned
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl BuildError {
    /// Whether the triggering tool output was already shown to the user
    pub fn log_already_shown(&self) -> bool {
        matches!(self, Self::ToolFailed { .. })
    }
}

/// Package filename convention errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    /// File name does not follow `name_version[_arch].ext`
    #[error("Invalid package file name '{file}': expected name_version_arch.{extension}")]
    InvalidFileName { file: String, extension: String },

    /// More than one candidate where at most one is expected
    #[error("Multiple {kind} packages found for '{package}': {}", candidates.join(", "))]
    MultipleCandidates {
        package: String,
        kind: String,
        candidates: Vec<String>,
    },
}

/// Version string errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Version does not have a major.minor.patch upstream part
    #[error("Invalid {side} version: {version}. Expected a string in the format 'major.minor.patch'")]
    InvalidVersion { side: String, version: String },
}

/// Remote repository fetch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Package index could not be refreshed
    #[error("Failed to update package list: {error}")]
    IndexUpdate { error: String },

    /// Package could not be downloaded
    #[error("Failed to download {package}: {error}")]
    Download { package: String, error: String },
}

/// ABI comparison errors
#[derive(Error, Debug)]
pub enum AbiError {
    /// The differencing tool reported an internal error
    #[error("abipkgdiff encountered an error while comparing '{package}'")]
    ToolError { package: String },

    /// Exit status outside of the documented bit combinations
    #[error("Invalid abipkgdiff exit status {status:#06b}: {reason}")]
    InvalidStatus { status: i32, reason: String },

    /// Reference package was reported downloaded but is not on disk
    #[error("No old .deb for '{package}' found in '{dir}'")]
    OldPackageMissing { package: String, dir: PathBuf },

    /// Filename convention or ambiguity error
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Malformed version string
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Filesystem failure
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// External command failure
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// External process errors
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Process could not be started
    #[error("Failed to run '{command}': {error}")]
    Spawn { command: String, error: String },

    /// Process exited unsuccessfully
    #[error("Command '{command}' failed with exit code {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to list directory
    #[error("Failed to read directory '{path}': {error}")]
    ReadDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to move file
    #[error("Failed to move '{from}' to '{to}': {error}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },
}

/// Top-level debforge error type
#[derive(Error, Debug)]
pub enum DebforgeError {
    /// Control descriptor error
    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// ABI comparison error
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Source directory does not exist
    #[error("Source directory '{path}' not found")]
    SourcesNotFound { path: PathBuf },
}
