//! apt-get against an isolated package index, and local repository indexes
//!
//! Reference packages are fetched with a private `sources.list` and cache
//! so the host's apt configuration is never read or modified.

use std::path::{Path, PathBuf};

use crate::error::{BuildError, FetchError, ProcessError};
use crate::infra::{filesystem, process};

/// Private apt state inside a download directory
///
/// ```text
/// <download_dir>/apt/sources.list
/// <download_dir>/apt/cache/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptWorkspace {
    download_dir: PathBuf,
    sources_list: PathBuf,
    cache_dir: PathBuf,
}

impl AptWorkspace {
    /// Paths for a download directory, without touching the filesystem
    pub fn at(download_dir: &Path) -> Self {
        let apt_dir = download_dir.join("apt");
        Self {
            download_dir: download_dir.to_path_buf(),
            sources_list: apt_dir.join("sources.list"),
            cache_dir: apt_dir.join("cache"),
        }
    }

    /// Create the private `sources.list` and cache for `apt_config`
    pub fn create(download_dir: &Path, apt_config: &str) -> Result<Self, FetchError> {
        let workspace = Self::at(download_dir);
        let setup = || -> Result<(), crate::error::FilesystemError> {
            filesystem::recreate_dir(&workspace.cache_dir)?;
            filesystem::write_file(&workspace.sources_list, apt_config)
        };
        setup().map_err(|e| FetchError::IndexUpdate { error: e.to_string() })?;
        Ok(workspace)
    }

    /// Directory downloads land in
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// `-o` options redirecting apt to the private state
    pub fn options(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("Dir::Etc::sourcelist={}", self.sources_list.display()),
            "-o".to_string(),
            "Dir::Etc::sourceparts=/dev/null".to_string(),
            "-o".to_string(),
            format!("Dir::State={}", self.cache_dir.display()),
            "-o".to_string(),
            format!("Dir::Cache={}", self.cache_dir.display()),
        ]
    }

    /// Refresh the private package index
    pub fn update(&self) -> Result<(), FetchError> {
        let mut args = vec!["update".to_string()];
        args.extend(self.options());

        let output = process::run("apt-get", &args, Some(&self.download_dir))
            .map_err(|e| FetchError::IndexUpdate { error: e.to_string() })?;
        if !output.success() {
            return Err(FetchError::IndexUpdate {
                error: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Download `package`, optionally pinned to `version`, into the download dir
    pub fn download(&self, package: &str, version: Option<&str>) -> Result<(), FetchError> {
        let target = download_target(package, version);
        let mut args = vec!["download".to_string(), target.clone()];
        args.extend(self.options());

        let output = process::run("apt-get", &args, Some(&self.download_dir)).map_err(|e| FetchError::Download {
            package: target.clone(),
            error: e.to_string(),
        })?;
        if !output.success() {
            return Err(FetchError::Download {
                package: target,
                error: output.stderr.trim().to_string(),
            });
        }
        tracing::info!("Downloaded {target}");
        Ok(())
    }
}

/// `name` or `name=version`
pub fn download_target(package: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{package}={v}"),
        None => package.to_string(),
    }
}

/// Location of the `Packages` index inside a flat local repository
pub fn packages_index_dir(repo_dir: &Path, arch: &str) -> PathBuf {
    repo_dir
        .join("dists")
        .join("stable")
        .join("main")
        .join(format!("binary-{arch}"))
}

/// Regenerate `Packages` and `Packages.gz` for a local repository
///
/// `dpkg-scanpackages -m .` runs from the repository root so the index
/// holds repository-relative paths.
pub fn build_packages_index(repo_dir: &Path, arch: &str) -> Result<PathBuf, BuildError> {
    let index_dir = packages_index_dir(repo_dir, arch);
    filesystem::create_dir_all(&index_dir)?;
    let packages = index_dir.join("Packages");

    let scan_args = vec!["-m".to_string(), ".".to_string()];
    let output = process::run("dpkg-scanpackages", &scan_args, Some(repo_dir))?;
    if !output.success() {
        return Err(ProcessError::Failed {
            command: process::display_command("dpkg-scanpackages", &scan_args),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        }
        .into());
    }
    // dpkg-scanpackages reports the number of entries on stderr even on success
    tracing::debug!("{}", output.stderr.trim());
    filesystem::write_file(&packages, &output.stdout)?;

    let gzip_args = vec!["-k".to_string(), "-f".to_string(), packages.display().to_string()];
    process::run_checked("gzip", &gzip_args, Some(repo_dir))?;

    tracing::debug!("Packages file created at {}.gz", packages.display());
    Ok(packages)
}
