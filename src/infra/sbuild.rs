//! sbuild driver
//!
//! Builds one source tree inside the prepared chroot and files the produced
//! artifacts into the output tree.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::defaults;
use crate::core::artifact::{self, ArtifactKind};
use crate::core::builder::PackageBuild;
use crate::core::descriptor::PackageDescriptor;
use crate::core::manifest_map::ArtifactClassifier;
use crate::error::BuildError;
use crate::infra::{apt, filesystem, process};

/// A flat repository on disk together with the line sbuild reaches it by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepository {
    /// Repository root holding `.deb` files and `dists/`
    pub dir: PathBuf,
    /// `deb ...` line, served by an external HTTP server
    pub line: String,
}

impl LocalRepository {
    /// Repository served from `url` with the `stable main` layout
    pub fn served_at(dir: impl Into<PathBuf>, url: &str, arch: &str) -> Self {
        Self {
            dir: dir.into(),
            line: format!("deb [trusted=yes arch={arch}] {url} stable main"),
        }
    }
}

/// Settings for sbuild invocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbuildConfig {
    /// Target distribution
    pub distribution: String,
    /// Target architecture
    pub architecture: String,
    /// Chroot suffix
    pub chroot_name: String,
    /// Mirror the chroot is bootstrapped from
    pub chroot_mirror: String,
    /// Chroot mount point
    pub mount_dir: PathBuf,
    /// sbuild `--build-dir`
    pub temp_dir: PathBuf,
    /// Organized artifact output
    pub deb_out_dir: PathBuf,
    /// Output tree served as a repository, re-indexed before every build
    pub local_repository: Option<LocalRepository>,
    /// Pre-built packages served as a repository
    pub debians_repository: Option<LocalRepository>,
    /// Additional repository lines
    pub extra_repositories: Vec<String>,
    /// Build source packages only
    pub prepare_source: bool,
    /// Remove the mount dir when chroot creation fails
    pub cleanup: bool,
}

impl SbuildConfig {
    /// sbuild distribution/chroot selector
    pub fn chroot_target(&self) -> String {
        format!("{}-{}{}", self.distribution, self.architecture, self.chroot_name)
    }

    /// Repository lines passed as `--extra-repository`, without duplicates
    pub fn repository_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        let candidates = self
            .local_repository
            .iter()
            .chain(self.debians_repository.iter())
            .map(|r| r.line.as_str())
            .chain(self.extra_repositories.iter().map(String::as_str));

        for line in candidates {
            let line = line.trim();
            if !line.is_empty() && !lines.iter().any(|l| l == line) {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Full sbuild argument list
    pub fn command_args(&self) -> Vec<String> {
        let temp_dir = self.temp_dir.display().to_string();
        let mut args: Vec<String> = if self.prepare_source {
            vec![
                "--source".to_string(),
                "--no-arch-all".to_string(),
                "--no-arch-any".to_string(),
                "-d".to_string(),
                self.chroot_target(),
                "--build-dir".to_string(),
                temp_dir,
            ]
        } else {
            vec![
                "-A".to_string(),
                format!("--arch={}", self.architecture),
                "-d".to_string(),
                self.chroot_target(),
                "--no-run-lintian".to_string(),
                "--build-dir".to_string(),
                temp_dir,
                "--build-dep-resolver=apt".to_string(),
            ]
        };

        args.extend(
            self.repository_lines()
                .into_iter()
                .map(|line| format!("--extra-repository={line}")),
        );
        args
    }

    /// `sbuild-createchroot` argument list
    pub fn createchroot_args(&self) -> Vec<String> {
        vec![
            format!("--arch={}", self.architecture),
            format!("--chroot-suffix={}", self.chroot_name),
            format!("--components={}", defaults::CHROOT_COMPONENTS),
            self.distribution.clone(),
            self.mount_dir.display().to_string(),
            self.chroot_mirror.clone(),
        ]
    }
}

/// Builds descriptors with sbuild
#[derive(Debug)]
pub struct SbuildBuilder<C> {
    config: SbuildConfig,
    classifier: C,
}

impl<C: ArtifactClassifier> SbuildBuilder<C> {
    /// Create a builder
    pub fn new(config: SbuildConfig, classifier: C) -> Self {
        Self { config, classifier }
    }

    /// Builder settings
    pub fn config(&self) -> &SbuildConfig {
        &self.config
    }

    /// Create the build chroot unless it already exists
    pub fn ensure_chroot(&self) -> Result<(), BuildError> {
        let mount_dir = &self.config.mount_dir;
        tracing::info!(
            "Generating schroot configuration for {} at {}",
            self.config.chroot_name,
            mount_dir.display()
        );

        if mount_dir.join("root").exists() {
            tracing::warn!(
                "Schroot environment {} already exists at {}, skipping creation",
                self.config.chroot_name,
                mount_dir.display()
            );
            return Ok(());
        }

        let output = process::run("sbuild-createchroot", &self.config.createchroot_args(), None)?;
        if !output.success() {
            if self.config.cleanup {
                filesystem::remove_dir_all(mount_dir)?;
            }
            let log = output.combined();
            tracing::error!("Error creating schroot environment: {log}");
            return Err(BuildError::ToolFailed {
                tool: "sbuild-createchroot".to_string(),
                target: self.config.chroot_target(),
                code: output.code,
                log,
            });
        }

        tracing::info!("Schroot environment {} created successfully", self.config.chroot_name);
        Ok(())
    }

    /// Regenerate the indexes of the pre-built package repository
    pub fn index_debians_repository(&self) -> Result<(), BuildError> {
        if let Some(repo) = &self.config.debians_repository {
            apt::build_packages_index(&repo.dir, &self.config.architecture)?;
        }
        Ok(())
    }

    /// Move the artifacts of a finished build into the output tree
    ///
    /// `.deb` and `.ddeb` files come from anywhere below the build dir;
    /// `.dsc` files are written next to the source tree by sbuild.
    pub fn organize_artifacts(&self, repo_path: &Path) -> Result<Vec<PathBuf>, BuildError> {
        let category = self.classifier.classify(repo_path);
        let out_dir = self.config.deb_out_dir.join(&category);
        let mut moved = Vec::new();

        if let Some(parent) = repo_path.parent() {
            for file in filesystem::list_file_names(parent)? {
                if ArtifactKind::from_file_name(&file) == Some(ArtifactKind::Dsc) {
                    let dest = out_dir.join(artifact::canonical_name(&file));
                    moved.push(filesystem::move_into(&parent.join(&file), &dest)?);
                }
            }
        }

        let built: Vec<PathBuf> = WalkDir::new(&self.config.temp_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                matches!(
                    ArtifactKind::from_file_name(&e.file_name().to_string_lossy()),
                    Some(ArtifactKind::Deb | ArtifactKind::Ddeb)
                )
            })
            .map(walkdir::DirEntry::into_path)
            .collect();

        for path in built {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let dest = out_dir.join(artifact::canonical_name(&file_name));
            moved.push(filesystem::move_into(&path, &dest)?);
        }

        tracing::debug!("Moved {} artifacts to {}", moved.len(), out_dir.display());
        Ok(moved)
    }
}

/// Collect the sbuild logs left in a build directory
pub fn collect_build_logs(dir: &Path) -> String {
    let Ok(files) = filesystem::list_file_names(dir) else {
        return String::new();
    };

    let mut log = String::new();
    for file in files.iter().filter(|f| f.ends_with(".build")) {
        let path = dir.join(file);
        if let Ok(content) = filesystem::read_file(&path) {
            log.push_str(&format!("===== {} =====\n", path.display()));
            log.push_str(&content);
            if !content.ends_with('\n') {
                log.push('\n');
            }
        }
    }
    log
}

impl<C: ArtifactClassifier> PackageBuild for SbuildBuilder<C> {
    fn build(&mut self, descriptor: &PackageDescriptor) -> Result<(), BuildError> {
        let repo_path = &descriptor.repo_path;
        // sbuild leaves its logs here; a failure must only report its own
        filesystem::recreate_dir(&self.config.temp_dir)?;

        if self.config.prepare_source {
            tracing::info!("Generating dsc for {:?}...", descriptor.packages);
        }
        if let Some(repo) = &self.config.local_repository {
            apt::build_packages_index(&repo.dir, &self.config.architecture)?;
        }

        let output = process::run("sbuild", &self.config.command_args(), Some(repo_path))?;
        if !output.success() {
            let mut log = collect_build_logs(&self.config.temp_dir);
            if log.is_empty() {
                log = output.combined();
            }
            tracing::error!("===== Build Logs Start =====\n{log}\n===== Build Logs End =====");
            return Err(BuildError::ToolFailed {
                tool: "sbuild".to_string(),
                target: descriptor.packages.join(", "),
                code: output.code,
                log,
            });
        }

        self.organize_artifacts(repo_path)?;
        tracing::info!("{:?} built successfully!", descriptor.packages);
        Ok(())
    }
}
