//! ABI check pipeline
//!
//! For every core `.deb` in a repository output folder: extract the new
//! artifacts, fetch and extract the previously published ones, run the
//! differencing tool, classify its result and check the version bump.
//!
//! Layout of the scratch area inside each repository folder:
//!
//! ```text
//! <repo>/abi_check_tmp/<package>/
//!     new/            extracted new artifacts
//!     old/            extracted reference artifacts
//!     old_download/   downloaded reference .deb/.ddeb files
//!     report/         abipkgdiff_output.txt
//! ```

use std::path::{Path, PathBuf};

use crate::core::abi::{evaluate_policy, AbiDiffStatus, AbiReturnCode};
use crate::core::artifact::{self, DebArtifact, DBGSYM_SUFFIX, DEV_SUFFIX};
use crate::core::report::{AbiCheckRecord, AbiSession};
use crate::core::version::compare_versions;
use crate::error::{AbiError, ArtifactError, FetchError};
use crate::infra::filesystem;

/// Scratch directory created inside each repository folder
pub const ABI_TEMP_DIR: &str = "abi_check_tmp";

/// File the differencing tool output is stored in
pub const DIFF_OUTPUT_FILE: &str = "abipkgdiff_output.txt";

/// Inputs for one differencing tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffInputs {
    /// Reference core package
    pub old_deb: PathBuf,
    /// Reference development package
    pub old_dev: Option<PathBuf>,
    /// Reference debug symbol package
    pub old_ddeb: Option<PathBuf>,
    /// New core package
    pub new_deb: PathBuf,
    /// New development package
    pub new_dev: Option<PathBuf>,
    /// New debug symbol package
    pub new_ddeb: Option<PathBuf>,
    /// Also compare types not reachable from exported symbols
    pub non_reachable_types: bool,
}

/// Raw result of a differencing tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOutcome {
    /// Exit status bits
    pub exit_code: i32,
    /// Captured report text
    pub output: String,
}

/// External tools the pipeline depends on
///
/// The system implementation lives in [`crate::infra::abi_toolchain`].
pub trait AbiToolchain {
    /// Unpack a package into `dest`
    fn extract(&mut self, package: &Path, dest: &Path) -> Result<(), AbiError>;

    /// Set up an isolated package index for `apt_config` in `download_dir`
    fn update_index(&mut self, download_dir: &Path, apt_config: &str) -> Result<(), FetchError>;

    /// Download `package` (optionally pinned to `version`) into `download_dir`
    fn download(&mut self, download_dir: &Path, package: &str, version: Option<&str>) -> Result<(), FetchError>;

    /// Run the differencing tool
    fn diff(&mut self, inputs: &DiffInputs) -> Result<DiffOutcome, AbiError>;
}

/// Settings for an ABI check run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiCheckOptions {
    /// Repository line the reference packages are fetched from
    pub apt_server_config: String,
    /// Reference version to compare against instead of the latest
    pub old_version: Option<String>,
    /// Keep the scratch directories after the run
    pub keep_temp: bool,
    /// Pass `--non-reachable-types` to the differencing tool
    pub non_reachable_types: bool,
}

/// Drives ABI checks over repository output folders
#[derive(Debug)]
pub struct AbiChecker<T> {
    toolchain: T,
    options: AbiCheckOptions,
}

impl<T: AbiToolchain> AbiChecker<T> {
    /// Create a checker
    pub fn new(toolchain: T, options: AbiCheckOptions) -> Self {
        Self { toolchain, options }
    }

    /// Run options
    pub fn options(&self) -> &AbiCheckOptions {
        &self.options
    }

    /// The toolchain
    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Check every repository folder directly inside `package_dir`
    ///
    /// A fatal error in one repository stops the whole run.
    pub fn check_repositories(
        &mut self,
        package_dir: &Path,
        session: &mut AbiSession,
    ) -> Result<AbiReturnCode, AbiError> {
        let mut result = AbiReturnCode::NO_DIFF;
        for folder in filesystem::list_dir_names(package_dir)? {
            let repo_dir = package_dir.join(&folder);
            result |= self.check_repository(&repo_dir, session).inspect_err(|e| {
                tracing::error!("ABI check of repository '{folder}' failed: {e}");
            })?;
        }
        Ok(result)
    }

    /// Check every core package inside one repository folder
    pub fn check_repository(&mut self, repo_dir: &Path, session: &mut AbiSession) -> Result<AbiReturnCode, AbiError> {
        let repo_name = repo_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::debug!("Performing ABI check for repository '{repo_name}'");

        let files = filesystem::list_file_names(repo_dir)?;
        let core_debs: Vec<&String> = files.iter().filter(|f| artifact::is_core_deb(f)).collect();
        if core_debs.is_empty() {
            tracing::warn!("No .deb file found in {}, nothing to compare", repo_dir.display());
            return Ok(AbiReturnCode::NO_DIFF);
        }
        tracing::debug!("Found {} core package(s) in '{repo_name}'", core_debs.len());

        let temp_dir = repo_dir.join(ABI_TEMP_DIR);
        filesystem::recreate_dir(&temp_dir)?;

        let mut result = AbiReturnCode::NO_DIFF;
        let mut outcome: Result<(), AbiError> = Ok(());
        for deb_file in core_debs {
            let mut record = AbiCheckRecord::new(artifact::canonical_name(deb_file));
            record.repository = Some(repo_name.clone());

            let checked = self.check_package(repo_dir, &temp_dir, deb_file, &files, &mut record);
            let package = record.package.clone();
            session.record(record);

            match checked {
                Ok(code) => {
                    result |= code;
                    session.merge(code);
                }
                Err(AbiError::Artifact(e @ ArtifactError::MultipleCandidates { .. })) => {
                    tracing::error!("{package}: {e}");
                    session.abort(package, e.to_string());
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if !self.options.keep_temp {
            tracing::debug!("Removing temporary directory {}", temp_dir.display());
            filesystem::remove_dir_all(&temp_dir)?;
        }

        outcome.map(|()| result)
    }

    /// Compare one core package against its published predecessor
    pub fn check_package(
        &mut self,
        repo_dir: &Path,
        temp_dir: &Path,
        deb_file: &str,
        repo_files: &[String],
        record: &mut AbiCheckRecord,
    ) -> Result<AbiReturnCode, AbiError> {
        let package = record.package.clone();
        let _span = tracing::info_span!("abi_check", package = %package).entered();

        let new_deb = DebArtifact::parse(deb_file)?;
        tracing::info!("{package}: new package version {}", new_deb.version);
        record.new.deb = Some(deb_file.to_string());
        record.new.version = Some(new_deb.version.clone());

        let new_dev = artifact::find_dev_package(repo_files, &package)?;
        let new_ddeb = artifact::find_debug_package(repo_files, &package)?;
        match &new_dev {
            Some(dev) => tracing::info!("{package}: -dev.deb package found: {dev}"),
            None => tracing::warn!("{package}: no -dev.deb package found"),
        }
        match &new_ddeb {
            Some(ddeb) => tracing::info!("{package}: -dbgsym.ddeb package found: {ddeb}"),
            None => tracing::warn!("{package}: no -dbgsym.ddeb package found"),
        }
        record.new.dev.clone_from(&new_dev);
        record.new.ddeb.clone_from(&new_ddeb);

        let work_dir = temp_dir.join(&package);
        let new_extract_dir = work_dir.join("new");
        let old_extract_dir = work_dir.join("old");
        let download_dir = work_dir.join("old_download");
        let report_dir = work_dir.join("report");
        for dir in [&new_extract_dir, &old_extract_dir, &download_dir, &report_dir] {
            filesystem::recreate_dir(dir)?;
        }

        let new_deb_path = repo_dir.join(deb_file);
        let new_dev_path = new_dev.as_ref().map(|f| repo_dir.join(f));
        let new_ddeb_path = new_ddeb.as_ref().map(|f| repo_dir.join(f));
        self.extract_all(&new_deb_path, new_dev_path.as_deref(), new_ddeb_path.as_deref(), &new_extract_dir)?;

        if let Some((code, reason)) = self.fetch_reference(&package, &download_dir) {
            record.fetch_failure = Some(reason);
            return Ok(code);
        }

        let downloaded = filesystem::list_file_names(&download_dir)?;
        let old_deb = downloaded
            .iter()
            .find(|f| f.ends_with(".deb") && !f.contains(DEV_SUFFIX) && !f.contains(DBGSYM_SUFFIX))
            .cloned()
            .ok_or_else(|| AbiError::OldPackageMissing {
                package: package.clone(),
                dir: download_dir.clone(),
            })?;
        let old_dev = downloaded
            .iter()
            .find(|f| f.ends_with(".deb") && f.contains(DEV_SUFFIX))
            .cloned();
        let old_ddeb = downloaded
            .iter()
            .find(|f| f.ends_with(".ddeb") && f.contains(DBGSYM_SUFFIX))
            .cloned();

        let old_version = DebArtifact::parse(&old_deb)?.version;
        tracing::info!("{package}: old package version {old_version}");
        record.old.deb = Some(old_deb.clone());
        record.old.version = Some(old_version.clone());
        record.old.dev.clone_from(&old_dev);
        record.old.ddeb.clone_from(&old_ddeb);

        let old_deb_path = download_dir.join(&old_deb);
        let old_dev_path = old_dev.as_ref().map(|f| download_dir.join(f));
        let old_ddeb_path = old_ddeb.as_ref().map(|f| download_dir.join(f));
        self.extract_all(&old_deb_path, old_dev_path.as_deref(), old_ddeb_path.as_deref(), &old_extract_dir)?;

        record.remarks.no_dev_package = old_dev.is_none() || new_dev.is_none();
        record.remarks.no_dbg_package = old_ddeb.is_none() || new_ddeb.is_none();
        if !record.remarks.is_empty() {
            tracing::warn!(
                "{package}: {}, interpret the results with caution",
                record.remarks
            );
        }

        let inputs = DiffInputs {
            old_deb: old_deb_path,
            old_dev: old_dev_path,
            old_ddeb: old_ddeb_path,
            new_deb: new_deb_path,
            new_dev: new_dev_path,
            new_ddeb: new_ddeb_path,
            non_reachable_types: self.options.non_reachable_types,
        };
        let outcome = self.toolchain.diff(&inputs)?;
        filesystem::write_file(&report_dir.join(DIFF_OUTPUT_FILE), &outcome.output)?;

        let status = AbiDiffStatus::classify(outcome.exit_code, &outcome.output)?;
        record.status = Some(status);
        match status {
            AbiDiffStatus::ToolError => {
                tracing::error!("{package}: abipkgdiff encountered an error");
                record.output = Some(outcome.output);
                return Err(AbiError::ToolError { package });
            }
            AbiDiffStatus::Stripped => {
                tracing::error!("{package}: abipkgdiff usage error, the package is likely stripped");
                return Ok(status.return_code());
            }
            AbiDiffStatus::NoDiff => {
                tracing::info!("{package}: no differences between old and new packages");
            }
            AbiDiffStatus::Compatible | AbiDiffStatus::Incompatible => {
                tracing::warn!("{package}: abipkgdiff detected {status} changes");
                tracing::debug!("{}", outcome.output);
                record.output = Some(outcome.output);
            }
        }

        let bump = compare_versions(&old_version, &new_deb.version)?;
        record.verdict = Some(evaluate_policy(status, bump)?);

        Ok(status.return_code())
    }

    /// Download the reference packages
    ///
    /// `Some` ends the comparison early with the outcome bit and its reason.
    fn fetch_reference(&mut self, package: &str, download_dir: &Path) -> Option<(AbiReturnCode, String)> {
        let version = self.options.old_version.clone();
        match &version {
            Some(v) => tracing::warn!("{package}: downloading the specific version {v}"),
            None => tracing::debug!("{package}: downloading the latest version"),
        }

        if let Err(e) = self
            .toolchain
            .update_index(download_dir, &self.options.apt_server_config)
        {
            tracing::error!("{package}: {e}");
            return Some((AbiReturnCode::FETCH_ERROR, format!("FETCH-ERROR: {e}")));
        }

        if let Err(e) = self.toolchain.download(download_dir, package, version.as_deref()) {
            tracing::error!("{package}: {e}");
            return Some((AbiReturnCode::PACKAGE_NOT_FOUND, format!("PACKAGE-NOT-FOUND: {e}")));
        }

        let dev_package = format!("{}{DEV_SUFFIX}", artifact::strip_soversion(package));
        let dbgsym_package = format!("{package}{DBGSYM_SUFFIX}");
        for auxiliary in [dev_package, dbgsym_package] {
            if let Err(e) = self.toolchain.download(download_dir, &auxiliary, version.as_deref()) {
                tracing::warn!("{package}: {e}");
            }
        }
        None
    }

    fn extract_all(
        &mut self,
        deb: &Path,
        dev: Option<&Path>,
        ddeb: Option<&Path>,
        dest: &Path,
    ) -> Result<(), AbiError> {
        self.toolchain.extract(deb, dest)?;
        for extra in [dev, ddeb].into_iter().flatten() {
            self.toolchain.extract(extra, dest)?;
        }
        Ok(())
    }
}
