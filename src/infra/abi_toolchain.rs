//! ABI check toolchain backed by dpkg, apt-get and abipkgdiff

use std::path::Path;

use crate::core::checker::{AbiToolchain, DiffInputs, DiffOutcome};
use crate::error::{AbiError, FetchError};
use crate::infra::apt::AptWorkspace;
use crate::infra::{abipkgdiff, dpkg};

/// Runs the real host tools
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAbiToolchain;

impl AbiToolchain for SystemAbiToolchain {
    fn extract(&mut self, package: &Path, dest: &Path) -> Result<(), AbiError> {
        dpkg::extract(package, dest)
    }

    fn update_index(&mut self, download_dir: &Path, apt_config: &str) -> Result<(), FetchError> {
        tracing::debug!("APT server config: {apt_config}");
        AptWorkspace::create(download_dir, apt_config)?.update()
    }

    fn download(&mut self, download_dir: &Path, package: &str, version: Option<&str>) -> Result<(), FetchError> {
        AptWorkspace::at(download_dir).download(package, version)
    }

    fn diff(&mut self, inputs: &DiffInputs) -> Result<DiffOutcome, AbiError> {
        Ok(abipkgdiff::run(inputs)?)
    }
}
