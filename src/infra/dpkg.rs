//! Package extraction with `dpkg -x`

use std::path::Path;

use crate::error::{AbiError, ArtifactError};
use crate::infra::{filesystem, process};

/// Unpack the file tree of a `.deb` or `.ddeb` into `dest`
pub fn extract(package: &Path, dest: &Path) -> Result<(), AbiError> {
    let is_package = package
        .extension()
        .is_some_and(|ext| ext == "deb" || ext == "ddeb");
    if !is_package || !package.is_file() {
        return Err(ArtifactError::InvalidFileName {
            file: package.display().to_string(),
            extension: "deb".to_string(),
        }
        .into());
    }

    filesystem::create_dir_all(dest)?;
    let args = vec![
        "-x".to_string(),
        package.display().to_string(),
        dest.display().to_string(),
    ];
    process::run_checked("dpkg", &args, None)?;
    Ok(())
}
