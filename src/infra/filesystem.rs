//! Filesystem operations
//!
//! Handles file and directory operations.

use std::path::{Path, PathBuf};

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Create a fresh, empty directory, deleting any previous content
pub fn recreate_dir(path: &Path) -> Result<(), FilesystemError> {
    remove_dir_all(path)?;
    create_dir_all(path)
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Move a file into `dest_dir`, creating the directory if needed
///
/// Falls back to copy + remove when a rename crosses filesystems.
pub fn move_into(file: &Path, dest_dir: &Path) -> Result<PathBuf, FilesystemError> {
    create_dir_all(dest_dir)?;
    let file_name = file.file_name().unwrap_or(file.as_os_str());
    let dest = dest_dir.join(file_name);

    let map_err = |e: std::io::Error| FilesystemError::MoveFile {
        from: file.to_path_buf(),
        to: dest.clone(),
        error: e.to_string(),
    };

    if std::fs::rename(file, &dest).is_err() {
        std::fs::copy(file, &dest).map_err(map_err)?;
        std::fs::remove_file(file).map_err(map_err)?;
    }
    Ok(dest)
}

/// List the names of regular files directly inside `dir`, sorted
pub fn list_file_names(dir: &Path) -> Result<Vec<String>, FilesystemError> {
    list_entries(dir, |path| path.is_file())
}

/// List the names of subdirectories directly inside `dir`, sorted
pub fn list_dir_names(dir: &Path) -> Result<Vec<String>, FilesystemError> {
    list_entries(dir, |path| path.is_dir())
}

fn list_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<String>, FilesystemError> {
    let read_dir_err = |e: std::io::Error| FilesystemError::ReadDir {
        path: dir.to_path_buf(),
        error: e.to_string(),
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        if keep(&entry.path()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
