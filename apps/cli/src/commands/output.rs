use std::fs;
use std::path::{Path, PathBuf};

use drive_tree_common::DriveTreeError;
use drive_tree_domain::Tree;

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the tree as 2-space indented JSON, creating parent directories.
/// The file is staged next to the target and renamed into place, so the
/// target is either fully written or left untouched.
pub fn write_tree(tree: &Tree, path: &Path) -> Result<(), DriveTreeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            DriveTreeError::Serialization(format!("failed to create {}: {}", parent.display(), e))
        })?;
    }

    let json = serde_json::to_string_pretty(tree)
        .map_err(|e| DriveTreeError::Serialization(format!("failed to encode tree: {}", e)))?;

    let staging = staging_path(path);
    fs::write(&staging, json).map_err(|e| {
        let _ = fs::remove_file(&staging);
        DriveTreeError::Serialization(format!("failed to write {}: {}", staging.display(), e))
    })?;
    fs::rename(&staging, path).map_err(|e| {
        let _ = fs::remove_file(&staging);
        DriveTreeError::Serialization(format!("failed to write {}: {}", path.display(), e))
    })?;

    Ok(())
}
