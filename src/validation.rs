use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SqlLocalDbError};
use crate::paths::instance_folder;

/// Longest instance name LocalDB accepts.
pub const MAX_INSTANCE_NAME_LEN: usize = 128;

pub fn require_non_empty(parameter: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SqlLocalDbError::invalid_argument(
            parameter,
            "must not be empty",
        ));
    }
    Ok(())
}

/// Reject names LocalDB cannot store. Empty names are an argument error.
pub fn validate_instance_name(name: &str) -> Result<()> {
    require_non_empty("instance_name", name)?;
    if name.contains('\0') || name.chars().count() > MAX_INSTANCE_NAME_LEN {
        return Err(SqlLocalDbError::invalid_name(name));
    }
    Ok(())
}

/// A name that maps to exactly one folder directly below the root.
fn is_safe_folder_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0', ':']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && name != "."
        && name != ".."
}

/// Resolve the files folder of `instance_name` under `root`.
///
/// Names containing separators or traversal segments are rejected before any
/// path is built. An existing folder must also canonicalize to a location
/// inside the root, so symlinked folders cannot lead outside it.
pub fn resolve_instance_folder(root: &Path, instance_name: &str) -> Result<PathBuf> {
    if !is_safe_folder_name(instance_name) {
        return Err(SqlLocalDbError::invalid_name(instance_name));
    }

    let candidate = instance_folder(root, instance_name);
    if !candidate.exists() {
        return Ok(candidate);
    }

    let root_canonical = root
        .canonicalize()
        .map_err(|e| SqlLocalDbError::io(format!("Failed to resolve instances root: {}", e)))?;
    let canonical = candidate
        .canonicalize()
        .map_err(|e| SqlLocalDbError::io(format!("Failed to resolve instance folder: {}", e)))?;

    if canonical == root_canonical || !canonical.starts_with(&root_canonical) {
        return Err(SqlLocalDbError::invalid_name(instance_name));
    }
    if fs::symlink_metadata(&candidate).is_ok_and(|m| m.file_type().is_symlink()) {
        return Err(SqlLocalDbError::invalid_name(instance_name));
    }

    Ok(canonical)
}
