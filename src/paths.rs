//! Centralized path utilities for LocalDB instance files.

use std::path::PathBuf;

/// Get the default root of the per-user instance folders
/// (`%LOCALAPPDATA%\Microsoft\Microsoft SQL Server Local DB\Instances`).
pub fn default_instances_root() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| {
        dir.join("Microsoft")
            .join("Microsoft SQL Server Local DB")
            .join("Instances")
    })
}

/// Get the folder holding the files of `instance_name` below `root`.
///
/// Does not validate the name; see
/// [`resolve_instance_folder`](crate::validation::resolve_instance_folder).
pub fn instance_folder(root: &std::path::Path, instance_name: &str) -> PathBuf {
    root.join(instance_name)
}
