//! Bulk deletion of user instances and instance file cleanup.

use std::path::Path;

use super::manager::{InstanceManager, AUTOMATIC_INSTANCE_NAME};
use crate::error::{ErrorKind, Result};
use crate::native::{NativeApi, NativeVersion};

/// Remove an instance folder. Failures are logged, not returned.
pub(super) fn delete_instance_files(folder: &Path) {
    if !folder.exists() {
        log::debug!("Instance folder {} does not exist", folder.display());
        return;
    }
    match std::fs::remove_dir_all(folder) {
        Ok(()) => log::info!("Deleted instance files in {}", folder.display()),
        Err(e) => log::warn!(
            "Failed to delete instance files in {}: {}",
            folder.display(),
            e
        ),
    }
}

impl<A: NativeApi> InstanceManager<A> {
    /// `MSSQLLocalDB` and the `vMM.m` default names of the installed versions.
    fn installed_default_names(&self) -> Result<Vec<String>> {
        let mut names = vec![AUTOMATIC_INSTANCE_NAME.to_string()];
        names.extend(
            self.versions()?
                .iter()
                .filter_map(|v| NativeVersion::parse(v))
                .map(|v| format!("v{}.{}", v.major(), v.minor())),
        );
        Ok(names)
    }

    /// Delete every instance except automatic and default ones, using the
    /// configured file deletion setting.
    pub fn delete_all_user_instances(&self) -> Result<usize> {
        self.delete_user_instances(self.options().automatically_delete_instance_files)
    }

    /// Delete every instance except automatic and default ones.
    ///
    /// Instances that are in use are skipped. Returns the number deleted.
    pub fn delete_user_instances(&self, delete_files: bool) -> Result<usize> {
        let defaults = self.installed_default_names()?;
        let mut deleted = 0;
        for name in self.instance_names()? {
            let info = self.get_instance_info(&name)?;
            let is_default = defaults.iter().any(|d| d.eq_ignore_ascii_case(&name));
            if !info.exists || info.is_automatic || is_default {
                continue;
            }

            match self.delete_instance_with(&name, delete_files, false) {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) if e.kind() == ErrorKind::Busy => {
                    log::warn!("Skipping LocalDB instance {} which is in use", name);
                }
                Err(e) => return Err(e),
            }
        }
        log::info!("Deleted {} LocalDB user instance(s)", deleted);
        Ok(deleted)
    }
}
