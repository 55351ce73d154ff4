//! Instance CRUD operations.

use super::cleanup::delete_instance_files;
use super::manager::{is_default_instance_name, InstanceManager};
use super::types::InstanceInfo;
use crate::error::{Result, SqlLocalDbError};
use crate::native::{NativeApi, NativeStatus};
use crate::validation::{require_non_empty, resolve_instance_folder, validate_instance_name};

impl<A: NativeApi> InstanceManager<A> {
    /// Names of all instances of the current user.
    pub fn instance_names(&self) -> Result<Vec<String>> {
        let result = self.api().instance_names();
        self.check("instance enumeration", None, result)
    }

    /// Info for every instance of the current user.
    pub fn get_instances(&self) -> Result<Vec<InstanceInfo>> {
        self.instance_names()?
            .iter()
            .map(|name| self.get_instance_info(name))
            .collect()
    }

    pub fn instance_exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_instance_info(name)?.exists)
    }

    /// Query the current state of `name`.
    ///
    /// An unknown instance yields info with `exists == false`; structurally
    /// invalid names are an error.
    pub fn get_instance_info(&self, name: &str) -> Result<InstanceInfo> {
        validate_instance_name(name)?;
        match self.api().instance_info(name) {
            Ok(info) => Ok(info),
            Err(NativeStatus::UNKNOWN_INSTANCE) => Ok(InstanceInfo::missing(name)),
            Err(status) => Err(self.translate(status, Some(name))),
        }
    }

    /// Create `name` with `version`, or the latest installed version.
    pub fn create_instance(&self, name: &str, version: Option<&str>) -> Result<InstanceInfo> {
        validate_instance_name(name)?;
        let version = match version {
            Some(version) => {
                require_non_empty("version", version)?;
                version.to_string()
            }
            None => self.latest_version()?,
        };

        if self.instance_exists(name)? {
            return Err(SqlLocalDbError::already_exists(name));
        }

        log::debug!("Creating LocalDB instance {} with version {}", name, version);
        let result = self.api().create_instance(&version, name);
        self.check("create instance", Some(name), result)?;
        log::info!("Created LocalDB instance {} with version {}", name, version);

        self.get_instance_info(name).inspect_err(|_| {
            log::warn!("LocalDB instance {} cannot be queried after creation, deleting it", name);
            if let Err(cleanup) = self.delete_instance_with(name, false, false) {
                log::warn!("Failed to delete LocalDB instance {}: {}", name, cleanup);
            }
        })
    }

    /// Return `name`, creating it with the latest version if needed.
    ///
    /// Default instance names are returned as soon as LocalDB knows them,
    /// since automatic instances are created by LocalDB on first use.
    pub fn get_or_create_instance(&self, name: &str) -> Result<InstanceInfo> {
        validate_instance_name(name)?;
        let info = self.get_instance_info(name)?;
        if info.exists || (is_default_instance_name(name) && info.is_automatic) {
            return Ok(info);
        }
        self.create_instance(name, None)
    }

    /// The default instance of the bound version.
    pub fn get_default_instance(&self) -> Result<InstanceInfo> {
        let name = self.default_instance_name();
        if name.is_empty() {
            return Err(self.translate(NativeStatus::NOT_INSTALLED, None));
        }
        self.get_or_create_instance(&name)
    }

    /// Delete `name`, removing its files if configured to.
    pub fn delete_instance(&self, name: &str) -> Result<()> {
        let delete_files = self.options().automatically_delete_instance_files;
        self.delete_instance_with(name, delete_files, true).map(|_| ())
    }

    /// Delete `name`.
    ///
    /// With `delete_files`, the instance folder below the instances root is
    /// removed too; the name is checked against traversal before any path is
    /// built. Returns `false` if the instance did not exist and
    /// `throw_if_not_found` is unset.
    pub fn delete_instance_with(
        &self,
        name: &str,
        delete_files: bool,
        throw_if_not_found: bool,
    ) -> Result<bool> {
        validate_instance_name(name)?;
        let folder = match (delete_files, self.instances_root()) {
            (true, Some(root)) => Some(resolve_instance_folder(root, name)?),
            (true, None) => {
                log::warn!(
                    "No instances root is known, files of LocalDB instance {} are kept",
                    name
                );
                None
            }
            (false, _) => None,
        };

        log::debug!("Deleting LocalDB instance {}", name);
        match self.api().delete_instance(name) {
            Ok(()) => {}
            Err(NativeStatus::UNKNOWN_INSTANCE) if !throw_if_not_found => {
                log::debug!("LocalDB instance {} does not exist", name);
                return Ok(false);
            }
            Err(status) => return Err(self.translate(status, Some(name))),
        }
        log::info!("Deleted LocalDB instance {}", name);

        if let Some(folder) = folder {
            delete_instance_files(&folder);
        }
        Ok(true)
    }
}
