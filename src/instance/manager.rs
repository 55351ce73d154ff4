//! The instance manager and its version queries.

use std::path::{Path, PathBuf};

use crate::config::SqlLocalDbOptions;
use crate::error::{Result, SqlLocalDbError};
use crate::native::{
    NativeApi, NativeApiBinding, NativeResult, NativeStatus, NativeVersion, RegistryCatalog,
    VersionCatalog,
};
use crate::paths::default_instances_root;
use crate::translator::translate;

use super::handle::InstanceHandle;
use super::temporary::TemporaryInstance;
use super::types::{InstanceInfo, VersionInfo};

/// Default instance name of LocalDB 2014 and later.
pub const AUTOMATIC_INSTANCE_NAME: &str = "MSSQLLocalDB";

/// First major version whose default instance is [`AUTOMATIC_INSTANCE_NAME`].
const AUTOMATIC_INSTANCE_MIN_MAJOR: u32 = 12;

/// True for `MSSQLLocalDB` and the `vNN.N` names of older versions.
pub fn is_default_instance_name(name: &str) -> bool {
    if name.eq_ignore_ascii_case(AUTOMATIC_INSTANCE_NAME) {
        return true;
    }
    name.strip_prefix(['v', 'V'])
        .and_then(NativeVersion::parse)
        .is_some_and(|v| v.build().is_none())
}

/// Manages LocalDB instances through one binding of the native API.
///
/// The binding is released when the manager is dropped.
pub struct InstanceManager<A = NativeApiBinding> {
    api: A,
    options: SqlLocalDbOptions,
    instances_root: Option<PathBuf>,
}

impl InstanceManager<NativeApiBinding> {
    /// Bind the LocalDB API listed in the registry.
    pub fn new(options: SqlLocalDbOptions) -> Self {
        Self::with_catalog(options, &RegistryCatalog::new())
    }

    /// Bind the LocalDB API listed in `catalog`.
    pub fn with_catalog(options: SqlLocalDbOptions, catalog: &dyn VersionCatalog) -> Self {
        let api = NativeApiBinding::load(catalog, options.override_version());
        Self::with_api(api, options)
    }

    /// Unload the native API early. Later calls fail with `NotInstalled`.
    pub fn release(&self) {
        self.api.release();
    }
}

impl<A: NativeApi> InstanceManager<A> {
    pub fn with_api(api: A, options: SqlLocalDbOptions) -> Self {
        let instances_root = options
            .instances_root
            .clone()
            .or_else(default_instances_root);
        Self {
            api,
            options,
            instances_root,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn options(&self) -> &SqlLocalDbOptions {
        &self.options
    }

    /// Root of the per-instance folders, if one could be determined.
    pub fn instances_root(&self) -> Option<&Path> {
        self.instances_root.as_deref()
    }

    /// True unless LocalDB reports that it is not installed.
    pub fn is_installed(&self) -> bool {
        self.api.probe() != NativeStatus::NOT_INSTALLED
    }

    /// Version of the bound LocalDB API.
    pub fn native_version(&self) -> Option<NativeVersion> {
        self.api.version()
    }

    /// Name of the default instance of the bound API version.
    ///
    /// LocalDB 2012 (11.x) names it `v11.0`; later versions use
    /// `MSSQLLocalDB`. Empty when nothing is bound.
    ///
    /// An installation whose API reports 12.0 but that still names the
    /// default instance `v12.0` is not detected here: this returns
    /// `MSSQLLocalDB` for it, and lookups of that name report it missing.
    pub fn default_instance_name(&self) -> String {
        match self.api.version() {
            None => String::new(),
            Some(v) if v.major() < AUTOMATIC_INSTANCE_MIN_MAJOR => {
                format!("v{}.{}", v.major(), v.minor())
            }
            Some(_) => AUTOMATIC_INSTANCE_NAME.to_string(),
        }
    }

    pub(crate) fn translate(&self, status: NativeStatus, instance_name: Option<&str>) -> SqlLocalDbError {
        translate(&self.api, status, self.options.language_id, instance_name)
    }

    /// Turn a native result into a crate result, logging failures.
    pub(crate) fn check<T>(
        &self,
        operation: &str,
        instance_name: Option<&str>,
        result: NativeResult<T>,
    ) -> Result<T> {
        result.map_err(|status| {
            let err = self.translate(status, instance_name);
            log::warn!("LocalDB {} failed: {}", operation, err);
            err
        })
    }

    /// Names of the installed LocalDB versions, as LocalDB reports them.
    pub fn versions(&self) -> Result<Vec<String>> {
        let result = self.api.versions();
        self.check("version enumeration", None, result)
    }

    pub fn get_version_info(&self, version: &str) -> Result<VersionInfo> {
        crate::validation::require_non_empty("version", version)?;
        let result = self.api.version_info(version);
        self.check("version query", None, result)
    }

    /// Installed versions, newest first.
    pub fn get_versions(&self) -> Result<Vec<VersionInfo>> {
        let mut infos = self
            .versions()?
            .iter()
            .map(|name| self.get_version_info(name))
            .collect::<Result<Vec<_>>>()?;
        infos.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(infos)
    }

    /// Name of the newest installed version.
    pub fn latest_version(&self) -> Result<String> {
        self.get_versions()?
            .into_iter()
            .find(|v| v.exists)
            .map(|v| v.name)
            .ok_or_else(SqlLocalDbError::no_versions)
    }

    pub fn start_tracing(&self) -> Result<()> {
        log::debug!("Starting LocalDB tracing");
        let result = self.api.start_tracing();
        self.check("start tracing", None, result)?;
        log::info!("Started LocalDB tracing");
        Ok(())
    }

    pub fn stop_tracing(&self) -> Result<()> {
        log::debug!("Stopping LocalDB tracing");
        let result = self.api.stop_tracing();
        self.check("stop tracing", None, result)?;
        log::info!("Stopped LocalDB tracing");
        Ok(())
    }

    /// Wrap `info` in a handle that drives that one instance.
    pub fn manage(&self, info: InstanceInfo) -> InstanceHandle<'_, A> {
        InstanceHandle::new(self, info)
    }

    /// Create and start a uniquely named instance that is deleted on drop.
    pub fn create_temporary_instance(&self, delete_files: bool) -> Result<TemporaryInstance<'_, A>> {
        TemporaryInstance::create(self, None, delete_files)
    }
}
