//! Enumeration of installed LocalDB API versions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::NativeVersion;

/// A key-value store listing installed LocalDB versions.
///
/// On Windows this is the registry key
/// `HKLM\SOFTWARE\Microsoft\Microsoft SQL Server Local DB\Installed Versions`.
pub trait VersionCatalog {
    /// Sub-key names under the versions root, or `None` if the root is missing.
    fn version_keys(&self) -> Option<Vec<String>>;

    /// The `InstanceAPIPath` value stored under `key`.
    fn library_path(&self, key: &str) -> Option<String>;
}

/// One parseable entry of a [`VersionCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    /// The key name exactly as stored.
    pub key: String,
    pub version: NativeVersion,
    /// The library path, `None` when the value is missing or empty.
    pub path: Option<PathBuf>,
}

/// List the parseable versions of `catalog` in enumeration order.
///
/// Unparseable key names are logged and skipped. A missing root yields an
/// empty list.
pub fn list_versions(catalog: &dyn VersionCatalog) -> Vec<InstalledVersion> {
    let Some(keys) = catalog.version_keys() else {
        log::info!("LocalDB installed versions key was not found");
        return Vec::new();
    };

    keys.into_iter()
        .filter_map(|key| {
            let Some(version) = NativeVersion::parse(&key) else {
                log::warn!("Ignoring invalid LocalDB version key '{}'", key);
                return None;
            };
            let path = catalog
                .library_path(&key)
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from);
            Some(InstalledVersion { key, version, path })
        })
        .collect()
}

/// The registry of the current machine, read from the root appropriate to the
/// process bitness.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryCatalog;

impl RegistryCatalog {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "windows")]
impl VersionCatalog for RegistryCatalog {
    fn version_keys(&self) -> Option<Vec<String>> {
        super::win_api::installed_version_keys()
    }

    fn library_path(&self, key: &str) -> Option<String> {
        super::win_api::instance_api_path(key)
    }
}

#[cfg(not(target_os = "windows"))]
impl VersionCatalog for RegistryCatalog {
    fn version_keys(&self) -> Option<Vec<String>> {
        None
    }

    fn library_path(&self, _key: &str) -> Option<String> {
        None
    }
}

/// An in-memory catalog, for explicit configuration and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    entries: Option<BTreeMap<String, String>>,
    order: Vec<String>,
}

impl StaticCatalog {
    /// A catalog whose root key does not exist.
    pub fn missing() -> Self {
        Self::default()
    }

    /// An existing but empty catalog.
    pub fn empty() -> Self {
        Self {
            entries: Some(BTreeMap::new()),
            order: Vec::new(),
        }
    }

    /// Add a version key with its library path (may be empty).
    pub fn with_version(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        let key = key.into();
        let entries = self.entries.get_or_insert_with(BTreeMap::new);
        if entries.insert(key.clone(), path.into()).is_none() {
            self.order.push(key);
        }
        self
    }
}

impl VersionCatalog for StaticCatalog {
    fn version_keys(&self) -> Option<Vec<String>> {
        self.entries.as_ref().map(|_| self.order.clone())
    }

    fn library_path(&self, key: &str) -> Option<String> {
        self.entries.as_ref()?.get(key).cloned()
    }
}
