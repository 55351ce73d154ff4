//! Selection of the LocalDB API library to bind.

use std::fmt;
use std::path::{Path, PathBuf};

use super::catalog::{list_versions, InstalledVersion, VersionCatalog};
use super::NativeVersion;

/// The library chosen for binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLibrary {
    pub version: NativeVersion,
    /// Absolute path of the API library.
    pub path: PathBuf,
}

/// Why no library could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    /// The catalog holds no parseable version keys.
    NoVersions,
    /// Versions exist but none names a library path.
    NoPath,
    /// The selected version's library file does not exist.
    LibraryMissing { version: NativeVersion, path: PathBuf },
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoVersions => write!(f, "no installed LocalDB versions were found"),
            Self::NoPath => write!(f, "no installed LocalDB version has an API library path"),
            Self::LibraryMissing { version, path } => write!(
                f,
                "the LocalDB {} API library {} does not exist",
                version,
                path.display()
            ),
        }
    }
}

/// Choose the library to load from `catalog`.
///
/// Only versions with a library path are candidates. `override_version`
/// selects the entry whose key matches it case-insensitively; otherwise (or
/// if no entry matches) the highest version wins, the first one enumerated
/// breaking ties.
pub fn resolve(
    catalog: &dyn VersionCatalog,
    override_version: Option<&str>,
) -> Result<ResolvedLibrary, NotFound> {
    let override_version = override_version.map(str::trim).filter(|v| !v.is_empty());
    let installed = list_versions(catalog);
    if installed.is_empty() {
        log::warn!("SQL Server LocalDB API not found: {}", NotFound::NoVersions);
        return Err(NotFound::NoVersions);
    }

    let mut latest: Option<(&InstalledVersion, &Path)> = None;
    let mut overridden: Option<(&InstalledVersion, &Path)> = None;

    for entry in &installed {
        let Some(path) = entry.path.as_deref() else {
            log::debug!("LocalDB version {} has no API library path", entry.key);
            continue;
        };

        if let Some(wanted) = override_version {
            if overridden.is_none() && entry.key.eq_ignore_ascii_case(wanted) {
                log::info!(
                    "LocalDB API version {} selected by the configured override",
                    entry.version
                );
                overridden = Some((entry, path));
            }
        }

        if latest.is_none_or(|(best, _)| best.version < entry.version) {
            latest = Some((entry, path));
        }
    }

    if let Some(wanted) = override_version {
        if overridden.is_none() {
            log::info!(
                "LocalDB API override version {} was not found, using the latest version",
                wanted
            );
        }
    }

    let Some((entry, path)) = overridden.or(latest) else {
        log::warn!("SQL Server LocalDB API not found: {}", NotFound::NoPath);
        return Err(NotFound::NoPath);
    };

    if !path.is_file() {
        let missing = NotFound::LibraryMissing {
            version: entry.version,
            path: path.to_path_buf(),
        };
        log::warn!("SQL Server LocalDB API not found: {}", missing);
        return Err(missing);
    }

    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    Ok(ResolvedLibrary {
        version: entry.version,
        path,
    })
}
