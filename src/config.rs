use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SqlLocalDbError};
use crate::instance::StopInstanceOptions;

const DEFAULT_STOP_TIMEOUT_SECS: u64 = 60;

/// Options for an [`InstanceManager`](crate::InstanceManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlLocalDbOptions {
    /// Remove instance folders when instances are deleted.
    pub automatically_delete_instance_files: bool,
    /// LCID for LocalDB error messages. 0 lets LocalDB pick.
    pub language_id: u32,
    /// Bind this LocalDB version (e.g. `"13.0"`) instead of the latest one.
    pub native_api_override_version: String,
    #[serde(
        serialize_with = "serialize_secs",
        deserialize_with = "deserialize_secs"
    )]
    pub stop_timeout: Duration,
    /// Root of the per-instance folders. Defaults to the LocalDB location
    /// under the local application data directory.
    pub instances_root: Option<PathBuf>,
    pub stop_options: StopInstanceOptions,
}

impl Default for SqlLocalDbOptions {
    fn default() -> Self {
        Self {
            automatically_delete_instance_files: false,
            language_id: 0,
            native_api_override_version: String::new(),
            stop_timeout: Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
            instances_root: None,
            stop_options: StopInstanceOptions::default(),
        }
    }
}

fn serialize_secs<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

fn deserialize_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

impl SqlLocalDbOptions {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SqlLocalDbError::config(e.to_string()))
    }

    /// Load options from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No options file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            SqlLocalDbError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SqlLocalDbError::config(e.to_string()))
    }

    /// The resolver override, `None` when unset.
    pub(crate) fn override_version(&self) -> Option<&str> {
        let version = self.native_api_override_version.trim();
        (!version.is_empty()).then_some(version)
    }
}

/// `timeout` in whole seconds as LocalDB expects it, saturating at `u32::MAX`.
pub(crate) fn timeout_secs(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn defaults() {
        let options = SqlLocalDbOptions::default();
        assert!(!options.automatically_delete_instance_files);
        assert_eq!(options.stop_timeout, Duration::from_secs(60));
        assert_eq!(options.override_version(), None);
    }

    #[test]
    fn timeouts_are_whole_saturating_seconds() {
        assert_eq!(timeout_secs(Duration::from_secs(60)), 60);
        assert_eq!(timeout_secs(Duration::from_millis(1999)), 1);
        assert_eq!(timeout_secs(Duration::from_secs(u64::MAX)), u32::MAX);
    }

    #[test]
    fn parses_partial_toml() {
        let options = SqlLocalDbOptions::from_toml_str(
            r#"
            language_id = 1033
            native_api_override_version = " 11.0 "
            stop_timeout = 5

            [stop_options]
            kill_process = true
            "#,
        )
        .unwrap();
        assert_eq!(options.language_id, 1033);
        assert_eq!(options.override_version(), Some("11.0"));
        assert_eq!(options.stop_timeout, Duration::from_secs(5));
        assert!(options.stop_options.kill_process);
        assert!(!options.stop_options.no_wait);
        assert!(options.instances_root.is_none());
    }

    #[test]
    fn round_trips_through_toml() {
        let options = SqlLocalDbOptions {
            automatically_delete_instance_files: true,
            instances_root: Some(PathBuf::from("/tmp/instances")),
            ..SqlLocalDbOptions::default()
        };
        let text = options.to_toml_string().unwrap();
        assert!(text.contains("stop_timeout = 60"));
        assert_eq!(SqlLocalDbOptions::from_toml_str(&text).unwrap(), options);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let options = SqlLocalDbOptions::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(options, SqlLocalDbOptions::default());
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.toml");
        fs::write(&path, "stop_timeout = \"soon\"").unwrap();
        let err = SqlLocalDbOptions::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
