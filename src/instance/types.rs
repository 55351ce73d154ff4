//! Instance-related type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::native::NativeVersion;

/// State of a LocalDB instance as last reported by the native API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    pub name: String,
    pub exists: bool,
    /// Created automatically by the LocalDB installer.
    pub is_automatic: bool,
    pub is_running: bool,
    pub is_shared: bool,
    pub configuration_corrupt: bool,
    /// String SID of the owning user.
    pub owner_sid: String,
    /// Named pipe to connect to, empty unless running.
    pub named_pipe: String,
    pub shared_name: String,
    pub last_start_time_utc: Option<DateTime<Utc>>,
    pub version: Option<NativeVersion>,
}

impl InstanceInfo {
    /// Info for an instance that does not exist: all fields defaulted.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: false,
            is_automatic: false,
            is_running: false,
            is_shared: false,
            configuration_corrupt: false,
            owner_sid: String::new(),
            named_pipe: String::new(),
            shared_name: String::new(),
            last_start_time_utc: None,
            version: None,
        }
    }

    /// Copy every field of `other` into `self`. `None` is a no-op.
    pub fn refresh_from(&mut self, other: Option<&Self>) {
        if let Some(other) = other {
            self.clone_from(other);
        }
    }
}

/// An installed LocalDB version as reported by the native API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    /// The version name, e.g. `13.0`.
    pub name: String,
    pub exists: bool,
    pub version: Option<NativeVersion>,
}

impl VersionInfo {
    /// Copy every field of `other` into `self`. `None` is a no-op.
    pub fn refresh_from(&mut self, other: Option<&Self>) {
        if let Some(other) = other {
            self.clone_from(other);
        }
    }
}

/// How `stop_instance` shuts SQL Server down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopInstanceOptions {
    /// Kill the process instead of issuing `SHUTDOWN`.
    pub kill_process: bool,
    /// Issue `SHUTDOWN WITH NOWAIT`.
    pub no_wait: bool,
}

impl StopInstanceOptions {
    const KILL_PROCESS: u32 = 1;
    const NO_WAIT: u32 = 2;

    pub fn kill() -> Self {
        Self {
            kill_process: true,
            no_wait: false,
        }
    }

    pub fn no_wait() -> Self {
        Self {
            kill_process: false,
            no_wait: true,
        }
    }

    /// The native flag word.
    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.kill_process {
            bits |= Self::KILL_PROCESS;
        }
        if self.no_wait {
            bits |= Self::NO_WAIT;
        }
        bits
    }
}
