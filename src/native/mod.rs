//! Discovery of and bindings to the SQL Server LocalDB instance API.
//!
//! - `catalog` lists installed versions (registry on Windows)
//! - `resolver` picks the library to load
//! - `binding` loads it and exposes the typed call surface
//! - `buffer` holds the UTF-16 helpers and the two-phase sizing protocol

mod binding;
mod buffer;
mod catalog;
mod resolver;
mod sid;
mod status;
mod version;

#[cfg(target_os = "windows")]
mod win_api;

#[cfg(test)]
pub(crate) mod fake;

use crate::instance::{InstanceInfo, StopInstanceOptions, VersionInfo};

pub use binding::NativeApiBinding;
pub use catalog::{list_versions, InstalledVersion, RegistryCatalog, StaticCatalog, VersionCatalog};
pub use resolver::{resolve, NotFound, ResolvedLibrary};
pub use sid::parse_sid;
pub use status::NativeStatus;
pub use version::{NativeVersion, ParseVersionError};

/// Result of a native call: the value, or the non-success status.
pub type NativeResult<T> = Result<T, NativeStatus>;

/// The LocalDB instance API.
///
/// Every method maps onto one native entry point (two calls for enumerations
/// and message formatting). When no library is bound, every method fails with
/// [`NativeStatus::NOT_INSTALLED`] without calling into native code.
pub trait NativeApi: Send + Sync {
    /// Version of the bound library, `None` when nothing is bound.
    fn version(&self) -> Option<NativeVersion>;

    /// Raw status of a zero-capacity `LocalDBGetVersions` call.
    fn probe(&self) -> NativeStatus;

    fn create_instance(&self, version: &str, name: &str) -> NativeResult<()>;

    fn delete_instance(&self, name: &str) -> NativeResult<()>;

    fn instance_info(&self, name: &str) -> NativeResult<InstanceInfo>;

    fn instance_names(&self) -> NativeResult<Vec<String>>;

    fn version_info(&self, version: &str) -> NativeResult<VersionInfo>;

    fn versions(&self) -> NativeResult<Vec<String>>;

    /// Share `name` under `shared_name`. `owner_sid` is a binary SID.
    fn share_instance(&self, owner_sid: &[u8], name: &str, shared_name: &str)
        -> NativeResult<()>;

    /// Start `name`, returning its named pipe.
    fn start_instance(&self, name: &str) -> NativeResult<String>;

    fn stop_instance(
        &self,
        name: &str,
        options: StopInstanceOptions,
        timeout_secs: u32,
    ) -> NativeResult<()>;

    fn start_tracing(&self) -> NativeResult<()>;

    fn stop_tracing(&self) -> NativeResult<()>;

    fn unshare_instance(&self, name: &str) -> NativeResult<()>;

    /// Localized text for `status`, truncated by LocalDB if necessary.
    fn format_message(&self, status: NativeStatus, language_id: u32) -> NativeResult<String>;
}
