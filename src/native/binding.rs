//! Typed bindings to `SqlUserInstance.dll`.

use std::mem::size_of;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use libloading::Library;

use super::buffer::{
    from_wide, to_wide, two_phase, MAX_CONNECTION_CHARS, MAX_INSTANCE_NAME_CHARS,
    MAX_SID_CHARS, MAX_VERSION_CHARS,
};
use super::catalog::VersionCatalog;
use super::resolver::{resolve, ResolvedLibrary};
use super::{NativeApi, NativeResult, NativeStatus, NativeVersion};
use crate::instance::{InstanceInfo, StopInstanceOptions, VersionInfo};

/// Truncate messages that do not fit the buffer instead of failing.
const LOCALDB_TRUNCATE_ERR_MESSAGE: u32 = 1;

/// Characters in a connection string field of `LocalDBInstanceInfo`.
const CONNECTION_FIELD_CHARS: usize = MAX_CONNECTION_CHARS - 1;

/// Difference between the FILETIME epoch (1601) and the Unix epoch, in 100ns.
const FILETIME_UNIX_EPOCH: i64 = 116_444_736_000_000_000;
const FILETIME_TICKS_PER_SEC: i64 = 10_000_000;

type CreateInstanceFn = unsafe extern "system" fn(*const u16, *const u16, u32) -> i32;
type DeleteInstanceFn = unsafe extern "system" fn(*const u16, u32) -> i32;
type FormatMessageFn = unsafe extern "system" fn(i32, u32, u32, *mut u16, *mut u32) -> i32;
type GetInstanceInfoFn = unsafe extern "system" fn(*const u16, *mut RawInstanceInfo, u32) -> i32;
type GetInstancesFn = unsafe extern "system" fn(*mut u16, *mut u32) -> i32;
type GetVersionInfoFn = unsafe extern "system" fn(*const u16, *mut RawVersionInfo, u32) -> i32;
type GetVersionsFn = unsafe extern "system" fn(*mut u16, *mut u32) -> i32;
type ShareInstanceFn = unsafe extern "system" fn(*const u8, *const u16, *const u16, u32) -> i32;
type StartInstanceFn = unsafe extern "system" fn(*const u16, u32, *mut u16, *mut u32) -> i32;
type StopInstanceFn = unsafe extern "system" fn(*const u16, u32, u32) -> i32;
type TracingFn = unsafe extern "system" fn() -> i32;
type UnshareInstanceFn = unsafe extern "system" fn(*const u16, u32) -> i32;

/// Entry points resolved from the library by symbol name.
#[derive(Clone, Copy)]
pub(crate) struct FunctionTable {
    pub create_instance: CreateInstanceFn,
    pub delete_instance: DeleteInstanceFn,
    pub format_message: FormatMessageFn,
    pub get_instance_info: GetInstanceInfoFn,
    pub get_instances: GetInstancesFn,
    pub get_version_info: GetVersionInfoFn,
    pub get_versions: GetVersionsFn,
    pub share_instance: ShareInstanceFn,
    pub start_instance: StartInstanceFn,
    pub start_tracing: TracingFn,
    pub stop_instance: StopInstanceFn,
    pub stop_tracing: TracingFn,
    pub unshare_instance: UnshareInstanceFn,
}

macro_rules! symbol {
    ($library:expr, $name:literal, $ty:ty) => {{
        let name: &str = $name;
        let symbol = unsafe { $library.get::<$ty>(name.as_bytes()) };
        match symbol {
            Ok(symbol) => *symbol,
            Err(e) => {
                log::error!("LocalDB API function {} was not found: {}", name, e);
                return None;
            }
        }
    }};
}

impl FunctionTable {
    fn resolve(library: &Library) -> Option<Self> {
        Some(Self {
            create_instance: symbol!(library, "LocalDBCreateInstance", CreateInstanceFn),
            delete_instance: symbol!(library, "LocalDBDeleteInstance", DeleteInstanceFn),
            format_message: symbol!(library, "LocalDBFormatMessage", FormatMessageFn),
            get_instance_info: symbol!(library, "LocalDBGetInstanceInfo", GetInstanceInfoFn),
            get_instances: symbol!(library, "LocalDBGetInstances", GetInstancesFn),
            get_version_info: symbol!(library, "LocalDBGetVersionInfo", GetVersionInfoFn),
            get_versions: symbol!(library, "LocalDBGetVersions", GetVersionsFn),
            share_instance: symbol!(library, "LocalDBShareInstance", ShareInstanceFn),
            start_instance: symbol!(library, "LocalDBStartInstance", StartInstanceFn),
            start_tracing: symbol!(library, "LocalDBStartTracing", TracingFn),
            stop_instance: symbol!(library, "LocalDBStopInstance", StopInstanceFn),
            stop_tracing: symbol!(library, "LocalDBStopTracing", TracingFn),
            unshare_instance: symbol!(library, "LocalDBUnshareInstance", UnshareInstanceFn),
        })
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct RawFileTime {
    pub low: u32,
    pub high: u32,
}

/// `LocalDBInstanceInfo`.
#[repr(C)]
pub(crate) struct RawInstanceInfo {
    pub size: u32,
    pub name: [u16; MAX_INSTANCE_NAME_CHARS],
    pub exists: i32,
    pub configuration_corrupt: i32,
    pub is_running: i32,
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
    pub last_start_utc: RawFileTime,
    pub connection: [u16; CONNECTION_FIELD_CHARS],
    pub is_shared: i32,
    pub shared_name: [u16; MAX_INSTANCE_NAME_CHARS],
    pub owner_sid: [u16; MAX_SID_CHARS],
    pub is_automatic: i32,
}

impl RawInstanceInfo {
    pub(crate) fn zeroed() -> Self {
        Self {
            size: 0,
            name: [0; MAX_INSTANCE_NAME_CHARS],
            exists: 0,
            configuration_corrupt: 0,
            is_running: 0,
            major: 0,
            minor: 0,
            build: 0,
            revision: 0,
            last_start_utc: RawFileTime { low: 0, high: 0 },
            connection: [0; CONNECTION_FIELD_CHARS],
            is_shared: 0,
            shared_name: [0; MAX_INSTANCE_NAME_CHARS],
            owner_sid: [0; MAX_SID_CHARS],
            is_automatic: 0,
        }
    }

    fn into_info(self) -> InstanceInfo {
        let exists = self.exists != 0;
        InstanceInfo {
            name: from_wide(&self.name),
            exists,
            is_automatic: self.is_automatic != 0,
            is_running: self.is_running != 0,
            is_shared: self.is_shared != 0,
            configuration_corrupt: self.configuration_corrupt != 0,
            owner_sid: from_wide(&self.owner_sid),
            named_pipe: from_wide(&self.connection),
            shared_name: from_wide(&self.shared_name),
            last_start_time_utc: filetime_to_utc(self.last_start_utc),
            version: exists.then(|| {
                NativeVersion::with_build(self.major, self.minor, self.build, self.revision)
            }),
        }
    }
}

/// `LocalDBVersionInfo`.
#[repr(C)]
pub(crate) struct RawVersionInfo {
    pub size: u32,
    pub name: [u16; MAX_VERSION_CHARS],
    pub exists: i32,
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl RawVersionInfo {
    pub(crate) fn zeroed() -> Self {
        Self {
            size: 0,
            name: [0; MAX_VERSION_CHARS],
            exists: 0,
            major: 0,
            minor: 0,
            build: 0,
            revision: 0,
        }
    }

    fn into_info(self) -> VersionInfo {
        let exists = self.exists != 0;
        VersionInfo {
            name: from_wide(&self.name),
            exists,
            version: exists.then(|| {
                NativeVersion::with_build(self.major, self.minor, self.build, self.revision)
            }),
        }
    }
}

fn filetime_to_utc(ft: RawFileTime) -> Option<DateTime<Utc>> {
    let ticks = (u64::from(ft.high) << 32) | u64::from(ft.low);
    if ticks == 0 {
        return None;
    }
    let unix = i64::try_from(ticks).ok()? - FILETIME_UNIX_EPOCH;
    let secs = unix.div_euclid(FILETIME_TICKS_PER_SEC);
    let nanos = (unix.rem_euclid(FILETIME_TICKS_PER_SEC) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

struct Loaded {
    table: FunctionTable,
    // Keeps the entry points in `table` mapped.
    _library: Option<Library>,
}

/// The loaded LocalDB API.
///
/// Calls take a shared lock on the loaded table, so they may run concurrently
/// from several threads. [`release`](Self::release) unloads the library at
/// most once, waiting for in-flight calls; afterwards every call reports
/// [`NativeStatus::NOT_INSTALLED`].
pub struct NativeApiBinding {
    loaded: RwLock<Option<Loaded>>,
    released: AtomicBool,
    library: Option<ResolvedLibrary>,
}

impl NativeApiBinding {
    /// Resolve and load the API library listed in `catalog`.
    ///
    /// Never fails: if nothing can be resolved or loaded the binding is
    /// returned unloaded.
    pub fn load(catalog: &dyn VersionCatalog, override_version: Option<&str>) -> Self {
        let Ok(resolved) = resolve(catalog, override_version) else {
            return Self::unloaded();
        };

        let Some(library) = open_library(&resolved.path) else {
            return Self::unloaded();
        };

        let Some(table) = FunctionTable::resolve(&library) else {
            log::error!(
                "LocalDB API library {} is missing entry points",
                resolved.path.display()
            );
            return Self::unloaded();
        };

        log::info!(
            "Loaded SQL Server LocalDB API {} from {}",
            resolved.version,
            resolved.path.display()
        );
        Self {
            loaded: RwLock::new(Some(Loaded {
                table,
                _library: Some(library),
            })),
            released: AtomicBool::new(false),
            library: Some(resolved),
        }
    }

    /// A binding with no library: every call reports `NOT_INSTALLED`.
    pub fn unloaded() -> Self {
        Self {
            loaded: RwLock::new(None),
            released: AtomicBool::new(false),
            library: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_table(table: FunctionTable, version: NativeVersion) -> Self {
        Self {
            loaded: RwLock::new(Some(Loaded {
                table,
                _library: None,
            })),
            released: AtomicBool::new(false),
            library: Some(ResolvedLibrary {
                version,
                path: std::path::PathBuf::new(),
            }),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Path of the resolved library, if one was resolved and loaded.
    pub fn library_path(&self) -> Option<&Path> {
        self.library.as_ref().map(|lib| lib.path.as_path())
    }

    /// Unload the library. Further calls are no-ops.
    ///
    /// Returns `true` only for the call that unloaded it.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        let loaded = self
            .loaded
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if loaded.is_some() {
            log::info!("Unloaded SQL Server LocalDB API");
        }
        loaded.is_some()
    }

    fn with_table<T>(&self, call: impl FnOnce(&FunctionTable) -> NativeResult<T>) -> NativeResult<T> {
        let guard = self.loaded.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(loaded) => call(&loaded.table),
            None => Err(NativeStatus::NOT_INSTALLED),
        }
    }
}

impl Drop for NativeApiBinding {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(target_os = "windows")]
fn open_library(path: &Path) -> Option<Library> {
    use libloading::os::windows::{
        Library as WindowsLibrary, LOAD_LIBRARY_SEARCH_DEFAULT_DIRS,
        LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR,
    };

    let flags = LOAD_LIBRARY_SEARCH_DEFAULT_DIRS | LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR;
    match unsafe { WindowsLibrary::load_with_flags(path, flags) } {
        Ok(library) => Some(library.into()),
        Err(e) => {
            log::error!("Failed to load {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn open_library(path: &Path) -> Option<Library> {
    match unsafe { Library::new(path) } {
        Ok(library) => Some(library),
        Err(e) => {
            log::error!("Failed to load {}: {}", path.display(), e);
            None
        }
    }
}

impl NativeApi for NativeApiBinding {
    fn version(&self) -> Option<NativeVersion> {
        if !self.is_loaded() {
            return None;
        }
        self.library.as_ref().map(|lib| lib.version)
    }

    fn probe(&self) -> NativeStatus {
        let result = self.with_table(|t| {
            let mut count = 0u32;
            Ok(NativeStatus(unsafe {
                (t.get_versions)(std::ptr::null_mut(), &mut count)
            }))
        });
        result.unwrap_or_else(|status| status)
    }

    fn create_instance(&self, version: &str, name: &str) -> NativeResult<()> {
        let version = to_wide(version);
        let name = to_wide(name);
        self.with_table(|t| {
            NativeStatus(unsafe { (t.create_instance)(version.as_ptr(), name.as_ptr(), 0) })
                .into_result()
        })
    }

    fn delete_instance(&self, name: &str) -> NativeResult<()> {
        let name = to_wide(name);
        self.with_table(|t| {
            NativeStatus(unsafe { (t.delete_instance)(name.as_ptr(), 0) }).into_result()
        })
    }

    fn instance_info(&self, name: &str) -> NativeResult<InstanceInfo> {
        let name = to_wide(name);
        self.with_table(|t| {
            let mut raw = RawInstanceInfo::zeroed();
            NativeStatus(unsafe {
                (t.get_instance_info)(name.as_ptr(), &mut raw, size_of::<RawInstanceInfo>() as u32)
            })
            .into_result()?;
            Ok(raw.into_info())
        })
    }

    fn instance_names(&self) -> NativeResult<Vec<String>> {
        self.with_table(|t| {
            let (buffer, count) = two_phase(MAX_INSTANCE_NAME_CHARS, |ptr, count| {
                NativeStatus(unsafe { (t.get_instances)(ptr, count) })
            })?;
            Ok(buffer.entries(count))
        })
    }

    fn version_info(&self, version: &str) -> NativeResult<VersionInfo> {
        let version = to_wide(version);
        self.with_table(|t| {
            let mut raw = RawVersionInfo::zeroed();
            NativeStatus(unsafe {
                (t.get_version_info)(version.as_ptr(), &mut raw, size_of::<RawVersionInfo>() as u32)
            })
            .into_result()?;
            Ok(raw.into_info())
        })
    }

    fn versions(&self) -> NativeResult<Vec<String>> {
        self.with_table(|t| {
            let (buffer, count) = two_phase(MAX_VERSION_CHARS, |ptr, count| {
                NativeStatus(unsafe { (t.get_versions)(ptr, count) })
            })?;
            Ok(buffer.entries(count))
        })
    }

    fn share_instance(
        &self,
        owner_sid: &[u8],
        name: &str,
        shared_name: &str,
    ) -> NativeResult<()> {
        let name = to_wide(name);
        let shared_name = to_wide(shared_name);
        self.with_table(|t| {
            NativeStatus(unsafe {
                (t.share_instance)(owner_sid.as_ptr(), name.as_ptr(), shared_name.as_ptr(), 0)
            })
            .into_result()
        })
    }

    fn start_instance(&self, name: &str) -> NativeResult<String> {
        let name = to_wide(name);
        self.with_table(|t| {
            let mut buffer = [0u16; MAX_CONNECTION_CHARS];
            let mut size = buffer.len() as u32;
            NativeStatus(unsafe {
                (t.start_instance)(name.as_ptr(), 0, buffer.as_mut_ptr(), &mut size)
            })
            .into_result()?;
            Ok(from_wide(&buffer))
        })
    }

    fn stop_instance(
        &self,
        name: &str,
        options: StopInstanceOptions,
        timeout_secs: u32,
    ) -> NativeResult<()> {
        let name = to_wide(name);
        self.with_table(|t| {
            NativeStatus(unsafe { (t.stop_instance)(name.as_ptr(), options.bits(), timeout_secs) })
                .into_result()
        })
    }

    fn start_tracing(&self) -> NativeResult<()> {
        self.with_table(|t| NativeStatus(unsafe { (t.start_tracing)() }).into_result())
    }

    fn stop_tracing(&self) -> NativeResult<()> {
        self.with_table(|t| NativeStatus(unsafe { (t.stop_tracing)() }).into_result())
    }

    fn unshare_instance(&self, name: &str) -> NativeResult<()> {
        let name = to_wide(name);
        self.with_table(|t| {
            NativeStatus(unsafe { (t.unshare_instance)(name.as_ptr(), 0) }).into_result()
        })
    }

    fn format_message(&self, status: NativeStatus, language_id: u32) -> NativeResult<String> {
        self.with_table(|t| {
            // A truncating call never reports the needed size, so only the
            // sized fetch may truncate.
            let (buffer, _) = two_phase(1, |ptr, count| {
                let flags = if ptr.is_null() { 0 } else { LOCALDB_TRUNCATE_ERR_MESSAGE };
                NativeStatus(unsafe {
                    (t.format_message)(status.code(), flags, language_id, ptr, count)
                })
            })?;
            Ok(buffer.text().trim_end().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::atomic::AtomicU32;

    use super::*;
    use crate::native::StaticCatalog;

    const INSTANCES: [&str; 2] = ["MSSQLLocalDB", "Alpha"];
    const MESSAGE: &str = "The specified LocalDB instance does not exist.\r\n";

    thread_local! {
        static GET_INSTANCES_CALLS: Cell<u32> = const { Cell::new(0) };
    }

    unsafe fn write_wide(dest: *mut u16, text: &str) {
        let wide = to_wide(text);
        std::ptr::copy_nonoverlapping(wide.as_ptr(), dest, wide.len());
    }

    extern "system" fn create_instance(_: *const u16, _: *const u16, _: u32) -> i32 {
        0
    }

    extern "system" fn delete_instance(_: *const u16, _: u32) -> i32 {
        NativeStatus::INSTANCE_BUSY.code()
    }

    extern "system" fn format_message(
        status: i32,
        flags: u32,
        language_id: u32,
        buffer: *mut u16,
        size: *mut u32,
    ) -> i32 {
        if language_id != 0 {
            return NativeStatus::UNKNOWN_LANGUAGE_ID.code();
        }
        if status != NativeStatus::UNKNOWN_INSTANCE.code() {
            return NativeStatus::UNKNOWN_ERROR_CODE.code();
        }
        let message = to_wide(MESSAGE);
        unsafe {
            let capacity = if buffer.is_null() { 0 } else { *size as usize };
            if capacity >= message.len() {
                std::ptr::copy_nonoverlapping(message.as_ptr(), buffer, message.len());
                *size = message.len() as u32;
                return 0;
            }
            if flags & LOCALDB_TRUNCATE_ERR_MESSAGE == 0 {
                *size = message.len() as u32;
                return NativeStatus::INSUFFICIENT_BUFFER.code();
            }
            // Truncated to what fits, still NUL-terminated.
            if capacity > 0 {
                std::ptr::copy_nonoverlapping(message.as_ptr(), buffer, capacity - 1);
                *buffer.add(capacity - 1) = 0;
            }
            *size = capacity as u32;
        }
        0
    }

    extern "system" fn get_instance_info(
        name: *const u16,
        info: *mut RawInstanceInfo,
        size: u32,
    ) -> i32 {
        if size as usize != size_of::<RawInstanceInfo>() {
            return NativeStatus::INVALID_PARAMETER.code();
        }
        unsafe {
            let mut len = 0;
            while *name.add(len) != 0 {
                len += 1;
            }
            let info = &mut *info;
            std::ptr::copy_nonoverlapping(name, info.name.as_mut_ptr(), len);
            info.exists = 1;
            info.is_running = 1;
            info.major = 13;
            info.minor = 1;
            info.build = 4001;
            // 2020-01-01T00:00:00Z
            let ticks: u64 = 132_223_104_000_000_000;
            info.last_start_utc = RawFileTime {
                low: ticks as u32,
                high: (ticks >> 32) as u32,
            };
            write_wide(info.connection.as_mut_ptr(), r"np:\\.\pipe\LOCALDB#1\tsql\query");
        }
        0
    }

    extern "system" fn get_instances(buffer: *mut u16, count: *mut u32) -> i32 {
        GET_INSTANCES_CALLS.with(|calls| calls.set(calls.get() + 1));
        unsafe {
            if buffer.is_null() || (*count as usize) < INSTANCES.len() {
                *count = INSTANCES.len() as u32;
                return NativeStatus::INSUFFICIENT_BUFFER.code();
            }
            for (i, name) in INSTANCES.iter().enumerate() {
                write_wide(buffer.add(i * MAX_INSTANCE_NAME_CHARS), name);
            }
            *count = INSTANCES.len() as u32;
        }
        0
    }

    extern "system" fn get_version_info(
        _: *const u16,
        info: *mut RawVersionInfo,
        _: u32,
    ) -> i32 {
        unsafe {
            let info = &mut *info;
            write_wide(info.name.as_mut_ptr(), "13.0");
            info.exists = 1;
            info.major = 13;
        }
        0
    }

    extern "system" fn get_versions(_: *mut u16, count: *mut u32) -> i32 {
        unsafe { *count = 0 };
        0
    }

    extern "system" fn share_instance(_: *const u8, _: *const u16, _: *const u16, _: u32) -> i32 {
        0
    }

    extern "system" fn start_instance(_: *const u16, _: u32, buffer: *mut u16, size: *mut u32) -> i32 {
        unsafe {
            if (*size as usize) < MAX_CONNECTION_CHARS {
                return NativeStatus::INSUFFICIENT_BUFFER.code();
            }
            write_wide(buffer, r"np:\\.\pipe\LOCALDB#2\tsql\query");
        }
        0
    }

    extern "system" fn stop_instance(_: *const u16, flags: u32, timeout: u32) -> i32 {
        if flags == 1 && timeout == 5 {
            0
        } else {
            NativeStatus::INVALID_PARAMETER.code()
        }
    }

    extern "system" fn tracing() -> i32 {
        0
    }

    extern "system" fn unshare_instance(_: *const u16, _: u32) -> i32 {
        NativeStatus::INSTANCE_NOT_SHARED.code()
    }

    fn fake_binding() -> NativeApiBinding {
        let table = FunctionTable {
            create_instance,
            delete_instance,
            format_message,
            get_instance_info,
            get_instances,
            get_version_info,
            get_versions,
            share_instance,
            start_instance,
            start_tracing: tracing,
            stop_instance,
            stop_tracing: tracing,
            unshare_instance,
        };
        NativeApiBinding::from_table(table, NativeVersion::new(13, 0))
    }

    #[test]
    fn unloaded_binding_reports_not_installed() {
        let binding = NativeApiBinding::load(&StaticCatalog::missing(), None);
        assert!(!binding.is_loaded());
        assert_eq!(binding.version(), None);
        assert_eq!(binding.probe(), NativeStatus::NOT_INSTALLED);
        assert_eq!(binding.instance_names(), Err(NativeStatus::NOT_INSTALLED));
        assert_eq!(binding.start_instance("x"), Err(NativeStatus::NOT_INSTALLED));
        assert_eq!(
            binding.format_message(NativeStatus::UNKNOWN_INSTANCE, 0),
            Err(NativeStatus::NOT_INSTALLED)
        );
    }

    #[test]
    fn unloadable_file_yields_unloaded_binding() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("SqlUserInstance.dll");
        std::fs::write(&path, b"not a library").unwrap();
        let catalog = StaticCatalog::empty().with_version("13.0", path.to_string_lossy());

        let binding = NativeApiBinding::load(&catalog, None);
        assert!(!binding.is_loaded());
        assert_eq!(binding.versions(), Err(NativeStatus::NOT_INSTALLED));
    }

    #[test]
    fn enumerates_instances_in_two_calls() {
        let binding = fake_binding();
        let before = GET_INSTANCES_CALLS.with(Cell::get);
        assert_eq!(binding.instance_names().unwrap(), INSTANCES);
        assert_eq!(GET_INSTANCES_CALLS.with(Cell::get) - before, 2);
        assert_eq!(binding.versions().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn decodes_instance_info() {
        let info = fake_binding().instance_info("Alpha").unwrap();
        assert_eq!(info.name, "Alpha");
        assert!(info.exists && info.is_running);
        assert!(!info.is_shared);
        assert_eq!(info.version, Some(NativeVersion::with_build(13, 1, 4001, 0)));
        assert_eq!(info.named_pipe, r"np:\\.\pipe\LOCALDB#1\tsql\query");
        assert_eq!(
            info.last_start_time_utc.map(|t| t.to_rfc3339()),
            Some("2020-01-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn decodes_version_info() {
        let info = fake_binding().version_info("13.0").unwrap();
        assert_eq!(info.name, "13.0");
        assert_eq!(info.version, Some(NativeVersion::with_build(13, 0, 0, 0)));
    }

    #[test]
    fn forwards_arguments_and_statuses() {
        let binding = fake_binding();
        assert_eq!(binding.create_instance("13.0", "Alpha"), Ok(()));
        assert_eq!(binding.delete_instance("Alpha"), Err(NativeStatus::INSTANCE_BUSY));
        assert_eq!(
            binding.start_instance("Alpha").unwrap(),
            r"np:\\.\pipe\LOCALDB#2\tsql\query"
        );
        assert_eq!(binding.stop_instance("Alpha", StopInstanceOptions::kill(), 5), Ok(()));
        assert_eq!(
            binding.stop_instance("Alpha", StopInstanceOptions::default(), 5),
            Err(NativeStatus::INVALID_PARAMETER)
        );
        assert_eq!(binding.unshare_instance("Alpha"), Err(NativeStatus::INSTANCE_NOT_SHARED));
        assert_eq!(binding.share_instance(&[1, 0, 0, 0, 0, 0, 0, 5], "Alpha", "Shared"), Ok(()));
        assert_eq!(binding.start_tracing(), Ok(()));
        assert_eq!(binding.stop_tracing(), Ok(()));
        assert_eq!(binding.probe(), NativeStatus::SUCCESS);
    }

    #[test]
    fn formats_messages_in_two_calls() {
        let binding = fake_binding();
        assert_eq!(
            binding.format_message(NativeStatus::UNKNOWN_INSTANCE, 0).unwrap(),
            "The specified LocalDB instance does not exist."
        );
        assert_eq!(
            binding.format_message(NativeStatus::UNKNOWN_INSTANCE, 1033),
            Err(NativeStatus::UNKNOWN_LANGUAGE_ID)
        );
    }

    #[test]
    fn sizes_messages_before_truncating() {
        let mut buffer = [0u16; 8];
        let mut size = 0u32;
        let status = format_message(
            NativeStatus::UNKNOWN_INSTANCE.code(),
            LOCALDB_TRUNCATE_ERR_MESSAGE,
            0,
            buffer.as_mut_ptr(),
            &mut size,
        );
        assert_eq!(status, 0);
        assert_eq!(from_wide(&buffer), "");

        let translated = crate::translator::translate(
            &fake_binding(),
            NativeStatus::UNKNOWN_INSTANCE,
            0,
            Some("X"),
        );
        assert_eq!(
            translated.to_string(),
            "[0x89C50107] The specified LocalDB instance does not exist. (instance: X)"
        );
    }

    #[test]
    fn release_is_idempotent() {
        let binding = fake_binding();
        assert_eq!(binding.version(), Some(NativeVersion::new(13, 0)));
        assert!(binding.release());
        assert!(!binding.release());
        assert!(!binding.is_loaded());
        assert_eq!(binding.version(), None);
        assert_eq!(binding.instance_names(), Err(NativeStatus::NOT_INSTALLED));
        drop(binding);
    }

    #[test]
    fn concurrent_release_unloads_once() {
        let binding = fake_binding();
        let unloads = AtomicU32::new(0);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        match binding.instance_names() {
                            Ok(names) => assert_eq!(names, INSTANCES),
                            Err(status) => assert_eq!(status, NativeStatus::NOT_INSTALLED),
                        }
                    }
                });
            }
            for _ in 0..4 {
                scope.spawn(|| {
                    if binding.release() {
                        unloads.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(unloads.load(Ordering::SeqCst), 1);
        assert!(!binding.is_loaded());
        assert_eq!(binding.instance_names(), Err(NativeStatus::NOT_INSTALLED));
        drop(binding);
    }

    #[test]
    fn filetime_conversion() {
        assert_eq!(filetime_to_utc(RawFileTime { low: 0, high: 0 }), None);
        let epoch = FILETIME_UNIX_EPOCH as u64;
        let converted = filetime_to_utc(RawFileTime {
            low: epoch as u32,
            high: (epoch >> 32) as u32,
        });
        assert_eq!(converted.map(|t| t.timestamp()), Some(0));
    }
}
