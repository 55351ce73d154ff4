//! Status codes returned by the LocalDB instance API.

use std::fmt;

/// A status code returned by a LocalDB API call. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeStatus(pub i32);

macro_rules! statuses {
    ($($(#[$doc:meta])* $name:ident = $code:literal;)*) => {
        impl NativeStatus {
            $(
                $(#[$doc])*
                pub const $name: Self = Self::from_hresult($code);
            )*

            /// Symbolic name of a known LocalDB status code.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    Self::SUCCESS => Some("SUCCESS"),
                    $(Self::$name => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

impl NativeStatus {
    pub const SUCCESS: Self = Self(0);

    const fn from_hresult(code: u32) -> Self {
        Self(code as i32)
    }

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    /// The raw signed status value.
    pub fn code(self) -> i32 {
        self.0
    }

    /// Convert a raw call result into a `Result`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

statuses! {
    CANNOT_CREATE_INSTANCE_FOLDER = 0x89c5_0100;
    INVALID_PARAMETER = 0x89c5_0101;
    /// The instance already exists with a lower version.
    INSTANCE_EXISTS_WITH_LOWER_VERSION = 0x89c5_0102;
    CANNOT_GET_USER_PROFILE_FOLDER = 0x89c5_0103;
    INSTANCE_FOLDER_PATH_TOO_LONG = 0x89c5_0104;
    CANNOT_ACCESS_INSTANCE_FOLDER = 0x89c5_0105;
    CANNOT_ACCESS_INSTANCE_REGISTRY = 0x89c5_0106;
    /// The instance does not exist.
    UNKNOWN_INSTANCE = 0x89c5_0107;
    /// Opaque failure inside LocalDB.
    INTERNAL_ERROR = 0x89c5_0108;
    CANNOT_MODIFY_INSTANCE_REGISTRY = 0x89c5_0109;
    SERVER_STARTUP_FAILED = 0x89c5_010a;
    INSTANCE_CONFIGURATION_CORRUPT = 0x89c5_010b;
    CANNOT_CREATE_SQL_PROCESS = 0x89c5_010c;
    UNKNOWN_VERSION = 0x89c5_010d;
    /// The language id passed to message formatting is not supported.
    UNKNOWN_LANGUAGE_ID = 0x89c5_010e;
    INSTANCE_STOP_FAILED = 0x89c5_010f;
    UNKNOWN_ERROR_CODE = 0x89c5_0110;
    VERSION_NOT_INSTALLED = 0x89c5_0111;
    /// The instance is in use and cannot be modified.
    INSTANCE_BUSY = 0x89c5_0112;
    INVALID_OPERATION = 0x89c5_0113;
    /// The supplied buffer is too small; the required size was written back.
    INSUFFICIENT_BUFFER = 0x89c5_0114;
    WAIT_TIMEOUT = 0x89c5_0115;
    /// LocalDB is not installed, or the API library could not be bound.
    NOT_INSTALLED = 0x89c5_0116;
    XEVENT_FAILED = 0x89c5_0117;
    AUTO_INSTANCE_CREATE_FAILED = 0x89c5_0118;
    SHARED_NAME_TAKEN = 0x89c5_0119;
    CALLER_IS_NOT_OWNER = 0x89c5_011a;
    INVALID_INSTANCE_NAME = 0x89c5_011b;
    INSTANCE_ALREADY_SHARED = 0x89c5_011c;
    INSTANCE_NOT_SHARED = 0x89c5_011d;
    ADMIN_RIGHTS_REQUIRED = 0x89c5_011e;
    TOO_MANY_SHARED_INSTANCES = 0x89c5_011f;
    CANNOT_GET_LOCAL_APP_DATA_PATH = 0x89c5_0120;
    CANNOT_LOAD_RESOURCES = 0x89c5_0121;
    DATA_DIRECTORY_MISSING = 0x89c5_0200;
    CANNOT_ACCESS_INSTANCE_FOLDER_DETAIL = 0x89c5_0201;
    DATA_DIRECTORY_IS_TOO_LONG = 0x89c5_0202;
    PARENT_INSTANCE_IS_MISSING = 0x89c5_0203;
    PARENT_INSTANCE_IS_TOO_LONG = 0x89c5_0204;
    DATA_DIRECTORY_INVALID = 0x89c5_0205;
    XEVENT_ASSERT = 0x89c5_0206;
    XEVENT_ERROR = 0x89c5_0207;
    INSTALLATION_CORRUPTED = 0x89c5_0208;
    CANNOT_GET_PROGRAM_FILES_LOCATION = 0x89c5_0209;
    CANNOT_INITIALIZE_XEVENT = 0x89c5_020a;
    CANNOT_FIND_XEVENT_CONFIG_FILE = 0x89c5_020b;
    CANNOT_CONFIGURE_XEVENT = 0x89c5_020c;
    XEVENT_CONFIG_FILE_TOO_LONG = 0x89c5_020d;
    CO_INITIALIZE_EX_FAILED = 0x89c5_020e;
    PARENT_INSTANCE_VERSION_INVALID = 0x89c5_020f;
    WINDOWS_API_ERROR = 0x89c5_0210;
    UNEXPECTED_RESULT = 0x89c5_0211;
}

impl fmt::Display for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0 as u32)
    }
}

impl From<i32> for NativeStatus {
    fn from(code: i32) -> Self {
        Self(code)
    }
}
