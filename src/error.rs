//! Crate error types.

use std::fmt;

use serde::Serialize;

use crate::native::NativeStatus;

/// Error raised by LocalDB operations.
///
/// Carries the native status code (when the failure came from LocalDB) and
/// the name of the instance the failing operation targeted, so callers can
/// branch on [`SqlLocalDbError::status`] without matching on the message.
#[derive(Debug)]
pub struct SqlLocalDbError {
    kind: ErrorKind,
    status: Option<NativeStatus>,
    instance_name: Option<String>,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No LocalDB API library is bound
    NotInstalled,
    /// A required argument was missing or malformed
    InvalidArgument,
    /// The instance does not exist
    UnknownInstance,
    /// The instance or shared name is structurally invalid
    InvalidName,
    /// The instance already exists
    AlreadyExists,
    /// The instance is not shared
    NotShared,
    /// The instance is in use
    Busy,
    /// Opaque LocalDB failure
    InternalError,
    /// A scoped resource was used after disposal
    AlreadyDisposed,
    /// No LocalDB versions are installed
    NoVersions,
    /// Any other LocalDB failure status
    Native,
    /// Configuration error
    Config,
    /// File system error
    Io,
}

impl ErrorKind {
    pub fn code(&self) -> u32 {
        match self {
            Self::NotInstalled => 1001,
            Self::InvalidArgument => 1002,
            Self::UnknownInstance => 1003,
            Self::InvalidName => 1004,
            Self::AlreadyExists => 1005,
            Self::NotShared => 1006,
            Self::Busy => 1007,
            Self::InternalError => 1008,
            Self::AlreadyDisposed => 1009,
            Self::NoVersions => 1010,
            Self::Native => 1099,
            Self::Config => 2001,
            Self::Io => 2002,
        }
    }

    /// Classify a non-success native status.
    pub fn from_status(status: NativeStatus) -> Self {
        match status {
            NativeStatus::NOT_INSTALLED => Self::NotInstalled,
            NativeStatus::INVALID_PARAMETER => Self::InvalidArgument,
            NativeStatus::UNKNOWN_INSTANCE => Self::UnknownInstance,
            NativeStatus::INVALID_INSTANCE_NAME => Self::InvalidName,
            NativeStatus::INSTANCE_EXISTS_WITH_LOWER_VERSION => Self::AlreadyExists,
            NativeStatus::INSTANCE_NOT_SHARED => Self::NotShared,
            NativeStatus::INSTANCE_BUSY => Self::Busy,
            NativeStatus::INTERNAL_ERROR => Self::InternalError,
            _ => Self::Native,
        }
    }
}

impl SqlLocalDbError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            instance_name: None,
            message: message.into(),
            source: None,
        }
    }

    /// Error for a failed native call, classified from its status.
    pub fn native(status: NativeStatus, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::from_status(status), message).with_status(status)
    }

    pub fn with_status(mut self, status: NativeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_instance(mut self, instance_name: impl Into<String>) -> Self {
        self.instance_name = Some(instance_name.into());
        self
    }

    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Wrap `self` in a new error with `message`, keeping kind, status and
    /// instance name. The original becomes the `source()`.
    pub fn context(self, message: impl Into<String>) -> Self {
        Self {
            kind: self.kind,
            status: self.status,
            instance_name: self.instance_name.clone(),
            message: message.into(),
            source: None,
        }
        .with_source(self)
    }

    pub fn invalid_argument(parameter: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidArgument,
            format!("invalid argument '{}': {}", parameter, detail),
        )
    }

    pub fn invalid_name(name: &str) -> Self {
        Self::new(
            ErrorKind::InvalidName,
            format!("'{}' is not a valid instance name", name),
        )
        .with_status(NativeStatus::INVALID_INSTANCE_NAME)
        .with_instance(name)
    }

    pub fn already_exists(name: &str) -> Self {
        Self::new(
            ErrorKind::AlreadyExists,
            format!("instance '{}' already exists", name),
        )
        .with_instance(name)
    }

    pub fn already_disposed(what: &str) -> Self {
        Self::new(
            ErrorKind::AlreadyDisposed,
            format!("{} has already been disposed", what),
        )
    }

    pub fn no_versions() -> Self {
        Self::new(
            ErrorKind::NoVersions,
            "no versions of SQL Server LocalDB are installed",
        )
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The native status code, if the failure came from LocalDB.
    pub fn status(&self) -> Option<NativeStatus> {
        self.status
    }

    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the native status equals `status`.
    pub fn has_status(&self, status: NativeStatus) -> bool {
        self.status == Some(status)
    }
}

impl fmt::Display for SqlLocalDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "[{}] ", status)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(name) = &self.instance_name {
            write!(f, " (instance: {})", name)?;
        }
        Ok(())
    }
}

impl std::error::Error for SqlLocalDbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl Serialize for SqlLocalDbError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct as _;
        let mut s = serializer.serialize_struct("SqlLocalDbError", 5)?;
        s.serialize_field("kind", &self.kind)?;
        s.serialize_field("code", &self.kind.code())?;
        s.serialize_field("status", &self.status.map(|status| status.to_string()))?;
        s.serialize_field("instance", &self.instance_name)?;
        s.serialize_field("message", &self.message)?;
        s.end()
    }
}

impl From<std::io::Error> for SqlLocalDbError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<toml::de::Error> for SqlLocalDbError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::ser::Error> for SqlLocalDbError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(err.to_string())
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, SqlLocalDbError>;
