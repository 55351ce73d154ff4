//! Conversion of native status codes into [`SqlLocalDbError`]s.

use crate::error::{ErrorKind, SqlLocalDbError};
use crate::native::{NativeApi, NativeStatus};

/// Language id meaning "let LocalDB pick".
const DEFAULT_LANGUAGE: u32 = 0;

fn generic_message(status: NativeStatus) -> String {
    format!(
        "An error occurred with SQL Server LocalDB. HRESULT = {}",
        status
    )
}

/// Look up the LocalDB message for `status`.
///
/// An unsupported `language_id` is retried once with the default language.
/// Returns `None` if no message could be formatted.
pub fn format_message<A: NativeApi + ?Sized>(
    api: &A,
    status: NativeStatus,
    language_id: u32,
) -> Option<String> {
    match api.format_message(status, language_id) {
        Ok(message) => Some(message),
        Err(NativeStatus::UNKNOWN_LANGUAGE_ID) if language_id != DEFAULT_LANGUAGE => {
            log::debug!(
                "LocalDB does not support language {}, formatting {} with the default language",
                language_id,
                status
            );
            format_message(api, status, DEFAULT_LANGUAGE)
        }
        Err(format_status) => {
            log::warn!(
                "Failed to get the LocalDB message for {}: {}",
                status,
                format_status
            );
            None
        }
    }
}

/// Build the error for a failed native call.
///
/// The result always carries `status`; failures while formatting the message
/// only degrade the message text.
pub fn translate<A: NativeApi + ?Sized>(
    api: &A,
    status: NativeStatus,
    language_id: u32,
    instance_name: Option<&str>,
) -> SqlLocalDbError {
    let message = if status == NativeStatus::NOT_INSTALLED {
        "SQL Server LocalDB is not installed.".to_string()
    } else {
        format_message(api, status, language_id)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| generic_message(status))
    };

    let kind = ErrorKind::from_status(status);
    log::debug!("LocalDB call failed with {} ({:?})", status, kind);

    let err = SqlLocalDbError::new(kind, message).with_status(status);
    match instance_name {
        Some(name) => err.with_instance(name),
        None => err,
    }
}
