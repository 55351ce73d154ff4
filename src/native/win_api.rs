//! Windows registry helpers for locating the LocalDB API library.

use windows::core::{HSTRING, PWSTR};
use windows::Win32::Foundation::{ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS};
use windows::Win32::System::Registry::{
    RegCloseKey, RegEnumKeyExW, RegGetValueW, RegOpenKeyExW, HKEY, HKEY_LOCAL_MACHINE, KEY_READ,
    RRF_RT_REG_SZ,
};

/// Name of the value holding the API library path under each version key.
const INSTANCE_API_PATH_VALUE: &str = "InstanceAPIPath";

/// Registry key names are limited to 255 characters.
const MAX_KEY_NAME_CHARS: usize = 256;

/// Upper bound on `InstanceAPIPath` size queries; the value may change between
/// the size query and the data fetch.
const VALUE_MAX_RETRIES: usize = 2;

/// Closes the wrapped key on drop.
struct OwnedKey(HKEY);

impl Drop for OwnedKey {
    fn drop(&mut self) {
        let _ = unsafe { RegCloseKey(self.0) };
    }
}

/// A 32-bit process on a 64-bit host must read the `Wow6432Node` branch.
fn is_wow64_process() -> bool {
    cfg!(target_pointer_width = "32") && std::env::var_os("PROCESSOR_ARCHITEW6432").is_some()
}

pub(crate) fn installed_versions_key_path() -> String {
    format!(
        r"SOFTWARE\{}Microsoft\Microsoft SQL Server Local DB\Installed Versions",
        if is_wow64_process() { r"Wow6432Node\" } else { "" }
    )
}

fn open_key(path: &str) -> Option<OwnedKey> {
    let mut key = HKEY::default();
    let ret = unsafe {
        RegOpenKeyExW(
            HKEY_LOCAL_MACHINE,
            &HSTRING::from(path),
            Some(0),
            KEY_READ,
            &mut key,
        )
    };
    if ret != ERROR_SUCCESS {
        log::debug!("RegOpenKeyExW failed for {}: {:?}", path, ret);
        return None;
    }
    Some(OwnedKey(key))
}

/// Sub-key names of the installed versions key, `None` if it does not exist.
pub(crate) fn installed_version_keys() -> Option<Vec<String>> {
    let path = installed_versions_key_path();
    let key = open_key(&path)?;

    let mut names = Vec::new();
    let mut index = 0u32;
    loop {
        let mut buffer = [0u16; MAX_KEY_NAME_CHARS];
        let mut len = buffer.len() as u32;
        let ret = unsafe {
            RegEnumKeyExW(
                key.0,
                index,
                Some(PWSTR(buffer.as_mut_ptr())),
                &mut len,
                None,
                None,
                None,
                None,
            )
        };
        if ret == ERROR_NO_MORE_ITEMS {
            break;
        }
        if ret != ERROR_SUCCESS {
            log::warn!("RegEnumKeyExW failed at index {} of {}: {:?}", index, path, ret);
            break;
        }
        let len = (len as usize).min(buffer.len());
        names.push(String::from_utf16_lossy(&buffer[..len]));
        index += 1;
    }

    Some(names)
}

/// Read the `InstanceAPIPath` string value below the version key `version_key`.
pub(crate) fn instance_api_path(version_key: &str) -> Option<String> {
    let key = open_key(&installed_versions_key_path())?;
    let sub_key = HSTRING::from(version_key);
    let value = HSTRING::from(INSTANCE_API_PATH_VALUE);

    for _ in 0..VALUE_MAX_RETRIES {
        // First call without a buffer reports the size in bytes, including the
        // terminating NUL.
        let mut size: u32 = 0;
        let ret = unsafe {
            RegGetValueW(key.0, &sub_key, &value, RRF_RT_REG_SZ, None, None, Some(&mut size))
        };
        if ret != ERROR_SUCCESS || size == 0 {
            return None;
        }

        let mut buffer = vec![0u16; (size as usize).div_ceil(2)];
        let ret = unsafe {
            RegGetValueW(
                key.0,
                &sub_key,
                &value,
                RRF_RT_REG_SZ,
                None,
                Some(buffer.as_mut_ptr().cast()),
                Some(&mut size),
            )
        };

        if ret == ERROR_SUCCESS {
            let chars = (size as usize / 2).min(buffer.len());
            let text = &buffer[..chars];
            let end = text.iter().position(|&c| c == 0).unwrap_or(text.len());
            return Some(String::from_utf16_lossy(&text[..end]));
        }

        // Value grew between the two calls.
        if ret != ERROR_MORE_DATA {
            return None;
        }
    }
    None
}
