//! UTF-16 buffers shared with the LocalDB API.

use super::{NativeResult, NativeStatus};

/// Characters in an instance name buffer, including the terminating NUL.
pub const MAX_INSTANCE_NAME_CHARS: usize = 129;
/// Characters in a version string buffer, including the terminating NUL.
pub const MAX_VERSION_CHARS: usize = 44;
/// Characters in a connection string (named pipe) buffer, including the NUL.
pub const MAX_CONNECTION_CHARS: usize = 261;
/// Characters in a string SID buffer, including the NUL.
pub const MAX_SID_CHARS: usize = 187;

/// Encode `s` as a NUL-terminated UTF-16 string.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Decode UTF-16 text up to the first NUL (or the end of the slice).
pub fn from_wide(chars: &[u16]) -> String {
    let end = chars.iter().position(|&c| c == 0).unwrap_or(chars.len());
    String::from_utf16_lossy(&chars[..end])
}

/// An owned buffer of `count` fixed-width UTF-16 slots of `stride` characters.
#[derive(Debug)]
pub struct WideBuffer {
    data: Vec<u16>,
    stride: usize,
}

impl WideBuffer {
    pub fn new(stride: usize, count: usize) -> Self {
        Self {
            data: vec![0; stride.max(1) * count],
            stride: stride.max(1),
        }
    }

    pub fn as_mut_ptr(&mut self) -> *mut u16 {
        self.data.as_mut_ptr()
    }

    /// Total capacity in characters.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Decode the first `count` slots.
    pub fn entries(&self, count: usize) -> Vec<String> {
        self.data
            .chunks(self.stride)
            .take(count)
            .map(from_wide)
            .collect()
    }

    /// Decode the whole buffer as one string.
    pub fn text(&self) -> String {
        from_wide(&self.data)
    }
}

/// Run the size-then-fetch protocol against a native call.
///
/// `call` receives a buffer pointer and an in/out count. It is first invoked
/// with a null pointer and a count of zero, which must report either success
/// (nothing to return) or [`NativeStatus::INSUFFICIENT_BUFFER`] with the
/// required count. A buffer of that many `stride`-character slots is then
/// allocated for the second call. Any failure of the second call is returned
/// as is; there is no third attempt.
pub fn two_phase<F>(stride: usize, mut call: F) -> NativeResult<(WideBuffer, usize)>
where
    F: FnMut(*mut u16, &mut u32) -> NativeStatus,
{
    let mut count: u32 = 0;
    let status = call(std::ptr::null_mut(), &mut count);
    if status != NativeStatus::INSUFFICIENT_BUFFER {
        status.into_result()?;
    }
    if count == 0 {
        return Ok((WideBuffer::new(stride, 0), 0));
    }

    let mut buffer = WideBuffer::new(stride, count as usize);
    call(buffer.as_mut_ptr(), &mut count).into_result()?;
    let count = (count as usize).min(buffer.capacity() / stride.max(1));
    Ok((buffer, count))
}
