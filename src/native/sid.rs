//! Conversion of textual security identifiers (`S-1-5-21-...`) to the binary
//! form accepted by `LocalDBShareInstance`.

use crate::error::{Result, SqlLocalDbError};

const MAX_SUB_AUTHORITIES: usize = 15;
const MAX_AUTHORITY: u64 = (1 << 48) - 1;

fn invalid(sid: &str, detail: &str) -> SqlLocalDbError {
    SqlLocalDbError::invalid_argument("owner_sid", format!("'{}' {}", sid, detail))
}

fn parse_authority(text: &str) -> Option<u64> {
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None if text.bytes().all(|b| b.is_ascii_digit()) => text.parse().ok()?,
        None => return None,
    };
    (value <= MAX_AUTHORITY).then_some(value)
}

/// Parse a string SID into its binary representation.
pub fn parse_sid(sid: &str) -> Result<Vec<u8>> {
    let trimmed = sid.trim();
    let mut parts = trimmed.split('-');

    if !parts.next().is_some_and(|p| p.eq_ignore_ascii_case("S")) {
        return Err(invalid(sid, "does not start with 'S-'"));
    }
    let revision: u8 = parts
        .next()
        .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| invalid(sid, "has an invalid revision"))?;
    if revision != 1 {
        return Err(invalid(sid, "has an unsupported revision"));
    }
    let authority = parts
        .next()
        .and_then(parse_authority)
        .ok_or_else(|| invalid(sid, "has an invalid identifier authority"))?;

    let mut sub_authorities = Vec::new();
    for part in parts {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(sid, "has an invalid sub-authority"));
        }
        let value: u32 = part
            .parse()
            .map_err(|_| invalid(sid, "has an out of range sub-authority"))?;
        sub_authorities.push(value);
    }
    if sub_authorities.len() > MAX_SUB_AUTHORITIES {
        return Err(invalid(sid, "has too many sub-authorities"));
    }

    let mut bytes = Vec::with_capacity(8 + 4 * sub_authorities.len());
    bytes.push(revision);
    bytes.push(sub_authorities.len() as u8);
    bytes.extend_from_slice(&authority.to_be_bytes()[2..]);
    for value in sub_authorities {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Ok(bytes)
}
