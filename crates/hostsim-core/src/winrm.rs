//! Little-endian 64-bit field encoding for WinRM frames.
//!
//! Scripts hand over 64-bit quantities either as plain numbers or as
//! decimal strings (JavaScript `bigint` values do not survive JSON as
//! numbers). Everything is reduced modulo 2^64 before it is written.

use crate::error::{EmulatorError, Result};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::str::FromStr;

/// Width of an encoded field in bytes.
pub const UINT64_LEN: usize = 8;

/// An unsigned value already reduced modulo 2^64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Uint64Value(u64);

impl Uint64Value {
    /// The reduced value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse an arbitrarily long decimal string, reducing modulo 2^64.
    ///
    /// A trailing `n` (bigint literal suffix) and surrounding whitespace
    /// are accepted.
    pub fn parse_decimal(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let digits = trimmed.strip_suffix('n').unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(EmulatorError::invalid("integer value is empty"));
        }

        let mut acc: u64 = 0;
        for byte in digits.bytes() {
            if !byte.is_ascii_digit() {
                return Err(EmulatorError::invalid(format!(
                    "not an unsigned decimal integer: {input:?}"
                )));
            }
            // Wrapping arithmetic is arithmetic in Z/2^64.
            acc = acc.wrapping_mul(10).wrapping_add(u64::from(byte - b'0'));
        }
        Ok(Self(acc))
    }
}

impl fmt::Display for Uint64Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uint64Value {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_decimal(s)
    }
}

impl From<u8> for Uint64Value {
    fn from(value: u8) -> Self {
        Self(u64::from(value))
    }
}

impl From<u16> for Uint64Value {
    fn from(value: u16) -> Self {
        Self(u64::from(value))
    }
}

impl From<u32> for Uint64Value {
    fn from(value: u32) -> Self {
        Self(u64::from(value))
    }
}

impl From<u64> for Uint64Value {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u128> for Uint64Value {
    fn from(value: u128) -> Self {
        // Truncation keeps the low 64 bits.
        Self(value as u64)
    }
}

/// Write `value` as 8 little-endian bytes at `offset`.
///
/// Returns the offset just past the written bytes, so several fields can be
/// chained into one frame. Pass `0` to write at the start of the buffer.
///
/// # Panics
///
/// Panics if `buf` is shorter than `offset + 8`. Callers size their frame
/// buffers up front; use [`try_write_uint64_le`] when that is not the case.
pub fn write_uint64_le(buf: &mut [u8], value: impl Into<Uint64Value>, offset: usize) -> usize {
    let value = value.into().get();
    let end = offset + UINT64_LEN;
    buf[offset..end].copy_from_slice(&value.to_le_bytes());
    tracing::trace!(value, offset, "encoded uint64 le");
    end
}

/// Checked variant of [`write_uint64_le`].
///
/// # Errors
///
/// Returns [`EmulatorError::BufferTooSmall`] instead of panicking. The
/// buffer is left untouched on error.
pub fn try_write_uint64_le(
    buf: &mut [u8],
    value: impl Into<Uint64Value>,
    offset: usize,
) -> Result<usize> {
    let needed = offset.saturating_add(UINT64_LEN);
    if needed > buf.len() {
        return Err(EmulatorError::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }
    Ok(write_uint64_le(buf, value, offset))
}

/// Read 8 little-endian bytes at `offset`.
///
/// Returns the value and the offset just past it.
///
/// # Panics
///
/// Panics if `buf` is shorter than `offset + 8`.
pub fn read_uint64_le(buf: &[u8], offset: usize) -> (u64, usize) {
    let end = offset + UINT64_LEN;
    let mut bytes = [0u8; UINT64_LEN];
    bytes.copy_from_slice(&buf[offset..end]);
    (u64::from_le_bytes(bytes), end)
}

/// Append `value` as 8 little-endian bytes to a growable frame buffer.
pub fn put_uint64_le(buf: &mut BytesMut, value: impl Into<Uint64Value>) {
    buf.put_u64_le(value.into().get());
}
