//! Low-level I/O primitives shared by the image parser and writer.
//!
//! Each reader reads exactly the bytes it promises or returns an error -
//! there is no partial-read ambiguity. Writers append little-endian values
//! to a `Vec<u8>` and cannot fail.

use std::io::Read;

use crate::Result;

/// Read one byte.
#[inline]
pub(crate) fn u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

/// Read a little-endian `u16`.
#[inline]
pub(crate) fn le_u16<R: Read>(r: &mut R) -> Result<u16> {
    Ok(u16::from_le_bytes(bytesa(r)?))
}

/// Read a little-endian `u32`.
#[inline]
pub(crate) fn le_u32<R: Read>(r: &mut R) -> Result<u32> {
    Ok(u32::from_le_bytes(bytesa(r)?))
}

/// Read a little-endian `u64`.
#[inline]
pub(crate) fn le_u64<R: Read>(r: &mut R) -> Result<u64> {
    Ok(u64::from_le_bytes(bytesa(r)?))
}

/// Read a little-endian `i32`.
#[inline]
pub(crate) fn le_i32<R: Read>(r: &mut R) -> Result<i32> {
    Ok(i32::from_le_bytes(bytesa(r)?))
}

/// Read exactly `N` bytes into a fixed-size array.
#[inline]
pub(crate) fn bytesa<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Append one byte.
#[inline]
pub(crate) fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

/// Append a little-endian `u16`.
#[inline]
pub(crate) fn put_le_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian `u32`.
#[inline]
pub(crate) fn put_le_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian `u64`.
#[inline]
pub(crate) fn put_le_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian `i32`.
#[inline]
pub(crate) fn put_le_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Copy a byte buffer of exactly `N` bytes into a fixed-size array.
///
/// Section encoders build into a `Vec` and finish with this; a length
/// mismatch is a layout bug, not a data error.
#[inline]
pub(crate) fn into_array<const N: usize>(out: Vec<u8>) -> [u8; N] {
    debug_assert_eq!(out.len(), N, "encoded layout size mismatch");
    std::array::from_fn(|i| out[i])
}

/// Decode a fixed-width, null-padded ASCII field.
///
/// Stops at the first null byte; non-UTF-8 bytes are replaced.
pub(crate) fn null_padded_string(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
