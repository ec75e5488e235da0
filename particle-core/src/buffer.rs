//! Fixed-width big-endian primitives for the flat wire encoding.
//!
//! Every writer takes the destination slice and an offset and returns the
//! number of bytes written. Writers panic if the destination is too short.

use std::fmt::Write as _;

/// Number of bytes `value` occupies when encoded as UTF-8.
pub fn estimate_size_utf8(value: &str) -> usize {
    value.len()
}

/// Copies the UTF-8 bytes of `value` into `buffer` at `offset`.
pub fn string_to_utf8(value: &str, buffer: &mut [u8], offset: usize) -> usize {
    copy_bytes(value.as_bytes(), buffer, offset)
}

/// Copies `bytes` into `buffer` at `offset`.
pub fn copy_bytes(bytes: &[u8], buffer: &mut [u8], offset: usize) -> usize {
    buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
    bytes.len()
}

pub fn long_to_bytes(value: i64, buffer: &mut [u8], offset: usize) -> usize {
    copy_bytes(&value.to_be_bytes(), buffer, offset)
}

pub fn short_to_bytes(value: u16, buffer: &mut [u8], offset: usize) -> usize {
    copy_bytes(&value.to_be_bytes(), buffer, offset)
}

pub fn double_to_bytes(value: f64, buffer: &mut [u8], offset: usize) -> usize {
    copy_bytes(&value.to_bits().to_be_bytes(), buffer, offset)
}

/// Renders bytes as lowercase hex.
pub fn bytes_to_hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
