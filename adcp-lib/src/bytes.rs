//! Fixed-width little-endian field access.
//!
//! Every multi-byte value on the wire is little-endian. Reads never panic;
//! a read past the end of the slice is an [Error::OutOfBounds].
use std::ops::Range;

use crate::{Error, Result};

pub const BYTES_IN_INT32: usize = 4;
pub const BYTES_IN_FLOAT: usize = 4;
pub const BYTES_IN_DOUBLE: usize = 8;

fn field<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    let oob = || Error::OutOfBounds {
        offset,
        width: N,
        len: buf.len(),
    };
    let end = offset.checked_add(N).ok_or_else(oob)?;
    let bytes = buf.get(offset..end).ok_or_else(oob)?;
    // get() returned exactly N bytes
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8> {
    Ok(field::<1>(buf, offset)?[0])
}

pub fn read_i32(buf: &[u8], offset: usize) -> Result<i32> {
    Ok(i32::from_le_bytes(field(buf, offset)?))
}

pub fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    Ok(u32::from_le_bytes(field(buf, offset)?))
}

pub fn read_f32(buf: &[u8], offset: usize) -> Result<f32> {
    Ok(f32::from_le_bytes(field(buf, offset)?))
}

pub fn read_f64(buf: &[u8], offset: usize) -> Result<f64> {
    Ok(f64::from_le_bytes(field(buf, offset)?))
}

/// Read `range` as ASCII, dropping trailing NUL padding and whitespace.
pub fn read_ascii(buf: &[u8], range: Range<usize>) -> Result<String> {
    let bytes = buf.get(range.clone()).ok_or(Error::OutOfBounds {
        offset: range.start,
        width: range.len(),
        len: buf.len(),
    })?;
    let raw = String::from_utf8_lossy(bytes);
    Ok(raw.trim_end_matches('\0').trim().to_string())
}

/// Reads 4-byte elements of a data-set body.
///
/// Element `idx` lives at `base + idx * 4`, where `base` is the length of the
/// data-set header.
pub struct FieldReader<'a> {
    data: &'a [u8],
    base: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, base }
    }

    fn offset(&self, idx: usize) -> Result<usize> {
        idx.checked_mul(BYTES_IN_INT32)
            .and_then(|x| x.checked_add(self.base))
            .ok_or(Error::OutOfBounds {
                offset: usize::MAX,
                width: BYTES_IN_INT32,
                len: self.data.len(),
            })
    }

    pub fn element_i32(&self, idx: usize) -> Result<i32> {
        read_i32(self.data, self.offset(idx)?)
    }

    pub fn element_f32(&self, idx: usize) -> Result<f32> {
        read_f32(self.data, self.offset(idx)?)
    }

    /// Byte `byte` (0..4) of element `idx`.
    pub fn element_byte(&self, idx: usize, byte: usize) -> Result<u8> {
        read_u8(self.data, self.offset(idx)? + byte)
    }

    /// `count` consecutive elements starting at `idx`, read as ASCII.
    pub fn elements_ascii(&self, idx: usize, count: usize) -> Result<String> {
        let start = self.offset(idx)?;
        let end = count
            .checked_mul(BYTES_IN_INT32)
            .and_then(|n| n.checked_add(start))
            .ok_or(Error::OutOfBounds {
                offset: start,
                width: usize::MAX,
                len: self.data.len(),
            })?;
        read_ascii(self.data, start..end)
    }

    /// `count` consecutive float elements starting at `idx`.
    pub fn elements_f32(&self, idx: usize, count: usize) -> Result<Vec<f32>> {
        (idx..idx + count).map(|i| self.element_f32(i)).collect()
    }
}
