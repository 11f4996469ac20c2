use crc::{Crc, CRC_16_XMODEM};

use super::EnsembleFrame;
use crate::{Error, Result};

/// CRC-CCITT with a zero initial value, as computed by the instrument.
const CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Result of checking a frame's stored checksum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Integrity {
    Ok,
    Mismatch { stored: u32, computed: u32 },
}

/// CRC-CCITT over `payload`, widened to the stored 32-bit width.
#[must_use]
pub fn checksum(payload: &[u8]) -> u32 {
    u32::from(CCITT.checksum(payload))
}

/// Compare the checksum stored in `frame` against its payload in `buf`.
///
/// # Errors
/// [Error::OutOfBounds] if `buf` does not contain the frame's payload.
pub fn check(frame: &EnsembleFrame, buf: &[u8]) -> Result<Integrity> {
    let range = frame.payload_range();
    let payload = buf.get(range.clone()).ok_or(Error::OutOfBounds {
        offset: range.start,
        width: range.len(),
        len: buf.len(),
    })?;
    let computed = checksum(payload);
    if computed == frame.checksum {
        Ok(Integrity::Ok)
    } else {
        Ok(Integrity::Mismatch {
            stored: frame.checksum,
            computed,
        })
    }
}

/// Like [check], as a [Result].
///
/// # Errors
/// [Error::ChecksumMismatch] if the checksums differ, or [Error::OutOfBounds]
/// if `buf` does not contain the frame's payload.
pub fn verify(frame: &EnsembleFrame, buf: &[u8]) -> Result<()> {
    match check(frame, buf)? {
        Integrity::Ok => Ok(()),
        Integrity::Mismatch { stored, computed } => Err(Error::ChecksumMismatch {
            number: frame.header.number,
            stored,
            computed,
        }),
    }
}
