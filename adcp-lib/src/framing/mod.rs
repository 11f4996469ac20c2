//! Ensemble framing.
//!
//! An ensemble on the wire:
//!
//! ```text
//! [16 x 0x80 sync][u32 number][u32 !number][u32 payload_len][u32 !payload_len]
//! [payload_len bytes of data-sets][u32 checksum]
//! ```
//!
//! All integers are little-endian. The checksum is a CRC-CCITT over the
//! payload only.
mod decoder;
mod integrity;
pub mod pipeline;
pub mod synchronizer;

pub use decoder::*;
pub use integrity::*;
pub use pipeline::*;
pub use synchronizer::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bytes::read_u32;

/// Sync pattern that starts every ensemble.
pub const SYNC: [u8; 16] = [0x80; 16];
/// Length of the stored checksum following the payload.
pub const CHECKSUM_LEN: usize = 4;

/// Fixed 32 byte ensemble header, starting with [SYNC].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleHeader {
    pub number: u32,
    /// Ones-complement of `number`.
    pub number_inverse: u32,
    /// Byte length of the payload following the header.
    pub payload_len: u32,
    /// Ones-complement of `payload_len`.
    pub payload_len_inverse: u32,
}

impl EnsembleHeader {
    /// Header length in bytes, including the sync pattern.
    pub const LEN: usize = 32;
    const NUMBER_OFFSET: usize = 16;
    const NUMBER_INVERSE_OFFSET: usize = 20;
    const PAYLOAD_LEN_OFFSET: usize = 24;
    const PAYLOAD_LEN_INVERSE_OFFSET: usize = 28;

    #[must_use]
    pub fn new(number: u32, payload_len: u32) -> Self {
        EnsembleHeader {
            number,
            number_inverse: !number,
            payload_len,
            payload_len_inverse: !payload_len,
        }
    }

    /// Decode from bytes starting at the sync pattern, or `None` if there are
    /// not enough bytes. The sync pattern itself is not checked.
    #[must_use]
    pub fn decode(dat: &[u8]) -> Option<Self> {
        if dat.len() < Self::LEN {
            return None;
        }
        Some(EnsembleHeader {
            number: read_u32(dat, Self::NUMBER_OFFSET).ok()?,
            number_inverse: read_u32(dat, Self::NUMBER_INVERSE_OFFSET).ok()?,
            payload_len: read_u32(dat, Self::PAYLOAD_LEN_OFFSET).ok()?,
            payload_len_inverse: read_u32(dat, Self::PAYLOAD_LEN_INVERSE_OFFSET).ok()?,
        })
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::LEN);
        buf.extend_from_slice(&SYNC);
        for x in [
            self.number,
            self.number_inverse,
            self.payload_len,
            self.payload_len_inverse,
        ] {
            buf.extend_from_slice(&x.to_le_bytes());
        }
        buf
    }

    /// True when both inverse fields are the ones-complement of their value.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.number_inverse == !self.number && self.payload_len_inverse == !self.payload_len
    }

    /// Total frame length: header, payload and checksum.
    #[must_use]
    pub fn frame_len(&self) -> usize {
        Self::LEN + self.payload_len as usize + CHECKSUM_LEN
    }
}

/// A complete frame located in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleFrame {
    /// Offset of the sync pattern in the buffer.
    pub sync_offset: usize,
    pub header: EnsembleHeader,
    /// Checksum stored after the payload.
    pub checksum: u32,
}

impl EnsembleFrame {
    /// Offset one past the last byte of this frame, i.e., the number of bytes
    /// to evict once the frame is handled.
    #[must_use]
    pub fn end(&self) -> usize {
        self.sync_offset + self.header.frame_len()
    }

    /// Buffer range of the payload.
    #[must_use]
    pub fn payload_range(&self) -> std::ops::Range<usize> {
        let start = self.sync_offset + EnsembleHeader::LEN;
        start..start + self.header.payload_len as usize
    }

    /// Buffer range of header and payload, without the checksum.
    #[must_use]
    pub fn frame_range(&self) -> std::ops::Range<usize> {
        self.sync_offset..self.payload_range().end
    }
}

/// Wrap `payload` in a complete wire frame with a valid header and checksum.
///
/// # Panics
/// If `payload` is longer than `u32::MAX` bytes.
#[must_use]
pub fn encode_frame(number: u32, payload: &[u8]) -> Vec<u8> {
    let len = u32::try_from(payload.len()).expect("payload length exceeds u32");
    let mut buf = EnsembleHeader::new(number, len).encode();
    buf.reserve(payload.len() + CHECKSUM_LEN);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&checksum(payload).to_le_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_header() {
        let mut dat = SYNC.to_vec();
        dat.extend_from_slice(&7u32.to_le_bytes());
        dat.extend_from_slice(&(!7u32).to_le_bytes());
        dat.extend_from_slice(&28u32.to_le_bytes());
        dat.extend_from_slice(&(!28u32).to_le_bytes());

        let header = EnsembleHeader::decode(&dat).unwrap();
        assert_eq!(header.number, 7);
        assert_eq!(header.payload_len, 28);
        assert!(header.is_consistent());
        assert_eq!(header.frame_len(), 32 + 28 + 4);
        assert_eq!(header.encode(), dat);
    }

    #[test]
    fn decode_header_too_short() {
        assert!(EnsembleHeader::decode(&SYNC).is_none());
    }

    #[test]
    fn inconsistent_header() {
        let mut header = EnsembleHeader::new(1, 100);
        assert!(header.is_consistent());
        header.payload_len_inverse = 0;
        assert!(!header.is_consistent());
    }

    #[test]
    fn encoded_frame_layout() {
        let payload = [1u8, 2, 3, 4];
        let frame = encode_frame(9, &payload);
        assert_eq!(frame.len(), 32 + 4 + 4);
        assert_eq!(&frame[..16], &SYNC);
        assert_eq!(&frame[32..36], &payload);
        assert_eq!(
            u32::from_le_bytes([frame[36], frame[37], frame[38], frame[39]]),
            checksum(&payload)
        );
    }

    #[test]
    fn frame_ranges() {
        let frame = EnsembleFrame {
            sync_offset: 10,
            header: EnsembleHeader::new(1, 8),
            checksum: 0,
        };
        assert_eq!(frame.payload_range(), 42..50);
        assert_eq!(frame.frame_range(), 10..50);
        assert_eq!(frame.end(), 54);
    }
}
