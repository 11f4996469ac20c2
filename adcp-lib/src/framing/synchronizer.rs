use super::{DecoderOpts, EnsembleFrame, EnsembleHeader, CHECKSUM_LEN, SYNC};
use crate::bytes::read_u32;

/// Where the next frame stands in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locate {
    /// No sync pattern. The first `discard` bytes cannot start a frame; the
    /// remainder may hold the beginning of a sync pattern.
    Searching { discard: usize },
    /// Sync found but the header is not complete.
    HeaderPending { sync_offset: usize },
    /// Header readable, `needed` more bytes required to complete the frame.
    PayloadPending { sync_offset: usize, needed: usize },
    /// Sync found but the header is implausible, so this is not a frame start.
    FalseSync { sync_offset: usize },
    /// Header, payload and checksum are all buffered.
    Complete(EnsembleFrame),
}

/// Offset of the first sync pattern in `buf`.
#[must_use]
pub fn find_sync(buf: &[u8]) -> Option<usize> {
    buf.windows(SYNC.len()).position(|w| w == SYNC)
}

/// Resolve where a frame starts when the sync pattern at `start` is part of a
/// longer run of sync bytes, e.g., garbage `0x80` bytes directly before the
/// sync, or an ensemble number whose low byte is `0x80`.
///
/// The earliest offset in the run whose header inverse fields agree wins;
/// `start` is kept if none agree. `None` if a candidate header is not fully
/// buffered yet.
fn align_sync(buf: &[u8], start: usize) -> Option<usize> {
    let run = buf[start..].iter().take_while(|b| **b == SYNC[0]).count();
    let extra = run.saturating_sub(SYNC.len());
    if extra == 0 {
        return Some(start);
    }
    for offset in start..=start + extra {
        let header = EnsembleHeader::decode(&buf[offset..])?;
        if header.is_consistent() {
            return Some(offset);
        }
    }
    Some(start)
}

/// Locate the first frame in `buf`.
///
/// A header is implausible when its payload length exceeds
/// [DecoderOpts::max_payload_len] or, if enabled, its inverse fields do not
/// match.
#[must_use]
pub fn locate(buf: &[u8], opts: &DecoderOpts) -> Locate {
    let Some(first) = find_sync(buf) else {
        return Locate::Searching {
            discard: buf.len().saturating_sub(SYNC.len() - 1),
        };
    };
    let Some(sync_offset) = align_sync(buf, first) else {
        return Locate::HeaderPending { sync_offset: first };
    };
    let frame_buf = &buf[sync_offset..];
    let Some(header) = EnsembleHeader::decode(frame_buf) else {
        return Locate::HeaderPending { sync_offset };
    };

    if header.payload_len as usize > opts.max_payload_len
        || (opts.verify_header_inverse && !header.is_consistent())
    {
        return Locate::FalseSync { sync_offset };
    }

    let frame_len = header.frame_len();
    if frame_buf.len() < frame_len {
        return Locate::PayloadPending {
            sync_offset,
            needed: frame_len - frame_buf.len(),
        };
    }

    match read_u32(frame_buf, frame_len - CHECKSUM_LEN) {
        Ok(checksum) => Locate::Complete(EnsembleFrame {
            sync_offset,
            header,
            checksum,
        }),
        // length was checked above
        Err(_) => Locate::PayloadPending {
            sync_offset,
            needed: CHECKSUM_LEN,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{checksum, encode_frame};

    #[test]
    fn find_sync_first_occurrence() {
        let mut buf = vec![0u8, 1, 2];
        buf.extend_from_slice(&SYNC);
        buf.extend_from_slice(&SYNC);
        assert_eq!(find_sync(&buf), Some(3));
        assert_eq!(find_sync(&buf[..18]), None);
        assert_eq!(find_sync(&[0x80; 15]), None);
    }

    #[test]
    fn searching_keeps_partial_sync() {
        let buf = vec![0u8; 100];
        assert_eq!(
            locate(&buf, &DecoderOpts::default()),
            Locate::Searching { discard: 85 }
        );
        assert_eq!(
            locate(&buf[..10], &DecoderOpts::default()),
            Locate::Searching { discard: 0 }
        );
    }

    #[test]
    fn frame_states() {
        let opts = DecoderOpts::default();
        let payload = [7u8; 10];
        let mut buf = vec![0xaa; 5];
        buf.extend(encode_frame(3, &payload));

        assert_eq!(
            locate(&buf[..5 + 20], &opts),
            Locate::HeaderPending { sync_offset: 5 }
        );
        assert_eq!(
            locate(&buf[..5 + 40], &opts),
            Locate::PayloadPending {
                sync_offset: 5,
                needed: 6
            }
        );
        let Locate::Complete(frame) = locate(&buf, &opts) else {
            panic!("expected complete frame");
        };
        assert_eq!(frame.sync_offset, 5);
        assert_eq!(frame.header.number, 3);
        assert_eq!(frame.header.payload_len, 10);
        assert_eq!(frame.checksum, checksum(&payload));
        assert_eq!(frame.end(), buf.len());
    }

    #[test]
    fn oversized_payload_is_false_sync() {
        let opts = DecoderOpts::default().with_max_payload_len(8);
        let buf = encode_frame(1, &[0u8; 9]);
        assert_eq!(locate(&buf, &opts), Locate::FalseSync { sync_offset: 0 });
    }

    #[test]
    fn stray_sync_byte_is_garbage() {
        let mut buf = vec![0x11, 0x80];
        buf.extend(encode_frame(3, &[0u8; 988]));

        let Locate::Complete(frame) = locate(&buf, &DecoderOpts::default()) else {
            panic!("expected complete frame");
        };
        assert_eq!(frame.sync_offset, 2);
        assert_eq!(frame.header.number, 3);
        assert_eq!(frame.header.payload_len, 988);
    }

    #[test]
    fn sync_byte_in_ensemble_number() {
        // low byte of 0x80 extends the run to 17 bytes
        let frame = encode_frame(0x80, &[1u8; 4]);
        let Locate::Complete(found) = locate(&frame, &DecoderOpts::default()) else {
            panic!("expected complete frame");
        };
        assert_eq!(found.sync_offset, 0);
        assert_eq!(found.header.number, 0x80);

        let mut buf = vec![0x80];
        buf.extend_from_slice(&frame);
        let Locate::Complete(found) = locate(&buf, &DecoderOpts::default()) else {
            panic!("expected complete frame");
        };
        assert_eq!(found.sync_offset, 1);
        assert_eq!(found.header.number, 0x80);
    }

    #[test]
    fn sync_run_waits_for_candidate_headers() {
        let mut buf = vec![0x80];
        buf.extend(encode_frame(1, &[0u8; 8]));
        // second candidate header is one byte short
        assert_eq!(
            locate(&buf[..32], &DecoderOpts::default()),
            Locate::HeaderPending { sync_offset: 0 }
        );
    }

    #[test]
    fn inverse_check_is_optional() {
        let mut buf = encode_frame(1, &[0u8; 4]);
        // corrupt !number
        buf[20] ^= 0xff;

        assert!(matches!(
            locate(&buf, &DecoderOpts::default()),
            Locate::Complete(_)
        ));
        assert_eq!(
            locate(&buf, &DecoderOpts::default().with_header_inverse_check(true)),
            Locate::FalseSync { sync_offset: 0 }
        );
    }
}
