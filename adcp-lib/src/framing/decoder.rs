#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{locate, verify, EnsembleFrame, Locate};
use crate::ensemble::{decode_datasets, Ensemble, MAX_DATASETS};
use crate::Result;

/// Options controlling [Decoder] limits and header checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOpts {
    pub max_datasets: usize,
    pub max_payload_len: usize,
    pub verify_header_inverse: bool,
}

impl Default for DecoderOpts {
    fn default() -> Self {
        DecoderOpts {
            max_datasets: MAX_DATASETS,
            max_payload_len: Self::DEFAULT_MAX_PAYLOAD_LEN,
            verify_header_inverse: false,
        }
    }
}

impl DecoderOpts {
    pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 1024 * 1024;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of data-sets walked per payload. Payload left over after
    /// this many data-sets makes the ensemble malformed.
    #[must_use]
    pub fn with_max_datasets(mut self, num: usize) -> Self {
        self.max_datasets = num;
        self
    }

    /// Largest payload length accepted in a header. A larger value is treated
    /// as a false sync rather than waited for.
    #[must_use]
    pub fn with_max_payload_len(mut self, len: usize) -> Self {
        self.max_payload_len = len;
        self
    }

    /// Require the inverse header fields to be the ones-complement of the
    /// ensemble number and payload length.
    #[must_use]
    pub fn with_header_inverse_check(mut self, enabled: bool) -> Self {
        self.verify_header_inverse = enabled;
        self
    }
}

/// Counters accumulated over the life of a [Decoder].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Ensembles successfully decoded.
    pub ensembles: u64,
    pub checksum_failures: u64,
    pub malformed: u64,
    pub false_syncs: u64,
    /// Bytes dropped that were not part of any frame.
    pub garbage_bytes: u64,
    pub unknown_datasets: u64,
}

/// Incremental decoder turning arbitrarily chunked bytes into [Ensemble]s.
///
/// # Examples
/// ```
/// use adcp::framing::{encode_frame, Decoder};
///
/// let mut decoder = Decoder::new();
/// let frame = encode_frame(1, &[]);
/// let (first, second) = frame.split_at(10);
///
/// assert!(decoder.append(first).is_empty());
/// let ensembles = decoder.append(second);
/// assert_eq!(ensembles.len(), 1);
/// assert_eq!(ensembles[0].number(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Decoder {
    buf: Vec<u8>,
    opts: DecoderOpts,
    stats: DecodeStats,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_opts(opts: DecoderOpts) -> Self {
        Decoder {
            buf: Vec::new(),
            opts,
            stats: DecodeStats::default(),
        }
    }

    /// Buffer `dat` and return every ensemble it completes, in stream order.
    pub fn append(&mut self, dat: &[u8]) -> Vec<Ensemble> {
        self.buf.extend_from_slice(dat);
        let mut ensembles = Vec::new();
        while let Some(ensemble) = self.next_ensemble() {
            ensembles.push(ensemble);
        }
        ensembles
    }

    /// Decode the next ensemble already buffered, skipping frames that fail
    /// the checksum or are malformed.
    pub fn next_ensemble(&mut self) -> Option<Ensemble> {
        loop {
            match self.next_frame()? {
                Ok(ensemble) => return Some(ensemble),
                Err(_) => continue,
            }
        }
    }

    /// Decode the next complete frame already buffered, or `None` if more
    /// bytes are required.
    ///
    /// Frames failing the checksum or dispatch are returned as errors. The
    /// frame is evicted either way, so the next call continues with the
    /// following frame.
    pub fn next_frame(&mut self) -> Option<Result<Ensemble>> {
        loop {
            match locate(&self.buf, &self.opts) {
                Locate::Searching { discard } => {
                    self.discard(discard);
                    return None;
                }
                Locate::HeaderPending { sync_offset }
                | Locate::PayloadPending { sync_offset, .. } => {
                    self.discard(sync_offset);
                    return None;
                }
                Locate::FalseSync { sync_offset } => {
                    debug!(offset = sync_offset, "false sync; rescanning");
                    self.stats.false_syncs += 1;
                    self.discard(sync_offset + 1);
                }
                Locate::Complete(frame) => {
                    self.discard(frame.sync_offset);
                    let frame = EnsembleFrame {
                        sync_offset: 0,
                        ..frame
                    };
                    let zult = self.decode_frame(&frame);
                    self.evict(frame.end());
                    return Some(zult);
                }
            }
        }
    }

    fn decode_frame(&mut self, frame: &EnsembleFrame) -> Result<Ensemble> {
        let number = frame.header.number;
        if let Err(err) = verify(frame, &self.buf) {
            warn!(ensemble = number, "{err}; dropping frame");
            self.stats.checksum_failures += 1;
            return Err(err);
        }

        let raw = self.buf[frame.frame_range()].to_vec();
        match decode_datasets(frame.header, raw, self.opts.max_datasets) {
            Ok(ensemble) => {
                trace!(ensemble = number, len = frame.header.payload_len, "decoded ensemble");
                self.stats.ensembles += 1;
                self.stats.unknown_datasets += ensemble.unknown.len() as u64;
                Ok(ensemble)
            }
            Err(err) => {
                warn!(ensemble = number, "{err}; dropping frame");
                self.stats.malformed += 1;
                Err(err)
            }
        }
    }

    fn discard(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        trace!(len, "discarding bytes outside of a frame");
        self.stats.garbage_bytes += len as u64;
        self.evict(len);
    }

    /// Drop the first `len` buffered bytes, or all of them if fewer are
    /// buffered.
    pub fn evict(&mut self, len: usize) {
        let len = len.min(self.buf.len());
        self.buf.drain(..len);
    }

    /// Number of bytes buffered but not yet consumed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    #[must_use]
    pub fn opts(&self) -> &DecoderOpts {
        &self.opts
    }
}
