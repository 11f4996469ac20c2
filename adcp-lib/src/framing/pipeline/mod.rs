use std::io::{ErrorKind, Read};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use super::{DecodeStats, Decoder, DecoderOpts};
use crate::ensemble::Ensemble;
use crate::{Error, Result};

/// What the decode thread does when the consumer falls behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backpressure {
    /// Wait for the consumer.
    #[default]
    Block,
    /// Drop ensembles that do not fit in the channel.
    Drop,
}

/// Configuration for [decode_ensembles].
#[derive(Debug, Clone)]
pub struct PipelineOpts {
    pub decoder: DecoderOpts,
    pub read_size: usize,
    pub channel_size: usize,
    pub backpressure: Backpressure,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        PipelineOpts {
            decoder: DecoderOpts::default(),
            read_size: 64 * 1024,
            channel_size: 1024,
            backpressure: Backpressure::Block,
        }
    }
}

impl PipelineOpts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_decoder(mut self, opts: DecoderOpts) -> Self {
        self.decoder = opts;
        self
    }

    /// Number of bytes requested from the reader per read.
    #[must_use]
    pub fn with_read_size(mut self, size: usize) -> Self {
        self.read_size = size.max(1);
        self
    }

    /// Set the allowable number of decoded ensembles waiting for the consumer.
    #[must_use]
    pub fn with_channel_size(mut self, size: usize) -> Self {
        self.channel_size = size;
        self
    }

    #[must_use]
    pub fn with_backpressure(mut self, policy: Backpressure) -> Self {
        self.backpressure = policy;
        self
    }
}

/// Counters from a finished pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub decoder: DecodeStats,
    /// Ensembles dropped by [Backpressure::Drop].
    pub dropped: u64,
}

/// Decode ensembles from `reader` in a background thread.
///
/// The returned iterator yields ensembles in stream order. A read error is
/// yielded once as [Error::Io] and ends the stream. Dropping the iterator stops
/// the thread after its next send.
///
/// # Errors
/// If the decode thread cannot be spawned.
///
/// # Examples
/// ```
/// use adcp::framing::{decode_ensembles, encode_frame, PipelineOpts};
///
/// let mut dat = encode_frame(1, &[]);
/// dat.extend(encode_frame(2, &[]));
///
/// let numbers: Vec<u32> = decode_ensembles(std::io::Cursor::new(dat), PipelineOpts::default())
///     .unwrap()
///     .filter_map(Result::ok)
///     .map(|e| e.number())
///     .collect();
/// assert_eq!(numbers, vec![1, 2]);
/// ```
pub fn decode_ensembles<R>(reader: R, opts: PipelineOpts) -> Result<EnsembleIter>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = bounded(opts.channel_size);
    let handle = thread::Builder::new()
        .name("adcp_decoder".into())
        .spawn(move || run(reader, &opts, &tx))?;

    Ok(EnsembleIter {
        ensembles: rx,
        handle: Some(handle),
        stats: None,
    })
}

fn run<R>(mut reader: R, opts: &PipelineOpts, tx: &Sender<Result<Ensemble>>) -> PipelineStats
where
    R: Read,
{
    let mut decoder = Decoder::with_opts(opts.decoder.clone());
    let mut chunk = vec![0u8; opts.read_size.max(1)];
    let mut dropped = 0u64;

    'read: loop {
        let num = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(num) => num,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                if tx.send(Err(Error::Io(err))).is_err() {
                    debug!("failed to send read error");
                }
                break;
            }
        };

        for ensemble in decoder.append(&chunk[..num]) {
            let number = ensemble.number();
            match opts.backpressure {
                Backpressure::Block => {
                    if tx.send(Ok(ensemble)).is_err() {
                        debug!("receiver disconnected; stopping");
                        break 'read;
                    }
                }
                Backpressure::Drop => match tx.try_send(Ok(ensemble)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!(ensemble = number, "channel full; dropping ensemble");
                        dropped += 1;
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        debug!("receiver disconnected; stopping");
                        break 'read;
                    }
                },
            }
        }
    }

    if decoder.buffered() > 0 {
        debug!(len = decoder.buffered(), "stream ended with an incomplete frame");
    }
    PipelineStats {
        decoder: *decoder.stats(),
        dropped,
    }
}

/// Iterator over the results of [decode_ensembles].
pub struct EnsembleIter {
    ensembles: Receiver<Result<Ensemble>>,
    handle: Option<JoinHandle<PipelineStats>>,
    stats: Option<PipelineStats>,
}

impl EnsembleIter {
    /// Counters of the finished decode thread; `None` until the iterator is
    /// exhausted.
    #[must_use]
    pub fn stats(&self) -> Option<&PipelineStats> {
        self.stats.as_ref()
    }
}

impl Iterator for EnsembleIter {
    type Item = Result<Ensemble>;

    fn next(&mut self) -> Option<Self::Item> {
        // recv blocks until data is available or the sender is gone
        match self.ensembles.recv() {
            Ok(zult) => Some(zult),
            Err(_) => {
                if let Some(handle) = self.handle.take() {
                    match handle.join() {
                        Ok(stats) => self.stats = Some(stats),
                        Err(_) => warn!("decoder thread panicked"),
                    }
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use super::*;
    use crate::framing::encode_frame;

    fn stream(count: u32) -> Vec<u8> {
        (0..count).flat_map(|n| encode_frame(n, &[])).collect()
    }

    #[test]
    fn delivers_all_ensembles_in_order() {
        let opts = PipelineOpts::new().with_read_size(7).with_channel_size(1);
        let mut iter = decode_ensembles(Cursor::new(stream(50)), opts).unwrap();

        let numbers: Vec<u32> = iter.by_ref().map(|e| e.unwrap().number()).collect();
        assert_eq!(numbers, (0..50).collect::<Vec<_>>());

        let stats = iter.stats().unwrap();
        assert_eq!(stats.decoder.ensembles, 50);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn drop_policy_accounts_for_every_ensemble() {
        let opts = PipelineOpts::new()
            .with_read_size(1 << 16)
            .with_channel_size(1)
            .with_backpressure(Backpressure::Drop);
        let mut iter = decode_ensembles(Cursor::new(stream(20)), opts).unwrap();

        let received = iter.by_ref().filter_map(Result::ok).count() as u64;
        let stats = iter.stats().unwrap();
        assert!(received >= 1);
        assert_eq!(received + stats.dropped, 20);
        assert_eq!(stats.decoder.ensembles, 20);
    }

    struct FailingReader {
        dat: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.dat.read(buf)? {
                0 => Err(io::Error::new(ErrorKind::BrokenPipe, "gone")),
                num => Ok(num),
            }
        }
    }

    #[test]
    fn read_error_is_forwarded_once() {
        let reader = FailingReader {
            dat: Cursor::new(stream(2)),
        };
        let results: Vec<Result<Ensemble>> =
            decode_ensembles(reader, PipelineOpts::default()).unwrap().collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(results[2], Err(Error::Io(_))));
    }

    #[test]
    fn empty_input() {
        let mut iter = decode_ensembles(Cursor::new(Vec::new()), PipelineOpts::default()).unwrap();
        assert!(iter.next().is_none());
        assert_eq!(iter.stats().unwrap().decoder, DecodeStats::default());
    }
}
