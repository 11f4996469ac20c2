#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A field read ran past the end of its slice.
    #[error("read of {width} bytes at offset {offset} exceeds {len} available")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("ensemble {number} checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        number: u32,
        stored: u32,
        computed: u32,
    },

    /// Data-set framing inside an ensemble payload is inconsistent.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
