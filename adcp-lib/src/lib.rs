#![doc = include_str!("../README.md")]

mod error;

pub mod bytes;
pub mod ensemble;
pub mod framing;

pub use ensemble::{DataSetKind, Ensemble};
pub use error::{Error, Result};
pub use framing::{decode_ensembles, DecodeStats, Decoder, DecoderOpts, PipelineOpts};
