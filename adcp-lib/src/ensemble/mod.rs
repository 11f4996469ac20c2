//! Decoded ensemble records and the data-set dispatcher.
//!
//! An ensemble payload is a sequence of self-describing data-sets, each
//! starting with a [DataSetHeader]. [decode_datasets] walks that sequence and
//! attaches every recognized data-set to its own [Ensemble] field.
mod ancillary;
mod bottom_track;
mod dataset;
mod ensemble_data;
mod grid;

pub use ancillary::*;
pub use bottom_track::*;
pub use dataset::*;
pub use ensemble_data::*;
pub use grid::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::framing::EnsembleHeader;
use crate::{Error, Result};

/// Default bound on the number of data-sets walked in one payload.
pub const MAX_DATASETS: usize = 20;

/// A data-set whose tag is not recognized, kept verbatim.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDataSet {
    pub header: DataSetHeader,
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub data: Vec<u8>,
}

/// One decoded data-set.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSet {
    BeamVelocity(BeamVelocity),
    InstrumentVelocity(InstrumentVelocity),
    EarthVelocity(EarthVelocity),
    Amplitude(Amplitude),
    Correlation(Correlation),
    GoodBeam(GoodBeam),
    GoodEarth(GoodEarth),
    EnsembleData(EnsembleData),
    Ancillary(AncillaryData),
    BottomTrack(BottomTrack),
    Unknown(UnknownDataSet),
}

impl DataSet {
    /// Decode the data-set occupying all of `dat`.
    ///
    /// # Errors
    /// Any error from the type-specific parser.
    pub fn decode(header: DataSetHeader, dat: &[u8]) -> Result<Self> {
        Ok(match header.kind() {
            DataSetKind::BeamVelocity => DataSet::BeamVelocity(FloatGrid::decode(header, dat)?),
            DataSetKind::InstrumentVelocity => {
                DataSet::InstrumentVelocity(FloatGrid::decode(header, dat)?)
            }
            DataSetKind::EarthVelocity => DataSet::EarthVelocity(FloatGrid::decode(header, dat)?),
            DataSetKind::Amplitude => DataSet::Amplitude(FloatGrid::decode(header, dat)?),
            DataSetKind::Correlation => DataSet::Correlation(FloatGrid::decode(header, dat)?),
            DataSetKind::GoodBeam => DataSet::GoodBeam(IntGrid::decode(header, dat)?),
            DataSetKind::GoodEarth => DataSet::GoodEarth(IntGrid::decode(header, dat)?),
            DataSetKind::EnsembleData => {
                DataSet::EnsembleData(EnsembleData::decode(header, dat)?)
            }
            DataSetKind::Ancillary => DataSet::Ancillary(AncillaryData::decode(header, dat)?),
            DataSetKind::BottomTrack => DataSet::BottomTrack(BottomTrack::decode(header, dat)?),
            DataSetKind::Unknown => DataSet::Unknown(UnknownDataSet {
                header,
                data: dat.to_vec(),
            }),
        })
    }

    #[must_use]
    pub fn kind(&self) -> DataSetKind {
        match self {
            DataSet::BeamVelocity(_) => DataSetKind::BeamVelocity,
            DataSet::InstrumentVelocity(_) => DataSetKind::InstrumentVelocity,
            DataSet::EarthVelocity(_) => DataSetKind::EarthVelocity,
            DataSet::Amplitude(_) => DataSetKind::Amplitude,
            DataSet::Correlation(_) => DataSetKind::Correlation,
            DataSet::GoodBeam(_) => DataSetKind::GoodBeam,
            DataSet::GoodEarth(_) => DataSetKind::GoodEarth,
            DataSet::EnsembleData(_) => DataSetKind::EnsembleData,
            DataSet::Ancillary(_) => DataSetKind::Ancillary,
            DataSet::BottomTrack(_) => DataSetKind::BottomTrack,
            DataSet::Unknown(_) => DataSetKind::Unknown,
        }
    }
}

/// A fully decoded, checksum-valid ensemble.
///
/// Each data-set field is present only if its tag appeared in the payload.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    pub header: EnsembleHeader,
    pub ensemble_data: Option<EnsembleData>,
    pub beam_velocity: Option<BeamVelocity>,
    pub instrument_velocity: Option<InstrumentVelocity>,
    pub earth_velocity: Option<EarthVelocity>,
    pub amplitude: Option<Amplitude>,
    pub correlation: Option<Correlation>,
    pub good_beam: Option<GoodBeam>,
    pub good_earth: Option<GoodEarth>,
    pub ancillary: Option<AncillaryData>,
    pub bottom_track: Option<BottomTrack>,
    pub unknown: Vec<UnknownDataSet>,
    /// Ensemble header and payload bytes, without the checksum.
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub raw: Vec<u8>,
}

impl Ensemble {
    #[must_use]
    pub fn new(header: EnsembleHeader, raw: Vec<u8>) -> Self {
        Ensemble {
            header,
            ensemble_data: None,
            beam_velocity: None,
            instrument_velocity: None,
            earth_velocity: None,
            amplitude: None,
            correlation: None,
            good_beam: None,
            good_earth: None,
            ancillary: None,
            bottom_track: None,
            unknown: Vec::new(),
            raw,
        }
    }

    /// Ensemble number from the frame header.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.header.number
    }

    /// Payload bytes, i.e., the data-sets.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        self.raw.get(EnsembleHeader::LEN..).unwrap_or_default()
    }

    /// Store `dataset` in its field; returns true if it replaced a value.
    pub fn insert(&mut self, dataset: DataSet) -> bool {
        fn put<T>(slot: &mut Option<T>, v: T) -> bool {
            slot.replace(v).is_some()
        }
        match dataset {
            DataSet::BeamVelocity(v) => put(&mut self.beam_velocity, v),
            DataSet::InstrumentVelocity(v) => put(&mut self.instrument_velocity, v),
            DataSet::EarthVelocity(v) => put(&mut self.earth_velocity, v),
            DataSet::Amplitude(v) => put(&mut self.amplitude, v),
            DataSet::Correlation(v) => put(&mut self.correlation, v),
            DataSet::GoodBeam(v) => put(&mut self.good_beam, v),
            DataSet::GoodEarth(v) => put(&mut self.good_earth, v),
            DataSet::EnsembleData(v) => put(&mut self.ensemble_data, v),
            DataSet::Ancillary(v) => put(&mut self.ancillary, v),
            DataSet::BottomTrack(v) => put(&mut self.bottom_track, v),
            DataSet::Unknown(v) => {
                self.unknown.push(v);
                false
            }
        }
    }

    /// Kinds of the known data-sets present, in [DataSetKind::KNOWN] order.
    #[must_use]
    pub fn kinds(&self) -> Vec<DataSetKind> {
        let present = [
            self.beam_velocity.is_some(),
            self.instrument_velocity.is_some(),
            self.earth_velocity.is_some(),
            self.amplitude.is_some(),
            self.correlation.is_some(),
            self.good_beam.is_some(),
            self.good_earth.is_some(),
            self.ensemble_data.is_some(),
            self.ancillary.is_some(),
            self.bottom_track.is_some(),
        ];
        DataSetKind::KNOWN
            .into_iter()
            .zip(present)
            .filter_map(|(kind, p)| p.then_some(kind))
            .collect()
    }
}

/// Decode all data-sets of one checksum-valid frame.
///
/// `frame` holds the ensemble header followed by exactly `header.payload_len`
/// payload bytes. At most `max_datasets` data-sets are walked.
///
/// # Errors
/// [Error::MalformedFrame] if a data-set header or body does not fit in the
/// payload, a known data-set fails to parse, or payload remains after
/// `max_datasets` data-sets.
pub fn decode_datasets(
    header: EnsembleHeader,
    frame: Vec<u8>,
    max_datasets: usize,
) -> Result<Ensemble> {
    let mut ensemble = Ensemble::new(header, frame);
    let payload = ensemble.payload();
    let mut datasets: Vec<DataSet> = Vec::new();
    let mut pos = 0usize;

    for _ in 0..max_datasets {
        if pos >= payload.len() {
            break;
        }
        let remaining = &payload[pos..];
        let ds_header = DataSetHeader::decode(remaining).map_err(|_| {
            Error::MalformedFrame(format!(
                "{} bytes at offset {pos} too short for a data-set header",
                remaining.len()
            ))
        })?;
        let size = ds_header.size()?;
        let Some(dat) = remaining.get(..size) else {
            return Err(Error::MalformedFrame(format!(
                "data-set {} at offset {pos} needs {size} bytes, {} remain",
                ds_header.tag(),
                remaining.len()
            )));
        };

        let dataset = DataSet::decode(ds_header, dat).map_err(|err| match err {
            Error::MalformedFrame(msg) => Error::MalformedFrame(msg),
            err => Error::MalformedFrame(format!(
                "data-set {} at offset {pos}: {err}",
                ds_header.tag()
            )),
        })?;
        if dataset.kind() == DataSetKind::Unknown {
            debug!(offset = pos, size, tag = %ds_header.tag(), "skipping unknown data-set");
        } else {
            trace!(offset = pos, size, kind = %dataset.kind(), "decoded data-set");
        }
        datasets.push(dataset);
        pos += size;
    }

    if pos < payload.len() {
        return Err(Error::MalformedFrame(format!(
            "payload has {} bytes left after {max_datasets} data-sets",
            payload.len() - pos
        )));
    }

    for dataset in datasets {
        let kind = dataset.kind();
        if ensemble.insert(dataset) {
            debug!(ensemble = header.number, %kind, "duplicate data-set replaced");
        }
    }

    Ok(ensemble)
}
