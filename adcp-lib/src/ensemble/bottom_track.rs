#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::DataSetHeader;
use crate::bytes::FieldReader;
use crate::{Error, Result};

/// Element layout of the `E000010` data-set.
///
/// 14 scalars are followed by per-beam vectors, each `num_beams` long.
mod layout {
    pub const FIRST_PING_TIME: usize = 0;
    pub const LAST_PING_TIME: usize = 1;
    pub const HEADING: usize = 2;
    pub const PITCH: usize = 3;
    pub const ROLL: usize = 4;
    pub const WATER_TEMP: usize = 5;
    pub const SYSTEM_TEMP: usize = 6;
    pub const SALINITY: usize = 7;
    pub const PRESSURE: usize = 8;
    pub const TRANSDUCER_DEPTH: usize = 9;
    pub const SPEED_OF_SOUND: usize = 10;
    pub const STATUS: usize = 11;
    pub const NUM_BEAMS: usize = 12;
    pub const ACTUAL_PING_COUNT: usize = 13;
    pub const NUM_SCALARS: usize = 14;

    /// Per-beam vectors always present.
    pub const NUM_BEAM_VECTORS: usize = 10;
    /// Per-beam vectors including the pulse-coherent block.
    pub const NUM_BEAM_VECTORS_PULSE_COHERENT: usize = 15;
}

/// Pulse-coherent bottom-track values, one per beam.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PulseCoherent {
    pub snr: Vec<f32>,
    pub amplitude: Vec<f32>,
    pub velocity: Vec<f32>,
    pub noise: Vec<f32>,
    pub correlation: Vec<f32>,
}

/// Bottom-track data (`E000010`).
///
/// All per-beam vectors have `num_beams` entries. Velocities use
/// [super::BAD_VELOCITY] for beams without a bottom lock.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BottomTrack {
    pub header: DataSetHeader,
    pub first_ping_time: f32,
    pub last_ping_time: f32,
    pub heading: f32,
    pub pitch: f32,
    pub roll: f32,
    pub water_temp: f32,
    pub system_temp: f32,
    pub salinity: f32,
    pub pressure: f32,
    pub transducer_depth: f32,
    pub speed_of_sound: f32,
    pub status: f32,
    pub num_beams: usize,
    pub actual_ping_count: f32,
    pub range: Vec<f32>,
    pub snr: Vec<f32>,
    pub amplitude: Vec<f32>,
    pub correlation: Vec<f32>,
    pub beam_velocity: Vec<f32>,
    pub beam_good: Vec<f32>,
    pub instrument_velocity: Vec<f32>,
    pub instrument_good: Vec<f32>,
    pub earth_velocity: Vec<f32>,
    pub earth_good: Vec<f32>,
    pub pulse_coherent: Option<PulseCoherent>,
}

impl BottomTrack {
    /// Decode from `dat`, which starts at the data-set header.
    ///
    /// # Errors
    /// [Error::MalformedFrame] if the beam count is not consistent with the
    /// declared element count, [Error::OutOfBounds] if `dat` is shorter than
    /// declared.
    pub fn decode(header: DataSetHeader, dat: &[u8]) -> Result<Self> {
        use layout::*;

        let (elements, _) = header.dims()?;
        if elements < NUM_SCALARS {
            return Err(Error::MalformedFrame(format!(
                "bottom track has {elements} elements, need {NUM_SCALARS}"
            )));
        }
        let r = FieldReader::new(dat, header.body_offset());
        let float = |idx| r.element_f32(idx);

        let beams_value = float(NUM_BEAMS)?;
        let max_beams = (elements - NUM_SCALARS) / NUM_BEAM_VECTORS;
        if !(beams_value >= 0.0 && beams_value.fract() == 0.0 && beams_value as usize <= max_beams)
        {
            return Err(Error::MalformedFrame(format!(
                "bottom track beam count {beams_value} invalid for {elements} elements"
            )));
        }
        let num_beams = beams_value as usize;

        // vector `n` starts at NUM_SCALARS + n * num_beams
        let vector = |n: usize| r.elements_f32(NUM_SCALARS + n * num_beams, num_beams);

        let pulse_coherent = if num_beams > 0
            && elements >= NUM_SCALARS + NUM_BEAM_VECTORS_PULSE_COHERENT * num_beams
        {
            Some(PulseCoherent {
                snr: vector(10)?,
                amplitude: vector(11)?,
                velocity: vector(12)?,
                noise: vector(13)?,
                correlation: vector(14)?,
            })
        } else {
            None
        };

        Ok(BottomTrack {
            header,
            first_ping_time: float(FIRST_PING_TIME)?,
            last_ping_time: float(LAST_PING_TIME)?,
            heading: float(HEADING)?,
            pitch: float(PITCH)?,
            roll: float(ROLL)?,
            water_temp: float(WATER_TEMP)?,
            system_temp: float(SYSTEM_TEMP)?,
            salinity: float(SALINITY)?,
            pressure: float(PRESSURE)?,
            transducer_depth: float(TRANSDUCER_DEPTH)?,
            speed_of_sound: float(SPEED_OF_SOUND)?,
            status: float(STATUS)?,
            num_beams,
            actual_ping_count: float(ACTUAL_PING_COUNT)?,
            range: vector(0)?,
            snr: vector(1)?,
            amplitude: vector(2)?,
            correlation: vector(3)?,
            beam_velocity: vector(4)?,
            beam_good: vector(5)?,
            instrument_velocity: vector(6)?,
            instrument_good: vector(7)?,
            earth_velocity: vector(8)?,
            earth_good: vector(9)?,
            pulse_coherent,
        })
    }
}
