#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::DataSetHeader;
use crate::bytes::FieldReader;
use crate::{Error, Result};

/// Element layout of the `E000009` data-set.
mod layout {
    pub const FIRST_BIN_RANGE: usize = 0;
    pub const BIN_SIZE: usize = 1;
    pub const FIRST_PING_TIME: usize = 2;
    pub const LAST_PING_TIME: usize = 3;
    pub const HEADING: usize = 4;
    pub const PITCH: usize = 5;
    pub const ROLL: usize = 6;
    pub const WATER_TEMP: usize = 7;
    pub const SYSTEM_TEMP: usize = 8;
    pub const SALINITY: usize = 9;
    pub const PRESSURE: usize = 10;
    pub const TRANSDUCER_DEPTH: usize = 11;
    pub const SPEED_OF_SOUND: usize = 12;
    pub const NUM_ELEMENTS: usize = 13;

    pub const RAW_MAG_FIELD_STRENGTH: usize = 13;
    pub const PITCH_GRAVITY_VECTOR: usize = 14;
    pub const ROLL_GRAVITY_VECTOR: usize = 15;
    pub const VERTICAL_GRAVITY_VECTOR: usize = 16;
    pub const NUM_ELEMENTS_WITH_SENSORS: usize = 17;
}

/// Magnetometer and accelerometer values reported by newer firmware.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSensors {
    pub raw_mag_field_strength: f32,
    pub pitch_gravity_vector: f32,
    pub roll_gravity_vector: f32,
    pub vertical_gravity_vector: f32,
}

/// Ancillary data (`E000009`): geometry, orientation and environment.
///
/// Ranges and depths are in meters, times in seconds, angles in degrees,
/// temperatures in degrees Celsius, salinity in ppt, pressure in Pascals and
/// speed of sound in m/s.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AncillaryData {
    pub header: DataSetHeader,
    pub first_bin_range: f32,
    pub bin_size: f32,
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
    pub sensors: Option<OrientationSensors>,
}

impl AncillaryData {
    /// Decode from `dat`, which starts at the data-set header.
    ///
    /// # Errors
    /// [Error::MalformedFrame] if fewer than 13 elements are declared,
    /// [Error::OutOfBounds] if `dat` is shorter than declared.
    pub fn decode(header: DataSetHeader, dat: &[u8]) -> Result<Self> {
        use layout::*;

        let (elements, _) = header.dims()?;
        if elements < NUM_ELEMENTS {
            return Err(Error::MalformedFrame(format!(
                "ancillary data has {elements} elements, need {NUM_ELEMENTS}"
            )));
        }
        let r = FieldReader::new(dat, header.body_offset());
        let float = |idx| r.element_f32(idx);

        let sensors = if elements >= NUM_ELEMENTS_WITH_SENSORS {
            Some(OrientationSensors {
                raw_mag_field_strength: float(RAW_MAG_FIELD_STRENGTH)?,
                pitch_gravity_vector: float(PITCH_GRAVITY_VECTOR)?,
                roll_gravity_vector: float(ROLL_GRAVITY_VECTOR)?,
                vertical_gravity_vector: float(VERTICAL_GRAVITY_VECTOR)?,
            })
        } else {
            None
        };

        Ok(AncillaryData {
            header,
            first_bin_range: float(FIRST_BIN_RANGE)?,
            bin_size: float(BIN_SIZE)?,
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
            sensors,
        })
    }
}
