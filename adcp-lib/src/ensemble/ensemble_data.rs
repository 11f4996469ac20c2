use chrono::{NaiveDate, NaiveDateTime};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::DataSetHeader;
use crate::bytes::FieldReader;
use crate::{Error, Result};

/// Element layout of the `E000008` data-set.
mod layout {
    pub const ENSEMBLE_NUMBER: usize = 0;
    pub const NUM_BINS: usize = 1;
    pub const NUM_BEAMS: usize = 2;
    pub const DESIRED_PING_COUNT: usize = 3;
    pub const ACTUAL_PING_COUNT: usize = 4;
    pub const STATUS: usize = 5;
    pub const YEAR: usize = 6;
    pub const MONTH: usize = 7;
    pub const DAY: usize = 8;
    pub const HOUR: usize = 9;
    pub const MINUTE: usize = 10;
    pub const SECOND: usize = 11;
    pub const HUNDREDTHS: usize = 12;
    pub const SERIAL_NUMBER: usize = 13;
    pub const SERIAL_NUMBER_ELEMENTS: usize = 8;
    pub const FIRMWARE: usize = 21;
    pub const SUBSYSTEM_CONFIG: usize = 22;

    /// Elements that must be present for the data-set to decode.
    pub const MIN_ELEMENTS: usize = HUNDREDTHS + 1;
}

/// Firmware version reported by the instrument.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Firmware {
    pub major: u8,
    pub minor: u8,
    pub revision: u8,
    /// Subsystem code character, e.g. `'3'` for a 300kHz subsystem.
    pub subsystem_code: char,
}

/// Ensemble-level metadata (`E000008`).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsembleData {
    pub header: DataSetHeader,
    pub ensemble_number: i32,
    pub num_bins: i32,
    pub num_beams: i32,
    pub desired_ping_count: i32,
    pub actual_ping_count: i32,
    pub status: i32,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
    pub hundredths: i32,
    /// Empty if the data-set is too short to carry it.
    pub serial_number: String,
    pub firmware: Option<Firmware>,
    pub subsystem_config: Option<u8>,
}

impl EnsembleData {
    /// Decode from `dat`, which starts at the data-set header.
    ///
    /// The serial number, firmware and subsystem configuration trail the
    /// fixed fields and are only decoded when the header's element count
    /// covers them.
    ///
    /// # Errors
    /// [Error::MalformedFrame] if the header declares fewer elements than the
    /// fixed fields, [Error::OutOfBounds] if `dat` is shorter than declared.
    pub fn decode(header: DataSetHeader, dat: &[u8]) -> Result<Self> {
        use layout::*;

        let (elements, _) = header.dims()?;
        let r = FieldReader::new(dat, header.body_offset());
        let int = |idx| r.element_i32(idx);
        if elements < MIN_ELEMENTS {
            return Err(Error::MalformedFrame(format!(
                "ensemble data has {elements} elements, need {MIN_ELEMENTS}"
            )));
        }

        let serial_number = if elements >= SERIAL_NUMBER + SERIAL_NUMBER_ELEMENTS {
            r.elements_ascii(SERIAL_NUMBER, SERIAL_NUMBER_ELEMENTS)?
        } else {
            String::new()
        };
        let firmware = if elements > FIRMWARE {
            Some(Firmware {
                revision: r.element_byte(FIRMWARE, 0)?,
                minor: r.element_byte(FIRMWARE, 1)?,
                major: r.element_byte(FIRMWARE, 2)?,
                subsystem_code: char::from(r.element_byte(FIRMWARE, 3)?),
            })
        } else {
            None
        };
        let subsystem_config = if elements > SUBSYSTEM_CONFIG {
            Some(r.element_byte(SUBSYSTEM_CONFIG, 0)?)
        } else {
            None
        };

        Ok(EnsembleData {
            header,
            ensemble_number: int(ENSEMBLE_NUMBER)?,
            num_bins: int(NUM_BINS)?,
            num_beams: int(NUM_BEAMS)?,
            desired_ping_count: int(DESIRED_PING_COUNT)?,
            actual_ping_count: int(ACTUAL_PING_COUNT)?,
            status: int(STATUS)?,
            year: int(YEAR)?,
            month: int(MONTH)?,
            day: int(DAY)?,
            hour: int(HOUR)?,
            minute: int(MINUTE)?,
            second: int(SECOND)?,
            hundredths: int(HUNDREDTHS)?,
            serial_number,
            firmware,
            subsystem_config,
        })
    }

    /// Ensemble timestamp, or `None` if the fields do not form a valid date.
    #[must_use]
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        let u = |v: i32| u32::try_from(v).ok();
        NaiveDate::from_ymd_opt(self.year, u(self.month)?, u(self.day)?)?.and_hms_milli_opt(
            u(self.hour)?,
            u(self.minute)?,
            u(self.second)?,
            u(self.hundredths)?.checked_mul(10)?,
        )
    }
}
