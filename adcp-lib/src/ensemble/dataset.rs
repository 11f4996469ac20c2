use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bytes::{read_i32, BYTES_IN_INT32};
use crate::{Error, Result};

/// Number of i32 fields preceding the name in every data-set header.
pub const NUM_HEADER_ELEMENTS: usize = 5;
/// Name length used by every data-set the instrument produces.
pub const DEFAULT_NAME_LEN: usize = 8;
/// Largest name length accepted before a header is considered corrupt.
pub const MAX_NAME_LEN: usize = 64;

pub const TYPE_FLOAT: i32 = 10;
pub const TYPE_INT: i32 = 20;
pub const TYPE_BYTE: i32 = 50;

/// Bytes per body element for a data-set value type.
#[must_use]
pub fn element_width(data_type: i32) -> usize {
    match data_type {
        TYPE_BYTE => 1,
        TYPE_FLOAT | TYPE_INT => 4,
        _ => 4,
    }
}

/// Length of the header portion of a data-set with a name of `name_len` bytes.
#[must_use]
pub fn base_data_size(name_len: usize) -> usize {
    NUM_HEADER_ELEMENTS * BYTES_IN_INT32 + name_len
}

/// Total byte length of one data-set, header and body.
///
/// # Errors
/// [Error::MalformedFrame] for negative fields, an implausible name length, or
/// a size that overflows.
pub fn dataset_size(
    data_type: i32,
    name_len: i32,
    num_elements: i32,
    element_multiplier: i32,
) -> Result<usize> {
    let name_len = usize::try_from(name_len)
        .ok()
        .filter(|n| *n <= MAX_NAME_LEN)
        .ok_or_else(|| Error::MalformedFrame(format!("invalid data-set name length {name_len}")))?;
    let (Ok(elements), Ok(multiplier)) = (
        usize::try_from(num_elements),
        usize::try_from(element_multiplier),
    ) else {
        return Err(Error::MalformedFrame(format!(
            "negative data-set dimensions {num_elements}x{element_multiplier}"
        )));
    };

    elements
        .checked_mul(multiplier)
        .and_then(|n| n.checked_mul(element_width(data_type)))
        .and_then(|n| n.checked_add(base_data_size(name_len)))
        .ok_or_else(|| {
            Error::MalformedFrame(format!(
                "data-set size overflow {num_elements}x{element_multiplier}"
            ))
        })
}

/// The self-describing header at the start of every data-set.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSetHeader {
    pub data_type: i32,
    /// Number of bins for grid data-sets, number of values otherwise.
    pub num_elements: i32,
    /// Number of beams for grid data-sets, 1 otherwise.
    pub element_multiplier: i32,
    pub image: i32,
    pub name_length: i32,
    pub name: [u8; DEFAULT_NAME_LEN],
}

impl DataSetHeader {
    /// Header length on the wire for the standard 8-byte name.
    pub const LEN: usize = NUM_HEADER_ELEMENTS * BYTES_IN_INT32 + DEFAULT_NAME_LEN;

    /// Header for a data-set of `kind` with the given dimensions.
    #[must_use]
    pub fn new(kind: DataSetKind, num_elements: i32, element_multiplier: i32) -> Self {
        DataSetHeader {
            data_type: kind.data_type(),
            num_elements,
            element_multiplier,
            image: 0,
            name_length: DEFAULT_NAME_LEN as i32,
            name: kind.name(),
        }
    }

    /// Decode the header at the start of `dat`.
    ///
    /// # Errors
    /// [Error::OutOfBounds] if `dat` is shorter than [DataSetHeader::LEN].
    pub fn decode(dat: &[u8]) -> Result<Self> {
        let field = |idx: usize| read_i32(dat, idx * BYTES_IN_INT32);
        let name_start = NUM_HEADER_ELEMENTS * BYTES_IN_INT32;
        let raw = dat
            .get(name_start..Self::LEN)
            .ok_or(Error::OutOfBounds {
                offset: name_start,
                width: DEFAULT_NAME_LEN,
                len: dat.len(),
            })?;
        let mut name = [0u8; DEFAULT_NAME_LEN];
        name.copy_from_slice(raw);

        Ok(DataSetHeader {
            data_type: field(0)?,
            num_elements: field(1)?,
            element_multiplier: field(2)?,
            image: field(3)?,
            name_length: field(4)?,
            name,
        })
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::LEN);
        for x in [
            self.data_type,
            self.num_elements,
            self.element_multiplier,
            self.image,
            self.name_length,
        ] {
            buf.extend_from_slice(&x.to_le_bytes());
        }
        buf.extend_from_slice(&self.name);
        buf
    }

    /// Name with NUL padding removed.
    #[must_use]
    pub fn tag(&self) -> String {
        String::from_utf8_lossy(&self.name)
            .trim_end_matches('\0')
            .to_string()
    }

    #[must_use]
    pub fn kind(&self) -> DataSetKind {
        DataSetKind::from_name(&self.name)
    }

    /// Offset of the first body element.
    ///
    /// Uses the declared name length, which is always 8 for instrument output.
    #[must_use]
    pub fn body_offset(&self) -> usize {
        base_data_size(usize::try_from(self.name_length).unwrap_or(DEFAULT_NAME_LEN))
    }

    /// Total byte length of this data-set.
    ///
    /// # Errors
    /// See [dataset_size].
    pub fn size(&self) -> Result<usize> {
        dataset_size(
            self.data_type,
            self.name_length,
            self.num_elements,
            self.element_multiplier,
        )
    }

    /// `(num_elements, element_multiplier)` as unsigned dimensions.
    ///
    /// # Errors
    /// [Error::MalformedFrame] if either is negative.
    pub fn dims(&self) -> Result<(usize, usize)> {
        match (
            usize::try_from(self.num_elements),
            usize::try_from(self.element_multiplier),
        ) {
            (Ok(bins), Ok(beams)) => Ok((bins, beams)),
            _ => Err(Error::MalformedFrame(format!(
                "negative dimensions for {}",
                self.tag()
            ))),
        }
    }
}

/// Known data-set tags.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSetKind {
    BeamVelocity,
    InstrumentVelocity,
    EarthVelocity,
    Amplitude,
    Correlation,
    GoodBeam,
    GoodEarth,
    EnsembleData,
    Ancillary,
    BottomTrack,
    Unknown,
}

impl DataSetKind {
    pub const KNOWN: [DataSetKind; 10] = [
        DataSetKind::BeamVelocity,
        DataSetKind::InstrumentVelocity,
        DataSetKind::EarthVelocity,
        DataSetKind::Amplitude,
        DataSetKind::Correlation,
        DataSetKind::GoodBeam,
        DataSetKind::GoodEarth,
        DataSetKind::EnsembleData,
        DataSetKind::Ancillary,
        DataSetKind::BottomTrack,
    ];

    /// Wire tag, or `None` for [DataSetKind::Unknown].
    #[must_use]
    pub fn tag(&self) -> Option<&'static str> {
        Some(match self {
            DataSetKind::BeamVelocity => "E000001",
            DataSetKind::InstrumentVelocity => "E000002",
            DataSetKind::EarthVelocity => "E000003",
            DataSetKind::Amplitude => "E000004",
            DataSetKind::Correlation => "E000005",
            DataSetKind::GoodBeam => "E000006",
            DataSetKind::GoodEarth => "E000007",
            DataSetKind::EnsembleData => "E000008",
            DataSetKind::Ancillary => "E000009",
            DataSetKind::BottomTrack => "E000010",
            DataSetKind::Unknown => return None,
        })
    }

    /// Match a raw header name exactly, ignoring NUL padding.
    #[must_use]
    pub fn from_name(name: &[u8]) -> Self {
        let end = name.iter().position(|b| *b == 0).unwrap_or(name.len());
        let name = &name[..end];
        Self::KNOWN
            .into_iter()
            .find(|kind| kind.tag().is_some_and(|t| t.as_bytes() == name))
            .unwrap_or(DataSetKind::Unknown)
    }

    /// NUL-padded wire name.
    #[must_use]
    pub fn name(&self) -> [u8; DEFAULT_NAME_LEN] {
        let mut name = [0u8; DEFAULT_NAME_LEN];
        if let Some(tag) = self.tag() {
            name[..tag.len()].copy_from_slice(tag.as_bytes());
        }
        name
    }

    /// Value type the instrument uses for this data-set.
    #[must_use]
    pub fn data_type(&self) -> i32 {
        match self {
            DataSetKind::GoodBeam | DataSetKind::GoodEarth | DataSetKind::EnsembleData => TYPE_INT,
            _ => TYPE_FLOAT,
        }
    }
}

impl Display for DataSetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self, self.tag().unwrap_or("?"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(TYPE_FLOAT, 30, 4 => 28 + 480; "float grid")]
    #[test_case(TYPE_INT, 23, 1 => 28 + 92; "ensemble data")]
    #[test_case(TYPE_BYTE, 10, 4 => 28 + 40; "byte grid")]
    #[test_case(TYPE_FLOAT, 0, 4 => 28; "no bins")]
    #[test_case(99, 2, 2 => 28 + 16; "unknown type defaults to 4 bytes")]
    fn size_formula(data_type: i32, elements: i32, multiplier: i32) -> usize {
        dataset_size(data_type, 8, elements, multiplier).unwrap()
    }

    #[test]
    fn size_rejects_negative_and_overflowing_fields() {
        assert!(dataset_size(TYPE_FLOAT, 8, -1, 4).is_err());
        assert!(dataset_size(TYPE_FLOAT, -8, 1, 4).is_err());
        assert!(dataset_size(TYPE_FLOAT, 1000, 1, 4).is_err());
        #[cfg(target_pointer_width = "32")]
        assert!(dataset_size(TYPE_FLOAT, 8, i32::MAX, i32::MAX).is_err());
    }

    #[test]
    fn header_encode_decode() {
        let header = DataSetHeader::new(DataSetKind::Amplitude, 30, 4);
        let dat = header.encode();
        assert_eq!(dat.len(), DataSetHeader::LEN);

        let got = DataSetHeader::decode(&dat).unwrap();
        assert_eq!(got, header);
        assert_eq!(got.tag(), "E000004");
        assert_eq!(got.kind(), DataSetKind::Amplitude);
        assert_eq!(got.size().unwrap(), 28 + 30 * 4 * 4);
    }

    #[test]
    fn header_decode_too_short() {
        let dat = DataSetHeader::new(DataSetKind::Amplitude, 1, 1).encode();
        assert!(matches!(
            DataSetHeader::decode(&dat[..27]),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn kind_matches_exact_tag_only() {
        assert_eq!(DataSetKind::from_name(b"E000001\0"), DataSetKind::BeamVelocity);
        assert_eq!(DataSetKind::from_name(b"E000010\0"), DataSetKind::BottomTrack);
        assert_eq!(DataSetKind::from_name(b"E000011\0"), DataSetKind::Unknown);
        assert_eq!(DataSetKind::from_name(b"XE000001"), DataSetKind::Unknown);
        assert_eq!(DataSetKind::from_name(b"E0000012"), DataSetKind::Unknown);
    }

    #[test]
    fn every_known_kind_round_trips_its_name() {
        for kind in DataSetKind::KNOWN {
            assert_eq!(DataSetKind::from_name(&kind.name()), kind, "{kind}");
        }
    }
}
