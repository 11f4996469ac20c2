//! Bin x beam data-sets.
//!
//! Velocity, amplitude, correlation and good-ping data-sets share one layout:
//! a [DataSetHeader] followed by `beams * bins` 4-byte values stored beam by
//! beam, i.e., all bins of beam 0, then all bins of beam 1, and so on.
use ndarray::Array2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::DataSetHeader;
use crate::bytes::FieldReader;
use crate::Result;

/// Marker for a velocity (or amplitude/correlation) cell with no valid value.
pub const BAD_VELOCITY: f32 = -32768.0;

/// Float grid shaped `(bins, beams)`, indexed `grid[[bin, beam]]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FloatGrid {
    pub header: DataSetHeader,
    pub grid: Array2<f32>,
}

/// Integer grid shaped `(bins, beams)`, used for good-ping counts/flags.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntGrid {
    pub header: DataSetHeader,
    pub grid: Array2<i32>,
}

pub type BeamVelocity = FloatGrid;
pub type InstrumentVelocity = FloatGrid;
pub type EarthVelocity = FloatGrid;
pub type Amplitude = FloatGrid;
pub type Correlation = FloatGrid;
pub type GoodBeam = IntGrid;
pub type GoodEarth = IntGrid;

fn fill<T, F>(grid: &mut Array2<T>, mut read: F) -> Result<()>
where
    F: FnMut(usize) -> Result<T>,
{
    let (bins, beams) = grid.dim();
    let mut idx = 0;
    for beam in 0..beams {
        for bin in 0..bins {
            grid[[bin, beam]] = read(idx)?;
            idx += 1;
        }
    }
    Ok(())
}

impl FloatGrid {
    /// Decode a float grid data-set; `dat` starts at the data-set header.
    ///
    /// # Errors
    /// [crate::Error::OutOfBounds] if `dat` holds fewer values than the header
    /// declares.
    pub fn decode(header: DataSetHeader, dat: &[u8]) -> Result<Self> {
        let (bins, beams) = header.dims()?;
        let mut grid = Array2::from_elem((bins, beams), BAD_VELOCITY);
        let r = FieldReader::new(dat, header.body_offset());
        fill(&mut grid, |idx| r.element_f32(idx))?;
        Ok(FloatGrid { header, grid })
    }

    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.grid.nrows()
    }

    #[must_use]
    pub fn num_beams(&self) -> usize {
        self.grid.ncols()
    }

    /// Cell value, or `None` if out of range or marked [BAD_VELOCITY].
    #[must_use]
    pub fn value(&self, bin: usize, beam: usize) -> Option<f32> {
        self.grid
            .get([bin, beam])
            .copied()
            .filter(|v| *v != BAD_VELOCITY)
    }
}

impl IntGrid {
    /// Decode an integer grid data-set; `dat` starts at the data-set header.
    ///
    /// # Errors
    /// [crate::Error::OutOfBounds] if `dat` holds fewer values than the header
    /// declares.
    pub fn decode(header: DataSetHeader, dat: &[u8]) -> Result<Self> {
        let (bins, beams) = header.dims()?;
        let mut grid = Array2::zeros((bins, beams));
        let r = FieldReader::new(dat, header.body_offset());
        fill(&mut grid, |idx| r.element_i32(idx))?;
        Ok(IntGrid { header, grid })
    }

    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.grid.nrows()
    }

    #[must_use]
    pub fn num_beams(&self) -> usize {
        self.grid.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::DataSetKind;
    use crate::Error;

    fn float_dataset(kind: DataSetKind, bins: i32, beams: i32, values: &[f32]) -> Vec<u8> {
        let mut dat = DataSetHeader::new(kind, bins, beams).encode();
        for v in values {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        dat
    }

    #[test]
    fn decodes_beam_major_layout() {
        // 3 bins, 2 beams; wire order beam 0 bins 0..3, then beam 1
        let values = [0.0, 0.1, 0.2, 1.0, 1.1, 1.2];
        let dat = float_dataset(DataSetKind::BeamVelocity, 3, 2, &values);
        let header = DataSetHeader::decode(&dat).unwrap();

        let bv = FloatGrid::decode(header, &dat).unwrap();
        assert_eq!(bv.num_bins(), 3);
        assert_eq!(bv.num_beams(), 2);
        assert_eq!(bv.grid[[0, 0]], 0.0);
        assert_eq!(bv.grid[[2, 0]], 0.2);
        assert_eq!(bv.grid[[0, 1]], 1.0);
        assert_eq!(bv.grid[[2, 1]], 1.2);
    }

    #[test]
    fn every_cell_of_30x4_grid_is_decoded() {
        let values: Vec<f32> = (0..120).map(|i| i as f32 * 0.01).collect();
        let dat = float_dataset(DataSetKind::BeamVelocity, 30, 4, &values);
        let header = DataSetHeader::decode(&dat).unwrap();

        let bv = FloatGrid::decode(header, &dat).unwrap();
        assert_eq!(bv.grid.len(), 120);
        assert!(bv.grid.iter().all(|v| *v != BAD_VELOCITY));
        for beam in 0..4 {
            for bin in 0..30 {
                assert_eq!(bv.grid[[bin, beam]], values[beam * 30 + bin]);
            }
        }
    }

    #[test]
    fn sentinel_maps_to_none() {
        let dat = float_dataset(DataSetKind::EarthVelocity, 1, 2, &[BAD_VELOCITY, 0.25]);
        let header = DataSetHeader::decode(&dat).unwrap();
        let ev = FloatGrid::decode(header, &dat).unwrap();
        assert_eq!(ev.grid[[0, 0]], BAD_VELOCITY);
        assert_eq!(ev.value(0, 0), None);
        assert_eq!(ev.value(0, 1), Some(0.25));
        assert_eq!(ev.value(5, 5), None);
    }

    #[test]
    fn int_grid_decodes_flags() {
        let mut dat = DataSetHeader::new(DataSetKind::GoodEarth, 2, 2).encode();
        for v in [1i32, 0, 1, 1] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        let header = DataSetHeader::decode(&dat).unwrap();
        let ge = IntGrid::decode(header, &dat).unwrap();
        assert_eq!(ge.grid[[0, 0]], 1);
        assert_eq!(ge.grid[[1, 0]], 0);
        assert_eq!(ge.grid[[0, 1]], 1);
        assert_eq!(ge.grid[[1, 1]], 1);
    }

    #[test]
    fn truncated_grid_is_out_of_bounds() {
        let dat = float_dataset(DataSetKind::Amplitude, 2, 2, &[1.0, 2.0, 3.0]);
        let header = DataSetHeader::decode(&dat).unwrap();
        assert!(matches!(
            FloatGrid::decode(header, &dat),
            Err(Error::OutOfBounds { .. })
        ));
    }
}
