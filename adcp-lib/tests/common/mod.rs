#![allow(dead_code)]

use adcp::ensemble::{DataSetHeader, DataSetKind};
use adcp::framing::encode_frame;

/// Builds ensemble payloads out of wire-format data-sets.
#[derive(Default)]
pub struct PayloadBuilder {
    dat: Vec<u8>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A float grid where each cell holds `value(bin, beam)`.
    pub fn float_grid<F>(mut self, kind: DataSetKind, bins: usize, beams: usize, value: F) -> Self
    where
        F: Fn(usize, usize) -> f32,
    {
        self.dat
            .extend(DataSetHeader::new(kind, bins as i32, beams as i32).encode());
        for beam in 0..beams {
            for bin in 0..bins {
                self.dat.extend_from_slice(&value(bin, beam).to_le_bytes());
            }
        }
        self
    }

    pub fn int_grid<F>(mut self, kind: DataSetKind, bins: usize, beams: usize, value: F) -> Self
    where
        F: Fn(usize, usize) -> i32,
    {
        self.dat
            .extend(DataSetHeader::new(kind, bins as i32, beams as i32).encode());
        for beam in 0..beams {
            for bin in 0..bins {
                self.dat.extend_from_slice(&value(bin, beam).to_le_bytes());
            }
        }
        self
    }

    /// Ensemble data with the full trailing serial/firmware/config block.
    pub fn ensemble_data(mut self, number: i32, bins: i32, beams: i32, time: [i32; 7]) -> Self {
        let mut ints = vec![number, bins, beams, 10, 10, 0];
        ints.extend_from_slice(&time);

        let mut body = Vec::new();
        for v in ints {
            body.extend_from_slice(&v.to_le_bytes());
        }
        let mut serial = [0u8; 32];
        serial[..14].copy_from_slice(b"01300000000001");
        body.extend_from_slice(&serial);
        // revision, minor, major, subsystem code
        body.extend_from_slice(&[4, 2, 0, b'3']);
        body.extend_from_slice(&[1, 0, 0, 0]);

        let elements = (body.len() / 4) as i32;
        self.dat
            .extend(DataSetHeader::new(DataSetKind::EnsembleData, elements, 1).encode());
        self.dat.extend(body);
        self
    }

    pub fn floats(mut self, kind: DataSetKind, values: &[f32]) -> Self {
        self.dat
            .extend(DataSetHeader::new(kind, values.len() as i32, 1).encode());
        for v in values {
            self.dat.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    /// A data-set with an unrecognized tag and `len` body bytes.
    pub fn unknown(mut self, name: &[u8; 8], len: usize) -> Self {
        let mut header = DataSetHeader::new(DataSetKind::Unknown, len as i32, 1);
        header.data_type = adcp::ensemble::TYPE_BYTE;
        header.name = *name;
        self.dat.extend(header.encode());
        self.dat.extend(std::iter::repeat(0xab).take(len));
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.dat
    }

    pub fn frame(self, number: u32) -> Vec<u8> {
        encode_frame(number, &self.dat)
    }
}

/// A realistic four beam ensemble with every known data-set.
pub fn full_ensemble(number: u32, bins: usize) -> Vec<u8> {
    let mut ancillary = vec![
        0.5, 0.25, 0.0, 1.2, 90.0, 1.0, -1.0, 14.0, 21.0, 35.0, 0.0, 0.2, 1500.0,
    ];
    ancillary.extend_from_slice(&[0.4, 0.0, 0.0, 1.0]);

    // 14 scalars, 4 beams, followed by 10 per-beam vectors
    let mut bottom_track = vec![
        0.0, 1.2, 90.0, 1.0, -1.0, 14.0, 21.0, 35.0, 0.0, 0.2, 1500.0, 0.0, 4.0, 10.0,
    ];
    bottom_track.extend((0..40).map(|i| i as f32));

    PayloadBuilder::new()
        .ensemble_data(number as i32, bins as i32, 4, [2024, 6, 1, 12, 30, 15, 25])
        .float_grid(DataSetKind::BeamVelocity, bins, 4, |bin, beam| {
            (bin * 10 + beam) as f32
        })
        .float_grid(DataSetKind::InstrumentVelocity, bins, 4, |_, _| 0.1)
        .float_grid(DataSetKind::EarthVelocity, bins, 4, |bin, _| {
            if bin == 0 {
                adcp::ensemble::BAD_VELOCITY
            } else {
                0.2
            }
        })
        .float_grid(DataSetKind::Amplitude, bins, 4, |bin, _| 80.0 - bin as f32)
        .float_grid(DataSetKind::Correlation, bins, 4, |_, _| 0.9)
        .int_grid(DataSetKind::GoodBeam, bins, 4, |_, _| 10)
        .int_grid(DataSetKind::GoodEarth, bins, 4, |_, beam| beam as i32)
        .floats(DataSetKind::Ancillary, &ancillary)
        .floats(DataSetKind::BottomTrack, &bottom_track)
        .frame(number)
}
