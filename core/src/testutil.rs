//! Synthetic detectors and a toy geometry shared by unit tests.

use std::f64::consts::TAU;

use num_complex::Complex32;

use crate::interface::{
    AntennaCoeffs, BinaryOrbit, ComplexTimeSeries, MultiAntennaCoeffs, MultiDetectorInput,
    SegmentTimestamps, SkyPosition, TimingMap,
};
use crate::prelude::{ResampError, ResampResult, SkyGeometry};
use crate::processing::binary;

pub(crate) const EPOCH: f64 = 1_000_000_000.0;
pub(crate) const F_HET: f64 = 100.0;
pub(crate) const DELTA_T: f64 = 1.0;
pub(crate) const T_SEG: f64 = 512.0;

/// Timing is `mid - ref_time` plus a sinusoidal sky-dependent delay; antenna
/// patterns are fixed per segment.
#[derive(Debug, Clone)]
pub(crate) struct ToyGeometry {
    pub stamps: Vec<SegmentTimestamps>,
    pub a: Vec<Vec<f32>>,
    pub b: Vec<Vec<f32>>,
    pub scale: f32,
    pub delay_amplitude: f64,
    pub delay_period: f64,
    pub reject_binary: bool,
    pub fail_sky: bool,
}

impl ToyGeometry {
    /// Identity timing with `a = (1, 0)`, `b = (0, 1)` on every detector,
    /// normalized so a unit tone on a bin gives 2F = 4 per detector.
    pub fn identity(stamps: Vec<SegmentTimestamps>) -> Self {
        let a = stamps.iter().map(|_| vec![1.0, 0.0]).collect();
        let b = stamps.iter().map(|_| vec![0.0, 1.0]).collect();
        Self {
            stamps,
            a,
            b,
            scale: (T_SEG * T_SEG) as f32,
            delay_amplitude: 0.0,
            delay_period: 2000.0,
            reject_binary: false,
            fail_sky: false,
        }
    }
}

impl SkyGeometry for ToyGeometry {
    fn sky_timing(&self, sky: &SkyPosition, ref_time: f64) -> ResampResult<Vec<TimingMap>> {
        if self.fail_sky {
            return Err(ResampError::Geometry("sky timing unavailable".into()));
        }
        let amplitude = self.delay_amplitude * sky.delta.cos();
        let omega = TAU / self.delay_period;
        Ok(self
            .stamps
            .iter()
            .map(|stamps| {
                let mut delta_t = Vec::with_capacity(stamps.len());
                let mut tdot = Vec::with_capacity(stamps.len());
                for &start in &stamps.starts {
                    let mid = (start - EPOCH) + 0.5 * stamps.t_seg;
                    let phase = omega * mid + sky.alpha;
                    delta_t.push((EPOCH - ref_time) + mid + amplitude * phase.sin());
                    tdot.push(1.0 + amplitude * omega * phase.cos());
                }
                TimingMap::new(ref_time, delta_t, tdot)
            })
            .collect())
    }

    fn antenna_coeffs(&self, _sky: &SkyPosition) -> ResampResult<MultiAntennaCoeffs> {
        if self.fail_sky {
            return Err(ResampError::Geometry("antenna patterns unavailable".into()));
        }
        Ok(MultiAntennaCoeffs::new(
            self.a
                .iter()
                .zip(&self.b)
                .map(|(a, b)| AntennaCoeffs::from_segments(a.clone(), b.clone(), self.scale))
                .collect(),
        ))
    }

    fn binary_timing(
        &self,
        sky_timing: &[TimingMap],
        orbit: &BinaryOrbit,
    ) -> ResampResult<Vec<TimingMap>> {
        if self.reject_binary {
            return Err(ResampError::Geometry("binary timing unavailable".into()));
        }
        binary::add_multi_binary_timing(sky_timing, orbit)
    }
}

/// Unit-rate complex tone `amplitude * exp(2 pi i freq t)` at baseband.
pub(crate) fn tone(name: &str, len: usize, freq: f64, amplitude: f32) -> ComplexTimeSeries {
    let data = (0..len)
        .map(|k| {
            let phase = TAU * (freq * k as f64 * DELTA_T).fract();
            Complex32::from_polar(amplitude, phase as f32)
        })
        .collect();
    ComplexTimeSeries::new(name, EPOCH, F_HET, DELTA_T, data)
}

/// One detector, two contiguous 512 s segments, tone 100 bins above the
/// heterodyne frequency.
pub(crate) fn single_detector_setup(delay_amplitude: f64) -> (MultiDetectorInput, ToyGeometry) {
    let stamps = vec![SegmentTimestamps::contiguous(EPOCH, T_SEG, 2)];
    let series = vec![tone("H1", 1024, 100.0 / 1024.0, 1.0)];
    let mut geometry = ToyGeometry::identity(stamps.clone());
    geometry.delay_amplitude = delay_amplitude;
    (MultiDetectorInput::new(series, stamps).unwrap(), geometry)
}
