use serde::{Deserialize, Serialize};

use crate::prelude::{ResampError, ResampResult};

/// Per-segment mapping from detector time to source-frame time.
///
/// `ref_time + delta_t[j]` is the source-frame time of segment `j`'s midpoint
/// and `tdot[j]` the derivative `dt_source / dt_detector` at that midpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingMap {
    pub ref_time: f64,
    pub delta_t: Vec<f64>,
    pub tdot: Vec<f64>,
}

impl TimingMap {
    pub fn new(ref_time: f64, delta_t: Vec<f64>, tdot: Vec<f64>) -> Self {
        Self {
            ref_time,
            delta_t,
            tdot,
        }
    }

    pub fn len(&self) -> usize {
        self.delta_t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delta_t.is_empty()
    }

    /// Source-frame time of segment `j`'s midpoint relative to `epoch`.
    pub fn source_mid(&self, j: usize, epoch: f64) -> f64 {
        (self.ref_time - epoch) + self.delta_t[j]
    }

    /// Source-frame start of segment `j` relative to `epoch`.
    pub fn source_start(&self, j: usize, t_seg: f64, epoch: f64) -> f64 {
        self.source_mid(j, epoch) - 0.5 * t_seg * self.tdot[j]
    }

    /// Source-frame end of segment `j` relative to `epoch`.
    pub fn source_end(&self, j: usize, t_seg: f64, epoch: f64) -> f64 {
        self.source_mid(j, epoch) + 0.5 * t_seg * self.tdot[j]
    }
}

/// Antenna-pattern quadratic-form coefficients (`A`, `B`, `C`, `E`) and the
/// determinant `D = A*B - C^2 - E^2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntennaNormalization {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub e: f32,
    pub d: f32,
}

impl AntennaNormalization {
    pub fn new(a: f32, b: f32, c: f32, e: f32) -> Self {
        Self {
            a,
            b,
            c,
            e,
            d: a * b - c * c - e * e,
        }
    }

    fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    fn accumulate(self, other: &Self) -> Self {
        Self::new(
            self.a + other.a,
            self.b + other.b,
            self.c + other.c,
            self.e + other.e,
        )
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.d > 0.0) || !self.d.is_finite()
    }
}

/// Antenna coefficients of one detector, evaluated at segment midpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct AntennaCoeffs {
    pub a: Vec<f32>,
    pub b: Vec<f32>,
    pub norm: AntennaNormalization,
}

impl AntennaCoeffs {
    pub fn new(a: Vec<f32>, b: Vec<f32>, norm: AntennaNormalization) -> Self {
        Self { a, b, norm }
    }

    /// Builds the normalization from the segment values as `scale * sum(a*a)`
    /// etc. `scale` folds in segment duration and noise weight.
    pub fn from_segments(a: Vec<f32>, b: Vec<f32>, scale: f32) -> Self {
        let (mut aa, mut bb, mut ab) = (0.0f32, 0.0f32, 0.0f32);
        for (&ai, &bi) in a.iter().zip(&b) {
            aa += ai * ai;
            bb += bi * bi;
            ab += ai * bi;
        }
        let norm = AntennaNormalization::new(scale * aa, scale * bb, scale * ab, 0.0);
        Self { a, b, norm }
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

/// Antenna coefficients for all detectors plus their summed normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiAntennaCoeffs {
    pub per_detector: Vec<AntennaCoeffs>,
    pub norm: AntennaNormalization,
}

impl MultiAntennaCoeffs {
    pub fn new(per_detector: Vec<AntennaCoeffs>) -> Self {
        let norm = per_detector
            .iter()
            .fold(AntennaNormalization::zero(), |acc, coeffs| {
                acc.accumulate(&coeffs.norm)
            });
        Self { per_detector, norm }
    }

    pub fn num_detectors(&self) -> usize {
        self.per_detector.len()
    }

    /// Checks provider output against the expected per-detector segment counts.
    pub fn check_shape(&self, segments: &[usize]) -> ResampResult<()> {
        if self.per_detector.len() != segments.len() {
            return Err(ResampError::Geometry(format!(
                "antenna coefficients for {} detectors, expected {}",
                self.per_detector.len(),
                segments.len()
            )));
        }
        for (x, (coeffs, &count)) in self.per_detector.iter().zip(segments).enumerate() {
            if coeffs.a.len() != count || coeffs.b.len() != count {
                return Err(ResampError::Geometry(format!(
                    "detector {}: {} a / {} b coefficients for {} segments",
                    x,
                    coeffs.a.len(),
                    coeffs.b.len(),
                    count
                )));
            }
        }
        if self.norm.is_degenerate() {
            return Err(ResampError::Geometry(format!(
                "degenerate antenna normalization (D = {})",
                self.norm.d
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_sums_over_detectors() {
        let h1 = AntennaCoeffs::from_segments(vec![1.0, 0.0], vec![0.0, 1.0], 2.0);
        let l1 = AntennaCoeffs::from_segments(vec![0.5, 0.5], vec![0.5, -0.5], 2.0);
        let multi = MultiAntennaCoeffs::new(vec![h1, l1]);
        assert_eq!(multi.norm.a, 3.0);
        assert_eq!(multi.norm.b, 3.0);
        assert_eq!(multi.norm.c, 0.0);
        assert_eq!(multi.norm.d, 9.0);
    }

    #[test]
    fn parallel_patterns_are_degenerate() {
        let coeffs = AntennaCoeffs::from_segments(vec![1.0, 1.0], vec![1.0, 1.0], 1.0);
        let multi = MultiAntennaCoeffs::new(vec![coeffs]);
        assert!(multi.norm.is_degenerate());
        assert!(matches!(
            multi.check_shape(&[2]),
            Err(ResampError::Geometry(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let coeffs = AntennaCoeffs::from_segments(vec![1.0, 0.0], vec![0.0, 1.0], 1.0);
        let multi = MultiAntennaCoeffs::new(vec![coeffs]);
        assert!(multi.check_shape(&[2]).is_ok());
        assert!(multi.check_shape(&[3]).is_err());
    }

    #[test]
    fn source_span_scales_with_tdot() {
        let timing = TimingMap::new(1000.0, vec![50.0], vec![1.5]);
        assert_eq!(timing.source_mid(0, 1000.0), 50.0);
        assert_eq!(timing.source_start(0, 20.0, 1000.0), 35.0);
        assert_eq!(timing.source_end(0, 20.0, 1000.0), 65.0);
    }
}
