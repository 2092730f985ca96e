use num_complex::Complex32;

use crate::prelude::{ResampError, ResampResult};

/// Uniformly sampled complex baseband series.
///
/// Used both for the heterodyned detector-frame input and for the resampled
/// source-frame series held in the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexTimeSeries {
    pub name: String,
    /// GPS time of the first sample.
    pub epoch: f64,
    /// Heterodyne frequency removed from the data (Hz).
    pub f_het: f64,
    pub delta_t: f64,
    pub data: Vec<Complex32>,
}

impl ComplexTimeSeries {
    pub fn new(
        name: impl Into<String>,
        epoch: f64,
        f_het: f64,
        delta_t: f64,
        data: Vec<Complex32>,
    ) -> Self {
        Self {
            name: name.into(),
            epoch,
            f_het,
            delta_t,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Covered duration `len * delta_t`.
    pub fn span(&self) -> f64 {
        self.data.len() as f64 * self.delta_t
    }

    /// Time of the last sample.
    pub fn end_time(&self) -> f64 {
        self.epoch + (self.data.len().saturating_sub(1)) as f64 * self.delta_t
    }
}

/// Start times of the data segments contributing to one detector.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTimestamps {
    /// Duration of every segment (s).
    pub t_seg: f64,
    pub starts: Vec<f64>,
}

impl SegmentTimestamps {
    pub fn new(t_seg: f64, starts: Vec<f64>) -> Self {
        Self { t_seg, starts }
    }

    /// Contiguous segments covering `[start, start + count * t_seg)`.
    pub fn contiguous(start: f64, t_seg: f64, count: usize) -> Self {
        let starts = (0..count).map(|j| start + j as f64 * t_seg).collect();
        Self { t_seg, starts }
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// Detector-frame input bundle, built once at setup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct MultiDetectorInput {
    series: Vec<ComplexTimeSeries>,
    timestamps: Vec<SegmentTimestamps>,
}

impl MultiDetectorInput {
    /// Checks the coincidence invariant: every detector shares epoch, sample
    /// interval, length and heterodyne frequency, so frequency bins line up.
    pub fn new(
        series: Vec<ComplexTimeSeries>,
        timestamps: Vec<SegmentTimestamps>,
    ) -> ResampResult<Self> {
        let first = series
            .first()
            .ok_or_else(|| ResampError::InvalidArgument("no detector series given".into()))?;
        if series.len() != timestamps.len() {
            return Err(ResampError::InvalidArgument(format!(
                "{} detector series but {} timestamp lists",
                series.len(),
                timestamps.len()
            )));
        }
        if first.is_empty() {
            return Err(ResampError::InvalidArgument(format!(
                "detector series '{}' is empty",
                first.name
            )));
        }
        if !(first.delta_t > 0.0) || !first.delta_t.is_finite() {
            return Err(ResampError::InvalidArgument(format!(
                "sample interval must be positive, got {}",
                first.delta_t
            )));
        }

        for ts in &series[1..] {
            if ts.epoch != first.epoch
                || ts.delta_t != first.delta_t
                || ts.len() != first.len()
                || ts.f_het != first.f_het
            {
                return Err(ResampError::InvalidArgument(format!(
                    "detector series '{}' is not coincident with '{}'",
                    ts.name, first.name
                )));
            }
        }

        let t_seg = timestamps[0].t_seg;
        if !(t_seg > 0.0) {
            return Err(ResampError::InvalidArgument(format!(
                "segment duration must be positive, got {}",
                t_seg
            )));
        }
        for (ts, stamps) in series.iter().zip(&timestamps) {
            if stamps.is_empty() {
                return Err(ResampError::InvalidArgument(format!(
                    "detector '{}' has no data segments",
                    ts.name
                )));
            }
            if stamps.t_seg != t_seg {
                return Err(ResampError::InvalidArgument(format!(
                    "detector '{}' uses segment duration {} instead of {}",
                    ts.name, stamps.t_seg, t_seg
                )));
            }
        }

        Ok(Self { series, timestamps })
    }

    pub fn num_detectors(&self) -> usize {
        self.series.len()
    }

    pub fn series(&self) -> &[ComplexTimeSeries] {
        &self.series
    }

    pub fn timestamps(&self) -> &[SegmentTimestamps] {
        &self.timestamps
    }

    pub fn t_seg(&self) -> f64 {
        self.timestamps[0].t_seg
    }

    pub fn delta_t(&self) -> f64 {
        self.series[0].delta_t
    }

    pub fn f_het(&self) -> f64 {
        self.series[0].f_het
    }

    pub fn num_samples(&self) -> usize {
        self.series[0].len()
    }

    pub fn span(&self) -> f64 {
        self.series[0].span()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(name: &str, epoch: f64, len: usize) -> ComplexTimeSeries {
        ComplexTimeSeries::new(name, epoch, 50.0, 0.5, vec![Complex32::new(1.0, 0.0); len])
    }

    #[test]
    fn coincident_detectors_are_accepted() {
        let input = MultiDetectorInput::new(
            vec![series("H1", 100.0, 16), series("L1", 100.0, 16)],
            vec![
                SegmentTimestamps::contiguous(100.0, 4.0, 2),
                SegmentTimestamps::contiguous(104.0, 4.0, 1),
            ],
        )
        .unwrap();
        assert_eq!(input.num_detectors(), 2);
        assert_eq!(input.span(), 8.0);
    }

    #[test]
    fn shifted_epoch_breaks_coincidence() {
        let err = MultiDetectorInput::new(
            vec![series("H1", 100.0, 16), series("L1", 101.0, 16)],
            vec![
                SegmentTimestamps::contiguous(100.0, 4.0, 2),
                SegmentTimestamps::contiguous(101.0, 4.0, 2),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ResampError::InvalidArgument(_)));
    }

    #[test]
    fn empty_bundle_is_rejected() {
        assert!(MultiDetectorInput::new(vec![], vec![]).is_err());
    }

    #[test]
    fn end_time_is_last_sample() {
        let ts = series("V1", 10.0, 5);
        assert_eq!(ts.end_time(), 12.0);
        assert_eq!(ts.span(), 2.5);
    }
}
