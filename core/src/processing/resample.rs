use std::f64::consts::TAU;

use num_complex::{Complex32, Complex64};

use crate::interface::{ComplexTimeSeries, MultiDetectorInput, SegmentTimestamps, TimingMap};
use crate::math::spline::UniformSpline;
use crate::prelude::{ResampError, ResampResult};
use crate::processing::scratch;
use crate::telemetry::log::LogManager;

/// Relative tolerance under which `T_eff / dt` counts as an integer.
const INTEGER_RATIO_TOL: f64 = 1e-9;

/// Uniform source-frame sampling shared by all detectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGrid {
    /// Start of the grid relative to the detector-frame epoch.
    pub offset: f64,
    pub delta_t: f64,
    pub num_samples: usize,
}

impl OutputGrid {
    /// Grid starting at the earliest source-frame segment start, spanning
    /// `1 / d_freq` rounded up to whole detector samples.
    pub fn new(
        timing: &[TimingMap],
        t_seg: f64,
        epoch: f64,
        delta_t_det: f64,
        d_freq: f64,
    ) -> ResampResult<Self> {
        let offset = timing
            .iter()
            .flat_map(|map| (0..map.len()).map(move |j| map.source_start(j, t_seg, epoch)))
            .fold(f64::INFINITY, f64::min);
        if !offset.is_finite() {
            return Err(ResampError::Geometry(
                "timing maps contain no segments".into(),
            ));
        }

        let num_samples = Self::num_samples_for(d_freq, delta_t_det)?;
        Ok(Self {
            offset,
            delta_t: (1.0 / d_freq) / num_samples as f64,
            num_samples,
        })
    }

    /// Grid length for `d_freq`: `1 / d_freq` in detector samples, rounded up
    /// unless already integral. Independent of the timing maps.
    pub fn num_samples_for(d_freq: f64, delta_t_det: f64) -> ResampResult<usize> {
        if !(d_freq > 0.0) || !d_freq.is_finite() {
            return Err(ResampError::InvalidArgument(format!(
                "frequency resolution must be positive, got {}",
                d_freq
            )));
        }
        let ratio = (1.0 / d_freq) / delta_t_det;
        if !ratio.is_finite() || ratio >= usize::MAX as f64 {
            return Err(ResampError::InvalidArgument(format!(
                "frequency resolution {} Hz needs more samples than can be addressed",
                d_freq
            )));
        }
        let rounded = ratio.round();
        let num_samples = if (ratio - rounded).abs() <= INTEGER_RATIO_TOL * rounded.max(1.0) {
            rounded
        } else {
            ratio.ceil()
        } as usize;
        Ok(num_samples.max(1))
    }

    pub fn span(&self) -> f64 {
        self.num_samples as f64 * self.delta_t
    }
}

/// Source-frame series for one detector plus bookkeeping for the weighting
/// step and diagnostics.
#[derive(Debug, Clone)]
pub struct ResampledDetector {
    pub series: ComplexTimeSeries,
    /// Segment start times translated into the source frame.
    pub segment_starts: Vec<f64>,
    pub clamped: usize,
    pub dropped: usize,
}

/// Remaps detector-frame series onto a uniform source-frame grid.
pub struct BarycentricResampler {
    logger: LogManager,
}

impl BarycentricResampler {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("resampler"),
        }
    }

    pub fn resample_multi(
        &self,
        input: &MultiDetectorInput,
        timing: &[TimingMap],
        d_freq: f64,
    ) -> ResampResult<Vec<ResampledDetector>> {
        if timing.len() != input.num_detectors() {
            return Err(ResampError::Geometry(format!(
                "timing for {} detectors, expected {}",
                timing.len(),
                input.num_detectors()
            )));
        }
        for (x, (map, stamps)) in timing.iter().zip(input.timestamps()).enumerate() {
            check_timing(x, map, stamps)?;
        }

        let epoch = input.series()[0].epoch;
        let grid = OutputGrid::new(timing, input.t_seg(), epoch, input.delta_t(), d_freq)?;
        self.logger.detail(&format!(
            "output grid: {} samples at {:.6} s, offset {:.3} s",
            grid.num_samples, grid.delta_t, grid.offset
        ));

        let mut out = Vec::with_capacity(input.num_detectors());
        for ((series, stamps), map) in input.series().iter().zip(input.timestamps()).zip(timing) {
            let resampled = resample_detector(series, stamps, map, &grid)?;
            if resampled.clamped > 0 {
                self.logger.warn(&format!(
                    "{}: {} interpolation times fell outside the detector series and were clamped",
                    series.name, resampled.clamped
                ));
            }
            if resampled.dropped > 0 {
                self.logger.warn(&format!(
                    "{}: {} source-frame samples beyond 1/dFreq were dropped",
                    series.name, resampled.dropped
                ));
            }
            out.push(resampled);
        }
        Ok(out)
    }
}

impl Default for BarycentricResampler {
    fn default() -> Self {
        Self::new()
    }
}

fn check_timing(x: usize, map: &TimingMap, stamps: &SegmentTimestamps) -> ResampResult<()> {
    if map.delta_t.len() != stamps.len() || map.tdot.len() != stamps.len() {
        return Err(ResampError::Geometry(format!(
            "detector {}: timing for {} / {} segments, expected {}",
            x,
            map.delta_t.len(),
            map.tdot.len(),
            stamps.len()
        )));
    }
    if let Some(j) = map.tdot.iter().position(|&td| !(td > 0.0) || !td.is_finite()) {
        return Err(ResampError::Geometry(format!(
            "detector {}: non-positive time derivative {} in segment {}",
            x, map.tdot[j], j
        )));
    }
    if map.delta_t.iter().any(|dt| !dt.is_finite()) || !map.ref_time.is_finite() {
        return Err(ResampError::Geometry(format!(
            "detector {}: non-finite timing delays",
            x
        )));
    }
    Ok(())
}

/// Resamples one detector onto `grid`.
///
/// Within each segment, detector time is a first-order expansion about the
/// segment midpoint, `t_det = mid_det + (t_src - mid_src) / tdot`. The spline
/// state lives only for this call. `timing` must already have passed
/// `check_timing` against `stamps`.
pub(crate) fn resample_detector(
    series: &ComplexTimeSeries,
    stamps: &SegmentTimestamps,
    timing: &TimingMap,
    grid: &OutputGrid,
) -> ResampResult<ResampledDetector> {
    if series.is_empty() {
        return Err(ResampError::InvalidArgument(format!(
            "detector series '{}' is empty",
            series.name
        )));
    }

    let epoch = series.epoch;
    let t_seg = stamps.t_seg;
    let end_det = series.end_time() - epoch;

    let mut re = scratch::zeroed::<f64>(series.len(), "spline real part")?;
    let mut im = scratch::zeroed::<f64>(series.len(), "spline imaginary part")?;
    for (k, sample) in series.data.iter().enumerate() {
        re[k] = f64::from(sample.re);
        im[k] = f64::from(sample.im);
    }
    let spline_re = UniformSpline::natural(0.0, series.delta_t, &re)?;
    let spline_im = UniformSpline::natural(0.0, series.delta_t, &im)?;

    let mut data = scratch::zeroed::<Complex32>(grid.num_samples, "source-frame series")?;
    let mut segment_starts = Vec::with_capacity(stamps.len());
    let (mut clamped, mut dropped) = (0usize, 0usize);

    for (j, &seg_start_det) in stamps.starts.iter().enumerate() {
        let tdot = timing.tdot[j];
        let mid_src = timing.source_mid(j, epoch);
        let start_src = timing.source_start(j, t_seg, epoch);
        let end_src = timing.source_end(j, t_seg, epoch);
        let mid_det = (seg_start_det - epoch) + 0.5 * t_seg;
        segment_starts.push(epoch + start_src);

        let first = ((start_src - grid.offset) / grid.delta_t).round() as i64;
        let last = ((end_src - grid.offset) / grid.delta_t).round() as i64;

        // the inclusive end sample doubles as the next segment's start, so
        // only [first, last) counts towards samples lost past the grid
        let grid_last = grid.num_samples as i64 - 1;
        let overflow_from = first.max(grid_last + 1);
        if last > overflow_from {
            dropped += (last - overflow_from) as usize;
        }

        for idx in first.max(0)..=last.min(grid_last) {
            let idx = idx as usize;
            let t_src = grid.offset + idx as f64 * grid.delta_t;
            let mut t_det = mid_det + (t_src - mid_src) / tdot;
            if t_det > end_det {
                t_det = end_det;
                clamped += 1;
            } else if t_det < 0.0 {
                t_det = 0.0;
                clamped += 1;
            }

            let value = Complex64::new(spline_re.eval(t_det), spline_im.eval(t_det));
            // heterodyne phase accumulated between detector and source time
            let cycles = (series.f_het * (t_src - t_det)).fract();
            let corrected = value * Complex64::from_polar(1.0, -TAU * cycles);
            data[idx] = Complex32::new(corrected.re as f32, corrected.im as f32);
        }
    }

    Ok(ResampledDetector {
        series: ComplexTimeSeries::new(
            series.name.clone(),
            epoch + grid.offset,
            series.f_het,
            grid.delta_t,
            data,
        ),
        segment_starts,
        clamped,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPOCH: f64 = 1_000_000_000.0;

    fn tone(len: usize, dt: f64, freq: f64) -> ComplexTimeSeries {
        let data = (0..len)
            .map(|k| {
                let phase = TAU * freq * k as f64 * dt;
                Complex32::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect();
        ComplexTimeSeries::new("H1", EPOCH, 100.0, dt, data)
    }

    fn identity(stamps: &SegmentTimestamps) -> TimingMap {
        let delta_t = stamps
            .starts
            .iter()
            .map(|s| s + 0.5 * stamps.t_seg - EPOCH)
            .collect();
        TimingMap::new(EPOCH, delta_t, vec![1.0; stamps.len()])
    }

    #[test]
    fn zero_padding_rounds_up() {
        let stamps = SegmentTimestamps::contiguous(EPOCH, 10.0, 4);
        let timing = vec![identity(&stamps)];
        // 1 / 0.0245 = 40.8 s -> 82 samples of 0.5 s
        let grid = OutputGrid::new(&timing, 10.0, EPOCH, 0.5, 0.0245).unwrap();
        assert_eq!(grid.num_samples, 82);
        assert!(grid.span() >= 1.0 / 0.0245 - 1e-9);
        assert_eq!(grid.offset, 0.0);
    }

    #[test]
    fn exact_span_is_not_padded() {
        let stamps = SegmentTimestamps::contiguous(EPOCH, 0.3, 1000);
        let timing = vec![identity(&stamps)];
        let span = 1000.0 * 0.3;
        let grid = OutputGrid::new(&timing, 0.3, EPOCH, 0.1, 1.0 / span).unwrap();
        assert_eq!(grid.num_samples, 3000);
    }

    #[test]
    fn identity_timing_reproduces_input() {
        let dt = 0.5;
        let series = tone(64, dt, 0.1);
        let stamps = SegmentTimestamps::contiguous(EPOCH, 8.0, 4);
        let timing = identity(&stamps);
        let grid = OutputGrid::new(&[timing.clone()], 8.0, EPOCH, dt, 1.0 / 32.0).unwrap();
        let out = resample_detector(&series, &stamps, &timing, &grid).unwrap();

        assert_eq!(out.series.len(), 64);
        assert_eq!(out.clamped, 0);
        for k in 0..64 {
            let diff = out.series.data[k] - series.data[k];
            assert!(diff.norm() < 1e-5, "sample {}", k);
        }
        assert_eq!(out.segment_starts, stamps.starts);
    }

    #[test]
    fn uncovered_source_samples_stay_zero() {
        let dt = 0.5;
        let series = tone(64, dt, 0.1);
        let stamps = SegmentTimestamps::new(8.0, vec![EPOCH, EPOCH + 24.0]);
        let timing = identity(&stamps);
        let grid = OutputGrid::new(&[timing.clone()], 8.0, EPOCH, dt, 1.0 / 32.0).unwrap();
        let out = resample_detector(&series, &stamps, &timing, &grid).unwrap();

        // segment one covers indices 0..=16, segment two 48..=63
        for k in 17..48 {
            assert_eq!(out.series.data[k], Complex32::new(0.0, 0.0), "sample {}", k);
        }
        assert!(out.series.data[10].norm() > 0.5);
        assert!(out.series.data[50].norm() > 0.5);
    }

    #[test]
    fn out_of_range_detector_times_are_clamped() {
        let dt = 1.0;
        let data = (0..16).map(|k| Complex32::new(k as f32, 0.0)).collect();
        let series = ComplexTimeSeries::new("L1", EPOCH, 0.0, dt, data);
        let stamps = SegmentTimestamps::new(16.0, vec![EPOCH]);
        // compressed source frame pulls the segment edges beyond the data
        let timing = TimingMap::new(EPOCH, vec![8.0], vec![1.25]);
        let grid = OutputGrid::new(&[timing.clone()], 16.0, EPOCH, dt, 1.0 / 32.0).unwrap();
        let out = resample_detector(&series, &stamps, &timing, &grid).unwrap();

        assert!(out.clamped > 0);
        let max = out
            .series
            .data
            .iter()
            .map(|c| c.re)
            .fold(f32::NEG_INFINITY, f32::max);
        // never extrapolated beyond the first and last samples
        assert!(max <= 15.0 + 1e-4);
        assert!(out.series.data[0].re.abs() < 1e-4);
        assert!((out.series.data[20].re - 15.0).abs() < 1e-4);
    }

    #[test]
    fn heterodyne_phase_follows_time_offset() {
        // constant input; a fixed delay of 0.25 s at f_het = 1 Hz rotates by -90 degrees
        let dt = 0.25;
        let data = vec![Complex32::new(1.0, 0.0); 64];
        let series = ComplexTimeSeries::new("V1", EPOCH, 1.0, dt, data);
        let stamps = SegmentTimestamps::new(8.0, vec![EPOCH + 4.0]);
        let timing = TimingMap::new(EPOCH, vec![8.25], vec![1.0]);
        let grid = OutputGrid::new(&[timing.clone()], 8.0, EPOCH, dt, 1.0 / 16.0).unwrap();
        let out = resample_detector(&series, &stamps, &timing, &grid).unwrap();

        let sample = out.series.data[8];
        assert!((sample.re - 0.0).abs() < 1e-5);
        assert!((sample.im + 1.0).abs() < 1e-5);
    }

    #[test]
    fn samples_past_the_grid_are_dropped() {
        let dt = 0.5;
        let series = tone(64, dt, 0.1);
        let stamps = SegmentTimestamps::contiguous(EPOCH, 8.0, 4);
        let timing = identity(&stamps);
        // 16 s grid over 32 s of data: the last two segments fall off the end
        let grid = OutputGrid::new(&[timing.clone()], 8.0, EPOCH, dt, 1.0 / 16.0).unwrap();
        assert_eq!(grid.num_samples, 32);
        let out = resample_detector(&series, &stamps, &timing, &grid).unwrap();

        assert_eq!(out.series.len(), 32);
        assert_eq!(out.dropped, 32);
        assert_eq!(out.clamped, 0);
        for k in 0..32 {
            let diff = out.series.data[k] - series.data[k];
            assert!(diff.norm() < 1e-5, "sample {}", k);
        }
    }

    #[test]
    fn grid_length_needs_no_timing() {
        assert_eq!(OutputGrid::num_samples_for(1.0 / 32.0, 0.5).unwrap(), 64);
        assert_eq!(OutputGrid::num_samples_for(0.0245, 0.5).unwrap(), 82);
        assert!(matches!(
            OutputGrid::num_samples_for(0.0, 0.5),
            Err(ResampError::InvalidArgument(_))
        ));
    }

    #[test]
    fn negative_tdot_is_a_geometry_error() {
        let stamps = SegmentTimestamps::contiguous(EPOCH, 8.0, 2);
        let timing = TimingMap::new(EPOCH, vec![4.0, 12.0], vec![1.0, -1.0]);
        assert!(matches!(
            check_timing(0, &timing, &stamps),
            Err(ResampError::Geometry(_))
        ));
    }
}
