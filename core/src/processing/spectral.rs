use std::f64::consts::TAU;

use ndarray::Array2;
use num_complex::{Complex32, Complex64};

use crate::interface::{MultiAntennaCoeffs, SearchPoint, StatQuantities, StatResults};
use crate::math::fft::{num_negative_bins, FftHelper};
use crate::math::stats::StatsHelper;
use crate::prelude::{ResampError, ResampResult};
use crate::processing::antenna::WeightedSeries;
use crate::processing::scratch;
use crate::telemetry::log::LogManager;

/// Location of the requested band on the centered transform axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLayout {
    /// Sub-bin frequency translation applied before the transform (Hz).
    pub shift: f64,
    /// Index of the first requested bin on the centered axis.
    pub offset: usize,
}

impl BandLayout {
    /// Splits `f_het - f_start` into whole bins and a residual shift so that
    /// `f_start` falls exactly on a transform bin.
    pub fn locate(
        f_het: f64,
        f_start: f64,
        d_freq: f64,
        num_samples: usize,
        num_bins: usize,
    ) -> ResampResult<Self> {
        let diff = f_het - f_start;
        let diff_bins = (diff / d_freq).round();
        let shift = diff - d_freq * diff_bins;

        let f0_axis = (f_het - shift) - num_negative_bins(num_samples) as f64 * d_freq;
        let offset = ((f_start - f0_axis) / d_freq).round();
        let f_min = f0_axis;
        let f_max = f0_axis + num_samples as f64 * d_freq;
        let fits = offset >= 0.0
            && (offset as usize)
                .checked_add(num_bins)
                .map_or(false, |end| end <= num_samples);
        if !fits {
            return Err(ResampError::InvalidArgument(format!(
                "band [{}, {}) Hz lies outside the resampled bandwidth [{}, {}) Hz",
                f_start,
                f_start + num_bins as f64 * d_freq,
                f_min,
                f_max
            )));
        }

        Ok(Self {
            shift,
            offset: offset as usize,
        })
    }
}

/// Translates a series up in frequency by `shift` Hz via a time-domain phase
/// ramp referred to the first sample.
pub fn frequency_shift(data: &mut [Complex32], delta_t: f64, shift: f64) {
    for (k, sample) in data.iter_mut().enumerate() {
        let cycles = (shift * k as f64 * delta_t).fract();
        *sample = rotate(*sample, TAU * cycles);
    }
}

/// Removes the spin-down phase `sum_s fkdot[s] tau^(s+1) / (s+1)!`,
/// `tau = t - ref_time`, from a source-frame series. `start` is the time of
/// the first sample relative to the reference time.
pub fn spindown_correction(data: &mut [Complex32], start: f64, delta_t: f64, fkdot: &[f64]) {
    for (k, sample) in data.iter_mut().enumerate() {
        let tau = start + k as f64 * delta_t;
        let mut cycles = 0.0;
        let mut power = tau;
        let mut factorial = 1.0;
        for (s, &f) in fkdot.iter().enumerate().skip(1) {
            power *= tau;
            factorial *= (s + 1) as f64;
            cycles += f * power / factorial;
        }
        *sample = rotate(*sample, -TAU * cycles.fract());
    }
}

fn rotate(sample: Complex32, angle: f64) -> Complex32 {
    let value = Complex64::new(f64::from(sample.re), f64::from(sample.im))
        * Complex64::from_polar(1.0, angle);
    Complex32::new(value.re as f32, value.im as f32)
}

/// Turns weighted source-frame series into band-limited amplitudes and 2F.
pub struct SpectralAssembler {
    logger: LogManager,
}

impl SpectralAssembler {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("spectral"),
        }
    }

    /// The weighted series are only read; phase corrections act on private
    /// copies so cached payloads remain valid.
    pub fn assemble(
        &self,
        point: &SearchPoint,
        quantities: &StatQuantities,
        d_freq: f64,
        num_bins: usize,
        antenna: &MultiAntennaCoeffs,
        weighted: &[WeightedSeries],
    ) -> ResampResult<StatResults> {
        let first = weighted.first().ok_or_else(|| {
            ResampError::InvalidArgument("no weighted series to transform".into())
        })?;
        if antenna.num_detectors() != weighted.len() {
            return Err(ResampError::Internal(format!(
                "{} weighted series but antenna coefficients for {} detectors",
                weighted.len(),
                antenna.num_detectors()
            )));
        }
        if quantities.two_f_per_det {
            if let Some(x) = antenna
                .per_detector
                .iter()
                .position(|coeffs| coeffs.norm.is_degenerate())
            {
                return Err(ResampError::Geometry(format!(
                    "per-detector 2F requested but detector {} has a degenerate normalization",
                    x
                )));
            }
        }

        let num_samples = first.fa.len();
        let delta_t = first.fa.delta_t;
        let f_start = point.freq();
        let layout = BandLayout::locate(first.fa.f_het, f_start, d_freq, num_samples, num_bins)?;
        self.logger.detail(&format!(
            "band at {} Hz: shift {:.3e} Hz, offset {} of {} bins",
            f_start, layout.shift, layout.offset, num_samples
        ));

        let num_detectors = weighted.len();
        let mut fa_sum = scratch::zeroed::<Complex32>(num_bins, "Fa accumulator")?;
        let mut fb_sum = scratch::zeroed::<Complex32>(num_bins, "Fb accumulator")?;
        let mut two_f_per_det = quantities
            .two_f_per_det
            .then(|| Array2::<f32>::zeros((num_detectors, num_bins)));
        let mut fa_per_det = quantities
            .fa_fb_per_det
            .then(|| Array2::<Complex32>::zeros((num_detectors, num_bins)));
        let mut fb_per_det = quantities
            .fa_fb_per_det
            .then(|| Array2::<Complex32>::zeros((num_detectors, num_bins)));

        let mut fft = FftHelper::new(num_samples)?;
        let scale = delta_t as f32;
        for (x, series) in weighted.iter().enumerate() {
            if series.fa.len() != num_samples || series.fb.len() != num_samples {
                return Err(ResampError::Internal(format!(
                    "weighted series of detector {} has {} / {} samples, expected {}",
                    x,
                    series.fa.len(),
                    series.fb.len(),
                    num_samples
                )));
            }
            let mut fa = scratch::duplicate(&series.fa.data, "Fa transform buffer")?;
            let mut fb = scratch::duplicate(&series.fb.data, "Fb transform buffer")?;

            if layout.shift != 0.0 {
                frequency_shift(&mut fa, delta_t, layout.shift);
                frequency_shift(&mut fb, delta_t, layout.shift);
            }
            if point.has_spindown() {
                let start = series.fa.epoch - point.ref_time;
                spindown_correction(&mut fa, start, delta_t, &point.fkdot);
                spindown_correction(&mut fb, start, delta_t, &point.fkdot);
            }

            fft.forward_centered(&mut fa)?;
            fft.forward_centered(&mut fb)?;

            let norm_x = &antenna.per_detector[x].norm;
            for k in 0..num_bins {
                let fa_k = fa[layout.offset + k] * scale;
                let fb_k = fb[layout.offset + k] * scale;
                fa_sum[k] += fa_k;
                fb_sum[k] += fb_k;

                if let Some(values) = two_f_per_det.as_mut() {
                    values[[x, k]] = StatsHelper::two_f(fa_k, fb_k, norm_x);
                }
                if let (Some(fa_x), Some(fb_x)) = (fa_per_det.as_mut(), fb_per_det.as_mut()) {
                    fa_x[[x, k]] = fa_k;
                    fb_x[[x, k]] = fb_k;
                }
            }
        }

        let two_f = quantities.two_f.then(|| {
            fa_sum
                .iter()
                .zip(&fb_sum)
                .map(|(&fa, &fb)| StatsHelper::two_f(fa, fb, &antenna.norm))
                .collect::<Vec<f32>>()
        });
        let (fa, fb) = if quantities.fa_fb {
            (Some(fa_sum), Some(fb_sum))
        } else {
            (None, None)
        };

        Ok(StatResults {
            f_start,
            d_freq,
            num_bins,
            num_detectors,
            two_f,
            fa,
            fb,
            two_f_per_det,
            fa_per_det,
            fb_per_det,
            norm: antenna.norm,
        })
    }
}

impl Default for SpectralAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_on_grid_needs_no_shift() {
        let layout = BandLayout::locate(100.0, 99.5, 0.125, 64, 8).unwrap();
        assert_eq!(layout.shift, 0.0);
        // 32 negative bins, origin at 100 - 4 Hz, 99.5 Hz is 28 bins up
        assert_eq!(layout.offset, 28);
    }

    #[test]
    fn off_grid_band_gets_fractional_shift() {
        let layout = BandLayout::locate(100.0, 100.05, 0.125, 64, 4).unwrap();
        assert!((layout.shift + 0.05).abs() < 1e-12);
        assert_eq!(layout.offset, 32);
    }

    #[test]
    fn band_beyond_nyquist_is_rejected() {
        let err = BandLayout::locate(100.0, 103.0, 0.125, 64, 16).unwrap_err();
        assert!(matches!(err, ResampError::InvalidArgument(_)));
    }

    #[test]
    fn huge_bin_count_is_rejected_without_overflow() {
        let err = BandLayout::locate(100.0, 99.5, 0.125, 64, usize::MAX).unwrap_err();
        assert!(matches!(err, ResampError::InvalidArgument(_)));
    }

    #[test]
    fn frequency_shift_moves_tone_onto_bin() {
        let n = 32;
        let dt = 1.0;
        // tone 0.3 bins above bin 4
        let f = 4.3 / n as f64;
        let mut data: Vec<Complex32> = (0..n)
            .map(|k| {
                let phase = TAU * f * k as f64;
                Complex32::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect();
        frequency_shift(&mut data, dt, -0.3 / n as f64);
        let mut fft = FftHelper::new(n).unwrap();
        fft.forward_centered(&mut data).unwrap();
        let peak = num_negative_bins(n) + 4;
        assert!((data[peak].norm() - n as f32).abs() < 1e-3);
        assert!(data[peak + 1].norm() < 1e-3);
    }

    #[test]
    fn spindown_correction_cancels_quadratic_phase() {
        let fdot = 1e-3;
        let dt = 0.5;
        let start = -10.0;
        let mut data: Vec<Complex32> = (0..64)
            .map(|k| {
                let tau = start + k as f64 * dt;
                let phase = TAU * 0.5 * fdot * tau * tau;
                Complex32::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect();
        spindown_correction(&mut data, start, dt, &[50.0, fdot]);
        for sample in &data {
            assert!((sample.re - 1.0).abs() < 1e-5);
            assert!(sample.im.abs() < 1e-5);
        }
    }

    #[test]
    fn zero_spindown_leaves_data_untouched() {
        let mut data = vec![Complex32::new(0.3, -0.7); 8];
        let before = data.clone();
        spindown_correction(&mut data, 5.0, 1.0, &[10.0, 0.0, 0.0]);
        assert_eq!(data, before);
    }
}
