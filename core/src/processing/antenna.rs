use num_complex::Complex32;

use crate::interface::{AntennaCoeffs, ComplexTimeSeries, MultiAntennaCoeffs};
use crate::prelude::{ResampError, ResampResult};
use crate::processing::scratch;

/// A series weighted by the two antenna-pattern functions.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSeries {
    pub fa: ComplexTimeSeries,
    pub fb: ComplexTimeSeries,
}

/// Forms `Fa(t) = x(t) a(t)` and `Fb(t) = x(t) b(t)` with `a`, `b` held
/// constant over each data segment.
pub struct AntennaWeighter;

impl AntennaWeighter {
    /// `segment_starts` are given in the frame of `series`. Samples outside
    /// every segment stay exactly zero.
    pub fn weight(
        series: &ComplexTimeSeries,
        coeffs: &AntennaCoeffs,
        segment_starts: &[f64],
        t_seg: f64,
    ) -> ResampResult<WeightedSeries> {
        if series.is_empty() {
            return Err(ResampError::InvalidArgument(format!(
                "cannot weight empty series '{}'",
                series.name
            )));
        }
        if coeffs.a.len() != segment_starts.len() || coeffs.b.len() != segment_starts.len() {
            return Err(ResampError::InvalidArgument(format!(
                "'{}': {} segments but {} a / {} b coefficients",
                series.name,
                segment_starts.len(),
                coeffs.a.len(),
                coeffs.b.len()
            )));
        }

        let num_samples = series.len();
        let mut fa = scratch::zeroed::<Complex32>(num_samples, "Fa(t)")?;
        let mut fb = scratch::zeroed::<Complex32>(num_samples, "Fb(t)")?;
        let samples_per_segment = (t_seg / series.delta_t).round() as i64;

        for (j, &t_start) in segment_starts.iter().enumerate() {
            let start_index = ((t_start - series.epoch) / series.delta_t).round() as i64;
            let (a, b) = (coeffs.a[j], coeffs.b[j]);
            for k in 0..samples_per_segment {
                let index = start_index + k;
                if index < 0 {
                    continue;
                }
                let index = index as usize;
                if index >= num_samples {
                    break;
                }
                fa[index] = series.data[index] * a;
                fb[index] = series.data[index] * b;
            }
        }

        let make = |data| {
            ComplexTimeSeries::new(
                series.name.clone(),
                series.epoch,
                series.f_het,
                series.delta_t,
                data,
            )
        };
        Ok(WeightedSeries {
            fa: make(fa),
            fb: make(fb),
        })
    }

    pub fn weight_multi(
        series: &[ComplexTimeSeries],
        coeffs: &MultiAntennaCoeffs,
        segment_starts: &[Vec<f64>],
        t_seg: f64,
    ) -> ResampResult<Vec<WeightedSeries>> {
        let num_detectors = series.len();
        if num_detectors == 0
            || coeffs.num_detectors() != num_detectors
            || segment_starts.len() != num_detectors
        {
            return Err(ResampError::InvalidArgument(format!(
                "antenna weighting needs matching detector counts (series {}, coefficients {}, timestamps {})",
                num_detectors,
                coeffs.num_detectors(),
                segment_starts.len()
            )));
        }

        series
            .iter()
            .zip(&coeffs.per_detector)
            .zip(segment_starts)
            .map(|((ts, c), starts)| Self::weight(ts, c, starts, t_seg))
            .collect()
    }
}
