use ndarray::Array2;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

use super::geometry::AntennaNormalization;
use crate::prelude::{ResampError, ResampResult};

/// Selects which quantities a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatQuantities {
    /// Combined multi-detector 2F.
    pub two_f: bool,
    /// Combined Fa and Fb amplitudes.
    pub fa_fb: bool,
    pub two_f_per_det: bool,
    pub fa_fb_per_det: bool,
    /// Per-segment atoms; never produced by the resampling core.
    pub atoms_per_det: bool,
}

impl StatQuantities {
    pub fn two_f_only() -> Self {
        Self {
            two_f: true,
            ..Default::default()
        }
    }

    pub fn all_supported() -> Self {
        Self {
            two_f: true,
            fa_fb: true,
            two_f_per_det: true,
            fa_fb_per_det: true,
            atoms_per_det: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.two_f
            || self.fa_fb
            || self.two_f_per_det
            || self.fa_fb_per_det
            || self.atoms_per_det)
    }
}

/// Frequency band and output selection of a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRequest {
    pub quantities: StatQuantities,
    /// Output frequency resolution; zero selects `1 / T_span` of the input.
    #[serde(default)]
    pub d_freq: f64,
    pub num_bins: usize,
}

impl StatRequest {
    pub fn new(quantities: StatQuantities, d_freq: f64, num_bins: usize) -> Self {
        Self {
            quantities,
            d_freq,
            num_bins,
        }
    }

    pub fn validate(&self) -> ResampResult<()> {
        if self.quantities.atoms_per_det {
            return Err(ResampError::Unsupported(
                "per-segment atoms are not available from the resampling statistic".into(),
            ));
        }
        if self.quantities.is_empty() {
            return Err(ResampError::InvalidArgument(
                "no output quantity requested".into(),
            ));
        }
        if self.num_bins == 0 {
            return Err(ResampError::InvalidArgument(
                "number of frequency bins must be positive".into(),
            ));
        }
        if !self.d_freq.is_finite() || self.d_freq < 0.0 {
            return Err(ResampError::InvalidArgument(format!(
                "frequency resolution must be non-negative, got {}",
                self.d_freq
            )));
        }
        Ok(())
    }
}

/// Output of one query over `num_bins` bins starting at `f_start`.
#[derive(Debug, Clone)]
pub struct StatResults {
    pub f_start: f64,
    pub d_freq: f64,
    pub num_bins: usize,
    pub num_detectors: usize,
    pub two_f: Option<Vec<f32>>,
    pub fa: Option<Vec<Complex32>>,
    pub fb: Option<Vec<Complex32>>,
    /// Shape `(num_detectors, num_bins)`.
    pub two_f_per_det: Option<Array2<f32>>,
    pub fa_per_det: Option<Array2<Complex32>>,
    pub fb_per_det: Option<Array2<Complex32>>,
    /// Aggregate antenna normalization at the queried sky position.
    pub norm: AntennaNormalization,
}

impl StatResults {
    pub fn freq_of_bin(&self, k: usize) -> f64 {
        self.f_start + k as f64 * self.d_freq
    }

    /// Bin and value of the loudest combined 2F, if computed.
    pub fn loudest(&self) -> Option<(usize, f32)> {
        self.two_f.as_ref().and_then(|values| {
            values
                .iter()
                .copied()
                .enumerate()
                .fold(None, |best: Option<(usize, f32)>, (k, v)| match best {
                    Some((_, bv)) if bv >= v => best,
                    _ => Some((k, v)),
                })
        })
    }
}
