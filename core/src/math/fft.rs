use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::prelude::{ResampError, ResampResult};
use crate::processing::scratch;

/// Number of bins at DC and positive frequency in an `n`-point transform.
pub fn num_positive_bins(n: usize) -> usize {
    (n + 1) / 2
}

/// Number of strictly negative-frequency bins (Nyquist counts as negative).
pub fn num_negative_bins(n: usize) -> usize {
    n - num_positive_bins(n)
}

/// Reorders transform output from `[DC, +f.., -f..]` to ascending frequency.
pub fn reorder_centered(spectrum: &mut [Complex32]) {
    let split = num_positive_bins(spectrum.len());
    spectrum.rotate_left(split);
}

/// Helper that wraps a `rustfft` forward plan and its scratch space for the
/// duration of one query.
pub struct FftHelper {
    fft: std::sync::Arc<dyn Fft<f32>>,
    scratch: Vec<Complex32>,
}

impl FftHelper {
    pub fn new(size: usize) -> ResampResult<Self> {
        if size == 0 {
            return Err(ResampError::InvalidArgument(
                "transform length must be positive".into(),
            ));
        }
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = scratch::zeroed(fft.get_inplace_scratch_len(), "FFT scratch")?;
        Ok(Self { fft, scratch })
    }

    pub fn len(&self) -> usize {
        self.fft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fft.len() == 0
    }

    /// In-place forward transform, output ordered from the most negative to
    /// the most positive frequency.
    pub fn forward_centered(&mut self, buffer: &mut [Complex32]) -> ResampResult<()> {
        if buffer.len() != self.len() {
            return Err(ResampError::Internal(format!(
                "transform buffer holds {} samples, plan expects {}",
                buffer.len(),
                self.len()
            )));
        }
        self.fft.process_with_scratch(buffer, &mut self.scratch);
        reorder_centered(buffer);
        Ok(())
    }
}
