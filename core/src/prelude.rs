use crate::interface::{BinaryOrbit, MultiAntennaCoeffs, SkyPosition, TimingMap};
use crate::processing::binary;

/// Common error type for the resampling core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResampError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("geometry provider failure: {0}")]
    Geometry(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type ResampResult<T> = Result<T, ResampError>;

/// Source of the sky-dependent inputs: detector-to-source timing and antenna
/// response. Implemented outside the core from detector states and noise
/// weights.
///
/// Every method returns one entry per detector, each with one value per data
/// segment of that detector.
pub trait SkyGeometry {
    /// Sky-only timing (detector motion relative to the solar-system
    /// barycenter) referred to `ref_time`.
    fn sky_timing(&self, sky: &SkyPosition, ref_time: f64) -> ResampResult<Vec<TimingMap>>;

    /// Noise-weighted antenna coefficients at the segment midpoints.
    fn antenna_coeffs(&self, sky: &SkyPosition) -> ResampResult<MultiAntennaCoeffs>;

    /// Adds the binary-orbit delay to a sky-only timing map.
    fn binary_timing(
        &self,
        sky_timing: &[TimingMap],
        orbit: &BinaryOrbit,
    ) -> ResampResult<Vec<TimingMap>> {
        binary::add_multi_binary_timing(sky_timing, orbit)
    }
}
