//! Resampling multi-detector F-statistic core.
//!
//! Detector-frame heterodyned series are resampled onto a uniform
//! source-frame grid, weighted by the antenna patterns and transformed in a
//! single FFT per detector. A two-level cache keyed on sky position and
//! binary orbit lets frequency and spin-down scans reuse the resampled data.

pub mod engine;
pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::{ResampFstat, EXTRA_BINS};
pub use interface::{
    AntennaCoeffs, AntennaNormalization, BinaryOrbit, ComplexTimeSeries, MultiAntennaCoeffs,
    MultiDetectorInput, SearchPoint, SegmentTimestamps, SkyPosition, StatQuantities,
    StatRequest, StatResults, TimingMap,
};
pub use prelude::{ResampError, ResampResult, SkyGeometry};
pub use processing::CacheDecision;
pub use telemetry::CacheMetrics;
