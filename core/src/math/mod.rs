pub mod fft;
pub mod spline;
pub mod stats;

pub use fft::FftHelper;
pub use spline::UniformSpline;
pub use stats::StatsHelper;
