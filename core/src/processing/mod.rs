pub mod antenna;
pub mod binary;
pub mod cache;
pub mod resample;
pub mod scratch;
pub mod spectral;

pub use antenna::{AntennaWeighter, WeightedSeries};
pub use cache::{CacheDecision, CachedView, ResamplingCache};
pub use resample::{BarycentricResampler, OutputGrid, ResampledDetector};
pub use spectral::{BandLayout, SpectralAssembler};
