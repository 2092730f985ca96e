pub mod geometry;
pub mod point;
pub mod results;
pub mod series;

pub use geometry::{AntennaCoeffs, AntennaNormalization, MultiAntennaCoeffs, TimingMap};
pub use point::{BinaryOrbit, SearchPoint, SkyPosition};
pub use results::{StatQuantities, StatRequest, StatResults};
pub use series::{ComplexTimeSeries, MultiDetectorInput, SegmentTimestamps};
