use resampcore::{
    AntennaCoeffs, MultiAntennaCoeffs, ResampError, ResampResult, SegmentTimestamps, SkyGeometry,
    SkyPosition, TimingMap,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Light travel time across one astronomical unit (s).
const ORBIT_RADIUS: f64 = 499.005;
const ORBIT_PERIOD: f64 = 31_557_600.0;
/// Light travel time across the Earth's equatorial radius (s).
const EARTH_RADIUS: f64 = 0.021_3;
const SIDEREAL_DAY: f64 = 86_164.090_5;

/// Detector location on a spherical Earth (radians).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSite {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl DetectorSite {
    /// Approximate coordinates for the usual interferometer names; unknown
    /// names sit on the equator at the prime meridian.
    pub fn named(name: &str) -> Self {
        let (longitude, latitude) = match name {
            "H1" => (-2.084_056, 0.810_795),
            "L1" => (-1.584_309, 0.533_423),
            "V1" => (0.183_338, 0.761_512),
            "K1" => (2.396_441, 0.634_990),
            _ => (0.0, 0.0),
        };
        Self {
            name: name.to_string(),
            longitude,
            latitude,
        }
    }
}

/// Circular Earth orbit plus rotation, with simple quadrupole-like antenna
/// patterns. Stands in for a full ephemeris-based provider.
#[derive(Debug, Clone)]
pub struct ToyEarthGeometry {
    sites: Vec<DetectorSite>,
    stamps: Vec<SegmentTimestamps>,
    epoch: f64,
    /// Folds segment duration, sample interval and noise level into the
    /// antenna normalization.
    norm_scale: f32,
}

impl ToyEarthGeometry {
    pub fn new(
        sites: Vec<DetectorSite>,
        stamps: Vec<SegmentTimestamps>,
        epoch: f64,
        norm_scale: f32,
    ) -> Self {
        Self {
            sites,
            stamps,
            epoch,
            norm_scale,
        }
    }

    pub fn sites(&self) -> &[DetectorSite] {
        &self.sites
    }

    /// Source-minus-detector arrival delay and its time derivative at `t`
    /// seconds after the epoch.
    pub fn delay(&self, site: &DetectorSite, sky: &SkyPosition, t: f64) -> (f64, f64) {
        let orbit_omega = TAU / ORBIT_PERIOD;
        let spin_omega = TAU / SIDEREAL_DAY;
        let orbit_phase = orbit_omega * t - sky.alpha;
        let spin_phase = spin_omega * t + site.longitude - sky.alpha;
        let orbit_amp = ORBIT_RADIUS * sky.delta.cos();
        let spin_amp = EARTH_RADIUS * site.latitude.cos() * sky.delta.cos();

        let delay = orbit_amp * orbit_phase.cos() + spin_amp * spin_phase.cos();
        let rate = -orbit_amp * orbit_omega * orbit_phase.sin()
            - spin_amp * spin_omega * spin_phase.sin();
        (delay, rate)
    }

    fn patterns(&self, site: &DetectorSite, sky: &SkyPosition, t: f64) -> (f32, f32) {
        let psi = TAU / SIDEREAL_DAY * t + site.longitude - sky.alpha;
        let sin_delta = sky.delta.sin();
        let a = 0.5 * (1.0 + sin_delta * sin_delta) * (2.0 * psi).cos()
            + 0.25 * (2.0 * site.latitude).sin() * sky.delta.cos();
        let b = sin_delta * site.latitude.sin() * (2.0 * psi).sin();
        (a as f32, b as f32)
    }

    fn check_detectors(&self) -> ResampResult<()> {
        if self.sites.len() != self.stamps.len() {
            return Err(ResampError::Geometry(format!(
                "{} detector sites but {} timestamp lists",
                self.sites.len(),
                self.stamps.len()
            )));
        }
        Ok(())
    }
}

impl SkyGeometry for ToyEarthGeometry {
    fn sky_timing(&self, sky: &SkyPosition, ref_time: f64) -> ResampResult<Vec<TimingMap>> {
        self.check_detectors()?;
        let offset = self.epoch - ref_time;
        Ok(self
            .sites
            .iter()
            .zip(&self.stamps)
            .map(|(site, stamps)| {
                let (delta_t, tdot) = stamps
                    .starts
                    .iter()
                    .map(|&start| {
                        let mid = (start - self.epoch) + 0.5 * stamps.t_seg;
                        let (delay, rate) = self.delay(site, sky, mid);
                        (offset + mid + delay, 1.0 + rate)
                    })
                    .unzip();
                TimingMap::new(ref_time, delta_t, tdot)
            })
            .collect())
    }

    fn antenna_coeffs(&self, sky: &SkyPosition) -> ResampResult<MultiAntennaCoeffs> {
        self.check_detectors()?;
        let per_detector = self
            .sites
            .iter()
            .zip(&self.stamps)
            .map(|(site, stamps)| {
                let (a, b) = stamps
                    .starts
                    .iter()
                    .map(|&start| {
                        let mid = (start - self.epoch) + 0.5 * stamps.t_seg;
                        self.patterns(site, sky, mid)
                    })
                    .unzip();
                AntennaCoeffs::from_segments(a, b, self.norm_scale)
            })
            .collect();
        Ok(MultiAntennaCoeffs::new(per_detector))
    }
}
