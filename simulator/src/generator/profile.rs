use crate::generator::geometry::{DetectorSite, ToyEarthGeometry};
use anyhow::{ensure, Context};
use num_complex::{Complex32, Complex64};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use resampcore::{
    ComplexTimeSeries, MultiDetectorInput, SegmentTimestamps, SkyGeometry, SkyPosition,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Continuous-wave signal injected into the synthetic data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Frequency at the data epoch (Hz).
    pub freq: f64,
    pub fdot: f64,
    pub amplitude: f64,
    pub sky: SkyPosition,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            freq: 100.2,
            fdot: -1e-9,
            amplitude: 0.05,
            sky: SkyPosition::new(1.0, 0.4),
        }
    }
}

/// Configuration for generating a synthetic heterodyned detector bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub detectors: Vec<String>,
    pub epoch: f64,
    pub delta_t: f64,
    pub f_het: f64,
    pub t_seg: f64,
    pub num_segments: usize,
    /// Indices of segments left out of every detector's timestamps.
    pub gaps: Vec<usize>,
    pub noise_sigma: f64,
    pub seed: u64,
    pub signal: Option<SignalConfig>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            detectors: vec!["H1".into(), "L1".into()],
            epoch: 1_000_000_000.0,
            delta_t: 0.5,
            f_het: 100.0,
            t_seg: 1800.0,
            num_segments: 16,
            gaps: vec![5],
            noise_sigma: 1.0,
            seed: 0,
            signal: Some(SignalConfig::default()),
        }
    }
}

impl GeneratorConfig {
    fn samples_per_segment(&self) -> usize {
        (self.t_seg / self.delta_t).round() as usize
    }

    /// Noise level used for the antenna normalization; noiseless data is
    /// normalized as if `sigma = 1`.
    fn norm_sigma(&self) -> f64 {
        if self.noise_sigma > 0.0 {
            self.noise_sigma
        } else {
            1.0
        }
    }
}

/// Detector data together with the geometry it was generated under.
#[derive(Debug, Clone)]
pub struct SyntheticBundle {
    pub input: MultiDetectorInput,
    pub geometry: ToyEarthGeometry,
    pub signal: Option<SignalConfig>,
}

pub fn build_bundle(config: &GeneratorConfig) -> anyhow::Result<SyntheticBundle> {
    ensure!(!config.detectors.is_empty(), "at least one detector is required");
    ensure!(config.delta_t > 0.0, "sample interval must be positive");
    ensure!(config.num_segments > 0, "at least one segment is required");
    let per_segment = config.samples_per_segment();
    ensure!(per_segment > 0, "segment shorter than one sample");
    let len = per_segment
        .checked_mul(config.num_segments)
        .context("overflow computing sample count for generator")?;

    let starts: Vec<f64> = (0..config.num_segments)
        .filter(|j| !config.gaps.contains(j))
        .map(|j| config.epoch + j as f64 * config.t_seg)
        .collect();
    ensure!(!starts.is_empty(), "every segment is marked as a gap");
    let stamps = vec![SegmentTimestamps::new(config.t_seg, starts); config.detectors.len()];

    let sites: Vec<DetectorSite> = config
        .detectors
        .iter()
        .map(|name| DetectorSite::named(name))
        .collect();
    let sigma = config.norm_sigma();
    let norm_scale = (sigma * sigma * config.delta_t * config.t_seg) as f32;
    let geometry = ToyEarthGeometry::new(sites, stamps.clone(), config.epoch, norm_scale);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sigma / 2f64.sqrt())
        .context("building noise distribution")?;

    let mut series = Vec::with_capacity(config.detectors.len());
    for (x, name) in config.detectors.iter().enumerate() {
        let mut data = vec![Complex32::new(0.0, 0.0); len];
        for &start in &stamps[x].starts {
            let first = ((start - config.epoch) / config.delta_t).round() as usize;
            for sample in &mut data[first..(first + per_segment).min(len)] {
                *sample = Complex32::new(
                    noise.sample(&mut rng) as f32,
                    noise.sample(&mut rng) as f32,
                );
            }
        }
        if let Some(signal) = &config.signal {
            inject(&mut data, x, config, &geometry, &stamps[x], signal)?;
        }
        series.push(ComplexTimeSeries::new(
            name.clone(),
            config.epoch,
            config.f_het,
            config.delta_t,
            data,
        ));
    }

    let input = MultiDetectorInput::new(series, stamps).context("assembling detector bundle")?;
    Ok(SyntheticBundle {
        input,
        geometry,
        signal: config.signal.clone(),
    })
}

/// Adds `h (a - i b) exp(i phi)` segment by segment, where `phi` follows the
/// source-frame phase evolution mapped through the same piecewise-linear
/// timing the core inverts.
fn inject(
    data: &mut [Complex32],
    x: usize,
    config: &GeneratorConfig,
    geometry: &ToyEarthGeometry,
    stamps: &SegmentTimestamps,
    signal: &SignalConfig,
) -> anyhow::Result<()> {
    let timing = geometry
        .sky_timing(&signal.sky, config.epoch)
        .context("timing for signal injection")?;
    let antenna = geometry
        .antenna_coeffs(&signal.sky)
        .context("antenna patterns for signal injection")?;
    let (map, coeffs) = (&timing[x], &antenna.per_detector[x]);
    let per_segment = config.samples_per_segment();

    for (j, &start) in stamps.starts.iter().enumerate() {
        let first = ((start - config.epoch) / config.delta_t).round() as usize;
        let mid_det = (start - config.epoch) + 0.5 * config.t_seg;
        let weight = Complex64::new(f64::from(coeffs.a[j]), -f64::from(coeffs.b[j]));
        for k in first..(first + per_segment).min(data.len()) {
            let t_det = k as f64 * config.delta_t;
            let tau = map.delta_t[j] + map.tdot[j] * (t_det - mid_det);
            let cycles = signal.freq * tau + 0.5 * signal.fdot * tau * tau - config.f_het * t_det;
            let phase = Complex64::from_polar(1.0, TAU * cycles.fract());
            let value = weight * signal.amplitude * phase;
            data[k] += Complex32::new(value.re as f32, value.im as f32);
        }
    }
    Ok(())
}
