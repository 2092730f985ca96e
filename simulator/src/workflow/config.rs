use crate::generator::profile::GeneratorConfig;
use anyhow::{ensure, Context};
use resampcore::{BinaryOrbit, SkyPosition, StatQuantities, StatRequest};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Synthetic data plus the template grid to scan over it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    pub sky: Vec<SkyPosition>,
    /// Reference time of the frequency derivatives; defaults to the data epoch.
    #[serde(default)]
    pub ref_time: Option<f64>,
    pub f_start: f64,
    pub num_bins: usize,
    #[serde(default)]
    pub d_freq: f64,
    /// First spin-down values to step through at every sky position.
    #[serde(default = "default_fdot")]
    pub fdot: Vec<f64>,
    #[serde(default)]
    pub orbit: BinaryOrbit,
    #[serde(default = "StatQuantities::two_f_only")]
    pub quantities: StatQuantities,
}

fn default_fdot() -> Vec<f64> {
    vec![0.0]
}

impl ScanConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scan config {}", path_ref.display()))?;
        let config: ScanConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scan config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Scans the injected sky position and `sky_points - 1` neighbours
    /// spaced `sky_step` radians apart in right ascension, with `fdot_steps`
    /// spin-down values bracketing the injection.
    pub fn from_args(
        f_start: f64,
        num_bins: usize,
        sky_points: usize,
        sky_step: f64,
        fdot_steps: usize,
        seed: u64,
    ) -> Self {
        let generator = GeneratorConfig {
            seed,
            ..Default::default()
        };
        let (center, fdot_center) = generator
            .signal
            .as_ref()
            .map(|signal| (signal.sky, signal.fdot))
            .unwrap_or((SkyPosition::new(0.0, 0.0), 0.0));

        let sky = (0..sky_points.max(1))
            .map(|i| SkyPosition::new(center.alpha + i as f64 * sky_step, center.delta))
            .collect();
        let steps = fdot_steps.max(1);
        let fdot = (0..steps)
            .map(|i| fdot_center * 2.0 * i as f64 / (steps.max(2) - 1) as f64)
            .collect();

        Self {
            generator,
            sky,
            ref_time: None,
            f_start,
            num_bins,
            d_freq: 0.0,
            fdot,
            orbit: BinaryOrbit::isolated(),
            quantities: StatQuantities::two_f_only(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.sky.is_empty(), "scan config lists no sky positions");
        ensure!(!self.fdot.is_empty(), "scan config lists no spin-down values");
        self.request()
            .validate()
            .context("checking requested output")?;
        Ok(())
    }

    pub fn ref_time(&self) -> f64 {
        self.ref_time.unwrap_or(self.generator.epoch)
    }

    pub fn request(&self) -> StatRequest {
        StatRequest::new(self.quantities, self.d_freq, self.num_bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_brackets_the_injection() {
        let cfg = ScanConfig::from_args(100.15, 512, 3, 0.01, 3, 7);
        assert_eq!(cfg.sky.len(), 3);
        assert_eq!(cfg.fdot.len(), 3);
        assert_eq!(cfg.fdot[1], -1e-9);
        assert_eq!(cfg.ref_time(), cfg.generator.epoch);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"sky:\n  - alpha: 1.0\n    delta: 0.4\nf_start: 100.1\nnum_bins: 64\nfdot: [0.0, -1.0e-9]\ngenerator:\n  num_segments: 4\n  seed: 3\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = ScanConfig::load(&path).unwrap();
        assert_eq!(cfg.num_bins, 64);
        assert_eq!(cfg.fdot.len(), 2);
        assert_eq!(cfg.generator.num_segments, 4);
        assert_eq!(cfg.generator.t_seg, 1800.0);
        assert!(cfg.quantities.two_f);
        assert!(!cfg.orbit.is_binary());
    }

    #[test]
    fn config_load_rejects_atoms() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"sky:\n  - alpha: 1.0\n    delta: 0.4\nf_start: 100.1\nnum_bins: 64\nquantities:\n  two_f: true\n  atoms_per_det: true\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        assert!(ScanConfig::load(&path).is_err());
    }
}
