use crate::generator::profile::SyntheticBundle;
use crate::workflow::config::ScanConfig;
use anyhow::Context;
use resampcore::{CacheMetrics, ResampFstat, SearchPoint, SkyPosition};
use serde::Serialize;
use std::sync::Arc;

/// Loudest template found at one sky position.
#[derive(Clone, Debug, Serialize)]
pub struct SkySummary {
    pub alpha: f64,
    pub delta: f64,
    pub two_f: f32,
    pub freq: f64,
    pub fdot: f64,
    pub cache: CacheMetrics,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScanReport {
    pub d_freq: f64,
    pub extra_bins: usize,
    pub templates: usize,
    pub sky: Vec<SkySummary>,
    pub loudest: Option<SkySummary>,
}

#[derive(Clone)]
pub struct Runner {
    config: Arc<ScanConfig>,
}

impl Runner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Runs every spin-down value at one sky position through a dedicated
    /// engine so consecutive queries hit the cache.
    pub fn scan_sky(
        config: &ScanConfig,
        bundle: &SyntheticBundle,
        sky: SkyPosition,
    ) -> anyhow::Result<SkySummary> {
        let mut engine = ResampFstat::new(bundle.input.clone(), bundle.geometry.clone());
        let request = config.request();
        let mut best: Option<(f32, f64, f64)> = None;

        for &fdot in &config.fdot {
            let point = SearchPoint::new(sky, config.ref_time(), vec![config.f_start, fdot])
                .with_binary(config.orbit);
            let results = engine.compute(&point, &request).with_context(|| {
                format!(
                    "computing 2F at alpha {:.4}, delta {:.4}, fdot {:e}",
                    sky.alpha, sky.delta, fdot
                )
            })?;
            if let Some((bin, two_f)) = results.loudest() {
                if best.map_or(true, |(b, _, _)| two_f > b) {
                    best = Some((two_f, results.freq_of_bin(bin), fdot));
                }
            }
        }

        let (two_f, freq, fdot) = best.unwrap_or((0.0, config.f_start, 0.0));
        log::info!(
            "sky ({:.4}, {:.4}): loudest 2F {:.2} at {:.6} Hz, fdot {:e}",
            sky.alpha,
            sky.delta,
            two_f,
            freq,
            fdot
        );
        Ok(SkySummary {
            alpha: sky.alpha,
            delta: sky.delta,
            two_f,
            freq,
            fdot,
            cache: engine.metrics(),
        })
    }

    /// Scans all sky positions in parallel on the blocking pool.
    pub async fn execute(&self, bundle: Arc<SyntheticBundle>) -> anyhow::Result<ScanReport> {
        let mut handles = Vec::with_capacity(self.config.sky.len());
        for &sky in &self.config.sky {
            let config = Arc::clone(&self.config);
            let bundle = Arc::clone(&bundle);
            handles.push(tokio::task::spawn_blocking(move || {
                Self::scan_sky(&config, &bundle, sky)
            }));
        }

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let summary = handle.await.context("joining sky worker")??;
            summaries.push(summary);
        }

        let loudest = summaries
            .iter()
            .max_by(|a, b| a.two_f.total_cmp(&b.two_f))
            .cloned();
        let d_freq = if self.config.d_freq > 0.0 {
            self.config.d_freq
        } else {
            1.0 / bundle.input.span()
        };

        Ok(ScanReport {
            d_freq,
            extra_bins: resampcore::EXTRA_BINS,
            templates: self.config.sky.len() * self.config.fdot.len(),
            sky: summaries,
            loudest,
        })
    }
}
