use std::sync::Mutex;

use serde::Serialize;

use crate::processing::cache::CacheDecision;

/// Counters describing how queries were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub queries: usize,
    pub reuses: usize,
    pub binary_recomputes: usize,
    pub sky_recomputes: usize,
    pub clamped_samples: usize,
    pub failures: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<CacheMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheMetrics::default()),
        }
    }

    pub fn record_query(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.queries += 1;
        }
    }

    pub fn record_decision(&self, decision: CacheDecision) {
        if let Ok(mut metrics) = self.inner.lock() {
            match decision {
                CacheDecision::Reuse => metrics.reuses += 1,
                CacheDecision::RecomputeBinary => metrics.binary_recomputes += 1,
                CacheDecision::RecomputeAll => metrics.sky_recomputes += 1,
            }
        }
    }

    pub fn record_clamped(&self, samples: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.clamped_samples += samples;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failures += 1;
        }
    }

    pub fn snapshot(&self) -> CacheMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            CacheMetrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
