use crate::interface::{
    ComplexTimeSeries, MultiAntennaCoeffs, MultiDetectorInput, SearchPoint, TimingMap,
};
use crate::prelude::{ResampError, ResampResult, SkyGeometry};
use crate::processing::antenna::{AntennaWeighter, WeightedSeries};
use crate::processing::resample::BarycentricResampler;
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{CacheMetrics, MetricsRecorder};

/// How a query relates to the cached state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// Sky and binary keys match; only the spectral stage runs.
    Reuse,
    /// Sky key matches, binary key differs.
    RecomputeBinary,
    /// Sky key differs or nothing is cached.
    RecomputeAll,
}

/// Outer key. Compared exactly, no tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SkyKey {
    alpha: f64,
    delta: f64,
    ref_time: f64,
}

impl SkyKey {
    fn of(point: &SearchPoint) -> Self {
        Self {
            alpha: point.sky.alpha,
            delta: point.sky.delta,
            ref_time: point.ref_time,
        }
    }
}

/// Inner key. The frequency resolution fixes the length of the resampled
/// grid, so it lives here next to the orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BinaryKey {
    asini: f64,
    period: f64,
    ecc: f64,
    tp: f64,
    argp: f64,
    d_freq: f64,
}

impl BinaryKey {
    fn of(point: &SearchPoint, d_freq: f64) -> Self {
        let orbit = &point.binary;
        Self {
            asini: orbit.asini,
            period: orbit.period,
            ecc: orbit.ecc,
            tp: orbit.tp,
            argp: orbit.argp,
            d_freq,
        }
    }
}

struct SkyState {
    key: SkyKey,
    antenna: MultiAntennaCoeffs,
    timing: Vec<TimingMap>,
}

struct BinaryState {
    key: BinaryKey,
    weighted: Vec<WeightedSeries>,
}

struct CacheEntry {
    sky: SkyState,
    binary: BinaryState,
}

/// Borrowed view of the state a query may hand to the spectral stage.
pub struct CachedView<'a> {
    pub antenna: &'a MultiAntennaCoeffs,
    pub weighted: &'a [WeightedSeries],
}

/// Two-level cache of antenna coefficients, sky timing and antenna-weighted
/// source-frame series.
///
/// An entry is either complete for both keys or absent. Any failure while
/// updating leaves the cache empty, so the next query recomputes everything.
pub struct ResamplingCache {
    entry: Option<CacheEntry>,
    resampler: BarycentricResampler,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl ResamplingCache {
    pub fn new() -> Self {
        Self {
            entry: None,
            resampler: BarycentricResampler::new(),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("cache"),
        }
    }

    /// Classifies `point` against the cached keys without touching state.
    pub fn decide(&self, point: &SearchPoint, d_freq: f64) -> CacheDecision {
        match &self.entry {
            Some(entry) if entry.sky.key == SkyKey::of(point) => {
                if entry.binary.key == BinaryKey::of(point, d_freq) {
                    CacheDecision::Reuse
                } else {
                    CacheDecision::RecomputeBinary
                }
            }
            _ => CacheDecision::RecomputeAll,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Weighted source-frame series of the current entry.
    pub fn weighted(&self) -> Option<&[WeightedSeries]> {
        self.entry.as_ref().map(|entry| entry.binary.weighted.as_slice())
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.snapshot()
    }

    pub(crate) fn recorder(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Brings the cache in line with `point` and returns the state the
    /// spectral stage needs.
    pub fn query<G: SkyGeometry + ?Sized>(
        &mut self,
        point: &SearchPoint,
        d_freq: f64,
        input: &MultiDetectorInput,
        geometry: &G,
    ) -> ResampResult<CachedView<'_>> {
        let decision = self.decide(point, d_freq);
        if decision != CacheDecision::Reuse {
            self.logger.record(&format!(
                "{:?} at alpha {:.6}, delta {:.6}",
                decision, point.sky.alpha, point.sky.delta
            ));
        }
        let outcome = match decision {
            CacheDecision::Reuse => Ok(0),
            CacheDecision::RecomputeBinary => self.refresh_binary(point, d_freq, input, geometry),
            CacheDecision::RecomputeAll => self.refresh_all(point, d_freq, input, geometry),
        };

        match outcome {
            Ok(clamped) => {
                self.metrics.record_decision(decision);
                if clamped > 0 {
                    self.metrics.record_clamped(clamped);
                }
            }
            Err(err) => {
                self.entry = None;
                self.logger
                    .warn(&format!("cache update failed, entry dropped: {}", err));
                return Err(err);
            }
        }

        let entry = self
            .entry
            .as_ref()
            .ok_or_else(|| ResampError::Internal("cache entry missing after update".into()))?;
        Ok(CachedView {
            antenna: &entry.sky.antenna,
            weighted: &entry.binary.weighted,
        })
    }

    fn refresh_binary<G: SkyGeometry + ?Sized>(
        &mut self,
        point: &SearchPoint,
        d_freq: f64,
        input: &MultiDetectorInput,
        geometry: &G,
    ) -> ResampResult<usize> {
        // Taken out so a failure below leaves nothing behind.
        let entry = self
            .entry
            .take()
            .ok_or_else(|| ResampError::Internal("binary refresh without a sky entry".into()))?;
        self.logger.detail(&format!(
            "binary key changed (asini {} s, period {} s), resampling",
            point.binary.asini, point.binary.period
        ));

        let (weighted, clamped) =
            weigh_for(&self.resampler, &entry.sky, point, d_freq, input, geometry)?;
        self.entry = Some(CacheEntry {
            sky: entry.sky,
            binary: BinaryState {
                key: BinaryKey::of(point, d_freq),
                weighted,
            },
        });
        Ok(clamped)
    }

    fn refresh_all<G: SkyGeometry + ?Sized>(
        &mut self,
        point: &SearchPoint,
        d_freq: f64,
        input: &MultiDetectorInput,
        geometry: &G,
    ) -> ResampResult<usize> {
        self.logger.detail(&format!(
            "sky key changed (alpha {:.6}, delta {:.6}), recomputing timing and antenna patterns",
            point.sky.alpha, point.sky.delta
        ));

        let timing = geometry.sky_timing(&point.sky, point.ref_time)?;
        let antenna = geometry.antenna_coeffs(&point.sky)?;
        let segments: Vec<usize> = input.timestamps().iter().map(|s| s.len()).collect();
        antenna.check_shape(&segments)?;

        let sky = SkyState {
            key: SkyKey::of(point),
            antenna,
            timing,
        };
        let (weighted, clamped) = weigh_for(&self.resampler, &sky, point, d_freq, input, geometry)?;
        self.entry = Some(CacheEntry {
            sky,
            binary: BinaryState {
                key: BinaryKey::of(point, d_freq),
                weighted,
            },
        });
        Ok(clamped)
    }
}

impl Default for ResamplingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Resamples every detector under the full timing of `point` and applies the
/// antenna weights. Returns the weighted series and the clamp count.
fn weigh_for<G: SkyGeometry + ?Sized>(
    resampler: &BarycentricResampler,
    sky: &SkyState,
    point: &SearchPoint,
    d_freq: f64,
    input: &MultiDetectorInput,
    geometry: &G,
) -> ResampResult<(Vec<WeightedSeries>, usize)> {
    let with_orbit;
    let timing: &[TimingMap] = if point.binary.is_binary() {
        with_orbit = geometry.binary_timing(&sky.timing, &point.binary)?;
        &with_orbit
    } else {
        &sky.timing
    };

    let resampled = resampler.resample_multi(input, timing, d_freq)?;
    let clamped = resampled.iter().map(|r| r.clamped).sum();
    let (series, starts): (Vec<ComplexTimeSeries>, Vec<Vec<f64>>) = resampled
        .into_iter()
        .map(|r| (r.series, r.segment_starts))
        .unzip();

    let weighted = AntennaWeighter::weight_multi(&series, &sky.antenna, &starts, input.t_seg())?;
    Ok((weighted, clamped))
}
