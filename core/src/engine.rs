use crate::interface::{MultiDetectorInput, SearchPoint, StatRequest, StatResults};
use crate::prelude::{ResampResult, SkyGeometry};
use crate::processing::cache::{CacheDecision, ResamplingCache};
use crate::processing::resample::OutputGrid;
use crate::processing::spectral::{BandLayout, SpectralAssembler};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::CacheMetrics;

/// Extra frequency bins an outer search should add on each side of its band.
pub const EXTRA_BINS: usize = 8;

/// Resampling F-statistic over one multi-detector bundle.
///
/// Owns its cache; queries take the search point by reference so
/// independent instances can run side by side.
pub struct ResampFstat<G: SkyGeometry> {
    input: MultiDetectorInput,
    geometry: G,
    cache: ResamplingCache,
    assembler: SpectralAssembler,
    logger: LogManager,
}

impl<G: SkyGeometry> ResampFstat<G> {
    pub fn new(input: MultiDetectorInput, geometry: G) -> Self {
        let logger = LogManager::new("fstat");
        logger.record(&format!(
            "{} detector(s), {} samples at {} s, heterodyned at {} Hz",
            input.num_detectors(),
            input.num_samples(),
            input.delta_t(),
            input.f_het()
        ));
        Self {
            input,
            geometry,
            cache: ResamplingCache::new(),
            assembler: SpectralAssembler::new(),
            logger,
        }
    }

    /// Computes the requested quantities over `request.num_bins` bins
    /// starting at `point.fkdot[0]`. On error no partial results are
    /// returned.
    pub fn compute(
        &mut self,
        point: &SearchPoint,
        request: &StatRequest,
    ) -> ResampResult<StatResults> {
        self.cache.recorder().record_query();
        let outcome = self.compute_inner(point, request);
        if let Err(err) = &outcome {
            self.cache.recorder().record_failure();
            self.logger.warn(&format!("query at {} Hz failed: {}", point.freq(), err));
        }
        outcome
    }

    fn compute_inner(
        &mut self,
        point: &SearchPoint,
        request: &StatRequest,
    ) -> ResampResult<StatResults> {
        request.validate()?;
        point.validate()?;
        let d_freq = self.resolve_d_freq(request.d_freq);
        // the transform length is fixed by d_freq alone, so the band is
        // checked before the cache is touched
        let num_samples = OutputGrid::num_samples_for(d_freq, self.input.delta_t())?;
        BandLayout::locate(
            self.input.f_het(),
            point.freq(),
            d_freq,
            num_samples,
            request.num_bins,
        )?;

        let view = self.cache.query(point, d_freq, &self.input, &self.geometry)?;
        self.assembler.assemble(
            point,
            &request.quantities,
            d_freq,
            request.num_bins,
            view.antenna,
            view.weighted,
        )
    }

    /// Zero selects the natural resolution `1 / T_span` of the input.
    pub fn resolve_d_freq(&self, d_freq: f64) -> f64 {
        if d_freq == 0.0 {
            1.0 / self.input.span()
        } else {
            d_freq
        }
    }

    /// What the next query at `point` would do with the cached state.
    pub fn cache_decision(&self, point: &SearchPoint, request: &StatRequest) -> CacheDecision {
        self.cache.decide(point, self.resolve_d_freq(request.d_freq))
    }

    pub fn extra_bins(&self) -> usize {
        EXTRA_BINS
    }

    pub fn num_detectors(&self) -> usize {
        self.input.num_detectors()
    }

    pub fn span(&self) -> f64 {
        self.input.span()
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    pub fn cache(&self) -> &ResamplingCache {
        &self.cache
    }
}
