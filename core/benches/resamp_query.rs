use std::f64::consts::TAU;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use num_complex::Complex32;
use resampcore::{
    AntennaCoeffs, ComplexTimeSeries, MultiAntennaCoeffs, MultiDetectorInput, ResampFstat,
    ResampResult, SearchPoint, SegmentTimestamps, SkyGeometry, SkyPosition, StatQuantities,
    StatRequest, TimingMap,
};

const EPOCH: f64 = 1_000_000_000.0;
const T_SEG: f64 = 1800.0;
const DELTA_T: f64 = 0.5;
const NUM_SEGMENTS: usize = 48;

/// Slow sinusoidal delay standing in for the Earth's orbit.
struct BenchGeometry {
    stamps: Vec<SegmentTimestamps>,
}

impl SkyGeometry for BenchGeometry {
    fn sky_timing(&self, sky: &SkyPosition, ref_time: f64) -> ResampResult<Vec<TimingMap>> {
        let omega = TAU / 86_400.0;
        let amplitude = 0.02 * sky.delta.cos();
        Ok(self
            .stamps
            .iter()
            .map(|stamps| {
                let (delta_t, tdot) = stamps
                    .starts
                    .iter()
                    .map(|&start| {
                        let mid = (start - EPOCH) + 0.5 * stamps.t_seg;
                        let phase = omega * mid + sky.alpha;
                        (
                            (EPOCH - ref_time) + mid + amplitude * phase.sin(),
                            1.0 + amplitude * omega * phase.cos(),
                        )
                    })
                    .unzip();
                TimingMap::new(ref_time, delta_t, tdot)
            })
            .collect())
    }

    fn antenna_coeffs(&self, sky: &SkyPosition) -> ResampResult<MultiAntennaCoeffs> {
        Ok(MultiAntennaCoeffs::new(
            self.stamps
                .iter()
                .enumerate()
                .map(|(x, stamps)| {
                    let (a, b) = (0..stamps.len())
                        .map(|j| {
                            let psi = sky.alpha + x as f64 + 0.3 * j as f64;
                            (psi.cos() as f32, psi.sin() as f32)
                        })
                        .unzip();
                    AntennaCoeffs::from_segments(a, b, T_SEG as f32)
                })
                .collect(),
        ))
    }
}

fn bundle(num_detectors: usize) -> (MultiDetectorInput, BenchGeometry) {
    let len = (NUM_SEGMENTS as f64 * T_SEG / DELTA_T) as usize;
    let stamps: Vec<_> = (0..num_detectors)
        .map(|_| SegmentTimestamps::contiguous(EPOCH, T_SEG, NUM_SEGMENTS))
        .collect();
    let series = (0..num_detectors)
        .map(|x| {
            let data = (0..len)
                .map(|k| {
                    let phase = TAU * (0.137 * k as f64 * DELTA_T).fract();
                    Complex32::from_polar(1.0, phase as f32)
                })
                .collect();
            ComplexTimeSeries::new(format!("D{}", x), EPOCH, 50.0, DELTA_T, data)
        })
        .collect();
    let input = MultiDetectorInput::new(series, stamps.clone()).unwrap();
    (input, BenchGeometry { stamps })
}

fn bench_frequency_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("Cached frequency scan");
    group.sample_size(10);

    for num_detectors in [1, 2] {
        let (input, geometry) = bundle(num_detectors);
        let mut engine = ResampFstat::new(input, geometry);
        let request = StatRequest::new(StatQuantities::two_f_only(), 0.0, 256);
        let sky = SkyPosition::new(1.2, -0.4);
        engine
            .compute(&SearchPoint::new(sky, EPOCH, vec![50.1]), &request)
            .unwrap();

        group.bench_with_input(
            BenchmarkId::new("spindown_step", num_detectors),
            &num_detectors,
            |b, _| {
                let mut fdot = 0.0;
                b.iter(|| {
                    fdot -= 1e-11;
                    let point = SearchPoint::new(sky, EPOCH, vec![50.1, black_box(fdot)]);
                    engine.compute(&point, &request).unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_sky_change(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sky change");
    group.sample_size(10);

    let (input, geometry) = bundle(2);
    let mut engine = ResampFstat::new(input, geometry);
    let request = StatRequest::new(StatQuantities::two_f_only(), 0.0, 256);
    group.bench_function("full_recompute", |b| {
        let mut alpha = 0.0;
        b.iter(|| {
            alpha += 0.01;
            let sky = SkyPosition::new(black_box(alpha), 0.2);
            let point = SearchPoint::new(sky, EPOCH, vec![50.1]);
            engine.compute(&point, &request).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_frequency_scan, bench_sky_change);
criterion_main!(benches);
