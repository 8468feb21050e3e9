//! Instrument correction and filtering benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lib_dsp::fft::FftEngine;
use lib_dsp::iir::{create_butterworth, Passband};
use lib_dsp::taper::FreqTaper;
use lib_dsp::transfer::transfer_sac_pz_segment;
use lib_dsp::SacPoleZero;
use lib_types::{Complex64, Seconds, Unit, Waveform};

fn broadband() -> SacPoleZero {
    SacPoleZero::new(
        vec![
            Complex64::new(-0.037, 0.037),
            Complex64::new(-0.037, -0.037),
            Complex64::new(-251.3, 0.0),
            Complex64::new(-131.0, 467.3),
            Complex64::new(-131.0, -467.3),
        ],
        vec![Complex64::new(0.0, 0.0); 3],
        6.0e17,
    )
}

fn signal(len: usize) -> Vec<f64> {
    (0..len).map(|i| (i as f64 * 0.01).sin() + 0.3 * (i as f64 * 0.37).cos()).collect()
}

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft");
    let mut engine = FftEngine::new();

    for len in [1000, 8000, 60000].iter() {
        let data = signal(*len);
        group.bench_with_input(BenchmarkId::new("forward_packed", len), &data, |b, d| {
            b.iter(|| engine.forward_packed(black_box(d)));
        });
    }

    group.finish();
}

fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer");
    let pz = broadband();
    let taper = FreqTaper::new(0.005, 0.01, 8.0, 10.0).unwrap();

    for len in [1000, 8000, 60000].iter() {
        let segment = Waveform::new(signal(*len), Seconds(0.025), Seconds(0.0), Unit::Counts);
        group.bench_with_input(BenchmarkId::new("segment", len), &segment, |b, s| {
            b.iter(|| transfer_sac_pz_segment(black_box(s), &pz, &taper));
        });
    }

    group.finish();
}

fn bench_iir(c: &mut Criterion) {
    let mut group = c.benchmark_group("iir");
    let data = signal(60000);

    for poles in [2, 4, 8].iter() {
        let filter = create_butterworth(*poles, Passband::Bandpass, 0.5, 5.0, Seconds(0.025)).unwrap();
        group.bench_with_input(BenchmarkId::new("bandpass", poles), &data, |b, d| {
            b.iter(|| filter.filter(black_box(d)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fft, bench_transfer, bench_iir);
criterion_main!(benches);
