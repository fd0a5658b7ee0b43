use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weasel_rs::algorithms::common::LowFrequencyDft;
use weasel_rs::algorithms::histogram::build_histogram;
use weasel_rs::algorithms::sampler::sample_configurations;
use weasel_rs::{fit_model, Breakpoints, SfaTransform, WeaselConfig};

fn dataset(n_per_class: usize, length: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut series = Vec::new();
    let mut labels = Vec::new();
    for i in 0..n_per_class {
        for (label, freq) in [(0usize, 0.1), (1, 0.7)] {
            let phase = i as f64 * 0.37;
            series.push(
                (0..length)
                    .map(|t| {
                        let t = t as f64;
                        (t * freq + phase).sin() + 0.1 * (t * 7.3 + phase).sin() * (t * 1.7).cos()
                    })
                    .collect(),
            );
            labels.push(label);
        }
    }
    (series, labels)
}

fn bench_dft_direct_vs_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("low_frequency_dft");
    for w in [32, 256, 1024] {
        let window: Vec<f64> = (0..w).map(|i| (i as f64 * 0.1).sin()).collect();
        let mut out = vec![0.0; 8];
        let mut dft = LowFrequencyDft::new(w, 8, true);
        group.bench_with_input(BenchmarkId::from_parameter(w), &w, |b, _| {
            b.iter(|| dft.transform(black_box(&window), &mut out))
        });
    }
    group.finish();
}

fn bench_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram");
    let (series, _) = dataset(1, 2_000);
    let config = WeaselConfig::new(8).with_window_range(16, 64).with_random_state(0);
    let configurations = sample_configurations(&config, 0, 2_000).unwrap();
    for cfg in configurations.iter().take(4) {
        let bp = Breakpoints::new(
            cfg.alphabet_size,
            (0..cfg.word_length).collect(),
            vec![vec![0.0; cfg.alphabet_size - 1]; cfg.word_length],
        );
        let mut sfa = SfaTransform::for_configuration(cfg, &bp);
        let id = format!("w{}_d{}", cfg.window_length, cfg.dilation);
        group.bench_function(id, |b| {
            b.iter(|| build_histogram(black_box(&series[0]), cfg, &bp, &mut sfa, false))
        });
    }
    group.finish();
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10);
    for n in [20, 50] {
        let (series, labels) = dataset(n, 128);
        let config = WeaselConfig::new(20).with_random_state(1);
        group.bench_with_input(BenchmarkId::from_parameter(2 * n), &n, |b, _| {
            b.iter(|| fit_model(black_box(&series), &labels, &config, None, |_| {}).unwrap())
        });
    }
    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let (series, labels) = dataset(30, 128);
    let model = fit_model(&series, &labels, &WeaselConfig::new(20).with_random_state(1), None, |_| {})
        .unwrap();
    c.bench_function("predict_60", |b| {
        b.iter(|| model.predict(black_box(&series)).unwrap())
    });
}

#[cfg(feature = "parallel")]
fn bench_fit_thread_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_thread_scaling");
    group.sample_size(10);
    let (series, labels) = dataset(40, 256);
    for threads in [1, 2, 4, 8] {
        let config = WeaselConfig::new(40)
            .with_random_state(1)
            .with_parallelism(threads);
        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, _| {
            b.iter(|| fit_model(black_box(&series), &labels, &config, None, |_| {}).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_dft_direct_vs_fft,
    bench_histogram,
    bench_fit,
    bench_predict,
);

#[cfg(feature = "parallel")]
criterion_group!(parallel_benches, bench_fit_thread_scaling);

#[cfg(feature = "parallel")]
criterion_main!(benches, parallel_benches);

#[cfg(not(feature = "parallel"))]
criterion_main!(benches);
