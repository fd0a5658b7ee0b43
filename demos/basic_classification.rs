//! Train and evaluate a dictionary classifier on a synthetic two-class problem.
//!
//! Class 0 holds slow sine waves, class 1 the same waves with a short burst
//! inserted at a random position, so only local patterns separate them.
//!
//! Run with: cargo run --release --example basic_classification

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use weasel_rs::{Weasel, WeaselConfig};

fn make_series(rng: &mut ChaCha8Rng, length: usize, burst: bool) -> Vec<f64> {
    let phase: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let mut s: Vec<f64> = (0..length)
        .map(|t| (t as f64 * 0.08 + phase).sin() + rng.gen_range(-0.2..0.2))
        .collect();
    if burst {
        let start = rng.gen_range(0..length - 20);
        for (k, x) in s[start..start + 20].iter_mut().enumerate() {
            *x += 1.5 * (k as f64 * 1.9).sin();
        }
    }
    s
}

fn make_split(rng: &mut ChaCha8Rng, n_per_class: usize, length: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut series = Vec::new();
    let mut labels = Vec::new();
    for _ in 0..n_per_class {
        for label in [0, 1] {
            series.push(make_series(rng, length, label == 1));
            labels.push(label);
        }
    }
    (series, labels)
}

fn main() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let length = 150;
    let (train_x, train_y) = make_split(&mut rng, 40, length);
    let (test_x, test_y) = make_split(&mut rng, 25, length);

    let config = WeaselConfig::auto(train_x.len(), length).with_random_state(42);
    println!(
        "Ensemble size: {}, max window: {}",
        config.ensemble_size, config.max_window
    );

    let mut clf = Weasel::new(config);
    let model = clf.fit(&train_x, &train_y).expect("fit failed");
    let summary = model.summary();
    println!("Configurations: {}", summary.configurations);
    println!(
        "Words: {} candidates, {} retained",
        summary.candidate_words, summary.retained_words
    );
    println!("Degenerate windows: {}", summary.degenerate_windows);
    println!("Ridge alpha: {:.3}", summary.alpha);

    let pred = clf.predict(&test_x).expect("predict failed");
    let correct = pred.iter().zip(&test_y).filter(|(a, b)| a == b).count();
    println!(
        "\nHeld-out accuracy: {correct}/{} ({:.1}%)",
        test_y.len(),
        100.0 * correct as f64 / test_y.len() as f64
    );

    let proba = clf.predict_proba(&test_x[..3]).expect("predict_proba failed");
    for (i, p) in proba.iter().enumerate() {
        println!("  series {i}: P(class 0) = {:.3}, P(class 1) = {:.3}", p[0], p[1]);
    }
}
