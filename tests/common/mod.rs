#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Two-class synthetic problem: slow sines against fast sines, with noise.
///
/// `offset` shifts the noise stream so that train and test sets differ.
pub fn two_class_dataset(n_per_class: usize, length: usize, offset: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(1234 + offset);
    let mut series = Vec::with_capacity(2 * n_per_class);
    let mut labels = Vec::with_capacity(2 * n_per_class);
    for _ in 0..n_per_class {
        for (label, freq) in [(0usize, 0.12), (1, 0.8)] {
            let phase: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            let amplitude: f64 = rng.gen_range(0.8..1.2);
            let s: Vec<f64> = (0..length)
                .map(|t| amplitude * (t as f64 * freq + phase).sin() + rng.gen_range(-0.15..0.15))
                .collect();
            series.push(s);
            labels.push(label);
        }
    }
    (series, labels)
}

pub fn accuracy(predicted: &[usize], truth: &[usize]) -> f64 {
    let correct = predicted.iter().zip(truth).filter(|(a, b)| a == b).count();
    correct as f64 / truth.len() as f64
}
