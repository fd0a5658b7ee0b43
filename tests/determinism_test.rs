mod common;

use common::two_class_dataset;
use weasel_rs::{fit_model, BinningMethod, FittedModel, WeaselConfig};

fn config(parallelism: usize) -> WeaselConfig {
    WeaselConfig::new(12)
        .with_window_range(4, 20)
        .with_word_lengths(vec![4, 5])
        .with_alphabet_sizes(vec![2, 4])
        .with_norm_options(vec![true, false])
        .with_binning_strategies(vec![
            BinningMethod::EquiDepth,
            BinningMethod::EquiWidth,
            BinningMethod::InformationGain,
        ])
        .with_random_state(99)
        .with_parallelism(parallelism)
}

fn fit(parallelism: usize) -> FittedModel {
    let (x, y) = two_class_dataset(10, 80, 0);
    fit_model(&x, &y, &config(parallelism), None, |_| {}).unwrap()
}

fn assert_same_model(a: &FittedModel, b: &FittedModel) {
    assert_eq!(a.configurations(), b.configurations(), "configurations differ");
    assert_eq!(a.vocabulary().keys(), b.vocabulary().keys(), "vocabulary differs");
    assert_eq!(a.classifier(), b.classifier(), "classifier weights differ");
}

#[test]
fn test_repeated_fits_identical() {
    assert_same_model(&fit(4), &fit(4));
}

#[test]
fn test_parallelism_does_not_change_model() {
    assert_same_model(&fit(1), &fit(4));
}

#[test]
fn test_predictions_identical_across_parallelism() {
    let (x, _) = two_class_dataset(5, 80, 7);
    let mut a = fit(1);
    let b = fit(3);
    a.set_parallelism(1);
    assert_eq!(a.decision_function(&x).unwrap(), b.decision_function(&x).unwrap());
}

#[test]
fn test_different_seed_changes_configurations() {
    let (x, y) = two_class_dataset(10, 80, 0);
    let a = fit_model(&x, &y, &config(2), None, |_| {}).unwrap();
    let b = fit_model(&x, &y, &config(2).with_random_state(100), None, |_| {}).unwrap();
    assert_ne!(a.configurations(), b.configurations());
}
