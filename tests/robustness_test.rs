mod common;

use std::sync::atomic::AtomicBool;

use common::two_class_dataset;
use weasel_rs::{Stage, Weasel, WeaselConfig, WeaselError};

fn config() -> WeaselConfig {
    WeaselConfig::new(6)
        .with_window_range(4, 16)
        .with_word_lengths(vec![4])
        .with_alphabet_sizes(vec![4])
        .with_random_state(3)
        .with_parallelism(2)
}

#[test]
fn test_predict_before_fit() {
    let clf = Weasel::new(config());
    assert_eq!(clf.stage(), Stage::Unfit);
    let err = clf.predict(&[vec![0.0; 32]]).unwrap_err();
    assert!(matches!(err, WeaselError::NotFitted));
    assert_eq!(err.to_string(), "model is not fitted");
    assert!(matches!(clf.predict_proba(&[vec![0.0; 32]]), Err(WeaselError::NotFitted)));
    assert!(matches!(clf.feature_count(), Err(WeaselError::NotFitted)));
}

#[test]
fn test_unseen_words_give_defined_prediction() {
    let (x, y) = two_class_dataset(8, 64, 0);
    let mut clf = Weasel::new(config());
    clf.fit(&x, &y).unwrap();

    // Constant series only produce the sentinel word, which noisy training data never does.
    let constant = vec![vec![2.0; 64]];
    let model = clf.model().unwrap();
    assert_eq!(model.transform(&constant).unwrap().nnz(), 0);
    let pred = clf.predict(&constant).unwrap();
    assert!(model.classes().contains(&pred[0]));
    let proba = clf.predict_proba(&constant).unwrap();
    assert!((proba[0].iter().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn test_vocabulary_frozen_across_predictions() {
    let (x, y) = two_class_dataset(8, 64, 0);
    let mut clf = Weasel::new(config().with_max_feature_count(50));
    clf.fit(&x, &y).unwrap();
    let before = clf.feature_count().unwrap();
    assert!(before <= 50);
    for offset in 1..4 {
        let (t, _) = two_class_dataset(3, 64, offset);
        clf.predict(&t).unwrap();
        assert_eq!(clf.feature_count().unwrap(), before);
    }
    assert_eq!(clf.stage(), Stage::Fit);
}

#[test]
fn test_failed_fit_leaves_unfit() {
    let (x, y) = two_class_dataset(8, 64, 0);
    let mut clf = Weasel::new(config());
    clf.fit(&x, &y).unwrap();
    assert!(clf.model().is_some());

    let short = vec![vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]];
    let err = clf.fit(&short, &[0, 1]).unwrap_err();
    assert!(matches!(err, WeaselError::Configuration(_)), "got {err:?}");
    assert_eq!(clf.stage(), Stage::Unfit);
    assert!(clf.model().is_none());
    assert!(matches!(clf.predict(&x), Err(WeaselError::NotFitted)));
}

#[test]
fn test_cancelled_fit() {
    let (x, y) = two_class_dataset(4, 48, 0);
    let mut clf = Weasel::new(config());
    let cancel = AtomicBool::new(true);
    let err = clf.fit_cancellable(&x, &y, &cancel).unwrap_err();
    assert!(matches!(err, WeaselError::Cancelled));
    assert_eq!(clf.stage(), Stage::Unfit);
}

#[test]
fn test_label_count_mismatch() {
    let (x, _) = two_class_dataset(4, 48, 0);
    let mut clf = Weasel::new(config());
    let err = clf.fit(&x, &[0, 1]).unwrap_err();
    assert!(matches!(err, WeaselError::InvalidInput(_)));
}
