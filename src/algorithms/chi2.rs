/// Chi-squared statistic of one feature against the class labels.
///
/// `observed[c]` is the feature's total count over the training series of
/// class `c`; `class_fraction[c]` is the share of training series in class
/// `c`. The expected count under independence is
/// `class_fraction[c] * sum(observed)`. Classes with zero expectation
/// contribute nothing.
pub fn chi2_score(observed: &[f64], class_fraction: &[f64]) -> f64 {
    debug_assert_eq!(observed.len(), class_fraction.len());
    let total: f64 = observed.iter().sum();
    observed
        .iter()
        .zip(class_fraction)
        .map(|(&o, &p)| {
            let e = p * total;
            if e > 0.0 {
                (o - e) * (o - e) / e
            } else {
                0.0
            }
        })
        .sum()
}

/// Share of samples per class for class indices in `0..n_classes`.
pub fn class_fractions(class_index: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0.0; n_classes];
    for &c in class_index {
        counts[c] += 1.0;
    }
    let n = class_index.len().max(1) as f64;
    counts.iter_mut().for_each(|c| *c /= n);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_fractions() {
        assert_eq!(class_fractions(&[0, 1, 1, 1], 2), vec![0.25, 0.75]);
    }

    #[test]
    fn test_independent_feature_scores_zero() {
        let score = chi2_score(&[5.0, 5.0], &[0.5, 0.5]);
        assert!(score.abs() < 1e-12, "got {score}");
    }

    #[test]
    fn test_known_value() {
        // observed [8, 2], expected [5, 5]: 9/5 + 9/5
        let score = chi2_score(&[8.0, 2.0], &[0.5, 0.5]);
        assert!((score - 3.6).abs() < 1e-12, "got {score}");
    }

    #[test]
    fn test_discriminative_feature_scores_higher() {
        let frac = class_fractions(&[0, 0, 1, 1, 2, 2], 3);
        let pure = chi2_score(&[6.0, 0.0, 0.0], &frac);
        let mixed = chi2_score(&[3.0, 2.0, 1.0], &frac);
        assert!(pure > mixed, "pure {pure} <= mixed {mixed}");
    }
}
