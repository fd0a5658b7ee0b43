use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::logspace;
use crate::core::error::{Result, WeaselError};
use crate::core::linear_model::LinearClassifier;
use crate::core::sparse::SparseMatrix;

/// One-vs-rest ridge classifier with leave-one-out choice of the penalty.
///
/// Targets are `+1` for the row's class and `-1` otherwise, one output per
/// class. The fit works in the dual (`n_samples x n_samples` Gram matrix of the
/// centered features), which stays small when the vocabulary is much wider
/// than the training set. For every candidate alpha the exact leave-one-out
/// residuals are `C_ij / G_ii` with `G = (K + alpha I)^-1` and `C = G Y`;
/// the alpha with the smallest mean squared residual wins (first on ties).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeClassifierCv {
    alphas: Vec<f64>,
    alpha: f64,
    loo_mse: f64,
    n_features: usize,
    n_outputs: usize,
    /// Row-major `n_features x n_outputs`.
    coef: Vec<f64>,
    intercept: Vec<f64>,
}

impl Default for RidgeClassifierCv {
    fn default() -> Self {
        Self::new(logspace(-1.0, 5.0, 10))
    }
}

impl RidgeClassifierCv {
    /// Unfitted classifier choosing among the given penalties.
    pub fn new(alphas: Vec<f64>) -> Self {
        Self {
            alphas,
            alpha: f64::NAN,
            loo_mse: f64::NAN,
            n_features: 0,
            n_outputs: 0,
            coef: Vec::new(),
            intercept: Vec::new(),
        }
    }

    /// Penalty chosen by leave-one-out.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Mean squared leave-one-out residual at the chosen alpha.
    pub fn loo_mse(&self) -> f64 {
        self.loo_mse
    }

    /// Candidate penalties, in evaluation order.
    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    /// Whether `fit` has completed.
    pub fn is_fitted(&self) -> bool {
        self.n_outputs > 0
    }

    /// Weight of `feature` for output `class`.
    pub fn coefficient(&self, feature: usize, class: usize) -> f64 {
        self.coef[feature * self.n_outputs + class]
    }

    /// Per-class bias term.
    pub fn intercept(&self) -> &[f64] {
        &self.intercept
    }
}

/// Double-centered Gram matrix `(X - 1 m^T)(X - 1 m^T)^T`.
fn centered_gram(x: &SparseMatrix) -> DMatrix<f64> {
    let n = x.n_rows();
    let k = DMatrix::from_row_slice(n, n, &x.gram());
    let row_means: Vec<f64> = (0..n).map(|i| k.row(i).sum() / n as f64).collect();
    let total = row_means.iter().sum::<f64>() / n as f64;
    DMatrix::from_fn(n, n, |i, j| k[(i, j)] - row_means[i] - row_means[j] + total)
}

impl LinearClassifier for RidgeClassifierCv {
    fn fit(&mut self, x: &SparseMatrix, y: &[usize], n_classes: usize) -> Result<()> {
        let n = x.n_rows();
        if n != y.len() {
            return Err(WeaselError::InvalidInput(format!(
                "{n} feature rows but {} labels",
                y.len()
            )));
        }
        if n < 2 || n_classes < 2 {
            return Err(WeaselError::InvalidInput(
                "ridge fit needs at least two samples and two classes".into(),
            ));
        }
        if self.alphas.is_empty() {
            return Err(WeaselError::Configuration("no ridge alphas given".into()));
        }

        let targets = DMatrix::from_fn(n, n_classes, |i, c| if y[i] == c { 1.0 } else { -1.0 });
        let y_mean: Vec<f64> = (0..n_classes)
            .map(|c| targets.column(c).sum() / n as f64)
            .collect();
        let yc = DMatrix::from_fn(n, n_classes, |i, c| targets[(i, c)] - y_mean[c]);
        let kc = centered_gram(x);

        let mut best: Option<(f64, f64, DMatrix<f64>)> = None;
        for &alpha in &self.alphas {
            let mut a = kc.clone();
            for i in 0..n {
                a[(i, i)] += alpha;
            }
            let chol = a.cholesky().ok_or_else(|| {
                WeaselError::NumericalFailure(format!(
                    "Gram matrix is not positive definite at alpha {alpha}"
                ))
            })?;
            let g = chol.inverse();
            let dual = &g * &yc;
            let mut sse = 0.0;
            for i in 0..n {
                let gii = g[(i, i)];
                for c in 0..n_classes {
                    let e = dual[(i, c)] / gii;
                    sse += e * e;
                }
            }
            let mse = sse / (n * n_classes) as f64;
            debug!(alpha, loo_mse = mse, "ridge candidate");
            if best.as_ref().map_or(true, |(_, b, _)| mse < *b) {
                best = Some((alpha, mse, dual));
            }
        }
        let Some((alpha, loo_mse, dual)) = best else {
            return Err(WeaselError::NumericalFailure("no ridge candidate succeeded".into()));
        };
        if !loo_mse.is_finite() {
            return Err(WeaselError::NumericalFailure(format!(
                "leave-one-out error is {loo_mse}"
            )));
        }

        // w = (X - 1 m^T)^T C = X^T C - m (1^T C)
        let dual_rows: Vec<f64> = (0..n)
            .flat_map(|i| (0..n_classes).map(move |c| (i, c)))
            .map(|(i, c)| dual[(i, c)])
            .collect();
        let mut coef = x.transpose_times_dense(&dual_rows, n_classes);
        let x_mean = x.column_means();
        let dual_sums: Vec<f64> = (0..n_classes).map(|c| dual.column(c).sum()).collect();
        for (f, &m) in x_mean.iter().enumerate() {
            if m != 0.0 {
                for c in 0..n_classes {
                    coef[f * n_classes + c] -= m * dual_sums[c];
                }
            }
        }
        // b = y_mean - m^T w
        let mut intercept = y_mean;
        for (f, &m) in x_mean.iter().enumerate() {
            if m != 0.0 {
                for c in 0..n_classes {
                    intercept[c] -= m * coef[f * n_classes + c];
                }
            }
        }

        self.alpha = alpha;
        self.loo_mse = loo_mse;
        self.n_features = x.n_cols();
        self.n_outputs = n_classes;
        self.coef = coef;
        self.intercept = intercept;
        Ok(())
    }

    fn decision_function(&self, x: &SparseMatrix) -> Result<Vec<Vec<f64>>> {
        if !self.is_fitted() {
            return Err(WeaselError::NotFitted);
        }
        if self.coef.len() != self.n_features * self.n_outputs
            || self.intercept.len() != self.n_outputs
        {
            return Err(WeaselError::InvalidInput(format!(
                "ridge weights do not match {} features x {} outputs",
                self.n_features, self.n_outputs
            )));
        }
        if x.n_cols() != self.n_features {
            return Err(WeaselError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features,
                x.n_cols()
            )));
        }
        Ok((0..x.n_rows())
            .map(|i| {
                let mut scores = self.intercept.clone();
                x.row_times_dense(i, &self.coef, self.n_outputs, &mut scores);
                scores
            })
            .collect())
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (SparseMatrix, Vec<usize>) {
        // Class 0 fires feature 0, class 1 fires feature 1; feature 2 is shared noise.
        let rows = vec![
            vec![(0, 3.0), (2, 1.0)],
            vec![(0, 4.0), (2, 2.0)],
            vec![(0, 2.0)],
            vec![(1, 3.0), (2, 1.0)],
            vec![(1, 5.0)],
            vec![(1, 4.0), (2, 2.0)],
        ];
        (SparseMatrix::from_rows(rows, 3), vec![0, 0, 0, 1, 1, 1])
    }

    fn argmax(v: &[f64]) -> usize {
        v.iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_fits_separable_data() {
        let (x, y) = separable();
        let mut clf = RidgeClassifierCv::default();
        clf.fit(&x, &y, 2).unwrap();
        let scores = clf.decision_function(&x).unwrap();
        for (s, &label) in scores.iter().zip(&y) {
            assert_eq!(argmax(s), label, "scores {s:?}");
        }
        assert!(clf.alphas().contains(&clf.alpha()));
        assert!(clf.loo_mse().is_finite());
    }

    #[test]
    fn test_matches_primal_solution() {
        let (x, y) = separable();
        let alpha = 0.5;
        let mut clf = RidgeClassifierCv::new(vec![alpha]);
        clf.fit(&x, &y, 2).unwrap();

        // Primal: w = (Xc^T Xc + alpha I)^-1 Xc^T Yc
        let n = x.n_rows();
        let mut dense = DMatrix::zeros(n, 3);
        for i in 0..n {
            let (idx, vals) = x.row(i);
            for (&c, &v) in idx.iter().zip(vals) {
                dense[(i, c)] = v;
            }
        }
        let means = x.column_means();
        let xc = DMatrix::from_fn(n, 3, |i, j| dense[(i, j)] - means[j]);
        // Balanced classes: the +-1 targets already have zero mean.
        let yc = DMatrix::from_fn(n, 2, |i, c| if y[i] == c { 1.0 } else { -1.0 });
        let lhs = xc.transpose() * &xc + DMatrix::identity(3, 3) * alpha;
        let w = lhs.cholesky().unwrap().solve(&(xc.transpose() * yc));
        for f in 0..3 {
            for c in 0..2 {
                let got = clf.coefficient(f, c);
                assert!((got - w[(f, c)]).abs() < 1e-8, "w[{f},{c}]: {got} vs {}", w[(f, c)]);
            }
        }
    }

    #[test]
    fn test_empty_row_scores_intercept() {
        let (x, y) = separable();
        let mut clf = RidgeClassifierCv::default();
        clf.fit(&x, &y, 2).unwrap();
        let empty = SparseMatrix::from_rows(vec![vec![]], 3);
        let scores = clf.decision_function(&empty).unwrap();
        assert_eq!(scores[0], clf.intercept());
    }

    #[test]
    fn test_not_fitted() {
        let clf = RidgeClassifierCv::default();
        let x = SparseMatrix::from_rows(vec![vec![(0, 1.0)]], 1);
        assert!(matches!(clf.decision_function(&x), Err(WeaselError::NotFitted)));
    }

    #[test]
    fn test_rejects_width_mismatch() {
        let (x, y) = separable();
        let mut clf = RidgeClassifierCv::default();
        clf.fit(&x, &y, 2).unwrap();
        let other = SparseMatrix::from_rows(vec![vec![(0, 1.0)]], 5);
        assert!(matches!(
            clf.decision_function(&other),
            Err(WeaselError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_three_classes() {
        let rows = vec![
            vec![(0, 2.0)],
            vec![(0, 3.0)],
            vec![(1, 2.0)],
            vec![(1, 3.0)],
            vec![(2, 2.0)],
            vec![(2, 3.0)],
        ];
        let x = SparseMatrix::from_rows(rows, 3);
        let y = vec![0, 0, 1, 1, 2, 2];
        let mut clf = RidgeClassifierCv::default();
        clf.fit(&x, &y, 3).unwrap();
        let scores = clf.decision_function(&x).unwrap();
        for (s, &label) in scores.iter().zip(&y) {
            assert_eq!(argmax(s), label);
        }
    }
}
