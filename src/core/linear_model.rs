use crate::core::error::Result;
use crate::core::sparse::SparseMatrix;

/// Trainable linear model consumed by the ensemble driver.
///
/// The driver only needs a fit over the sparse bag-of-words matrix and a
/// per-class decision score; how the weights are optimized is up to the
/// implementation.
pub trait LinearClassifier: Clone + Send + Sync {
    /// Fit on `x` with class indices `y` in `0..n_classes`.
    fn fit(&mut self, x: &SparseMatrix, y: &[usize], n_classes: usize) -> Result<()>;

    /// Per-class decision scores, one row per input row.
    fn decision_function(&self, x: &SparseMatrix) -> Result<Vec<Vec<f64>>>;

    /// Number of input features the model was fit on.
    fn n_features(&self) -> usize;

    /// Number of score columns `decision_function` returns.
    fn n_classes(&self) -> usize;
}
