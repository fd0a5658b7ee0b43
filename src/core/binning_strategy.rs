/// Trait for breakpoint learning strategies.
///
/// Designed for static polymorphism: the learner is generic over
/// `B: BinningStrategy`, so each strategy is monomorphized into its own
/// column loop. The runtime choice between strategies happens once per
/// configuration through [`BinningMethod`](crate::core::config::BinningMethod).
pub trait BinningStrategy: Clone + Send + Sync {
    /// Compute `alphabet_size - 1` non-decreasing cut points for one coefficient.
    ///
    /// `column` holds `(value, class_index)` pairs sorted ascending by value
    /// (ties broken by class index), and is never empty. A value equal to a cut
    /// point is assigned to the lower bin.
    fn cuts(column: &[(f64, usize)], alphabet_size: usize, n_classes: usize) -> Vec<f64>;

    /// Whether the strategy reads the class labels.
    ///
    /// Unsupervised strategies receive a column whose class indices are all zero.
    fn is_supervised() -> bool {
        false
    }
}
