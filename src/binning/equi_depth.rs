use crate::core::binning_strategy::BinningStrategy;

/// Equal-depth (quantile) binning.
///
/// Cut `b` is the value at sorted rank `floor(b * n / alphabet) - 1`, so each
/// bin receives the same number of training observations up to ties. Ties at a
/// cut resolve to the lower bin.
#[derive(Debug, Clone)]
pub struct EquiDepth;

impl BinningStrategy for EquiDepth {
    fn cuts(column: &[(f64, usize)], alphabet_size: usize, _n_classes: usize) -> Vec<f64> {
        let n = column.len();
        (1..alphabet_size)
            .map(|b| {
                let rank = (b * n) / alphabet_size;
                column[rank.saturating_sub(1)].0
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Vec<(f64, usize)> {
        values.iter().map(|&v| (v, 0)).collect()
    }

    #[test]
    fn test_equal_counts_per_bin() {
        let col = column(&(0..12).map(|i| i as f64).collect::<Vec<_>>());
        let cuts = EquiDepth::cuts(&col, 4, 1);
        assert_eq!(cuts, vec![2.0, 5.0, 8.0]);
        // Each bin holds 3 values: {0,1,2}, {3,4,5}, {6,7,8}, {9,10,11}
        let mut counts = [0usize; 4];
        for (v, _) in &col {
            counts[cuts.partition_point(|&c| c < *v)] += 1;
        }
        assert_eq!(counts, [3, 3, 3, 3]);
    }

    #[test]
    fn test_binary_median() {
        let col = column(&[-3.0, -1.0, 1.0, 3.0]);
        assert_eq!(EquiDepth::cuts(&col, 2, 1), vec![-1.0]);
    }

    #[test]
    fn test_all_equal_collapses() {
        let col = column(&[4.0; 9]);
        let cuts = EquiDepth::cuts(&col, 3, 1);
        assert_eq!(cuts, vec![4.0, 4.0]);
    }

    #[test]
    fn test_fewer_values_than_bins() {
        let col = column(&[1.0]);
        let cuts = EquiDepth::cuts(&col, 4, 1);
        assert_eq!(cuts.len(), 3);
        assert!(cuts.windows(2).all(|w| w[0] <= w[1]));
    }
}
