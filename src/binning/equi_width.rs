use crate::core::binning_strategy::BinningStrategy;

/// Equal-width binning between the observed minimum and maximum.
#[derive(Debug, Clone)]
pub struct EquiWidth;

impl BinningStrategy for EquiWidth {
    fn cuts(column: &[(f64, usize)], alphabet_size: usize, _n_classes: usize) -> Vec<f64> {
        let lo = column[0].0;
        let hi = column[column.len() - 1].0;
        let width = (hi - lo) / alphabet_size as f64;
        (1..alphabet_size).map(|b| lo + width * b as f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_spacing() {
        let col: Vec<(f64, usize)> = [0.0, 1.0, 1.5, 8.0].iter().map(|&v| (v, 0)).collect();
        let cuts = EquiWidth::cuts(&col, 4, 1);
        assert_eq!(cuts, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_constant_column() {
        let col = vec![(2.5, 0); 5];
        assert_eq!(EquiWidth::cuts(&col, 3, 1), vec![2.5, 2.5]);
    }
}
