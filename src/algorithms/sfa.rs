use crate::algorithms::common::{fill_dilated_window, mean_std, LowFrequencyDft, DEGENERATE_STD};
use crate::algorithms::sampler::Configuration;
use crate::core::breakpoints::Breakpoints;
use crate::core::word::Word;

/// Symbolic Fourier Approximation of fixed-length windows.
///
/// Owns the planned DFT and scratch buffers for one configuration, so a
/// worker creates one per configuration and reuses it for every window.
/// Output depends only on the window, the configuration and the breakpoints.
#[derive(Clone)]
pub struct SfaTransform {
    normalize: bool,
    dft: LowFrequencyDft,
    window: Vec<f64>,
    coefficients: Vec<f64>,
}

impl SfaTransform {
    /// Plan a transform computing the first `n_coefficients` stream entries.
    pub fn new(window_length: usize, n_coefficients: usize, normalize: bool) -> Self {
        Self {
            normalize,
            dft: LowFrequencyDft::new(window_length, n_coefficients, normalize),
            window: vec![0.0; window_length],
            coefficients: vec![0.0; n_coefficients],
        }
    }

    /// Transform sized for `cfg`, covering the given breakpoint support.
    pub fn for_configuration(cfg: &Configuration, breakpoints: &Breakpoints) -> Self {
        Self::new(
            cfg.window_length,
            breakpoints.coefficients_needed(),
            cfg.normalize,
        )
    }

    pub fn window_length(&self) -> usize {
        self.window.len()
    }

    pub fn n_coefficients(&self) -> usize {
        self.coefficients.len()
    }

    /// Coefficient stream of `window`, or `None` for a zero-variance window.
    pub fn coefficients(&mut self, window: &[f64]) -> Option<&[f64]> {
        self.window.copy_from_slice(window);
        self.transform_buffer()
    }

    /// Coefficient stream of the dilated window of `series` starting at `start`.
    pub fn coefficients_at(&mut self, series: &[f64], start: usize, dilation: usize) -> Option<&[f64]> {
        fill_dilated_window(series, start, dilation, &mut self.window);
        self.transform_buffer()
    }

    /// Word for `window`; zero-variance windows map to [`Word::SENTINEL`].
    pub fn discretize(&mut self, window: &[f64], breakpoints: &Breakpoints) -> Word {
        match self.coefficients(window) {
            Some(coefs) => breakpoints.quantize(coefs),
            None => Word::SENTINEL,
        }
    }

    /// Word for the dilated window of `series` starting at `start`.
    pub fn word_at(
        &mut self,
        series: &[f64],
        start: usize,
        dilation: usize,
        breakpoints: &Breakpoints,
    ) -> Word {
        match self.coefficients_at(series, start, dilation) {
            Some(coefs) => breakpoints.quantize(coefs),
            None => Word::SENTINEL,
        }
    }

    fn transform_buffer(&mut self) -> Option<&[f64]> {
        let (mean, std) = mean_std(&self.window);
        if std < DEGENERATE_STD {
            return None;
        }
        if self.normalize {
            let inv = 1.0 / std;
            for x in &mut self.window {
                *x = (*x - mean) * inv;
            }
        }
        self.dft.transform(&self.window, &mut self.coefficients);
        Some(&self.coefficients)
    }
}

/// Discretize a single window.
///
/// Convenience wrapper that plans a fresh transform; prefer [`SfaTransform`]
/// when discretizing many windows of the same configuration.
pub fn discretize(window: &[f64], normalize: bool, breakpoints: &Breakpoints) -> Word {
    SfaTransform::new(window.len(), breakpoints.coefficients_needed(), normalize)
        .discretize(window, breakpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakpoints(word_length: usize) -> Breakpoints {
        Breakpoints::new(
            4,
            (0..word_length).collect(),
            vec![vec![-1.0, 0.0, 1.0]; word_length],
        )
    }

    #[test]
    fn test_discretize_is_pure() {
        let window: Vec<f64> = (0..12).map(|i| (i as f64 * 0.9).sin() * 3.0).collect();
        let bp = breakpoints(4);
        let a = discretize(&window, true, &bp);
        let mut sfa = SfaTransform::new(12, 4, true);
        let b = sfa.discretize(&window, &bp);
        // Interleave another window to make sure no state leaks between calls.
        let other: Vec<f64> = (0..12).map(|i| i as f64).collect();
        sfa.discretize(&other, &bp);
        let c = sfa.discretize(&window, &bp);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_constant_window_is_sentinel() {
        let bp = breakpoints(3);
        assert_eq!(discretize(&[2.5; 10], true, &bp), Word::SENTINEL);
        assert_eq!(discretize(&[2.5; 10], false, &bp), Word::SENTINEL);
    }

    #[test]
    fn test_normalization_removes_offset_and_scale() {
        let base: Vec<f64> = (0..16).map(|i| (i as f64 * 0.4).sin()).collect();
        let shifted: Vec<f64> = base.iter().map(|x| 5.0 * x + 100.0).collect();
        let mut sfa = SfaTransform::new(16, 4, true);
        let a = sfa.coefficients(&base).unwrap().to_vec();
        let b = sfa.coefficients(&shifted).unwrap().to_vec();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-9, "{x} vs {y}");
        }
    }

    #[test]
    fn test_raw_keeps_dc() {
        let window = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut sfa = SfaTransform::new(6, 3, false);
        let coefs = sfa.coefficients(&window).unwrap();
        assert!((coefs[0] - 21.0).abs() < 1e-9, "DC should be the sum, got {}", coefs[0]);
    }

    #[test]
    fn test_word_at_matches_explicit_window() {
        let series: Vec<f64> = (0..40).map(|i| (i as f64 * 0.3).cos() + 0.05 * i as f64).collect();
        let bp = breakpoints(2);
        let mut sfa = SfaTransform::new(5, 2, true);
        let explicit: Vec<f64> = (0..5).map(|i| series[3 + i * 3]).collect();
        let a = sfa.word_at(&series, 3, 3, &bp);
        let b = sfa.discretize(&explicit, &bp);
        assert_eq!(a, b);
    }

    #[test]
    fn test_symbols_within_alphabet() {
        let bp = breakpoints(4);
        let mut sfa = SfaTransform::new(10, 4, false);
        for shift in 0..20 {
            let window: Vec<f64> = (0..10).map(|i| ((i + shift) as f64 * 0.77).sin() * 4.0).collect();
            let w = sfa.discretize(&window, &bp);
            assert!(w.symbols(4, 2).iter().all(|&s| s < 4));
        }
    }
}
