use serde::{Deserialize, Serialize};

use crate::core::word::{bits_per_symbol, Word};

/// Learned quantization boundaries for one configuration.
///
/// `support[i]` is the position in the Fourier coefficient stream that feeds
/// symbol `i` of the word, and `cuts[i]` holds its `alphabet_size - 1`
/// non-decreasing cut points. A value equal to a cut point falls into the
/// lower bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoints {
    pub alphabet_size: usize,
    pub support: Vec<usize>,
    pub cuts: Vec<Vec<f64>>,
}

impl Breakpoints {
    pub fn new(alphabet_size: usize, support: Vec<usize>, cuts: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(support.len(), cuts.len());
        debug_assert!(cuts.iter().all(|c| c.len() + 1 == alphabet_size));
        debug_assert!(cuts
            .iter()
            .all(|c| c.windows(2).all(|w| w[0] <= w[1])));
        Self {
            alphabet_size,
            support,
            cuts,
        }
    }

    /// Number of symbols per word.
    pub fn word_length(&self) -> usize {
        self.support.len()
    }

    /// Number of leading coefficients that must be computed to cover the support.
    pub fn coefficients_needed(&self) -> usize {
        self.support.iter().max().map_or(0, |&m| m + 1)
    }

    /// Symbol for `value` at word position `pos`: the number of cuts strictly below it.
    #[inline]
    pub fn symbol(&self, pos: usize, value: f64) -> u8 {
        self.cuts[pos].partition_point(|&c| c < value) as u8
    }

    /// Quantize a coefficient stream into a packed word.
    ///
    /// `coefficients` is indexed by stream position and must cover the support.
    pub fn quantize(&self, coefficients: &[f64]) -> Word {
        let bits = bits_per_symbol(self.alphabet_size);
        let mut packed = 0u64;
        for (pos, &coef_idx) in self.support.iter().enumerate() {
            let s = self.symbol(pos, coefficients[coef_idx]);
            packed = (packed << bits) | s as u64;
        }
        Word(packed)
    }
}
