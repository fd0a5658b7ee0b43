use serde::{Deserialize, Serialize};

use crate::core::error::{Result, WeaselError};
use crate::core::word::{bits_per_symbol, MAX_WORD_BITS};

/// Smallest window that leaves room for at least one quantized coefficient.
pub const MIN_WINDOW_LENGTH: usize = 3;

/// Largest supported alphabet (4 bits per symbol).
pub const MAX_ALPHABET_SIZE: usize = 16;

/// How breakpoints are placed for each Fourier coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinningMethod {
    /// Equal number of training observations per bin.
    EquiDepth,
    /// Equal-width bins between the observed minimum and maximum.
    EquiWidth,
    /// Class-aware splits maximizing information gain.
    InformationGain,
}

/// Strategy for shrinking the global vocabulary after the training pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureSelection {
    /// Keep the `max_feature_count` words with the highest chi-squared score.
    Chi2TopK,
    /// Keep words whose chi-squared score exceeds the threshold, capped at `max_feature_count`.
    Chi2Threshold(f64),
    /// Keep a seeded uniform sample of `max_feature_count` words.
    Random,
    /// Keep every observed word; `max_feature_count` is ignored.
    None,
}

/// Values written into the sparse feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureScaling {
    /// Raw word counts.
    Counts,
    /// Counts divided by the number of windows of the configuration.
    TermFrequency,
}

/// Configuration for the random dilated dictionary ensemble.
///
/// Every `*_options` / plural list is a pool that each ensemble member draws
/// from uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaselConfig {
    /// Number of independently sampled ensemble members.
    pub ensemble_size: usize,
    pub min_window: usize,
    /// Upper window bound; clamped to the series length at fit time.
    pub max_window: usize,
    /// Word lengths (Fourier depth) to draw from. Clamped to `window - 2`.
    pub word_lengths: Vec<usize>,
    pub alphabet_sizes: Vec<usize>,
    /// Whether windows are z-normalized before the transform.
    pub norm_options: Vec<bool>,
    /// Representations computed for every member: raw (`false`) and/or first differences (`true`).
    pub use_first_differences: Vec<bool>,
    pub binning_strategies: Vec<BinningMethod>,
    /// Quantize the highest-variance coefficients among the first `2 * word_length`
    /// instead of the lowest-frequency ones.
    pub variance_selection: bool,
    /// Numerosity reduction: count a run of identical consecutive words once.
    pub remove_repeat_words: bool,
    pub feature_selection: FeatureSelection,
    /// Cap on the number of retained words across the whole ensemble.
    pub max_feature_count: usize,
    pub feature_scaling: FeatureScaling,
    /// Upper bound on the number of windows used to learn breakpoints per configuration.
    pub max_learning_windows: usize,
    /// Ridge regularization strengths evaluated by leave-one-out.
    pub ridge_alphas: Vec<f64>,
    /// Worker threads for fit and predict.
    pub parallelism: usize,
    /// Global seed. `None` draws one at fit time and records it in the model.
    pub random_state: Option<u64>,
}

impl Default for WeaselConfig {
    fn default() -> Self {
        Self {
            ensemble_size: 150,
            min_window: 4,
            max_window: 84,
            word_lengths: vec![7, 8],
            alphabet_sizes: vec![2],
            norm_options: vec![false],
            use_first_differences: vec![true, false],
            binning_strategies: vec![BinningMethod::EquiDepth, BinningMethod::EquiWidth],
            variance_selection: true,
            remove_repeat_words: false,
            feature_selection: FeatureSelection::Chi2TopK,
            max_feature_count: 30_000,
            feature_scaling: FeatureScaling::Counts,
            max_learning_windows: 100_000,
            ridge_alphas: logspace(-1.0, 5.0, 10),
            parallelism: 4,
            random_state: None,
        }
    }
}

impl WeaselConfig {
    pub fn new(ensemble_size: usize) -> Self {
        Self {
            ensemble_size,
            ..Default::default()
        }
    }

    /// Pick window bound and ensemble size from the training set shape.
    ///
    /// Small training sets get short windows and few members to avoid
    /// overfitting on too many features; longer series get wider windows.
    pub fn auto(n_instances: usize, series_length: usize) -> Self {
        let (max_window, ensemble_size) = if n_instances < 250 {
            (24, 50)
        } else if series_length < 100 {
            (44, 100)
        } else {
            (84, 150)
        };
        Self {
            ensemble_size,
            max_window: max_window.min(series_length),
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_window_range(mut self, min_window: usize, max_window: usize) -> Self {
        self.min_window = min_window;
        self.max_window = max_window;
        self
    }

    #[must_use]
    pub fn with_word_lengths(mut self, word_lengths: Vec<usize>) -> Self {
        self.word_lengths = word_lengths;
        self
    }

    #[must_use]
    pub fn with_alphabet_sizes(mut self, alphabet_sizes: Vec<usize>) -> Self {
        self.alphabet_sizes = alphabet_sizes;
        self
    }

    #[must_use]
    pub fn with_norm_options(mut self, norm_options: Vec<bool>) -> Self {
        self.norm_options = norm_options;
        self
    }

    #[must_use]
    pub fn with_first_differences(mut self, options: Vec<bool>) -> Self {
        self.use_first_differences = options;
        self
    }

    #[must_use]
    pub fn with_binning_strategies(mut self, strategies: Vec<BinningMethod>) -> Self {
        self.binning_strategies = strategies;
        self
    }

    #[must_use]
    pub fn with_variance_selection(mut self, enabled: bool) -> Self {
        self.variance_selection = enabled;
        self
    }

    #[must_use]
    pub fn with_remove_repeat_words(mut self, enabled: bool) -> Self {
        self.remove_repeat_words = enabled;
        self
    }

    #[must_use]
    pub fn with_feature_selection(mut self, selection: FeatureSelection) -> Self {
        self.feature_selection = selection;
        self
    }

    #[must_use]
    pub fn with_max_feature_count(mut self, max_feature_count: usize) -> Self {
        self.max_feature_count = max_feature_count;
        self
    }

    #[must_use]
    pub fn with_feature_scaling(mut self, scaling: FeatureScaling) -> Self {
        self.feature_scaling = scaling;
        self
    }

    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Check internal consistency. Series-dependent checks happen at fit time.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(WeaselError::Configuration(msg));
        if self.ensemble_size == 0 {
            return fail("ensemble_size must be > 0".into());
        }
        if self.min_window < MIN_WINDOW_LENGTH {
            return fail(format!(
                "min_window must be >= {MIN_WINDOW_LENGTH}, got {}",
                self.min_window
            ));
        }
        if self.min_window > self.max_window {
            return fail(format!(
                "min_window ({}) is bigger than max_window ({})",
                self.min_window, self.max_window
            ));
        }
        if self.word_lengths.is_empty() || self.word_lengths.contains(&0) {
            return fail("word_lengths must be non-empty and positive".into());
        }
        if self.alphabet_sizes.is_empty()
            || self
                .alphabet_sizes
                .iter()
                .any(|&a| !(2..=MAX_ALPHABET_SIZE).contains(&a))
        {
            return fail(format!(
                "alphabet_sizes must be non-empty and within 2..={MAX_ALPHABET_SIZE}"
            ));
        }
        let widest_bits = self
            .alphabet_sizes
            .iter()
            .map(|&a| bits_per_symbol(a))
            .max()
            .unwrap_or(1);
        let longest = self.word_lengths.iter().copied().max().unwrap_or(0);
        if longest as u32 * widest_bits > MAX_WORD_BITS {
            return fail(format!(
                "word_length {longest} with {widest_bits}-bit symbols exceeds {MAX_WORD_BITS} bits"
            ));
        }
        if self.norm_options.is_empty() {
            return fail("norm_options must be non-empty".into());
        }
        if self.use_first_differences.is_empty() {
            return fail("use_first_differences must be non-empty".into());
        }
        if self.binning_strategies.is_empty() {
            return fail("binning_strategies must be non-empty".into());
        }
        if self.feature_selection != FeatureSelection::None && self.max_feature_count == 0 {
            return fail("max_feature_count must be > 0".into());
        }
        if self.max_learning_windows == 0 {
            return fail("max_learning_windows must be > 0".into());
        }
        if self.ridge_alphas.is_empty() || self.ridge_alphas.iter().any(|&a| !(a > 0.0)) {
            return fail("ridge_alphas must be non-empty and positive".into());
        }
        if self.parallelism == 0 {
            return fail("parallelism must be > 0".into());
        }
        Ok(())
    }
}

/// `n` values evenly spaced on a log10 scale between `10^start` and `10^stop`.
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![10f64.powf(start)],
        _ => (0..n)
            .map(|i| 10f64.powf(start + (stop - start) * i as f64 / (n - 1) as f64))
            .collect(),
    }
}
