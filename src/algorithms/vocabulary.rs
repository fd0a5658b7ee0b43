use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::algorithms::chi2::chi2_score;
use crate::core::config::{FeatureScaling, FeatureSelection};
use crate::core::error::{Result, WeaselError};
use crate::core::word::{Word, WordHistogram};

/// ChaCha stream reserved for random feature selection; member streams use
/// `0..ensemble_size`.
const SELECTION_STREAM: u64 = u64::MAX;

/// A word of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureKey {
    pub config: usize,
    pub word: Word,
}

impl FeatureKey {
    pub fn new(config: usize, word: Word) -> Self {
        Self { config, word }
    }
}

/// Class-summed counts of every candidate key seen during training.
pub type CandidateCounts = HashMap<FeatureKey, Vec<f64>>;

/// Frozen mapping from `(configuration id, word)` to a feature index.
///
/// Indices follow the sorted key order, so they depend only on the retained
/// keys and never on the order in which workers finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VocabularyRepr", into = "VocabularyRepr")]
pub struct GlobalVocabulary {
    n_configs: usize,
    keys: Vec<FeatureKey>,
    index: HashMap<FeatureKey, usize>,
}

#[derive(Serialize, Deserialize)]
struct VocabularyRepr {
    n_configs: usize,
    keys: Vec<FeatureKey>,
}

impl From<VocabularyRepr> for GlobalVocabulary {
    fn from(repr: VocabularyRepr) -> Self {
        Self::from_keys(repr.keys, repr.n_configs)
    }
}

impl From<GlobalVocabulary> for VocabularyRepr {
    fn from(vocab: GlobalVocabulary) -> Self {
        Self {
            n_configs: vocab.n_configs,
            keys: vocab.keys,
        }
    }
}

impl GlobalVocabulary {
    /// Freeze a set of keys; duplicates are removed.
    pub fn from_keys(mut keys: Vec<FeatureKey>, n_configs: usize) -> Self {
        keys.sort_unstable();
        keys.dedup();
        let index = keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();
        Self {
            n_configs,
            keys,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of configurations the keys were drawn from.
    pub fn n_configs(&self) -> usize {
        self.n_configs
    }

    pub fn keys(&self) -> &[FeatureKey] {
        &self.keys
    }

    pub fn index_of(&self, config: usize, word: Word) -> Option<usize> {
        self.index.get(&FeatureKey::new(config, word)).copied()
    }

    /// Retained words per configuration id.
    pub fn words_per_configuration(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_configs];
        for k in &self.keys {
            counts[k.config] += 1;
        }
        counts
    }

    /// Append the features of configuration `config` for one series to `row`.
    ///
    /// Words outside the vocabulary contribute nothing.
    pub fn project_into(
        &self,
        config: usize,
        histogram: &WordHistogram,
        n_windows: usize,
        scaling: FeatureScaling,
        row: &mut Vec<(usize, f64)>,
    ) {
        let scale = match scaling {
            FeatureScaling::Counts => 1.0,
            FeatureScaling::TermFrequency => 1.0 / n_windows.max(1) as f64,
        };
        for (&word, &count) in histogram {
            if let Some(idx) = self.index_of(config, word) {
                row.push((idx, count as f64 * scale));
            }
        }
    }

    /// Sparse feature row of one series, sorted by feature index.
    ///
    /// `histograms[c]` and `windows[c]` belong to configuration id `c`.
    pub fn project(
        &self,
        histograms: &[WordHistogram],
        windows: &[usize],
        scaling: FeatureScaling,
    ) -> Vec<(usize, f64)> {
        debug_assert_eq!(histograms.len(), windows.len());
        let mut row = Vec::new();
        for (config, (hist, &n_windows)) in histograms.iter().zip(windows).enumerate() {
            self.project_into(config, hist, n_windows, scaling, &mut row);
        }
        row.sort_unstable_by_key(|&(i, _)| i);
        row
    }
}

/// Settings of the selection pass.
#[derive(Debug, Clone, Copy)]
pub struct SelectionSettings {
    pub strategy: FeatureSelection,
    pub max_features: usize,
    pub seed: u64,
}

/// Score and retain candidate keys, then freeze the vocabulary.
///
/// Ties in score resolve by key order. Returns
/// [`WeaselError::EmptyVocabulary`] when nothing is retained.
///
/// # Arguments
/// * `candidates` - Class-summed counts of every observed key
/// * `class_fraction` - Share of training series per class
/// * `n_configs` - Number of configurations in the ensemble
/// * `settings` - Strategy, cap and seed
pub fn select_features(
    candidates: &CandidateCounts,
    class_fraction: &[f64],
    n_configs: usize,
    settings: SelectionSettings,
) -> Result<GlobalVocabulary> {
    let cap = settings.max_features;
    let retained: Vec<FeatureKey> = match settings.strategy {
        FeatureSelection::None => candidates.keys().copied().collect(),
        FeatureSelection::Chi2TopK => ranked(candidates, class_fraction)
            .into_iter()
            .take(cap)
            .map(|(k, _)| k)
            .collect(),
        FeatureSelection::Chi2Threshold(min_score) => ranked(candidates, class_fraction)
            .into_iter()
            .filter(|&(_, s)| s > min_score)
            .take(cap)
            .map(|(k, _)| k)
            .collect(),
        FeatureSelection::Random => {
            let mut keys: Vec<FeatureKey> = candidates.keys().copied().collect();
            keys.sort_unstable();
            let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
            rng.set_stream(SELECTION_STREAM);
            keys.shuffle(&mut rng);
            keys.truncate(cap);
            keys
        }
    };

    if retained.is_empty() {
        return Err(WeaselError::EmptyVocabulary {
            candidates: candidates.len(),
        });
    }
    Ok(GlobalVocabulary::from_keys(retained, n_configs))
}

/// Keys with their chi-squared scores, best first; equal scores by key order.
fn ranked(candidates: &CandidateCounts, class_fraction: &[f64]) -> Vec<(FeatureKey, f64)> {
    let mut scored: Vec<(FeatureKey, f64)> = candidates
        .iter()
        .map(|(&k, observed)| (k, chi2_score(observed, class_fraction)))
        .collect();
    scored.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
}
