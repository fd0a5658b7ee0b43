use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "parallel")]
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::algorithms::chi2::class_fractions;
use crate::algorithms::common::{first_differences, max_stream_len};
use crate::algorithms::histogram::{build_histogram, HistogramStats};
use crate::algorithms::learner::{learn_breakpoints, LearnerSettings};
use crate::algorithms::ridge::RidgeClassifierCv;
use crate::algorithms::sampler::{sample_configurations, Configuration};
use crate::algorithms::sfa::SfaTransform;
use crate::algorithms::vocabulary::{
    select_features, CandidateCounts, FeatureKey, GlobalVocabulary, SelectionSettings,
};
use crate::core::breakpoints::Breakpoints;
use crate::core::config::{WeaselConfig, MAX_ALPHABET_SIZE};
use crate::core::error::{Result, WeaselError};
use crate::core::linear_model::LinearClassifier;
use crate::core::sparse::SparseMatrix;
use crate::core::word::{bits_per_symbol, WordHistogram, MAX_WORD_BITS};

/// Lifecycle of the ensemble driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Unfit,
    /// Drawing one configuration set per ensemble member.
    Sampling,
    /// Learning breakpoints and building training histograms per configuration.
    Learning,
    /// Scoring candidate words and freezing the vocabulary.
    Selecting,
    Fit,
    /// Transforming and scoring new series with the frozen model.
    ///
    /// Only used to label log events. Prediction does not change any state,
    /// so a fitted classifier reports [`Stage::Fit`] while it predicts.
    Predicting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unfit => "unfit",
            Stage::Sampling => "sampling",
            Stage::Learning => "learning",
            Stage::Selecting => "selecting",
            Stage::Fit => "fit",
            Stage::Predicting => "predicting",
        };
        f.write_str(name)
    }
}

/// A sampled configuration together with the breakpoints learned for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedConfiguration {
    pub configuration: Configuration,
    pub breakpoints: Breakpoints,
}

/// Counters collected while fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    /// Global seed the configurations were drawn from.
    pub seed: u64,
    pub configurations: usize,
    /// Distinct `(configuration, word)` keys seen in training.
    pub candidate_words: usize,
    /// Keys kept by feature selection (the feature count).
    pub retained_words: usize,
    pub windows: usize,
    pub degenerate_windows: usize,
    /// Ridge penalty chosen by leave-one-out.
    pub alpha: f64,
    pub loo_mse: f64,
}

/// Everything needed to transform and classify new series without refitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel<C = RidgeClassifierCv> {
    config: WeaselConfig,
    series_length: usize,
    classes: Vec<usize>,
    configurations: Vec<TrainedConfiguration>,
    vocabulary: GlobalVocabulary,
    classifier: C,
    summary: FitSummary,
    #[serde(skip)]
    workers: WorkerPool,
}

/// Training series shared read-only by all workers.
struct Corpus<'a> {
    raw: Vec<&'a [f64]>,
    differences: Vec<Vec<f64>>,
}

impl<'a> Corpus<'a> {
    fn new<S: AsRef<[f64]>>(series: &'a [S], need_differences: bool) -> Self {
        let raw: Vec<&[f64]> = series.iter().map(AsRef::as_ref).collect();
        let differences = if need_differences {
            raw.iter().map(|s| first_differences(s)).collect()
        } else {
            Vec::new()
        };
        Self { raw, differences }
    }

    /// All series in the representation `cfg` reads.
    fn view(&self, cfg: &Configuration) -> Vec<&[f64]> {
        if cfg.first_difference {
            self.differences.iter().map(Vec::as_slice).collect()
        } else {
            self.raw.clone()
        }
    }
}

/// Per-configuration output of the learning stage.
struct LearnedConfiguration {
    breakpoints: Breakpoints,
    histograms: Vec<WordHistogram>,
    windows: Vec<usize>,
    stats: HistogramStats,
}

/// Thread pool built on first use and reused by later calls.
#[derive(Debug, Clone, Default)]
struct WorkerPool {
    #[cfg(feature = "parallel")]
    pool: OnceLock<Arc<rayon::ThreadPool>>,
}

impl WorkerPool {
    /// Run `task(i)` for `i in 0..n` on `parallelism` threads.
    ///
    /// Results come back in index order regardless of completion order. When
    /// several tasks fail, which of their errors is returned is unspecified.
    #[cfg(feature = "parallel")]
    fn run<T, F>(&self, parallelism: usize, n: usize, task: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send,
    {
        use rayon::prelude::*;

        if parallelism <= 1 {
            return (0..n).map(task).collect();
        }
        let pool = match self.pool.get() {
            Some(pool) => pool,
            None => {
                let built = rayon::ThreadPoolBuilder::new()
                    .num_threads(parallelism)
                    .build()
                    .map_err(|e| WeaselError::ThreadPool(e.to_string()))?;
                self.pool.get_or_init(|| Arc::new(built))
            }
        };
        pool.install(|| (0..n).into_par_iter().map(&task).collect())
    }

    #[cfg(not(feature = "parallel"))]
    fn run<T, F>(&self, _parallelism: usize, n: usize, task: F) -> Result<Vec<T>>
    where
        F: Fn(usize) -> Result<T>,
    {
        (0..n).map(task).collect()
    }
}

fn check_cancelled(cancel: Option<&AtomicBool>) -> Result<()> {
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(WeaselError::Cancelled),
        _ => Ok(()),
    }
}

/// Common length of `series`, or the index of the first series that differs.
///
/// An empty batch is only accepted when the length is already known.
fn validate_series<S: AsRef<[f64]>>(series: &[S], expected: Option<usize>) -> Result<usize> {
    let Some(first) = series.first() else {
        return expected.ok_or_else(|| WeaselError::InvalidInput("empty series batch".into()));
    };
    let length = expected.unwrap_or(first.as_ref().len());
    for (index, s) in series.iter().enumerate() {
        let s = s.as_ref();
        if s.len() != length {
            return Err(WeaselError::LengthMismatch {
                index,
                expected: length,
                found: s.len(),
            });
        }
        if let Some(t) = s.iter().position(|x| !x.is_finite()) {
            return Err(WeaselError::InvalidInput(format!(
                "series {index} has a non-finite value at position {t}"
            )));
        }
    }
    Ok(length)
}

/// Fit the ensemble and the ridge classifier.
///
/// `on_stage` is called on every stage transition. Nothing is returned until
/// every configuration has finished; a set `cancel` flag aborts with
/// [`WeaselError::Cancelled`].
///
/// # Arguments
/// * `series` - Training series, all of the same length
/// * `labels` - One class label per series; at least two distinct labels
/// * `config` - Ensemble settings
/// * `cancel` - Optional cancellation flag checked per configuration
/// * `on_stage` - Stage observer
pub fn fit_model<S, F>(
    series: &[S],
    labels: &[usize],
    config: &WeaselConfig,
    cancel: Option<&AtomicBool>,
    mut on_stage: F,
) -> Result<FittedModel>
where
    S: AsRef<[f64]> + Sync,
    F: FnMut(Stage),
{
    config.validate()?;
    let series_length = validate_series(series, None)?;
    if labels.len() != series.len() {
        return Err(WeaselError::InvalidInput(format!(
            "{} series but {} labels",
            series.len(),
            labels.len()
        )));
    }
    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    if classes.len() < 2 {
        return Err(WeaselError::InvalidInput(
            "training labels must contain at least two classes".into(),
        ));
    }
    let class_index: Vec<usize> = labels
        .iter()
        .map(|l| classes.binary_search(l).unwrap_or_default())
        .collect();
    let n_classes = classes.len();
    let seed = config.random_state.unwrap_or_else(rand::random);

    on_stage(Stage::Sampling);
    info!(
        stage = %Stage::Sampling,
        seed,
        ensemble_size = config.ensemble_size,
        series = series.len(),
        series_length,
        "fitting ensemble"
    );
    let configurations = sample_configurations(config, seed, series_length)?;

    on_stage(Stage::Learning);
    info!(stage = %Stage::Learning, configurations = configurations.len(), "learning dictionaries");
    let corpus = Corpus::new(series, configurations.iter().any(|c| c.first_difference));
    let settings = LearnerSettings {
        variance_selection: config.variance_selection,
        max_windows: config.max_learning_windows,
    };
    let workers = WorkerPool::default();
    let learned = workers.run(config.parallelism, configurations.len(), |i| {
        check_cancelled(cancel)?;
        let cfg = &configurations[i];
        let view = corpus.view(cfg);
        let breakpoints = learn_breakpoints(&view, &class_index, n_classes, cfg, settings);
        let mut sfa = SfaTransform::for_configuration(cfg, &breakpoints);
        let mut stats = HistogramStats::default();
        let mut histograms = Vec::with_capacity(view.len());
        let mut windows = Vec::with_capacity(view.len());
        for s in &view {
            let (hist, s_stats) =
                build_histogram(s, cfg, &breakpoints, &mut sfa, config.remove_repeat_words);
            stats.merge(s_stats);
            windows.push(s_stats.windows);
            histograms.push(hist);
        }
        debug!(
            config = cfg.id,
            window_length = cfg.window_length,
            dilation = cfg.dilation,
            word_length = cfg.word_length,
            alphabet_size = cfg.alphabet_size,
            first_difference = cfg.first_difference,
            binning = ?cfg.binning,
            degenerate = stats.degenerate,
            "configuration learned"
        );
        Ok(LearnedConfiguration {
            breakpoints,
            histograms,
            windows,
            stats,
        })
    })?;
    check_cancelled(cancel)?;

    on_stage(Stage::Selecting);
    let mut candidates = CandidateCounts::new();
    let mut totals = HistogramStats::default();
    for (id, out) in learned.iter().enumerate() {
        totals.merge(out.stats);
        for (hist, &c) in out.histograms.iter().zip(&class_index) {
            for (&word, &count) in hist {
                candidates
                    .entry(FeatureKey::new(id, word))
                    .or_insert_with(|| vec![0.0; n_classes])[c] += f64::from(count);
            }
        }
    }
    let vocabulary = select_features(
        &candidates,
        &class_fractions(&class_index, n_classes),
        configurations.len(),
        SelectionSettings {
            strategy: config.feature_selection,
            max_features: config.max_feature_count,
            seed,
        },
    )?;
    info!(
        stage = %Stage::Selecting,
        candidates = candidates.len(),
        retained = vocabulary.len(),
        degenerate_windows = totals.degenerate,
        "vocabulary frozen"
    );

    let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); series.len()];
    for (id, out) in learned.iter().enumerate() {
        for (i, (hist, &n_windows)) in out.histograms.iter().zip(&out.windows).enumerate() {
            vocabulary.project_into(id, hist, n_windows, config.feature_scaling, &mut rows[i]);
        }
    }
    let x = SparseMatrix::from_rows(rows, vocabulary.len());
    let candidate_words = candidates.len();
    drop(candidates);

    let mut classifier = RidgeClassifierCv::new(config.ridge_alphas.clone());
    classifier.fit(&x, &class_index, n_classes)?;
    check_cancelled(cancel)?;

    let summary = FitSummary {
        seed,
        configurations: configurations.len(),
        candidate_words,
        retained_words: vocabulary.len(),
        windows: totals.windows,
        degenerate_windows: totals.degenerate,
        alpha: classifier.alpha(),
        loo_mse: classifier.loo_mse(),
    };
    let configurations = configurations
        .into_iter()
        .zip(learned)
        .map(|(configuration, out)| TrainedConfiguration {
            configuration,
            breakpoints: out.breakpoints,
        })
        .collect();

    on_stage(Stage::Fit);
    info!(
        stage = %Stage::Fit,
        features = summary.retained_words,
        nnz = x.nnz(),
        alpha = summary.alpha,
        "model fitted"
    );

    Ok(FittedModel {
        config: config.clone(),
        series_length,
        classes,
        configurations,
        vocabulary,
        classifier,
        summary,
        workers,
    })
}

impl<C: LinearClassifier> FittedModel<C> {
    /// Sparse feature matrix of `series` over the frozen vocabulary.
    ///
    /// Re-runs the histogram builder with the frozen breakpoints; words outside
    /// the vocabulary are dropped.
    pub fn transform<S: AsRef<[f64]> + Sync>(&self, series: &[S]) -> Result<SparseMatrix> {
        validate_series(series, Some(self.series_length))?;
        debug!(stage = %Stage::Predicting, series = series.len(), "transforming");
        let corpus = Corpus::new(
            series,
            self.configurations
                .iter()
                .any(|t| t.configuration.first_difference),
        );
        let scaling = self.config.feature_scaling;
        let remove_repeat = self.config.remove_repeat_words;

        let per_config = self
            .workers
            .run(self.config.parallelism, self.configurations.len(), |id| {
                let trained = &self.configurations[id];
                let cfg = &trained.configuration;
                let mut sfa = SfaTransform::for_configuration(cfg, &trained.breakpoints);
                let rows: Vec<Vec<(usize, f64)>> = corpus
                    .view(cfg)
                    .into_iter()
                    .map(|s| {
                        let (hist, stats) =
                            build_histogram(s, cfg, &trained.breakpoints, &mut sfa, remove_repeat);
                        let mut row = Vec::new();
                        self.vocabulary
                            .project_into(id, &hist, stats.windows, scaling, &mut row);
                        row
                    })
                    .collect();
                Ok(rows)
            })?;

        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); series.len()];
        for config_rows in per_config {
            for (row, part) in rows.iter_mut().zip(config_rows) {
                row.extend(part);
            }
        }
        Ok(SparseMatrix::from_rows(rows, self.vocabulary.len()))
    }

    /// Per-class ridge scores, columns ordered like [`classes`](Self::classes).
    pub fn decision_function<S: AsRef<[f64]> + Sync>(&self, series: &[S]) -> Result<Vec<Vec<f64>>> {
        let x = self.transform(series)?;
        self.classifier.decision_function(&x)
    }

    /// Predicted label per series.
    pub fn predict<S: AsRef<[f64]> + Sync>(&self, series: &[S]) -> Result<Vec<usize>> {
        Ok(self
            .decision_function(series)?
            .iter()
            .map(|scores| self.classes[argmax(scores)])
            .collect())
    }

    /// Class probabilities per series (softmax of the decision scores).
    pub fn predict_proba<S: AsRef<[f64]> + Sync>(&self, series: &[S]) -> Result<Vec<Vec<f64>>> {
        Ok(self
            .decision_function(series)?
            .into_iter()
            .map(softmax)
            .collect())
    }
}

impl<C> FittedModel<C> {
    /// Size of the frozen vocabulary.
    pub fn feature_count(&self) -> usize {
        self.vocabulary.len()
    }

    /// Distinct training labels in ascending order.
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Sampled configurations with their breakpoints, in id order.
    pub fn configurations(&self) -> &[TrainedConfiguration] {
        &self.configurations
    }

    pub fn vocabulary(&self) -> &GlobalVocabulary {
        &self.vocabulary
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn config(&self) -> &WeaselConfig {
        &self.config
    }

    /// Length every series passed to `predict` must have.
    pub fn series_length(&self) -> usize {
        self.series_length
    }

    pub fn summary(&self) -> &FitSummary {
        &self.summary
    }

    /// Worker threads used by `transform` and `predict`.
    pub fn set_parallelism(&mut self, parallelism: usize) {
        self.config.parallelism = parallelism.max(1);
        self.workers = WorkerPool::default();
    }
}

impl<C: Serialize> FittedModel<C> {
    /// Serialize the model; the worker pool is not stored.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the model as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl<C: LinearClassifier> FittedModel<C> {
    /// Check that the parts of a deserialized model agree with each other, so
    /// that `transform` and `predict` can index them without panicking.
    fn check_consistency(&self) -> Result<()> {
        let fail = |msg: String| Err(WeaselError::InvalidInput(msg));
        let n_configs = self.configurations.len();
        if n_configs != self.summary.configurations {
            return fail(format!(
                "model lists {n_configs} configurations, summary expects {}",
                self.summary.configurations
            ));
        }
        if self.classes.len() < 2 || self.classes.windows(2).any(|w| w[0] >= w[1]) {
            return fail("classes must be at least two distinct labels in ascending order".into());
        }
        for (i, trained) in self.configurations.iter().enumerate() {
            let cfg = &trained.configuration;
            let bp = &trained.breakpoints;
            if cfg.id != i {
                return fail(format!("configuration {i} carries id {}", cfg.id));
            }
            if cfg.window_length < 2 || !cfg.fits(self.series_length) {
                return fail(format!(
                    "configuration {i}: window {} with dilation {} does not fit series of length {}",
                    cfg.window_length, cfg.dilation, self.series_length
                ));
            }
            if !(2..=MAX_ALPHABET_SIZE).contains(&cfg.alphabet_size)
                || bp.alphabet_size != cfg.alphabet_size
            {
                return fail(format!(
                    "configuration {i}: alphabet size {} with breakpoints for {}",
                    cfg.alphabet_size, bp.alphabet_size
                ));
            }
            if bp.support.len() != cfg.word_length
                || bp.cuts.len() != cfg.word_length
                || cfg.word_length as u32 * bits_per_symbol(cfg.alphabet_size) > MAX_WORD_BITS
            {
                return fail(format!(
                    "configuration {i}: word length {} with {} support positions and {} cut rows",
                    cfg.word_length,
                    bp.support.len(),
                    bp.cuts.len()
                ));
            }
            let stream = max_stream_len(cfg.window_length, cfg.normalize);
            if let Some(&pos) = bp.support.iter().find(|&&p| p >= stream) {
                return fail(format!(
                    "configuration {i}: support position {pos} outside a stream of {stream}"
                ));
            }
            let cuts_ok = bp.cuts.iter().all(|c| {
                c.len() + 1 == cfg.alphabet_size && c.windows(2).all(|w| w[0] <= w[1])
            });
            if !cuts_ok {
                return fail(format!(
                    "configuration {i}: every cut row needs {} non-decreasing values",
                    cfg.alphabet_size - 1
                ));
            }
        }
        if self.vocabulary.n_configs() != n_configs {
            return fail(format!(
                "vocabulary spans {} configurations, model has {n_configs}",
                self.vocabulary.n_configs()
            ));
        }
        if let Some(key) = self.vocabulary.keys().iter().find(|k| k.config >= n_configs) {
            return fail(format!(
                "vocabulary key refers to configuration {}",
                key.config
            ));
        }
        if self.classifier.n_features() != self.vocabulary.len() {
            return fail(format!(
                "classifier expects {} features, vocabulary has {}",
                self.classifier.n_features(),
                self.vocabulary.len()
            ));
        }
        if self.classifier.n_classes() != self.classes.len() {
            return fail(format!(
                "classifier scores {} classes, model has {}",
                self.classifier.n_classes(),
                self.classes.len()
            ));
        }
        Ok(())
    }
}

impl<C: LinearClassifier + DeserializeOwned> FittedModel<C> {
    /// Read a model written by [`to_json`](Self::to_json).
    ///
    /// Fails with [`WeaselError::InvalidInput`] when the parts of the model do
    /// not fit together.
    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(json)?;
        model.config.validate()?;
        model.check_consistency()?;
        Ok(model)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// Index of the largest score; the first one wins on ties.
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    best
}

fn softmax(mut scores: Vec<f64>) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for s in &mut scores {
        *s = (*s - max).exp();
        sum += *s;
    }
    for s in &mut scores {
        *s /= sum;
    }
    scores
}
