pub mod algorithms;
pub mod binning;
pub mod core;

use std::sync::atomic::AtomicBool;

pub use crate::algorithms::ensemble::{
    fit_model, FitSummary, FittedModel, Stage, TrainedConfiguration,
};
pub use crate::algorithms::ridge::RidgeClassifierCv;
pub use crate::algorithms::sampler::Configuration;
pub use crate::algorithms::sfa::{discretize, SfaTransform};
pub use crate::algorithms::vocabulary::{FeatureKey, GlobalVocabulary};
pub use crate::binning::equi_depth::EquiDepth;
pub use crate::binning::equi_width::EquiWidth;
pub use crate::binning::information_gain::InformationGain;
pub use crate::core::binning_strategy::BinningStrategy;
pub use crate::core::breakpoints::Breakpoints;
pub use crate::core::config::{BinningMethod, FeatureScaling, FeatureSelection, WeaselConfig};
pub use crate::core::error::{Result, WeaselError};
pub use crate::core::linear_model::LinearClassifier;
pub use crate::core::sparse::SparseMatrix;
pub use crate::core::word::{Word, WordHistogram};

/// Random dilated dictionary classifier.
///
/// Holds the configuration and, after a successful [`fit`](Weasel::fit), the
/// frozen model. A failed fit leaves the classifier unfit.
///
/// # Examples
///
/// ```
/// use weasel_rs::{Weasel, WeaselConfig};
///
/// let series: Vec<Vec<f64>> = (0..12)
///     .map(|i| {
///         let freq = if i % 2 == 0 { 0.2 } else { 1.0 };
///         (0..40).map(|t| (t as f64 * freq + i as f64).sin()).collect()
///     })
///     .collect();
/// let labels: Vec<usize> = (0..12).map(|i| i % 2).collect();
///
/// let mut clf = Weasel::new(WeaselConfig::new(4).with_random_state(1));
/// clf.fit(&series, &labels).unwrap();
/// assert_eq!(clf.predict(&series).unwrap().len(), 12);
/// assert!(clf.feature_count().unwrap() > 0);
/// ```
pub struct Weasel {
    config: WeaselConfig,
    stage: Stage,
    model: Option<FittedModel>,
}

impl Weasel {
    /// Create an unfit classifier with the given settings.
    pub fn new(config: WeaselConfig) -> Self {
        Self {
            config,
            stage: Stage::Unfit,
            model: None,
        }
    }

    /// Wrap a previously fitted (e.g. loaded) model.
    pub fn from_model(model: FittedModel) -> Self {
        Self {
            config: model.config().clone(),
            stage: Stage::Fit,
            model: Some(model),
        }
    }

    /// Fit on `series` with one label per series, replacing any previous model.
    pub fn fit<S: AsRef<[f64]> + Sync>(&mut self, series: &[S], labels: &[usize]) -> Result<&FittedModel> {
        self.fit_inner(series, labels, None)
    }

    /// Like [`fit`](Weasel::fit), aborting with [`WeaselError::Cancelled`]
    /// once `cancel` is set.
    pub fn fit_cancellable<S: AsRef<[f64]> + Sync>(
        &mut self,
        series: &[S],
        labels: &[usize],
        cancel: &AtomicBool,
    ) -> Result<&FittedModel> {
        self.fit_inner(series, labels, Some(cancel))
    }

    fn fit_inner<S: AsRef<[f64]> + Sync>(
        &mut self,
        series: &[S],
        labels: &[usize],
        cancel: Option<&AtomicBool>,
    ) -> Result<&FittedModel> {
        self.model = None;
        let stage = &mut self.stage;
        match fit_model(series, labels, &self.config, cancel, |s| *stage = s) {
            Ok(model) => Ok(self.model.insert(model)),
            Err(e) => {
                self.stage = Stage::Unfit;
                Err(e)
            }
        }
    }

    /// Predicted label per series. Fails with [`WeaselError::NotFitted`] before a fit.
    pub fn predict<S: AsRef<[f64]> + Sync>(&self, series: &[S]) -> Result<Vec<usize>> {
        self.fitted()?.predict(series)
    }

    /// Class probabilities per series, columns ordered like [`FittedModel::classes`].
    pub fn predict_proba<S: AsRef<[f64]> + Sync>(&self, series: &[S]) -> Result<Vec<Vec<f64>>> {
        self.fitted()?.predict_proba(series)
    }

    /// Size of the frozen vocabulary.
    pub fn feature_count(&self) -> Result<usize> {
        Ok(self.fitted()?.feature_count())
    }

    /// [`Stage::Unfit`] or [`Stage::Fit`] between calls; the fitting stages
    /// are only visible while `fit` runs.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The frozen model, if the last fit succeeded.
    pub fn model(&self) -> Option<&FittedModel> {
        self.model.as_ref()
    }

    pub fn config(&self) -> &WeaselConfig {
        &self.config
    }

    fn fitted(&self) -> Result<&FittedModel> {
        self.model.as_ref().ok_or(WeaselError::NotFitted)
    }
}

/// Fit with default settings, the given ensemble size and worker count.
///
/// `random_state = None` draws a seed; it is recorded in
/// [`FitSummary::seed`].
pub fn fit<S: AsRef<[f64]> + Sync>(
    series: &[S],
    labels: &[usize],
    random_state: Option<u64>,
    ensemble_size: usize,
    parallelism: usize,
) -> Result<FittedModel> {
    let mut config = WeaselConfig::new(ensemble_size).with_parallelism(parallelism);
    config.random_state = random_state;
    fit_model(series, labels, &config, None, |_| {})
}
