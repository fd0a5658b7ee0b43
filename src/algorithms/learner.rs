use crate::algorithms::common::{max_stream_len, window_count};
use crate::algorithms::sampler::Configuration;
use crate::algorithms::sfa::SfaTransform;
use crate::binning::equi_depth::EquiDepth;
use crate::binning::equi_width::EquiWidth;
use crate::binning::information_gain::InformationGain;
use crate::core::binning_strategy::BinningStrategy;
use crate::core::breakpoints::Breakpoints;
use crate::core::config::BinningMethod;

/// Settings of the breakpoint learner that are shared by all configurations.
#[derive(Debug, Clone, Copy)]
pub struct LearnerSettings {
    /// Choose the `word_length` highest-variance positions among the first `2 * word_length`.
    pub variance_selection: bool,
    /// Upper bound on the number of training windows inspected.
    pub max_windows: usize,
}

/// Coefficient rows gathered from the training windows of one configuration.
struct CoefficientSample {
    width: usize,
    values: Vec<f64>,
    labels: Vec<usize>,
}

impl CoefficientSample {
    fn n_rows(&self) -> usize {
        self.labels.len()
    }

    fn column(&self, pos: usize, supervised: bool) -> Vec<(f64, usize)> {
        let mut col: Vec<(f64, usize)> = self
            .values
            .chunks_exact(self.width)
            .zip(&self.labels)
            .map(|(row, &label)| (row[pos], if supervised { label } else { 0 }))
            .collect();
        col.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        col
    }
}

/// Learn the breakpoints of `cfg` from the training corpus.
///
/// `series` must already be in the configuration's representation (raw or
/// first differences). When the corpus holds more than `max_windows` windows,
/// every `ceil(total / max_windows)`-th window in scan order is used.
/// Zero-variance windows are skipped; if every window is degenerate the cuts
/// collapse to zero and all words become the sentinel or symbol zero.
///
/// # Arguments
/// * `series` - Training series in the configuration's representation
/// * `class_index` - Class index (`0..n_classes`) of each series
/// * `n_classes` - Number of distinct classes
/// * `cfg` - The configuration the breakpoints belong to
/// * `settings` - Learner settings
pub fn learn_breakpoints<S: AsRef<[f64]>>(
    series: &[S],
    class_index: &[usize],
    n_classes: usize,
    cfg: &Configuration,
    settings: LearnerSettings,
) -> Breakpoints {
    match cfg.binning {
        BinningMethod::EquiDepth => {
            learn_with::<EquiDepth, S>(series, class_index, n_classes, cfg, settings)
        }
        BinningMethod::EquiWidth => {
            learn_with::<EquiWidth, S>(series, class_index, n_classes, cfg, settings)
        }
        BinningMethod::InformationGain => {
            learn_with::<InformationGain, S>(series, class_index, n_classes, cfg, settings)
        }
    }
}

fn learn_with<B: BinningStrategy, S: AsRef<[f64]>>(
    series: &[S],
    class_index: &[usize],
    n_classes: usize,
    cfg: &Configuration,
    settings: LearnerSettings,
) -> Breakpoints {
    let word_length = cfg.word_length;
    let width = if settings.variance_selection {
        (2 * word_length).min(max_stream_len(cfg.window_length, cfg.normalize))
    } else {
        word_length
    };

    let sample = collect_coefficients(series, class_index, cfg, width, settings.max_windows);
    if sample.n_rows() == 0 {
        return Breakpoints::new(
            cfg.alphabet_size,
            (0..word_length).collect(),
            vec![vec![0.0; cfg.alphabet_size - 1]; word_length],
        );
    }

    let support = if settings.variance_selection {
        highest_variance_positions(&sample, word_length)
    } else {
        (0..word_length).collect()
    };

    let cuts = support
        .iter()
        .map(|&pos| {
            let column = sample.column(pos, B::is_supervised());
            B::cuts(&column, cfg.alphabet_size, n_classes)
        })
        .collect();

    Breakpoints::new(cfg.alphabet_size, support, cuts)
}

fn collect_coefficients<S: AsRef<[f64]>>(
    series: &[S],
    class_index: &[usize],
    cfg: &Configuration,
    width: usize,
    max_windows: usize,
) -> CoefficientSample {
    let total: usize = series
        .iter()
        .map(|s| window_count(s.as_ref().len(), cfg.window_length, cfg.dilation))
        .sum();
    let step = total.div_ceil(max_windows.max(1)).max(1);

    let mut sfa = SfaTransform::new(cfg.window_length, width, cfg.normalize);
    let mut values = Vec::with_capacity((total / step + 1) * width);
    let mut labels = Vec::with_capacity(total / step + 1);
    let mut counter = 0usize;

    for (s, &label) in series.iter().zip(class_index) {
        let s = s.as_ref();
        for start in 0..window_count(s.len(), cfg.window_length, cfg.dilation) {
            let take = counter % step == 0;
            counter += 1;
            if !take {
                continue;
            }
            if let Some(coefs) = sfa.coefficients_at(s, start, cfg.dilation) {
                values.extend_from_slice(coefs);
                labels.push(label);
            }
        }
    }

    CoefficientSample {
        width,
        values,
        labels,
    }
}

/// The `k` stream positions with the largest variance, in ascending position order.
fn highest_variance_positions(sample: &CoefficientSample, k: usize) -> Vec<usize> {
    let n = sample.n_rows() as f64;
    let mut mean = vec![0.0; sample.width];
    for row in sample.values.chunks_exact(sample.width) {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);

    let mut var = vec![0.0; sample.width];
    for row in sample.values.chunks_exact(sample.width) {
        for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
            *acc += (v - m) * (v - m);
        }
    }

    let mut order: Vec<usize> = (0..sample.width).collect();
    order.sort_by(|&a, &b| var[b].total_cmp(&var[a]).then(a.cmp(&b)));
    let mut support: Vec<usize> = order.into_iter().take(k).collect();
    support.sort_unstable();
    support
}
