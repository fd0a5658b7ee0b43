use tracing::trace;

use crate::algorithms::common::window_count;
use crate::algorithms::sampler::Configuration;
use crate::algorithms::sfa::SfaTransform;
use crate::core::breakpoints::Breakpoints;
use crate::core::word::{Word, WordHistogram};

/// Window accounting for one (series, configuration) histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistogramStats {
    /// Windows scanned, `S - (W - 1) * d`.
    pub windows: usize,
    /// Zero-variance windows mapped to the sentinel word.
    pub degenerate: usize,
}

impl HistogramStats {
    pub fn merge(&mut self, other: HistogramStats) {
        self.windows += other.windows;
        self.degenerate += other.degenerate;
    }
}

/// Count the words of every dilated window of `series`.
///
/// `series` must already be in the configuration's representation. Windows
/// start at every offset (outer step 1) and read every `dilation`-th sample.
/// Without numerosity reduction the counts sum to the number of windows.
/// With `remove_repeat_words`, a run of identical consecutive words counts once.
pub fn build_histogram(
    series: &[f64],
    cfg: &Configuration,
    breakpoints: &Breakpoints,
    sfa: &mut SfaTransform,
    remove_repeat_words: bool,
) -> (WordHistogram, HistogramStats) {
    debug_assert_eq!(sfa.window_length(), cfg.window_length);
    let n_windows = window_count(series.len(), cfg.window_length, cfg.dilation);
    let mut hist = WordHistogram::new();
    let mut stats = HistogramStats {
        windows: n_windows,
        degenerate: 0,
    };

    let mut previous: Option<Word> = None;
    for start in 0..n_windows {
        let word = sfa.word_at(series, start, cfg.dilation, breakpoints);
        if word.is_sentinel() {
            stats.degenerate += 1;
        }
        if remove_repeat_words && previous == Some(word) {
            continue;
        }
        previous = Some(word);
        *hist.entry(word).or_insert(0) += 1;
    }

    if stats.degenerate > 0 {
        trace!(
            config = cfg.id,
            windows = stats.windows,
            degenerate = stats.degenerate,
            "zero-variance windows mapped to sentinel"
        );
    }
    (hist, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BinningMethod;

    fn cfg(window_length: usize, dilation: usize) -> Configuration {
        Configuration {
            id: 3,
            member_index: 1,
            window_length,
            dilation,
            word_length: 2,
            alphabet_size: 4,
            normalize: false,
            first_difference: false,
            binning: BinningMethod::EquiDepth,
        }
    }

    fn bp() -> Breakpoints {
        Breakpoints::new(4, vec![0, 1], vec![vec![-1.0, 0.0, 1.0]; 2])
    }

    #[test]
    fn test_histogram_mass() {
        let series: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin() * 2.0).collect();
        for (w, d) in [(4, 1), (5, 3), (6, 7)] {
            let c = cfg(w, d);
            let mut sfa = SfaTransform::new(w, 2, false);
            let (hist, stats) = build_histogram(&series, &c, &bp(), &mut sfa, false);
            let total: u32 = hist.values().sum();
            assert_eq!(total as usize, 50 - (w - 1) * d);
            assert_eq!(stats.windows, 50 - (w - 1) * d);
        }
    }

    #[test]
    fn test_constant_series_counts_sentinel() {
        let series = vec![4.0; 20];
        let c = cfg(5, 2);
        let mut sfa = SfaTransform::new(5, 2, false);
        let (hist, stats) = build_histogram(&series, &c, &bp(), &mut sfa, false);
        assert_eq!(hist.len(), 1);
        assert_eq!(hist[&Word::SENTINEL], 12);
        assert_eq!(stats.degenerate, 12);
    }

    #[test]
    fn test_remove_repeat_words() {
        let series = vec![4.0; 20];
        let c = cfg(5, 1);
        let mut sfa = SfaTransform::new(5, 2, false);
        let (hist, stats) = build_histogram(&series, &c, &bp(), &mut sfa, true);
        assert_eq!(hist[&Word::SENTINEL], 1);
        assert_eq!(stats.windows, 16);
    }

    #[test]
    fn test_series_shorter_than_span() {
        let c = cfg(5, 4);
        let mut sfa = SfaTransform::new(5, 2, false);
        let (hist, stats) = build_histogram(&[1.0, 2.0, 3.0], &c, &bp(), &mut sfa, false);
        assert!(hist.is_empty());
        assert_eq!(stats, HistogramStats::default());
    }
}
