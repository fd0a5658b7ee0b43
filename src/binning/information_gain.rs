use crate::core::binning_strategy::BinningStrategy;

/// Minimum entropy reduction for a split to be accepted.
const MIN_GAIN: f64 = 1e-12;

/// Class-aware binning by recursive information-gain splits.
///
/// Starting from the whole column, repeatedly splits the segment whose best
/// split point yields the largest class-entropy reduction, until
/// `alphabet_size - 1` cuts exist or no segment can be split further. Missing
/// cuts are padded with the column maximum (empty upper bins).
#[derive(Debug, Clone)]
pub struct InformationGain;

/// Best split of a segment `[lo, hi)`.
#[derive(Debug, Clone, Copy)]
struct Split {
    gain: f64,
    lo: usize,
    at: usize,
    hi: usize,
}

fn entropy(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / t;
            -p * p.log2()
        })
        .sum()
}

/// Scan split points between distinct adjacent values of `column[lo..hi]`.
fn best_split(column: &[(f64, usize)], lo: usize, hi: usize, n_classes: usize) -> Option<Split> {
    if hi - lo < 2 {
        return None;
    }
    let mut total = vec![0usize; n_classes];
    for &(_, c) in &column[lo..hi] {
        total[c] += 1;
    }
    let n = hi - lo;
    let parent = entropy(&total, n);

    let mut left = vec![0usize; n_classes];
    let mut right = total;
    let mut best: Option<Split> = None;
    for at in (lo + 1)..hi {
        let c = column[at - 1].1;
        left[c] += 1;
        right[c] -= 1;
        if column[at - 1].0 == column[at].0 {
            continue;
        }
        let nl = at - lo;
        let nr = hi - at;
        let child = (nl as f64 * entropy(&left, nl) + nr as f64 * entropy(&right, nr)) / n as f64;
        let gain = parent - child;
        if gain > MIN_GAIN && best.map_or(true, |b| gain > b.gain) {
            best = Some(Split { gain, lo, at, hi });
        }
    }
    best
}

impl BinningStrategy for InformationGain {
    fn cuts(column: &[(f64, usize)], alphabet_size: usize, n_classes: usize) -> Vec<f64> {
        let n_classes = n_classes.max(1);
        let mut cuts = Vec::with_capacity(alphabet_size - 1);
        let mut frontier: Vec<Split> = best_split(column, 0, column.len(), n_classes)
            .into_iter()
            .collect();

        while cuts.len() + 1 < alphabet_size && !frontier.is_empty() {
            // Highest gain first; equal gains resolve to the leftmost segment.
            let mut pick = 0;
            for (i, s) in frontier.iter().enumerate() {
                let p = frontier[pick];
                if s.gain > p.gain || (s.gain == p.gain && s.lo < p.lo) {
                    pick = i;
                }
            }
            let s = frontier.swap_remove(pick);
            cuts.push(column[s.at - 1].0);
            frontier.extend(best_split(column, s.lo, s.at, n_classes));
            frontier.extend(best_split(column, s.at, s.hi, n_classes));
        }

        cuts.sort_by(f64::total_cmp);
        let max = column[column.len() - 1].0;
        cuts.resize(alphabet_size - 1, max);
        cuts
    }

    fn is_supervised() -> bool {
        true
    }
}
