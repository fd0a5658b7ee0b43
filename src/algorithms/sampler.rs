use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::algorithms::common::{dilated_span, max_stream_len};
use crate::core::config::{BinningMethod, WeaselConfig};
use crate::core::error::{Result, WeaselError};

/// Number of redraws allowed before a member is declared unsatisfiable.
const MAX_SAMPLING_ATTEMPTS: usize = 64;

/// One randomly parameterized view of the transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Stable identifier; orders feature indices in the global vocabulary.
    pub id: usize,
    pub member_index: usize,
    pub window_length: usize,
    /// Spacing between consecutive samples inside a window.
    pub dilation: usize,
    /// Number of quantized Fourier coefficients (symbols per word).
    pub word_length: usize,
    pub alphabet_size: usize,
    /// Z-normalize each window and drop the DC term.
    pub normalize: bool,
    /// Operate on the first-order differences instead of the raw series.
    pub first_difference: bool,
    pub binning: BinningMethod,
}

impl Configuration {
    /// Samples covered by one window.
    pub fn span(&self) -> usize {
        dilated_span(self.window_length, self.dilation)
    }

    /// Length of the representation this configuration reads for a raw series of `series_len`.
    pub fn input_length(&self, series_len: usize) -> usize {
        if self.first_difference {
            series_len.saturating_sub(1)
        } else {
            series_len
        }
    }

    /// Whether the configuration produces at least one window on a raw series of `series_len`.
    pub fn fits(&self, series_len: usize) -> bool {
        self.input_length(series_len) >= self.span()
    }

    /// Size of the word space, `alphabet_size ^ word_length`.
    pub fn word_space(&self) -> u128 {
        (self.alphabet_size as u128).pow(self.word_length as u32)
    }
}

/// Deterministic generator for ensemble member `member_index`.
///
/// Every member reads its own ChaCha stream of the global seed, so draws do
/// not depend on how many members ran before or on which worker.
pub fn member_rng(global_seed: u64, member_index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(global_seed);
    rng.set_stream(member_index as u64);
    rng
}

/// Draw the configurations of one ensemble member.
///
/// The member draws a single parameter tuple and emits one configuration per
/// entry of `use_first_differences`, with ids
/// `member_index * representations + r`. A tuple whose dilated window does not
/// fit every representation is rejected and redrawn from the same stream.
///
/// # Arguments
/// * `config` - Ensemble settings (window bounds and option pools)
/// * `global_seed` - Seed shared by all members
/// * `member_index` - Index of the member in `0..ensemble_size`
/// * `series_length` - Length of the raw training series
pub fn sample_member(
    config: &WeaselConfig,
    global_seed: u64,
    member_index: usize,
    series_length: usize,
) -> Result<Vec<Configuration>> {
    let representations = &config.use_first_differences;
    let any_difference = representations.iter().any(|&d| d);
    // Shortest representation every drawn window must fit.
    let effective_len = if any_difference {
        series_length.saturating_sub(1)
    } else {
        series_length
    };
    let max_window = config.max_window.min(effective_len);
    if config.min_window > max_window {
        return Err(WeaselError::Configuration(format!(
            "min_window {} does not fit series of length {series_length} \
             (usable length {effective_len})",
            config.min_window
        )));
    }

    let mut rng = member_rng(global_seed, member_index);
    for _ in 0..MAX_SAMPLING_ATTEMPTS {
        let window_length = rng.gen_range(config.min_window..=max_window);
        let dilation = draw_dilation(&mut rng, effective_len, window_length);
        let word_length = *config.word_lengths.choose(&mut rng).unwrap_or(&1);
        let alphabet_size = *config.alphabet_sizes.choose(&mut rng).unwrap_or(&2);
        let normalize = *config.norm_options.choose(&mut rng).unwrap_or(&false);
        let binning = *config
            .binning_strategies
            .choose(&mut rng)
            .unwrap_or(&BinningMethod::EquiDepth);

        let word_length = word_length
            .min(window_length.saturating_sub(2))
            .min(max_stream_len(window_length, normalize));
        if word_length == 0 || dilated_span(window_length, dilation) > effective_len {
            continue;
        }

        let members = representations
            .iter()
            .enumerate()
            .map(|(r, &first_difference)| Configuration {
                id: member_index * representations.len() + r,
                member_index,
                window_length,
                dilation,
                word_length,
                alphabet_size,
                normalize,
                first_difference,
                binning,
            })
            .collect();
        return Ok(members);
    }

    Err(WeaselError::Configuration(format!(
        "member {member_index}: no valid configuration for series length {series_length} \
         after {MAX_SAMPLING_ATTEMPTS} attempts"
    )))
}

/// Draw all configurations of the ensemble in id order.
pub fn sample_configurations(
    config: &WeaselConfig,
    global_seed: u64,
    series_length: usize,
) -> Result<Vec<Configuration>> {
    let mut out = Vec::with_capacity(config.ensemble_size * config.use_first_differences.len());
    for member in 0..config.ensemble_size {
        out.extend(sample_member(config, global_seed, member, series_length)?);
    }
    Ok(out)
}

/// Log-uniform dilation in `[1, (len - 1) / (window - 1)]`.
///
/// `d = max(1, floor(2^u))` with `u ~ U(0, log2((len - 1) / (window - 1)))`,
/// which keeps `(window - 1) * d + 1 <= len`.
fn draw_dilation(rng: &mut ChaCha8Rng, len: usize, window_length: usize) -> usize {
    if window_length < 2 || len <= window_length {
        return 1;
    }
    let ratio = (len - 1) as f64 / (window_length - 1) as f64;
    let upper = ratio.log2();
    if upper <= 0.0 {
        return 1;
    }
    let u: f64 = rng.gen_range(0.0..upper);
    let d = (2f64.powf(u).floor() as usize).max(1);
    // Guard against rounding at the upper edge.
    d.min((len - 1) / (window_length - 1)).max(1)
}
