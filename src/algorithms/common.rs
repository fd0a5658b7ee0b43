use std::f64::consts::TAU;
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

/// Size threshold (window length * frequencies) above which the DFT dispatches
/// to the FFT path. Below this, direct evaluation against precomputed tables
/// wins due to lower constant overhead.
const FFT_THRESHOLD: usize = 2048;

/// Standard deviation below which a window is treated as constant.
pub const DEGENERATE_STD: f64 = 1e-8;

/// Span in samples covered by a dilated window: `(window_length - 1) * dilation + 1`.
#[inline]
pub fn dilated_span(window_length: usize, dilation: usize) -> usize {
    (window_length - 1) * dilation + 1
}

/// Number of valid window start positions for a dilated window.
///
/// Windows start at every position `s` with `s + (window_length - 1) * dilation < series_len`,
/// giving `series_len - (window_length - 1) * dilation` positions (0 if the span does not fit).
#[inline]
pub fn window_count(series_len: usize, window_length: usize, dilation: usize) -> usize {
    let span = dilated_span(window_length, dilation);
    if series_len < span {
        0
    } else {
        series_len - span + 1
    }
}

/// Copy the dilated window starting at `start` into `buf`.
///
/// `buf[i] = series[start + i * dilation]` for `i < buf.len()`.
#[inline]
pub fn fill_dilated_window(series: &[f64], start: usize, dilation: usize, buf: &mut [f64]) {
    debug_assert!(start + (buf.len() - 1) * dilation < series.len());
    for (i, b) in buf.iter_mut().enumerate() {
        *b = series[start + i * dilation];
    }
}

/// First-order differences `x[i + 1] - x[i]` (length `n - 1`).
pub fn first_differences(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Population mean and standard deviation of a window.
pub fn mean_std(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let var = window.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    (mean, var.max(0.0).sqrt())
}

/// Length of the usable low-frequency coefficient stream for a window.
///
/// Only frequencies strictly below Nyquist are used, so the stream has
/// `2 * ((w - 1) / 2)` entries, plus one for the DC term when it is kept.
pub fn max_stream_len(window_length: usize, skip_dc: bool) -> usize {
    let pairs = 2 * ((window_length - 1) / 2);
    if skip_dc {
        pairs
    } else {
        pairs + 1
    }
}

/// Map a stream position to `(frequency, is_real_part)`.
///
/// Stream layout: `[Re X0, Re X1, Im X1, Re X2, Im X2, ...]`, with `Re X0`
/// omitted when `skip_dc` is set.
#[inline]
fn stream_slot(pos: usize, skip_dc: bool) -> (usize, bool) {
    if skip_dc {
        (pos / 2 + 1, pos % 2 == 0)
    } else if pos == 0 {
        (0, true)
    } else {
        ((pos + 1) / 2, pos % 2 == 1)
    }
}

/// Truncated real DFT producing the first `n_coefficients` stream entries.
///
/// Uses the same sign convention as a forward real FFT:
/// `X_k = sum_t x_t * (cos(2 pi k t / w) - i sin(2 pi k t / w))`.
#[derive(Clone)]
pub struct LowFrequencyDft {
    window_length: usize,
    n_coefficients: usize,
    skip_dc: bool,
    first_freq: usize,
    n_freqs: usize,
    /// `n_freqs x window_length` row-major tables (direct path only).
    cos_table: Vec<f64>,
    sin_table: Vec<f64>,
    fft: Option<FftPath>,
}

#[derive(Clone)]
struct FftPath {
    plan: Arc<dyn RealToComplex<f64>>,
    input: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl LowFrequencyDft {
    /// Plan a transform for windows of `window_length` samples.
    ///
    /// # Panics
    /// Panics if `n_coefficients` exceeds [`max_stream_len`].
    pub fn new(window_length: usize, n_coefficients: usize, skip_dc: bool) -> Self {
        assert!(
            n_coefficients <= max_stream_len(window_length, skip_dc),
            "{n_coefficients} coefficients requested from a window of {window_length}"
        );
        let first_freq = usize::from(skip_dc);
        let last_freq = if n_coefficients == 0 {
            first_freq
        } else {
            stream_slot(n_coefficients - 1, skip_dc).0
        };
        let n_freqs = last_freq + 1 - first_freq;

        let mut dft = Self {
            window_length,
            n_coefficients,
            skip_dc,
            first_freq,
            n_freqs,
            cos_table: Vec::new(),
            sin_table: Vec::new(),
            fft: None,
        };

        if window_length * n_freqs > FFT_THRESHOLD {
            let mut planner = RealFftPlanner::<f64>::new();
            let plan = planner.plan_fft_forward(window_length);
            dft.fft = Some(FftPath {
                input: plan.make_input_vec(),
                spectrum: plan.make_output_vec(),
                scratch: plan.make_scratch_vec(),
                plan,
            });
        } else {
            let w = window_length as f64;
            dft.cos_table = Vec::with_capacity(n_freqs * window_length);
            dft.sin_table = Vec::with_capacity(n_freqs * window_length);
            for k in first_freq..=last_freq {
                for t in 0..window_length {
                    let angle = TAU * (k * t % window_length) as f64 / w;
                    dft.cos_table.push(angle.cos());
                    dft.sin_table.push(angle.sin());
                }
            }
        }
        dft
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn n_coefficients(&self) -> usize {
        self.n_coefficients
    }

    /// Compute the coefficient stream of `window` into `out[..n_coefficients]`.
    pub fn transform(&mut self, window: &[f64], out: &mut [f64]) {
        debug_assert_eq!(window.len(), self.window_length);
        debug_assert!(out.len() >= self.n_coefficients);
        let skip_dc = self.skip_dc;

        if let Some(fft) = self.fft.as_mut() {
            fft.input.copy_from_slice(window);
            fft.plan
                .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)
                .expect("FFT buffers are allocated by the plan");
            for (pos, o) in out[..self.n_coefficients].iter_mut().enumerate() {
                let (k, real) = stream_slot(pos, skip_dc);
                *o = if real {
                    fft.spectrum[k].re
                } else {
                    fft.spectrum[k].im
                };
            }
            return;
        }

        let w = self.window_length;
        for (pos, o) in out[..self.n_coefficients].iter_mut().enumerate() {
            let (k, real) = stream_slot(pos, skip_dc);
            let row = (k - self.first_freq) * w;
            *o = if real {
                self.cos_table[row..row + w]
                    .iter()
                    .zip(window)
                    .map(|(c, x)| c * x)
                    .sum()
            } else {
                -self.sin_table[row..row + w]
                    .iter()
                    .zip(window)
                    .map(|(s, x)| s * x)
                    .sum::<f64>()
            };
        }
        debug_assert!(self.n_freqs * w == self.cos_table.len());
    }
}
