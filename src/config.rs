// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration structs built once from parsed CLI input, before the
//! pipeline starts. Everything here is read-only for the lifetime of the
//! run except the fields `pipeline` explicitly documents as single-writer
//! (current frequency index and mute countdown, both owned by the
//! Controller).

use crate::tuners::TunerGain;
use crate::DEFAULT_BUF_LENGTH;
use std::path::PathBuf;

/// Per-`postDownsample` multiplier table so the tuner buffer length stays
/// an integer multiple of the post-downsample factor.
pub const LCM_POST: [usize; 17] = [1, 1, 1, 3, 1, 5, 3, 7, 1, 9, 5, 11, 3, 13, 7, 15, 1];

/// Device-level configuration: which tuner to open and how to drive it.
#[derive(Debug, Clone)]
pub struct DongleConfig {
    pub index: usize,
    pub gain: TunerGain,
    pub ppm: i32,
    pub direct_sampling: crate::DirectSampleMode,
}

/// The ordered list of center frequencies to hop across, plus the
/// currently active index (Controller-owned).
#[derive(Debug, Clone)]
pub struct TuningPlan {
    pub freqs: Vec<u32>,
    pub current: usize,
    pub edge: bool,
    pub wide_fm: bool,
}

impl TuningPlan {
    pub fn new(mut freqs: Vec<u32>, edge: bool, wide_fm: bool) -> Self {
        if wide_fm {
            for f in freqs.iter_mut() {
                *f += 16_000;
            }
        }
        Self {
            freqs,
            current: 0,
            edge,
            wide_fm,
        }
    }

    pub fn current_freq(&self) -> u32 {
        self.freqs[self.current]
    }

    /// Advances to the next frequency in the plan, wrapping around. A
    /// single-entry plan never advances.
    pub fn advance(&mut self) {
        if self.freqs.len() <= 1 {
            return;
        }
        self.current = (self.current + 1) % self.freqs.len();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemodMode {
    Am,
    Fm,
}

/// Demodulation/resampling configuration, computed once per tuning-plan
/// entry (the capture-dependent fields are recomputed on every hop).
#[derive(Debug, Clone)]
pub struct DemodConfig {
    pub rate_in: u32,
    pub rate_out: u32,
    pub rate_out2: Option<u32>,
    pub post_downsample: u8,
    pub downsample: u32,
    pub output_scale: u32,
    pub squelch_level: i32,
    pub conseq_squelch: i32,
    pub custom_atan: bool,
    pub deemph: bool,
    pub deemph_a: i32,
    pub pre_rotate: bool,
    pub mode: DemodMode,
    pub agc: bool,
}

/// Capture parameters derived for a single plan frequency: what the tuner
/// is actually commanded to, as opposed to the user-requested `rate_in`.
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub capture_freq: u32,
    pub capture_rate: u32,
    pub downsample: u32,
    pub output_scale: u32,
}

/// Derives `downsample` and `output_scale` from `rate_in` alone, per the
/// decimating-FIR invariants: `downsample = floor(1_000_000 / rate_in) +
/// 1`, `output_scale = max(1, (1<<15) / (128 * downsample))`, forced to 1
/// for FM. Shared by [`optimal_settings`] (which also needs the capture
/// frequency/rate) and `cli::build_config` (which only needs these two to
/// size the squelch threshold before the tuner is even open).
pub fn downsample_and_scale(rate_in: u32, fm_mode: bool) -> (u32, u32) {
    let downsample = (1_000_000 / rate_in) + 1;
    let mut output_scale = (1 << 15) / (128 * downsample);
    if output_scale < 1 {
        output_scale = 1;
    }
    if fm_mode {
        output_scale = 1;
    }
    (downsample, output_scale)
}

/// Computes the downsample factor, capture frequency/rate, and output
/// scale for tuning to `freq` at `rate_in`, per the decimating-FIR
/// invariants: `downsample = floor(1_000_000 / rate_in) + 1`,
/// `captureRate = downsample * rateIn`, `captureFreq = freq +
/// captureRate/4` when pre-rotate is enabled (offset tuning dodges the DC
/// spike), plus `edge * rateIn / 2`.
pub fn optimal_settings(
    freq: u32,
    rate_in: u32,
    edge: bool,
    pre_rotate: bool,
    fm_mode: bool,
) -> CaptureSettings {
    let (downsample, output_scale) = downsample_and_scale(rate_in, fm_mode);
    let capture_rate = downsample * rate_in;
    let mut capture_freq = freq;
    if pre_rotate {
        capture_freq += capture_rate / 4;
    }
    if edge {
        capture_freq += rate_in / 2;
    }
    CaptureSettings {
        capture_freq,
        capture_rate,
        downsample,
        output_scale,
    }
}

/// Tuner buffer length for a given post-downsample factor, kept an exact
/// multiple of `postDownsample` so the post-downsample stage never sees a
/// partial window at a buffer boundary.
pub fn actual_buf_len(post_downsample: u8) -> usize {
    LCM_POST[post_downsample as usize] * DEFAULT_BUF_LENGTH
}

/// Where the Output Writer sends PCM bytes.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// S4 / invariant: the exact formulas from the data model, run on
    /// the same 100 MHz / 24 kHz fixture the teacher's own examples use.
    #[test]
    fn optimal_settings_matches_invariant_formulas() {
        let settings = optimal_settings(100_000_000, 24_000, false, true, false);
        assert_eq!(settings.downsample, 1_000_000 / 24_000 + 1);
        assert_eq!(settings.capture_rate, settings.downsample * 24_000);
        assert_eq!(
            settings.capture_freq,
            100_000_000 + settings.capture_rate / 4
        );
        assert!(settings.output_scale >= 1);
    }

    #[test]
    fn output_scale_forced_to_one_for_fm() {
        let settings = optimal_settings(100_000_000, 170_000, false, true, true);
        assert_eq!(settings.output_scale, 1);
    }

    #[test]
    fn edge_adds_half_rate_in() {
        let without_edge = optimal_settings(100_000_000, 24_000, false, true, false);
        let with_edge = optimal_settings(100_000_000, 24_000, true, true, false);
        assert_eq!(with_edge.capture_freq - without_edge.capture_freq, 12_000);
    }

    #[test]
    fn wide_fm_plan_shifts_every_frequency() {
        let plan = TuningPlan::new(vec![100_000_000, 101_000_000], false, true);
        assert_eq!(plan.freqs, vec![100_016_000, 101_016_000]);
    }

    #[test]
    fn single_entry_plan_never_advances() {
        let mut plan = TuningPlan::new(vec![100_000_000], false, false);
        plan.advance();
        assert_eq!(plan.current, 0);
    }

    #[test]
    fn multi_entry_plan_wraps() {
        let mut plan = TuningPlan::new(vec![1, 2, 3], false, false);
        plan.advance();
        plan.advance();
        plan.advance();
        assert_eq!(plan.current, 0);
    }

    #[test]
    fn actual_buf_len_uses_lcm_post_table() {
        assert_eq!(actual_buf_len(1), DEFAULT_BUF_LENGTH);
        assert_eq!(actual_buf_len(4), 3 * DEFAULT_BUF_LENGTH);
    }
}
