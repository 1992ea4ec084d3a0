// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-line parsing and the CLI-to-config translation: frequency
//! string parsing (`k`/`K`/`m`/`M` suffixes, `start:stop[:step]` ranges),
//! gain snapping, and the `wbfm` mode shortcut.

use crate::config::{downsample_and_scale, DemodConfig, DemodMode, DongleConfig, OutputConfig, TuningPlan};
use crate::dsp::deemph::deemph_a;
use crate::dsp::squelch::squelch_to_rms;
use crate::tuners::TunerGain;
use crate::{Args as DeviceArgs, DirectSampleMode};
use clap::Parser;
use std::path::PathBuf;

/// Maximum number of frequencies a single `-f` range expands to, and the
/// hard cap on the whole tuning plan.
const MAX_PLAN_LEN: usize = 1000;

#[derive(Parser, Debug)]
#[command(name = "rtl_fm_rs", about = "Squelch-hopping SDR scanning receiver")]
pub struct Cli {
    /// Device index
    #[arg(short = 'd', default_value_t = 0)]
    pub device_index: usize,

    /// Frequency, or a start:stop[:step] range. Repeatable.
    #[arg(short = 'f', required = true)]
    pub freqs: Vec<String>,

    /// Sample rate
    #[arg(short = 's', default_value = "24000")]
    pub sample_rate: String,

    /// Squelch level in dB, 0 disables
    #[arg(short = 'l', default_value_t = 0)]
    pub squelch_level: i32,

    /// PPM frequency correction
    #[arg(short = 'p', default_value_t = 0)]
    pub ppm: i32,

    /// Gain in dB (auto-gain if omitted)
    #[arg(short = 'g')]
    pub gain: Option<i32>,

    /// Demodulation mode
    #[arg(short = 'M', default_value = "fm")]
    pub mode: String,

    /// Output filename, `-` for stdout
    pub output: String,

    /// Verbosity, repeatable
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet, repeatable
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

/// Parses a frequency token with an optional `k`/`K`/`m`/`M` suffix
/// (x1e3/x1e6, otherwise Hz).
pub fn parse_freq(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let (digits, mult) = match s.chars().last() {
        Some('k') | Some('K') => (&s[..s.len() - 1], 1_000.0),
        Some('m') | Some('M') => (&s[..s.len() - 1], 1_000_000.0),
        _ => (s, 1.0),
    };
    let value: f64 = digits
        .parse()
        .map_err(|_| format!("invalid frequency: {}", s))?;
    Ok((value * mult) as u32)
}

/// Expands one `-f` token (`freq` or `start:stop[:step]`) into a list of
/// frequencies, capped at `MAX_PLAN_LEN`.
pub fn expand_freq_token(token: &str) -> Result<Vec<u32>, String> {
    let parts: Vec<&str> = token.split(':').collect();
    match parts.as_slice() {
        [freq] => Ok(vec![parse_freq(freq)?]),
        [start, stop] => expand_range(parse_freq(start)?, parse_freq(stop)?, 25_000),
        [start, stop, step] => expand_range(parse_freq(start)?, parse_freq(stop)?, parse_freq(step)?),
        _ => Err(format!("invalid frequency token: {}", token)),
    }
}

fn expand_range(start: u32, stop: u32, step: u32) -> Result<Vec<u32>, String> {
    if step == 0 {
        return Err("frequency step must be nonzero".to_string());
    }
    let mut freqs = Vec::new();
    let mut f = start;
    while f <= stop && freqs.len() < MAX_PLAN_LEN {
        freqs.push(f);
        f += step;
    }
    Ok(freqs)
}

/// Builds the whole tuning plan from every `-f` token, in order, capped
/// at `MAX_PLAN_LEN` total entries.
pub fn build_plan(tokens: &[String]) -> Result<Vec<u32>, String> {
    let mut freqs = Vec::new();
    for token in tokens {
        freqs.extend(expand_freq_token(token)?);
        if freqs.len() > MAX_PLAN_LEN {
            freqs.truncate(MAX_PLAN_LEN);
            break;
        }
    }
    if freqs.is_empty() {
        return Err("empty tuning plan".to_string());
    }
    Ok(freqs)
}

/// Snaps a requested gain (in tenths of a dB) to the closest value the
/// tuner actually supports.
pub fn nearest_gain(requested: i32, supported: &[i32]) -> i32 {
    *supported
        .iter()
        .min_by_key(|g| (*g - requested).abs())
        .unwrap_or(&requested)
}

/// Resolves the device index argument into an [`crate::Args`].
pub fn device_args(cli: &Cli) -> DeviceArgs {
    DeviceArgs::Index(cli.device_index)
}

/// Builds the immutable config structs from parsed CLI input. A manual
/// gain is carried through as the raw tenths-of-dB value; it gets snapped
/// to the tuner's actually supported gains once the device is open (see
/// [`nearest_gain`]), since that list isn't known before then.
pub fn build_config(
    cli: &Cli,
) -> Result<(DongleConfig, TuningPlan, DemodConfig, OutputConfig), String> {
    let freqs = build_plan(&cli.freqs)?;

    let mode = match cli.mode.as_str() {
        "am" => DemodMode::Am,
        "fm" | "wbfm" => DemodMode::Fm,
        other => return Err(format!("unknown demod mode: {}", other)),
    };
    let wide_fm = cli.mode == "wbfm";

    // wbfm always disables squelch (see the rate table below), so it can
    // never hop; reject a multi-frequency plan in that case too, not just
    // when the user passed `-l 0` directly.
    if freqs.len() > 1 && (wide_fm || cli.squelch_level == 0) {
        return Err("squelch level required when tuning plan has more than one frequency".to_string());
    }

    let gain = match cli.gain {
        None => TunerGain::Auto,
        Some(db) => TunerGain::Manual(db * 10),
    };

    let dongle = DongleConfig {
        index: cli.device_index,
        gain,
        ppm: cli.ppm,
        direct_sampling: DirectSampleMode::Off,
    };

    let plan = TuningPlan::new(freqs, false, wide_fm);

    let (rate_in, rate_out, rate_out2, custom_atan, deemph, squelch_level) = if wide_fm {
        (170_000u32, 170_000u32, Some(32_000u32), true, true, 0i32)
    } else {
        let rate = parse_freq(&cli.sample_rate)?;
        if rate == 0 {
            return Err("sample rate must be nonzero".to_string());
        }
        (rate, rate, None, false, mode == DemodMode::Fm, cli.squelch_level)
    };

    let (downsample, output_scale) = downsample_and_scale(rate_in, mode == DemodMode::Fm);

    let gain_db = cli.gain;
    let squelch_rms = squelch_to_rms(squelch_level, downsample, gain_db);

    let deemph_coeff = if deemph { deemph_a(rate_out) } else { 0 };

    let demod = DemodConfig {
        rate_in,
        rate_out,
        rate_out2,
        post_downsample: 1,
        downsample,
        output_scale,
        squelch_level: squelch_rms,
        conseq_squelch: 10,
        custom_atan,
        deemph,
        deemph_a: deemph_coeff,
        pre_rotate: true,
        mode,
        agc: false,
    };

    let output = OutputConfig {
        path: if cli.output == "-" {
            None
        } else {
            Some(PathBuf::from(&cli.output))
        },
    };

    Ok((dongle, plan, demod, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_freq_suffixes() {
        assert_eq!(parse_freq("100").unwrap(), 100);
        assert_eq!(parse_freq("100k").unwrap(), 100_000);
        assert_eq!(parse_freq("100K").unwrap(), 100_000);
        assert_eq!(parse_freq("97.5m").unwrap(), 97_500_000);
        assert_eq!(parse_freq("97.5M").unwrap(), 97_500_000);
    }

    #[test]
    fn expand_single_freq() {
        assert_eq!(expand_freq_token("100m").unwrap(), vec![100_000_000]);
    }

    #[test]
    fn expand_range_default_step() {
        let freqs = expand_freq_token("100m:100.1m").unwrap();
        assert_eq!(freqs[0], 100_000_000);
        assert_eq!(freqs[1], 100_025_000);
    }

    #[test]
    fn expand_range_explicit_step() {
        let freqs = expand_freq_token("100m:100.05m:25k").unwrap();
        assert_eq!(freqs.len(), 3);
    }

    #[test]
    fn plan_capped_at_1000() {
        let freqs = expand_range(0, 10_000_000, 1).unwrap();
        assert_eq!(freqs.len(), MAX_PLAN_LEN);
    }

    #[test]
    fn nearest_gain_snaps_to_closest() {
        let supported = vec![0, 9, 14, 27, 37, 77, 87, 125, 144, 157, 166, 197];
        assert_eq!(nearest_gain(100, &supported), 87);
        assert_eq!(nearest_gain(1000, &supported), 197);
    }

    #[test]
    fn wbfm_forces_known_rates_and_disables_squelch() {
        let cli = Cli {
            device_index: 0,
            freqs: vec!["100m".to_string()],
            sample_rate: "24000".to_string(),
            squelch_level: 20,
            ppm: 0,
            gain: None,
            mode: "wbfm".to_string(),
            output: "-".to_string(),
            verbose: 0,
            quiet: 0,
        };
        let (_, _, demod, _) = build_config(&cli).unwrap();
        assert_eq!(demod.rate_in, 170_000);
        assert_eq!(demod.rate_out2, Some(32_000));
        assert!(demod.custom_atan);
        assert!(demod.deemph);
        assert_eq!(demod.squelch_level, 0);
    }

    #[test]
    fn multi_freq_plan_without_squelch_is_rejected() {
        let cli = Cli {
            device_index: 0,
            freqs: vec!["100m".to_string(), "101m".to_string()],
            sample_rate: "24000".to_string(),
            squelch_level: 0,
            ppm: 0,
            gain: None,
            mode: "fm".to_string(),
            output: "-".to_string(),
            verbose: 0,
            quiet: 0,
        };
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let cli = Cli {
            device_index: 0,
            freqs: vec!["100m".to_string()],
            sample_rate: "0".to_string(),
            squelch_level: 20,
            ppm: 0,
            gain: None,
            mode: "fm".to_string(),
            output: "-".to_string(),
            verbose: 0,
            quiet: 0,
        };
        assert!(build_config(&cli).is_err());
    }
}
