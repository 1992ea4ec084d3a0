// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demodulator: decimating low-pass -> power squelch -> AM/FM
//! demodulation -> optional de-emphasis -> optional audio-rate resample.

use crate::config::{DemodConfig, DemodMode};
use crate::dsp::agc::Agc;
use crate::dsp::deemph::Deemph;
use crate::dsp::demod::{am_demod, FmDemod};
use crate::dsp::lowpass::LowPassComplex;
use crate::dsp::resample::LowPassReal;
use crate::dsp::squelch::SquelchState;
use crate::dsp::{IqBlock, PcmBlock};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};

pub fn run(
    config: DemodConfig,
    rx: Receiver<IqBlock>,
    tx_pcm: SyncSender<PcmBlock>,
    tx_hop: SyncSender<()>,
    shutdown: &'static AtomicBool,
) {
    let mut lowpass = LowPassComplex::new();
    let mut squelch = SquelchState::new();
    let mut fm = FmDemod::new(config.custom_atan);
    let mut deemph = if config.deemph {
        Some(Deemph::new(config.deemph_a))
    } else {
        None
    };
    let mut resample = config
        .rate_out2
        .map(|slow| LowPassReal::new(config.rate_out, slow));
    let mut agc = Agc::new();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let mut block = match rx.recv() {
            Ok(block) => block,
            Err(_) => break,
        };

        lowpass.process(&mut block, config.downsample);
        if block.is_empty() {
            continue;
        }

        squelch.apply(&mut block, config.squelch_level);
        if squelch.should_hop(config.squelch_level, config.conseq_squelch) {
            if tx_hop.send(()).is_err() {
                break;
            }
            continue;
        }

        match config.mode {
            DemodMode::Am => am_demod(&mut block, config.output_scale),
            DemodMode::Fm => fm.process(&mut block),
        }

        if let Some(deemph) = deemph.as_mut() {
            deemph.process(&mut block);
        }

        if let Some(resample) = resample.as_mut() {
            resample.process(&mut block);
        }

        if config.agc {
            agc.process(&mut block);
        }

        if tx_pcm.send(block).is_err() {
            break;
        }
    }
    info!("demodulator stopped");
}
