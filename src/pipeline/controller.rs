// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller: owns the tuning plan, reacts to hop signals from the
//! Demodulator by advancing to the next frequency and retuning the
//! tuner.

use crate::config::{optimal_settings, DemodMode, TuningPlan};
use crate::error::Result;
use crate::RtlSdr;
use log::{error, info};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bytes blanked at the head of the next I/Q buffer after a retune, to
/// cover the PLL settling transient.
pub const BUFFER_DUMP: usize = 4096;

/// Runs until `shutdown` is set or the hop channel disconnects (both clean
/// shutdown paths, `Ok(())`), or a retune command fails against the tuner
/// (`Err`) -- a hard device error, which also sets `shutdown` itself so the
/// rest of the pipeline tears down instead of running on forever at a
/// stale, unretuned frequency.
pub fn run(
    sdr: Arc<Mutex<RtlSdr>>,
    mute: Arc<AtomicUsize>,
    plan: Arc<Mutex<TuningPlan>>,
    rate_in: u32,
    edge: bool,
    pre_rotate: bool,
    mode: DemodMode,
    rx_hop: Receiver<()>,
    shutdown: &'static AtomicBool,
) -> Result<()> {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        match rx_hop.recv_timeout(Duration::from_millis(200)) {
            Ok(()) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }

        let freq = {
            let mut plan = plan.lock().unwrap();
            if plan.freqs.len() <= 1 {
                continue;
            }
            plan.advance();
            plan.current_freq()
        };

        let settings = optimal_settings(freq, rate_in, edge, pre_rotate, mode == DemodMode::Fm);
        let mut sdr = sdr.lock().unwrap();
        if let Err(e) = sdr.set_center_freq(settings.capture_freq) {
            error!("retune failed: {:#?}", e);
            shutdown.store(true, Ordering::Relaxed);
            return Err(e);
        }
        if let Err(e) = sdr.set_sample_rate(settings.capture_rate) {
            error!("retune failed: {:#?}", e);
            shutdown.store(true, Ordering::Relaxed);
            return Err(e);
        }
        drop(sdr);
        mute.store(BUFFER_DUMP, Ordering::Relaxed);
        info!("hopped to {} Hz", freq);
    }
    info!("controller stopped");
    Ok(())
}
