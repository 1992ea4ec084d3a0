// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wires the four long-running tasks (Tuner Ingest, Demodulator,
//! Controller, Output Writer) together with bounded channels and starts
//! them as OS threads.

mod controller;
mod demodulator;
mod ingest;
mod output;

use crate::config::{actual_buf_len, optimal_settings, DemodConfig, DongleConfig, OutputConfig, TuningPlan};
use crate::error::Result;
use crate::RtlSdr;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::mpsc::sync_channel;
use std::sync::{Arc, Mutex};
use std::thread;

/// A fully configured scanning receiver, ready to run until `shutdown` is
/// set.
pub struct Receiver {
    dongle: DongleConfig,
    plan: TuningPlan,
    demod: DemodConfig,
    output: OutputConfig,
}

impl Receiver {
    pub fn new(dongle: DongleConfig, plan: TuningPlan, demod: DemodConfig, output: OutputConfig) -> Self {
        Self {
            dongle,
            plan,
            demod,
            output,
        }
    }

    /// Opens the tuner, tunes to the first plan frequency, spawns the
    /// four pipeline tasks, and blocks until all of them have exited
    /// (either `shutdown` was set, or a task hit a fatal error).
    pub fn run(self, shutdown: &'static AtomicBool) -> Result<()> {
        let Receiver {
            dongle,
            plan,
            demod,
            output,
        } = self;

        let mut sdr = RtlSdr::open(crate::Args::Index(dongle.index))?;
        let gain = match dongle.gain {
            crate::tuners::TunerGain::Manual(requested) => {
                let gains = sdr.get_tuner_gains()?;
                crate::tuners::TunerGain::Manual(crate::cli::nearest_gain(requested, &gains))
            }
            auto => auto,
        };
        sdr.set_tuner_gain(gain)?;
        sdr.set_freq_correction(dongle.ppm)?;
        sdr.set_direct_sampling(dongle.direct_sampling)?;
        sdr.reset_buffer()?;

        let fm_mode = demod.mode == crate::config::DemodMode::Fm;
        let initial = optimal_settings(
            plan.current_freq(),
            demod.rate_in,
            plan.edge,
            demod.pre_rotate,
            fm_mode,
        );
        sdr.set_center_freq(initial.capture_freq)?;
        sdr.set_sample_rate(initial.capture_rate)?;
        info!(
            "tuned to {} Hz, capture rate {} S/s",
            initial.capture_freq, initial.capture_rate
        );

        let sink: Box<dyn Write + Send> = match output.path {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(std::io::stdout())),
        };

        let buf_len = actual_buf_len(demod.post_downsample);
        let rate_in = demod.rate_in;
        let edge = plan.edge;
        let pre_rotate = demod.pre_rotate;
        let mode = demod.mode;

        let sdr = Arc::new(Mutex::new(sdr));
        let plan = Arc::new(Mutex::new(plan));
        let mute = Arc::new(AtomicUsize::new(0));

        let (iq_tx, iq_rx) = sync_channel(1);
        let (pcm_tx, pcm_rx) = sync_channel(1);
        let (hop_tx, hop_rx) = sync_channel(1);

        let ingest_handle = {
            let sdr = Arc::clone(&sdr);
            let mute = Arc::clone(&mute);
            thread::spawn(move || ingest::run(sdr, mute, buf_len, pre_rotate, iq_tx, shutdown))
        };

        let demod_handle = {
            thread::spawn(move || demodulator::run(demod, iq_rx, pcm_tx, hop_tx, shutdown))
        };

        let controller_handle = {
            let sdr = Arc::clone(&sdr);
            let mute = Arc::clone(&mute);
            let plan = Arc::clone(&plan);
            thread::spawn(move || {
                controller::run(sdr, mute, plan, rate_in, edge, pre_rotate, mode, hop_rx, shutdown)
            })
        };

        let output_handle = thread::spawn(move || output::run(pcm_rx, sink, shutdown));

        ingest_handle.join().expect("tuner ingest thread panicked");
        demod_handle.join().expect("demodulator thread panicked");
        let controller_result = controller_handle.join().expect("controller thread panicked");
        output_handle.join().expect("output writer thread panicked");

        // Ingest and Controller's Arc clones were dropped when their
        // threads exited above, so exactly one strong reference remains.
        let mut sdr = Arc::try_unwrap(sdr)
            .unwrap_or_else(|_| panic!("tuner handle still shared after pipeline shutdown"))
            .into_inner()
            .unwrap();
        sdr.close()?;

        // A retune failure is the one case where a task exiting isn't a
        // clean shutdown; surface it so the process reports failure
        // instead of a silent success.
        controller_result?;
        Ok(())
    }
}
