// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output Writer: dequeues PCM blocks and writes them little-endian to
//! the sink, best-effort (a write error is logged but never stops the
//! pipeline).

use crate::dsp::PcmBlock;
use byteorder::{LittleEndian, WriteBytesExt};
use log::{info, warn};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;

pub fn run(rx: Receiver<PcmBlock>, mut sink: Box<dyn Write + Send>, shutdown: &'static AtomicBool) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let block = match rx.recv() {
            Ok(block) => block,
            Err(_) => break,
        };
        for sample in block {
            if let Err(e) = sink.write_i16::<LittleEndian>(sample) {
                warn!("sink write error: {}", e);
            }
        }
        if let Err(e) = sink.flush() {
            warn!("sink flush error: {}", e);
        }
    }
    info!("output writer stopped");
}
