// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tuner Ingest: pulls raw unsigned-byte buffers from the tuner and turns
//! them into signed I/Q sample blocks for the Demodulator.

use crate::dsp::{rotate::rotate_90, IqBlock};
use crate::RtlSdr;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex};

pub fn run(
    sdr: Arc<Mutex<RtlSdr>>,
    mute: Arc<AtomicUsize>,
    buf_len: usize,
    pre_rotate: bool,
    tx: SyncSender<IqBlock>,
    shutdown: &'static AtomicBool,
) {
    info!("tuner ingest started, buffer size {} bytes", buf_len);
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let mut buf = vec![0u8; buf_len];
        let n = {
            let sdr = sdr.lock().unwrap();
            sdr.read_sync(&mut buf)
        };
        let n = match n {
            Ok(n) => n,
            Err(e) => {
                warn!("tuner read error, shutting down: {:#?}", e);
                break;
            }
        };
        buf.truncate(n);

        apply_mute(&mut buf, &mute);

        if pre_rotate && buf.len() % 8 == 0 {
            rotate_90(&mut buf);
        }

        let block = to_iq_block(&buf);
        if tx.send(block).is_err() {
            break;
        }
    }
    info!("tuner ingest stopped");
}

/// Blanks the leading `min(pending, buf.len())` bytes of `buf` to the
/// unsigned midpoint and decrements `mute` by only what this buffer
/// actually consumed, so a mute window spanning more than one buffer
/// carries its remainder into the next read instead of being dropped.
/// Uses `fetch_update` rather than a separate load/store so a concurrent
/// `mute.store` from the Controller (arming a fresh post-retune window)
/// can never be clobbered by this read-modify-write. Returns the number
/// of bytes blanked.
fn apply_mute(buf: &mut [u8], mute: &AtomicUsize) -> usize {
    let mut applied = 0;
    let _ = mute.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |pending| {
        applied = pending.min(buf.len());
        Some(pending - applied)
    });
    if applied > 0 {
        buf[..applied].fill(127);
    }
    applied
}

/// Converts raw unsigned I/Q bytes to signed samples centered on the
/// midpoint the tuner's ADC outputs.
fn to_iq_block(buf: &[u8]) -> IqBlock {
    buf.iter().map(|b| *b as i16 - 127).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_to_iq_centers_on_midpoint() {
        let buf = vec![127u8, 0, 255, 128];
        assert_eq!(to_iq_block(&buf), vec![0, -127, 128, 1]);
    }

    #[test]
    fn mute_blanks_only_the_requested_prefix_and_clears() {
        let mute = AtomicUsize::new(10);
        let mut buf = vec![200u8; 64];
        let applied = apply_mute(&mut buf, &mute);
        assert_eq!(applied, 10);
        assert!(buf[..10].iter().all(|b| *b == 127));
        assert!(buf[10..].iter().all(|b| *b == 200));
        assert_eq!(mute.load(Ordering::Relaxed), 0);
    }

    /// A mute window longer than one buffer must persist the remainder
    /// instead of being cleared to 0 on the first short read.
    #[test]
    fn mute_longer_than_buffer_persists_the_remainder() {
        let mute = AtomicUsize::new(100);
        let mut buf = vec![200u8; 64];
        let applied = apply_mute(&mut buf, &mute);
        assert_eq!(applied, 64);
        assert!(buf.iter().all(|b| *b == 127));
        assert_eq!(mute.load(Ordering::Relaxed), 36);

        let mut next = vec![200u8; 64];
        let applied_next = apply_mute(&mut next, &mute);
        assert_eq!(applied_next, 36);
        assert!(next[..36].iter().all(|b| *b == 127));
        assert!(next[36..].iter().all(|b| *b == 200));
        assert_eq!(mute.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn zero_mute_leaves_buffer_untouched() {
        let mute = AtomicUsize::new(0);
        let mut buf = vec![200u8; 8];
        let applied = apply_mute(&mut buf, &mute);
        assert_eq!(applied, 0);
        assert!(buf.iter().all(|b| *b == 200));
    }
}
