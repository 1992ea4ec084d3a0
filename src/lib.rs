// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `rtl-fm-rs`: a squelch-hopping SDR scanning receiver built on top of an
//! RTL2832-class USB tuner. The [`device`]/[`tuners`]/[`rtlsdr`] modules are
//! the tuner driver: they own the USB link, register programming and
//! frequency/rate setup. Everything the receiver itself is responsible for
//! -- decimation, demodulation, squelch and frequency hopping -- lives in
//! [`dsp`], [`config`] and [`pipeline`].

pub mod cli;
pub mod config;
pub mod device;
pub mod dsp;
pub mod error;
pub mod pipeline;
pub mod rtlsdr;
pub mod tuners;

pub use error::Result;
pub use pipeline::Receiver;
pub use rtlsdr::RtlSdr;
pub use tuners::TunerGain;

/// Default USB transfer size used by [`RtlSdr::read_sync`], matching
/// `librtlsdr`'s `DEFAULT_BUF_LENGTH` (16 transfers of 16384 bytes each).
pub const DEFAULT_BUF_LENGTH: usize = 16 * 16384;

/// Selects which physical/virtual device `RtlSdr::open` should attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Args {
    /// The Nth RTL-SDR-compatible device enumerated on the USB bus.
    Index(usize),
    /// An already-opened file descriptor (Unix only), e.g. handed off by a
    /// privileged helper process.
    Fd(i32),
}

/// Direct-sampling mode, bypassing the tuner's mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectSampleMode {
    Off,
    On,
    OnSwap,
}
