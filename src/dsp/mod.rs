//! Fixed-point DSP kernels shared by the demodulation pipeline.
//!
//! Every kernel here operates on plain integer buffers and mutates its own
//! small piece of state across calls (`prev_index`, `pre_r`/`pre_j`,
//! `deemph_avg`, ...). None of them allocate more than the output buffer
//! they return, and none of them know about queues, threads, or the tuner
//! -- that's `pipeline`'s job.

pub mod agc;
pub mod deemph;
pub mod demod;
pub mod lowpass;
pub mod resample;
pub mod rotate;
pub mod squelch;

/// One interleaved I/Q sample block: `[I0, Q0, I1, Q1, ...]`. Always even
/// length end to end.
pub type IqBlock = Vec<i16>;

/// One mono PCM block, audio-rate signed 16-bit samples.
pub type PcmBlock = Vec<i16>;
