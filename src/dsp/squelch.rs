//! RMS-based power squelch and the threshold derivation from a user dB
//! value.

/// DC-corrected root-mean-square of `samples`, sampling every `step`-th
/// element (the spec walks only the I channel, `step = 1`).
pub fn rms(samples: &[i16], step: usize) -> i32 {
    let mut t: f64 = 0.0;
    let mut p: f64 = 0.0;
    let mut i = 0;
    while i < samples.len() {
        let s = samples[i] as f64;
        t += s;
        p += s * s;
        i += step;
    }
    let l = samples.len() as f64;
    let dc = (t * step as f64) / l;
    let res = 2.0 * t * dc - dc * dc * l;
    ((p - res) / l).sqrt() as i32
}

/// Converts a user-facing squelch dB value into the integer RMS threshold
/// the demodulator compares against. `gain_db` is `None` for auto-gain
/// (treated as 50 dB, per the spec).
pub fn squelch_to_rms(db: i32, downsample: u32, gain_db: Option<i32>) -> i32 {
    if db == 0 {
        return 0;
    }
    let linear = 10f64.powf(db as f64 / 20.0);
    let gain = gain_db.unwrap_or(50);
    let gain_linear = 10f64.powf((50 - gain) as f64 / 20.0);
    let downsample_factor = 1024.0 / downsample as f64;
    (linear / gain_linear / downsample_factor) as i32 + 1
}

/// Tracks consecutive squelched blocks so the hop decision in the
/// demodulator can fire after a short run of silence.
#[derive(Debug, Default, Clone, Copy)]
pub struct SquelchState {
    pub hits: i32,
}

impl SquelchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the squelch gate to `buf`: zeroes it and bumps the hit
    /// counter if the RMS is below `level`, otherwise resets the counter.
    /// Returns whether this block was squelched. A `level` of 0 disables
    /// squelch entirely and always returns `false`.
    pub fn apply(&mut self, buf: &mut [i16], level: i32) -> bool {
        if level <= 0 {
            return false;
        }
        if rms(buf, 1) < level {
            self.hits += 1;
            buf.fill(0);
            true
        } else {
            self.hits = 0;
            false
        }
    }

    /// Returns `true` (and re-arms the edge by clamping `hits`) exactly
    /// once per run of squelched blocks once `hits` exceeds
    /// `conseq_squelch`.
    pub fn should_hop(&mut self, level: i32, conseq_squelch: i32) -> bool {
        if level > 0 && self.hits > conseq_squelch {
            self.hits = conseq_squelch + 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant 8: matches the plain formula within +/-1 LSB.
    #[test]
    fn rms_matches_plain_formula() {
        let samples: Vec<i16> = (0..300)
            .map(|i| (((i * 2654435761u32) % 2001) as i32 - 1000) as i16)
            .collect();
        let l = samples.len() as f64;
        let t: f64 = samples.iter().map(|s| *s as f64).sum();
        let p: f64 = samples.iter().map(|s| (*s as f64).powi(2)).sum();
        let plain = ((p - t * t / l) / l).sqrt() as i32;
        let got = rms(&samples, 1);
        assert!((got - plain).abs() <= 1, "got {} plain {}", got, plain);
    }

    #[test]
    fn rms_of_silence_is_zero() {
        let samples = vec![0i16; 512];
        assert_eq!(rms(&samples, 1), 0);
    }

    /// Invariant 10: across exactly `conseq_squelch + 1` consecutive
    /// squelched blocks, exactly one hop signal fires -- on the last of
    /// them -- and `hits` ends up clamped to `conseq_squelch + 1`.
    #[test]
    fn hop_fires_once_after_conseq_squelch_run() {
        let mut st = SquelchState::new();
        let level = 50;
        let conseq = 10;
        let mut hop_count = 0;
        for i in 0..(conseq + 1) {
            let mut buf = vec![0i16; 64];
            st.apply(&mut buf, level);
            let hopped = st.should_hop(level, conseq);
            if hopped {
                hop_count += 1;
                assert_eq!(i, conseq, "hop fired before the threshold run completed");
            }
        }
        assert_eq!(hop_count, 1);
        assert_eq!(st.hits, conseq + 1);
    }

    #[test]
    fn squelch_to_rms_disabled_at_zero_db() {
        assert_eq!(squelch_to_rms(0, 42, None), 0);
    }
}
