//! FM de-emphasis: single-pole IIR with symmetric rounding, matching a
//! 75 microsecond analog time constant.

/// Derives `deemphA` for the given output sample rate.
pub fn deemph_a(rate_out: u32) -> i32 {
    let tau = 75e-6_f64;
    (1.0 / (1.0 - (-1.0 / (rate_out as f64 * tau)).exp())).round() as i32
}

/// Persistent de-emphasis filter state. `deemph_avg` survives across
/// blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct Deemph {
    a: i32,
    avg: i32,
}

impl Deemph {
    pub fn new(a: i32) -> Self {
        Self { a, avg: 0 }
    }

    /// Filters `buf` in place.
    pub fn process(&mut self, buf: &mut [i16]) {
        for sample in buf.iter_mut() {
            let d = *sample as i32 - self.avg;
            if d > 0 {
                self.avg += (d + self.a / 2) / self.a;
            } else {
                self.avg += (d - self.a / 2) / self.a;
            }
            *sample = self.avg as i16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant 7: a constant input drives deemph_avg monotonically
    /// toward that input, never overshooting.
    #[test]
    fn deemph_is_a_contraction_toward_constant_input() {
        let mut f = Deemph::new(deemph_a(48_000));
        let target = 10_000i16;
        let mut buf = [target; 64];
        f.process(&mut buf);
        let mut prev = 0i32;
        for &s in buf.iter() {
            assert!(s as i32 <= target as i32);
            assert!((s as i32) >= prev);
            prev = s as i32;
        }
        assert!(buf[buf.len() - 1] > 0);
    }

    #[test]
    fn deemph_a_is_positive_for_typical_rates() {
        assert!(deemph_a(48_000) > 0);
        assert!(deemph_a(32_000) > 0);
    }

    #[test]
    fn deemph_zero_input_stays_at_zero() {
        let mut f = Deemph::new(deemph_a(48_000));
        let mut buf = [0i16; 16];
        f.process(&mut buf);
        assert_eq!(buf, [0i16; 16]);
    }
}
