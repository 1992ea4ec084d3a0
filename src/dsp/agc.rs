//! Software AGC, disabled by default but part of the data model.

const GAIN_DEN_SHIFT: i64 = 15;
const PEAK_TARGET: i64 = 1 << 14;
const GAIN_MAX_MULTIPLIER: i64 = 256;

/// Q-format automatic gain control. `err` is carried as a 64-bit
/// intermediate to avoid overflow, then stored back as a signed 32-bit
/// residual.
#[derive(Debug, Clone, Copy)]
pub struct Agc {
    gain_num: i64,
    gain_den: i64,
    gain_max: i64,
    peak_target: i64,
    attack_step: i64,
    decay_step: i64,
    err: i32,
    peaked: bool,
}

impl Agc {
    pub fn new() -> Self {
        let gain_den = 1i64 << GAIN_DEN_SHIFT;
        Self {
            gain_num: gain_den,
            gain_den,
            gain_max: GAIN_MAX_MULTIPLIER * gain_den,
            peak_target: PEAK_TARGET,
            attack_step: -2,
            decay_step: 1,
            err: 0,
            peaked: false,
        }
    }

    /// Applies AGC to `buf` in place, one sample at a time.
    pub fn process(&mut self, buf: &mut [i16]) {
        for sample in buf.iter_mut() {
            let x = *sample as i64;
            let mut y = x * self.gain_num + self.err as i64;
            self.err = (y % self.gain_den) as i32;
            y /= self.gain_den;

            if !self.peaked && y.abs() > self.peak_target {
                self.peaked = true;
            }

            self.gain_num += if self.peaked {
                self.attack_step
            } else {
                self.decay_step
            };
            self.gain_num = self.gain_num.clamp(self.gain_den, self.gain_max);

            let clamped = y.clamp(-32767, 32767);
            *sample = clamped as i16;
        }
    }
}

impl Default for Agc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant 9: output stays in range and gain stays in its bounds.
    #[test]
    fn agc_output_and_gain_stay_in_bounds() {
        let mut agc = Agc::new();
        let mut buf: Vec<i16> = (0..2000)
            .map(|i| (((i * 37) % 65535) as i32 - 32767) as i16)
            .collect();
        agc.process(&mut buf);
        for &s in &buf {
            assert!((-32767..=32767).contains(&(s as i32)));
        }
        assert!(agc.gain_num >= agc.gain_den);
        assert!(agc.gain_num <= agc.gain_max);
    }

    #[test]
    fn agc_silence_decays_gain_upward() {
        let mut agc = Agc::new();
        let start_gain = agc.gain_num;
        let mut buf = vec![0i16; 100];
        agc.process(&mut buf);
        assert!(agc.gain_num >= start_gain);
    }
}
