//! Mixer — bus that sums concurrent voices, applies the master volume and
//! soft-clips the result.

/// Summing bus for one render block.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    bus: Vec<f64>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Mixer {
            master_gain: 0.8,
            bus: Vec::new(),
        }
    }

    /// Start a new block of `num_samples` silent samples.
    pub fn clear(&mut self, num_samples: usize) {
        self.bus.clear();
        self.bus.resize(num_samples, 0.0);
    }

    /// Accumulate one voice sample at `index`. Out-of-block indices are dropped.
    pub fn add(&mut self, index: usize, sample: f64) {
        if let Some(slot) = self.bus.get_mut(index) {
            *slot += sample;
        }
    }

    /// Write the finished block into `out` (gain + soft clip). Writes
    /// `min(out.len(), block)` samples.
    pub fn mix_into(&self, out: &mut [f32]) {
        for (dst, &s) in out.iter_mut().zip(&self.bus) {
            *dst = soft_clip(s * self.master_gain) as f32;
        }
    }
}

/// tanh saturation; keeps stacked explosions from hard-clipping.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_block() {
        let mut m = Mixer::new();
        m.clear(128);
        let mut out = vec![1.0_f32; 128];
        m.mix_into(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn sums_voices() {
        let mut m = Mixer::new();
        m.master_gain = 1.0;
        m.clear(3);
        m.add(0, 0.5);
        m.add(0, 0.3);
        m.add(1, 1.0);
        m.add(7, 9.0);
        let mut out = [0.0_f32; 3];
        m.mix_into(&mut out);
        assert!((out[0] as f64 - 0.8_f64.tanh()).abs() < 1e-6);
        assert!((out[1] as f64 - 1.0_f64.tanh()).abs() < 1e-6);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn hot_input_stays_in_range() {
        let mut m = Mixer::new();
        m.master_gain = 1.0;
        m.clear(1);
        m.add(0, 100.0);
        let mut out = [0.0_f32; 1];
        m.mix_into(&mut out);
        assert!(out[0].abs() <= 1.0, "got {}", out[0]);
    }

    #[test]
    fn zero_volume_mutes() {
        let mut m = Mixer::new();
        m.master_gain = 0.0;
        m.clear(2);
        m.add(0, 0.7);
        let mut out = [0.5_f32; 2];
        m.mix_into(&mut out);
        assert_eq!(out, [0.0, 0.0]);
    }
}
