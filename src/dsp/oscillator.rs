//! Anti-aliased oscillators using PolyBLEP.

use std::f64::consts::PI;

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A band-limited oscillator with anti-aliasing (PolyBLEP).
///
/// The frequency may change every sample (pitch sweeps, FM); it may even go
/// negative under deep modulation, in which case the phase runs backwards.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            frequency,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        self.frequency / self.sample_rate
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        let inc = self.phase_inc();
        let dt = inc.abs().min(0.5);
        let sample = match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Sawtooth => 2.0 * self.phase - 1.0 - poly_blep(self.phase, dt),
            Waveform::Square => self.square(dt),
            Waveform::Triangle => {
                // Piecewise linear, -1→+1 over [0, 0.5], +1→-1 over [0.5, 1]
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
        };

        self.phase = (self.phase + inc).rem_euclid(1.0);
        sample
    }

    fn square(&self, dt: f64) -> f64 {
        let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, dt);
        value -= poly_blep((self.phase + 0.5) % 1.0, dt);
        value
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) anti-aliasing correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_zero_at_start() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, 44100.0);
        let sample = osc.next_sample();
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn waveforms_stay_in_range() {
        for wf in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Sawtooth,
            Waveform::Triangle,
        ] {
            let mut osc = Oscillator::new(wf, 440.0, 44100.0);
            for _ in 0..44100 {
                let s = osc.next_sample();
                assert!(s.abs() <= 1.5, "{wf:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn negative_frequency_keeps_phase_wrapped() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, -100.0, 44100.0);
        for _ in 0..10_000 {
            let s = osc.next_sample();
            assert!(s.is_finite());
            assert!((0.0..1.0).contains(&osc.phase), "phase escaped: {}", osc.phase);
        }
    }

    #[test]
    fn frequency_sets_period() {
        // 441 Hz at 44.1 kHz completes a cycle every 100 samples.
        let mut osc = Oscillator::new(Waveform::Sine, 441.0, 44100.0);
        for _ in 0..100 {
            osc.next_sample();
        }
        assert!(osc.phase.min(1.0 - osc.phase) < 1e-9, "phase {}", osc.phase);
    }
}
