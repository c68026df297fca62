//! Instrument library — every sound the core can make, as a recipe.
//!
//! Recipes are fixed signal graphs; nothing is sampled. Durations and the
//! perceptual character of each instrument are stable, the exact curves are
//! tuning.

use serde::{Deserialize, Serialize};

use super::automation::Automation;
use super::filter::FilterType;
use super::oscillator::Waveform;
use super::voice::{Layer, Voice};
use crate::category::Category;
use crate::error::{CoreError, CoreResult};

/// Synthesis recipes: six weapon sounds plus the music kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Instrument {
    Pistol,
    Shotgun,
    Flamethrower,
    Explosive,
    Laser,
    Rifle,
    Kick,
    Snare,
    HiHat,
    Clang,
    Sweep,
    Drone,
}

impl Instrument {
    pub const ALL: [Instrument; 12] = [
        Instrument::Pistol,
        Instrument::Shotgun,
        Instrument::Flamethrower,
        Instrument::Explosive,
        Instrument::Laser,
        Instrument::Rifle,
        Instrument::Kick,
        Instrument::Snare,
        Instrument::HiHat,
        Instrument::Clang,
        Instrument::Sweep,
        Instrument::Drone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Instrument::Pistol => "pistol",
            Instrument::Shotgun => "shotgun",
            Instrument::Flamethrower => "flamethrower",
            Instrument::Explosive => "explosive",
            Instrument::Laser => "laser",
            Instrument::Rifle => "rifle",
            Instrument::Kick => "kick",
            Instrument::Snare => "snare",
            Instrument::HiHat => "hi-hat",
            Instrument::Clang => "clang",
            Instrument::Sweep => "sweep",
            Instrument::Drone => "drone",
        }
    }

    /// Resolve an instrument name or a weapon category key (`"rpg"` plays
    /// the explosive recipe).
    pub fn from_key(key: &str) -> CoreResult<Self> {
        if let Ok(category) = Category::from_key(key) {
            return Ok(Self::for_category(category));
        }
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == key)
            .ok_or_else(|| CoreError::UnknownCategory(key.to_string()))
    }

    /// The shot sound of a weapon category.
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Pistol => Instrument::Pistol,
            Category::Shotgun => Instrument::Shotgun,
            Category::Flamethrower => Instrument::Flamethrower,
            Category::Rifle => Instrument::Rifle,
            Category::Rpg => Instrument::Explosive,
            Category::Laser => Instrument::Laser,
        }
    }

    /// Nominal length in seconds; `None` for the sustained drone.
    pub fn duration(&self) -> Option<f64> {
        match self {
            Instrument::Pistol => Some(0.1),
            Instrument::Shotgun => Some(0.4),
            Instrument::Flamethrower => Some(0.5),
            Instrument::Explosive => Some(1.5),
            Instrument::Laser => Some(0.2),
            Instrument::Rifle => Some(0.06),
            Instrument::Kick => Some(0.5),
            Instrument::Snare => Some(0.2),
            Instrument::HiHat => Some(0.05),
            Instrument::Clang => Some(1.0),
            Instrument::Sweep => Some(0.5),
            Instrument::Drone => None,
        }
    }

    /// Build a fresh voice for this recipe. `seed` feeds any noise source.
    pub fn voice(&self, sample_rate: f64, seed: u64) -> Voice {
        let sr = sample_rate;
        let layers = match self {
            Instrument::Pistol => vec![
                Layer::tone(Waveform::Triangle, Automation::constant(150.0).exp_to(0.01, 0.1), sr)
                    .gain(Automation::constant(0.5).exp_to(0.01, 0.1))
                    .lasting(0.1),
                // Crack
                Layer::noise(seed, sr)
                    .gain(Automation::constant(0.5).exp_to(0.01, 0.05))
                    .lasting(0.05),
            ],
            Instrument::Shotgun => vec![
                Layer::noise(seed, sr)
                    .filtered(
                        FilterType::Lowpass,
                        Automation::constant(1000.0).exp_to(100.0, 0.3),
                        0.707,
                    )
                    .gain(Automation::constant(0.8).exp_to(0.01, 0.4))
                    .lasting(0.4),
            ],
            Instrument::Flamethrower => vec![
                Layer::noise(seed, sr)
                    .filtered(FilterType::Lowpass, Automation::constant(400.0), 0.707)
                    .gain(Automation::constant(0.3).linear_to(0.0, 0.5))
                    .lasting(0.5),
            ],
            Instrument::Explosive => vec![
                Layer::noise(seed, sr)
                    .filtered(
                        FilterType::Lowpass,
                        Automation::constant(800.0).exp_to(50.0, 1.0),
                        0.707,
                    )
                    .gain(Automation::constant(1.0).exp_to(0.01, 1.5))
                    .lasting(1.5),
            ],
            Instrument::Laser => vec![
                Layer::tone(Waveform::Sawtooth, Automation::constant(800.0).exp_to(100.0, 0.2), sr)
                    .gain(Automation::constant(0.3).exp_to(0.01, 0.2))
                    .lasting(0.2),
            ],
            Instrument::Rifle => vec![
                Layer::tone(Waveform::Triangle, Automation::constant(200.0).exp_to(0.01, 0.06), sr)
                    .gain(Automation::constant(0.4).exp_to(0.01, 0.06))
                    .lasting(0.06),
                // Mechanical clack, high-passed for crispness
                Layer::noise(seed, sr)
                    .filtered(FilterType::Highpass, Automation::constant(1000.0), 0.707)
                    .gain(Automation::constant(0.3).exp_to(0.01, 0.04))
                    .lasting(0.04),
            ],
            Instrument::Kick => vec![
                Layer::tone(Waveform::Sine, Automation::constant(150.0).exp_to(0.01, 0.5), sr)
                    .gain(Automation::constant(0.8).exp_to(0.01, 0.5))
                    .lasting(0.5),
            ],
            Instrument::Snare => vec![
                Layer::noise(seed, sr)
                    .filtered(FilterType::Highpass, Automation::constant(1000.0), 0.707)
                    .gain(Automation::constant(0.5).exp_to(0.01, 0.2))
                    .lasting(0.2),
            ],
            Instrument::HiHat => vec![
                Layer::noise(seed, sr)
                    .filtered(FilterType::Highpass, Automation::constant(5000.0), 0.707)
                    .gain(Automation::constant(0.1).exp_to(0.01, 0.05))
                    .lasting(0.05),
            ],
            Instrument::Clang => vec![
                Layer::fm(Waveform::Square, 400.0, 240.0, 500.0, sr)
                    .gain(Automation::constant(0.1).exp_to(0.01, 1.0))
                    .lasting(1.0),
            ],
            Instrument::Sweep => vec![
                Layer::noise(seed, sr)
                    .filtered(
                        FilterType::Bandpass,
                        Automation::constant(1000.0).linear_to(100.0, 0.5),
                        10.0,
                    )
                    .gain(Automation::constant(0.2).exp_to(0.01, 0.5))
                    .lasting(0.5),
            ],
            Instrument::Drone => vec![
                Layer::stack(Waveform::Sawtooth, &[55.0, 55.5], sr)
                    .lfo_filtered(FilterType::Lowpass, 200.0, 100.0, 0.2, 1.0)
                    .gain(Automation::constant(0.15)),
            ],
        };
        Voice::new(layers, sample_rate)
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a one-shot instrument to mono samples (silence for the drone,
/// which never ends on its own).
pub fn render_instrument(instrument: Instrument, sample_rate: f64, seed: u64) -> Vec<f64> {
    let mut voice = instrument.voice(sample_rate, seed);
    let Some(duration) = voice.duration() else {
        return Vec::new();
    };
    let n = (duration * sample_rate).round() as usize;
    (0..n).map(|_| voice.next_sample()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn peak(samples: &[f64]) -> f64 {
        samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()))
    }

    fn rms(samples: &[f64]) -> f64 {
        (samples.iter().map(|s| s * s).sum::<f64>() / samples.len().max(1) as f64).sqrt()
    }

    #[test]
    fn voice_durations_match_table() {
        for inst in Instrument::ALL {
            let v = inst.voice(SR, 1);
            match inst.duration() {
                Some(d) => {
                    let got = v.duration().expect("one-shot voice has a length");
                    assert!((got - d).abs() < 1.0 / SR, "{inst}: {got} vs {d}");
                }
                None => assert!(v.is_sustained(), "{inst} should sustain"),
            }
        }
    }

    #[test]
    fn every_one_shot_is_audible_and_bounded() {
        for inst in Instrument::ALL.into_iter().filter(|i| i.duration().is_some()) {
            let samples = render_instrument(inst, SR, 3);
            let p = peak(&samples);
            assert!(p > 0.005, "{inst} is silent (peak {p})");
            assert!(p < 2.0, "{inst} too loud (peak {p})");
            assert!(samples.iter().all(|s| s.is_finite()), "{inst} produced NaN");
        }
    }

    #[test]
    fn decaying_instruments_end_quieter_than_they_start() {
        for inst in [Instrument::Explosive, Instrument::Kick, Instrument::Flamethrower] {
            let s = render_instrument(inst, SR, 9);
            let q = s.len() / 4;
            assert!(rms(&s[..q]) > rms(&s[3 * q..]), "{inst} does not decay");
        }
    }

    #[test]
    fn weapon_keys_resolve() {
        assert_eq!(Instrument::from_key("rpg"), Ok(Instrument::Explosive));
        assert_eq!(Instrument::from_key("hi-hat"), Ok(Instrument::HiHat));
        assert_eq!(Instrument::from_key("pistol"), Ok(Instrument::Pistol));
        assert_eq!(
            Instrument::from_key("kazoo"),
            Err(CoreError::UnknownCategory("kazoo".to_string()))
        );
    }

    #[test]
    fn hi_hat_is_brighter_than_kick() {
        // Zero-crossing rate as a cheap brightness proxy.
        fn zcr(s: &[f64]) -> f64 {
            s.windows(2).filter(|w| w[0].signum() != w[1].signum()).count() as f64 / s.len() as f64
        }
        let hat = render_instrument(Instrument::HiHat, SR, 4);
        let kick = render_instrument(Instrument::Kick, SR, 4);
        assert!(zcr(&hat) > 10.0 * zcr(&kick));
    }

    #[test]
    fn same_seed_renders_identically() {
        let a = render_instrument(Instrument::Snare, SR, 42);
        let b = render_instrument(Instrument::Snare, SR, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn drone_renders_nothing_offline() {
        assert!(render_instrument(Instrument::Drone, SR, 0).is_empty());
    }
}
