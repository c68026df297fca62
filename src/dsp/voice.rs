//! Voice — one sounding instance of a synthesis recipe.
//!
//! A voice is a small signal graph: a set of layers, each a source
//! (tone / noise / FM / detuned stack) fed through an optional biquad with an
//! automated cutoff and then an automated gain. Layers are summed.

use std::f64::consts::PI;

use super::automation::Automation;
use super::filter::{BiquadFilter, FilterType};
use super::noise::Noise;
use super::oscillator::{Oscillator, Waveform};

/// Filter cutoff is re-evaluated every this many samples.
const CONTROL_BLOCK: usize = 16;

/// Sound source of a layer.
#[derive(Debug, Clone)]
enum Source {
    /// Oscillator whose pitch follows a curve.
    Tone { osc: Oscillator, pitch: Automation },
    Noise(Noise),
    /// Carrier frequency-modulated by a sine: `base + depth·sin(2π·rate·t)`.
    Fm {
        carrier: Oscillator,
        modulator: Oscillator,
        base: f64,
        depth: f64,
    },
    /// Several free-running oscillators summed (detuned pads).
    Stack(Vec<Oscillator>),
}

impl Source {
    fn next_sample(&mut self, t: f64) -> f64 {
        match self {
            Source::Tone { osc, pitch } => {
                osc.frequency = pitch.value_at(t);
                osc.next_sample()
            }
            Source::Noise(noise) => noise.next_sample(),
            Source::Fm {
                carrier,
                modulator,
                base,
                depth,
            } => {
                carrier.frequency = *base + *depth * modulator.next_sample();
                carrier.next_sample()
            }
            Source::Stack(oscs) => {
                let n = oscs.len().max(1) as f64;
                oscs.iter_mut().map(|o| o.next_sample()).sum::<f64>() / n
            }
        }
    }
}

/// How a layer's filter cutoff moves over time.
#[derive(Debug, Clone)]
enum Cutoff {
    Curve(Automation),
    /// Slow sine LFO around a centre frequency.
    Lfo { centre: f64, depth: f64, rate: f64 },
}

impl Cutoff {
    fn value_at(&self, t: f64) -> f64 {
        match self {
            Cutoff::Curve(curve) => curve.value_at(t),
            Cutoff::Lfo { centre, depth, rate } => centre + depth * (2.0 * PI * rate * t).sin(),
        }
    }
}

#[derive(Debug, Clone)]
struct LayerFilter {
    biquad: BiquadFilter,
    cutoff: Cutoff,
}

/// One source → filter → gain chain.
#[derive(Debug, Clone)]
pub struct Layer {
    source: Source,
    filter: Option<LayerFilter>,
    gain: Automation,
    /// Seconds until this layer stops; `None` sustains until the voice stops.
    length: Option<f64>,
    sample_rate: f64,
}

impl Layer {
    fn with_source(source: Source, sample_rate: f64) -> Self {
        Layer {
            source,
            filter: None,
            gain: Automation::constant(1.0),
            length: None,
            sample_rate,
        }
    }

    /// An oscillator following a pitch curve.
    pub fn tone(waveform: Waveform, pitch: Automation, sample_rate: f64) -> Self {
        let osc = Oscillator::new(waveform, pitch.value_at(0.0), sample_rate);
        Self::with_source(Source::Tone { osc, pitch }, sample_rate)
    }

    /// Seeded white noise.
    pub fn noise(seed: u64, sample_rate: f64) -> Self {
        Self::with_source(Source::Noise(Noise::new(seed)), sample_rate)
    }

    /// FM pair: `carrier` at `base` Hz deviated by `depth` Hz at `rate` Hz.
    pub fn fm(carrier: Waveform, base: f64, rate: f64, depth: f64, sample_rate: f64) -> Self {
        Self::with_source(
            Source::Fm {
                carrier: Oscillator::new(carrier, base, sample_rate),
                modulator: Oscillator::new(Waveform::Sine, rate, sample_rate),
                base,
                depth,
            },
            sample_rate,
        )
    }

    /// Summed oscillators at the given frequencies.
    pub fn stack(waveform: Waveform, frequencies: &[f64], sample_rate: f64) -> Self {
        let oscs = frequencies
            .iter()
            .map(|&f| Oscillator::new(waveform, f, sample_rate))
            .collect();
        Self::with_source(Source::Stack(oscs), sample_rate)
    }

    /// Route through a biquad whose cutoff follows `cutoff`.
    pub fn filtered(mut self, kind: FilterType, cutoff: Automation, q: f64) -> Self {
        let biquad = BiquadFilter::new(kind, cutoff.value_at(0.0), self.sample_rate).with_q(q);
        self.filter = Some(LayerFilter {
            biquad,
            cutoff: Cutoff::Curve(cutoff),
        });
        self
    }

    /// Route through a biquad whose cutoff wobbles around `centre`.
    pub fn lfo_filtered(mut self, kind: FilterType, centre: f64, depth: f64, rate: f64, q: f64) -> Self {
        let biquad = BiquadFilter::new(kind, centre, self.sample_rate).with_q(q);
        self.filter = Some(LayerFilter {
            biquad,
            cutoff: Cutoff::Lfo { centre, depth, rate },
        });
        self
    }

    pub fn gain(mut self, gain: Automation) -> Self {
        self.gain = gain;
        self
    }

    /// Stop this layer after `seconds`.
    pub fn lasting(mut self, seconds: f64) -> Self {
        self.length = Some(seconds);
        self
    }

    pub fn length(&self) -> Option<f64> {
        self.length
    }

    fn next_sample(&mut self, index: usize, t: f64) -> f64 {
        if self.length.is_some_and(|len| t >= len) {
            return 0.0;
        }
        let mut s = self.source.next_sample(t);
        if let Some(f) = &mut self.filter {
            if index % CONTROL_BLOCK == 0 {
                f.biquad.set_frequency(f.cutoff.value_at(t));
            }
            s = f.biquad.process(s);
        }
        s * self.gain.value_at(t)
    }
}

/// A single voice: layered signal graph with a bounded or sustained lifetime.
#[derive(Debug, Clone)]
pub struct Voice {
    layers: Vec<Layer>,
    sample_rate: f64,
    /// Samples rendered so far.
    elapsed: usize,
    /// Total length in samples; `None` for sustained voices.
    length: Option<usize>,
    stopped: bool,
}

impl Voice {
    /// Build a voice. It is one-shot when every layer has a length, and
    /// sustained otherwise.
    pub fn new(layers: Vec<Layer>, sample_rate: f64) -> Self {
        let length = layers
            .iter()
            .map(Layer::length)
            .try_fold(0.0_f64, |acc, len| len.map(|l| acc.max(l)))
            .map(|secs| (secs * sample_rate).round() as usize);
        Voice {
            layers,
            sample_rate,
            elapsed: 0,
            length,
            stopped: false,
        }
    }

    /// Length in seconds, `None` when sustained.
    pub fn duration(&self) -> Option<f64> {
        self.length.map(|n| n as f64 / self.sample_rate)
    }

    pub fn is_sustained(&self) -> bool {
        self.length.is_none()
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        if self.is_finished() {
            return 0.0;
        }
        let index = self.elapsed;
        let t = index as f64 / self.sample_rate;
        let sum = self.layers.iter_mut().map(|l| l.next_sample(index, t)).sum();
        self.elapsed += 1;
        sum
    }

    /// Explicitly release the voice (the only way a sustained voice ends).
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Is this voice done?
    pub fn is_finished(&self) -> bool {
        self.stopped || self.length.is_some_and(|len| self.elapsed >= len)
    }
}
