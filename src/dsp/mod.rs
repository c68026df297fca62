//! DSP — procedural synthesis for every sound the core makes.
//!
//! Leaves first: oscillators, noise, filters and automation curves build
//! layered voices; `instrument` holds the recipes; `engine` is the mixing
//! destination the scheduler and synthesizer target; `renderer` exports
//! single instruments to WAV.

pub mod automation;
pub mod engine;
pub mod filter;
pub mod instrument;
pub mod mixer;
pub mod noise;
pub mod oscillator;
pub mod renderer;
pub mod synth;
pub mod voice;

pub use engine::{AudioEngine, AudioOutput, AudioState, VoiceId};
pub use instrument::{Instrument, render_instrument};
pub use synth::VoiceSynthesizer;
