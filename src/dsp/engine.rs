//! Audio Engine — the mixing destination voices are scheduled onto.
//!
//! `AudioOutput` is the contract the scheduler and synthesizer talk to: a
//! clock in seconds, a running/suspended state, and sample-accurate voice
//! start/stop. `AudioEngine` is the in-process implementation: it owns the
//! voices, renders them block by block through the mixer, and drops one-shot
//! voices as soon as they finish.

use super::instrument::Instrument;
use super::mixer::Mixer;
use super::voice::Voice;
use crate::error::{CoreError, CoreResult};

/// Handle to a scheduled voice.
pub type VoiceId = u64;

/// Lowest rate the instrument filters are defined for (WebAudio's minimum).
pub const MIN_SAMPLE_RATE: f64 = 3000.0;

/// Reject sample rates the filter bank cannot run at.
pub fn check_sample_rate(sample_rate: f64) -> CoreResult<()> {
    if !(sample_rate.is_finite() && sample_rate >= MIN_SAMPLE_RATE) {
        return Err(CoreError::InvalidConfig(format!(
            "sample rate must be at least {MIN_SAMPLE_RATE} Hz, got {sample_rate}"
        )));
    }
    Ok(())
}

/// Whether the output clock is advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Running,
    /// Clock frozen, output silent; scheduled voices wait.
    Suspended,
}

/// An abstract mixing destination.
pub trait AudioOutput {
    /// Audio clock in seconds.
    fn current_time(&self) -> f64;

    fn state(&self) -> AudioState;

    /// Try to (re)start the clock.
    fn resume(&mut self) -> CoreResult<()>;

    /// Schedule `instrument` to start at audio time `at` (seconds). Times in
    /// the past start immediately.
    fn start_voice(&mut self, instrument: Instrument, at: f64) -> VoiceId;

    /// Release a voice. Unknown or finished ids are ignored.
    fn stop_voice(&mut self, id: VoiceId);

    /// True while the voice is scheduled or audible.
    fn is_sounding(&self, id: VoiceId) -> bool;

    /// Master volume in [0, 1].
    fn set_master_volume(&mut self, volume: f64);
}

/// A voice waiting for, or past, its start sample.
struct ScheduledVoice {
    id: VoiceId,
    instrument: Instrument,
    start_sample: u64,
    voice: Voice,
}

/// The in-process audio destination.
pub struct AudioEngine {
    pub sample_rate: f64,
    state: AudioState,
    /// Whether a playback device is available to resume onto.
    device_ready: bool,
    /// Samples rendered since creation.
    position: u64,
    voices: Vec<ScheduledVoice>,
    next_id: VoiceId,
    /// Base seed for noise sources; each voice derives its own from its id.
    seed: u64,
    mixer: Mixer,
    block_size: usize,
}

impl AudioEngine {
    pub fn new(sample_rate: f64) -> CoreResult<Self> {
        check_sample_rate(sample_rate)?;
        Ok(AudioEngine {
            sample_rate,
            state: AudioState::Running,
            device_ready: true,
            position: 0,
            voices: Vec::new(),
            next_id: 1,
            seed: 0x5EED,
            mixer: Mixer::new(),
            block_size: 128,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Freeze the clock (what a browser does before a user gesture).
    pub fn suspend(&mut self) {
        self.state = AudioState::Suspended;
    }

    /// Lose the playback device; the engine suspends and `resume` fails
    /// until `attach_device` is called.
    pub fn detach_device(&mut self) {
        self.device_ready = false;
        self.state = AudioState::Suspended;
    }

    pub fn attach_device(&mut self) {
        self.device_ready = true;
    }

    /// Number of scheduled or audible voices.
    pub fn voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.voice.is_finished()).count()
    }

    /// Number of scheduled or audible voices of one instrument.
    pub fn active_count(&self, instrument: Instrument) -> usize {
        self.voices
            .iter()
            .filter(|v| v.instrument == instrument && !v.voice.is_finished())
            .count()
    }

    /// Scheduled start times (seconds) of live voices of one instrument, sorted.
    pub fn start_times(&self, instrument: Instrument) -> Vec<f64> {
        let mut times: Vec<f64> = self
            .voices
            .iter()
            .filter(|v| v.instrument == instrument && !v.voice.is_finished())
            .map(|v| v.start_sample as f64 / self.sample_rate)
            .collect();
        times.sort_by(f64::total_cmp);
        times
    }

    /// Render the next `num_samples` of mono output.
    ///
    /// While suspended this returns silence and the clock does not move.
    pub fn render(&mut self, num_samples: usize) -> Vec<f32> {
        let mut output = vec![0.0_f32; num_samples];
        if self.state == AudioState::Suspended {
            return output;
        }

        let mut block_start = 0;
        while block_start < num_samples {
            let block_end = (block_start + self.block_size).min(num_samples);
            let this_block = block_end - block_start;
            let abs_start = self.position + block_start as u64;
            let abs_end = abs_start + this_block as u64;

            self.mixer.clear(this_block);
            for sv in self.voices.iter_mut() {
                if sv.start_sample >= abs_end || sv.voice.is_finished() {
                    continue;
                }
                // Voices start on their exact sample, not on the block boundary.
                let offset = sv.start_sample.saturating_sub(abs_start) as usize;
                for i in offset..this_block {
                    self.mixer.add(i, sv.voice.next_sample());
                }
            }

            self.mixer.mix_into(&mut output[block_start..block_end]);

            // One-shot voices release their resources as soon as they finish.
            self.voices.retain(|v| !v.voice.is_finished());
            block_start = block_end;
        }

        self.position += num_samples as u64;
        output
    }

    /// Render `seconds` of output.
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<f32> {
        let n = (seconds * self.sample_rate).round().max(0.0) as usize;
        self.render(n)
    }
}

impl AudioOutput for AudioEngine {
    fn current_time(&self) -> f64 {
        self.position as f64 / self.sample_rate
    }

    fn state(&self) -> AudioState {
        self.state
    }

    fn resume(&mut self) -> CoreResult<()> {
        if !self.device_ready {
            return Err(CoreError::AudioUnavailable("no playback device".to_string()));
        }
        if self.state == AudioState::Suspended {
            log::debug!("audio output resumed at {:.3}s", self.current_time());
        }
        self.state = AudioState::Running;
        Ok(())
    }

    fn start_voice(&mut self, instrument: Instrument, at: f64) -> VoiceId {
        let id = self.next_id;
        self.next_id += 1;
        let requested = (at.max(0.0) * self.sample_rate).round() as u64;
        let start_sample = requested.max(self.position);
        let voice = instrument.voice(self.sample_rate, self.seed ^ id.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.voices.push(ScheduledVoice {
            id,
            instrument,
            start_sample,
            voice,
        });
        id
    }

    fn stop_voice(&mut self, id: VoiceId) {
        if let Some(pos) = self.voices.iter().position(|v| v.id == id) {
            self.voices.swap_remove(pos);
        }
    }

    fn is_sounding(&self, id: VoiceId) -> bool {
        self.voices
            .iter()
            .any(|v| v.id == id && !v.voice.is_finished())
    }

    fn set_master_volume(&mut self, volume: f64) {
        self.mixer.master_gain = volume.clamp(0.0, 1.0);
    }
}
