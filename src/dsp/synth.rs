//! VoiceSynthesizer — turns trigger keys into voices on an audio output.

use super::engine::{AudioOutput, AudioState, VoiceId};
use super::instrument::Instrument;
use crate::error::CoreResult;

/// Plays instruments by key on any [`AudioOutput`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VoiceSynthesizer;

impl VoiceSynthesizer {
    pub fn new() -> Self {
        VoiceSynthesizer
    }

    /// Play the instrument named by `key` (a weapon category or instrument
    /// name) right now.
    ///
    /// Unknown keys fail with `UnknownCategory` before anything is touched.
    pub fn play<O: AudioOutput + ?Sized>(&self, key: &str, out: &mut O) -> CoreResult<VoiceId> {
        let instrument = Instrument::from_key(key)?;
        let now = out.current_time();
        Ok(self.play_at(instrument, now, out))
    }

    /// Schedule `instrument` at audio time `at`.
    ///
    /// A suspended output is resumed first. If it cannot be, the voice is
    /// still queued and will sound whenever the output comes back.
    pub fn play_at<O: AudioOutput + ?Sized>(&self, instrument: Instrument, at: f64, out: &mut O) -> VoiceId {
        ensure_running(out);
        out.start_voice(instrument, at)
    }
}

/// Resume a suspended output, logging (not propagating) failure.
pub(crate) fn ensure_running<O: AudioOutput + ?Sized>(out: &mut O) {
    if out.state() == AudioState::Suspended {
        if let Err(e) = out.resume() {
            log::warn!("audio output unavailable, continuing without sound: {e}");
        }
    }
}
