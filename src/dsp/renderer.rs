//! WAV renderer — offline export of a single instrument to WAV bytes.

use super::engine::check_sample_rate;
use super::instrument::{Instrument, render_instrument};
use crate::error::CoreResult;

/// Seed used for noise when exporting; keeps exported files reproducible.
const EXPORT_SEED: u64 = 0x00C0_FFEE;

/// Render one instrument to a WAV file as bytes (16-bit stereo PCM).
///
/// The drone has no natural end and exports as an empty data chunk.
pub fn render_wav(instrument: Instrument, sample_rate: u32) -> CoreResult<Vec<u8>> {
    check_sample_rate(sample_rate as f64)?;
    let mono = render_instrument(instrument, sample_rate as f64, EXPORT_SEED);
    let pcm = to_stereo_i16(&mono);
    Ok(encode_wav(&pcm, sample_rate, 2))
}

/// Duplicate mono samples into interleaved stereo i16.
fn to_stereo_i16(mono: &[f64]) -> Vec<i16> {
    let mut stereo = Vec::with_capacity(mono.len() * 2);
    for &s in mono {
        let sample = (s * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        stereo.push(sample); // L
        stereo.push(sample); // R
    }
    stereo
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_size(wav: &[u8]) -> u32 {
        u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]])
    }

    #[test]
    fn wav_header_valid() {
        let wav = render_wav(Instrument::Pistol, 44100).expect("valid rate");
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 44100);
        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 2);
    }

    #[test]
    fn wav_length_follows_instrument_duration() {
        // 0.5 s kick at 22050 Hz = 11025 frames * 2 channels * 2 bytes.
        let wav = render_wav(Instrument::Kick, 22050).expect("valid rate");
        assert_eq!(data_size(&wav), 44100);
        assert_eq!(wav.len(), 44 + 44100);
    }

    #[test]
    fn exported_audio_is_not_silent() {
        let wav = render_wav(Instrument::Laser, 22050).expect("valid rate");
        let has_nonzero = wav[44..]
            .chunks_exact(2)
            .any(|b| i16::from_le_bytes([b[0], b[1]]) != 0);
        assert!(has_nonzero);
    }

    #[test]
    fn drone_exports_empty_data_chunk() {
        let wav = render_wav(Instrument::Drone, 44100).expect("valid rate");
        assert_eq!(data_size(&wav), 0);
        assert_eq!(wav.len(), 44);
    }

    #[test]
    fn unusable_sample_rates_are_rejected() {
        for sr in [0, 16, 2999] {
            assert!(matches!(
                render_wav(Instrument::Snare, sr),
                Err(crate::error::CoreError::InvalidConfig(_))
            ));
        }
        assert!(render_wav(Instrument::Snare, 3000).is_ok());
    }
}
