//! Audio mixing: narration plus optional looped background music.
//!
//! The mix buffer is allocated at the full timeline duration, so a voice
//! shorter than the clamped duration leaves a silence-padded tail and the
//! audio stream always matches the video length exactly.

use std::path::Path;

use crate::assets::media::AudioPcm;
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};

/// Mix narration and optional music into interleaved stereo f32 covering
/// exactly `duration_sec`.
///
/// Voice plays at unity gain from t=0; when music is present the voice gets
/// the configured fade-in/fade-out (measured against the voice's own length)
/// and the music is attenuated, looped when shorter than the duration, or
/// trimmed when longer. Tracks combine additively and the result is clamped
/// to [-1, 1].
pub fn mix_tracks(
    voice: &AudioPcm,
    music: Option<&AudioPcm>,
    duration_sec: f64,
    cfg: &RenderConfig,
) -> Vec<f32> {
    let sample_rate = voice.sample_rate;
    let total_frames = (duration_sec * f64::from(sample_rate)).round().max(0.0) as usize;
    let mut out = vec![0.0f32; total_frames * 2];

    // Fades apply to the voice only when it shares the mix with music.
    let (fade_in, fade_out) = if music.is_some() {
        (cfg.voice_fade_in_sec, cfg.voice_fade_out_sec)
    } else {
        (0.0, 0.0)
    };
    mix_voice(&mut out, voice, fade_in, fade_out);

    if let Some(music) = music {
        mix_music(&mut out, music, cfg.music_volume);
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

fn mix_voice(out: &mut [f32], voice: &AudioPcm, fade_in_sec: f64, fade_out_sec: f64) {
    let total_frames = out.len() / 2;
    let src_frames = voice.frame_count();
    let voice_len_sec = voice.duration_sec();
    let channels = usize::from(voice.channels.max(1));

    for f in 0..src_frames.min(total_frames) {
        let rel_sec = f as f64 / f64::from(voice.sample_rate);
        let mut gain = 1.0f32;
        if fade_in_sec > 0.0 {
            gain *= ((rel_sec / fade_in_sec).clamp(0.0, 1.0)) as f32;
        }
        if fade_out_sec > 0.0 {
            let remaining = (voice_len_sec - rel_sec).max(0.0);
            gain *= ((remaining / fade_out_sec).clamp(0.0, 1.0)) as f32;
        }
        let (l, r) = frame_lr(&voice.interleaved_f32, f, channels);
        out[f * 2] += l * gain;
        out[f * 2 + 1] += r * gain;
    }
}

/// Music fills the entire output window: a shorter source loops from its
/// start (frame-index modulo), a longer one is trimmed.
fn mix_music(out: &mut [f32], music: &AudioPcm, volume: f32) {
    let total_frames = out.len() / 2;
    let src_frames = music.frame_count();
    if src_frames == 0 || volume <= 0.0 {
        return;
    }
    let channels = usize::from(music.channels.max(1));

    for f in 0..total_frames {
        let src_frame = f % src_frames;
        let (l, r) = frame_lr(&music.interleaved_f32, src_frame, channels);
        out[f * 2] += l * volume;
        out[f * 2 + 1] += r * volume;
    }
}

fn frame_lr(src: &[f32], frame: usize, channels: usize) -> (f32, f32) {
    if channels == 1 {
        let v = src[frame];
        (v, v)
    } else {
        (src[frame * channels], src[frame * channels + 1])
    }
}

/// Write interleaved f32 PCM samples as a raw little-endian `.f32le` file,
/// the format handed to the encoder's audio input.
pub fn write_f32le(samples: &[f32], out_path: &Path) -> RenderResult<()> {
    let mut bytes = Vec::<u8>::with_capacity(samples.len() * 4);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        RenderError::encode(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}
