use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// Sample rate all audio is decoded and mixed at.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Decoded audio as interleaved f32 PCM.
#[derive(Clone, Debug)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one frame spans all channels).
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }

    /// Track duration in seconds.
    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode any audio container/codec ffmpeg understands into stereo f32 PCM at
/// `sample_rate`.
///
/// We use the system `ffmpeg` binary rather than native bindings to avoid
/// FFmpeg dev header/lib requirements. A file with no decodable audio stream
/// is an error here: both narration and music must carry audio.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> RenderResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| RenderError::decode(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(RenderError::decode(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(RenderError::decode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    if out.stdout.is_empty() {
        return Err(RenderError::decode(format!(
            "'{}' contains no audio samples",
            path.display()
        )));
    }

    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: pcm,
    })
}
