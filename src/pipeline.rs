//! End-to-end render orchestration.
//!
//! One call, one artifact: validate, resolve assets into a scoped temp
//! directory, compute the timeline, mix audio, rasterize the watermark, then
//! stream composed frames into the encoder. Any stage failure aborts the
//! whole render with a single error; the temp directory is removed on every
//! exit path.

use std::path::{Path, PathBuf};

use tracing::{debug, info_span};

use crate::assets::{AssetResolver, media::MIX_SAMPLE_RATE};
use crate::audio;
use crate::compose::FrameComposer;
use crate::config::RenderConfig;
use crate::encode::{AudioInput, EncodeConfig, FfmpegEncoder};
use crate::error::RenderResult;
use crate::overlay;
use crate::request::RenderRequest;
use crate::timeline;

/// The finished artifact.
#[derive(Clone, Debug)]
pub struct RenderOutcome {
    /// Final video duration in seconds (voice duration clamped to the
    /// configured bounds).
    pub duration_sec: f64,
    /// Path of the written MP4.
    pub out_path: PathBuf,
}

/// Render `request` to an MP4 at `out_path`, blocking until done.
pub fn render(
    request: &RenderRequest,
    out_path: &Path,
    cfg: &RenderConfig,
) -> RenderResult<RenderOutcome> {
    let span = info_span!("render", title = %request.title);
    let _guard = span.enter();

    cfg.validate()?;
    request.validate()?;

    let resolver = AssetResolver::new()?;

    let images = resolver.resolve_images(&request.image_sources(), cfg)?;
    debug!(count = images.len(), "resolved images");

    let voice = resolver.resolve_audio(&request.voice_source()?, "voice.mp3")?;
    debug!(duration_sec = voice.duration_sec(), "resolved voice");

    let music = match request.music_source() {
        Some(source) => {
            let pcm = resolver.resolve_audio(&source, "music.mp3")?;
            debug!(duration_sec = pcm.duration_sec(), "resolved music");
            Some(pcm)
        }
        None => None,
    };

    let tl = timeline::build_timeline(voice.duration_sec(), images.len(), cfg)?;
    debug!(
        duration_sec = tl.duration_sec,
        segments = tl.segments.len(),
        "built timeline"
    );

    let mix = audio::mix_tracks(&voice, music.as_ref(), tl.duration_sec, cfg);
    let mix_path = resolver.dir().join("mix.f32le");
    audio::write_f32le(&mix, &mix_path)?;

    let watermark = match request.watermark_text.as_deref() {
        Some(text) => overlay::render_watermark(text)?,
        None => None,
    };

    let composer = FrameComposer::new(&images, &tl, watermark.as_ref(), cfg.zoom_factor);
    let mut encoder = FfmpegEncoder::start(EncodeConfig {
        width: cfg.target_width,
        height: cfg.target_height,
        fps: cfg.fps,
        threads: cfg.encoder_threads,
        audio: Some(AudioInput {
            path: mix_path,
            sample_rate: MIX_SAMPLE_RATE,
            channels: 2,
        }),
        out_path: out_path.to_path_buf(),
    })?;

    let frames = tl.frame_count();
    for index in 0..frames {
        let frame = composer.compose(index)?;
        encoder.push_frame(&frame)?;
    }
    encoder.finish()?;
    debug!(frames, out = %out_path.display(), "encoded output");

    // `resolver` drops here, removing the temp directory; the same happens on
    // every early `?` return above.
    Ok(RenderOutcome {
        duration_sec: tl.duration_sec,
        out_path: out_path.to_path_buf(),
    })
}
