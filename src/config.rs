use crate::error::{RenderError, RenderResult};

/// Process-wide render settings.
///
/// Passed explicitly into the pipeline so concurrent renders with different
/// settings stay independent; there is no ambient global configuration.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Output frame width in pixels.
    pub target_width: u32,
    /// Output frame height in pixels.
    pub target_height: u32,
    /// Lower bound on the final video duration in seconds.
    pub min_duration_sec: f64,
    /// Upper bound on the final video duration in seconds.
    pub max_duration_sec: f64,
    /// Output frames per second.
    pub fps: u32,
    /// Worker thread count handed to the encoder.
    pub encoder_threads: u32,
    /// End scale of the per-segment zoom-in animation.
    pub zoom_factor: f64,
    /// Gain applied to background music before mixing.
    pub music_volume: f32,
    /// Voice fade-in, applied only when music is mixed in.
    pub voice_fade_in_sec: f64,
    /// Voice fade-out, applied only when music is mixed in.
    pub voice_fade_out_sec: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_width: 1080,
            target_height: 1920,
            min_duration_sec: 50.0,
            max_duration_sec: 60.0,
            fps: 30,
            encoder_threads: 4,
            zoom_factor: 1.06,
            music_volume: 0.12,
            voice_fade_in_sec: 0.05,
            voice_fade_out_sec: 0.2,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(RenderError::input("target width/height must be non-zero"));
        }
        if !self.target_width.is_multiple_of(2) || !self.target_height.is_multiple_of(2) {
            // The encoder targets yuv420p output for maximum compatibility.
            return Err(RenderError::input(
                "target width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps == 0 {
            return Err(RenderError::input("fps must be non-zero"));
        }
        if !self.min_duration_sec.is_finite()
            || !self.max_duration_sec.is_finite()
            || self.min_duration_sec <= 0.0
            || self.max_duration_sec <= 0.0
        {
            return Err(RenderError::input("duration bounds must be positive"));
        }
        if self.min_duration_sec > self.max_duration_sec {
            return Err(RenderError::input(
                "min_duration_sec must be <= max_duration_sec",
            ));
        }
        if !self.zoom_factor.is_finite() || self.zoom_factor < 1.0 {
            return Err(RenderError::input("zoom_factor must be >= 1.0"));
        }
        if self.music_volume < 0.0 {
            return Err(RenderError::input("music_volume must be >= 0"));
        }
        Ok(())
    }

    /// Target width/height aspect ratio.
    pub fn target_ratio(&self) -> f64 {
        f64::from(self.target_width) / f64::from(self.target_height)
    }
}
