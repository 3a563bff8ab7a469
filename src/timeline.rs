//! Timing and composition policy.
//!
//! The final duration is the voice duration clamped to the configured bounds;
//! images partition it into equal-length segments in supplied order, each
//! carrying a continuous zoom-in local to that segment.

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};

/// The time window during which exactly one image is shown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Index into the resolved image list.
    pub image: usize,
    /// Segment start on the timeline, seconds.
    pub start_sec: f64,
    /// Segment length, seconds (identical for every segment).
    pub duration_sec: f64,
}

/// The composed background track plan: ordered segments covering
/// `[0, duration_sec)` with no gaps or overlaps.
#[derive(Clone, Debug)]
pub struct Timeline {
    pub duration_sec: f64,
    pub fps: u32,
    pub segments: Vec<Segment>,
}

/// Clamp the voice duration into the configured `[min, max]` window.
///
/// A hard clamp: voice audio itself is never stretched or truncated to match.
pub fn clamp_duration(voice_duration_sec: f64, cfg: &RenderConfig) -> f64 {
    voice_duration_sec.clamp(cfg.min_duration_sec, cfg.max_duration_sec)
}

/// Per-segment zoom-in scale at `t_in_segment` seconds into the segment.
///
/// Ramps linearly from 1.0 at the segment start to `zoom_factor` at its end,
/// oblivious to global timeline time.
pub fn zoom_scale(t_in_segment: f64, segment_duration_sec: f64, zoom_factor: f64) -> f64 {
    1.0 + (zoom_factor - 1.0) * (t_in_segment / segment_duration_sec.max(0.001))
}

/// Build the timeline for `image_count` images over the clamped duration.
pub fn build_timeline(
    voice_duration_sec: f64,
    image_count: usize,
    cfg: &RenderConfig,
) -> RenderResult<Timeline> {
    if image_count == 0 {
        return Err(RenderError::input(
            "cannot build a timeline without images",
        ));
    }
    let total = clamp_duration(voice_duration_sec, cfg);
    let per_segment = total / image_count as f64;
    let segments = (0..image_count)
        .map(|i| Segment {
            image: i,
            start_sec: per_segment * i as f64,
            duration_sec: per_segment,
        })
        .collect();
    Ok(Timeline {
        duration_sec: total,
        fps: cfg.fps,
        segments,
    })
}

impl Timeline {
    /// Number of output frames covering the full duration.
    pub fn frame_count(&self) -> u64 {
        (self.duration_sec * f64::from(self.fps)).ceil().max(0.0) as u64
    }

    /// The segment visible at timeline time `t_sec`.
    ///
    /// Times past the end resolve to the last segment.
    pub fn segment_at(&self, t_sec: f64) -> &Segment {
        // Segments are uniform, so the lookup is a division.
        let per_segment = self.segments[0].duration_sec;
        let idx = if per_segment > 0.0 {
            ((t_sec.max(0.0) / per_segment) as usize).min(self.segments.len() - 1)
        } else {
            0
        };
        &self.segments[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RenderConfig {
        RenderConfig::default()
    }

    #[test]
    fn duration_clamps_to_bounds() {
        // Property: finalDuration == clamp(d, MIN, MAX) for any voice length.
        assert_eq!(clamp_duration(45.0, &cfg()), 50.0);
        assert_eq!(clamp_duration(55.0, &cfg()), 55.0);
        assert_eq!(clamp_duration(70.0, &cfg()), 60.0);
        assert_eq!(clamp_duration(0.0, &cfg()), 50.0);
    }

    #[test]
    fn segments_partition_duration_evenly() {
        for n in 1..=12usize {
            let tl = build_timeline(55.0, n, &cfg()).unwrap();
            assert_eq!(tl.segments.len(), n);
            let expected = tl.duration_sec / n as f64;
            let mut sum = 0.0;
            for (i, seg) in tl.segments.iter().enumerate() {
                assert_eq!(seg.image, i);
                assert_eq!(seg.duration_sec, expected);
                assert!((seg.start_sec - expected * i as f64).abs() < 1e-9);
                sum += seg.duration_sec;
            }
            assert!((sum - tl.duration_sec).abs() < 1e-9);
        }
    }

    #[test]
    fn three_images_under_min_duration() {
        // 45s voice clamps to 50s; three segments of 50/3 each.
        let tl = build_timeline(45.0, 3, &cfg()).unwrap();
        assert_eq!(tl.duration_sec, 50.0);
        assert!((tl.segments[0].duration_sec - 50.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_images_is_an_input_error() {
        assert!(build_timeline(55.0, 0, &cfg()).is_err());
    }

    #[test]
    fn zoom_ramps_from_one_to_factor() {
        assert_eq!(zoom_scale(0.0, 10.0, 1.06), 1.0);
        assert!((zoom_scale(10.0, 10.0, 1.06) - 1.06).abs() < 1e-12);
        assert!((zoom_scale(5.0, 10.0, 1.06) - 1.03).abs() < 1e-12);
    }

    #[test]
    fn zoom_guards_degenerate_segment_lengths() {
        // Mirrors the max(0.001, duration) guard; never divides by zero.
        let s = zoom_scale(0.0005, 0.0, 1.06);
        assert!(s.is_finite());
    }

    #[test]
    fn segment_lookup_covers_boundaries() {
        let tl = build_timeline(60.0, 3, &cfg()).unwrap();
        assert_eq!(tl.segment_at(0.0).image, 0);
        assert_eq!(tl.segment_at(19.99).image, 0);
        assert_eq!(tl.segment_at(20.0).image, 1);
        assert_eq!(tl.segment_at(59.99).image, 2);
        // Past the end resolves to the last segment.
        assert_eq!(tl.segment_at(60.0).image, 2);
    }

    #[test]
    fn frame_count_rounds_up() {
        let tl = build_timeline(50.0, 1, &cfg()).unwrap();
        assert_eq!(tl.frame_count(), 1500);
        let mut custom = cfg();
        custom.min_duration_sec = 0.05;
        custom.max_duration_sec = 0.05;
        let tl = build_timeline(0.01, 1, &custom).unwrap();
        assert_eq!(tl.frame_count(), 2);
    }
}
