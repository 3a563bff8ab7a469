//! CPU frame composition.
//!
//! Each output frame samples the active segment's image through a centered
//! zoom window with bilinear filtering, then blends the watermark sprite
//! source-over at its fixed bottom-right position.

use crate::assets::fit::ResolvedImage;
use crate::error::{RenderError, RenderResult};
use crate::overlay::{
    WATERMARK_MARGIN_BOTTOM, WATERMARK_MARGIN_RIGHT, WATERMARK_OPACITY, WatermarkSprite,
};
use crate::timeline::{Timeline, zoom_scale};

/// A composed output frame: straight RGBA8 with opaque alpha, row-major.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Composes frames for one timeline.
pub struct FrameComposer<'a> {
    images: &'a [ResolvedImage],
    timeline: &'a Timeline,
    watermark: Option<&'a WatermarkSprite>,
    zoom_factor: f64,
}

impl<'a> FrameComposer<'a> {
    pub fn new(
        images: &'a [ResolvedImage],
        timeline: &'a Timeline,
        watermark: Option<&'a WatermarkSprite>,
        zoom_factor: f64,
    ) -> Self {
        Self {
            images,
            timeline,
            watermark,
            zoom_factor,
        }
    }

    /// Compose the frame at `frame_index`.
    pub fn compose(&self, frame_index: u64) -> RenderResult<Frame> {
        let t = frame_index as f64 / f64::from(self.timeline.fps);
        let segment = self.timeline.segment_at(t);
        let image = self.images.get(segment.image).ok_or_else(|| {
            RenderError::input(format!(
                "segment references image {} but only {} were resolved",
                segment.image,
                self.images.len()
            ))
        })?;

        let local_t = (t - segment.start_sec).max(0.0);
        let scale = zoom_scale(local_t, segment.duration_sec, self.zoom_factor);
        let mut frame = sample_zoomed(image, scale);

        if let Some(watermark) = self.watermark {
            blend_watermark(&mut frame, watermark, WATERMARK_OPACITY);
        }
        Ok(frame)
    }
}

/// Sample `image` scaled by `scale` about its center into a full frame.
///
/// A scale of 1.0 reproduces the image exactly; larger scales read a smaller
/// centered window, giving the continuous zoom-in.
fn sample_zoomed(image: &ResolvedImage, scale: f64) -> Frame {
    let w = image.width;
    let h = image.height;
    let mut data = vec![255u8; (w as usize) * (h as usize) * 4];

    let inv = 1.0 / scale.max(1.0);
    let cx = f64::from(w) / 2.0;
    let cy = f64::from(h) / 2.0;

    for y in 0..h {
        let sy = cy + (f64::from(y) + 0.5 - cy) * inv - 0.5;
        for x in 0..w {
            let sx = cx + (f64::from(x) + 0.5 - cx) * inv - 0.5;
            let (r, g, b) = bilinear_rgb(image, sx, sy);
            let off = ((y as usize) * (w as usize) + (x as usize)) * 4;
            data[off] = r;
            data[off + 1] = g;
            data[off + 2] = b;
        }
    }

    Frame {
        width: w,
        height: h,
        data,
    }
}

fn bilinear_rgb(image: &ResolvedImage, sx: f64, sy: f64) -> (u8, u8, u8) {
    let max_x = f64::from(image.width - 1);
    let max_y = f64::from(image.height - 1);
    let sx = sx.clamp(0.0, max_x);
    let sy = sy.clamp(0.0, max_y);

    let x0 = sx.floor() as usize;
    let y0 = sy.floor() as usize;
    let x1 = (x0 + 1).min(image.width as usize - 1);
    let y1 = (y0 + 1).min(image.height as usize - 1);
    let fx = (sx - x0 as f64) as f32;
    let fy = (sy - y0 as f64) as f32;

    let stride = image.width as usize * 4;
    let px = |x: usize, y: usize, c: usize| -> f32 { f32::from(image.rgba8[y * stride + x * 4 + c]) };

    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let top = px(x0, y0, c) + (px(x1, y0, c) - px(x0, y0, c)) * fx;
        let bottom = px(x0, y1, c) + (px(x1, y1, c) - px(x0, y1, c)) * fx;
        *slot = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    (out[0], out[1], out[2])
}

/// Source-over blend of the premultiplied watermark sprite, bottom-right with
/// the fixed margins, at `opacity`.
fn blend_watermark(frame: &mut Frame, sprite: &WatermarkSprite, opacity: f32) {
    let x0 = frame.width as i64 - i64::from(WATERMARK_MARGIN_RIGHT) - i64::from(sprite.width);
    let y0 = frame.height as i64 - i64::from(WATERMARK_MARGIN_BOTTOM) - i64::from(sprite.height);
    let stride = frame.width as usize * 4;
    let sprite_stride = sprite.width as usize * 4;

    for sy in 0..sprite.height as i64 {
        let dy = y0 + sy;
        if dy < 0 || dy >= i64::from(frame.height) {
            continue;
        }
        for sx in 0..sprite.width as i64 {
            let dx = x0 + sx;
            if dx < 0 || dx >= i64::from(frame.width) {
                continue;
            }
            let s_off = (sy as usize) * sprite_stride + (sx as usize) * 4;
            let a = f32::from(sprite.rgba8_premul[s_off + 3]) / 255.0 * opacity;
            if a <= 0.0 {
                continue;
            }
            let d_off = (dy as usize) * stride + (dx as usize) * 4;
            for c in 0..3 {
                let src = f32::from(sprite.rgba8_premul[s_off + c]) * opacity;
                let dst = f32::from(frame.data[d_off + c]);
                frame.data[d_off + c] = (src + dst * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::timeline::build_timeline;

    fn gradient_image(w: u32, h: u32) -> ResolvedImage {
        let mut rgba8 = vec![255u8; (w as usize) * (h as usize) * 4];
        for y in 0..h as usize {
            for x in 0..w as usize {
                let off = (y * w as usize + x) * 4;
                rgba8[off] = (x * 7 % 256) as u8;
                rgba8[off + 1] = (y * 11 % 256) as u8;
                rgba8[off + 2] = 33;
            }
        }
        ResolvedImage {
            width: w,
            height: h,
            rgba8,
            path: std::path::PathBuf::from("test.jpg"),
        }
    }

    #[test]
    fn scale_one_reproduces_the_source() {
        let img = gradient_image(16, 16);
        let frame = sample_zoomed(&img, 1.0);
        assert_eq!(frame.data, img.rgba8);
    }

    #[test]
    fn zoom_reads_a_centered_window() {
        // At 2x the frame center still samples the image center.
        let img = gradient_image(16, 16);
        let frame = sample_zoomed(&img, 2.0);
        let center = ((8 * 16 + 8) * 4) as usize;
        assert_eq!(frame.data[center], img.rgba8[center]);
        // Corners no longer show the source corners.
        assert_ne!(frame.data[0], img.rgba8[0]);
    }

    #[test]
    fn watermark_lands_at_the_margins() {
        let img = gradient_image(200, 100);
        let mut frame = sample_zoomed(&img, 1.0);
        // Set the region under the watermark to black for a known base.
        for b in frame.data.iter_mut() {
            *b = 0;
        }
        let sprite = WatermarkSprite {
            width: 2,
            height: 2,
            rgba8_premul: vec![255; 2 * 2 * 4],
        };
        blend_watermark(&mut frame, &sprite, 0.8);

        // Sprite occupies [158, 160) x [68, 70).
        let stride = 200 * 4;
        let inside = 68 * stride + 158 * 4;
        assert_eq!(frame.data[inside], 204); // 255 * 0.8
        let outside = 68 * stride + 157 * 4;
        assert_eq!(frame.data[outside], 0);
    }

    #[test]
    fn composer_walks_segments_in_order() {
        let mut cfg = RenderConfig::default();
        cfg.min_duration_sec = 2.0;
        cfg.max_duration_sec = 2.0;
        cfg.fps = 2;
        let tl = build_timeline(2.0, 2, &cfg).unwrap();

        let a = gradient_image(8, 8);
        let mut b = gradient_image(8, 8);
        b.rgba8.iter_mut().for_each(|v| *v = 200);

        let images = vec![a, b];
        let composer = FrameComposer::new(&images, &tl, None, 1.0);
        let first = composer.compose(0).unwrap();
        let third = composer.compose(2).unwrap();
        assert_eq!(first.data, images[0].rgba8);
        assert_eq!(third.data[0], 200);
    }
}
