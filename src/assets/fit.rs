use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::error::{RenderError, RenderResult};

/// Re-encode quality for normalized stills.
const JPEG_QUALITY: u8 = 95;

/// A decoded input image normalized to the target frame size.
#[derive(Clone, Debug)]
pub struct ResolvedImage {
    /// Width in pixels, always the configured target width.
    pub width: u32,
    /// Height in pixels, always the configured target height.
    pub height: u32,
    /// Straight RGBA8, fully opaque, row-major.
    pub rgba8: Vec<u8>,
    /// Normalized JPEG written into the render's temp directory.
    pub path: PathBuf,
}

/// Decode image bytes and normalize them to exactly `target_w x target_h`.
///
/// The image is first center-cropped to the target aspect ratio (symmetric
/// left/right margins when the source is wider than the target, symmetric
/// top/bottom margins when taller), then resized with Lanczos3 and re-encoded
/// as a quality-95 JPEG. Every output fills the frame with no letterboxing.
pub fn fit_to_frame(
    bytes: &[u8],
    target_w: u32,
    target_h: u32,
    out_path: &Path,
) -> RenderResult<ResolvedImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| RenderError::decode(format!("image decode failed: {e}")))?;
    let rgb = decoded.to_rgb8();

    let cropped = center_crop_to_ratio(&rgb, target_w, target_h);
    let resized = image::imageops::resize(&cropped, target_w, target_h, FilterType::Lanczos3);

    let file = std::fs::File::create(out_path).map_err(|e| {
        RenderError::decode(format!("failed to create '{}': {e}", out_path.display()))
    })?;
    let mut writer = BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
        .encode_image(&resized)
        .map_err(|e| {
            RenderError::decode(format!("failed to encode '{}': {e}", out_path.display()))
        })?;

    let rgba8 = image::DynamicImage::ImageRgb8(resized).to_rgba8().into_raw();
    Ok(ResolvedImage {
        width: target_w,
        height: target_h,
        rgba8,
        path: out_path.to_path_buf(),
    })
}

fn center_crop_to_ratio(img: &image::RgbImage, target_w: u32, target_h: u32) -> image::RgbImage {
    let (w, h) = img.dimensions();
    let target_ratio = f64::from(target_w) / f64::from(target_h);
    let ratio = f64::from(w) / f64::from(h);

    if ratio > target_ratio {
        // Wider than target: crop symmetric left/right margins.
        let new_w = ((f64::from(h) * target_ratio) as u32).clamp(1, w);
        let x = (w - new_w) / 2;
        image::imageops::crop_imm(img, x, 0, new_w, h).to_image()
    } else {
        // Taller than (or matching) target: crop symmetric top/bottom margins.
        let new_h = ((f64::from(w) / target_ratio) as u32).clamp(1, h);
        let y = (h - new_h) / 2;
        image::imageops::crop_imm(img, 0, y, w, new_h).to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        });
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut buf),
                image::ImageFormat::Png,
            )
            .unwrap();
        buf
    }

    #[test]
    fn portrait_landscape_and_square_all_hit_target_dims() {
        let tmp = tempfile::tempdir().unwrap();
        for (i, (w, h)) in [(20u32, 30u32), (30, 20), (10, 10)].iter().enumerate() {
            let path = tmp.path().join(format!("img{i}.jpg"));
            let resolved = fit_to_frame(&png_bytes(*w, *h), 90, 160, &path).unwrap();
            assert_eq!((resolved.width, resolved.height), (90, 160));
            assert_eq!(resolved.rgba8.len(), 90 * 160 * 4);
            assert!(path.exists());
        }
    }

    #[test]
    fn crop_geometry_is_centered() {
        // 30x10 into a 1:1 target: keep the middle 10 columns.
        let img = image::RgbImage::from_fn(30, 10, |x, _| image::Rgb([x as u8, 0, 0]));
        let cropped = center_crop_to_ratio(&img, 100, 100);
        assert_eq!(cropped.dimensions(), (10, 10));
        assert_eq!(cropped.get_pixel(0, 0)[0], 10);

        // 10x30 into a 1:1 target: keep the middle 10 rows.
        let img = image::RgbImage::from_fn(10, 30, |_, y| image::Rgb([y as u8, 0, 0]));
        let cropped = center_crop_to_ratio(&img, 100, 100);
        assert_eq!(cropped.dimensions(), (10, 10));
        assert_eq!(cropped.get_pixel(0, 0)[0], 10);
    }

    #[test]
    fn matching_ratio_is_not_cropped() {
        let img = image::RgbImage::new(9, 16);
        let cropped = center_crop_to_ratio(&img, 90, 160);
        assert_eq!(cropped.dimensions(), (9, 16));
    }

    #[test]
    fn undecodable_bytes_are_a_decode_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = fit_to_frame(b"not an image", 90, 160, &tmp.path().join("x.jpg")).unwrap_err();
        assert!(err.to_string().contains("decode error"));
    }
}
