//! Watermark text overlay.
//!
//! The watermark is rasterized once per render from a generated SVG `<text>`
//! node and composited over every frame. Font resolution prefers Arial and
//! falls back to a generic bold sans-serif; a machine with no usable fonts
//! degrades to no overlay rather than failing the render.

use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// Watermark font size in pixels.
pub const WATERMARK_FONT_SIZE: f32 = 52.0;
/// Right margin between the text and the frame edge, pixels.
pub const WATERMARK_MARGIN_RIGHT: u32 = 40;
/// Bottom margin between the text and the frame edge, pixels.
pub const WATERMARK_MARGIN_BOTTOM: u32 = 30;
/// Overlay opacity applied during compositing.
pub const WATERMARK_OPACITY: f32 = 0.8;

/// A rasterized watermark, premultiplied RGBA8.
///
/// The text is right-anchored inside the sprite, so compositing the sprite
/// flush against the margins puts the text's right edge at the margin.
#[derive(Clone, Debug)]
pub struct WatermarkSprite {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

/// Rasterize `text` into a watermark sprite.
///
/// Returns `Ok(None)` for empty text or when no font could produce visible
/// glyphs; font problems are never surfaced as render failures.
pub fn render_watermark(text: &str) -> RenderResult<Option<WatermarkSprite>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let svg = watermark_svg(text);
    let mut opts = usvg::Options::default();
    opts.fontdb_mut().load_system_fonts();

    let tree = match usvg::Tree::from_data(svg.as_bytes(), &opts) {
        Ok(tree) => tree,
        Err(e) => {
            debug!("watermark svg parse failed, skipping overlay: {e}");
            return Ok(None);
        }
    };

    let width = tree.size().width().ceil().max(1.0) as u32;
    let height = tree.size().height().ceil().max(1.0) as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RenderError::encode("failed to allocate watermark pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    // Blank output means text-to-path conversion found no usable font.
    if pixmap.data().iter().skip(3).step_by(4).all(|&a| a == 0) {
        debug!("watermark produced no visible glyphs, skipping overlay");
        return Ok(None);
    }

    Ok(Some(WatermarkSprite {
        width,
        height,
        rgba8_premul: pixmap.data().to_vec(),
    }))
}

/// Build the watermark SVG document.
///
/// The canvas width over-estimates the text advance; `text-anchor="end"`
/// right-aligns the glyphs so the slack stays on the transparent left side.
fn watermark_svg(text: &str) -> String {
    let size = WATERMARK_FONT_SIZE;
    let width = ((text.chars().count().max(1) as f32) * size * 0.75 + size).ceil() as u32;
    let height = (size * 1.4).ceil() as u32;
    let baseline = (size * 1.05).ceil() as u32;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"#,
            r#"<text x="{w}" y="{y}" text-anchor="end" "#,
            r#"font-family="Arial, sans-serif" font-weight="bold" "#,
            r##"font-size="{size}" fill="#ffffff">{text}</text></svg>"##
        ),
        w = width,
        h = height,
        y = baseline,
        size = size,
        text = escape_xml(text),
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_sprite() {
        assert!(render_watermark("").unwrap().is_none());
        assert!(render_watermark("   ").unwrap().is_none());
    }

    #[test]
    fn svg_escapes_markup_characters() {
        let svg = watermark_svg("a<b&\"c\">");
        assert!(svg.contains("a&lt;b&amp;&quot;c&quot;&gt;"));
        assert!(!svg.contains("a<b"));
    }

    #[test]
    fn svg_is_right_anchored_and_bold() {
        let svg = watermark_svg("TEST");
        assert!(svg.contains(r#"text-anchor="end""#));
        assert!(svg.contains(r#"font-weight="bold""#));
        assert!(svg.contains("Arial, sans-serif"));
    }

    #[test]
    fn rasterization_never_fails_on_font_problems() {
        // With system fonts present this yields a sprite; without, it must
        // degrade to None rather than erroring.
        let sprite = render_watermark("TEST").unwrap();
        if let Some(sprite) = sprite {
            assert!(sprite.width > 0 && sprite.height > 0);
            assert_eq!(
                sprite.rgba8_premul.len(),
                (sprite.width * sprite.height * 4) as usize
            );
        }
    }
}
