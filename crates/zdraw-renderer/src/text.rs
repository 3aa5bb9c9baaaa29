//! 文本光栅化
//!
//! 字体由 `fontdue` 解析和排版，系统字体由 `fontdb` 查找。字形覆盖率位图按颜色
//! 合成为预乘像素图后贴到画布上。

use crate::error::RenderError;
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use std::path::Path;
use tiny_skia::{IntSize, Pixmap, PixmapPaint, PremultipliedColorU8, Transform};
use zdraw_core::properties::Color;

/// 从字节解析字体，`index` 为字体集合中的序号
pub fn font_from_bytes(bytes: &[u8], index: u32) -> Result<Font, RenderError> {
    let settings = FontSettings {
        collection_index: index,
        ..FontSettings::default()
    };
    Font::from_bytes(bytes, settings).map_err(|e| RenderError::Font(e.to_string()))
}

pub fn load_font_file(path: &Path) -> Result<Font, RenderError> {
    let bytes = std::fs::read(path)
        .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
    font_from_bytes(&bytes, 0)
}

/// 查找一款常规字重的无衬线系统字体
pub fn load_system_font() -> Result<Font, RenderError> {
    use fontdb::{Database, Family, Query, Stretch, Style, Weight};

    let mut db = Database::new();
    db.load_system_fonts();

    let id = db
        .query(&Query {
            families: &[
                Family::SansSerif,
                Family::Name("DejaVu Sans"),
                Family::Name("Arial"),
                Family::Name("Microsoft YaHei"),
            ],
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        })
        .ok_or_else(|| RenderError::Font("no suitable system font found".to_string()))?;

    db.with_face_data(id, |data, index| font_from_bytes(data, index))
        .ok_or_else(|| RenderError::Font("system font data is unavailable".to_string()))?
}

/// 单个字形的覆盖率位图，`x`/`y` 为左上角的屏幕坐标
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

/// 以 `origin` 为第一行左上角排版并光栅化
pub fn rasterize_text(font: &Font, text: &str, px: f32, origin: (f32, f32)) -> Vec<GlyphMask> {
    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        x: origin.0,
        y: origin.1,
        ..LayoutSettings::default()
    });
    layout.append(&[font], &TextStyle::new(text, px.max(1.0), 0));

    layout
        .glyphs()
        .iter()
        .filter_map(|g| {
            let (metrics, coverage) = font.rasterize_indexed(g.key.glyph_index, g.key.px);
            if metrics.width == 0 || metrics.height == 0 {
                return None;
            }
            Some(GlyphMask {
                x: g.x,
                y: g.y,
                width: metrics.width as u32,
                height: metrics.height as u32,
                coverage,
            })
        })
        .collect()
}

/// 覆盖率乘以颜色透明度，得到预乘像素图
fn tinted_mask(mask: &GlyphMask, color: Color) -> Option<Pixmap> {
    let size = IntSize::from_wh(mask.width, mask.height)?;
    let mut pixmap = Pixmap::new(size.width(), size.height())?;
    for (dst, &c) in pixmap.pixels_mut().iter_mut().zip(&mask.coverage) {
        let alpha = (c as u16 * color.a as u16 / 255) as u8;
        let premul = |v: u8| (v as u16 * alpha as u16 / 255) as u8;
        if let Some(px) = PremultipliedColorU8::from_rgba(
            premul(color.r),
            premul(color.g),
            premul(color.b),
            alpha,
        ) {
            *dst = px;
        }
    }
    Some(pixmap)
}

/// 把字形合成到画布
pub fn composite_glyphs(ctx: &mut Pixmap, glyphs: &[GlyphMask], color: Color) {
    let paint = PixmapPaint::default();
    for glyph in glyphs {
        if let Some(tinted) = tinted_mask(glyph, color) {
            ctx.draw_pixmap(
                glyph.x.round() as i32,
                glyph.y.round() as i32,
                tinted.as_ref(),
                &paint,
                Transform::identity(),
                None,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_tints_coverage() {
        let mut pixmap = Pixmap::new(8, 8).unwrap();
        let glyph = GlyphMask {
            x: 2.0,
            y: 3.0,
            width: 2,
            height: 1,
            coverage: vec![255, 0],
        };
        composite_glyphs(&mut pixmap, &[glyph], Color::RED);

        let covered = pixmap.pixel(2, 3).unwrap();
        assert_eq!(
            [covered.red(), covered.green(), covered.blue(), covered.alpha()],
            [255, 0, 0, 255]
        );
        assert_eq!(pixmap.pixel(3, 3).unwrap().alpha(), 0);
        assert_eq!(pixmap.pixel(2, 4).unwrap().alpha(), 0);
    }

    #[test]
    fn test_partial_coverage_is_premultiplied() {
        let glyph = GlyphMask {
            x: 0.0,
            y: 0.0,
            width: 1,
            height: 1,
            coverage: vec![128],
        };
        let tinted = tinted_mask(&glyph, Color::new(128, 128, 128)).unwrap();
        let px = tinted.pixel(0, 0).unwrap();
        assert_eq!(px.alpha(), 128);
        assert_eq!(px.red(), 64);
    }

    #[test]
    fn test_bad_font_bytes() {
        assert!(matches!(
            font_from_bytes(b"not a font", 0),
            Err(RenderError::Font(_))
        ));
        assert!(matches!(
            load_font_file(Path::new("/nonexistent/zdraw-font.ttf")),
            Err(RenderError::Font(_))
        ));
    }

    #[test]
    fn test_system_font_draws_ink() {
        // 无系统字体的环境下跳过
        let Ok(font) = load_system_font() else {
            return;
        };
        let glyphs = rasterize_text(&font, "Hi", 24.0, (4.0, 4.0));
        assert!(!glyphs.is_empty());
        assert!(glyphs.iter().all(|g| g.x >= 0.0 && g.y >= 0.0));

        let mut pixmap = Pixmap::new(64, 48).unwrap();
        composite_glyphs(&mut pixmap, &glyphs, Color::BLACK);
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 0));
    }
}
