//! Overlay compositor: annotations and the elapsed-time label

mod glyphs;

use std::time::Duration;

use image::RgbaImage;
use tiny_skia::{
    IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Rect, Stroke,
    Transform,
};
use tracing::{trace, warn};

use crate::domain::annotation::{AnnotationPrimitive, Color};
use crate::domain::capture::Frame;
use crate::domain::recording::format_clock;

pub use glyphs::{GlyphFont, GlyphMetrics};

/// Offset of the time label from the top-left corner
const LABEL_ORIGIN: f32 = 10.0;
/// Plate padding around the label text
const LABEL_PADDING: f32 = 10.0;
const PLATE_COLOR: Color = Color::rgba(0, 0, 0, 180);
const LABEL_COLOR: Color = Color::WHITE;

/// Label font size for a frame of `height` pixels
pub fn label_font_size(height: u32) -> f32 {
    (height as f32 * 0.02).floor().max(20.0)
}

/// Draws annotation primitives and the time label onto copies of frames
pub struct OverlayCompositor {
    font: GlyphFont,
}

impl OverlayCompositor {
    pub fn new(font: GlyphFont) -> Self {
        Self { font }
    }

    /// Compositor using the built-in bitmap face
    pub fn with_bitmap_font() -> Self {
        Self::new(GlyphFont::Bitmap)
    }

    /// Return a new frame with `annotations` drawn in order and, when
    /// `elapsed` is given, an `HH:MM:SS` label in the top-left corner.
    /// The input frame is never modified.
    pub fn composite(
        &self,
        frame: &Frame,
        annotations: &[AnnotationPrimitive],
        elapsed: Option<Duration>,
    ) -> Frame {
        if annotations.is_empty() && elapsed.is_none() {
            return frame.clone();
        }

        let Some(mut pixmap) = to_pixmap(frame.image()) else {
            warn!(
                width = frame.width(),
                height = frame.height(),
                "Cannot composite onto frame, passing it through"
            );
            return frame.clone();
        };

        for primitive in annotations {
            if let Err(reason) = primitive.validate() {
                trace!(%reason, "Skipping annotation");
                continue;
            }
            self.draw_primitive(&mut pixmap, primitive);
        }

        if let Some(elapsed) = elapsed {
            self.draw_time_label(&mut pixmap, &format_clock(elapsed));
        }

        frame.with_image(from_pixmap(&pixmap))
    }

    fn draw_primitive(&self, pixmap: &mut Pixmap, primitive: &AnnotationPrimitive) {
        match primitive {
            AnnotationPrimitive::Line {
                from,
                to,
                color,
                width,
            } => {
                let mut pb = PathBuilder::new();
                pb.move_to(from.0, from.1);
                pb.line_to(to.0, to.1);
                stroke_path(pixmap, pb, *color, *width);
            }
            AnnotationPrimitive::Rectangle {
                x,
                y,
                width,
                height,
                color,
                stroke_width,
            } => {
                if let Some(rect) = Rect::from_xywh(*x, *y, *width, *height) {
                    let mut pb = PathBuilder::new();
                    pb.push_rect(rect);
                    stroke_path(pixmap, pb, *color, *stroke_width);
                }
            }
            AnnotationPrimitive::Ellipse {
                cx,
                cy,
                rx,
                ry,
                color,
                stroke_width,
            } => {
                if let Some(rect) = Rect::from_ltrb(cx - rx, cy - ry, cx + rx, cy + ry) {
                    let mut pb = PathBuilder::new();
                    pb.push_oval(rect);
                    stroke_path(pixmap, pb, *color, *stroke_width);
                }
            }
            AnnotationPrimitive::Stroke {
                points,
                color,
                width,
            } => {
                let mut iter = points.iter();
                if let Some(first) = iter.next() {
                    let mut pb = PathBuilder::new();
                    pb.move_to(first.0, first.1);
                    for p in iter {
                        pb.line_to(p.0, p.1);
                    }
                    if points.len() == 1 {
                        // a single click still leaves a dot
                        pb.line_to(first.0 + 0.01, first.1);
                    }
                    stroke_path(pixmap, pb, *color, *width);
                }
            }
            AnnotationPrimitive::Text {
                x,
                y,
                text,
                color,
                size,
            } => {
                let (_, ascent) = self.font.measure(text, *size);
                self.draw_text(pixmap, text, *x, *y + ascent, *size, *color);
            }
        }
    }

    fn draw_time_label(&self, pixmap: &mut Pixmap, text: &str) {
        let size = label_font_size(pixmap.height());
        let (text_width, ascent) = self.font.measure(text, size);

        if let Some(plate) = Rect::from_ltrb(
            LABEL_ORIGIN - LABEL_PADDING,
            LABEL_ORIGIN - LABEL_PADDING,
            LABEL_ORIGIN + text_width + LABEL_PADDING,
            LABEL_ORIGIN + ascent + LABEL_PADDING,
        ) {
            let mut paint = Paint::default();
            paint.set_color_rgba8(PLATE_COLOR.r, PLATE_COLOR.g, PLATE_COLOR.b, PLATE_COLOR.a);
            pixmap.fill_rect(plate, &paint, Transform::identity(), None);
        }

        self.draw_text(pixmap, text, LABEL_ORIGIN, LABEL_ORIGIN + ascent, size, LABEL_COLOR);
    }

    /// Draw `text` with its baseline at `baseline`
    fn draw_text(&self, pixmap: &mut Pixmap, text: &str, x: f32, baseline: f32, size: f32, color: Color) {
        let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);
        let stride = pixmap.width() as usize;
        let mut pen = x;

        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            if bitmap.is_empty() {
                pen += metrics.advance;
                continue;
            }

            let glyph_x = pen + metrics.xmin as f32;
            let glyph_y = baseline - metrics.height as f32 - metrics.ymin as f32;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let px = (glyph_x + gx as f32) as i32;
                    let py = (glyph_y + gy as f32) as i32;
                    if px < 0 || px >= width || py < 0 || py >= height {
                        continue;
                    }
                    let alpha = (coverage as u32 * color.a as u32 / 255) as u8;
                    let idx = py as usize * stride + px as usize;
                    let pixels = pixmap.pixels_mut();
                    pixels[idx] = blend_over(pixels[idx], color, alpha);
                }
            }

            pen += metrics.advance;
        }
    }
}

fn stroke_path(pixmap: &mut Pixmap, pb: PathBuilder, color: Color, width: f32) {
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    let stroke = Stroke {
        width: width.max(0.5),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Source-over of a straight-alpha colour onto a premultiplied pixel
fn blend_over(dst: PremultipliedColorU8, src: Color, alpha: u8) -> PremultipliedColorU8 {
    let sa = alpha as u32;
    let inv = 255 - sa;
    let out_a = sa + dst.alpha() as u32 * inv / 255;
    let channel = |s: u8, d: u8| -> u8 {
        let value = s as u32 * sa / 255 + d as u32 * inv / 255;
        value.min(out_a) as u8
    };
    PremultipliedColorU8::from_rgba(
        channel(src.r, dst.red()),
        channel(src.g, dst.green()),
        channel(src.b, dst.blue()),
        out_a as u8,
    )
    .unwrap_or(dst)
}

fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = image.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a < 255 {
            for c in &mut px[..3] {
                *c = (*c as u32 * a / 255) as u8;
            }
        }
    }
    Pixmap::from_vec(data, size)
}

fn from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}
