//! Glyph rasterization for overlay text

/// Placement of one rasterized glyph, in the same convention as fontdue:
/// `ymin` is the offset of the bitmap's bottom edge from the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub width: usize,
    pub height: usize,
    pub xmin: i32,
    pub ymin: i32,
    pub advance: f32,
}

/// Text face used by the compositor
pub enum GlyphFont {
    Vector(fontdue::Font),
    /// Built-in 5x7 face used when no font file is available
    Bitmap,
}

impl GlyphFont {
    pub fn from_bytes(data: &[u8]) -> Result<Self, String> {
        fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map(Self::Vector)
            .map_err(|e| e.to_string())
    }

    /// Coverage bitmap (row-major, 0..=255) and metrics for `ch`
    pub fn rasterize(&self, ch: char, size: f32) -> (GlyphMetrics, Vec<u8>) {
        match self {
            Self::Vector(font) => {
                let (m, bitmap) = font.rasterize(ch, size);
                (
                    GlyphMetrics {
                        width: m.width,
                        height: m.height,
                        xmin: m.xmin,
                        ymin: m.ymin,
                        advance: m.advance_width,
                    },
                    bitmap,
                )
            }
            Self::Bitmap => rasterize_bitmap(ch, size),
        }
    }

    /// Placement of `ch` without rasterizing it
    pub fn metrics(&self, ch: char, size: f32) -> GlyphMetrics {
        match self {
            Self::Vector(font) => {
                let m = font.metrics(ch, size);
                GlyphMetrics {
                    width: m.width,
                    height: m.height,
                    xmin: m.xmin,
                    ymin: m.ymin,
                    advance: m.advance_width,
                }
            }
            Self::Bitmap => bitmap_metrics(ch, size),
        }
    }

    /// Width of `text` and the ascent above the baseline
    pub fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        text.chars().fold((0.0, 0.0), |(width, ascent), ch| {
            let m = self.metrics(ch, size);
            let top = m.height as f32 + m.ymin as f32;
            (width + m.advance, if m.height > 0 { ascent.max(top) } else { ascent })
        })
    }
}

const ROWS: usize = 7;
const COLS: usize = 5;

fn bitmap_scale(size: f32) -> usize {
    ((size / ROWS as f32).round() as usize).max(1)
}

fn bitmap_metrics(ch: char, size: f32) -> GlyphMetrics {
    let scale = bitmap_scale(size);
    let (width, height) = if ch == ' ' {
        (0, 0)
    } else {
        (COLS * scale, ROWS * scale)
    };
    GlyphMetrics {
        width,
        height,
        xmin: 0,
        ymin: 0,
        advance: ((COLS + 1) * scale) as f32,
    }
}

fn rasterize_bitmap(ch: char, size: f32) -> (GlyphMetrics, Vec<u8>) {
    let metrics = bitmap_metrics(ch, size);
    if metrics.width == 0 {
        return (metrics, Vec::new());
    }

    let scale = bitmap_scale(size);
    let rows = bitmap_rows(ch);
    let (width, height) = (metrics.width, metrics.height);
    let mut coverage = vec![0u8; width * height];
    for y in 0..height {
        let bits = rows[y / scale];
        for x in 0..width {
            if bits & (1 << (COLS - 1 - x / scale)) != 0 {
                coverage[y * width + x] = 255;
            }
        }
    }
    (metrics, coverage)
}

fn bitmap_rows(ch: char) -> [u8; ROWS] {
    match ch.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}
