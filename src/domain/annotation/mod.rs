//! Annotation primitives drawn over captured frames

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::domain::error::AnnotationError;

/// Smallest and largest text size, in pixels
pub const MIN_TEXT_SIZE: f32 = 1.0;
pub const MAX_TEXT_SIZE: f32 = 512.0;
/// Widest line or outline, in pixels
pub const MAX_STROKE_WIDTH: f32 = 256.0;

/// 8-bit RGBA colour, written as `#rrggbb` or `#rrggbbaa` in files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const RED: Self = Self::rgba(255, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.trim().trim_start_matches('#');
        let byte = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| format!("invalid colour \"{value}\", expected #rrggbb or #rrggbbaa"))
        };
        match hex.len() {
            6 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(format!(
                "invalid colour \"{value}\", expected #rrggbb or #rrggbbaa"
            )),
        }
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

fn default_color() -> Color {
    Color::RED
}

fn default_width() -> f32 {
    3.0
}

fn default_text_size() -> f32 {
    24.0
}

/// One shape in output-pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationPrimitive {
    Line {
        from: (f32, f32),
        to: (f32, f32),
        #[serde(default = "default_color")]
        color: Color,
        #[serde(default = "default_width")]
        width: f32,
    },
    Rectangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default = "default_color")]
        color: Color,
        #[serde(default = "default_width")]
        stroke_width: f32,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        #[serde(default = "default_color")]
        color: Color,
        #[serde(default = "default_width")]
        stroke_width: f32,
    },
    /// Freehand polyline
    Stroke {
        points: Vec<(f32, f32)>,
        #[serde(default = "default_color")]
        color: Color,
        #[serde(default = "default_width")]
        width: f32,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        #[serde(default = "default_color")]
        color: Color,
        #[serde(default = "default_text_size")]
        size: f32,
    },
}

impl AnnotationPrimitive {
    pub fn color(&self) -> Color {
        match self {
            Self::Line { color, .. }
            | Self::Rectangle { color, .. }
            | Self::Ellipse { color, .. }
            | Self::Stroke { color, .. }
            | Self::Text { color, .. } => *color,
        }
    }

    /// Check that coordinates are finite and sizes stay drawable
    pub fn validate(&self) -> Result<(), String> {
        let finite = |values: &[f32]| {
            if values.iter().all(|v| v.is_finite()) {
                Ok(())
            } else {
                Err("coordinates must be finite numbers".to_string())
            }
        };
        let stroke = |width: f32| {
            if (0.0..=MAX_STROKE_WIDTH).contains(&width) {
                Ok(())
            } else {
                Err(format!("width {width} is outside 0..={MAX_STROKE_WIDTH}"))
            }
        };
        match self {
            Self::Line {
                from, to, width, ..
            } => {
                finite(&[from.0, from.1, to.0, to.1])?;
                stroke(*width)
            }
            Self::Rectangle {
                x,
                y,
                width,
                height,
                stroke_width,
                ..
            } => {
                finite(&[*x, *y, *width, *height])?;
                stroke(*stroke_width)
            }
            Self::Ellipse {
                cx,
                cy,
                rx,
                ry,
                stroke_width,
                ..
            } => {
                finite(&[*cx, *cy, *rx, *ry])?;
                stroke(*stroke_width)
            }
            Self::Stroke { points, width, .. } => {
                let flat: Vec<f32> = points.iter().flat_map(|p| [p.0, p.1]).collect();
                finite(&flat)?;
                stroke(*width)
            }
            Self::Text { x, y, size, .. } => {
                finite(&[*x, *y])?;
                if (MIN_TEXT_SIZE..=MAX_TEXT_SIZE).contains(size) {
                    Ok(())
                } else {
                    Err(format!(
                        "text size {size} is outside {MIN_TEXT_SIZE}..={MAX_TEXT_SIZE}"
                    ))
                }
            }
        }
    }
}

/// Parse a JSON array of primitives, rejecting any that cannot be drawn
pub fn parse_annotations(json: &str) -> Result<Vec<AnnotationPrimitive>, AnnotationError> {
    let primitives: Vec<AnnotationPrimitive> = serde_json::from_str(json)?;
    for (index, primitive) in primitives.iter().enumerate() {
        primitive
            .validate()
            .map_err(|message| AnnotationError::OutOfRange { index, message })?;
    }
    Ok(primitives)
}

/// Ordered annotation list shared between an editor and the compositor.
///
/// Insertion order is z-order. The list only grows during a session,
/// except for an explicit [`AnnotationLayer::clear`].
#[derive(Debug, Clone, Default)]
pub struct AnnotationLayer {
    inner: Arc<RwLock<Vec<AnnotationPrimitive>>>,
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<AnnotationPrimitive>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<AnnotationPrimitive>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, primitive: AnnotationPrimitive) {
        self.write().push(primitive);
    }

    pub fn extend(&self, primitives: impl IntoIterator<Item = AnnotationPrimitive>) {
        self.write().extend(primitives);
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current list, so rendering never holds the lock
    pub fn snapshot(&self) -> Vec<AnnotationPrimitive> {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parses_hex() {
        assert_eq!(
            Color::try_from("#ff8000".to_string()).unwrap(),
            Color::rgba(255, 128, 0, 255)
        );
        assert_eq!(
            Color::try_from("00000080".to_string()).unwrap(),
            Color::rgba(0, 0, 0, 128)
        );
        assert!(Color::try_from("#fff".to_string()).is_err());
        assert!(Color::try_from("#gggggg".to_string()).is_err());
    }

    #[test]
    fn color_display() {
        assert_eq!(Color::RED.to_string(), "#ff0000");
        assert_eq!(Color::rgba(0, 0, 0, 180).to_string(), "#000000b4");
    }

    #[test]
    fn parse_tagged_primitives_with_defaults() {
        let json = r##"[
            {"kind": "line", "from": [0, 0], "to": [10, 10]},
            {"kind": "rectangle", "x": 5, "y": 5, "width": 20, "height": 10, "color": "#00ff00"},
            {"kind": "text", "x": 1, "y": 2, "text": "hi", "size": 18}
        ]"##;
        let primitives = parse_annotations(json).unwrap();
        assert_eq!(primitives.len(), 3);
        assert_eq!(primitives[0].color(), Color::RED);
        assert!(matches!(primitives[0], AnnotationPrimitive::Line { width, .. } if width == 3.0));
        assert_eq!(primitives[1].color(), Color::rgba(0, 255, 0, 255));
        assert!(matches!(&primitives[2], AnnotationPrimitive::Text { text, .. } if text == "hi"));
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        assert!(parse_annotations(r#"[{"kind": "arrow"}]"#).is_err());
    }

    #[test]
    fn parse_rejects_undrawable_sizes() {
        let huge_text = r#"[{"kind": "text", "x": 0, "y": 0, "text": "A", "size": 1e9}]"#;
        match parse_annotations(huge_text) {
            Err(AnnotationError::OutOfRange { index, message }) => {
                assert_eq!(index, 0);
                assert!(message.contains("text size"));
            }
            other => panic!("expected out-of-range error, got {other:?}"),
        }

        let tiny_text = r#"[{"kind": "text", "x": 0, "y": 0, "text": "A", "size": 0}]"#;
        assert!(parse_annotations(tiny_text).is_err());

        let wide_line = r#"[
            {"kind": "line", "from": [0, 0], "to": [1, 1]},
            {"kind": "stroke", "points": [[0, 0]], "width": 5000}
        ]"#;
        assert!(matches!(
            parse_annotations(wide_line),
            Err(AnnotationError::OutOfRange { index: 1, .. })
        ));

        let overflowing = r#"[{"kind": "ellipse", "cx": 1e39, "cy": 0, "rx": 4, "ry": 4}]"#;
        assert!(parse_annotations(overflowing).is_err());
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            parse_annotations("{ not json"),
            Err(AnnotationError::Json(_))
        ));
    }

    #[test]
    fn layer_keeps_insertion_order_across_clones() {
        let layer = AnnotationLayer::new();
        let editor = layer.clone();
        editor.push(AnnotationPrimitive::Text {
            x: 0.0,
            y: 0.0,
            text: "first".into(),
            color: Color::WHITE,
            size: 12.0,
        });
        editor.push(AnnotationPrimitive::Line {
            from: (0.0, 0.0),
            to: (1.0, 1.0),
            color: Color::RED,
            width: 1.0,
        });
        let snapshot = layer.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(matches!(snapshot[0], AnnotationPrimitive::Text { .. }));

        layer.clear();
        assert!(editor.is_empty());
    }
}
