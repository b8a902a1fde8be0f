//! Locating a TrueType face for the time label

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::application::GlyphFont;

/// Common sans faces on Linux, macOS and Windows
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/noto/NotoSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

fn load(path: &Path) -> Option<GlyphFont> {
    let data = fs::read(path).ok()?;
    match GlyphFont::from_bytes(&data) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable font");
            None
        }
    }
}

/// `preferred` if it loads, else the first system face found, else the
/// built-in bitmap face
pub fn resolve_font(preferred: Option<&Path>) -> GlyphFont {
    if let Some(path) = preferred {
        if let Some(font) = load(path) {
            debug!(path = %path.display(), "Using configured font");
            return font;
        }
        warn!(path = %path.display(), "Configured font could not be loaded");
    }

    let user_fonts = dirs::font_dir().map(|dir| dir.join("DejaVuSans-Bold.ttf"));
    let candidates = user_fonts
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
    for path in candidates {
        if let Some(font) = load(&path) {
            debug!(path = %path.display(), "Using system font");
            return font;
        }
    }

    debug!("No TrueType font found; using bitmap face");
    GlyphFont::Bitmap
}
