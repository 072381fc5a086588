//! Drawing Surface
//!
//! Thin layer over an RGBA image buffer: clipped rectangles and lines,
//! alpha-blended markers, and text in any of three horizontal alignments.
//! Text is skipped silently when no font was found.

use crate::ChartError;
use ab_glyph::{FontVec, PxScale};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut, text_size};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const GRID: Rgba<u8> = Rgba([225, 225, 225, 255]);
pub const AXIS: Rgba<u8> = Rgba([90, 90, 90, 255]);

/// Fonts tried in order when none is configured
const SYSTEM_FONTS: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Load the configured font, or the first system font that parses
///
/// A configured path that cannot be read is an error; a missing system font
/// only means the charts are drawn without text.
pub fn load_font(configured: Option<&Path>) -> Result<Option<FontVec>, ChartError> {
    if let Some(path) = configured {
        let bytes = std::fs::read(path)?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| ChartError::Font(format!("{}: {}", path.display(), e)))?;
        debug!("Using font {}", path.display());
        return Ok(Some(font));
    }

    for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
        let Ok(bytes) = std::fs::read(&candidate) else {
            continue;
        };
        if let Ok(font) = FontVec::try_from_vec(bytes) {
            debug!("Using system font {}", candidate.display());
            return Ok(Some(font));
        }
    }

    warn!("No TrueType font found; charts will be drawn without labels");
    Ok(None)
}

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Image being drawn, with an optional font for labels
pub struct Canvas<'f> {
    image: RgbaImage,
    font: Option<&'f FontVec>,
}

impl<'f> Canvas<'f> {
    /// White canvas of the given size
    pub fn new(width: u32, height: u32, font: Option<&'f FontVec>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, WHITE),
            font,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Overwrite one pixel; out-of-bounds coordinates are ignored
    pub fn put(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Blend one pixel with `alpha` opacity
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>, alpha: f32) {
        if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        let base = self.image.get_pixel(x as u32, y as u32).0;
        let mix = |b: u8, c: u8| (b as f32 * (1.0 - alpha) + c as f32 * alpha).round() as u8;
        self.image.put_pixel(
            x as u32,
            y as u32,
            Rgba([mix(base[0], color[0]), mix(base[1], color[1]), mix(base[2], color[2]), 255]),
        );
    }

    /// Filled axis-aligned rectangle, clipped to the canvas
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let x0 = x.min(x + w).round() as i64;
        let x1 = x.max(x + w).round() as i64;
        let y0 = y.min(y + h).round() as i64;
        let y1 = y.max(y + h).round() as i64;
        for py in y0.max(0)..y1.min(self.height() as i64) {
            for px in x0.max(0)..x1.min(self.width() as i64) {
                self.image.put_pixel(px as u32, py as u32, color);
            }
        }
    }

    /// One pixel rectangle outline
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        self.line((x, y), (x + w, y), color);
        self.line((x + w, y), (x + w, y + h), color);
        self.line((x + w, y + h), (x, y + h), color);
        self.line((x, y + h), (x, y), color);
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba<u8>) {
        draw_line_segment_mut(&mut self.image, from, to, color);
    }

    /// Line drawn `width` pixels wide by offsetting across its normal
    pub fn thick_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba<u8>) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            return;
        }
        let (nx, ny) = (-dy / len, dx / len);
        let steps = (width.max(1.0) * 2.0).ceil() as i32;
        for i in 0..=steps {
            let offset = (i as f32 / steps as f32 - 0.5) * width;
            self.line(
                (from.0 + nx * offset, from.1 + ny * offset),
                (to.0 + nx * offset, to.1 + ny * offset),
                color,
            );
        }
    }

    /// Filled disk blended over the current contents
    pub fn blend_disk(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba<u8>, alpha: f32) {
        let r2 = radius * radius;
        let (x0, x1) = ((cx - radius).floor() as i64, (cx + radius).ceil() as i64);
        let (y0, y1) = ((cy - radius).floor() as i64, (cy + radius).ceil() as i64);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let (dx, dy) = (px as f32 - cx, py as f32 - cy);
                if dx * dx + dy * dy <= r2 {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }

    /// Rendered size of `text`; zero without a font
    pub fn text_size(&self, size: f32, text: &str) -> (u32, u32) {
        match self.font {
            Some(font) if !text.is_empty() => text_size(PxScale::from(size), font, text),
            _ => (0, 0),
        }
    }

    /// Draw a single line of text vertically centred on `y`
    pub fn text(&mut self, x: f32, y: f32, size: f32, color: Rgba<u8>, align: Align, text: &str) {
        let Some(font) = self.font else {
            return;
        };
        if text.is_empty() {
            return;
        }
        let (w, h) = text_size(PxScale::from(size), font, text);
        let left = match align {
            Align::Left => x,
            Align::Center => x - w as f32 / 2.0,
            Align::Right => x - w as f32,
        };
        let top = y - h as f32 / 2.0;
        draw_text_mut(
            &mut self.image,
            color,
            left.round() as i32,
            top.round() as i32,
            PxScale::from(size),
            font,
            text,
        );
    }

    /// Text rotated a quarter turn counter-clockwise
    ///
    /// `(x, y)` is the horizontal centre and the top edge of the rotated
    /// text when `hang` is set (tick labels under an axis), otherwise its centre.
    pub fn text_vertical(&mut self, x: f32, y: f32, size: f32, color: Rgba<u8>, hang: bool, text: &str) {
        let Some(font) = self.font else {
            return;
        };
        if text.is_empty() {
            return;
        }
        let (w, h) = text_size(PxScale::from(size), font, text);
        let mut layer = RgbaImage::from_pixel(w + 2, h + 2, Rgba([255, 255, 255, 0]));
        draw_text_mut(&mut layer, color, 1, 1, PxScale::from(size), font, text);
        let rotated = imageops::rotate270(&layer);

        let left = x - rotated.width() as f32 / 2.0;
        let top = if hang {
            y
        } else {
            y - rotated.height() as f32 / 2.0
        };
        imageops::overlay(&mut self.image, &rotated, left.round() as i64, top.round() as i64);
    }

    /// Write the image as PNG, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ChartError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.image.save(path)?;
        Ok(())
    }
}

/// Parse `#rrggbb` into an opaque colour
pub fn hex(code: &str) -> Rgba<u8> {
    let code = code.trim_start_matches('#');
    let channel = |i: usize| {
        code.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    Rgba([channel(0), channel(2), channel(4), 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(hex("#3498db"), Rgba([0x34, 0x98, 0xdb, 255]));
        assert_eq!(hex("e74c3c"), Rgba([0xe7, 0x4c, 0x3c, 255]));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut canvas = Canvas::new(10, 10, None);
        canvas.fill_rect(-5.0, 8.0, 8.0, 10.0, BLACK);
        assert_eq!(*canvas.image().get_pixel(0, 9), BLACK);
        assert_eq!(*canvas.image().get_pixel(2, 9), BLACK);
        assert_eq!(*canvas.image().get_pixel(3, 9), WHITE);
        assert_eq!(*canvas.image().get_pixel(0, 7), WHITE);
    }

    #[test]
    fn test_negative_extent_rect() {
        let mut canvas = Canvas::new(10, 10, None);
        canvas.fill_rect(6.0, 6.0, -4.0, -4.0, BLACK);
        assert_eq!(*canvas.image().get_pixel(3, 3), BLACK);
        assert_eq!(*canvas.image().get_pixel(7, 7), WHITE);
    }

    #[test]
    fn test_blend_half() {
        let mut canvas = Canvas::new(4, 4, None);
        canvas.blend_disk(2.0, 2.0, 1.0, Rgba([0, 0, 255, 255]), 0.5);
        let p = canvas.image().get_pixel(2, 2);
        assert_eq!(p[2], 255);
        assert!((126..=128).contains(&p[0]));
        // Second pass darkens further
        canvas.blend_disk(2.0, 2.0, 1.0, Rgba([0, 0, 255, 255]), 0.5);
        assert!(canvas.image().get_pixel(2, 2)[0] < 70);
    }

    #[test]
    fn test_text_without_font_is_noop() {
        let mut canvas = Canvas::new(20, 20, None);
        canvas.text(10.0, 10.0, 12.0, BLACK, Align::Center, "label");
        canvas.text_vertical(10.0, 10.0, 12.0, BLACK, false, "label");
        assert!(canvas.image().pixels().all(|p| *p == WHITE));
        assert_eq!(canvas.text_size(12.0, "label"), (0, 0));
    }

    #[test]
    fn test_configured_font_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_font(Some(dir.path().join("nope.ttf").as_path())).is_err());

        let bogus = dir.path().join("bogus.ttf");
        std::fs::write(&bogus, b"not a font").unwrap();
        assert!(matches!(load_font(Some(bogus.as_path())), Err(ChartError::Font(_))));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img").join("blank.png");
        Canvas::new(8, 8, None).save(&path).unwrap();
        assert!(path.exists());
    }
}
