//! Font resolution and glyph rasterization.
//!
//! Faces are looked up through an ordered chain of strategies: each configured
//! TrueType file in turn, then the built-in 8x8 bitmap font. The first strategy
//! that produces a face wins and the last one cannot fail, so a missing font file
//! never stops rendering.

use common::model::field::MAX_FONT_SIZE;
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};
use log::{debug, info, warn};
use rusttype::{point, Font, Scale};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File names tried, in order, inside the fonts directory.
pub const PREFERRED_FONT_FILES: [&str; 3] = ["arial.ttf", "Arial.ttf", "LiberationSans-Regular.ttf"];

const BITMAP_GLYPH_SIZE: u32 = 8;

/// One way of obtaining a face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontStrategy {
    /// A scalable font file on disk.
    File(PathBuf),
    /// The built-in bitmap font. Always available.
    Builtin,
}

impl FontStrategy {
    fn load(&self) -> Option<Face> {
        match self {
            FontStrategy::File(path) => match fs::read(path) {
                Ok(bytes) => match Font::try_from_vec(bytes) {
                    Some(font) => Some(Face::Scalable(Arc::new(font))),
                    None => {
                        warn!("{} is not a usable TrueType font", path.display());
                        None
                    }
                },
                Err(e) => {
                    debug!("font {} unavailable: {}", path.display(), e);
                    None
                }
            },
            FontStrategy::Builtin => Some(Face::Bitmap),
        }
    }
}

/// Ordered list of [`FontStrategy`]s ending with [`FontStrategy::Builtin`].
#[derive(Debug, Clone)]
pub struct FontChain {
    strategies: Vec<FontStrategy>,
}

impl FontChain {
    /// The preferred font files inside `fonts_dir`, then the bitmap fallback.
    pub fn from_dir(fonts_dir: &Path) -> Self {
        let files = PREFERRED_FONT_FILES.iter().map(|name| fonts_dir.join(name));
        Self::from_files(files)
    }

    pub fn from_files(files: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut strategies: Vec<FontStrategy> = files.into_iter().map(FontStrategy::File).collect();
        strategies.push(FontStrategy::Builtin);
        Self { strategies }
    }

    /// Only the bitmap font.
    pub fn builtin() -> Self {
        Self {
            strategies: vec![FontStrategy::Builtin],
        }
    }

    pub fn strategies(&self) -> &[FontStrategy] {
        &self.strategies
    }

    /// Tries every strategy in order and returns the first face that loads.
    pub fn resolve(&self) -> Face {
        for strategy in &self.strategies {
            if let Some(face) = strategy.load() {
                match strategy {
                    FontStrategy::File(path) => info!("Using font {}", path.display()),
                    FontStrategy::Builtin => info!("No scalable font found, using built-in bitmap font"),
                }
                return face;
            }
        }
        Face::Bitmap
    }
}

/// A resolved face, able to measure and draw text at any pixel size.
#[derive(Clone)]
pub enum Face {
    Scalable(Arc<Font<'static>>),
    Bitmap,
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Scalable(_) => f.write_str("Face::Scalable"),
            Face::Bitmap => f.write_str("Face::Bitmap"),
        }
    }
}

impl Face {
    pub fn is_scalable(&self) -> bool {
        matches!(self, Face::Scalable(_))
    }

    /// Width and height of the box `text` occupies at `size` pixels.
    ///
    /// Sizes are capped at [`MAX_FONT_SIZE`], here and in [`Face::draw_centered`].
    pub fn measure(&self, text: &str, size: u32) -> (f32, f32) {
        let size = drawable_size(size);
        match self {
            Face::Scalable(font) => {
                let scale = Scale::uniform(size as f32);
                let v_metrics = font.v_metrics(scale);
                let width = font
                    .layout(text, scale, point(0.0, 0.0))
                    .last()
                    .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                    .unwrap_or(0.0);
                (width, v_metrics.ascent - v_metrics.descent)
            }
            Face::Bitmap => {
                let cell = bitmap_cell(size) as f32;
                (cell * text.chars().count() as f32, cell)
            }
        }
    }

    /// Draws `text` so that the center of its box lands on `(cx, cy)`.
    /// Pixels falling outside the image are dropped.
    pub fn draw_centered(&self, img: &mut RgbaImage, text: &str, size: u32, cx: f32, cy: f32, color: Rgba<u8>) {
        if text.is_empty() {
            return;
        }
        let size = drawable_size(size);
        let (width, height) = self.measure(text, size);
        let left = cx - width / 2.0;
        let top = cy - height / 2.0;

        match self {
            Face::Scalable(font) => draw_scalable(img, font, text, size, left, top, color),
            Face::Bitmap => draw_bitmap(img, text, size, left, top, color),
        }
    }
}

fn draw_scalable(
    img: &mut RgbaImage,
    font: &Font<'static>,
    text: &str,
    size: u32,
    left: f32,
    top: f32,
    color: Rgba<u8>,
) {
    let scale = Scale::uniform(size as f32);
    let baseline = top + font.v_metrics(scale).ascent;

    let (width, height) = (img.width() as i32, img.height() as i32);
    for glyph in font.layout(text, scale, point(left, baseline)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            if bb.max.x <= 0 || bb.max.y <= 0 || bb.min.x >= width || bb.min.y >= height {
                continue;
            }
            glyph.draw(|gx, gy, coverage| {
                blend_pixel(img, gx as i32 + bb.min.x, gy as i32 + bb.min.y, color, coverage);
            });
        }
    }
}

fn draw_bitmap(img: &mut RgbaImage, text: &str, size: u32, left: f32, top: f32, color: Rgba<u8>) {
    let cell = bitmap_cell(size) as i64;
    let factor = cell / BITMAP_GLYPH_SIZE as i64;
    let (width, height) = (img.width() as i64, img.height() as i64);
    let origin_x = left.round() as i64;
    let origin_y = top.round() as i64;

    for (i, ch) in text.chars().enumerate() {
        let glyph_x = origin_x + i as i64 * cell;
        if glyph_x >= width {
            break;
        }
        if glyph_x + cell <= 0 || origin_y >= height || origin_y + cell <= 0 {
            continue;
        }
        let Some(rows) = bitmap_glyph(ch) else {
            continue;
        };
        for (row, bits) in rows.iter().enumerate() {
            let y0 = origin_y + row as i64 * factor;
            let (ys, ye) = (y0.max(0), (y0 + factor).min(height));
            if ys >= ye {
                continue;
            }
            for col in 0..BITMAP_GLYPH_SIZE {
                // Bit 0 is the leftmost pixel.
                if bits & (1 << col) == 0 {
                    continue;
                }
                let x0 = glyph_x + col as i64 * factor;
                let (xs, xe) = (x0.max(0), (x0 + factor).min(width));
                for y in ys..ye {
                    for x in xs..xe {
                        blend_pixel(img, x as i32, y as i32, color, 1.0);
                    }
                }
            }
        }
    }
}

fn bitmap_glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

fn drawable_size(size: u32) -> u32 {
    size.min(MAX_FONT_SIZE)
}

/// Side of one bitmap glyph cell: the requested size rounded down to a whole
/// multiple of the 8px glyph, never smaller than one glyph.
fn bitmap_cell(size: u32) -> u32 {
    (size / BITMAP_GLYPH_SIZE).max(1) * BITMAP_GLYPH_SIZE
}

/// Source-over blend of `color` at `coverage` onto one pixel.
pub(crate) fn blend_pixel(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0) * color.0[3] as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    let inv = 1.0 - alpha;
    for c in 0..3 {
        dst.0[c] = (color.0[c] as f32 * alpha + dst.0[c] as f32 * inv).round() as u8;
    }
    dst.0[3] = (255.0 * alpha + dst.0[3] as f32 * inv).round() as u8;
}
