//! Text rasterization.
//!
//! The default face is the Spleen 12×24 bitmap font, scaled so one cell is
//! `fontSize` pixels tall. A TTF font can be loaded instead and is drawn
//! anti-aliased with ab_glyph. Either way the output is a coverage mask the
//! compositor tints with the block's fill.

use ab_glyph::{Font, FontArc, ScaleFont};
use spleen_font::{PSF2Font, FONT_12X24};
use std::path::Path;

use crate::error::LienzoError;

const CELL_WIDTH: usize = 12;
const CELL_HEIGHT: usize = 24;

/// Coverage mask: 0.0 is empty, 1.0 fully covered.
#[derive(Debug, Clone)]
pub struct TextMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl TextMask {
    fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    fn add(&mut self, x: i64, y: i64, coverage: f32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let idx = y as usize * self.width + x as usize;
            self.data[idx] = (self.data[idx] + coverage).min(1.0);
        }
    }
}

/// The face text blocks are drawn with.
#[derive(Clone, Default)]
pub enum TextRenderer {
    #[default]
    Bitmap,
    Ttf(FontArc),
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextRenderer::Bitmap => f.write_str("TextRenderer::Bitmap"),
            TextRenderer::Ttf(_) => f.write_str("TextRenderer::Ttf"),
        }
    }
}

impl TextRenderer {
    /// Load a TTF/OTF font from disk, or the bitmap face when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, LienzoError> {
        let Some(path) = path else {
            return Ok(TextRenderer::Bitmap);
        };
        let bytes = std::fs::read(path).map_err(|e| {
            LienzoError::Config(format!("Failed to read font {}: {}", path.display(), e))
        })?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| {
            LienzoError::Config(format!("Invalid font {}: {}", path.display(), e))
        })?;
        Ok(TextRenderer::Ttf(font))
    }

    /// Rasterize `text` at `font_size` pixels. `\n` starts a new line.
    pub fn render(&self, text: &str, font_size: f64) -> TextMask {
        let size = font_size.max(1.0) as f32;
        match self {
            TextRenderer::Bitmap => render_bitmap(text, size),
            TextRenderer::Ttf(font) => render_ttf(font, text, size),
        }
    }
}

fn render_bitmap(text: &str, size: f32) -> TextMask {
    let scale = size / CELL_HEIGHT as f32;
    let cell_w = (CELL_WIDTH as f32 * scale).ceil().max(1.0) as usize;
    let cell_h = size.ceil().max(1.0) as usize;

    let lines: Vec<&str> = text.split('\n').collect();
    let columns = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut mask = TextMask::new(columns * cell_w, lines.len() * cell_h);

    let Ok(mut font) = PSF2Font::new(FONT_12X24) else {
        return mask;
    };
    for (row, line) in lines.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let glyph = glyph_bits(&mut font, ch);
            let ox = (col * cell_w) as i64;
            let oy = (row * cell_h) as i64;
            for dy in 0..cell_h {
                let sy = ((dy as f32 / scale) as usize).min(CELL_HEIGHT - 1);
                for dx in 0..cell_w {
                    let sx = ((dx as f32 / scale) as usize).min(CELL_WIDTH - 1);
                    if glyph[sy * CELL_WIDTH + sx] {
                        mask.add(ox + dx as i64, oy + dy as i64, 1.0);
                    }
                }
            }
        }
    }
    mask
}

/// One 12×24 glyph as booleans. Unknown characters render as an outlined box.
fn glyph_bits(font: &mut PSF2Font, ch: char) -> Vec<bool> {
    let mut bits = vec![false; CELL_WIDTH * CELL_HEIGHT];
    if ch == ' ' {
        return bits;
    }
    let utf8 = ch.to_string();
    match font.glyph_for_utf8(utf8.as_bytes()) {
        Some(glyph) => {
            for (y, row) in glyph.enumerate() {
                for (x, on) in row.enumerate() {
                    if x < CELL_WIDTH && y < CELL_HEIGHT {
                        bits[y * CELL_WIDTH + x] = on;
                    }
                }
            }
        }
        None => {
            for x in 1..CELL_WIDTH - 1 {
                bits[2 * CELL_WIDTH + x] = true;
                bits[(CELL_HEIGHT - 3) * CELL_WIDTH + x] = true;
            }
            for y in 2..CELL_HEIGHT - 2 {
                bits[y * CELL_WIDTH + 1] = true;
                bits[y * CELL_WIDTH + CELL_WIDTH - 2] = true;
            }
        }
    }
    bits
}

fn render_ttf(font: &FontArc, text: &str, size: f32) -> TextMask {
    let scaled = font.as_scaled(size);
    let ascent = scaled.ascent();
    let line_height = (ascent - scaled.descent()).ceil().max(1.0);

    let lines: Vec<Vec<(ab_glyph::GlyphId, f32)>> = text
        .split('\n')
        .map(|line| {
            let mut caret = 0.0f32;
            line.chars()
                .map(|ch| {
                    let id = font.glyph_id(ch);
                    let at = caret;
                    caret += scaled.h_advance(id);
                    (id, at)
                })
                .collect()
        })
        .collect();

    let width = lines
        .iter()
        .filter_map(|l| l.last())
        .map(|&(id, x)| x + scaled.h_advance(id))
        .fold(0.0f32, f32::max)
        .ceil() as usize;
    let mut mask = TextMask::new(width, lines.len() * line_height as usize);

    for (row, glyphs) in lines.iter().enumerate() {
        let baseline = row as f32 * line_height + ascent;
        for &(id, x) in glyphs {
            let glyph = id.with_scale_and_position(size, ab_glyph::point(x, baseline));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    mask.add(
                        px as i64 + bounds.min.x as i64,
                        py as i64 + bounds.min.y as i64,
                        coverage,
                    );
                });
            }
        }
    }
    mask
}
