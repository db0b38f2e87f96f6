//! # Rasterizer
//!
//! Deterministic CPU rendering of a canvas and its blocks to an RGBA image.
//!
//! ## Pipeline
//!
//! 1. The background (solid or gradient) is painted at canvas opacity.
//! 2. Blocks are visited in paint order (ascending `zIndex`, stable).
//!    Blocks on hidden layers are skipped and groups paint nothing.
//! 3. Each block is drawn into its own sprite, then composited at its
//!    position with rotation about its centre and block × layer opacity.
//!
//! The same input always produces the same pixels.

pub mod color;
pub mod fill;
pub mod paint;
pub mod text;

pub use fill::Fill;
pub use text::TextRenderer;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;

use crate::assets::ImageStore;
use crate::error::LienzoError;
use crate::model::{
    paint_order, Block, BlockKind, CanvasSettings, EditorState, ImageBlock, Layer, LayerId,
    LineBlock, LineEndType, LineType, ShapeBlock, ShapeType,
};
use crate::template::FALLBACK_IMAGE_URL;
use paint::{composite, fill_image, rasterize};

const PLACEHOLDER_FILL: Rgba<u8> = Rgba([224, 224, 224, 255]);
const PLACEHOLDER_INK: Rgba<u8> = Rgba([160, 160, 160, 255]);

/// Everything needed to draw one frame: the canvas, its blocks and the
/// layers they may belong to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    pub canvas: CanvasSettings,
    pub blocks: Vec<Block>,
    pub layers: Vec<Layer>,
}

impl Surface {
    /// The live canvas of an editor session.
    pub fn live(state: &EditorState) -> Self {
        Self {
            canvas: state.canvas.clone(),
            blocks: state.blocks.clone(),
            layers: state.layers.clone(),
        }
    }

    /// The `index`-th preview set of an editor session.
    pub fn preview(state: &EditorState, index: usize) -> Option<Self> {
        state.preview_canvas_blocks.get(index).map(|blocks| Self {
            canvas: state.canvas.clone(),
            blocks: blocks.clone(),
            layers: state.layers.clone(),
        })
    }
}

/// Draws [`Surface`]s. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    text: TextRenderer,
}

impl Rasterizer {
    pub fn new(text: TextRenderer) -> Self {
        Self { text }
    }

    /// Render a surface at canvas size.
    pub fn render(&self, surface: &Surface, images: &ImageStore) -> RgbaImage {
        self.render_blocks(&surface.canvas, &surface.blocks, &surface.layers, images)
    }

    /// Render a preview surface whose placement is already scaled by `scale`.
    ///
    /// Positions and font sizes of preview blocks are scaled at resolution
    /// time; this shrinks the canvas and the remaining intrinsic geometry to
    /// match.
    pub fn render_scaled(&self, surface: &Surface, images: &ImageStore, scale: f64) -> RgbaImage {
        let mut canvas = surface.canvas.clone();
        canvas.width *= scale;
        canvas.height *= scale;
        let blocks: Vec<Block> = surface
            .blocks
            .iter()
            .cloned()
            .map(|mut b| {
                b.scale_geometry(scale, scale);
                b
            })
            .collect();
        self.render_blocks(&canvas, &blocks, &surface.layers, images)
    }

    fn render_blocks(
        &self,
        canvas: &CanvasSettings,
        blocks: &[Block],
        layers: &[Layer],
        images: &ImageStore,
    ) -> RgbaImage {
        let width = canvas.width.round().max(1.0) as u32;
        let height = canvas.height.round().max(1.0) as u32;
        let mut frame = RgbaImage::new(width, height);

        let background = Fill::new(&canvas.background_color, canvas.effective_gradient());
        fill_image(&mut frame, &background, canvas.opacity);

        let layers: HashMap<&LayerId, &Layer> = layers.iter().map(|l| (&l.id, l)).collect();
        for block in paint_order(blocks) {
            let layer = block.layer_id.as_ref().and_then(|id| layers.get(id));
            if layer.is_some_and(|l| !l.visible) {
                continue;
            }
            let opacity = block.opacity * layer.map_or(1.0, |l| l.opacity);
            if let Some((sprite, dx, dy)) = self.block_sprite(block, images) {
                composite(
                    &mut frame,
                    &sprite,
                    block.x + dx,
                    block.y + dy,
                    block.rotation,
                    opacity,
                );
            }
        }
        frame
    }

    /// Draw one block into a sprite, with the sprite's offset from the
    /// block position.
    fn block_sprite(&self, block: &Block, images: &ImageStore) -> Option<(RgbaImage, f64, f64)> {
        let gradient = block.effective_gradient();
        match &block.kind {
            BlockKind::Text(t) => {
                let mask = self.text.render(&t.content, t.font_size);
                let fill = Fill::new(&t.color, gradient);
                let (w, h) = (mask.width as u32, mask.height as u32);
                let mut sprite = RgbaImage::new(w, h);
                for (x, y, px) in sprite.enumerate_pixels_mut() {
                    let coverage = mask.get(x as usize, y as usize);
                    if coverage > 0.0 {
                        let c = fill.sample(x as f64, y as f64, w as f64, h as f64);
                        *px = Rgba([c[0], c[1], c[2], (c[3] as f32 * coverage).round() as u8]);
                    }
                }
                Some((sprite, 0.0, 0.0))
            }
            BlockKind::Image(i) => Some((image_sprite(i, images), 0.0, 0.0)),
            BlockKind::Shape(s) => {
                let fill = Fill::new(&s.color, gradient);
                Some((shape_sprite(s, &fill), 0.0, 0.0))
            }
            BlockKind::Line(l) => {
                let (sprite, dy) = line_sprite(l);
                Some((sprite, 0.0, dy))
            }
            BlockKind::Group(_) => None,
        }
    }
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, LienzoError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| LienzoError::Image(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}

fn pixel_size(v: f64) -> u32 {
    v.round().max(1.0) as u32
}

fn image_sprite(block: &ImageBlock, images: &ImageStore) -> RgbaImage {
    let (w, h) = (pixel_size(block.width), pixel_size(block.height));
    let source = if block.url == FALLBACK_IMAGE_URL {
        None
    } else {
        images.get(block.url.trim())
    };
    match source {
        Some(img) => imageops::resize(img, w, h, FilterType::Triangle),
        None => placeholder_sprite(w, h),
    }
}

/// Light box with a border and a diagonal cross.
fn placeholder_sprite(w: u32, h: u32) -> RgbaImage {
    let mut sprite = RgbaImage::from_pixel(w, h, PLACEHOLDER_FILL);
    let border = (w.min(h) / 50).max(1);
    for (x, y, px) in sprite.enumerate_pixels_mut() {
        let on_border = x < border || y < border || x >= w - border || y >= h - border;
        let fx = x as f64 / w as f64;
        let fy = y as f64 / h as f64;
        let tol = border as f64 / w.min(h) as f64;
        let on_cross = (fx - fy).abs() < tol || (fx + fy - 1.0).abs() < tol;
        if on_border || on_cross {
            *px = PLACEHOLDER_INK;
        }
    }
    sprite
}

fn shape_sprite(shape: &ShapeBlock, fill: &Fill) -> RgbaImage {
    let (w, h) = (shape.width.max(1.0), shape.height.max(1.0));
    let (pw, ph) = (pixel_size(w), pixel_size(h));
    match shape.shape_type {
        ShapeType::Rectangle => rasterize(pw, ph, fill, |_, _| true),
        ShapeType::Circle => {
            let (rx, ry) = (w / 2.0, h / 2.0);
            rasterize(pw, ph, fill, move |x, y| {
                let nx = (x - rx) / rx;
                let ny = (y - ry) / ry;
                nx * nx + ny * ny <= 1.0
            })
        }
        ShapeType::Triangle => {
            let apex = (w / 2.0, 0.0);
            let left = (0.0, h);
            let right = (w, h);
            rasterize(pw, ph, fill, move |x, y| {
                in_triangle((x, y), apex, left, right)
            })
        }
    }
}

type Point = (f64, f64);

fn in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let cross = |o: Point, u: Point, v: Point| (u.0 - o.0) * (v.1 - o.1) - (u.1 - o.1) * (v.0 - o.0);
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Marker size relative to the stroke width.
const MARKER_SCALE: f64 = 3.0;

/// Horizontal line sprite and its vertical offset from the block position.
///
/// The stroke occupies `y..y + lineWidth`; the sprite is taller when end
/// markers need the room.
fn line_sprite(line: &LineBlock) -> (RgbaImage, f64) {
    let lw = line.line_width.max(1.0);
    let len = line.length.max(1.0);
    let has_markers = line.line_ends.has_start() || line.line_ends.has_end();
    let marker = if has_markers { lw * MARKER_SCALE } else { 0.0 };
    let height = lw.max(marker);
    let mid = height / 2.0;
    let half = lw / 2.0;

    let (dash_on, dash_off) = match line.line_type {
        LineType::Solid => (f64::INFINITY, 0.0),
        LineType::Dashed => (lw * 3.0, lw * 2.0),
        LineType::Dotted => (lw, lw),
    };
    let period = dash_on + dash_off;
    let start = line.line_ends.has_start();
    let end = line.line_ends.has_end();
    let end_type = line.line_end_type;
    let r = marker / 2.0;

    let fill = Fill::new(&line.color, None);
    let sprite = rasterize(pixel_size(len), pixel_size(height), &fill, move |x, y| {
        let on_stroke = (y - mid).abs() <= half
            && (dash_off == 0.0 || x.rem_euclid(period) < dash_on);
        let on_start = start && in_marker(end_type, x, y - mid, r);
        let on_end = end && in_marker(end_type, len - x, y - mid, r);
        on_stroke || on_start || on_end
    });
    (sprite, half - mid)
}

/// Whether (`along`, `across`) lies in an end marker whose tip sits at
/// `along = 0` and which extends inward along the line.
fn in_marker(kind: LineEndType, along: f64, across: f64, r: f64) -> bool {
    if along < 0.0 {
        return false;
    }
    match kind {
        LineEndType::Circle => {
            let dx = along - r;
            dx * dx + across * across <= r * r
        }
        LineEndType::Square => along <= 2.0 * r && across.abs() <= r,
        LineEndType::Arrow => along <= 2.0 * r && across.abs() <= along / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FillType, Gradient, GradientType, LineEnds, TextBlock};

    fn canvas(w: f64, h: f64) -> CanvasSettings {
        CanvasSettings {
            width: w,
            height: h,
            ..Default::default()
        }
    }

    fn red_square(id: &str, x: f64, y: f64) -> Block {
        Block::new(
            id,
            BlockKind::Shape(ShapeBlock {
                width: 10.0,
                height: 10.0,
                color: "#ff0000".into(),
                ..Default::default()
            }),
        )
        .at(x, y)
    }

    fn render(surface: &Surface) -> RgbaImage {
        Rasterizer::default().render(surface, &ImageStore::default())
    }

    #[test]
    fn test_background_and_size() {
        let surface = Surface {
            canvas: CanvasSettings {
                background_color: "#0000ff".into(),
                ..canvas(20.0, 10.0)
            },
            ..Default::default()
        };
        let img = render(&surface);
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(img.get_pixel(5, 5), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_gradient_background() {
        let surface = Surface {
            canvas: CanvasSettings {
                fill_type: FillType::Gradient,
                gradient: Some(Gradient {
                    kind: GradientType::Linear,
                    colors: vec!["#000000".into(), "#ffffff".into()],
                    direction: None,
                }),
                ..canvas(100.0, 4.0)
            },
            ..Default::default()
        };
        let img = render(&surface);
        assert!(img.get_pixel(0, 2)[0] < img.get_pixel(99, 2)[0]);
    }

    #[test]
    fn test_shape_is_drawn_at_position() {
        let surface = Surface {
            canvas: canvas(40.0, 40.0),
            blocks: vec![red_square("s", 10.0, 10.0)],
            ..Default::default()
        };
        let img = render(&surface);
        assert_eq!(img.get_pixel(15, 15), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(5, 5), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_z_order_and_hidden_layer() {
        let mut blue = red_square("b", 10.0, 10.0).z(5);
        if let BlockKind::Shape(s) = &mut blue.kind {
            s.color = "#0000ff".into();
        }
        let red = red_square("r", 10.0, 10.0).z(1);
        let mut surface = Surface {
            canvas: canvas(40.0, 40.0),
            blocks: vec![blue, red],
            ..Default::default()
        };
        assert_eq!(render(&surface).get_pixel(15, 15), &Rgba([0, 0, 255, 255]));

        let mut hidden = Layer::new("hidden".into(), "Hidden");
        hidden.visible = false;
        surface.layers.push(hidden);
        surface.blocks[0].layer_id = Some("hidden".into());
        assert_eq!(render(&surface).get_pixel(15, 15), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_layer_opacity_multiplies() {
        let mut layer = Layer::new("l".into(), "L");
        layer.opacity = 0.5;
        let mut block = red_square("s", 0.0, 0.0);
        block.layer_id = Some("l".into());
        let surface = Surface {
            canvas: canvas(10.0, 10.0),
            blocks: vec![block],
            layers: vec![layer],
        };
        let px = *render(&surface).get_pixel(5, 5);
        assert_eq!(px, Rgba([255, 128, 128, 255]));
    }

    #[test]
    fn test_text_draws_ink() {
        let surface = Surface {
            canvas: canvas(100.0, 40.0),
            blocks: vec![
                Block::new("t", BlockKind::Text(TextBlock::new("HELLO"))).at(2.0, 2.0),
            ],
            ..Default::default()
        };
        let img = render(&surface);
        assert!(img.pixels().any(|p| p[0] < 128));
    }

    #[test]
    fn test_missing_image_draws_placeholder() {
        let block = Block::new(
            "i",
            BlockKind::Image(ImageBlock {
                url: FALLBACK_IMAGE_URL.into(),
                width: 20.0,
                height: 20.0,
            }),
        );
        let surface = Surface {
            canvas: canvas(30.0, 30.0),
            blocks: vec![block],
            ..Default::default()
        };
        let img = render(&surface);
        assert_eq!(img.get_pixel(0, 0), &PLACEHOLDER_INK);
        assert_eq!(img.get_pixel(15, 3), &PLACEHOLDER_FILL);
    }

    #[test]
    fn test_loaded_image_is_resized() {
        let mut images = ImageStore::default();
        images.insert(
            "mem://green",
            std::sync::Arc::new(RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]))),
        );
        let block = Block::new(
            "i",
            BlockKind::Image(ImageBlock {
                url: "mem://green".into(),
                width: 8.0,
                height: 8.0,
            }),
        );
        let surface = Surface {
            canvas: canvas(8.0, 8.0),
            blocks: vec![block],
            ..Default::default()
        };
        let img = Rasterizer::default().render(&surface, &images);
        let px = img.get_pixel(4, 4);
        assert!(px[0] < 5 && px[1] > 250 && px[2] < 5);
    }

    #[test]
    fn test_line_with_arrows_and_dashes() {
        let line = Block::new(
            "l",
            BlockKind::Line(LineBlock {
                line_width: 2.0,
                length: 60.0,
                line_type: LineType::Dashed,
                line_ends: LineEnds::Both,
                color: "#000000".into(),
                ..Default::default()
            }),
        )
        .at(10.0, 20.0);
        let surface = Surface {
            canvas: canvas(80.0, 40.0),
            blocks: vec![line],
            ..Default::default()
        };
        let img = render(&surface);
        let dark = |x: u32| img.get_pixel(x, 20)[0] < 64;
        assert!((10..70).any(dark));
        assert!((10..70).any(|x| !dark(x)));
        assert!(!dark(75));
    }

    #[test]
    fn test_group_paints_nothing() {
        let surface = Surface {
            canvas: canvas(10.0, 10.0),
            blocks: vec![Block::new(
                "g",
                BlockKind::Group(crate::model::GroupBlock::default()),
            )],
            ..Default::default()
        };
        assert!(render(&surface).pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_render_scaled() {
        let mut block = red_square("s", 10.0, 10.0);
        block.scale_placement(0.5, 0.5, 0.5);
        let surface = Surface {
            canvas: canvas(40.0, 40.0),
            blocks: vec![block],
            ..Default::default()
        };
        let img = Rasterizer::default().render_scaled(&surface, &ImageStore::default(), 0.5);
        assert_eq!(img.dimensions(), (20, 20));
        assert_eq!(img.get_pixel(7, 7), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(11, 11), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&RgbaImage::new(2, 2)).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
