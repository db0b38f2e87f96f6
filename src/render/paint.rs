//! Sprite painting and compositing primitives.
//!
//! Blocks are drawn into their own sprite first, then composited onto the
//! canvas with opacity and rotation. All pixels are straight (not
//! premultiplied) RGBA.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use super::fill::Fill;

/// Supersampling grid per axis for anti-aliased shape edges.
const SUBSAMPLES: usize = 4;

/// Source-over blend of `src` onto `dst`, with `src` alpha scaled by `opacity`.
#[inline]
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: f64) {
    let sa = src[3] as f64 / 255.0 * opacity;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let sc = src[c] as f64;
        let dc = dst[c] as f64;
        dst[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Fill a whole image with `fill`, alpha scaled by `opacity`.
pub fn fill_image(image: &mut RgbaImage, fill: &Fill, opacity: f64) {
    let (w, h) = image.dimensions();
    let row_len = w as usize * 4;
    if row_len == 0 {
        return;
    }
    image
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let c = fill.sample(x as f64, y as f64, w as f64, h as f64);
                let a = (c[3] as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
                px.copy_from_slice(&[c[0], c[1], c[2], a]);
            }
        });
}

/// Paint a `w`×`h` sprite whose coverage is given by an inside test in
/// sprite coordinates.
pub fn rasterize<F>(w: u32, h: u32, fill: &Fill, inside: F) -> RgbaImage
where
    F: Fn(f64, f64) -> bool + Sync,
{
    let mut sprite = RgbaImage::new(w.max(1), h.max(1));
    let (sw, sh) = sprite.dimensions();
    let row_len = sw as usize * 4;
    let step = 1.0 / SUBSAMPLES as f64;
    sprite
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let mut hits = 0usize;
                for sy in 0..SUBSAMPLES {
                    for sx in 0..SUBSAMPLES {
                        let fx = x as f64 + (sx as f64 + 0.5) * step;
                        let fy = y as f64 + (sy as f64 + 0.5) * step;
                        if inside(fx, fy) {
                            hits += 1;
                        }
                    }
                }
                if hits == 0 {
                    continue;
                }
                let coverage = hits as f64 / (SUBSAMPLES * SUBSAMPLES) as f64;
                let c = fill.sample(x as f64, y as f64, sw as f64, sh as f64);
                let a = (c[3] as f64 * coverage).round() as u8;
                px.copy_from_slice(&[c[0], c[1], c[2], a]);
            }
        });
    sprite
}

/// Composite `sprite` onto `dst` with its top-left at (`x`, `y`), rotated
/// `rotation` degrees clockwise about the sprite centre.
pub fn composite(dst: &mut RgbaImage, sprite: &RgbaImage, x: f64, y: f64, rotation: f64, opacity: f64) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }
    let (sw, sh) = sprite.dimensions();
    let (dw, dh) = dst.dimensions();

    if rotation.rem_euclid(360.0).abs() < f64::EPSILON {
        let ox = x.round() as i64;
        let oy = y.round() as i64;
        for (sx, sy, px) in sprite.enumerate_pixels() {
            let dx = ox + sx as i64;
            let dy = oy + sy as i64;
            if dx >= 0 && dy >= 0 && (dx as u32) < dw && (dy as u32) < dh {
                blend_over(dst.get_pixel_mut(dx as u32, dy as u32), *px, opacity);
            }
        }
        return;
    }

    let (sin, cos) = rotation.to_radians().sin_cos();
    let half_w = sw as f64 / 2.0;
    let half_h = sh as f64 / 2.0;
    let cx = x + half_w;
    let cy = y + half_h;

    // Axis-aligned bounds of the rotated sprite.
    let ext_x = (half_w * cos).abs() + (half_h * sin).abs();
    let ext_y = (half_w * sin).abs() + (half_h * cos).abs();
    let x0 = ((cx - ext_x).floor() as i64).max(0);
    let y0 = ((cy - ext_y).floor() as i64).max(0);
    let x1 = ((cx + ext_x).ceil() as i64).min(dw as i64);
    let y1 = ((cy + ext_y).ceil() as i64).min(dh as i64);

    for py in y0..y1 {
        for px in x0..x1 {
            let rx = px as f64 + 0.5 - cx;
            let ry = py as f64 + 0.5 - cy;
            let lx = rx * cos + ry * sin + half_w;
            let ly = -rx * sin + ry * cos + half_h;
            if lx < 0.0 || ly < 0.0 || lx >= sw as f64 || ly >= sh as f64 {
                continue;
            }
            let src = *sprite.get_pixel(lx as u32, ly as u32);
            blend_over(dst.get_pixel_mut(px as u32, py as u32), src, opacity);
        }
    }
}
