//! Solid and gradient paint sources.

use image::Rgba;

use super::color::{lerp, parse_color};
use crate::model::{Gradient, GradientType};

/// Something that yields a color for every point of a `w`×`h` box.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Rgba<u8>),
    Linear { stops: Vec<Rgba<u8>>, angle: f64 },
    Radial { stops: Vec<Rgba<u8>> },
}

impl Fill {
    /// Gradient fill when one is given, otherwise the solid `color`.
    pub fn new(color: &str, gradient: Option<&Gradient>) -> Self {
        match gradient {
            Some(g) => Self::from_gradient(g),
            None => Fill::Solid(parse_color(color)),
        }
    }

    pub fn from_gradient(gradient: &Gradient) -> Self {
        let stops: Vec<Rgba<u8>> = gradient.colors.iter().map(|c| parse_color(c)).collect();
        if stops.len() == 1 {
            return Fill::Solid(stops[0]);
        }
        match gradient.kind {
            GradientType::Linear => Fill::Linear {
                stops,
                angle: gradient.direction.unwrap_or(0.0),
            },
            GradientType::Radial => Fill::Radial { stops },
        }
    }

    /// Color at pixel (`x`, `y`) of a `w`×`h` box.
    pub fn sample(&self, x: f64, y: f64, w: f64, h: f64) -> Rgba<u8> {
        match self {
            Fill::Solid(c) => *c,
            Fill::Linear { stops, angle } => {
                let (sin, cos) = angle.to_radians().sin_cos();
                let dx = x + 0.5 - w / 2.0;
                let dy = y + 0.5 - h / 2.0;
                let extent = (w / 2.0 * cos).abs() + (h / 2.0 * sin).abs();
                let t = if extent > 0.0 {
                    ((dx * cos + dy * sin) / extent + 1.0) / 2.0
                } else {
                    0.0
                };
                along(stops, t)
            }
            Fill::Radial { stops } => {
                let dx = x + 0.5 - w / 2.0;
                let dy = y + 0.5 - h / 2.0;
                let radius = ((w / 2.0).powi(2) + (h / 2.0).powi(2)).sqrt();
                let t = if radius > 0.0 {
                    (dx * dx + dy * dy).sqrt() / radius
                } else {
                    0.0
                };
                along(stops, t)
            }
        }
    }
}

/// Color at `t` (0..=1) along evenly spaced stops.
fn along(stops: &[Rgba<u8>], t: f64) -> Rgba<u8> {
    match stops.len() {
        0 => Rgba([0, 0, 0, 0]),
        1 => stops[0],
        n => {
            let pos = t.clamp(0.0, 1.0) * (n - 1) as f64;
            let i = (pos.floor() as usize).min(n - 2);
            lerp(stops[i], stops[i + 1], pos - i as f64)
        }
    }
}
