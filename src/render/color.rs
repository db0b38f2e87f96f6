//! CSS-style color strings to RGBA.
//!
//! Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
//! `rgba(r, g, b, a)`, `transparent` and a handful of named colors.
//! Anything else parses as `None`; [`parse_color`] falls back to opaque black.

use image::Rgba;

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Parse a color, falling back to opaque black.
pub fn parse_color(input: &str) -> Rgba<u8> {
    try_parse_color(input).unwrap_or(BLACK)
}

pub fn try_parse_color(input: &str) -> Option<Rgba<u8>> {
    let s = input.trim().to_ascii_lowercase();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = s.strip_prefix("rgba(").and_then(|r| r.strip_suffix(')')) {
        return parse_rgb_args(args, true);
    }
    if let Some(args) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        return parse_rgb_args(args, false);
    }
    named(&s)
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 255])),
        4 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?])),
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

fn parse_rgb_args(args: &str, with_alpha: bool) -> Option<Rgba<u8>> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let v: f64 = s.parse().ok()?;
        Some(v.clamp(0.0, 255.0).round() as u8)
    };
    let alpha = if with_alpha {
        let a: f64 = parts[3].parse().ok()?;
        (a.clamp(0.0, 1.0) * 255.0).round() as u8
    } else {
        255
    };
    Some(Rgba([
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ]))
}

fn named(name: &str) -> Option<Rgba<u8>> {
    let rgb = match name {
        "transparent" => return Some(Rgba([0, 0, 0, 0])),
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "pink" => [255, 192, 203],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "navy" => [0, 0, 128],
        "teal" => [0, 128, 128],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "brown" => [165, 42, 42],
        "maroon" => [128, 0, 0],
        "olive" => [128, 128, 0],
        _ => return None,
    };
    Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// Multiply the alpha channel by `factor` (0..=1).
pub fn with_opacity(color: Rgba<u8>, factor: f64) -> Rgba<u8> {
    let a = (color[3] as f64 * factor.clamp(0.0, 1.0)).round() as u8;
    Rgba([color[0], color[1], color[2], a])
}

/// Linear interpolation between two colors, `t` in 0..=1.
pub fn lerp(a: Rgba<u8>, b: Rgba<u8>, t: f64) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    Rgba([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), mix(a[3], b[3])])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_color("#fff"), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_color("#FF0000"), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color("#00ff0080"), Rgba([0, 255, 0, 128]));
        assert_eq!(parse_color("#0f08"), Rgba([0, 255, 0, 136]));
    }

    #[test]
    fn test_functional_forms() {
        assert_eq!(parse_color("rgb(10, 20, 30)"), Rgba([10, 20, 30, 255]));
        assert_eq!(parse_color("rgba(10,20,30,0.5)"), Rgba([10, 20, 30, 128]));
        assert_eq!(parse_color("RGB(300, 0, 0)"), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_named_and_fallback() {
        assert_eq!(parse_color("Orange"), Rgba([255, 165, 0, 255]));
        assert_eq!(parse_color("transparent")[3], 0);
        assert_eq!(parse_color("not-a-color"), BLACK);
        assert_eq!(parse_color("#12"), BLACK);
        assert!(try_parse_color("#zzz").is_none());
    }

    #[test]
    fn test_lerp_and_opacity() {
        let mid = lerp(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255]), 0.5);
        assert_eq!(mid, Rgba([128, 128, 128, 255]));
        assert_eq!(with_opacity(Rgba([1, 2, 3, 200]), 0.5)[3], 100);
    }
}
