// src/wordcloud/colors.rs
//! Background colour parsing and named colormaps.

use image::Rgb;

/// Parse a named colour or `#rgb` / `#rrggbb`.
pub fn parse_color(s: &str) -> Option<Rgb<u8>> {
    let s = s.trim().to_ascii_lowercase();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let rgb = match s.as_str() {
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "gray" | "grey" => [128, 128, 128],
        "lightgray" | "lightgrey" => [211, 211, 211],
        "navy" => [0, 0, 128],
        "ivory" => [255, 255, 240],
        _ => return None,
    };
    Some(Rgb(rgb))
}

fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(Rgb(out))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb([r, g, b]))
        }
        _ => None,
    }
}

/// A piecewise-linear colormap over evenly spaced stops.
#[derive(Debug, Clone, Copy)]
pub struct Colormap {
    stops: &'static [[u8; 3]],
}

const VIRIDIS: &[[u8; 3]] = &[
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];
const PLASMA: &[[u8; 3]] = &[
    [13, 8, 135],
    [126, 3, 168],
    [204, 71, 120],
    [248, 149, 64],
    [240, 249, 33],
];
const INFERNO: &[[u8; 3]] = &[
    [0, 0, 4],
    [87, 16, 110],
    [188, 55, 84],
    [249, 142, 9],
    [252, 255, 164],
];
const MAGMA: &[[u8; 3]] = &[
    [0, 0, 4],
    [81, 18, 124],
    [183, 55, 121],
    [252, 137, 97],
    [252, 253, 191],
];
const CIVIDIS: &[[u8; 3]] = &[
    [0, 34, 78],
    [65, 77, 107],
    [124, 123, 120],
    [188, 175, 111],
    [254, 232, 56],
];
const GREYS: &[[u8; 3]] = &[[255, 255, 255], [150, 150, 150], [0, 0, 0]];

impl Colormap {
    pub fn by_name(name: &str) -> Option<Self> {
        let stops = match name.trim().to_ascii_lowercase().as_str() {
            "viridis" => VIRIDIS,
            "plasma" => PLASMA,
            "inferno" => INFERNO,
            "magma" => MAGMA,
            "cividis" => CIVIDIS,
            "greys" | "grays" => GREYS,
            _ => return None,
        };
        Some(Self { stops })
    }

    /// Sample at `t` in [0,1] (clamped).
    pub fn sample(&self, t: f64) -> Rgb<u8> {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let segs = self.stops.len() - 1;
        let pos = t * segs as f64;
        let i = (pos.floor() as usize).min(segs - 1);
        let frac = pos - i as f64;
        let (a, b) = (self.stops[i], self.stops[i + 1]);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        Rgb([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])])
    }
}
