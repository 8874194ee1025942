//! Procedural monochrome icons for OpenWeather icon ids ("01d", "10n", ...).
//!
//! Shapes are defined on the unit square and sampled at pixel centres, so any
//! width gives the same picture at a different resolution.

use std::f64::consts::FRAC_PI_4;

use weather_display_core::{Bitmap, Rasterizer};

#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphRasterizer;

impl Rasterizer for GlyphRasterizer {
    fn rasterize(&self, icon_id: &str, width: u32) -> Bitmap {
        let (glyph, night) = glyph_for(icon_id);
        let size = f64::from(width.max(1));
        Bitmap::from_fn(width, width, |x, y| {
            let u = (f64::from(x) + 0.5) / size;
            let v = (f64::from(y) + 0.5) / size;
            covers(glyph, night, u, v)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glyph {
    Clear,
    FewClouds,
    Clouds,
    Showers,
    Rain,
    Thunder,
    Snow,
    Mist,
    Unknown,
}

fn glyph_for(icon_id: &str) -> (Glyph, bool) {
    let glyph = match icon_id.get(..2) {
        Some("01") => Glyph::Clear,
        Some("02") => Glyph::FewClouds,
        Some("03" | "04") => Glyph::Clouds,
        Some("09") => Glyph::Showers,
        Some("10") => Glyph::Rain,
        Some("11") => Glyph::Thunder,
        Some("13") => Glyph::Snow,
        Some("50") => Glyph::Mist,
        _ => Glyph::Unknown,
    };
    (glyph, icon_id.ends_with('n'))
}

fn covers(glyph: Glyph, night: bool, u: f64, v: f64) -> bool {
    match glyph {
        Glyph::Clear => sky(night, 0.5, 0.5, 0.22, u, v),
        Glyph::FewClouds => sky(night, 0.36, 0.34, 0.15, u, v) || cloud(0.58, 0.6, 0.8, u, v),
        Glyph::Clouds => cloud(0.5, 0.48, 1.0, u, v),
        Glyph::Showers => cloud(0.5, 0.38, 1.0, u, v) || drops(0.62, u, v),
        Glyph::Rain => {
            sky(night, 0.32, 0.26, 0.13, u, v) || cloud(0.56, 0.4, 0.9, u, v) || drops(0.62, u, v)
        }
        Glyph::Thunder => cloud(0.5, 0.36, 1.0, u, v) || bolt(u, v),
        Glyph::Snow => cloud(0.5, 0.38, 1.0, u, v) || flakes(u, v),
        Glyph::Mist => mist(u, v),
        Glyph::Unknown => {
            let d = dist(0.5, 0.5, u, v);
            (0.24..=0.3).contains(&d)
        }
    }
}

fn dist(cx: f64, cy: f64, u: f64, v: f64) -> f64 {
    (u - cx).hypot(v - cy)
}

fn disc(cx: f64, cy: f64, r: f64, u: f64, v: f64) -> bool {
    dist(cx, cy, u, v) <= r
}

fn sky(night: bool, cx: f64, cy: f64, r: f64, u: f64, v: f64) -> bool {
    if night { moon(cx, cy, r, u, v) } else { sun(cx, cy, r, u, v) }
}

/// Disc with eight short rays.
fn sun(cx: f64, cy: f64, r: f64, u: f64, v: f64) -> bool {
    let d = dist(cx, cy, u, v);
    if d <= r {
        return true;
    }
    if !(r * 1.3..=r * 1.7).contains(&d) {
        return false;
    }
    let angle = (v - cy).atan2(u - cx);
    let nearest_ray = (angle / FRAC_PI_4).round() * FRAC_PI_4;
    (angle - nearest_ray).abs() * d < r * 0.12
}

/// Crescent: a disc with an offset disc cut out.
fn moon(cx: f64, cy: f64, r: f64, u: f64, v: f64) -> bool {
    disc(cx, cy, r, u, v) && !disc(cx + r * 0.45, cy - r * 0.25, r * 0.85, u, v)
}

/// Three overlapping puffs over a flat base, centred on `(cx, cy)`.
fn cloud(cx: f64, cy: f64, scale: f64, u: f64, v: f64) -> bool {
    let (x, y) = ((u - cx) / scale, (v - cy) / scale);
    disc(-0.2, 0.02, 0.14, x, y)
        || disc(0.0, -0.06, 0.2, x, y)
        || disc(0.21, 0.04, 0.12, x, y)
        || ((-0.2..=0.21).contains(&x) && (0.0..=0.16).contains(&y))
}

/// Slanted rain streaks starting at `top`.
fn drops(top: f64, u: f64, v: f64) -> bool {
    if !(top..=top + 0.2).contains(&v) {
        return false;
    }
    [0.34, 0.5, 0.66].iter().any(|x0| {
        let x = x0 - (v - top) * 0.3;
        (u - x).abs() < 0.025
    })
}

fn flakes(u: f64, v: f64) -> bool {
    [(0.32, 0.72), (0.5, 0.82), (0.68, 0.72), (0.41, 0.9), (0.59, 0.9)]
        .iter()
        .any(|(cx, cy)| disc(*cx, *cy, 0.035, u, v))
}

fn bolt(u: f64, v: f64) -> bool {
    const POINTS: [(f64, f64); 4] = [(0.56, 0.56), (0.44, 0.74), (0.56, 0.74), (0.44, 0.94)];
    POINTS.windows(2).any(|seg| segment_distance(seg[0], seg[1], u, v) < 0.03)
}

fn mist(u: f64, v: f64) -> bool {
    (0.15..=0.85).contains(&u) && [0.3, 0.44, 0.58, 0.72].iter().any(|row| (v - row).abs() < 0.03)
}

fn segment_distance(a: (f64, f64), b: (f64, f64), u: f64, v: f64) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 { 0.0 } else { (((u - a.0) * dx + (v - a.1) * dy) / len_sq).clamp(0.0, 1.0) };
    dist(a.0 + t * dx, a.1 + t * dy, u, v)
}
