#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// KML `aabbggrr` notation.
    pub fn to_kml(&self) -> String {
        format!("{:02x}{:02x}{:02x}{:02x}", self.a, self.b, self.g, self.r)
    }
}

/// Picks the color of one buffer size.
pub trait ColorScheme: Send + Sync {
    fn color(&self, index: usize, distance_km: f64, max_distance_km: f64) -> Color;
}

/// Red for the smallest distances, blue for the largest.
pub struct Gradient;

impl ColorScheme for Gradient {
    fn color(&self, _index: usize, distance_km: f64, max_distance_km: f64) -> Color {
        let norm = if max_distance_km == 0.0 {
            0.5
        } else {
            (distance_km / max_distance_km).clamp(0.0, 1.0)
        };
        let r = (255.0 * (1.0 - norm)) as u8;
        let b = (255.0 * norm) as u8;
        Color::rgba(r, 0, b, 0xcc)
    }
}

/// Fixed palette by request index, then golden-ratio hue steps.
pub struct Palette {
    colors: Vec<Color>,
}

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618033988749895;

impl Default for Palette {
    fn default() -> Self {
        Palette {
            colors: vec![
                Color::rgba(0xe6, 0x19, 0x4b, 0xcc),
                Color::rgba(0x3c, 0xb4, 0x4b, 0xcc),
                Color::rgba(0x43, 0x63, 0xd8, 0xcc),
                Color::rgba(0xf5, 0x82, 0x31, 0xcc),
                Color::rgba(0x91, 0x1e, 0xb4, 0xcc),
                Color::rgba(0x42, 0xd4, 0xf4, 0xcc),
                Color::rgba(0xf0, 0x32, 0xe6, 0xcc),
                Color::rgba(0xbf, 0xef, 0x45, 0xcc),
            ],
        }
    }
}

impl ColorScheme for Palette {
    fn color(&self, index: usize, _distance_km: f64, _max_distance_km: f64) -> Color {
        if let Some(c) = self.colors.get(index) {
            return *c;
        }
        let overflow = index - self.colors.len();
        let h = ((overflow + 1) as f64 * GOLDEN_RATIO_CONJUGATE).fract();
        let (r, g, b) = hsl_to_rgb(h, 0.85, 0.5);
        Color::rgba(
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
            0xcc,
        )
    }
}

/// `h`, `s` and `l` in `[0, 1]`.
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}
