use std::fmt;

use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Rgb – renderer-independent colour
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Parse `#RRGGBB`.
    pub const fn from_hex(hex: u32) -> Self {
        Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    fn to_linear(self) -> LinSrgb {
        Srgb::new(self.0, self.1, self.2)
            .into_format::<f32>()
            .into_linear()
    }

    fn from_linear(color: LinSrgb) -> Self {
        let srgb: Srgb<u8> = Srgb::<f32>::from_linear(color).into_format();
        Rgb(srgb.red, srgb.green, srgb.blue)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
/// Used for per-cell trajectories, where the number of series is data driven.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.75, 0.45).into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Continuous colour scale
// ---------------------------------------------------------------------------

/// Evenly spaced colour stops over `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub stops: Vec<Rgb>,
}

impl ColorScale {
    pub fn new(stops: &[Rgb]) -> Self {
        ColorScale {
            stops: stops.to_vec(),
        }
    }

    /// Colour at position `t` (clamped to `[0, 1]`).
    pub fn sample(&self, t: f64) -> Rgb {
        match self.stops.len() {
            0 => Rgb(128, 128, 128),
            1 => self.stops[0],
            n => {
                let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
                let pos = t * (n - 1) as f64;
                let lo = (pos.floor() as usize).min(n - 2);
                let frac = (pos - lo as f64) as f32;
                let a = self.stops[lo].to_linear();
                let b = self.stops[lo + 1].to_linear();
                Rgb::from_linear(a.mix(b, frac))
            }
        }
    }

    /// Colour for `value` on the range `[min, max]`.
    pub fn color_for(&self, value: f64, min: f64, max: f64) -> Rgb {
        if max <= min {
            return self.sample(0.0);
        }
        self.sample((value - min) / (max - min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_display() {
        assert_eq!(Rgb::from_hex(0x1768AC), Rgb(0x17, 0x68, 0xAC));
        assert_eq!(Rgb(0xF7, 0x25, 0x85).to_string(), "#F72585");
    }

    #[test]
    fn scale_hits_end_stops() {
        let scale = ColorScale::new(&[Rgb(218, 235, 255), Rgb(0, 10, 68)]);
        assert_eq!(scale.color_for(0.0, 0.0, 3.0), Rgb(218, 235, 255));
        assert_eq!(scale.color_for(3.0, 0.0, 3.0), Rgb(0, 10, 68));
        // out-of-range values clamp
        assert_eq!(scale.color_for(7.0, 0.0, 3.0), Rgb(0, 10, 68));
    }

    #[test]
    fn palette_is_distinct() {
        let colors = generate_palette(6);
        assert_eq!(colors.len(), 6);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }
}
