//! Palette definitions mapping normalized values to display colors.

use std::str::FromStr;

use crate::Error;

/// Named palettes for frame display and map coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Palette {
    /// Grayscale - identity mapping, black to white.
    #[default]
    Gray,
    /// Plasma - dark blue to magenta to yellow.
    Plasma,
    /// Jet - blue to cyan to yellow to red.
    Jet,
    /// Viridis - dark blue to teal to yellow.
    Viridis,
    /// Reds - white to dark red.
    Reds,
}

impl std::fmt::Display for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Palette {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Palette::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::NotFound(format!("palette {s:?}")))
    }
}

impl Palette {
    /// Every known palette.
    pub const ALL: [Palette; 5] = [
        Palette::Gray,
        Palette::Plasma,
        Palette::Jet,
        Palette::Viridis,
        Palette::Reds,
    ];

    /// Palettes offered for the source frame view, grayscale first.
    pub const FRAME: [Palette; 3] = [Palette::Gray, Palette::Plasma, Palette::Jet];

    /// Lowercase palette name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Palette::Gray => "gray",
            Palette::Plasma => "plasma",
            Palette::Jet => "jet",
            Palette::Viridis => "viridis",
            Palette::Reds => "reds",
        }
    }

    /// Whether this palette leaves gray intensities untouched.
    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Palette::Gray
    }

    /// Apply the palette to a normalized value in `[0, 1]` and return RGB bytes.
    ///
    /// Values outside the interval clamp; NaN is treated as 0.
    #[must_use]
    pub fn apply(self, val: f64) -> [u8; 3] {
        let t = if val.is_nan() { 0.0 } else { val.clamp(0.0, 1.0) };
        match self {
            Palette::Gray => {
                let v = unit_to_u8(t);
                [v, v, v]
            }
            Palette::Plasma => gradient_rgb(&colorous::PLASMA, t),
            Palette::Viridis => gradient_rgb(&colorous::VIRIDIS, t),
            Palette::Reds => gradient_rgb(&colorous::REDS, t),
            Palette::Jet => {
                let channel = |offset: f64| unit_to_u8((1.5 - (4.0 * t - offset).abs()).clamp(0.0, 1.0));
                [channel(3.0), channel(2.0), channel(1.0)]
            }
        }
    }

    /// Lookup table over all 8-bit intensities.
    #[must_use]
    pub fn lut(self) -> [[u8; 3]; 256] {
        let mut table = [[0u8; 3]; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = self.apply(f64::from(u8::try_from(i).unwrap_or(u8::MAX)) / 255.0);
        }
        table
    }

    /// Apply the palette and format the color as `#rrggbb`.
    #[must_use]
    pub fn hex(self, val: f64) -> String {
        to_hex(self.apply(val))
    }
}

/// Formats an RGB triple as a lowercase `#rrggbb` string.
#[must_use]
pub fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn gradient_rgb(gradient: &colorous::Gradient, t: f64) -> [u8; 3] {
    let c = gradient.eval_continuous(t);
    [c.r, c.g, c.b]
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_u8(t: f64) -> u8 {
    (t * 255.0).round().clamp(0.0, 255.0) as u8
}
