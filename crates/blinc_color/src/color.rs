//! Color types and channel conversion

use std::fmt;
use std::str::FromStr;

use crate::parse::{parse_color, ColorParseError};

/// RGBA channels in animation space: `[r, g, b, a]` with r/g/b in 0..=255 and
/// alpha in 0..=1.
pub type Channels = [f64; 4];

/// RGBA color with f32 components (0.0 to 1.0)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create from u8 components (0-255)
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Create from hex value (0xRRGGBB or 0xRRGGBBAA)
    pub fn from_hex(hex: u32) -> Self {
        if hex > 0xFFFFFF {
            Self::from_rgba8(
                ((hex >> 24) & 0xFF) as u8,
                ((hex >> 16) & 0xFF) as u8,
                ((hex >> 8) & 0xFF) as u8,
                (hex & 0xFF) as u8,
            )
        } else {
            Self::from_rgba8(
                ((hex >> 16) & 0xFF) as u8,
                ((hex >> 8) & 0xFF) as u8,
                (hex & 0xFF) as u8,
                255,
            )
        }
    }

    /// Build a color from animation channels, clamping out-of-range values.
    pub fn from_channels(channels: Channels) -> Self {
        let [r, g, b, a] = channels;
        Self {
            r: (r.clamp(0.0, 255.0) / 255.0) as f32,
            g: (g.clamp(0.0, 255.0) / 255.0) as f32,
            b: (b.clamp(0.0, 255.0) / 255.0) as f32,
            a: a.clamp(0.0, 1.0) as f32,
        }
    }

    /// Parse any supported CSS color string.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        parse_color(input)
    }

    /// Set alpha and return new color
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { a: alpha, ..self }
    }

    /// Convert to animation channels.
    ///
    /// r/g/b are rounded to whole steps; alpha is quantized to 1e-4 so f32
    /// storage noise never reaches formatted output.
    pub fn channels(&self) -> Channels {
        [
            (self.r as f64 * 255.0).round(),
            (self.g as f64 * 255.0).round(),
            (self.b as f64 * 255.0).round(),
            quantize_alpha(self.a as f64),
        ]
    }

    /// Convert to u8 array [r, g, b, a]
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            (self.a * 255.0).round() as u8,
        ]
    }

    /// `#rrggbb`, or `#rrggbbaa` when the color is not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// `rgba(r,g,b,a)` string, the format animation callbacks observe.
    pub fn to_rgba_string(&self) -> String {
        format_channels(self.channels())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rgba_string())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

/// Parse a color string straight into animation channels.
pub fn parse_channels(input: &str) -> Result<Channels, ColorParseError> {
    parse_color(input).map(|color| color.channels())
}

/// Format animation channels as `rgba(r,g,b,a)`.
///
/// r/g/b are clamped to 0..=255 and rounded, alpha is clamped to 0..=1.
pub fn format_channels(channels: Channels) -> String {
    let [r, g, b, a] = channels;
    let byte = |v: f64| v.clamp(0.0, 255.0).round() as u8;
    let alpha = quantize_alpha(a.clamp(0.0, 1.0));
    format!("rgba({},{},{},{})", byte(r), byte(g), byte(b), alpha)
}

fn quantize_alpha(a: f64) -> f64 {
    // + 0.0 folds -0.0 into 0.0 so it never prints as "-0"
    (a * 10_000.0).round() / 10_000.0 + 0.0
}
