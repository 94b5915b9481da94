//! CSS color string parsing
//!
//! Supported forms:
//! - `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`
//! - `rgb(r, g, b)` / `rgba(r, g, b, a)` with 0-255 or percentage channels
//! - `hsl(h, s%, l%)` / `hsla(h, s%, l%, a)`
//! - CSS named colors and `transparent`

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while_m_n},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, map_opt, opt, value},
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use thiserror::Error;

use crate::color::Color;

/// Errors produced while parsing a color string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Input was empty or whitespace only
    #[error("empty color string")]
    Empty,

    /// Input did not match any supported color syntax
    #[error("unrecognized color: {0}")]
    Unrecognized(String),
}

/// Parse a CSS color string
pub fn parse_color(input: &str) -> Result<Color, ColorParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ColorParseError::Empty);
    }

    if let Ok((_, color)) = all_consuming(hex_color)(input) {
        return Ok(color);
    }
    if let Ok((_, color)) = all_consuming(rgb_function)(input) {
        return Ok(color);
    }
    if let Ok((_, color)) = all_consuming(hsl_function)(input) {
        return Ok(color);
    }

    named_color(input).ok_or_else(|| ColorParseError::Unrecognized(input.to_string()))
}

// ============================================================================
// Hex
// ============================================================================

fn hex_color(input: &str) -> IResult<&str, Color> {
    map_opt(
        preceded(
            char('#'),
            take_while_m_n(3, 8, |c: char| c.is_ascii_hexdigit()),
        ),
        hex_digits_to_color,
    )(input)
}

fn hex_digits_to_color(hex: &str) -> Option<Color> {
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Color::from_rgba8(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        4 => Some(Color::from_rgba8(
            nibble(0)?,
            nibble(1)?,
            nibble(2)?,
            nibble(3)?,
        )),
        6 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

// ============================================================================
// Functional notation
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
enum Unit {
    Number,
    Percent,
    Degrees,
}

type Component = (f64, Unit);

fn component(input: &str) -> IResult<&str, Component> {
    pair(
        double,
        map(
            opt(alt((
                value(Unit::Percent, char('%')),
                value(Unit::Degrees, tag_no_case("deg")),
            ))),
            |unit| unit.unwrap_or(Unit::Number),
        ),
    )(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<Component>> {
    delimited(
        terminated(char('('), multispace0),
        separated_list1(delimited(multispace0, char(','), multispace0), component),
        preceded(multispace0, char(')')),
    )(input)
}

fn rgb_function(input: &str) -> IResult<&str, Color> {
    map_opt(
        preceded(
            pair(alt((tag_no_case("rgba"), tag_no_case("rgb"))), multispace0),
            arguments,
        ),
        |args| {
            let (r, g, b, a) = match args.as_slice() {
                [r, g, b] => (*r, *g, *b, (1.0, Unit::Number)),
                [r, g, b, a] => (*r, *g, *b, *a),
                _ => return None,
            };
            Some(Color::new(
                (rgb_channel(r)? / 255.0) as f32,
                (rgb_channel(g)? / 255.0) as f32,
                (rgb_channel(b)? / 255.0) as f32,
                alpha_channel(a)? as f32,
            ))
        },
    )(input)
}

fn hsl_function(input: &str) -> IResult<&str, Color> {
    map_opt(
        preceded(
            pair(alt((tag_no_case("hsla"), tag_no_case("hsl"))), multispace0),
            arguments,
        ),
        |args| {
            let (h, s, l, a) = match args.as_slice() {
                [h, s, l] => (*h, *s, *l, (1.0, Unit::Number)),
                [h, s, l, a] => (*h, *s, *l, *a),
                _ => return None,
            };
            if h.1 == Unit::Percent {
                return None;
            }
            let (r, g, b) = hsl_to_rgb(h.0, fraction(s)?, fraction(l)?);
            Some(Color::new(r as f32, g as f32, b as f32, alpha_channel(a)? as f32))
        },
    )(input)
}

fn rgb_channel((v, unit): Component) -> Option<f64> {
    let v = match unit {
        Unit::Number => v,
        Unit::Percent => v * 2.55,
        Unit::Degrees => return None,
    };
    Some(v.clamp(0.0, 255.0))
}

fn alpha_channel((v, unit): Component) -> Option<f64> {
    let v = match unit {
        Unit::Number => v,
        Unit::Percent => v / 100.0,
        Unit::Degrees => return None,
    };
    Some(v.clamp(0.0, 1.0))
}

fn fraction((v, unit): Component) -> Option<f64> {
    match unit {
        Unit::Percent => Some((v / 100.0).clamp(0.0, 1.0)),
        Unit::Number => Some(v.clamp(0.0, 1.0)),
        Unit::Degrees => None,
    }
}

/// HSL to RGB, all outputs in 0..=1. `hue` is in degrees.
fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (f64, f64, f64) {
    let h = hue.rem_euclid(360.0) / 360.0;
    if saturation == 0.0 {
        return (lightness, lightness, lightness);
    }

    let q = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;

    (
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

// ============================================================================
// Named colors
// ============================================================================

const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xF0F8FF),
    ("antiquewhite", 0xFAEBD7),
    ("aqua", 0x00FFFF),
    ("aquamarine", 0x7FFFD4),
    ("azure", 0xF0FFFF),
    ("beige", 0xF5F5DC),
    ("black", 0x000000),
    ("blue", 0x0000FF),
    ("blueviolet", 0x8A2BE2),
    ("brown", 0xA52A2A),
    ("cadetblue", 0x5F9EA0),
    ("chartreuse", 0x7FFF00),
    ("chocolate", 0xD2691E),
    ("coral", 0xFF7F50),
    ("cornflowerblue", 0x6495ED),
    ("crimson", 0xDC143C),
    ("cyan", 0x00FFFF),
    ("darkblue", 0x00008B),
    ("darkgray", 0xA9A9A9),
    ("darkgreen", 0x006400),
    ("darkorange", 0xFF8C00),
    ("darkred", 0x8B0000),
    ("deeppink", 0xFF1493),
    ("deepskyblue", 0x00BFFF),
    ("dimgray", 0x696969),
    ("dodgerblue", 0x1E90FF),
    ("firebrick", 0xB22222),
    ("forestgreen", 0x228B22),
    ("fuchsia", 0xFF00FF),
    ("gold", 0xFFD700),
    ("goldenrod", 0xDAA520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xADFF2F),
    ("grey", 0x808080),
    ("hotpink", 0xFF69B4),
    ("indianred", 0xCD5C5C),
    ("indigo", 0x4B0082),
    ("ivory", 0xFFFFF0),
    ("khaki", 0xF0E68C),
    ("lavender", 0xE6E6FA),
    ("lightblue", 0xADD8E6),
    ("lightgray", 0xD3D3D3),
    ("lightgreen", 0x90EE90),
    ("lightgrey", 0xD3D3D3),
    ("lightpink", 0xFFB6C1),
    ("lightyellow", 0xFFFFE0),
    ("lime", 0x00FF00),
    ("limegreen", 0x32CD32),
    ("magenta", 0xFF00FF),
    ("maroon", 0x800000),
    ("navy", 0x000080),
    ("olive", 0x808000),
    ("orange", 0xFFA500),
    ("orangered", 0xFF4500),
    ("orchid", 0xDA70D6),
    ("pink", 0xFFC0CB),
    ("plum", 0xDDA0DD),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xFF0000),
    ("royalblue", 0x4169E1),
    ("salmon", 0xFA8072),
    ("seagreen", 0x2E8B57),
    ("sienna", 0xA0522D),
    ("silver", 0xC0C0C0),
    ("skyblue", 0x87CEEB),
    ("slategray", 0x708090),
    ("steelblue", 0x4682B4),
    ("tan", 0xD2B48C),
    ("teal", 0x008080),
    ("tomato", 0xFF6347),
    ("turquoise", 0x40E0D0),
    ("violet", 0xEE82EE),
    ("wheat", 0xF5DEB3),
    ("white", 0xFFFFFF),
    ("whitesmoke", 0xF5F5F5),
    ("yellow", 0xFFFF00),
    ("yellowgreen", 0x9ACD32),
];

fn named_color(name: &str) -> Option<Color> {
    let name = name.to_ascii_lowercase();
    if name == "transparent" {
        return Some(Color::TRANSPARENT);
    }
    NAMED_COLORS
        .binary_search_by(|(candidate, _)| candidate.cmp(&name.as_str()))
        .ok()
        .map(|idx| Color::from_hex(NAMED_COLORS[idx].1))
}
