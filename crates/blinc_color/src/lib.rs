//! Blinc Color
//!
//! CSS color parsing and the `[r, g, b, a]` channel form used by color
//! animations.
//!
//! ```rust
//! use blinc_color::{format_channels, parse_channels};
//!
//! let channels = parse_channels("#0000ff").unwrap();
//! assert_eq!(channels, [0.0, 0.0, 255.0, 1.0]);
//! assert_eq!(format_channels(channels), "rgba(0,0,255,1)");
//! ```

pub mod color;
pub mod parse;

pub use color::{format_channels, parse_channels, Channels, Color};
pub use parse::{parse_color, ColorParseError};
