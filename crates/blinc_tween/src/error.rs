//! Tween error types

use blinc_color::ColorParseError;
use thiserror::Error;

/// Errors raised while setting up an animation
#[derive(Error, Debug)]
pub enum TweenError {
    /// A color endpoint could not be parsed
    #[error(transparent)]
    Color(#[from] ColorParseError),

    /// Color animations need both endpoints
    #[error("color animation is missing its {0} color")]
    MissingColor(&'static str),

    /// The object has no readable value at this key
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// A `+=`/`-=` expression did not carry a number
    #[error("invalid relative value {expr:?} for {key}")]
    InvalidRelative { key: String, expr: String },

    /// A string end value for a property that is neither numeric nor a color
    #[error("invalid end value {expr:?} for {key}")]
    InvalidValue { key: String, expr: String },

    /// Relative values only apply to numeric properties
    #[error("relative value on non-numeric property: {0}")]
    RelativeOnNonNumeric(String),

    /// The object was mutably borrowed when the animation was set up
    #[error("object is borrowed, cannot read {0}")]
    ObjectBorrowed(String),

    /// Start and end values have shapes that cannot be interpolated
    #[error("cannot animate {key} from {from} to {to}")]
    Mismatch {
        key: String,
        from: &'static str,
        to: &'static str,
    },

    /// Failed to read a configuration file
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    /// Failed to write a configuration file
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for tween operations
pub type Result<T> = std::result::Result<T, TweenError>;
