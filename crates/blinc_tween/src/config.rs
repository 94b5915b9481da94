//! Tween configuration (tween.toml)
//!
//! Every field is optional in the file; missing fields take the defaults
//! below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Defaults applied to animations that leave timing unspecified
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TweenConfig {
    /// Duration in milliseconds
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: f64,
    /// Delay before the first frame in milliseconds
    #[serde(default)]
    pub default_delay_ms: f64,
    /// Pacing of [`FrameLoop::run_blocking`](crate::FrameLoop::run_blocking),
    /// applied by [`FrameLoop::from_config`](crate::FrameLoop::from_config)
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
}

fn default_duration_ms() -> f64 {
    500.0
}

fn default_target_fps() -> u32 {
    120
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: default_duration_ms(),
            default_delay_ms: 0.0,
            target_fps: default_target_fps(),
        }
    }
}

impl TweenConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
