//! Blinc Tween
//!
//! Frame-driven tweening of numbers, number arrays and colors.
//!
//! # Features
//!
//! - **Value animations**: scalar and vector tweens over any [`Easing`] curve
//! - **Color animations**: per-channel tweens between CSS color strings
//! - **Registry**: every running animation is listed and can be found or
//!   cancelled by handle, owner or canvas
//! - **Property animation**: animate object properties by dotted key path,
//!   with `+=`/`-=` relative values
//! - **Deterministic time**: [`FrameLoop`] runs frames on demand for tests or
//!   paced against the wall clock
//!
//! Everything runs on one thread. Animations tick when their [`FrameLoop`]
//! runs a frame; nothing happens in the background.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod easing;
pub mod engine;
pub mod error;
pub mod interpolate;
pub mod object;
pub mod registry;
pub mod scheduler;

pub use config::TweenConfig;
pub use context::{
    AnimationContext, AnimationState, AnimationTarget, CancelHandle, CanvasId, Target, TweenValue,
};
pub use dispatch::{AnimationOptions, Animator};
pub use easing::Easing;
pub use engine::{Animation, Attachments, Calculated, Interpolator, Lifecycle, Timing};
pub use error::{Result, TweenError};
pub use interpolate::{
    wrap_color_lifecycle, ColorInterpolator, ScalarInterpolator, Tweenable, VectorInterpolator,
};
pub use object::{
    animate_properties, animate_property, cancel_object_animations, get_path, set_path,
    AnimatableObject, EndValue, ObjectAnimateExt, PropertyNode, PropertyOptions,
};
pub use registry::{running_animations, AnimationRegistry};
pub use scheduler::{FrameLoop, FrameScheduler, TickId, Timer, TimerId};
