//! Starting animations
//!
//! [`Animator`] bundles what an animation needs to run: a frame scheduler, a
//! timer, the registry it is listed in, and the defaults from
//! [`TweenConfig`]. Values are described with [`AnimationOptions`].
//!
//! ```
//! use blinc_tween::{AnimationOptions, Animator, Easing, FrameLoop};
//!
//! let frames = FrameLoop::new();
//! let animator = Animator::new(&frames);
//!
//! let handle = animator.animate(
//!     AnimationOptions::new()
//!         .start_value(0.0)
//!         .end_value(1.0)
//!         .duration(100.0)
//!         .easing(Easing::Linear),
//! );
//!
//! frames.run_until_idle(16.0, 100);
//! assert!(handle.context().state().is_terminal());
//! ```

use std::any::Any;
use std::rc::Rc;

use tracing::warn;

use crate::config::TweenConfig;
use crate::context::{CancelHandle, Target};
use crate::easing::Easing;
use crate::engine::{Animation, Attachments, Lifecycle, Timing};
use crate::error::{Result, TweenError};
use crate::interpolate::{wrap_color_lifecycle, ColorInterpolator, Tweenable};
use crate::registry::{running_animations, AnimationRegistry};
use crate::scheduler::{FrameLoop, FrameScheduler, Timer};

/// Description of one animation
///
/// `V` is the value kind: `f64`, `Vec<f64>`, or `String` for colors.
pub struct AnimationOptions<V> {
    pub(crate) start_value: Option<V>,
    pub(crate) end_value: Option<V>,
    pub(crate) by_value: Option<V>,
    pub(crate) duration: Option<f64>,
    pub(crate) delay: Option<f64>,
    pub(crate) easing: Option<Easing>,
    pub(crate) lifecycle: Lifecycle<V>,
    pub(crate) target: Option<Target>,
    pub(crate) user_data: Option<Rc<dyn Any>>,
}

impl<V> Default for AnimationOptions<V> {
    fn default() -> Self {
        Self {
            start_value: None,
            end_value: None,
            by_value: None,
            duration: None,
            delay: None,
            easing: None,
            lifecycle: Lifecycle::default(),
            target: None,
            user_data: None,
        }
    }
}

impl<V: 'static> AnimationOptions<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_value(mut self, value: V) -> Self {
        self.start_value = Some(value);
        self
    }

    pub fn end_value(mut self, value: V) -> Self {
        self.end_value = Some(value);
        self
    }

    /// Total change; used when no end value is given. Not supported for
    /// colors.
    pub fn by_value(mut self, value: V) -> Self {
        self.by_value = Some(value);
        self
    }

    /// Duration in milliseconds
    pub fn duration(mut self, ms: f64) -> Self {
        self.duration = Some(ms);
        self
    }

    /// Delay before the first frame in milliseconds
    pub fn delay(mut self, ms: f64) -> Self {
        self.delay = Some(ms);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attach caller data, readable later through
    /// [`AnimationContext::user_data`](crate::AnimationContext::user_data)
    pub fn user_data<T: Any>(mut self, data: T) -> Self {
        self.user_data = Some(Rc::new(data));
        self
    }

    pub fn on_start(mut self, callback: impl FnMut() + 'static) -> Self {
        self.lifecycle.on_start = Some(Box::new(callback));
        self
    }

    /// Called every frame with `(value, value_progress, time_progress)`
    pub fn on_change(mut self, callback: impl FnMut(&V, f64, f64) + 'static) -> Self {
        self.lifecycle.on_change = Some(Box::new(callback));
        self
    }

    /// Called once with the end value after the last `on_change`
    pub fn on_complete(mut self, callback: impl FnMut(&V, f64, f64) + 'static) -> Self {
        self.lifecycle.on_complete = Some(Box::new(callback));
        self
    }

    /// Checked every frame before `on_change`; returning `true` aborts the
    /// animation with its value frozen
    pub fn abort_when(mut self, predicate: impl FnMut(&V, f64, f64) -> bool + 'static) -> Self {
        self.lifecycle.abort = Some(Box::new(predicate));
        self
    }
}

/// Starts animations on a scheduler
///
/// Clones share the scheduler, registry and configuration.
#[derive(Clone)]
pub struct Animator {
    registry: AnimationRegistry,
    frames: Rc<dyn FrameScheduler>,
    timer: Rc<dyn Timer>,
    config: Rc<TweenConfig>,
}

impl Animator {
    /// Animator on `frames`, listing animations in this thread's
    /// [`running_animations`] registry
    pub fn new(frames: &FrameLoop) -> Self {
        Self::with_registry(frames, running_animations())
    }

    pub fn with_registry(frames: &FrameLoop, registry: AnimationRegistry) -> Self {
        Self::from_parts(
            registry,
            Rc::new(frames.clone()),
            Rc::new(frames.clone()),
            TweenConfig::default(),
        )
    }

    /// Animator on custom scheduling backends
    pub fn from_parts(
        registry: AnimationRegistry,
        frames: Rc<dyn FrameScheduler>,
        timer: Rc<dyn Timer>,
        config: TweenConfig,
    ) -> Self {
        Self {
            registry,
            frames,
            timer,
            config: Rc::new(config),
        }
    }

    /// Replace the defaults used for unspecified timing.
    ///
    /// Frame pacing is a property of the loop; build it with
    /// [`FrameLoop::from_config`] from the same configuration.
    pub fn with_config(mut self, config: TweenConfig) -> Self {
        self.config = Rc::new(config);
        self
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    pub fn config(&self) -> &TweenConfig {
        &self.config
    }

    pub(crate) fn frames(&self) -> &dyn FrameScheduler {
        &*self.frames
    }

    pub(crate) fn timer(&self) -> &dyn Timer {
        &*self.timer
    }

    fn timing(&self, duration: Option<f64>, delay: Option<f64>) -> Timing {
        Timing::new(
            duration.unwrap_or(self.config.default_duration_ms),
            delay.unwrap_or(self.config.default_delay_ms),
        )
    }

    /// Start a numeric animation. Missing options take the configured
    /// defaults and the value kind's default endpoints; the easing defaults
    /// to [`Easing::EaseInSine`].
    pub fn animate<V: Tweenable>(&self, options: AnimationOptions<V>) -> CancelHandle {
        let AnimationOptions {
            start_value,
            end_value,
            by_value,
            duration,
            delay,
            easing,
            lifecycle,
            target,
            user_data,
        } = options;

        let timing = self.timing(duration, delay);
        let interpolator = V::interpolator(
            start_value,
            end_value,
            by_value,
            timing.duration,
            easing.unwrap_or_default(),
        );
        Animation::new(
            interpolator,
            timing,
            lifecycle,
            Attachments { target, user_data },
            self.clone(),
        )
        .start()
    }

    /// Start a color animation between two CSS color strings.
    ///
    /// Callbacks receive `rgba(r,g,b,a)` strings. The easing defaults to
    /// [`Easing::ColorCosine`]. Fails before anything is registered when an
    /// endpoint is missing or unparseable.
    pub fn animate_color(&self, options: AnimationOptions<String>) -> Result<CancelHandle> {
        let AnimationOptions {
            start_value,
            end_value,
            by_value,
            duration,
            delay,
            easing,
            lifecycle,
            target,
            user_data,
        } = options;

        if by_value.is_some() {
            warn!("by_value is ignored for color animations");
        }
        let start = start_value.ok_or(TweenError::MissingColor("start"))?;
        let end = end_value.ok_or(TweenError::MissingColor("end"))?;

        let timing = self.timing(duration, delay);
        let interpolator = ColorInterpolator::new(
            &start,
            &end,
            timing.duration,
            easing.unwrap_or(Easing::ColorCosine),
        )?;
        Ok(Animation::new(
            interpolator,
            timing,
            wrap_color_lifecycle(lifecycle),
            Attachments { target, user_data },
            self.clone(),
        )
        .start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AnimationState;
    use std::cell::RefCell;

    fn setup() -> (FrameLoop, Animator) {
        let frames = FrameLoop::new();
        let animator = Animator::with_registry(&frames, AnimationRegistry::new());
        (frames, animator)
    }

    #[test]
    fn test_config_defaults_apply() {
        let (_frames, animator) = setup();
        let handle = animator.animate(AnimationOptions::<f64>::new());
        assert_eq!(handle.context().duration(), 500.0);
        assert_eq!(handle.context().delay(), 0.0);
        assert_eq!(handle.context().end_value().as_number(), Some(100.0));

        let animator = animator.with_config(TweenConfig {
            default_duration_ms: 200.0,
            default_delay_ms: 10.0,
            target_fps: 60,
        });
        let handle = animator.animate(AnimationOptions::<f64>::new());
        assert_eq!(handle.context().duration(), 200.0);
        assert_eq!(handle.context().delay(), 10.0);
    }

    #[test]
    fn test_loaded_config_drives_timing_and_pacing() {
        let config =
            TweenConfig::from_toml_str("default_duration_ms = 40.0\ntarget_fps = 4").unwrap();
        let frames = FrameLoop::from_config(&config);
        let animator =
            Animator::with_registry(&frames, AnimationRegistry::new()).with_config(config);

        assert_eq!(frames.frame_interval(), std::time::Duration::from_millis(250));
        let handle = animator.animate(AnimationOptions::<f64>::new());
        assert_eq!(handle.context().duration(), 40.0);
    }

    #[test]
    fn test_by_value_sets_end() {
        let (frames, animator) = setup();
        let last = Rc::new(RefCell::new(0.0));
        let sink = last.clone();
        animator.animate(
            AnimationOptions::new()
                .start_value(10.0)
                .by_value(-4.0)
                .duration(50.0)
                .on_complete(move |v: &f64, _, _| *sink.borrow_mut() = *v),
        );
        frames.run_until_idle(16.0, 10);
        assert_eq!(*last.borrow(), 6.0);
    }

    #[test]
    fn test_negative_timing_is_clamped() {
        let (frames, animator) = setup();
        let handle = animator.animate(
            AnimationOptions::new()
                .end_value(1.0)
                .duration(-5.0)
                .delay(-5.0),
        );
        assert_eq!(handle.context().duration(), 0.0);
        frames.advance(16.0);
        assert_eq!(handle.context().state(), AnimationState::Completed);
    }

    #[test]
    fn test_color_requires_both_endpoints() {
        let (_frames, animator) = setup();
        let err = animator
            .animate_color(AnimationOptions::new().start_value("red".to_string()))
            .unwrap_err();
        assert!(matches!(err, TweenError::MissingColor("end")));

        let err = animator
            .animate_color(
                AnimationOptions::new()
                    .start_value("red".to_string())
                    .end_value("bogus".to_string()),
            )
            .unwrap_err();
        assert!(matches!(err, TweenError::Color(_)));
        assert!(animator.registry().is_empty());
    }
}
