//! Animation engine
//!
//! [`Animation`] owns the lifecycle shared by every value kind: registration,
//! the optional delay, the first frame, per-frame ticks, completion and
//! abortion. What a value looks like at a given time is delegated to an
//! [`Interpolator`].
//!
//! Per tick the engine:
//!
//! 1. clamps the elapsed time to `[0, duration]`
//! 2. asks the interpolator for the value and its progress
//! 3. refreshes the shared [`AnimationContext`]
//! 4. consults the abort predicate, then either completes, or reports the
//!    change and requests the next frame
//!
//! Callbacks run without any engine borrow held, so they may cancel this or
//! any other animation. A panicking callback aborts its own animation only.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, error, trace};

use crate::context::{
    AnimationContext, AnimationState, CancelHandle, ContextInit, Target, TweenValue,
};
use crate::dispatch::Animator;
use crate::scheduler::{panic_message, TickId, TimerId};

/// Value and progress at a point in time
#[derive(Clone, Debug, PartialEq)]
pub struct Calculated<V> {
    pub value: V,
    /// Fraction of the total change covered, in value space
    pub progress: f64,
}

/// Produces the value of an animation at a given elapsed time
pub trait Interpolator: 'static {
    type Value: Clone + 'static;

    /// Value at `elapsed` milliseconds, already clamped to the duration
    fn calculate(&self, elapsed: f64) -> Calculated<Self::Value>;

    /// Convert a value for storage on the context
    fn snapshot(&self, value: &Self::Value) -> TweenValue;

    fn start_value(&self) -> TweenValue;

    /// Total change, as stored on the context
    fn by_value(&self) -> TweenValue;
}

pub type StartCallback = Box<dyn FnMut()>;

/// Receives `(value, value_progress, time_progress)`
pub type ChangeCallback<V> = Box<dyn FnMut(&V, f64, f64)>;

/// Receives `(value, value_progress, time_progress)`; `true` aborts
pub type AbortPredicate<V> = Box<dyn FnMut(&V, f64, f64) -> bool>;

/// User callbacks of one animation
pub struct Lifecycle<V> {
    pub on_start: Option<StartCallback>,
    pub on_change: Option<ChangeCallback<V>>,
    pub on_complete: Option<ChangeCallback<V>>,
    pub abort: Option<AbortPredicate<V>>,
}

impl<V> Default for Lifecycle<V> {
    fn default() -> Self {
        Self {
            on_start: None,
            on_change: None,
            on_complete: None,
            abort: None,
        }
    }
}

impl<V> Lifecycle<V> {
    fn start(&mut self) {
        if let Some(callback) = self.on_start.as_mut() {
            callback();
        }
    }

    fn change(&mut self, value: &V, progress: f64, duration_progress: f64) {
        if let Some(callback) = self.on_change.as_mut() {
            callback(value, progress, duration_progress);
        }
    }

    fn complete(&mut self, value: &V, progress: f64, duration_progress: f64) {
        if let Some(callback) = self.on_complete.as_mut() {
            callback(value, progress, duration_progress);
        }
    }

    fn should_abort(&mut self, value: &V, progress: f64, duration_progress: f64) -> bool {
        match self.abort.as_mut() {
            Some(predicate) => predicate(value, progress, duration_progress),
            None => false,
        }
    }
}

/// Timing of one animation, in milliseconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    pub duration: f64,
    pub delay: f64,
}

impl Timing {
    /// Negative or NaN values become zero
    pub fn new(duration: f64, delay: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            delay: delay.max(0.0),
        }
    }
}

/// Optional attachments of an animation
#[derive(Default)]
pub struct Attachments {
    pub target: Option<Target>,
    pub user_data: Option<Rc<dyn std::any::Any>>,
}

/// A single animation, generic over its value kind
pub struct Animation<I: Interpolator> {
    inner: Rc<AnimationInner<I>>,
}

struct AnimationInner<I: Interpolator> {
    interpolator: I,
    end_value: I::Value,
    timing: Timing,
    context: AnimationContext,
    lifecycle: RefCell<Lifecycle<I::Value>>,
    start_time: Cell<f64>,
    pending_tick: Cell<Option<TickId>>,
    pending_timer: Cell<Option<TimerId>>,
    animator: Animator,
}

impl<I: Interpolator> Animation<I> {
    pub fn new(
        interpolator: I,
        timing: Timing,
        lifecycle: Lifecycle<I::Value>,
        attachments: Attachments,
        animator: Animator,
    ) -> Self {
        let end_value = interpolator.calculate(timing.duration).value;
        let context = AnimationContext::new(ContextInit {
            start_value: interpolator.start_value(),
            end_value: interpolator.snapshot(&end_value),
            by_value: interpolator.by_value(),
            duration: timing.duration,
            delay: timing.delay,
            target: attachments.target,
            user_data: attachments.user_data,
        });

        Self {
            inner: Rc::new(AnimationInner {
                interpolator,
                end_value,
                timing,
                context,
                lifecycle: RefCell::new(lifecycle),
                start_time: Cell::new(0.0),
                pending_tick: Cell::new(None),
                pending_timer: Cell::new(None),
                animator,
            }),
        }
    }

    pub fn context(&self) -> &AnimationContext {
        &self.inner.context
    }

    /// Value the animation settles on
    pub fn end_value(&self) -> &I::Value {
        &self.inner.end_value
    }

    /// Register the animation and schedule its first frame, after the delay
    /// if there is one
    pub fn start(self) -> CancelHandle {
        let inner = &self.inner;
        let context = &inner.context;
        inner.animator.registry().add(context);

        let weak = Rc::downgrade(inner);
        context.set_abort_hook(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.cancel_scheduled();
            }
        }));

        debug!(
            animation = context.id(),
            duration = inner.timing.duration,
            delay = inner.timing.delay,
            "animation registered"
        );

        if inner.timing.delay > 0.0 {
            let this = Rc::clone(inner);
            let id = inner.animator.timer().set_timeout(
                inner.timing.delay,
                Box::new(move || {
                    this.pending_timer.set(None);
                    this.request_first_tick();
                }),
            );
            inner.pending_timer.set(Some(id));
        } else {
            inner.request_first_tick();
        }

        context.cancel_handle()
    }
}

impl<I: Interpolator> AnimationInner<I> {
    fn request_first_tick(self: &Rc<Self>) {
        let this = Rc::clone(self);
        let id = self
            .animator
            .frames()
            .request_tick(Box::new(move |now| this.first_tick(now)));
        self.pending_tick.set(Some(id));
    }

    fn request_tick(self: &Rc<Self>) {
        let this = Rc::clone(self);
        let id = self
            .animator
            .frames()
            .request_tick(Box::new(move |now| this.tick(now)));
        self.pending_tick.set(Some(id));
    }

    fn first_tick(self: &Rc<Self>, now: f64) {
        self.pending_tick.set(None);
        if self.context.state() != AnimationState::Pending {
            return;
        }

        self.start_time.set(now);
        self.context.set_state(AnimationState::Running);
        debug!(animation = self.context.id(), start = now, "animation started");

        if self.guarded("on_start", |lifecycle| lifecycle.start()).is_none() {
            return;
        }
        self.tick(now);
    }

    fn tick(self: &Rc<Self>, now: f64) {
        self.pending_tick.set(None);
        // Terminal states are sticky; a cancelled animation never writes again
        if self.context.state() != AnimationState::Running {
            return;
        }

        let duration = self.timing.duration;
        let raw_elapsed = now - self.start_time.get();
        let elapsed = raw_elapsed.clamp(0.0, duration);
        let duration_progress = if duration > 0.0 { elapsed / duration } else { 1.0 };

        let calculated = self.interpolator.calculate(elapsed);
        let (value, progress) = (calculated.value, calculated.progress);
        self.context
            .refresh(self.interpolator.snapshot(&value), progress, duration_progress);
        trace!(
            animation = self.context.id(),
            elapsed,
            progress,
            duration_progress,
            "animation tick"
        );

        let should_abort = self.guarded("abort", |lifecycle| {
            lifecycle.should_abort(&value, progress, duration_progress)
        });
        match should_abort {
            None => return,
            Some(true) => {
                debug!(animation = self.context.id(), "abort predicate stopped animation");
                self.context.cancel();
                return;
            }
            Some(false) => {}
        }
        // The predicate may have cancelled imperatively
        if self.context.state() != AnimationState::Running {
            return;
        }

        if raw_elapsed >= duration {
            self.complete();
        } else {
            let reported = self.guarded("on_change", |lifecycle| {
                lifecycle.change(&value, progress, duration_progress)
            });
            if reported.is_some() && self.context.state() == AnimationState::Running {
                self.request_tick();
            }
        }
    }

    fn complete(&self) {
        let end = &self.end_value;
        self.context.refresh(self.interpolator.snapshot(end), 1.0, 1.0);

        if self
            .guarded("on_change", |lifecycle| lifecycle.change(end, 1.0, 1.0))
            .is_none()
        {
            return;
        }
        if self.context.state() != AnimationState::Running {
            return;
        }

        self.context.set_state(AnimationState::Completed);
        debug!(animation = self.context.id(), "animation completed");
        self.guarded("on_complete", |lifecycle| lifecycle.complete(end, 1.0, 1.0));
        self.context.finish();
    }

    /// Run a user callback. A panic aborts this animation and yields `None`.
    fn guarded<R>(
        &self,
        stage: &'static str,
        callback: impl FnOnce(&mut Lifecycle<I::Value>) -> R,
    ) -> Option<R> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            callback(&mut self.lifecycle.borrow_mut())
        }));
        match result {
            Ok(value) => Some(value),
            Err(payload) => {
                error!(
                    animation = self.context.id(),
                    stage,
                    message = %panic_message(payload.as_ref()),
                    "animation callback panicked, aborting animation"
                );
                self.context.cancel();
                None
            }
        }
    }

    fn cancel_scheduled(&self) {
        if let Some(id) = self.pending_tick.take() {
            self.animator.frames().cancel_tick(id);
        }
        if let Some(id) = self.pending_timer.take() {
            self.animator.timer().clear_timeout(id);
        }
    }
}
