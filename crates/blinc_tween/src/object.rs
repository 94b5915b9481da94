//! Property animation for scene objects
//!
//! Objects expose their animatable state through [`PropertyNode`], addressed
//! by dotted key paths such as `"shadow.offset_x"`. Animating a key reads its
//! current value as the start (unless one is given), writes every new value
//! back along the same path, and routes color properties through the color
//! interpolator.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use blinc_tween::{
//!     AnimatableObject, Animator, FrameLoop, ObjectAnimateExt, PropertyNode, PropertyOptions,
//!     TweenValue,
//! };
//!
//! struct Dot {
//!     left: f64,
//! }
//!
//! impl PropertyNode for Dot {
//!     fn property(&self, key: &str) -> Option<TweenValue> {
//!         (key == "left").then(|| TweenValue::Number(self.left))
//!     }
//!
//!     fn set_property(&mut self, key: &str, value: TweenValue) -> bool {
//!         match (key, value) {
//!             ("left", TweenValue::Number(v)) => {
//!                 self.left = v;
//!                 true
//!             }
//!             _ => false,
//!         }
//!     }
//! }
//!
//! impl AnimatableObject for Dot {}
//!
//! let frames = FrameLoop::new();
//! let animator = Animator::new(&frames);
//! let dot = Rc::new(RefCell::new(Dot { left: 20.0 }));
//!
//! dot.animate(&animator, "left", "+=40", PropertyOptions::new().duration(100.0))
//!     .unwrap();
//! frames.run_until_idle(16.0, 100);
//! assert_eq!(dot.borrow().left, 60.0);
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::context::{AnimationTarget, CancelHandle, CanvasId, Target, TweenValue};
use crate::dispatch::{AnimationOptions, Animator};
use crate::easing::Easing;
use crate::error::{Result, TweenError};

/// Leaf keys routed through color interpolation unless an object says
/// otherwise
pub const DEFAULT_COLOR_PROPERTIES: &[&str] = &["fill", "stroke", "background_color"];

/// Keys whose change moves an object's bounding box
pub const GEOMETRY_PROPERTIES: &[&str] = &[
    "left",
    "top",
    "width",
    "height",
    "scale_x",
    "scale_y",
    "angle",
    "skew_x",
    "skew_y",
    "flip_x",
    "flip_y",
    "origin_x",
    "origin_y",
    "stroke_width",
    "padding",
];

/// A node of animatable properties
pub trait PropertyNode {
    /// Current value of a direct property
    fn property(&self, key: &str) -> Option<TweenValue>;

    /// Assign a direct property. Returns `false` if the key or value shape is
    /// not accepted.
    fn set_property(&mut self, key: &str, value: TweenValue) -> bool;

    /// Nested node for the first segment of a dotted path
    fn child(&self, _key: &str) -> Option<&dyn PropertyNode> {
        None
    }

    fn child_mut(&mut self, _key: &str) -> Option<&mut dyn PropertyNode> {
        None
    }
}

/// Hooks the property animator calls on the animated object
pub trait AnimatableObject: PropertyNode + 'static {
    /// Recompute cached coordinates after a geometric property settles
    fn set_coords(&mut self) {}

    fn canvas(&self) -> Option<CanvasId> {
        None
    }

    /// Leaf keys animated as colors
    fn color_properties(&self) -> &[&'static str] {
        DEFAULT_COLOR_PROPERTIES
    }

    /// Whether settling `key` should trigger [`set_coords`](Self::set_coords)
    fn affects_coords(&self, key: &str) -> bool {
        GEOMETRY_PROPERTIES.iter().any(|p| *p == key)
    }
}

impl<O: AnimatableObject> AnimationTarget for RefCell<O> {
    fn canvas(&self) -> Option<CanvasId> {
        // Borrowed mutably only while a value is being written back
        self.try_borrow().ok().and_then(|object| object.canvas())
    }
}

/// Read a value by dotted path
pub fn get_path(node: &dyn PropertyNode, path: &str) -> Option<TweenValue> {
    match path.split_once('.') {
        None => node.property(path),
        Some((head, rest)) => get_path(node.child(head)?, rest),
    }
}

/// Write a value by dotted path, assigning the last segment
pub fn set_path(node: &mut dyn PropertyNode, path: &str, value: TweenValue) -> bool {
    match path.split_once('.') {
        None => node.set_property(path, value),
        Some((head, rest)) => match node.child_mut(head) {
            Some(child) => set_path(child, rest, value),
            None => false,
        },
    }
}

fn leaf(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Target value of a property animation
#[derive(Clone, Debug, PartialEq)]
pub enum EndValue {
    Value(TweenValue),
    /// Resolved against the start value: `"+=N"`, `"-=N"`, a number, or a
    /// color
    Expression(String),
}

impl From<f64> for EndValue {
    fn from(v: f64) -> Self {
        EndValue::Value(TweenValue::Number(v))
    }
}

impl From<Vec<f64>> for EndValue {
    fn from(v: Vec<f64>) -> Self {
        EndValue::Value(TweenValue::Vector(v))
    }
}

impl From<TweenValue> for EndValue {
    fn from(v: TweenValue) -> Self {
        EndValue::Value(v)
    }
}

impl From<&str> for EndValue {
    fn from(expr: &str) -> Self {
        EndValue::Expression(expr.to_string())
    }
}

impl From<String> for EndValue {
    fn from(expr: String) -> Self {
        EndValue::Expression(expr)
    }
}

impl EndValue {
    fn resolve(self, key: &str, start: &TweenValue, is_color: bool) -> Result<TweenValue> {
        let expr = match self {
            EndValue::Value(value) => return Ok(value),
            EndValue::Expression(expr) => expr,
        };
        let trimmed = expr.trim();

        let relative = if let Some(rest) = trimmed.strip_prefix("+=") {
            Some((1.0, rest))
        } else {
            trimmed.strip_prefix("-=").map(|rest| (-1.0, rest))
        };
        if let Some((sign, amount)) = relative {
            let amount: f64 = amount.trim().parse().map_err(|_| TweenError::InvalidRelative {
                key: key.to_string(),
                expr: expr.clone(),
            })?;
            return match start {
                TweenValue::Number(start) if !is_color => {
                    Ok(TweenValue::Number(start + sign * amount))
                }
                _ => Err(TweenError::RelativeOnNonNumeric(key.to_string())),
            };
        }

        if is_color {
            return Ok(TweenValue::Color(trimmed.to_string()));
        }
        trimmed
            .parse()
            .map(TweenValue::Number)
            .map_err(|_| TweenError::InvalidValue {
                key: key.to_string(),
                expr,
            })
    }
}

type StartHook = Rc<dyn Fn()>;
type ValueHook = Rc<dyn Fn(&TweenValue, f64, f64)>;
type AbortHook<O> = Rc<dyn Fn(&O, &TweenValue, f64, f64) -> bool>;

/// Options of a property animation
///
/// Callbacks receive the value as a [`TweenValue`]. The abort predicate also
/// receives the animated object. Options are cloneable so one set can drive
/// several properties.
pub struct PropertyOptions<O> {
    start_value: Option<TweenValue>,
    duration: Option<f64>,
    delay: Option<f64>,
    easing: Option<Easing>,
    on_start: Option<StartHook>,
    on_change: Option<ValueHook>,
    on_complete: Option<ValueHook>,
    abort: Option<AbortHook<O>>,
    user_data: Option<Rc<dyn Any>>,
}

impl<O> Clone for PropertyOptions<O> {
    fn clone(&self) -> Self {
        Self {
            start_value: self.start_value.clone(),
            duration: self.duration,
            delay: self.delay,
            easing: self.easing.clone(),
            on_start: self.on_start.clone(),
            on_change: self.on_change.clone(),
            on_complete: self.on_complete.clone(),
            abort: self.abort.clone(),
            user_data: self.user_data.clone(),
        }
    }
}

impl<O> Default for PropertyOptions<O> {
    fn default() -> Self {
        Self {
            start_value: None,
            duration: None,
            delay: None,
            easing: None,
            on_start: None,
            on_change: None,
            on_complete: None,
            abort: None,
            user_data: None,
        }
    }
}

impl<O: AnimatableObject> PropertyOptions<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start value; defaults to the property's current value
    pub fn start_value(mut self, value: impl Into<TweenValue>) -> Self {
        self.start_value = Some(value.into());
        self
    }

    pub fn duration(mut self, ms: f64) -> Self {
        self.duration = Some(ms);
        self
    }

    pub fn delay(mut self, ms: f64) -> Self {
        self.delay = Some(ms);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn user_data<T: Any>(mut self, data: T) -> Self {
        self.user_data = Some(Rc::new(data));
        self
    }

    pub fn on_start(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_start = Some(Rc::new(callback));
        self
    }

    /// Called after each new value has been written to the object
    pub fn on_change(mut self, callback: impl Fn(&TweenValue, f64, f64) + 'static) -> Self {
        self.on_change = Some(Rc::new(callback));
        self
    }

    /// Called after the end value has been written and coordinates refreshed
    pub fn on_complete(mut self, callback: impl Fn(&TweenValue, f64, f64) + 'static) -> Self {
        self.on_complete = Some(Rc::new(callback));
        self
    }

    pub fn abort_when(
        mut self,
        predicate: impl Fn(&O, &TweenValue, f64, f64) -> bool + 'static,
    ) -> Self {
        self.abort = Some(Rc::new(predicate));
        self
    }
}

fn write_back<O: AnimatableObject>(object: &RefCell<O>, key: &str, value: TweenValue) {
    match object.try_borrow_mut() {
        Ok(mut object) => {
            if !set_path(&mut *object, key, value) {
                warn!(key, "property write was rejected");
            }
        }
        Err(_) => warn!(key, "object is borrowed, skipped property write"),
    }
}

/// Translate property options into engine options for value kind `V`
fn engine_options<O, V>(
    object: &Rc<RefCell<O>>,
    key: &str,
    options: PropertyOptions<O>,
    to_value: fn(&V) -> TweenValue,
) -> AnimationOptions<V>
where
    O: AnimatableObject,
    V: 'static,
{
    let key: Rc<str> = Rc::from(key);
    let target: Rc<dyn AnimationTarget> = object.clone();
    let PropertyOptions {
        start_value: _,
        duration,
        delay,
        easing,
        on_start,
        on_change,
        on_complete,
        abort,
        user_data,
    } = options;

    let mut engine = AnimationOptions::<V>::new().target(target);
    engine.duration = duration;
    engine.delay = delay;
    engine.easing = easing;
    engine.user_data = user_data;

    if let Some(on_start) = on_start {
        engine = engine.on_start(move || on_start());
    }

    let (change_object, change_key) = (object.clone(), key.clone());
    engine = engine.on_change(move |value: &V, progress, duration_progress| {
        let value = to_value(value);
        write_back(&change_object, &change_key, value.clone());
        if let Some(on_change) = &on_change {
            on_change(&value, progress, duration_progress);
        }
    });

    let abort_key = Rc::clone(&key);
    let complete_object = object.clone();
    engine = engine.on_complete(move |value: &V, progress, duration_progress| {
        let geometric = complete_object
            .try_borrow()
            .map_or(false, |object| object.affects_coords(&key));
        if geometric {
            match complete_object.try_borrow_mut() {
                Ok(mut object) => object.set_coords(),
                Err(_) => warn!(key = &*key, "object is borrowed, skipped coordinate refresh"),
            }
        }
        if let Some(on_complete) = &on_complete {
            on_complete(&to_value(value), progress, duration_progress);
        }
    });

    if let Some(abort) = abort {
        let abort_object = object.clone();
        engine = engine.abort_when(move |value: &V, progress, duration_progress| {
            match abort_object.try_borrow() {
                Ok(object) => abort(&*object, &to_value(value), progress, duration_progress),
                Err(_) => {
                    warn!(key = &*abort_key, "object is borrowed, skipped abort check");
                    false
                }
            }
        });
    }

    engine
}

/// Animate one property of `object` towards `end`.
///
/// The start value is the one set in `options`, or the current value at
/// `key`. Keys whose leaf segment is one of the object's color properties
/// animate as colors; numbers animate as scalars and number arrays as vectors
/// (a number paired with an array is broadcast to its length).
pub fn animate_property<O: AnimatableObject>(
    animator: &Animator,
    object: &Rc<RefCell<O>>,
    key: &str,
    end: impl Into<EndValue>,
    options: PropertyOptions<O>,
) -> Result<CancelHandle> {
    let (is_color, current) = {
        let borrowed = object
            .try_borrow()
            .map_err(|_| TweenError::ObjectBorrowed(key.to_string()))?;
        let is_color = borrowed.color_properties().iter().any(|p| *p == leaf(key));
        (is_color, get_path(&*borrowed, key))
    };
    let start = options
        .start_value
        .clone()
        .or(current)
        .ok_or_else(|| TweenError::UnknownProperty(key.to_string()))?;
    let end = end.into().resolve(key, &start, is_color)?;
    debug!(key, from = ?start, to = ?end, "animating property");

    let mismatch = |from: &TweenValue, to: &TweenValue| TweenError::Mismatch {
        key: key.to_string(),
        from: from.kind(),
        to: to.kind(),
    };

    if is_color {
        return match (start, end) {
            (TweenValue::Color(start), TweenValue::Color(end)) => animator.animate_color(
                engine_options(object, key, options, |c: &String| TweenValue::Color(c.clone()))
                    .start_value(start)
                    .end_value(end),
            ),
            (start, end) => Err(mismatch(&start, &end)),
        };
    }

    let handle = match (start, end) {
        (TweenValue::Number(start), TweenValue::Number(end)) => animator.animate(
            engine_options(object, key, options, |v: &f64| TweenValue::Number(*v))
                .start_value(start)
                .end_value(end),
        ),
        (TweenValue::Vector(start), TweenValue::Vector(end)) => animator.animate(
            vector_options(object, key, options)
                .start_value(start)
                .end_value(end),
        ),
        (TweenValue::Number(start), TweenValue::Vector(end)) => animator.animate(
            vector_options(object, key, options)
                .start_value(vec![start; end.len()])
                .end_value(end),
        ),
        (TweenValue::Vector(start), TweenValue::Number(end)) => {
            let end = vec![end; start.len()];
            animator.animate(
                vector_options(object, key, options)
                    .start_value(start)
                    .end_value(end),
            )
        }
        (start, end) => return Err(mismatch(&start, &end)),
    };
    Ok(handle)
}

fn vector_options<O: AnimatableObject>(
    object: &Rc<RefCell<O>>,
    key: &str,
    options: PropertyOptions<O>,
) -> AnimationOptions<Vec<f64>> {
    engine_options(object, key, options, |v: &Vec<f64>| TweenValue::Vector(v.clone()))
}

/// Animate several properties with shared options.
///
/// Each key gets its own animation and handle, in input order. If any key
/// fails to start, the ones already started are cancelled and the error is
/// returned.
pub fn animate_properties<O, I, K, E>(
    animator: &Animator,
    object: &Rc<RefCell<O>>,
    properties: I,
    options: PropertyOptions<O>,
) -> Result<IndexMap<String, CancelHandle>>
where
    O: AnimatableObject,
    I: IntoIterator<Item = (K, E)>,
    K: Into<String>,
    E: Into<EndValue>,
{
    let mut handles = IndexMap::new();
    for (key, end) in properties {
        let key = key.into();
        match animate_property(animator, object, &key, end, options.clone()) {
            Ok(handle) => {
                handles.insert(key, handle);
            }
            Err(err) => {
                for handle in handles.values() {
                    handle.cancel();
                }
                return Err(err);
            }
        }
    }
    Ok(handles)
}

/// Cancel every running animation of `object` in the animator's registry
pub fn cancel_object_animations<O: AnimatableObject>(
    animator: &Animator,
    object: &Rc<RefCell<O>>,
) -> usize {
    let target = Target::object(object);
    animator.registry().cancel_by_target(Some(&target)).len()
}

/// Method-call form of the property animator on shared objects
pub trait ObjectAnimateExt<O: AnimatableObject> {
    fn animate(
        &self,
        animator: &Animator,
        key: &str,
        end: impl Into<EndValue>,
        options: PropertyOptions<O>,
    ) -> Result<CancelHandle>;

    fn animate_many<I, K, E>(
        &self,
        animator: &Animator,
        properties: I,
        options: PropertyOptions<O>,
    ) -> Result<IndexMap<String, CancelHandle>>
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: Into<EndValue>;

    /// Cancel this object's animations; returns how many were running
    fn cancel_animations(&self, animator: &Animator) -> usize;
}

impl<O: AnimatableObject> ObjectAnimateExt<O> for Rc<RefCell<O>> {
    fn animate(
        &self,
        animator: &Animator,
        key: &str,
        end: impl Into<EndValue>,
        options: PropertyOptions<O>,
    ) -> Result<CancelHandle> {
        animate_property(animator, self, key, end, options)
    }

    fn animate_many<I, K, E>(
        &self,
        animator: &Animator,
        properties: I,
        options: PropertyOptions<O>,
    ) -> Result<IndexMap<String, CancelHandle>>
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: Into<EndValue>,
    {
        animate_properties(animator, self, properties, options)
    }

    fn cancel_animations(&self, animator: &Animator) -> usize {
        cancel_object_animations(animator, self)
    }
}
