//! Animation contexts
//!
//! An [`AnimationContext`] is the shared record of one animation: its
//! configuration, the values the engine refreshes every tick, and its
//! lifecycle state. The same context is stored in the registry, handed back by
//! [`CancelHandle::cancel`], and observed by callers, so every clone refers to
//! one entry.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::registry::WeakRegistry;

thread_local! {
    static NEXT_CONTEXT_ID: Cell<u64> = const { Cell::new(1) };
}

/// Lifecycle state of an animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// Registered, waiting for the delay or the first frame
    Pending,
    /// Ticking
    Running,
    /// Reached its end value
    Completed,
    /// Stopped by cancellation or an abort predicate
    Aborted,
}

impl AnimationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AnimationState::Completed | AnimationState::Aborted)
    }
}

/// A value an animation can produce
#[derive(Clone, Debug, PartialEq)]
pub enum TweenValue {
    Number(f64),
    Vector(Vec<f64>),
    /// A CSS color string
    Color(String),
}

impl TweenValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            TweenValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            TweenValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&str> {
        match self {
            TweenValue::Color(c) => Some(c),
            _ => None,
        }
    }

    /// Short name of the value shape, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            TweenValue::Number(_) => "number",
            TweenValue::Vector(_) => "vector",
            TweenValue::Color(_) => "color",
        }
    }
}

impl From<f64> for TweenValue {
    fn from(v: f64) -> Self {
        TweenValue::Number(v)
    }
}

impl From<Vec<f64>> for TweenValue {
    fn from(v: Vec<f64>) -> Self {
        TweenValue::Vector(v)
    }
}

impl From<&[f64]> for TweenValue {
    fn from(v: &[f64]) -> Self {
        TweenValue::Vector(v.to_vec())
    }
}

/// Identity of the canvas an animated object is drawn on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CanvasId(pub u64);

/// Objects that can own animations
pub trait AnimationTarget {
    /// The canvas this object belongs to, if any
    fn canvas(&self) -> Option<CanvasId> {
        None
    }
}

/// The owner of an animation, used for cancellation lookups.
///
/// Objects compare by identity (same allocation); ids and names compare by
/// value.
#[derive(Clone)]
pub enum Target {
    Object(Rc<dyn AnimationTarget>),
    Id(u64),
    Name(Rc<str>),
}

impl Target {
    /// Target an object by identity
    pub fn object<T: AnimationTarget + 'static>(object: &Rc<T>) -> Self {
        let object: Rc<dyn AnimationTarget> = object.clone();
        Target::Object(object)
    }

    /// Canvas of an object target. Primitive targets never have one.
    pub fn canvas(&self) -> Option<CanvasId> {
        match self {
            Target::Object(object) => object.canvas(),
            Target::Id(_) | Target::Name(_) => None,
        }
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Target::Object(a), Target::Object(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
            }
            (Target::Id(a), Target::Id(b)) => a == b,
            (Target::Name(a), Target::Name(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Object(object) => write!(f, "Object({:p})", Rc::as_ptr(object) as *const ()),
            Target::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Target::Name(name) => f.debug_tuple("Name").field(name).finish(),
        }
    }
}

impl From<u64> for Target {
    fn from(id: u64) -> Self {
        Target::Id(id)
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Name(Rc::from(name))
    }
}

impl From<Rc<dyn AnimationTarget>> for Target {
    fn from(object: Rc<dyn AnimationTarget>) -> Self {
        Target::Object(object)
    }
}

/// Configuration captured when an animation is created
pub(crate) struct ContextInit {
    pub start_value: TweenValue,
    pub end_value: TweenValue,
    pub by_value: TweenValue,
    pub duration: f64,
    pub delay: f64,
    pub target: Option<Target>,
    pub user_data: Option<Rc<dyn Any>>,
}

struct ContextData {
    start_value: TweenValue,
    end_value: TweenValue,
    by_value: TweenValue,
    current_value: TweenValue,
    completion_rate: f64,
    duration_rate: f64,
    duration: f64,
    delay: f64,
    state: AnimationState,
    target: Option<Target>,
}

type AbortHook = Box<dyn Fn()>;

struct ContextInner {
    id: u64,
    data: RefCell<ContextData>,
    registry: RefCell<Option<WeakRegistry>>,
    abort_hook: RefCell<Option<AbortHook>>,
    user_data: Option<Rc<dyn Any>>,
}

/// Shared record of one animation
#[derive(Clone)]
pub struct AnimationContext {
    inner: Rc<ContextInner>,
}

impl AnimationContext {
    pub(crate) fn new(init: ContextInit) -> Self {
        let id = NEXT_CONTEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });

        Self {
            inner: Rc::new(ContextInner {
                id,
                data: RefCell::new(ContextData {
                    current_value: init.start_value.clone(),
                    start_value: init.start_value,
                    end_value: init.end_value,
                    by_value: init.by_value,
                    completion_rate: 0.0,
                    duration_rate: 0.0,
                    duration: init.duration,
                    delay: init.delay,
                    state: AnimationState::Pending,
                    target: init.target,
                }),
                registry: RefCell::new(None),
                abort_hook: RefCell::new(None),
                user_data: init.user_data,
            }),
        }
    }

    /// Per-thread unique id, used to correlate log lines
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn state(&self) -> AnimationState {
        self.inner.data.borrow().state
    }

    pub fn start_value(&self) -> TweenValue {
        self.inner.data.borrow().start_value.clone()
    }

    pub fn end_value(&self) -> TweenValue {
        self.inner.data.borrow().end_value.clone()
    }

    /// Total change from start to end
    pub fn by_value(&self) -> TweenValue {
        self.inner.data.borrow().by_value.clone()
    }

    /// Value produced by the most recent tick
    pub fn current_value(&self) -> TweenValue {
        self.inner.data.borrow().current_value.clone()
    }

    /// Value progress of the most recent tick
    pub fn completion_rate(&self) -> f64 {
        self.inner.data.borrow().completion_rate
    }

    /// Time progress of the most recent tick
    pub fn duration_rate(&self) -> f64 {
        self.inner.data.borrow().duration_rate
    }

    pub fn duration(&self) -> f64 {
        self.inner.data.borrow().duration
    }

    pub fn delay(&self) -> f64 {
        self.inner.data.borrow().delay
    }

    pub fn target(&self) -> Option<Target> {
        self.inner.data.borrow().target.clone()
    }

    /// Caller data attached through the animation options
    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.inner.user_data.as_deref()?.downcast_ref::<T>()
    }

    /// The handle that cancels this animation
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            context: self.clone(),
        }
    }

    /// Abort the animation and remove it from its registry.
    ///
    /// Works in every phase, including the delay window. Calling it on a
    /// finished animation changes nothing. Always returns this context.
    pub fn cancel(&self) -> AnimationContext {
        if !self.state().is_terminal() {
            self.inner.data.borrow_mut().state = AnimationState::Aborted;
            debug!(animation = self.id(), "animation aborted");

            let hook = self.inner.abort_hook.borrow_mut().take();
            if let Some(hook) = hook {
                hook();
            }
            self.unregister();
        }
        self.clone()
    }

    /// Whether two handles refer to the same animation
    pub fn ptr_eq(&self, other: &AnimationContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn set_state(&self, state: AnimationState) {
        self.inner.data.borrow_mut().state = state;
    }

    pub(crate) fn refresh(&self, value: TweenValue, completion_rate: f64, duration_rate: f64) {
        let mut data = self.inner.data.borrow_mut();
        data.current_value = value;
        data.completion_rate = completion_rate;
        data.duration_rate = duration_rate;
    }

    pub(crate) fn attach_registry(&self, registry: WeakRegistry) {
        *self.inner.registry.borrow_mut() = Some(registry);
    }

    pub(crate) fn set_abort_hook(&self, hook: AbortHook) {
        *self.inner.abort_hook.borrow_mut() = Some(hook);
    }

    /// Release engine resources after a normal completion
    pub(crate) fn finish(&self) {
        self.inner.abort_hook.borrow_mut().take();
        self.unregister();
    }

    /// Remove from the registry; only the first call has an effect
    fn unregister(&self) {
        let registry = self.inner.registry.borrow_mut().take();
        if let Some(registry) = registry.and_then(|weak| weak.upgrade()) {
            registry.remove(self);
        }
    }
}

impl fmt::Debug for AnimationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.data.borrow();
        f.debug_struct("AnimationContext")
            .field("id", &self.inner.id)
            .field("state", &data.state)
            .field("current_value", &data.current_value)
            .field("completion_rate", &data.completion_rate)
            .field("duration_rate", &data.duration_rate)
            .field("target", &data.target)
            .finish()
    }
}

/// Handle returned when an animation starts
#[derive(Clone)]
pub struct CancelHandle {
    context: AnimationContext,
}

impl CancelHandle {
    /// Abort the animation; idempotent. Returns the animation's context.
    pub fn cancel(&self) -> AnimationContext {
        self.context.cancel()
    }

    pub fn context(&self) -> &AnimationContext {
        &self.context
    }
}

impl PartialEq for CancelHandle {
    fn eq(&self, other: &Self) -> bool {
        self.context.ptr_eq(&other.context)
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancelHandle").field(&self.context.id()).finish()
    }
}
