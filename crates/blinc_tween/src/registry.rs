//! Running animation registry
//!
//! Every started animation is listed here until it completes or is aborted.
//! Bulk cancellation works on a snapshot, so cancelling (which removes
//! entries) never disturbs the iteration.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::context::{AnimationContext, CancelHandle, CanvasId, Target};

type Entries = Rc<RefCell<Vec<AnimationContext>>>;

thread_local! {
    static RUNNING_ANIMATIONS: AnimationRegistry = AnimationRegistry::new();
}

/// The registry animations use unless given another one. One per thread;
/// every call on a thread returns the same registry.
pub fn running_animations() -> AnimationRegistry {
    RUNNING_ANIMATIONS.with(AnimationRegistry::clone)
}

/// Ordered list of running animations
///
/// Clones share the same list.
#[derive(Clone, Default)]
pub struct AnimationRegistry {
    entries: Entries,
}

/// Registry reference held by contexts so they can remove themselves
pub(crate) struct WeakRegistry(Weak<RefCell<Vec<AnimationContext>>>);

impl WeakRegistry {
    pub(crate) fn upgrade(&self) -> Option<AnimationRegistry> {
        self.0.upgrade().map(|entries| AnimationRegistry { entries })
    }
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<AnimationContext> {
        self.entries.borrow().get(index).cloned()
    }

    /// Current entries, in registration order
    pub fn snapshot(&self) -> Vec<AnimationContext> {
        self.entries.borrow().clone()
    }

    pub fn contains(&self, context: &AnimationContext) -> bool {
        self.entries.borrow().iter().any(|c| c.ptr_eq(context))
    }

    /// Whether both values are the same registry
    pub fn ptr_eq(&self, other: &AnimationRegistry) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }

    pub(crate) fn add(&self, context: &AnimationContext) {
        self.entries.borrow_mut().push(context.clone());
        context.attach_registry(WeakRegistry(Rc::downgrade(&self.entries)));
    }

    pub(crate) fn remove(&self, context: &AnimationContext) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.iter().position(|c| c.ptr_eq(context)) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Cancel every animation. Returns the contexts that were running.
    pub fn cancel_all(&self) -> Vec<AnimationContext> {
        let cancelled = self.cancel_matching(|_| true);
        debug!(count = cancelled.len(), "cancelled all animations");
        cancelled
    }

    /// Cancel the animations owned by `target`. `None` cancels nothing.
    pub fn cancel_by_target(&self, target: Option<&Target>) -> Vec<AnimationContext> {
        let Some(target) = target else {
            return Vec::new();
        };
        self.cancel_matching(|c| c.target().as_ref() == Some(target))
    }

    /// Cancel the animations whose target is an object on `canvas`. `None`
    /// cancels nothing.
    pub fn cancel_by_canvas(&self, canvas: Option<CanvasId>) -> Vec<AnimationContext> {
        let Some(canvas) = canvas else {
            return Vec::new();
        };
        self.cancel_matching(|c| c.target().and_then(|t| t.canvas()) == Some(canvas))
    }

    /// Context of the animation `handle` cancels, while it is running
    pub fn find_animation(&self, handle: &CancelHandle) -> Option<AnimationContext> {
        self.entries
            .borrow()
            .iter()
            .find(|c| c.ptr_eq(handle.context()))
            .cloned()
    }

    /// Position of the animation `handle` cancels, while it is running
    pub fn find_animation_index(&self, handle: &CancelHandle) -> Option<usize> {
        self.entries
            .borrow()
            .iter()
            .position(|c| c.ptr_eq(handle.context()))
    }

    /// Running animations owned by `target`, without cancelling them
    pub fn find_animations_by_target(&self, target: &Target) -> Vec<AnimationContext> {
        self.entries
            .borrow()
            .iter()
            .filter(|c| c.target().as_ref() == Some(target))
            .cloned()
            .collect()
    }

    fn cancel_matching(
        &self,
        mut predicate: impl FnMut(&AnimationContext) -> bool,
    ) -> Vec<AnimationContext> {
        let matches: Vec<AnimationContext> = self
            .entries
            .borrow()
            .iter()
            .filter(|c| predicate(c))
            .cloned()
            .collect();
        for context in &matches {
            context.cancel();
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AnimationState, ContextInit, TweenValue};

    fn context(target: Option<Target>) -> AnimationContext {
        AnimationContext::new(ContextInit {
            start_value: TweenValue::Number(0.0),
            end_value: TweenValue::Number(1.0),
            by_value: TweenValue::Number(1.0),
            duration: 100.0,
            delay: 0.0,
            target,
            user_data: None,
        })
    }

    #[test]
    fn test_global_registry_is_shared() {
        assert!(running_animations().ptr_eq(&running_animations()));
        assert!(!running_animations().ptr_eq(&AnimationRegistry::new()));
    }

    #[test]
    fn test_cancel_removes_entry() {
        let registry = AnimationRegistry::new();
        let (a, b) = (context(None), context(None));
        registry.add(&a);
        registry.add(&b);
        assert_eq!(registry.len(), 2);

        a.cancel();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(0).unwrap().ptr_eq(&b));
        assert!(!registry.contains(&a));
    }

    #[test]
    fn test_cancel_all_returns_snapshot() {
        let registry = AnimationRegistry::new();
        let contexts: Vec<_> = (0..3).map(|_| context(None)).collect();
        contexts.iter().for_each(|c| registry.add(c));

        let cancelled = registry.cancel_all();
        assert_eq!(cancelled.len(), 3);
        assert!(registry.is_empty());
        for (returned, original) in cancelled.iter().zip(&contexts) {
            assert!(returned.ptr_eq(original));
            assert_eq!(original.state(), AnimationState::Aborted);
        }
    }

    #[test]
    fn test_cancel_by_target() {
        let registry = AnimationRegistry::new();
        let (a, b) = (context(Some(Target::Id(1))), context(Some(Target::Id(2))));
        registry.add(&a);
        registry.add(&b);

        assert!(registry.cancel_by_target(None).is_empty());
        assert_eq!(registry.len(), 2);

        let cancelled = registry.cancel_by_target(Some(&Target::Id(1)));
        assert_eq!(cancelled.len(), 1);
        assert!(cancelled[0].ptr_eq(&a));
        assert_eq!(registry.len(), 1);
        assert_eq!(b.state(), AnimationState::Pending);
    }

    #[test]
    fn test_find_by_handle() {
        let registry = AnimationRegistry::new();
        let (a, b) = (context(None), context(None));
        registry.add(&a);
        registry.add(&b);

        let handle = b.cancel_handle();
        assert!(registry.find_animation(&handle).unwrap().ptr_eq(&b));
        assert_eq!(registry.find_animation_index(&handle), Some(1));

        handle.cancel();
        assert!(registry.find_animation(&handle).is_none());
        assert_eq!(registry.find_animation_index(&handle), None);
    }

    #[test]
    fn test_dropped_registry_does_not_block_cancel() {
        let ctx = context(None);
        {
            let registry = AnimationRegistry::new();
            registry.add(&ctx);
        }
        // The context only holds a weak reference to the list
        ctx.cancel();
        assert_eq!(ctx.state(), AnimationState::Aborted);
    }
}
