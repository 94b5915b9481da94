//! Integration tests for the running animation registry
//!
//! These tests verify that:
//! - Starting an animation registers it synchronously
//! - Cancel handles are idempotent and hand back the original context
//! - Bulk cancellation by owner, canvas or wildcard touches only matches
//! - The per-thread registry keeps its identity through all of it

use std::rc::Rc;

use blinc_tween::{
    running_animations, AnimationOptions, AnimationState, AnimationTarget, Animator, CanvasId,
    FrameLoop, Target,
};

struct Sprite {
    canvas: Option<CanvasId>,
}

impl AnimationTarget for Sprite {
    fn canvas(&self) -> Option<CanvasId> {
        self.canvas
    }
}

fn sprite(canvas: Option<u64>) -> Rc<Sprite> {
    Rc::new(Sprite {
        canvas: canvas.map(CanvasId),
    })
}

fn options() -> AnimationOptions<f64> {
    AnimationOptions::new()
        .start_value(0.0)
        .end_value(10.0)
        .duration(100.0)
}

/// Test that every animate call adds exactly one entry before any frame runs
#[test]
fn test_animate_registers_synchronously() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();
    assert!(registry.ptr_eq(animator.registry()));

    let before = registry.len();
    animator.animate(options());
    assert_eq!(registry.len(), before + 1);
    animator.animate(AnimationOptions::new().end_value(vec![1.0, 2.0]));
    assert_eq!(registry.len(), before + 2);
    animator
        .animate_color(
            AnimationOptions::new()
                .start_value("red".to_string())
                .end_value("blue".to_string()),
        )
        .unwrap();
    assert_eq!(registry.len(), before + 3);
    assert_eq!(frames.frame_count(), 0);

    registry.cancel_all();
}

/// Test that cancelling is idempotent and returns the context with its data
#[test]
fn test_cancel_handle_round_trips_context() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();
    let before = registry.len();

    let handle = animator.animate(options().user_data("foo"));
    assert_eq!(registry.len(), before + 1);

    let first = handle.cancel();
    assert_eq!(registry.len(), before);
    let second = handle.cancel();
    assert_eq!(registry.len(), before);

    assert!(first.ptr_eq(handle.context()));
    assert!(second.ptr_eq(&first));
    assert_eq!(first.user_data::<&str>(), Some(&"foo"));
    assert_eq!(first.state(), AnimationState::Aborted);
}

/// Test that cancelling a finished animation leaves the registry alone
#[test]
fn test_cancel_after_completion_removes_nothing() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();

    let handle = animator.animate(options().duration(10.0));
    frames.run_until_idle(16.0, 10);
    assert_eq!(handle.context().state(), AnimationState::Completed);

    let other = animator.animate(options());
    let before = registry.len();
    let context = handle.cancel();
    assert_eq!(registry.len(), before);
    assert_eq!(context.state(), AnimationState::Completed);
    other.cancel();
}

/// Test that cancel_all empties the registry but keeps it usable
#[test]
fn test_cancel_all_keeps_registry_identity() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();
    registry.cancel_all();

    let handles: Vec<_> = (0..3).map(|_| animator.animate(options())).collect();
    let cancelled = registry.cancel_all();

    assert_eq!(cancelled.len(), 3);
    assert!(registry.is_empty());
    for (context, handle) in cancelled.iter().zip(&handles) {
        assert!(context.ptr_eq(handle.context()));
        assert_eq!(context.state(), AnimationState::Aborted);
    }

    // Same registry, still queryable and still receiving new animations
    assert!(registry.ptr_eq(&running_animations()));
    assert!(registry.find_animation(&handles[0]).is_none());
    assert_eq!(registry.find_animation_index(&handles[0]), None);
    let handle = animator.animate(options());
    assert_eq!(registry.find_animation_index(&handle), Some(0));
    registry.cancel_all();

    frames.run_until_idle(16.0, 20);
    assert!(handles
        .iter()
        .all(|h| h.context().state() == AnimationState::Aborted));
}

/// Test that cancel_by_target matches owners by identity only
#[test]
fn test_cancel_by_target() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();

    let (a, b) = (sprite(None), sprite(None));
    let on_a = animator.animate(options().target(Target::object(&a)));
    let also_on_a = animator.animate(options().target(Target::object(&a)));
    let on_b = animator.animate(options().target(Target::object(&b)));
    let on_id = animator.animate(options().target(7u64));
    let untargeted = animator.animate(options());
    let before = registry.len();

    assert!(registry.cancel_by_target(None).is_empty());
    assert_eq!(registry.len(), before);

    assert_eq!(registry.find_animations_by_target(&Target::object(&a)).len(), 2);
    let cancelled = registry.cancel_by_target(Some(&Target::object(&a)));
    assert_eq!(cancelled.len(), 2);
    assert_eq!(registry.len(), before - 2);
    assert_eq!(on_a.context().state(), AnimationState::Aborted);
    assert_eq!(also_on_a.context().state(), AnimationState::Aborted);
    assert_eq!(on_b.context().state(), AnimationState::Pending);

    let cancelled = registry.cancel_by_target(Some(&Target::Id(7)));
    assert_eq!(cancelled.len(), 1);
    assert!(cancelled[0].ptr_eq(on_id.context()));
    assert_eq!(untargeted.context().state(), AnimationState::Pending);

    registry.cancel_all();
}

/// Test that cancel_by_canvas only reaches objects drawn on that canvas
#[test]
fn test_cancel_by_canvas() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();

    let (first, second, loose) = (sprite(Some(1)), sprite(Some(2)), sprite(None));
    let on_first = animator.animate(options().target(Target::object(&first)));
    let on_second = animator.animate(options().target(Target::object(&second)));
    let on_loose = animator.animate(options().target(Target::object(&loose)));
    let on_primitive = animator.animate(options().target("canvas-1"));

    assert!(registry.cancel_by_canvas(None).is_empty());

    let cancelled = registry.cancel_by_canvas(Some(CanvasId(1)));
    assert_eq!(cancelled.len(), 1);
    assert!(cancelled[0].ptr_eq(on_first.context()));
    for untouched in [&on_second, &on_loose, &on_primitive] {
        assert_eq!(untouched.context().state(), AnimationState::Pending);
        assert!(registry.find_animation(untouched).is_some());
    }

    registry.cancel_all();
}

/// Test that finished animations leave the registry by themselves
#[test]
fn test_completion_unregisters() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();
    let before = registry.len();

    let short = animator.animate(options().duration(20.0));
    let long = animator.animate(options().duration(200.0));
    assert_eq!(registry.len(), before + 2);

    frames.advance(16.0);
    frames.advance(32.0);
    assert_eq!(short.context().state(), AnimationState::Completed);
    assert_eq!(registry.len(), before + 1);
    assert!(registry.find_animation(&long).is_some());

    frames.run_until_idle(16.0, 50);
    assert_eq!(registry.len(), before);
}
