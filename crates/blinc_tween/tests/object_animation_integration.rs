//! Integration tests for property animation on scene objects
//!
//! These tests verify that:
//! - Relative and absolute end values converge on the object
//! - Dotted key paths are read and written through nested nodes
//! - Color keys animate as rgba strings
//! - Geometric keys refresh coordinates before the caller's completion
//! - Multi-property animation yields one handle per key

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blinc_tween::{
    running_animations, AnimatableObject, AnimationState, Animator, CanvasId, FrameLoop,
    ObjectAnimateExt, PropertyNode, PropertyOptions, Target, TweenError, TweenValue,
};

#[derive(Debug, Default)]
struct Shadow {
    offset_x: f64,
    offset_y: f64,
}

impl PropertyNode for Shadow {
    fn property(&self, key: &str) -> Option<TweenValue> {
        match key {
            "offset_x" => Some(TweenValue::Number(self.offset_x)),
            "offset_y" => Some(TweenValue::Number(self.offset_y)),
            _ => None,
        }
    }

    fn set_property(&mut self, key: &str, value: TweenValue) -> bool {
        let Some(v) = value.as_number() else {
            return false;
        };
        match key {
            "offset_x" => self.offset_x = v,
            "offset_y" => self.offset_y = v,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Default)]
struct Rect {
    left: f64,
    top: f64,
    opacity: f64,
    fill: String,
    dash: Vec<f64>,
    shadow: Shadow,
    canvas: Option<CanvasId>,
    coords_refreshed: Cell<u32>,
    /// `left` as seen by the last coordinate refresh
    coords_left: Cell<f64>,
}

impl Rect {
    fn at(left: f64) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Rect {
            left,
            opacity: 1.0,
            fill: "rgb(255,0,0)".to_string(),
            dash: vec![2.0, 4.0],
            ..Rect::default()
        }))
    }
}

impl PropertyNode for Rect {
    fn property(&self, key: &str) -> Option<TweenValue> {
        match key {
            "left" => Some(TweenValue::Number(self.left)),
            "top" => Some(TweenValue::Number(self.top)),
            "opacity" => Some(TweenValue::Number(self.opacity)),
            "fill" => Some(TweenValue::Color(self.fill.clone())),
            "dash" => Some(TweenValue::Vector(self.dash.clone())),
            _ => None,
        }
    }

    fn set_property(&mut self, key: &str, value: TweenValue) -> bool {
        match (key, value) {
            ("left", TweenValue::Number(v)) => self.left = v,
            ("top", TweenValue::Number(v)) => self.top = v,
            ("opacity", TweenValue::Number(v)) => self.opacity = v,
            ("fill", TweenValue::Color(c)) => self.fill = c,
            ("dash", TweenValue::Vector(v)) => self.dash = v,
            _ => return false,
        }
        true
    }

    fn child(&self, key: &str) -> Option<&dyn PropertyNode> {
        match key {
            "shadow" => Some(&self.shadow),
            _ => None,
        }
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut dyn PropertyNode> {
        match key {
            "shadow" => Some(&mut self.shadow),
            _ => None,
        }
    }
}

impl AnimatableObject for Rect {
    fn set_coords(&mut self) {
        self.coords_refreshed.set(self.coords_refreshed.get() + 1);
        self.coords_left.set(self.left);
    }

    fn canvas(&self) -> Option<CanvasId> {
        self.canvas
    }
}

fn quick() -> PropertyOptions<Rect> {
    PropertyOptions::new().duration(100.0)
}

/// Test that `+=` moves a property up from its current value
#[test]
fn test_relative_increase() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let rect = Rect::at(20.0);

    rect.animate(&animator, "left", "+=40", quick()).unwrap();
    frames.run_until_idle(16.0, 100);
    assert!((rect.borrow().left - 60.0).abs() < 1e-9);
}

/// Test that `-=` moves a property down from its current value
#[test]
fn test_relative_decrease() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let rect = Rect::at(123.0);

    rect.animate(&animator, "left", "-=40", quick()).unwrap();
    frames.run_until_idle(16.0, 100);
    assert!((rect.borrow().left - 83.0).abs() < 1e-9);
}

/// Test that every tick is written back while the animation runs
#[test]
fn test_values_are_written_each_tick() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let rect = Rect::at(0.0);

    let observed = Rc::new(RefCell::new(Vec::new()));
    let (sink, reader) = (observed.clone(), rect.clone());
    rect.animate(
        &animator,
        "left",
        100.0,
        quick().on_change(move |value, _, _| {
            // The object already holds the reported value
            let left = reader.borrow().left;
            assert_eq!(value.as_number(), Some(left));
            sink.borrow_mut().push(left);
        }),
    )
    .unwrap();

    frames.run_until_idle(16.0, 100);
    let observed = observed.borrow();
    assert!(observed.len() > 3);
    assert!(observed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(observed.last(), Some(&100.0));
}

/// Test that dotted keys reach nested nodes
#[test]
fn test_keypath_animation() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let rect = Rect::at(0.0);
    rect.borrow_mut().shadow.offset_x = 5.0;

    rect.animate(&animator, "shadow.offset_x", "+=10", quick())
        .unwrap();
    frames.run_until_idle(16.0, 100);

    let rect = rect.borrow();
    assert!((rect.shadow.offset_x - 15.0).abs() < 1e-9);
    assert_eq!(rect.shadow.offset_y, 0.0);
    assert_eq!(rect.coords_refreshed.get(), 0);
}

/// Test that an explicit start value overrides the current one
#[test]
fn test_explicit_start_value() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let rect = Rect::at(500.0);

    let first = Rc::new(Cell::new(f64::NAN));
    let sink = first.clone();
    rect.animate(
        &animator,
        "top",
        "+=10",
        quick().start_value(30.0).on_start(move || sink.set(30.0)),
    )
    .unwrap();

    frames.advance(16.0);
    assert_eq!(first.get(), 30.0);
    assert_eq!(rect.borrow().top, 30.0);
    frames.run_until_idle(16.0, 100);
    assert!((rect.borrow().top - 40.0).abs() < 1e-9);
}

/// Test that color keys animate through rgba strings
#[test]
fn test_color_property() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let rect = Rect::at(0.0);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    rect.animate(
        &animator,
        "fill",
        "blue",
        quick().on_change(move |value, _, _| {
            sink.borrow_mut().push(value.as_color().map(str::to_string));
        }),
    )
    .unwrap();

    frames.run_until_idle(16.0, 100);
    assert_eq!(rect.borrow().fill, "rgba(0,0,255,1)");
    let seen = seen.borrow();
    assert_eq!(seen.first(), Some(&Some("rgba(255,0,0,1)".to_string())));
    assert!(seen.iter().all(|c| c.as_deref().is_some_and(|c| c.starts_with("rgba("))));
}

/// Test that number arrays animate element-wise
#[test]
fn test_vector_property() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let rect = Rect::at(0.0);

    rect.animate(&animator, "dash", vec![6.0, 8.0], quick())
        .unwrap();
    frames.run_until_idle(16.0, 100);
    assert_eq!(rect.borrow().dash, vec![6.0, 8.0]);
}

/// Test that geometric keys refresh coordinates before the caller's
/// completion callback runs
#[test]
fn test_geometry_refreshes_coords_first() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let rect = Rect::at(0.0);

    let refreshed_before_callback = Rc::new(Cell::new(None));
    let (flag, reader) = (refreshed_before_callback.clone(), rect.clone());
    rect.animate(
        &animator,
        "left",
        50.0,
        quick().on_complete(move |_, _, _| {
            let rect = reader.borrow();
            flag.set(Some((rect.coords_refreshed.get(), rect.coords_left.get())));
        }),
    )
    .unwrap();

    frames.run_until_idle(16.0, 100);
    assert_eq!(refreshed_before_callback.get(), Some((1, 50.0)));

    rect.animate(&animator, "opacity", 0.0, quick()).unwrap();
    frames.run_until_idle(16.0, 100);
    assert_eq!(rect.borrow().coords_refreshed.get(), 1);
}

/// Test that an aborted geometric animation never refreshes coordinates
#[test]
fn test_abort_skips_coords() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let rect = Rect::at(0.0);

    let handle = rect
        .animate(
            &animator,
            "left",
            100.0,
            quick().abort_when(|rect: &Rect, _, _, _| rect.left > 10.0),
        )
        .unwrap();

    frames.run_until_idle(16.0, 100);
    assert_eq!(handle.context().state(), AnimationState::Aborted);
    let rect = rect.borrow();
    assert!(rect.left > 10.0 && rect.left < 100.0);
    assert_eq!(rect.coords_refreshed.get(), 0);
}

/// Test that one call per key yields independent animations
#[test]
fn test_animate_many() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();
    let before = registry.len();
    let rect = Rect::at(10.0);

    let handles = rect
        .animate_many(
            &animator,
            [("left", "+=30"), ("top", "20"), ("fill", "white")],
            quick(),
        )
        .unwrap();

    let keys: Vec<&str> = handles.keys().map(String::as_str).collect();
    assert_eq!(keys, ["left", "top", "fill"]);
    assert_eq!(registry.len(), before + 3);
    assert_eq!(registry.find_animations_by_target(&Target::object(&rect)).len(), 3);

    handles["top"].cancel();
    frames.run_until_idle(16.0, 100);

    let rect = rect.borrow();
    assert!((rect.left - 40.0).abs() < 1e-9);
    assert_eq!(rect.top, 0.0);
    assert_eq!(rect.fill, "rgba(255,255,255,1)");
    assert_eq!(registry.len(), before);
}

/// Test that a failing key leaves none of the batch running
#[test]
fn test_animate_many_is_all_or_nothing() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();
    let before = registry.len();
    let rect = Rect::at(10.0);

    let err = rect
        .animate_many(&animator, [("left", "+=30"), ("fill", "+=3")], quick())
        .unwrap_err();
    assert!(matches!(err, TweenError::RelativeOnNonNumeric(key) if key == "fill"));
    assert_eq!(registry.len(), before);
}

/// Test that objects can be cancelled by identity or through their canvas
#[test]
fn test_cancel_object_animations() {
    let frames = FrameLoop::new();
    let animator = Animator::new(&frames);
    let registry = running_animations();

    let on_canvas = Rect::at(0.0);
    on_canvas.borrow_mut().canvas = Some(CanvasId(9));
    let elsewhere = Rect::at(0.0);

    on_canvas.animate(&animator, "left", 10.0, quick()).unwrap();
    on_canvas.animate(&animator, "top", 10.0, quick()).unwrap();
    let kept = elsewhere.animate(&animator, "left", 10.0, quick()).unwrap();

    assert_eq!(registry.cancel_by_canvas(Some(CanvasId(9))).len(), 2);
    assert_eq!(kept.context().state(), AnimationState::Pending);

    assert_eq!(elsewhere.cancel_animations(&animator), 1);
    assert_eq!(elsewhere.cancel_animations(&animator), 0);
    assert_eq!(kept.context().state(), AnimationState::Aborted);
}
