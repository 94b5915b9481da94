//! Easing functions for animations
//!
//! Every curve uses the classic `(t, b, c, d)` form: `t` is the elapsed time
//! in milliseconds, `b` the start value, `c` the change (end − start) and `d`
//! the duration. The free functions are pure and do not guard their inputs;
//! NaN or infinite arguments propagate into the result.
//!
//! [`Easing`] wraps the curves for use in animation options. It adds one
//! policy on top: once `t` reaches `d`, and for any duration of zero or less,
//! every built-in curve returns exactly `b + c`. End values are therefore
//! free of trigonometric rounding noise, and a zero-length animation still
//! has a finite end value. Custom curves are called as-is.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::rc::Rc;

/// User-supplied easing curve: `(t, b, c, d, channel) -> value`.
///
/// `channel` is the index of the component being eased (always 0 for scalar
/// animations), so a custom curve may vary per channel.
pub type EasingFn = Rc<dyn Fn(f64, f64, f64, f64, usize) -> f64>;

/// Easing function type
#[derive(Clone, Default)]
pub enum Easing {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    /// Default for value and vector animations
    #[default]
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
    /// Default for color animations
    ColorCosine,
    CubicBezier(f64, f64, f64, f64),
    Custom(EasingFn),
}

impl Easing {
    /// Wrap a closure as a custom easing curve
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64, f64, f64, f64, usize) -> f64 + 'static,
    {
        Easing::Custom(Rc::new(f))
    }

    /// Evaluate the curve for one channel
    pub fn ease(&self, t: f64, b: f64, c: f64, d: f64, channel: usize) -> f64 {
        if let Easing::Custom(f) = self {
            return f(t, b, c, d, channel);
        }
        if d <= 0.0 || t >= d {
            return b + c;
        }

        match self {
            Easing::Linear => linear(t, b, c, d),
            Easing::EaseInQuad => ease_in_quad(t, b, c, d),
            Easing::EaseOutQuad => ease_out_quad(t, b, c, d),
            Easing::EaseInOutQuad => ease_in_out_quad(t, b, c, d),
            Easing::EaseInCubic => ease_in_cubic(t, b, c, d),
            Easing::EaseOutCubic => ease_out_cubic(t, b, c, d),
            Easing::EaseInOutCubic => ease_in_out_cubic(t, b, c, d),
            Easing::EaseInQuart => ease_in_quart(t, b, c, d),
            Easing::EaseOutQuart => ease_out_quart(t, b, c, d),
            Easing::EaseInOutQuart => ease_in_out_quart(t, b, c, d),
            Easing::EaseInQuint => ease_in_quint(t, b, c, d),
            Easing::EaseOutQuint => ease_out_quint(t, b, c, d),
            Easing::EaseInOutQuint => ease_in_out_quint(t, b, c, d),
            Easing::EaseInSine => ease_in_sine(t, b, c, d),
            Easing::EaseOutSine => ease_out_sine(t, b, c, d),
            Easing::EaseInOutSine => ease_in_out_sine(t, b, c, d),
            Easing::EaseInExpo => ease_in_expo(t, b, c, d),
            Easing::EaseOutExpo => ease_out_expo(t, b, c, d),
            Easing::EaseInOutExpo => ease_in_out_expo(t, b, c, d),
            Easing::EaseInCirc => ease_in_circ(t, b, c, d),
            Easing::EaseOutCirc => ease_out_circ(t, b, c, d),
            Easing::EaseInOutCirc => ease_in_out_circ(t, b, c, d),
            Easing::EaseInElastic => ease_in_elastic(t, b, c, d),
            Easing::EaseOutElastic => ease_out_elastic(t, b, c, d),
            Easing::EaseInOutElastic => ease_in_out_elastic(t, b, c, d),
            Easing::EaseInBack => ease_in_back(t, b, c, d),
            Easing::EaseOutBack => ease_out_back(t, b, c, d),
            Easing::EaseInOutBack => ease_in_out_back(t, b, c, d),
            Easing::EaseInBounce => ease_in_bounce(t, b, c, d),
            Easing::EaseOutBounce => ease_out_bounce(t, b, c, d),
            Easing::EaseInOutBounce => ease_in_out_bounce(t, b, c, d),
            Easing::ColorCosine => color_cosine(t, b, c, d),
            Easing::CubicBezier(x1, y1, x2, y2) => {
                b + c * cubic_bezier_ease(t / d, *x1, *y1, *x2, *y2)
            }
            Easing::Custom(_) => unreachable!("custom easing handled above"),
        }
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::CubicBezier(x1, y1, x2, y2) => f
                .debug_tuple("CubicBezier")
                .field(x1)
                .field(y1)
                .field(x2)
                .field(y2)
                .finish(),
            Easing::Custom(_) => f.write_str("Custom(..)"),
            other => f.write_str(other.name()),
        }
    }
}

impl Easing {
    fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "Linear",
            Easing::EaseInQuad => "EaseInQuad",
            Easing::EaseOutQuad => "EaseOutQuad",
            Easing::EaseInOutQuad => "EaseInOutQuad",
            Easing::EaseInCubic => "EaseInCubic",
            Easing::EaseOutCubic => "EaseOutCubic",
            Easing::EaseInOutCubic => "EaseInOutCubic",
            Easing::EaseInQuart => "EaseInQuart",
            Easing::EaseOutQuart => "EaseOutQuart",
            Easing::EaseInOutQuart => "EaseInOutQuart",
            Easing::EaseInQuint => "EaseInQuint",
            Easing::EaseOutQuint => "EaseOutQuint",
            Easing::EaseInOutQuint => "EaseInOutQuint",
            Easing::EaseInSine => "EaseInSine",
            Easing::EaseOutSine => "EaseOutSine",
            Easing::EaseInOutSine => "EaseInOutSine",
            Easing::EaseInExpo => "EaseInExpo",
            Easing::EaseOutExpo => "EaseOutExpo",
            Easing::EaseInOutExpo => "EaseInOutExpo",
            Easing::EaseInCirc => "EaseInCirc",
            Easing::EaseOutCirc => "EaseOutCirc",
            Easing::EaseInOutCirc => "EaseInOutCirc",
            Easing::EaseInElastic => "EaseInElastic",
            Easing::EaseOutElastic => "EaseOutElastic",
            Easing::EaseInOutElastic => "EaseInOutElastic",
            Easing::EaseInBack => "EaseInBack",
            Easing::EaseOutBack => "EaseOutBack",
            Easing::EaseInOutBack => "EaseInOutBack",
            Easing::EaseInBounce => "EaseInBounce",
            Easing::EaseOutBounce => "EaseOutBounce",
            Easing::EaseInOutBounce => "EaseInOutBounce",
            Easing::ColorCosine => "ColorCosine",
            Easing::CubicBezier(..) => "CubicBezier",
            Easing::Custom(_) => "Custom",
        }
    }
}

// ============================================================================
// Polynomial
// ============================================================================

pub fn linear(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c * t / d + b
}

pub fn ease_in_quad(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t * t + b
}

pub fn ease_out_quad(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    -c * t * (t - 2.0) + b
}

pub fn ease_in_out_quad(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t + b;
    }
    let t = t - 1.0;
    -c / 2.0 * (t * (t - 2.0) - 1.0) + b
}

pub fn ease_in_cubic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t * t * t + b
}

pub fn ease_out_cubic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    c * (t * t * t + 1.0) + b
}

pub fn ease_in_out_cubic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t * t + b;
    }
    let t = t - 2.0;
    c / 2.0 * (t * t * t + 2.0) + b
}

pub fn ease_in_quart(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t.powi(4) + b
}

pub fn ease_out_quart(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    -c * (t.powi(4) - 1.0) + b
}

pub fn ease_in_out_quart(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t.powi(4) + b;
    }
    let t = t - 2.0;
    -c / 2.0 * (t.powi(4) - 2.0) + b
}

pub fn ease_in_quint(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t.powi(5) + b
}

pub fn ease_out_quint(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    c * (t.powi(5) + 1.0) + b
}

pub fn ease_in_out_quint(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t.powi(5) + b;
    }
    let t = t - 2.0;
    c / 2.0 * (t.powi(5) + 2.0) + b
}

// ============================================================================
// Sine, exponential, circular
// ============================================================================

pub fn ease_in_sine(t: f64, b: f64, c: f64, d: f64) -> f64 {
    -c * (t / d * FRAC_PI_2).cos() + c + b
}

pub fn ease_out_sine(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c * (t / d * FRAC_PI_2).sin() + b
}

pub fn ease_in_out_sine(t: f64, b: f64, c: f64, d: f64) -> f64 {
    -c / 2.0 * ((PI * t / d).cos() - 1.0) + b
}

/// Cosine ramp used by color animations: `b + c · (1 − cos(t/d · π/2))`
pub fn color_cosine(t: f64, b: f64, c: f64, d: f64) -> f64 {
    b + c * (1.0 - (t / d * FRAC_PI_2).cos())
}

pub fn ease_in_expo(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        b
    } else {
        c * 2f64.powf(10.0 * (t / d - 1.0)) + b
    }
}

pub fn ease_out_expo(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == d {
        b + c
    } else {
        c * (-(2f64.powf(-10.0 * t / d)) + 1.0) + b
    }
}

pub fn ease_in_out_expo(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    if t == d {
        return b + c;
    }
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * 2f64.powf(10.0 * (t - 1.0)) + b;
    }
    c / 2.0 * (-(2f64.powf(-10.0 * (t - 1.0))) + 2.0) + b
}

pub fn ease_in_circ(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    -c * ((1.0 - t * t).sqrt() - 1.0) + b
}

pub fn ease_out_circ(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    c * (1.0 - t * t).sqrt() + b
}

pub fn ease_in_out_circ(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return -c / 2.0 * ((1.0 - t * t).sqrt() - 1.0) + b;
    }
    let t = t - 2.0;
    c / 2.0 * ((1.0 - t * t).sqrt() + 1.0) + b
}

// ============================================================================
// Elastic
// ============================================================================

/// Amplitude equals the change and the phase shift is a quarter period.
fn elastic_wave(c: f64, t: f64, d: f64, period: f64) -> f64 {
    let shift = period / 4.0;
    c * 2f64.powf(10.0 * (t - 1.0)) * ((((t - 1.0) * d) - shift) * (2.0 * PI) / period).sin()
}

pub fn ease_in_elastic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    let t = t / d;
    if t == 1.0 {
        return b + c;
    }
    -elastic_wave(c, t, d, d * 0.3) + b
}

pub fn ease_out_elastic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    let t = t / d;
    if t == 1.0 {
        return b + c;
    }
    let period = d * 0.3;
    let shift = period / 4.0;
    c * 2f64.powf(-10.0 * t) * ((t * d - shift) * (2.0 * PI) / period).sin() + c + b
}

pub fn ease_in_out_elastic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    let t = t / (d / 2.0);
    if t == 2.0 {
        return b + c;
    }
    let period = d * (0.3 * 1.5);
    if t < 1.0 {
        return -0.5 * elastic_wave(c, t, d, period) + b;
    }
    let shift = period / 4.0;
    let t = t - 1.0;
    c * 2f64.powf(-10.0 * t) * ((t * d - shift) * (2.0 * PI) / period).sin() * 0.5 + c + b
}

// ============================================================================
// Back
// ============================================================================

const BACK_OVERSHOOT: f64 = 1.70158;

pub fn ease_in_back(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let s = BACK_OVERSHOOT;
    let t = t / d;
    c * t * t * ((s + 1.0) * t - s) + b
}

pub fn ease_out_back(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let s = BACK_OVERSHOOT;
    let t = t / d - 1.0;
    c * (t * t * ((s + 1.0) * t + s) + 1.0) + b
}

pub fn ease_in_out_back(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let s = BACK_OVERSHOOT * 1.525;
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * (t * t * ((s + 1.0) * t - s)) + b;
    }
    let t = t - 2.0;
    c / 2.0 * (t * t * ((s + 1.0) * t + s) + 2.0) + b
}

// ============================================================================
// Bounce
// ============================================================================

pub fn ease_out_bounce(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    if t < 1.0 / 2.75 {
        c * (7.5625 * t * t) + b
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        c * (7.5625 * t * t + 0.75) + b
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        c * (7.5625 * t * t + 0.9375) + b
    } else {
        let t = t - 2.625 / 2.75;
        c * (7.5625 * t * t + 0.984375) + b
    }
}

pub fn ease_in_bounce(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c - ease_out_bounce(d - t, 0.0, c, d) + b
}

pub fn ease_in_out_bounce(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t < d / 2.0 {
        ease_in_bounce(t * 2.0, 0.0, c, d) * 0.5 + b
    } else {
        ease_out_bounce(t * 2.0 - d, 0.0, c, d) * 0.5 + c * 0.5 + b
    }
}

// ============================================================================
// Cubic bezier
// ============================================================================

/// Cubic bezier easing, solved the way browsers resolve CSS `cubic-bezier()`.
///
/// The curve runs from (0, 0) to (1, 1) through control points (x1, y1) and
/// (x2, y2). Time is the x axis, so we first find the curve parameter whose
/// x equals `x`, then read y at that parameter.
fn cubic_bezier_ease(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Endpoints are always exact
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let p = BezierAxis::new(x1, x2).solve(x);
    BezierAxis::new(y1, y2).sample(p)
}

/// One coordinate of a cubic bezier with endpoints fixed at 0 and 1
///
/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³, expanded to a·t³ + b·t² + c·t.
#[derive(Clone, Copy)]
struct BezierAxis {
    a: f64,
    b: f64,
    c: f64,
}

impl BezierAxis {
    const EPSILON: f64 = 1e-7;

    fn new(p1: f64, p2: f64) -> Self {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        Self { a: 1.0 - c - b, b, c }
    }

    /// Horner form of a·t³ + b·t² + c·t
    fn sample(self, t: f64) -> f64 {
        ((self.a * t + self.b) * t + self.c) * t
    }

    /// B'(t) = 3a·t² + 2b·t + c
    fn slope(self, t: f64) -> f64 {
        (3.0 * self.a * t + 2.0 * self.b) * t + self.c
    }

    /// Parameter `t` in `0..=1` with `sample(t) == x`
    fn solve(self, x: f64) -> f64 {
        // Newton-Raphson converges in a few steps unless the curve is flat
        let mut t = x;
        for _ in 0..8 {
            let err = self.sample(t) - x;
            if err.abs() < Self::EPSILON {
                return t;
            }
            let slope = self.slope(t);
            if slope.abs() < Self::EPSILON {
                break;
            }
            t -= err / slope;
        }

        // Bisection always converges since x is monotonic for valid curves
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        t = x;
        for _ in 0..20 {
            let value = self.sample(t);
            if (value - x).abs() < Self::EPSILON {
                break;
            }
            if value < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) * 0.5;
        }
        t
    }
}
