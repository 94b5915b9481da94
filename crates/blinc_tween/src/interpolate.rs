//! Value interpolators
//!
//! Each interpolator turns elapsed time into a value through an [`Easing`]:
//!
//! - [`ScalarInterpolator`] for single numbers
//! - [`VectorInterpolator`] for fixed-length number arrays, eased per index
//! - [`ColorInterpolator`] for colors, eased per RGBA channel
//!
//! Progress is the covered fraction of the total change. A component whose
//! change is zero reports progress 0.

use blinc_color::{format_channels, parse_channels, Channels, ColorParseError};

use crate::context::TweenValue;
use crate::easing::Easing;
use crate::engine::{AbortPredicate, Calculated, ChangeCallback, Interpolator, Lifecycle};

/// `|change / total|`, or 0 when there is nothing to cover
fn progress_ratio(change: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        (change / total).abs()
    }
}

/// Interpolates one number
#[derive(Clone, Debug)]
pub struct ScalarInterpolator {
    start: f64,
    by: f64,
    duration: f64,
    easing: Easing,
}

impl ScalarInterpolator {
    pub fn new(start: f64, end: f64, duration: f64, easing: Easing) -> Self {
        Self {
            start,
            by: end - start,
            duration,
            easing,
        }
    }

    /// Build from a start value and a total change
    pub fn with_change(start: f64, by: f64, duration: f64, easing: Easing) -> Self {
        Self {
            start,
            by,
            duration,
            easing,
        }
    }
}

impl Interpolator for ScalarInterpolator {
    type Value = f64;

    fn calculate(&self, elapsed: f64) -> Calculated<f64> {
        let value = self
            .easing
            .ease(elapsed, self.start, self.by, self.duration, 0);
        Calculated {
            value,
            progress: progress_ratio(value - self.start, self.by),
        }
    }

    fn snapshot(&self, value: &f64) -> TweenValue {
        TweenValue::Number(*value)
    }

    fn start_value(&self) -> TweenValue {
        TweenValue::Number(self.start)
    }

    fn by_value(&self) -> TweenValue {
        TweenValue::Number(self.by)
    }
}

/// Interpolates a number array element-wise
///
/// The easing receives each element's index as its channel. Progress follows
/// element 0.
#[derive(Clone, Debug)]
pub struct VectorInterpolator {
    start: Vec<f64>,
    by: Vec<f64>,
    duration: f64,
    easing: Easing,
}

impl VectorInterpolator {
    /// Elements missing from `end` keep their start value
    pub fn new(start: Vec<f64>, end: &[f64], duration: f64, easing: Easing) -> Self {
        let by = start
            .iter()
            .enumerate()
            .map(|(i, s)| end.get(i).map_or(0.0, |e| e - s))
            .collect();
        Self {
            start,
            by,
            duration,
            easing,
        }
    }

    /// Build from a start array and per-element changes
    pub fn with_change(start: Vec<f64>, by: &[f64], duration: f64, easing: Easing) -> Self {
        let by = (0..start.len())
            .map(|i| by.get(i).copied().unwrap_or(0.0))
            .collect();
        Self {
            start,
            by,
            duration,
            easing,
        }
    }
}

impl Interpolator for VectorInterpolator {
    type Value = Vec<f64>;

    fn calculate(&self, elapsed: f64) -> Calculated<Vec<f64>> {
        let value: Vec<f64> = self
            .start
            .iter()
            .zip(&self.by)
            .enumerate()
            .map(|(i, (s, c))| self.easing.ease(elapsed, *s, *c, self.duration, i))
            .collect();
        let progress = match (value.first(), self.start.first(), self.by.first()) {
            (Some(v), Some(s), Some(c)) => progress_ratio(v - s, *c),
            _ => 0.0,
        };
        Calculated { value, progress }
    }

    fn snapshot(&self, value: &Vec<f64>) -> TweenValue {
        TweenValue::Vector(value.clone())
    }

    fn start_value(&self) -> TweenValue {
        TweenValue::Vector(self.start.clone())
    }

    fn by_value(&self) -> TweenValue {
        TweenValue::Vector(self.by.clone())
    }
}

/// Interpolates a color through its RGBA channels
///
/// r/g/b are rounded to whole steps and alpha is clamped to `0..=1` on every
/// tick. Progress follows the first channel that changes.
#[derive(Clone, Debug)]
pub struct ColorInterpolator {
    start: Channels,
    by: Channels,
    duration: f64,
    easing: Easing,
}

impl ColorInterpolator {
    pub fn new(
        start: &str,
        end: &str,
        duration: f64,
        easing: Easing,
    ) -> Result<Self, ColorParseError> {
        let start = parse_channels(start)?;
        let end = parse_channels(end)?;
        Ok(Self {
            start,
            by: std::array::from_fn(|i| end[i] - start[i]),
            duration,
            easing,
        })
    }
}

impl Interpolator for ColorInterpolator {
    type Value = Channels;

    fn calculate(&self, elapsed: f64) -> Calculated<Channels> {
        let mut value: Channels = std::array::from_fn(|i| {
            self.easing
                .ease(elapsed, self.start[i], self.by[i], self.duration, i)
        });
        for channel in &mut value[..3] {
            *channel = channel.round();
        }
        value[3] = value[3].clamp(0.0, 1.0);

        let progress = (0..4)
            .find(|&i| self.by[i] != 0.0)
            .map_or(0.0, |i| progress_ratio(value[i] - self.start[i], self.by[i]));
        Calculated { value, progress }
    }

    fn snapshot(&self, value: &Channels) -> TweenValue {
        TweenValue::Color(format_channels(*value))
    }

    fn start_value(&self) -> TweenValue {
        TweenValue::Color(format_channels(self.start))
    }

    fn by_value(&self) -> TweenValue {
        TweenValue::Vector(self.by.to_vec())
    }
}

fn string_change(mut callback: ChangeCallback<String>) -> ChangeCallback<Channels> {
    Box::new(move |channels: &Channels, progress, duration_progress| {
        callback(&format_channels(*channels), progress, duration_progress)
    })
}

fn string_abort(mut predicate: AbortPredicate<String>) -> AbortPredicate<Channels> {
    Box::new(move |channels: &Channels, progress, duration_progress| {
        predicate(&format_channels(*channels), progress, duration_progress)
    })
}

/// Adapt color callbacks written against `rgba(...)` strings to the channel
/// values the engine produces
pub fn wrap_color_lifecycle(lifecycle: Lifecycle<String>) -> Lifecycle<Channels> {
    Lifecycle {
        on_start: lifecycle.on_start,
        on_change: lifecycle.on_change.map(string_change),
        on_complete: lifecycle.on_complete.map(string_change),
        abort: lifecycle.abort.map(string_abort),
    }
}

/// Numeric value kinds that [`Animator::animate`](crate::Animator::animate)
/// accepts
pub trait Tweenable: Clone + Sized + 'static {
    type Interpolator: Interpolator<Value = Self>;

    /// Build the interpolator from whichever endpoints were given.
    ///
    /// `by` is used when `end` is absent.
    fn interpolator(
        start: Option<Self>,
        end: Option<Self>,
        by: Option<Self>,
        duration: f64,
        easing: Easing,
    ) -> Self::Interpolator;
}

impl Tweenable for f64 {
    type Interpolator = ScalarInterpolator;

    /// Missing endpoints default to a start of 0 and an end of 100
    fn interpolator(
        start: Option<f64>,
        end: Option<f64>,
        by: Option<f64>,
        duration: f64,
        easing: Easing,
    ) -> ScalarInterpolator {
        let start = start.unwrap_or(0.0);
        match (end, by) {
            (Some(end), _) => ScalarInterpolator::new(start, end, duration, easing),
            (None, Some(by)) => ScalarInterpolator::with_change(start, by, duration, easing),
            (None, None) => ScalarInterpolator::new(start, 100.0, duration, easing),
        }
    }
}

impl Tweenable for Vec<f64> {
    type Interpolator = VectorInterpolator;

    /// A missing start is all zeros, sized like the end (or the change). A
    /// missing end leaves every element at its start value.
    fn interpolator(
        start: Option<Vec<f64>>,
        end: Option<Vec<f64>>,
        by: Option<Vec<f64>>,
        duration: f64,
        easing: Easing,
    ) -> VectorInterpolator {
        let len = end
            .as_ref()
            .or(by.as_ref())
            .map_or(0, |values| values.len());
        let start = start.unwrap_or_else(|| vec![0.0; len]);
        match (end, by) {
            (Some(end), _) => VectorInterpolator::new(start, &end, duration, easing),
            (None, Some(by)) => VectorInterpolator::with_change(start, &by, duration, easing),
            (None, None) => VectorInterpolator::with_change(start, &[], duration, easing),
        }
    }
}
