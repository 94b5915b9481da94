//! Frame scheduling
//!
//! Animations never drive time themselves. They ask a [`FrameScheduler`] to
//! call them back on the next frame and a [`Timer`] to wait out their delay.
//! [`FrameLoop`] implements both on the current thread.
//!
//! A `FrameLoop` can be driven deterministically with [`FrameLoop::advance`]
//! and [`FrameLoop::run_frame`], or against the wall clock with
//! [`FrameLoop::tick`] and [`FrameLoop::run_blocking`]. Pick one per loop;
//! the clock never runs backwards, so mixing them only skips time.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use tracing::{error, trace};

use crate::config::TweenConfig;

new_key_type! {
    pub struct TickId;
    pub struct TimerId;
}

/// Callback for the next frame, given the frame timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Callback for an expired timer
pub type TimerCallback = Box<dyn FnOnce()>;

/// Runs callbacks once before the next frame
pub trait FrameScheduler {
    fn request_tick(&self, callback: FrameCallback) -> TickId;

    /// Drop a pending callback. Unknown or already-run ids are ignored.
    fn cancel_tick(&self, id: TickId);
}

/// One-shot timers
pub trait Timer {
    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerId;

    /// Drop a pending timer. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

struct PendingTimer {
    due: f64,
    seq: u64,
    callback: TimerCallback,
}

struct FrameLoopInner {
    frames: SlotMap<TickId, FrameCallback>,
    /// Request order of `frames`
    queue: Vec<TickId>,
    timers: SlotMap<TimerId, PendingTimer>,
    next_seq: u64,
    now: f64,
    frame_count: u64,
    origin: Instant,
    target_fps: u32,
}

/// Single-threaded frame loop and timer queue
///
/// Clones share the same queues.
#[derive(Clone)]
pub struct FrameLoop {
    inner: Rc<RefCell<FrameLoopInner>>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::with_target_fps(120)
    }

    pub fn with_target_fps(target_fps: u32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FrameLoopInner {
                frames: SlotMap::with_key(),
                queue: Vec::new(),
                timers: SlotMap::with_key(),
                next_seq: 0,
                now: 0.0,
                frame_count: 0,
                origin: Instant::now(),
                target_fps: target_fps.max(1),
            })),
        }
    }

    /// Loop paced by the configured `target_fps`
    pub fn from_config(config: &TweenConfig) -> Self {
        Self::with_target_fps(config.target_fps)
    }

    /// Timestamp of the most recent frame in milliseconds
    pub fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    /// Number of frames run so far
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frame_count
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Check if any callbacks are still waiting
    pub fn has_pending(&self) -> bool {
        let inner = self.inner.borrow();
        !inner.frames.is_empty() || !inner.timers.is_empty()
    }

    /// Run one frame at `now_ms`.
    ///
    /// Timers due by `now_ms` fire first, in due order. Then every frame
    /// callback requested before this call runs, in request order. Callbacks
    /// requested while the frame runs wait for the next one.
    pub fn run_frame(&self, now_ms: f64) {
        let (now, due) = {
            let mut inner = self.inner.borrow_mut();
            inner.now = now_ms.max(inner.now);
            inner.frame_count += 1;
            let now = inner.now;

            let mut due: SmallVec<[(f64, u64, TimerId); 4]> = inner
                .timers
                .iter()
                .filter(|(_, timer)| timer.due <= now)
                .map(|(id, timer)| (timer.due, timer.seq, id))
                .collect();
            due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            (now, due)
        };

        trace!(now, timers = due.len(), "running frame");

        for (_, _, id) in due {
            // An earlier callback may have cleared this timer
            let timer = self.inner.borrow_mut().timers.remove(id);
            if let Some(timer) = timer {
                run_guarded("timer", timer.callback);
            }
        }

        let queue = std::mem::take(&mut self.inner.borrow_mut().queue);
        for id in queue {
            let callback = self.inner.borrow_mut().frames.remove(id);
            if let Some(callback) = callback {
                run_guarded("frame", move || callback(now));
            }
        }
    }

    /// Run one frame `dt_ms` after the previous one
    pub fn advance(&self, dt_ms: f64) {
        let now = self.now() + dt_ms;
        self.run_frame(now);
    }

    /// Advance in `frame_ms` steps until nothing is pending or `max_frames`
    /// frames have run. Returns the number of frames run.
    pub fn run_until_idle(&self, frame_ms: f64, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.has_pending() {
            self.advance(frame_ms);
            frames += 1;
        }
        frames
    }

    /// Run one frame stamped with the wall-clock time since the loop was
    /// created
    pub fn tick(&self) {
        let now = self.inner.borrow().origin.elapsed().as_secs_f64() * 1000.0;
        self.run_frame(now);
    }

    /// Target frame interval
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.inner.borrow().target_fps as f64)
    }

    /// Tick against the wall clock, paced to the target frame rate, until
    /// nothing is pending
    pub fn run_blocking(&self) {
        let interval = self.frame_interval();
        while self.has_pending() {
            let started = Instant::now();
            self.tick();
            if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for FrameLoop {
    fn request_tick(&self, callback: FrameCallback) -> TickId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.frames.insert(callback);
        inner.queue.push(id);
        id
    }

    fn cancel_tick(&self, id: TickId) {
        let mut inner = self.inner.borrow_mut();
        if inner.frames.remove(id).is_some() {
            inner.queue.retain(|queued| *queued != id);
        }
    }
}

impl Timer for FrameLoop {
    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let due = inner.now + delay_ms.max(0.0);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.timers.insert(PendingTimer { due, seq, callback })
    }

    fn clear_timeout(&self, id: TimerId) {
        self.inner.borrow_mut().timers.remove(id);
    }
}

/// Run a scheduled callback so that a panic does not take the loop down
fn run_guarded(kind: &'static str, callback: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        error!(
            kind,
            message = %panic_message(payload.as_ref()),
            "scheduled callback panicked"
        );
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn FnOnce(f64)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let make = move |name: &str| -> Box<dyn FnOnce(f64)> {
            let sink = sink.clone();
            let name = name.to_string();
            Box::new(move |now| sink.borrow_mut().push(format!("{name}@{now}")))
        };
        (log, make)
    }

    #[test]
    fn test_frames_run_in_request_order() {
        let frames = FrameLoop::new();
        let (log, make) = recorder();
        frames.request_tick(make("a"));
        frames.request_tick(make("b"));
        frames.advance(16.0);
        assert_eq!(*log.borrow(), vec!["a@16", "b@16"]);
        assert!(!frames.has_pending());
    }

    #[test]
    fn test_requests_during_frame_wait_for_next() {
        let frames = FrameLoop::new();
        let count = Rc::new(Cell::new(0));
        let (inner_count, inner_frames) = (count.clone(), frames.clone());
        frames.request_tick(Box::new(move |_| {
            inner_count.set(inner_count.get() + 1);
            let again = inner_count.clone();
            inner_frames.request_tick(Box::new(move |_| again.set(again.get() + 1)));
        }));

        frames.advance(16.0);
        assert_eq!(count.get(), 1);
        frames.advance(16.0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_cancel_tick() {
        let frames = FrameLoop::new();
        let (log, make) = recorder();
        let id = frames.request_tick(make("a"));
        frames.request_tick(make("b"));
        frames.cancel_tick(id);
        frames.cancel_tick(id);
        frames.advance(10.0);
        assert_eq!(*log.borrow(), vec!["b@10"]);
    }

    #[test]
    fn test_cancelled_ticks_leave_the_queue() {
        let frames = FrameLoop::new();
        for _ in 0..100 {
            let id = frames.request_tick(Box::new(|_: f64| {}));
            frames.cancel_tick(id);
        }
        let kept = frames.request_tick(Box::new(|_: f64| {}));
        assert_eq!(frames.inner.borrow().queue, vec![kept]);
        assert!(frames.has_pending());
    }

    #[test]
    fn test_timers_fire_in_due_order_before_frames() {
        let frames = FrameLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, delay) in [("late", 30.0), ("early", 10.0), ("tie", 10.0)] {
            let log = log.clone();
            frames.set_timeout(delay, Box::new(move || log.borrow_mut().push(name)));
        }
        let frame_log = log.clone();
        frames.request_tick(Box::new(move |_| frame_log.borrow_mut().push("frame")));

        frames.advance(16.0);
        assert_eq!(*log.borrow(), vec!["early", "tie", "frame"]);
        frames.advance(16.0);
        assert_eq!(*log.borrow(), vec!["early", "tie", "frame", "late"]);
    }

    #[test]
    fn test_clear_timeout() {
        let frames = FrameLoop::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let id = frames.set_timeout(5.0, Box::new(move || flag.set(true)));
        frames.clear_timeout(id);
        frames.advance(10.0);
        assert!(!fired.get());
        assert_eq!(frames.pending_timers(), 0);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let frames = FrameLoop::new();
        frames.run_frame(50.0);
        frames.run_frame(20.0);
        assert_eq!(frames.now(), 50.0);
        assert_eq!(frames.frame_count(), 2);
    }

    #[test]
    fn test_panicking_callback_does_not_stop_frame() {
        let frames = FrameLoop::new();
        let (log, make) = recorder();
        frames.request_tick(Box::new(|_| panic!("boom")));
        frames.request_tick(make("after"));
        frames.advance(16.0);
        assert_eq!(*log.borrow(), vec!["after@16"]);
    }

    #[test]
    fn test_run_until_idle_respects_limit() {
        let frames = FrameLoop::new();
        let (tick_frames, count) = (frames.clone(), Rc::new(Cell::new(0)));
        fn reschedule(frames: FrameLoop, count: Rc<Cell<u32>>) {
            let next = frames.clone();
            frames.request_tick(Box::new(move |_| {
                count.set(count.get() + 1);
                reschedule(next, count);
            }));
        }
        reschedule(tick_frames, count.clone());
        assert_eq!(frames.run_until_idle(16.0, 5), 5);
        assert_eq!(count.get(), 5);
        assert_eq!(frames.now(), 80.0);
    }

    #[test]
    fn test_frame_interval() {
        let frames = FrameLoop::with_target_fps(4);
        assert_eq!(frames.frame_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_target_fps_from_config() {
        let config = TweenConfig::from_toml_str("target_fps = 4").unwrap();
        let frames = FrameLoop::from_config(&config);
        assert_eq!(frames.frame_interval(), Duration::from_millis(250));

        let frames = FrameLoop::from_config(&TweenConfig::default());
        assert_eq!(frames.frame_interval(), FrameLoop::new().frame_interval());
    }
}
