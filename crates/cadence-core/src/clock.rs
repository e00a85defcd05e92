//! Clock contracts
//!
//! Every clock in Cadence speaks in signed `f64` milliseconds. Rate is a
//! signed multiplier: positive runs forward, negative runs backward.

/// Read-only time capability.
pub trait Clock {
    /// Current time in milliseconds.
    fn current_time(&self) -> f64;

    /// Playback rate (1.0 = real-time, negative = backward).
    fn rate(&self) -> f64;

    /// Whether time is currently advancing.
    fn is_running(&self) -> bool;

    /// Read all three values at once.
    ///
    /// Clocks whose reads have side effects should override this so a single
    /// observation backs the whole snapshot.
    fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            current_time: self.current_time(),
            rate: self.rate(),
            is_running: self.is_running(),
        }
    }

    /// Mutable control over this clock, if it accepts any.
    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        None
    }

    /// Frame processing for clocks that only advance on frame boundaries.
    fn as_frame_based(&mut self) -> Option<&mut dyn FrameBasedClock> {
        None
    }
}

/// A clock that can be controlled.
pub trait AdjustableClock: Clock {
    /// Start advancing time.
    fn start(&mut self);

    /// Stop advancing time, holding the current position.
    fn stop(&mut self);

    /// Stop and return to zero.
    fn reset(&mut self);

    /// Move to `position`. Returns false when the position cannot be represented.
    fn seek(&mut self, position: f64) -> bool;

    /// Change the playback rate.
    fn set_rate(&mut self, rate: f64);

    /// Return the rate to real-time.
    fn reset_speed_adjustments(&mut self);
}

/// A clock whose reads only change when a frame is processed.
pub trait FrameBasedClock: Clock {
    /// Advance to a new frame, sampling the underlying source once.
    fn process_frame(&mut self);

    /// Time elapsed between the previous frame and this one.
    fn elapsed_frame_time(&self) -> f64;

    /// Current time and elapsed frame time together.
    fn frame_time_info(&self) -> crate::FrameTimeInfo {
        crate::FrameTimeInfo {
            elapsed: self.elapsed_frame_time(),
            current: self.current_time(),
        }
    }
}

/// A single observation of a clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockSnapshot {
    pub current_time: f64,
    pub rate: f64,
    pub is_running: bool,
}

impl Default for ClockSnapshot {
    fn default() -> Self {
        ClockSnapshot {
            current_time: 0.0,
            rate: 1.0,
            is_running: false,
        }
    }
}

/// Whether moving from `from` to `to` runs against the direction of `rate`.
#[inline]
pub fn is_against_rate(rate: f64, from: f64, to: f64) -> bool {
    if rate >= 0.0 {
        to < from
    } else {
        to > from
    }
}

/// Of `a` and `b`, the one furthest along the direction of `rate`.
#[inline]
pub fn furthest_along(rate: f64, a: f64, b: f64) -> f64 {
    if rate >= 0.0 {
        a.max(b)
    } else {
        a.min(b)
    }
}
