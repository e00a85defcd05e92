//! Scripted source clocks
//!
//! These clocks never advance on their own. Tests move them by hand, the same
//! way an embedding application would drive a device position.

use std::sync::Arc;

use cadence_core::{AdjustableClock, Clock, ClockHandle};
use parking_lot::Mutex;

/// Adjustable clock whose every field is set by the test. Seeks always succeed.
#[derive(Clone, Debug, PartialEq)]
pub struct TestClock {
    pub time: f64,
    pub rate: f64,
    pub running: bool,
}

impl TestClock {
    pub fn new() -> Self {
        TestClock {
            time: 0.0,
            rate: 1.0,
            running: false,
        }
    }

    pub fn at(time: f64) -> Self {
        TestClock {
            time,
            ..Self::new()
        }
    }

    pub fn running_at(time: f64) -> Self {
        TestClock {
            time,
            running: true,
            ..Self::new()
        }
    }

    /// Typed access for the test plus a handle for the wrapper under test.
    pub fn shared(self) -> (Arc<Mutex<Self>>, ClockHandle) {
        share(self)
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        Some(self)
    }
}

impl AdjustableClock for TestClock {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn reset(&mut self) {
        self.running = false;
        self.time = 0.0;
    }

    fn seek(&mut self, position: f64) -> bool {
        self.time = position;
        true
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn reset_speed_adjustments(&mut self) {
        self.rate = 1.0;
    }
}

/// Scripted clock that only represents positions within `[min, max]`.
///
/// Seeks outside the range are rejected and leave the clock untouched. It
/// refuses to start outside the range.
#[derive(Clone, Debug, PartialEq)]
pub struct RangedTestClock {
    pub time: f64,
    pub rate: f64,
    pub running: bool,
    pub min: f64,
    pub max: f64,
}

impl RangedTestClock {
    /// Clock over `[0, inf)`.
    pub fn new() -> Self {
        Self::with_range(0.0, f64::INFINITY)
    }

    pub fn with_range(min: f64, max: f64) -> Self {
        RangedTestClock {
            time: min.max(0.0).min(max),
            rate: 1.0,
            running: false,
            min,
            max,
        }
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.min && position <= self.max
    }

    pub fn shared(self) -> (Arc<Mutex<Self>>, ClockHandle) {
        share(self)
    }
}

impl Default for RangedTestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RangedTestClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        Some(self)
    }
}

impl AdjustableClock for RangedTestClock {
    fn start(&mut self) {
        if self.contains(self.time) {
            self.running = true;
        }
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn reset(&mut self) {
        self.running = false;
        self.time = self.min.max(0.0).min(self.max);
    }

    fn seek(&mut self, position: f64) -> bool {
        if !self.contains(position) {
            return false;
        }
        self.time = position;
        true
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn reset_speed_adjustments(&mut self) {
        self.rate = 1.0;
    }
}

/// Clock that exposes no control at all.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadOnlyTestClock {
    pub time: f64,
    pub rate: f64,
    pub running: bool,
}

impl ReadOnlyTestClock {
    pub fn at(time: f64) -> Self {
        ReadOnlyTestClock {
            time,
            rate: 1.0,
            running: false,
        }
    }

    pub fn shared(self) -> (Arc<Mutex<Self>>, ClockHandle) {
        share(self)
    }
}

impl Clock for ReadOnlyTestClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

fn share<C: Clock + Send + 'static>(clock: C) -> (Arc<Mutex<C>>, ClockHandle) {
    let shared = Arc::new(Mutex::new(clock));
    let handle = ClockHandle::shared(&shared);
    (shared, handle)
}
