//! Simulated playback track
//!
//! A real-time backed source over `[0, length]`, like an audio track: it
//! cannot seek outside its data, and it stops by itself at either end.

use cadence_core::{AdjustableClock, Clock, TimeReference};
use cadence_time::StopwatchClock;

/// Track of fixed length advancing on a [`TimeReference`].
#[derive(Clone, Debug)]
pub struct SimulatedTrack {
    clock: StopwatchClock,
    length: f64,
}

impl SimulatedTrack {
    pub fn new(reference: TimeReference, length: f64) -> Self {
        SimulatedTrack {
            clock: StopwatchClock::with_reference(reference),
            length: length.max(0.0),
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Unclamped playback position.
    pub fn position(&self) -> f64 {
        self.clock.current_time()
    }

    fn playable(&self, position: f64) -> bool {
        if self.clock.rate() < 0.0 {
            position > 0.0 && position <= self.length
        } else {
            position >= 0.0 && position < self.length
        }
    }

    /// Stop at the end reached since the last mutation, if any.
    fn settle(&mut self) {
        let position = self.position();
        if self.clock.is_running() && !self.playable(position) {
            self.clock.stop();
            self.clock.seek(position.clamp(0.0, self.length));
        }
    }
}

impl Clock for SimulatedTrack {
    fn current_time(&self) -> f64 {
        self.position().clamp(0.0, self.length)
    }

    fn rate(&self) -> f64 {
        self.clock.rate()
    }

    fn is_running(&self) -> bool {
        self.clock.is_running() && self.playable(self.position())
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        Some(self)
    }
}

impl AdjustableClock for SimulatedTrack {
    fn start(&mut self) {
        self.settle();
        if self.playable(self.position()) {
            self.clock.start();
        }
    }

    fn stop(&mut self) {
        self.settle();
        self.clock.stop();
    }

    fn reset(&mut self) {
        self.clock.reset();
    }

    fn seek(&mut self, position: f64) -> bool {
        self.settle();
        if !(0.0..=self.length).contains(&position) {
            return false;
        }
        self.clock.seek(position)
    }

    fn set_rate(&mut self, rate: f64) {
        self.settle();
        self.clock.set_rate(rate);
    }

    fn reset_speed_adjustments(&mut self) {
        self.set_rate(1.0);
    }
}
