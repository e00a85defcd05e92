//! Local elapsed-time tracker

use cadence_core::{AdjustableClock, Clock, TimeReference};

/// Real-time backed stopwatch clock.
///
/// Advances by real elapsed time x rate while running. Self-contained: seek
/// always succeeds for finite positions.
#[derive(Clone, Debug)]
pub struct StopwatchClock {
    /// Real-time base
    reference: TimeReference,
    /// Time accumulated before the current run segment
    offset: f64,
    /// Reference time at which the current run segment began
    running_since: Option<f64>,
    /// Clock rate multiplier (1.0 = real-time)
    rate: f64,
}

impl StopwatchClock {
    /// Create a stopped stopwatch at zero on the system reference
    pub fn new() -> Self {
        Self::with_reference(TimeReference::system())
    }

    /// Create a stopped stopwatch at zero on the given reference
    pub fn with_reference(reference: TimeReference) -> Self {
        StopwatchClock {
            reference,
            offset: 0.0,
            running_since: None,
            rate: 1.0,
        }
    }

    /// Create a stopwatch that is already running
    pub fn started(reference: TimeReference) -> Self {
        let mut clock = Self::with_reference(reference);
        clock.start();
        clock
    }

    /// Real time elapsed in the current run segment, before rate scaling
    fn segment_elapsed(&self) -> f64 {
        match self.running_since {
            Some(since) => self.reference.now_ms() - since,
            None => 0.0,
        }
    }

    /// Fold the current segment into the offset and open a new one
    fn rebase(&mut self) {
        if self.running_since.is_some() {
            self.offset = self.current_time();
            self.running_since = Some(self.reference.now_ms());
        }
    }
}

impl Default for StopwatchClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StopwatchClock {
    fn current_time(&self) -> f64 {
        self.offset + self.segment_elapsed() * self.rate
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        Some(self)
    }
}

impl AdjustableClock for StopwatchClock {
    fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(self.reference.now_ms());
        }
    }

    fn stop(&mut self) {
        if self.running_since.is_some() {
            self.offset = self.current_time();
            self.running_since = None;
        }
    }

    fn reset(&mut self) {
        self.running_since = None;
        self.offset = 0.0;
    }

    fn seek(&mut self, position: f64) -> bool {
        if !position.is_finite() {
            return false;
        }
        self.offset = position;
        if self.running_since.is_some() {
            self.running_since = Some(self.reference.now_ms());
        }
        true
    }

    fn set_rate(&mut self, rate: f64) {
        if rate == self.rate || !rate.is_finite() {
            return;
        }
        self.rebase();
        self.rate = rate;
    }

    fn reset_speed_adjustments(&mut self) {
        self.set_rate(1.0);
    }
}
