//! Interpolation of coarse or jittery sources
//!
//! Between source updates, time is predicted from real elapsed time x rate.
//! The prediction is nudged toward the source every frame and abandoned when
//! it strays further than the allowable error, at which point the clock
//! tracks the source exactly until prediction becomes viable again.
//!
//! INVARIANT: while interpolating, |time - source| <= allowable error
//! (scaled by |rate| above real-time).
//! INVARIANT: without an explicit seek on the source, time never moves
//! against the rate's direction.

use cadence_core::{
    furthest_along, is_against_rate, AdjustableClock, Clock, ClockHandle, ClockResult,
    ClockSnapshot, FrameBasedClock, TimeReference,
};
use tracing::{debug, warn};

use crate::{validate_allowable_error, InterpolationConfig, StopwatchClock};

/// Smooths a source into continuously advancing time.
pub struct InterpolatingFramedClock {
    source: ClockHandle,
    config: InterpolationConfig,
    process_source: bool,
    /// Real-time tracker, always running at 1x
    realtime: StopwatchClock,
    last_realtime: f64,
    /// Source sample at the previous frame; None until first observed
    last_source: Option<ClockSnapshot>,
    current_time: f64,
    rate: f64,
    is_running: bool,
    is_interpolating: bool,
    elapsed_frame_time: f64,
}

impl InterpolatingFramedClock {
    pub fn new(source: ClockHandle) -> Self {
        Self::build(source, InterpolationConfig::default(), TimeReference::system())
    }

    pub fn with_config(
        source: ClockHandle,
        config: InterpolationConfig,
        reference: TimeReference,
    ) -> ClockResult<Self> {
        config.validate()?;
        Ok(Self::build(source, config, reference))
    }

    fn build(source: ClockHandle, config: InterpolationConfig, reference: TimeReference) -> Self {
        let realtime = StopwatchClock::started(reference);
        let mut clock = InterpolatingFramedClock {
            source,
            config,
            process_source: true,
            last_realtime: realtime.current_time(),
            realtime,
            last_source: None,
            current_time: 0.0,
            rate: 1.0,
            is_running: false,
            is_interpolating: false,
            elapsed_frame_time: 0.0,
        };
        clock.rebaseline();
        clock
    }

    /// Whether the source's own frame is processed first (default true).
    pub fn set_process_source(&mut self, process_source: bool) {
        self.process_source = process_source;
    }

    pub fn allowable_error_ms(&self) -> f64 {
        self.config.allowable_error_ms
    }

    pub fn set_allowable_error_ms(&mut self, allowable_error_ms: f64) -> ClockResult<()> {
        validate_allowable_error(allowable_error_ms)?;
        self.config.allowable_error_ms = allowable_error_ms;
        Ok(())
    }

    /// Whether the current time is a prediction rather than the source's value.
    pub fn is_interpolating(&self) -> bool {
        self.is_interpolating
    }

    pub fn source(&self) -> &ClockHandle {
        &self.source
    }

    /// Replace the source. Prior state is discarded; nothing is pushed into
    /// the new source.
    pub fn change_source(&mut self, source: ClockHandle) {
        self.source = source;
        self.rebaseline();
    }

    /// Snap to the source and forget the previous sample.
    fn rebaseline(&mut self) {
        self.snap(self.source.snapshot());
        self.last_source = None;
    }

    fn snap(&mut self, snapshot: ClockSnapshot) {
        self.current_time = snapshot.current_time;
        self.rate = snapshot.rate;
        self.is_running = snapshot.is_running;
        self.is_interpolating = false;
        self.last_source = Some(snapshot);
        self.last_realtime = self.realtime.current_time();
    }

    /// Apply an explicit mutation to the source, then track it exactly.
    fn forward<R>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut dyn AdjustableClock) -> R,
    ) -> Option<R> {
        match self.source.adjust(operation, f) {
            Ok(result) => {
                self.snap(self.source.snapshot());
                Some(result)
            }
            Err(err) => {
                warn!(%err, "forwarded mutation not supported");
                None
            }
        }
    }

    /// Predict the next time from `previous`, or fall back to the source.
    fn interpolate(
        &mut self,
        previous: f64,
        last: ClockSnapshot,
        source: ClockSnapshot,
        real_elapsed: f64,
    ) -> f64 {
        let rate = source.rate;
        let allowance = self.config.allowable_error_ms * rate.abs().max(1.0);

        let mut candidate = previous + real_elapsed * rate;
        candidate += (source.current_time - candidate) * self.config.drift_correction;
        let candidate = furthest_along(rate, previous, candidate);

        if (candidate - source.current_time).abs() <= allowance {
            self.is_interpolating = true;
            return candidate;
        }

        if self.is_interpolating {
            debug!(
                predicted = candidate,
                source = source.current_time,
                allowance,
                "interpolation lost, tracking source"
            );
        }
        self.is_interpolating = false;

        // The source moving against the rate is an explicit seek: follow it.
        if is_against_rate(rate, last.current_time, source.current_time) {
            source.current_time
        } else {
            furthest_along(rate, previous, source.current_time)
        }
    }
}

impl Default for InterpolatingFramedClock {
    fn default() -> Self {
        Self::new(ClockHandle::new(StopwatchClock::new()))
    }
}

impl Clock for InterpolatingFramedClock {
    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn is_running(&self) -> bool {
        self.is_running
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        Some(self)
    }

    fn as_frame_based(&mut self) -> Option<&mut dyn FrameBasedClock> {
        Some(self)
    }
}

impl FrameBasedClock for InterpolatingFramedClock {
    fn process_frame(&mut self) {
        if self.process_source {
            self.source.process_frame();
        }

        let source = self.source.snapshot();
        let now = self.realtime.current_time();
        let real_elapsed = now - self.last_realtime;
        self.last_realtime = now;

        let previous = self.current_time;

        let next = match self.last_source {
            Some(last) if source.is_running => {
                self.interpolate(previous, last, source, real_elapsed)
            }
            _ => {
                self.is_interpolating = false;
                source.current_time
            }
        };

        self.current_time = next;
        self.rate = source.rate;
        self.is_running = source.is_running;
        self.last_source = Some(source);
        self.elapsed_frame_time = next - previous;
    }

    fn elapsed_frame_time(&self) -> f64 {
        self.elapsed_frame_time
    }
}

impl AdjustableClock for InterpolatingFramedClock {
    fn start(&mut self) {
        self.forward("start", |c| c.start());
    }

    fn stop(&mut self) {
        self.forward("stop", |c| c.stop());
    }

    fn reset(&mut self) {
        self.forward("reset", |c| c.reset());
    }

    fn seek(&mut self, position: f64) -> bool {
        self.forward("seek", |c| c.seek(position)).unwrap_or(false)
    }

    fn set_rate(&mut self, rate: f64) {
        self.forward("set rate", |c| c.set_rate(rate));
    }

    fn reset_speed_adjustments(&mut self) {
        self.forward("reset speed adjustments", |c| c.reset_speed_adjustments());
    }
}
