//! Composed clock stack
//!
//! consumer -> interpolation -> decoupling -> source

use std::sync::Arc;

use cadence_core::{
    AdjustableClock, Clock, ClockHandle, ClockResult, FrameBasedClock, TimeReference,
};
use parking_lot::Mutex;

use crate::{
    CouplingState, DecouplingClock, DecouplingConfig, InterpolatingFramedClock,
    InterpolationConfig, StopwatchClock,
};

/// Smoothed, decoupleable clock over a single source.
///
/// The interpolation layer reads from a reactive [`DecouplingClock`] once per
/// frame, so free-running and handoff happen at frame cadence too.
pub struct CompositeClock {
    decoupling: Arc<Mutex<DecouplingClock>>,
    interpolating: InterpolatingFramedClock,
}

impl CompositeClock {
    pub fn new(source: ClockHandle) -> Self {
        let decoupling = Arc::new(Mutex::new(DecouplingClock::new(source)));
        let interpolating = InterpolatingFramedClock::new(ClockHandle::shared(&decoupling));
        CompositeClock {
            decoupling,
            interpolating,
        }
    }

    pub fn with_config(
        source: ClockHandle,
        decoupling: DecouplingConfig,
        interpolation: InterpolationConfig,
        reference: TimeReference,
    ) -> ClockResult<Self> {
        let decoupling = Arc::new(Mutex::new(DecouplingClock::with_config(
            source,
            decoupling,
            reference.clone(),
        )));
        let interpolating = InterpolatingFramedClock::with_config(
            ClockHandle::shared(&decoupling),
            interpolation,
            reference,
        )?;
        Ok(CompositeClock {
            decoupling,
            interpolating,
        })
    }

    pub fn allow_decoupling(&self) -> bool {
        self.decoupling.lock().allow_decoupling()
    }

    pub fn set_allow_decoupling(&mut self, allow: bool) {
        self.decoupling.lock().set_allow_decoupling(allow);
    }

    pub fn coupling_state(&self) -> CouplingState {
        self.decoupling.lock().state()
    }

    pub fn allowable_error_ms(&self) -> f64 {
        self.interpolating.allowable_error_ms()
    }

    pub fn set_allowable_error_ms(&mut self, allowable_error_ms: f64) -> ClockResult<()> {
        self.interpolating.set_allowable_error_ms(allowable_error_ms)
    }

    pub fn is_interpolating(&self) -> bool {
        self.interpolating.is_interpolating()
    }

    /// The raw source at the bottom of the stack.
    pub fn source(&self) -> ClockHandle {
        self.decoupling.lock().source().clone()
    }

    /// Replace the raw source. Both layers re-baseline from it.
    pub fn change_source(&mut self, source: ClockHandle) {
        self.decoupling.lock().change_source(source);
        self.interpolating
            .change_source(ClockHandle::shared(&self.decoupling));
    }
}

impl Default for CompositeClock {
    fn default() -> Self {
        Self::new(ClockHandle::new(StopwatchClock::new()))
    }
}

impl Clock for CompositeClock {
    fn current_time(&self) -> f64 {
        self.interpolating.current_time()
    }

    fn rate(&self) -> f64 {
        self.interpolating.rate()
    }

    fn is_running(&self) -> bool {
        self.interpolating.is_running()
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        Some(self)
    }

    fn as_frame_based(&mut self) -> Option<&mut dyn FrameBasedClock> {
        Some(self)
    }
}

impl AdjustableClock for CompositeClock {
    fn start(&mut self) {
        self.interpolating.start();
    }

    fn stop(&mut self) {
        self.interpolating.stop();
    }

    fn reset(&mut self) {
        self.interpolating.reset();
    }

    fn seek(&mut self, position: f64) -> bool {
        self.interpolating.seek(position)
    }

    fn set_rate(&mut self, rate: f64) {
        self.interpolating.set_rate(rate);
    }

    fn reset_speed_adjustments(&mut self) {
        self.interpolating.reset_speed_adjustments();
    }
}

impl FrameBasedClock for CompositeClock {
    fn process_frame(&mut self) {
        self.interpolating.process_frame();
    }

    fn elapsed_frame_time(&self) -> f64 {
        self.interpolating.elapsed_frame_time()
    }
}
