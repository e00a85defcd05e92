//! Decoupling clocks
//!
//! [`DecouplingClock`] reacts immediately: every read observes the source.
//! [`FramedDecouplingClock`] observes once per [`FrameBasedClock::process_frame`]
//! so every consumer within a frame sees the same values.

use std::cell::RefCell;

use cadence_core::{
    AdjustableClock, Clock, ClockHandle, ClockSnapshot, FrameBasedClock, TimeReference,
};

use crate::{Coupling, CouplingState, DecouplingConfig, FramedConfig, StopwatchClock};

/// Reactive decoupling clock.
///
/// Source-side changes made by the embedding application are picked up on the
/// next read. Reads have side effects (free-run integration and handoff
/// retries), so state lives behind a `RefCell`.
pub struct DecouplingClock {
    source: ClockHandle,
    coupling: RefCell<Coupling>,
}

impl DecouplingClock {
    /// Couple to `source` with decoupling allowed.
    pub fn new(source: ClockHandle) -> Self {
        Self::with_config(source, DecouplingConfig::default(), TimeReference::system())
    }

    pub fn with_config(
        source: ClockHandle,
        config: DecouplingConfig,
        reference: TimeReference,
    ) -> Self {
        let mut coupling = Coupling::new(&config, reference);
        coupling.rebase(&source);
        DecouplingClock {
            source,
            coupling: RefCell::new(coupling),
        }
    }

    pub fn allow_decoupling(&self) -> bool {
        self.coupling.borrow().allow_decoupling()
    }

    pub fn set_allow_decoupling(&mut self, allow: bool) {
        self.coupling.get_mut().set_allow_decoupling(allow);
    }

    /// Coupling state as of the latest observation.
    pub fn state(&self) -> CouplingState {
        self.observe().1
    }

    pub fn source(&self) -> &ClockHandle {
        &self.source
    }

    /// Replace the source, discarding all state.
    pub fn change_source(&mut self, source: ClockHandle) {
        self.source = source;
        self.coupling.get_mut().rebase(&self.source);
    }

    fn observe(&self) -> (ClockSnapshot, CouplingState) {
        let mut coupling = self.coupling.borrow_mut();
        coupling.observe(&self.source);
        (coupling.snapshot(), coupling.state())
    }

    /// Observe, then run `op` on the coupling.
    fn apply<R>(&mut self, op: impl FnOnce(&mut Coupling, &ClockHandle) -> R) -> R {
        let coupling = self.coupling.get_mut();
        coupling.observe(&self.source);
        op(coupling, &self.source)
    }
}

impl Default for DecouplingClock {
    fn default() -> Self {
        Self::new(ClockHandle::new(StopwatchClock::new()))
    }
}

impl Clock for DecouplingClock {
    fn current_time(&self) -> f64 {
        self.observe().0.current_time
    }

    fn rate(&self) -> f64 {
        self.observe().0.rate
    }

    fn is_running(&self) -> bool {
        self.observe().0.is_running
    }

    fn snapshot(&self) -> ClockSnapshot {
        self.observe().0
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        Some(self)
    }
}

impl AdjustableClock for DecouplingClock {
    fn start(&mut self) {
        self.apply(|c, s| c.start(s));
    }

    fn stop(&mut self) {
        self.apply(|c, s| c.stop(s));
    }

    fn reset(&mut self) {
        self.apply(|c, s| c.reset(s));
    }

    fn seek(&mut self, position: f64) -> bool {
        self.apply(|c, s| c.seek(s, position))
    }

    fn set_rate(&mut self, rate: f64) {
        self.apply(|c, s| c.set_rate(s, rate));
    }

    fn reset_speed_adjustments(&mut self) {
        self.apply(|c, s| c.reset_speed_adjustments(s));
    }
}

/// Per-frame decoupling clock.
///
/// The source is observed only inside `process_frame`. Explicit operations
/// act on the clock's own state immediately and drive the source directly.
pub struct FramedDecouplingClock {
    source: ClockHandle,
    coupling: Coupling,
    process_source: bool,
    elapsed_frame_time: f64,
}

impl FramedDecouplingClock {
    pub fn new(source: ClockHandle) -> Self {
        Self::with_config(
            source,
            DecouplingConfig::default(),
            FramedConfig::default(),
            TimeReference::system(),
        )
    }

    pub fn with_config(
        source: ClockHandle,
        config: DecouplingConfig,
        framed: FramedConfig,
        reference: TimeReference,
    ) -> Self {
        let mut coupling = Coupling::new(&config, reference);
        coupling.rebase(&source);
        FramedDecouplingClock {
            source,
            coupling,
            process_source: framed.process_source,
            elapsed_frame_time: 0.0,
        }
    }

    pub fn allow_decoupling(&self) -> bool {
        self.coupling.allow_decoupling()
    }

    pub fn set_allow_decoupling(&mut self, allow: bool) {
        self.coupling.set_allow_decoupling(allow);
    }

    /// Coupling state as of the last frame or operation.
    pub fn state(&self) -> CouplingState {
        self.coupling.state()
    }

    pub fn source(&self) -> &ClockHandle {
        &self.source
    }

    /// Replace the source, discarding all state.
    pub fn change_source(&mut self, source: ClockHandle) {
        self.source = source;
        self.coupling.rebase(&self.source);
        self.elapsed_frame_time = 0.0;
    }
}

impl Default for FramedDecouplingClock {
    fn default() -> Self {
        Self::new(ClockHandle::new(StopwatchClock::new()))
    }
}

impl Clock for FramedDecouplingClock {
    fn current_time(&self) -> f64 {
        self.coupling.current_time()
    }

    fn rate(&self) -> f64 {
        self.coupling.rate()
    }

    fn is_running(&self) -> bool {
        self.coupling.is_running()
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        Some(self)
    }

    fn as_frame_based(&mut self) -> Option<&mut dyn FrameBasedClock> {
        Some(self)
    }
}

impl AdjustableClock for FramedDecouplingClock {
    fn start(&mut self) {
        self.coupling.start(&self.source);
    }

    fn stop(&mut self) {
        self.coupling.stop(&self.source);
    }

    fn reset(&mut self) {
        self.coupling.reset(&self.source);
    }

    fn seek(&mut self, position: f64) -> bool {
        self.coupling.seek(&self.source, position)
    }

    fn set_rate(&mut self, rate: f64) {
        self.coupling.set_rate(&self.source, rate);
    }

    fn reset_speed_adjustments(&mut self) {
        self.coupling.reset_speed_adjustments(&self.source);
    }
}

impl FrameBasedClock for FramedDecouplingClock {
    fn process_frame(&mut self) {
        if self.process_source {
            self.source.process_frame();
        }

        let previous = self.coupling.current_time();
        self.coupling.observe(&self.source);
        self.elapsed_frame_time = self.coupling.current_time() - previous;
    }

    fn elapsed_frame_time(&self) -> f64 {
        self.elapsed_frame_time
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cadence_core::ManualReference;
    use parking_lot::Mutex;

    use super::*;

    /// Source whose time only moves when told to.
    #[derive(Default)]
    struct ScriptedSource {
        time: f64,
        running: bool,
    }

    impl Clock for ScriptedSource {
        fn current_time(&self) -> f64 {
            self.time
        }

        fn rate(&self) -> f64 {
            1.0
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
            Some(self)
        }
    }

    impl AdjustableClock for ScriptedSource {
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

        fn set_rate(&mut self, _rate: f64) {}

        fn reset_speed_adjustments(&mut self) {}
    }

    fn reactive(allow: bool) -> (Arc<Mutex<ScriptedSource>>, DecouplingClock) {
        let source = Arc::new(Mutex::new(ScriptedSource::default()));
        let clock = DecouplingClock::with_config(
            ClockHandle::shared(&source),
            DecouplingConfig {
                allow_decoupling: allow,
            },
            TimeReference::manual(&ManualReference::new()),
        );
        (source, clock)
    }

    fn framed(allow: bool) -> (Arc<Mutex<ScriptedSource>>, FramedDecouplingClock) {
        let source = Arc::new(Mutex::new(ScriptedSource::default()));
        let clock = FramedDecouplingClock::with_config(
            ClockHandle::shared(&source),
            DecouplingConfig {
                allow_decoupling: allow,
            },
            FramedConfig::default(),
            TimeReference::manual(&ManualReference::new()),
        );
        (source, clock)
    }

    #[test]
    fn test_reactive_sees_source_immediately() {
        let (source, clock) = reactive(false);

        source.lock().running = true;
        source.lock().time = 750.0;

        assert!(clock.is_running());
        assert_eq!(clock.current_time(), 750.0);
    }

    #[test]
    fn test_framed_waits_for_frame() {
        let (source, mut clock) = framed(false);

        source.lock().running = true;
        source.lock().time = 750.0;

        assert!(!clock.is_running());
        assert_eq!(clock.current_time(), 0.0);

        clock.process_frame();
        assert!(clock.is_running());
        assert_eq!(clock.current_time(), 750.0);
        assert_eq!(clock.elapsed_frame_time(), 750.0);
    }

    #[test]
    fn test_framed_start_uses_frame_time() {
        let (source, mut clock) = framed(true);

        // Not yet observed: the clock still believes it is at zero.
        source.lock().time = 1000.0;
        clock.start();

        assert_eq!(source.lock().time, 0.0);
        assert!(source.lock().running);
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn test_framed_stop_preserves_frame_state() {
        let (source, mut clock) = framed(true);

        clock.start();
        source.lock().time = 1000.0;
        clock.process_frame();
        clock.stop();

        assert_eq!(clock.current_time(), 1000.0);
        assert!(!clock.is_running());
        assert!(!source.lock().running);
    }

    #[test]
    fn test_framed_decoupled_keeps_running() {
        let (source, mut clock) = framed(true);

        clock.start();
        clock.process_frame();
        source.lock().running = false;
        clock.process_frame();

        assert!(clock.is_running());
    }

    #[test]
    fn test_change_source_resets_state() {
        let (_, mut clock) = reactive(true);
        clock.seek(-500.0);

        let replacement = Arc::new(Mutex::new(ScriptedSource {
            time: 64.0,
            running: true,
        }));
        clock.change_source(ClockHandle::shared(&replacement));

        assert_eq!(clock.state(), CouplingState::Coupled);
        assert_eq!(clock.current_time(), 64.0);
        assert!(clock.is_running());
    }

    #[test]
    fn test_default_source_is_stopwatch() {
        let mut clock = DecouplingClock::default();

        assert!(clock.source().is_adjustable());
        assert!(clock.seek(250.0));
        assert_eq!(clock.current_time(), 250.0);
    }
}
