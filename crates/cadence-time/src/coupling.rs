//! Coupling state machine
//!
//! Decides whether displayed time mirrors the source ("coupled") or runs on
//! its own ("decoupled"), and hands authority between the two without
//! discontinuities.
//!
//! The machine never owns its source. Every operation is handed the
//! [`ClockHandle`] it should observe or drive, so the same logic backs both the
//! reactive [`crate::DecouplingClock`] (observes on every read) and the
//! [`crate::FramedDecouplingClock`] (observes once per frame).

use cadence_core::{AdjustableClock, Clock, ClockHandle, ClockSnapshot, TimeReference};
use tracing::{debug, trace, warn};

use crate::{DecouplingConfig, StopwatchClock};

/// Who currently has authority over displayed time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CouplingState {
    /// Time and running state mirror the source
    Coupled,
    /// Time free-runs locally; the source is retried for handoff
    DecoupledRunning,
    /// Time is held locally; source seeks are ignored
    DecoupledStopped,
}

/// Coupling state machine
#[derive(Clone, Debug)]
pub struct Coupling {
    allow_decoupling: bool,
    state: CouplingState,
    /// Displayed time at the last observation or operation
    current_time: f64,
    /// Source rate at the last observation
    rate: f64,
    /// Source running state at the last observation (meaningful while coupled)
    source_running: bool,
    /// Held after the source refused an explicit seek. A source that starts
    /// running on its own does not reclaim authority while this is set.
    pinned: bool,
    /// Local tracker used while free-running
    free_run: StopwatchClock,
}

impl Coupling {
    pub fn new(config: &DecouplingConfig, reference: TimeReference) -> Self {
        Coupling {
            allow_decoupling: config.allow_decoupling,
            state: CouplingState::Coupled,
            current_time: 0.0,
            rate: 1.0,
            source_running: false,
            pinned: false,
            free_run: StopwatchClock::with_reference(reference),
        }
    }

    pub fn state(&self) -> CouplingState {
        self.state
    }

    pub fn allow_decoupling(&self) -> bool {
        self.allow_decoupling
    }

    /// Toggle decoupling. Takes effect at the next observation.
    pub fn set_allow_decoupling(&mut self, allow: bool) {
        self.allow_decoupling = allow;
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// True iff time is believed to be advancing.
    pub fn is_running(&self) -> bool {
        match self.state {
            CouplingState::Coupled => self.source_running,
            CouplingState::DecoupledRunning => true,
            CouplingState::DecoupledStopped => false,
        }
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            current_time: self.current_time,
            rate: self.rate,
            is_running: self.is_running(),
        }
    }

    /// Discard all state and take the source's current values as-is.
    pub fn rebase(&mut self, source: &ClockHandle) {
        let snapshot = source.snapshot();
        self.couple(snapshot);
        debug!(
            time = snapshot.current_time,
            running = snapshot.is_running,
            "coupling rebased on new source"
        );
    }

    /// Bring local state up to date with the source.
    pub fn observe(&mut self, source: &ClockHandle) {
        let snapshot = source.snapshot();
        self.rate = snapshot.rate;

        if !self.allow_decoupling {
            self.couple(snapshot);
            return;
        }

        match self.state {
            CouplingState::Coupled => {
                if snapshot.is_running {
                    self.couple(snapshot);
                } else if self.source_running {
                    // Pick up from wherever the source stopped.
                    self.current_time = snapshot.current_time;
                    debug!(time = self.current_time, "source stopped underneath, free-running");
                    self.enter_free_run();
                } else {
                    // Stopped while coupled: hold, so later source seeks are ignored.
                    self.hold();
                }
            }
            // A running source gets authority back only through the handoff,
            // at the free-run time.
            CouplingState::DecoupledRunning => {
                self.free_run.set_rate(snapshot.rate);
                self.current_time = self.free_run.current_time();
                self.try_handoff(source);
            }
            CouplingState::DecoupledStopped => {
                if snapshot.is_running && !self.pinned {
                    debug!(time = snapshot.current_time, "source started, re-coupling");
                    self.couple(snapshot);
                }
            }
        }
    }

    /// Start advancing time.
    pub fn start(&mut self, source: &ClockHandle) {
        if !self.allow_decoupling {
            report(source.adjust("start", |c| c.start()));
            self.couple(source.snapshot());
            return;
        }

        if self.is_running() {
            return;
        }

        let target = self.current_time;
        let started = source
            .adjust("start", |c| start_at(c, target))
            .unwrap_or(false);

        if started {
            self.source_running = true;
            self.pinned = false;
            self.state = CouplingState::Coupled;
            self.free_run.stop();
        } else {
            debug!(time = target, "source cannot start here, free-running");
            self.enter_free_run();
        }
    }

    /// Stop advancing time, holding the last displayed time.
    pub fn stop(&mut self, source: &ClockHandle) {
        if !self.allow_decoupling {
            report(source.adjust("stop", |c| c.stop()));
            self.couple(source.snapshot());
            return;
        }

        if self.state == CouplingState::DecoupledRunning {
            self.current_time = self.free_run.current_time();
        }

        // Best effort: the wrapper stops regardless.
        let _ = source.adjust("stop", |c| c.stop());

        self.free_run.stop();
        self.source_running = false;
        self.state = CouplingState::DecoupledStopped;
    }

    /// Seek to `position`. Returns whether the seek was accepted.
    pub fn seek(&mut self, source: &ClockHandle, position: f64) -> bool {
        if !self.allow_decoupling {
            let accepted = source
                .adjust("seek", |c| c.seek(position))
                .unwrap_or(false);
            if accepted {
                self.couple(source.snapshot());
            }
            return accepted;
        }

        if !position.is_finite() {
            return false;
        }

        let accepted = source
            .adjust("seek", |c| c.seek(position))
            .unwrap_or(false);

        let was_running = self.is_running();
        self.current_time = position;

        if accepted {
            if was_running {
                let resumed = source
                    .adjust("start", |c| {
                        c.start();
                        c.is_running()
                    })
                    .unwrap_or(false);

                if resumed {
                    self.source_running = true;
                    self.pinned = false;
                    self.state = CouplingState::Coupled;
                    self.free_run.stop();
                } else {
                    self.enter_free_run();
                }
            } else {
                self.hold();
            }
        } else {
            // Keep the source from reclaiming authority at a stale position.
            let _ = source.adjust("stop", |c| c.stop());
            debug!(position, "source rejected seek, decoupling");

            if was_running {
                self.enter_free_run();
            } else {
                self.hold();
                self.pinned = true;
            }
        }

        true
    }

    /// Stop and return both the wrapper and the source to zero.
    pub fn reset(&mut self, source: &ClockHandle) {
        report(source.adjust("reset", |c| c.reset()));

        if !self.allow_decoupling {
            self.couple(source.snapshot());
            return;
        }

        self.free_run.stop();
        self.current_time = 0.0;
        self.source_running = false;
        self.pinned = false;
        self.state = CouplingState::Coupled;
    }

    /// Change the source's rate.
    pub fn set_rate(&mut self, source: &ClockHandle, rate: f64) {
        if report(source.adjust("set rate", |c| c.set_rate(rate))) {
            self.rate = source.rate();
            self.free_run.set_rate(self.rate);
        }
    }

    /// Return the source's rate to real-time.
    pub fn reset_speed_adjustments(&mut self, source: &ClockHandle) {
        if report(source.adjust("reset speed adjustments", |c| c.reset_speed_adjustments())) {
            self.rate = source.rate();
            self.free_run.set_rate(self.rate);
        }
    }

    fn couple(&mut self, snapshot: ClockSnapshot) {
        self.state = CouplingState::Coupled;
        self.current_time = snapshot.current_time;
        self.rate = snapshot.rate;
        self.source_running = snapshot.is_running;
        self.pinned = false;
        self.free_run.stop();
    }

    fn hold(&mut self) {
        self.free_run.stop();
        self.source_running = false;
        self.pinned = false;
        self.state = CouplingState::DecoupledStopped;
    }

    fn enter_free_run(&mut self) {
        self.free_run.stop();
        self.free_run.seek(self.current_time);
        self.free_run.set_rate(self.rate);
        self.free_run.start();
        self.source_running = false;
        self.pinned = false;
        self.state = CouplingState::DecoupledRunning;
    }

    /// Try to give authority back to the source at the free-run time.
    fn try_handoff(&mut self, source: &ClockHandle) {
        let target = self.current_time;
        let accepted = source
            .adjust("seek", |c| c.seek(target) && start_running(c))
            .unwrap_or(false);

        if accepted {
            debug!(time = target, "handed authority back to source");
            self.free_run.stop();
            self.source_running = true;
            self.pinned = false;
            self.state = CouplingState::Coupled;
        } else {
            trace!(time = target, "source not ready for handoff");
        }
    }
}

/// Start `clock`, seeking it to `target` first when it is elsewhere. The clock
/// is started either way; only a start at `target` counts.
fn start_at(clock: &mut dyn AdjustableClock, target: f64) -> bool {
    let positioned = clock.current_time() == target || clock.seek(target);
    start_running(clock) && positioned
}

fn start_running(clock: &mut dyn AdjustableClock) -> bool {
    clock.start();
    clock.is_running()
}

/// Log a forwarded mutation the source refused. Returns whether it went through.
fn report<T>(result: cadence_core::ClockResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(err) => {
            warn!(%err, "forwarded mutation not supported");
            false
        }
    }
}
