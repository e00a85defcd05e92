//! Shared source handles
//!
//! A wrapper never owns its source outright: the embedding application keeps
//! its own reference and may mutate the source between frames. Handles lock
//! only for the duration of a single read or a single mutation.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{AdjustableClock, Clock, ClockError, ClockResult, ClockSnapshot};

/// Shared, swappable reference to a source clock.
#[derive(Clone)]
pub struct ClockHandle {
    inner: Arc<Mutex<dyn Clock + Send>>,
}

impl ClockHandle {
    /// Wrap a clock that nothing else needs to reach.
    pub fn new<C: Clock + Send + 'static>(clock: C) -> Self {
        ClockHandle {
            inner: Arc::new(Mutex::new(clock)),
        }
    }

    /// Share an existing clock. The caller keeps typed access through `shared`.
    pub fn shared<C: Clock + Send + 'static>(shared: &Arc<Mutex<C>>) -> Self {
        let inner: Arc<Mutex<dyn Clock + Send>> = shared.clone();
        ClockHandle { inner }
    }

    /// Observe time, rate and running state under a single lock.
    pub fn snapshot(&self) -> ClockSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn current_time(&self) -> f64 {
        self.inner.lock().current_time()
    }

    pub fn rate(&self) -> f64 {
        self.inner.lock().rate()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().is_running()
    }

    /// Whether the source accepts control.
    pub fn is_adjustable(&self) -> bool {
        self.inner.lock().as_adjustable().is_some()
    }

    /// Run `f` against the source's adjustable interface.
    ///
    /// `operation` names the attempted mutation for the error.
    pub fn adjust<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut dyn AdjustableClock) -> R,
    ) -> ClockResult<R> {
        let mut guard = self.inner.lock();
        match guard.as_adjustable() {
            Some(adjustable) => Ok(f(adjustable)),
            None => Err(ClockError::NotAdjustable(operation)),
        }
    }

    /// Process a frame on the source if it is frame based.
    /// Returns whether a frame was processed.
    pub fn process_frame(&self) -> bool {
        let mut guard = self.inner.lock();
        match guard.as_frame_based() {
            Some(framed) => {
                framed.process_frame();
                true
            }
            None => false,
        }
    }

    /// Whether both handles point at the same clock.
    pub fn same_clock(&self, other: &ClockHandle) -> bool {
        Arc::as_ptr(&self.inner) as *const () == Arc::as_ptr(&other.inner) as *const ()
    }
}

impl<C: Clock + Send + 'static> From<Arc<Mutex<C>>> for ClockHandle {
    fn from(shared: Arc<Mutex<C>>) -> Self {
        let inner: Arc<Mutex<dyn Clock + Send>> = shared;
        ClockHandle { inner }
    }
}

impl fmt::Debug for ClockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(clock) => f
                .debug_struct("ClockHandle")
                .field("current_time", &clock.current_time())
                .field("rate", &clock.rate())
                .field("is_running", &clock.is_running())
                .finish(),
            None => f.write_str("ClockHandle(<locked>)"),
        }
    }
}
