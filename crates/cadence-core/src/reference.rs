//! Real-time references
//!
//! Free-running and interpolation both measure real elapsed time. They do so
//! through a [`TimeReference`] so the source of "now" can be swapped: the
//! monotonic OS clock in production, a manually stepped value in tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A monotonic millisecond counter.
pub trait Monotonic: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin. Never decreases.
    fn now_ms(&self) -> f64;
}

/// Monotonic OS clock, measured from construction.
pub struct SystemReference {
    origin: Instant,
}

impl SystemReference {
    pub fn new() -> Self {
        SystemReference {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemReference {
    fn default() -> Self {
        Self::new()
    }
}

impl Monotonic for SystemReference {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually stepped reference. Clones share the same counter.
#[derive(Clone, Default)]
pub struct ManualReference {
    bits: Arc<AtomicU64>,
}

impl ManualReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step the reference forward by `ms`. Negative steps are ignored.
    pub fn advance(&self, ms: f64) {
        if !(ms > 0.0) {
            return;
        }
        let now = self.now_ms();
        self.bits.store((now + ms).to_bits(), Ordering::Release);
    }

    /// Jump to an absolute value. Values behind the current one are ignored.
    pub fn set(&self, ms: f64) {
        if ms > self.now_ms() {
            self.bits.store(ms.to_bits(), Ordering::Release);
        }
    }
}

impl Monotonic for ManualReference {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl fmt::Debug for ManualReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManualReference({:.3}ms)", self.now_ms())
    }
}

/// Shared handle to a real-time reference.
#[derive(Clone)]
pub struct TimeReference(Arc<dyn Monotonic>);

impl TimeReference {
    /// Reference backed by the monotonic OS clock.
    pub fn system() -> Self {
        Self::new(SystemReference::new())
    }

    /// Reference backed by a manually stepped counter.
    pub fn manual(manual: &ManualReference) -> Self {
        Self::new(manual.clone())
    }

    /// Reference backed by any other monotonic counter.
    pub fn new<M: Monotonic + 'static>(source: M) -> Self {
        TimeReference(Arc::new(source))
    }

    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.0.now_ms()
    }
}

impl Default for TimeReference {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for TimeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeReference({:.3}ms)", self.now_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_reference_monotonic() {
        let reference = TimeReference::system();

        let t1 = reference.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let t2 = reference.now_ms();

        assert!(t2 > t1);
    }

    #[test]
    fn test_manual_reference_shared() {
        let manual = ManualReference::new();
        let reference = TimeReference::manual(&manual);

        assert_eq!(reference.now_ms(), 0.0);
        manual.advance(16.5);
        assert_eq!(reference.now_ms(), 16.5);
    }

    #[test]
    fn test_manual_reference_never_rewinds() {
        let manual = ManualReference::new();
        manual.set(100.0);
        manual.set(50.0);
        manual.advance(-10.0);

        assert_eq!(manual.now_ms(), 100.0);
    }

    #[test]
    fn test_custom_reference() {
        struct Frozen(f64);

        impl Monotonic for Frozen {
            fn now_ms(&self) -> f64 {
                self.0
            }
        }

        let reference = TimeReference::new(Frozen(42.0));
        let copy = reference.clone();

        assert_eq!(reference.now_ms(), 42.0);
        assert_eq!(copy.now_ms(), 42.0);
    }
}
