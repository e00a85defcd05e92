//! Cadence Test Harness - Scripted clocks and playback simulation
//!
//! This crate provides:
//! - Scripted source clocks (free, ranged, read-only)
//! - A simulated playback track with a restricted domain
//! - A frame-loop simulator with coarse sources and jittery frames
//! - Tracing setup for tests

pub mod clocks;
pub mod simulator;
pub mod track;

pub use clocks::*;
pub use simulator::*;
pub use track::*;

use tracing_subscriber::{fmt, EnvFilter};

/// Install a test-friendly subscriber. Safe to call more than once.
///
/// `RUST_LOG` overrides the default filter (`cadence_time=debug`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,cadence_time=debug"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init();
}
