//! Cadence Time Engine - Source coupling and smoothing
//!
//! This crate implements the time-base engine:
//! - Stopwatch: local real-time tracker used for free-running
//! - Coupling: Coupled / DecoupledRunning / DecoupledStopped state machine
//! - Decoupling clocks (reactive and per-frame) with boundary handoff
//! - Interpolation of coarse or jittery sources
//! - Framed snapshots and composed clock stacks

pub mod composite;
pub mod config;
pub mod coupling;
pub mod decoupling;
pub mod framed;
pub mod interpolating;
pub mod stopwatch;

pub use composite::*;
pub use config::*;
pub use coupling::*;
pub use decoupling::*;
pub use framed::*;
pub use interpolating::*;
pub use stopwatch::*;
