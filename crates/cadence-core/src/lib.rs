//! Cadence Core - Clock contracts and primitives
//!
//! This crate defines the types shared by every Cadence clock:
//! - Clock contracts (Clock, AdjustableClock, FrameBasedClock)
//! - Shared source handles (ClockHandle)
//! - Real-time references (system and manual)
//! - Frame timing statistics
//! - Error types

pub mod clock;
pub mod error;
pub mod frame;
pub mod handle;
pub mod reference;

pub use clock::*;
pub use error::*;
pub use frame::*;
pub use handle::*;
pub use reference::*;
