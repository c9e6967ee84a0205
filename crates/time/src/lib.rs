//! Clock collaborator for the governance engine.
//!
//! # Features
//! - Second resolution (UNIX seconds)
//! - Monotonic: a clock never reports a time earlier than one it already reported
//! - Deterministic manual clock for tests and scripted replay

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock, UnixSeconds};
