//! Delivery telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a write-only side-effect layer.
//! Decision logic (engine, schedulers, coordinator) must never read it.
//!
//! # PRIVACY INVARIANT
//! Events carry ids, enums and counts only. Suggestion text and lesson names stay out.

pub mod event;
pub mod metrics;
pub mod recorder;
