//! Frame gating and the scheduling session.
//!
//! Frames from either source flow through the same path:
//!
//! ```text
//! demo tick ───────────────────────────┐
//! device bytes ─► framer ─► decode ─► scale ─┴─► [TriggerEngine] ─► observer
//!                                                      │
//!                                            [MeasurementScheduler] ─► F / V
//! ```
//!
//! - [`trigger`] - Auto/Normal/Single trigger state machine
//! - [`scheduler`] - Measurement request throttling
//! - [`session`] - Single-owner state driven by the backend worker thread
//! - [`events`] - What the session reports to its observer

pub mod events;
pub mod scheduler;
pub mod session;
pub mod trigger;

pub use events::{ScopeEvent, ScopeObserver};
pub use scheduler::{MeasurementScheduler, MEASUREMENT_REQUESTS};
pub use session::ScopeSession;
pub use trigger::{find_edge, TriggerEngine};
