//! Impression and click tracking
//!
//! The recorder writes each event through a two-tier policy: a transaction
//! that stores the detail row and bumps the ad's counter, then a single
//! counter-only increment if that transaction fails.

pub mod recorder;
pub mod sink;

pub use recorder::{ClientInfo, RejectReason, TrackingOutcome, TrackingRecorder, TrackingResult};
pub use sink::{Counter, TrackingSink};
