//! Ad selection
//!
//! `policy` decides whether a playback position gets an ad and which slot
//! it draws from. `feed` resolves that slot to the live ad and records the
//! impression.

pub mod feed;
pub mod policy;

pub use feed::{FeedDecision, FeedRequest, FeedService};
pub use policy::{Placement, PlacementReason, SERVE_INTERVAL, cycle_slot, is_eligible, place};
