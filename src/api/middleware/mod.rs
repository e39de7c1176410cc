pub mod auth;
pub mod availability;
pub mod request_id;

pub use auth::AdminAuth;
pub use availability::AvailabilityGuard;
pub use request_id::{RequestId, RequestIdMiddleware};
