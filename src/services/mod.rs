//! Service layer for business logic
//!
//! This module provides the ad management logic shared between the HTTP
//! admin API and the CLI.

mod ad_service;
mod context;
pub mod export;
pub mod validation;

pub use ad_service::*;
pub use context::{AdsAvailability, AdsServices, REMEDIATION};
pub use export::ExportFormat;
pub use validation::AdForm;
