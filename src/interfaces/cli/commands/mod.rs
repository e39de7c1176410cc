//! CLI command implementations
//!
//! This module re-exports all CLI command functions.

mod ad_management;
mod config_gen;

pub use ad_management::*;
pub use config_gen::config_generate;
