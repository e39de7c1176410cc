//! Mode routing
//!
//! This module provides unified entry points for different execution modes:
//! - Server mode (HTTP server, the default)
//! - CLI mode (ad management from the shell)

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "server")]
pub use server::run_server;

#[cfg(feature = "cli")]
pub use cli::run_cli;
