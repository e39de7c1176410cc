//! adserver - ad management and serving for video sites
//!
//! Serves one ad every few videos across a fixed set of slots, records
//! impressions and clicks, and exposes an admin API plus a CLI for managing
//! the ad inventory.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface
//!
//! # Architecture
//! - `storage`: SeaORM repository over `ads`, `ad_impressions`, `ad_clicks`
//! - `selection`: which slot (if any) a playback position gets
//! - `tracking`: two-tier impression and click recording
//! - `services`: validation, CRUD, reports and export
//! - `api`: HTTP handlers and middleware
//! - `interfaces`: CLI commands
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging bootstrap

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod selection;
pub mod services;
pub mod storage;
pub mod system;
pub mod tracking;
pub mod utils;
