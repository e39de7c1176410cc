use std::sync::{Arc, OnceLock};

use super::StaticConfig;

static CONFIG: OnceLock<Arc<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Falls back to in-memory defaults when `init_config()` has not run,
/// which keeps library consumers (tests, CLI helpers) usable.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(StaticConfig::default()))
}

/// Initialize the global configuration
///
/// Loads from `path` (or `config.toml` when `None`) plus `ADS__*` environment
/// overrides. Subsequent calls are no-ops.
pub fn init_config(path: Option<&str>) -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| Arc::new(StaticConfig::load(path)))
        .clone()
}
