use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to defaults when `init_config`
/// has not been called yet.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .load_full()
}

/// Initialize the global configuration from "config.toml" in the current directory.
///
/// If the file doesn't exist, uses in-memory defaults plus `ST__*` overrides.
///
/// # Examples
/// ```no_run
/// use shoptrack::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    init_config_from(StaticConfig::DEFAULT_PATH);
}

/// Initialize the global configuration from an explicit file path
pub fn init_config_from(path: &str) {
    set_config(StaticConfig::load(path));
}

/// Replace the global configuration (used by embedders and tests)
pub fn set_config(config: StaticConfig) {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .store(Arc::new(config));
}
