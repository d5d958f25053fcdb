//! App settings loaded from `<config dir>/<app>/settings.toml`.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::AppSettings;
