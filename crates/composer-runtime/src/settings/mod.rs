//! Settings for the composer runtime.
//!
//! Settings are layered from built-in defaults, programmatic overrides and
//! `COMPOSER_*` environment variables.

pub mod loader;
pub mod schema;

pub use loader::{ENV_PREFIX, SettingsLoader, validate_settings};
pub use schema::{
    ComposeSettings, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig,
};
