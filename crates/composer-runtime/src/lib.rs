//! Composer Runtime - host-facing layer for plugin composition.
//!
//! This crate provides:
//! - The config functions handed to a host build tool (`with_plugins`, `extend`)
//! - The `optional` marker for lazily resolved plugins
//! - Settings loading (`SettingsLoader`)
//! - Logging configuration (`LoggingBuilder`)
//!
//! # Host contract
//!
//! The host calls the returned function with the active phase and a
//! [`HostContext`] carrying its `defaultConfig`, and consumes the returned
//! mapping as its configuration.
//!
//! ```rust,ignore
//! use composer_runtime::{ConfigFunction, HostContext, SettingsLoader, logging, with_plugins};
//!
//! let settings = SettingsLoader::new().load()?;
//! logging::init_from_config(&settings.logging);
//!
//! let config_fn = with_plugins(declarations![images, sass], static_config);
//! let config = config_fn.call(settings.phase_or(PHASE_DEVELOPMENT_SERVER), &HostContext::default())?;
//! ```

pub mod compose;
pub mod error;
pub mod logging;
pub mod settings;

// Re-exports
pub use compose::{
    ConfigFunction, Extend, Extended, FnConfig, HostContext, WithPlugins, extend, from_fn,
    optional, with_plugins,
};
pub use error::{SettingsError, SettingsResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use settings::{ComposeSettings, LoggingConfig, SettingsLoader};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
