//! Settings loader using figment.
//!
//! # Sources (lowest to highest priority)
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides ([`SettingsLoader::merge`])
//! 3. Environment variables (`COMPOSER_*`)
//!
//! No files are read.
//!
//! # Environment Variable Mapping
//!
//! Variables use the `COMPOSER_` prefix with `__` as the nesting separator:
//!
//! - `COMPOSER_PHASE=phase-production-build` → `phase = "phase-production-build"`
//! - `COMPOSER_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `COMPOSER_LOGGING__FILTERS__COMPOSER_CORE=trace` → `logging.filters.composer_core = "trace"`
//!
//! # Example
//!
//! ```rust,ignore
//! use composer_runtime::settings::SettingsLoader;
//!
//! let settings = SettingsLoader::new().load()?;
//! let phase = settings.phase_or(PHASE_DEVELOPMENT_SERVER);
//! ```

use figment::Figment;
use figment::providers::{Env, Serialized};
use tracing::{debug, trace};

use super::schema::{ComposeSettings, LogOutput};
use crate::error::{SettingsError, SettingsResult};

/// Prefix of the environment variables read by [`SettingsLoader`].
pub const ENV_PREFIX: &str = "COMPOSER_";

/// Layered settings loader.
pub struct SettingsLoader {
    /// Programmatic overrides.
    figment: Figment,
    /// Whether to load environment variables.
    load_env: bool,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Creates a loader that reads defaults and the environment.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            load_env: true,
        }
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges settings programmatically, below environment variables.
    pub fn merge(mut self, settings: ComposeSettings) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(settings));
        self
    }

    /// Loads, validates and returns the settings.
    pub fn load(self) -> SettingsResult<ComposeSettings> {
        let settings: ComposeSettings = self.build_figment().extract()?;
        validate_settings(&settings)?;

        debug!(
            phase = ?settings.phase,
            logging_level = %settings.logging.level,
            "Settings loaded"
        );

        Ok(settings)
    }

    fn build_figment(self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(ComposeSettings::default()))
            .merge(self.figment);

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        figment
    }
}

/// Checks values the schema cannot express.
pub fn validate_settings(settings: &ComposeSettings) -> SettingsResult<()> {
    if settings.phase.as_deref().is_some_and(str::is_empty) {
        return Err(SettingsError::invalid("phase must not be empty"));
    }

    if settings.logging.output == LogOutput::File && settings.logging.file_path.is_none() {
        return Err(SettingsError::invalid(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
