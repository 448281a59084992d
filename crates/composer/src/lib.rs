//! # Composer
//!
//! Compose a configuration out of a list of plugins, each transforming the
//! output of the one before it.
//!
//! ## Overview
//!
//! A plugin is a transformer (or a plain mapping) with optional plugin
//! config and an optional phase restriction. Phases name the current build
//! or runtime mode; plugins and config keys can be limited to some phases or
//! excluded from them with a leading `!`. Expensive plugins can be wrapped
//! with [`optional`](prelude::optional) so they are only created when they
//! actually run.
//!
//! ```text
//! ┌────────────┐     ┌─────────────┐     ┌──────────┐     ┌──────────┐
//! │ defaults + │────▶│  plugin 1   │────▶│ plugin 2 │────▶│  final   │
//! │   static   │     │ (if phase)  │     │ (lazy)   │     │  config  │
//! └────────────┘     └─────────────┘     └──────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use composer::prelude::*;
//!
//! let sass = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
//!     config.insert("sass".into(), json!(true));
//!     config
//! });
//! let analyzer = optional(|| {
//!     Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
//!         config.insert("analyzer".into(), json!(true));
//!         config
//!     })
//! });
//!
//! let config_fn = with_plugins(
//!     declarations![sass, (analyzer, phases([PHASE_PRODUCTION_BUILD]))],
//!     to_config_map(json!({ "distDir": "build" })),
//! );
//!
//! let config = config_fn.call(PHASE_PRODUCTION_BUILD, &HostContext::default())?;
//! assert_eq!(config.get("analyzer"), Some(&json!(true)));
//! # Ok::<(), ComposeError>(())
//! ```
//!
//! ## Features
//!
//! - `json-log`: enable the JSON log format

pub use composer_core as core;
pub use composer_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use composer::prelude::*;
/// ```
pub mod prelude {
    // Entry points
    pub use composer_runtime::{ConfigFunction, HostContext, extend, from_fn, optional, with_plugins};

    // Declarations and plugins
    pub use composer_core::{
        ComposeError, ComposeInfo, ConfigMap, Declaration, PhaseSet, Plugin, PluginRegistry,
        declarations, phases, to_config_map,
    };

    // Well-known phases
    pub use composer_core::phase::{
        PHASE_DEVELOPMENT_SERVER, PHASE_EXPORT, PHASE_PRODUCTION_BUILD, PHASE_PRODUCTION_SERVER,
        PHASE_TEST,
    };

    // Settings and logging
    pub use composer_runtime::{ComposeSettings, SettingsLoader, logging};

    // JSON values
    pub use serde_json::{Value, json};
}
