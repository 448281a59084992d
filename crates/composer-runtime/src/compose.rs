//! Host-facing entry points.
//!
//! A build tool loads its configuration by calling a *config function* with
//! the active phase and a host context holding its `defaultConfig`.
//! [`with_plugins`] produces such a function from a declaration list and a
//! static configuration; [`extend`] layers a second list on top of an
//! existing config function.
//!
//! # Example
//!
//! ```rust
//! use composer_core::phase::{PHASE_DEVELOPMENT_SERVER, PHASE_PRODUCTION_BUILD};
//! use composer_core::{ComposeInfo, ConfigMap, Plugin, declarations, phases, to_config_map};
//! use composer_runtime::{ConfigFunction, HostContext, extend, with_plugins};
//! use serde_json::json;
//!
//! let images = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
//!     config.insert("images".into(), json!(true));
//!     config
//! });
//! let analyzer = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
//!     config.insert("analyzer".into(), json!(true));
//!     config
//! });
//!
//! let base = with_plugins(declarations![images], to_config_map(json!({ "base": true })));
//! let config_fn = extend(base).with_plugins(
//!     declarations![(analyzer, phases([PHASE_PRODUCTION_BUILD]))],
//!     ConfigMap::new(),
//! );
//!
//! let config = config_fn.call(PHASE_DEVELOPMENT_SERVER, &HostContext::default())?;
//! assert_eq!(config.get("images"), Some(&json!(true)));
//! assert!(!config.contains_key("analyzer"));
//! # Ok::<(), composer_core::ComposeError>(())
//! ```

use std::sync::Arc;

use composer_core::{
    ComposeResult, ConfigMap, Declaration, compose_plugins, merge_phase_configuration,
    needs_phases, shallow_merge,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use composer_core::mark_optional as optional;

// ─── HostContext ──────────────────────────────────────────────────────────────

/// Second argument the host passes to a config function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    /// The host's own defaults; absent is treated as empty.
    #[serde(default)]
    pub default_config: Option<ConfigMap>,
}

impl HostContext {
    /// Creates a context carrying `default_config`.
    pub fn new(default_config: ConfigMap) -> Self {
        Self {
            default_config: Some(default_config),
        }
    }
}

// ─── ConfigFunction ───────────────────────────────────────────────────────────

/// The config-function signature expected by the host build tool.
pub trait ConfigFunction: Send + Sync {
    /// Resolves the final configuration for `phase`.
    fn call(&self, phase: &str, host: &HostContext) -> ComposeResult<ConfigMap>;
}

impl<T: ConfigFunction + ?Sized> ConfigFunction for Arc<T> {
    fn call(&self, phase: &str, host: &HostContext) -> ComposeResult<ConfigMap> {
        (**self).call(phase, host)
    }
}

impl<T: ConfigFunction + ?Sized> ConfigFunction for Box<T> {
    fn call(&self, phase: &str, host: &HostContext) -> ComposeResult<ConfigMap> {
        (**self).call(phase, host)
    }
}

/// A [`ConfigFunction`] backed by a closure. Created by [`from_fn`].
pub struct FnConfig<F>(F);

impl<F> ConfigFunction for FnConfig<F>
where
    F: Fn(&str, &HostContext) -> ComposeResult<ConfigMap> + Send + Sync,
{
    fn call(&self, phase: &str, host: &HostContext) -> ComposeResult<ConfigMap> {
        (self.0)(phase, host)
    }
}

/// Adapts a hand-written closure into a [`ConfigFunction`].
pub fn from_fn<F>(f: F) -> FnConfig<F>
where
    F: Fn(&str, &HostContext) -> ComposeResult<ConfigMap> + Send + Sync,
{
    FnConfig(f)
}

// ─── WithPlugins ──────────────────────────────────────────────────────────────

/// Config function composing a declaration list over a static configuration.
#[derive(Debug, Clone)]
pub struct WithPlugins {
    declarations: Vec<Declaration>,
    static_config: ConfigMap,
}

impl WithPlugins {
    /// The declarations this function composes.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// The static configuration merged over the host defaults.
    pub fn static_config(&self) -> &ConfigMap {
        &self.static_config
    }
}

impl ConfigFunction for WithPlugins {
    fn call(&self, phase: &str, host: &HostContext) -> ComposeResult<ConfigMap> {
        debug!(
            phase = %phase,
            plugins = self.declarations.len(),
            phase_dependent = needs_phases(&self.declarations),
            "Composing configuration"
        );

        let initial = shallow_merge(
            host.default_config.clone().unwrap_or_default(),
            merge_phase_configuration(phase, &self.static_config),
        );

        compose_plugins(phase, &self.declarations, &initial)
    }
}

/// Creates a config function from `declarations` and `static_config`.
///
/// The host's `defaultConfig` is the base, `static_config` (with its
/// phase-scoped keys resolved) is merged on top, and the result is composed
/// through every declaration in order.
pub fn with_plugins<I>(declarations: I, static_config: ConfigMap) -> WithPlugins
where
    I: IntoIterator<Item = Declaration>,
{
    WithPlugins {
        declarations: declarations.into_iter().collect(),
        static_config,
    }
}

// ─── extend ───────────────────────────────────────────────────────────────────

/// A base config function waiting for a second declaration list.
pub struct Extend<B> {
    base: B,
}

impl<B: ConfigFunction> Extend<B> {
    /// Layers `declarations` and `static_config` on top of the base.
    pub fn with_plugins<I>(self, declarations: I, static_config: ConfigMap) -> Extended<B>
    where
        I: IntoIterator<Item = Declaration>,
    {
        Extended {
            base: self.base,
            layer: with_plugins(declarations, static_config),
        }
    }
}

/// Config function running a base function, then a second plugin list.
pub struct Extended<B> {
    base: B,
    layer: WithPlugins,
}

impl<B: ConfigFunction> ConfigFunction for Extended<B> {
    fn call(&self, phase: &str, host: &HostContext) -> ComposeResult<ConfigMap> {
        let base = self.base.call(phase, host)?;
        self.layer.call(phase, &HostContext::new(base))
    }
}

/// Wraps `base` so its output seeds another [`with_plugins`] call.
pub fn extend<B: ConfigFunction>(base: B) -> Extend<B> {
    Extend { base }
}
