//! Plugin values: what sits in the first slot of a declaration.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::{ComposeInfo, ConfigMap, value_kind};
use crate::optional::OptionalPlugin;

// ─── Transformer ──────────────────────────────────────────────────────────────

/// A function that turns a configuration into an updated configuration.
///
/// Implemented for every `Fn(ConfigMap, &ComposeInfo) -> ConfigMap` closure.
///
/// # Example
///
/// ```rust
/// use composer_core::{ComposeInfo, ConfigMap, Plugin};
/// use serde_json::json;
///
/// let plugin = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
///     config.insert("sass".into(), json!(true));
///     config
/// });
/// ```
pub trait Transformer: Send + Sync {
    /// Produces the updated configuration.
    ///
    /// `config` is a fresh copy owned by the transformer; mutating it cannot
    /// affect the caller.
    fn transform(&self, config: ConfigMap, info: &ComposeInfo) -> ConfigMap;
}

impl<F> Transformer for F
where
    F: Fn(ConfigMap, &ComposeInfo) -> ConfigMap + Send + Sync,
{
    fn transform(&self, config: ConfigMap, info: &ComposeInfo) -> ConfigMap {
        self(config, info)
    }
}

// ─── Plugin ───────────────────────────────────────────────────────────────────

/// The plugin slot of a declaration.
///
/// Cloning a `Plugin` is cheap and keeps identity: clones compare equal under
/// [`Plugin::ptr_eq`].
#[derive(Clone)]
pub enum Plugin {
    /// A transformer invoked with the accumulated configuration.
    Transform(Arc<dyn Transformer>),
    /// A plain mapping used as the transformer's output without invocation.
    Config(Arc<ConfigMap>),
    /// A lazily resolved plugin, see [`mark_optional`](crate::mark_optional).
    Optional(OptionalPlugin),
    /// Any other value. Accepted here, rejected when composed.
    Raw(Arc<Value>),
}

impl Plugin {
    /// Wraps a transformer closure.
    pub fn transformer<F>(f: F) -> Self
    where
        F: Fn(ConfigMap, &ComposeInfo) -> ConfigMap + Send + Sync + 'static,
    {
        Self::Transform(Arc::new(f))
    }

    /// Wraps a mapping used as an object-as-plugin shorthand.
    pub fn config(config: ConfigMap) -> Self {
        Self::Config(Arc::new(config))
    }

    /// Returns `true` if both values are the same plugin instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Transform(a), Self::Transform(b)) => Arc::ptr_eq(a, b),
            (Self::Config(a), Self::Config(b)) => Arc::ptr_eq(a, b),
            (Self::Optional(a), Self::Optional(b)) => a.ptr_eq(b),
            (Self::Raw(a), Self::Raw(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Short description of the variant, used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transform(_) => "transformer",
            Self::Config(_) => "mapping",
            Self::Optional(_) => "optional plugin",
            Self::Raw(value) => value_kind(value),
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(_) => f.write_str("Transform(..)"),
            Self::Config(config) => f.debug_tuple("Config").field(config).finish(),
            Self::Optional(plugin) => f.debug_tuple("Optional").field(plugin).finish(),
            Self::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
        }
    }
}

impl From<ConfigMap> for Plugin {
    fn from(config: ConfigMap) -> Self {
        Self::config(config)
    }
}

impl From<Value> for Plugin {
    /// Objects become [`Plugin::Config`]; everything else is kept as
    /// [`Plugin::Raw`].
    fn from(value: Value) -> Self {
        match value {
            Value::Object(config) => Self::config(config),
            other => Self::Raw(Arc::new(other)),
        }
    }
}

impl From<OptionalPlugin> for Plugin {
    fn from(plugin: OptionalPlugin) -> Self {
        Self::Optional(plugin)
    }
}
