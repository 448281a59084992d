//! Lazily resolved plugins.
//!
//! An optional plugin is a factory that produces the real plugin on demand,
//! typically to defer an expensive setup until the plugin is known to run in
//! the active phase. The composition engine calls the factory at most once
//! per pass, and only for declarations that survive phase gating.

use std::fmt;
use std::sync::Arc;

use crate::plugin::Plugin;

type Factory = Arc<dyn Fn() -> Plugin + Send + Sync>;

/// A factory tagged for lazy resolution.
#[derive(Clone)]
pub struct OptionalPlugin {
    factory: Factory,
}

impl OptionalPlugin {
    /// Returns `true` if both handles share the same factory.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.factory, &other.factory)
    }
}

impl fmt::Debug for OptionalPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionalPlugin").finish_non_exhaustive()
    }
}

/// Tags `factory` as an optional plugin without calling it.
///
/// # Example
///
/// ```rust
/// use composer_core::{ComposeInfo, ConfigMap, Plugin, is_optional, mark_optional};
///
/// let plugin = mark_optional(|| {
///     Plugin::transformer(|config: ConfigMap, _: &ComposeInfo| config)
/// });
/// assert!(is_optional(&plugin));
/// ```
pub fn mark_optional<F>(factory: F) -> Plugin
where
    F: Fn() -> Plugin + Send + Sync + 'static,
{
    Plugin::Optional(OptionalPlugin {
        factory: Arc::new(factory),
    })
}

/// Returns `true` if `plugin` was tagged with [`mark_optional`].
pub fn is_optional(plugin: &Plugin) -> bool {
    matches!(plugin, Plugin::Optional(_))
}

/// Calls the factory once and returns the plugin it produces.
pub fn resolve_optional_plugin(plugin: &OptionalPlugin) -> Plugin {
    (plugin.factory)()
}
