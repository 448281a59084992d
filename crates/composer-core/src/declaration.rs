//! Plugin declarations and their canonical parsed form.
//!
//! A declaration takes one of four shapes:
//!
//! | Shape | Meaning |
//! |-------|---------|
//! | `plugin` | run unconditionally with no plugin config |
//! | `(plugin, config)` | run unconditionally, merging `config` first |
//! | `(plugin, phases)` | run only in `phases` |
//! | `(plugin, config, phases)` | both |
//!
//! Tuples convert with `From`, so lists are usually written with the
//! [`declarations!`](crate::declarations) macro.

use crate::config::ConfigMap;
use crate::phase::{PHASE_PREFIX, PhaseSet};
use crate::plugin::Plugin;

/// One entry in a plugin list.
#[derive(Debug, Clone)]
pub enum Declaration {
    /// `plugin`
    Bare(Plugin),
    /// `(plugin, config)`
    WithConfig(Plugin, ConfigMap),
    /// `(plugin, phases)`
    WithPhases(Plugin, PhaseSet),
    /// `(plugin, config, phases)`
    Full(Plugin, ConfigMap, PhaseSet),
}

impl Declaration {
    /// Returns the plugin slot.
    pub fn plugin(&self) -> &Plugin {
        match self {
            Self::Bare(plugin)
            | Self::WithConfig(plugin, _)
            | Self::WithPhases(plugin, _)
            | Self::Full(plugin, _, _) => plugin,
        }
    }

    /// Returns `true` if this declaration can behave differently per phase.
    ///
    /// Explicit phase sets always count. A plugin config counts when one of
    /// its keys starts with `phase-`; negated keys alone do not.
    pub fn depends_on_phase(&self) -> bool {
        match self {
            Self::Bare(_) => false,
            Self::WithPhases(..) | Self::Full(..) => true,
            Self::WithConfig(_, config) => config.keys().any(|key| key.starts_with(PHASE_PREFIX)),
        }
    }
}

impl From<Plugin> for Declaration {
    fn from(plugin: Plugin) -> Self {
        Self::Bare(plugin)
    }
}

impl From<(Plugin, ConfigMap)> for Declaration {
    fn from((plugin, config): (Plugin, ConfigMap)) -> Self {
        Self::WithConfig(plugin, config)
    }
}

impl From<(Plugin, PhaseSet)> for Declaration {
    fn from((plugin, phases): (Plugin, PhaseSet)) -> Self {
        Self::WithPhases(plugin, phases)
    }
}

impl From<(Plugin, ConfigMap, PhaseSet)> for Declaration {
    fn from((plugin, config, phases): (Plugin, ConfigMap, PhaseSet)) -> Self {
        Self::Full(plugin, config, phases)
    }
}

/// Canonical form of a [`Declaration`].
#[derive(Debug, Clone)]
pub struct ParsedPlugin {
    /// The plugin itself, the same instance the declaration holds.
    pub plugin_function: Plugin,
    /// Plugin config, empty when none was given.
    pub plugin_config: ConfigMap,
    /// Caller-supplied phase restriction; `None` means unrestricted.
    pub phases: Option<PhaseSet>,
}

/// Normalizes any declaration shape into a [`ParsedPlugin`].
pub fn parse_plugin_config(declaration: &Declaration) -> ParsedPlugin {
    let (plugin_function, plugin_config, phases) = match declaration {
        Declaration::Bare(plugin) => (plugin.clone(), ConfigMap::new(), None),
        Declaration::WithConfig(plugin, config) => (plugin.clone(), config.clone(), None),
        Declaration::WithPhases(plugin, phases) => {
            (plugin.clone(), ConfigMap::new(), Some(phases.clone()))
        }
        Declaration::Full(plugin, config, phases) => {
            (plugin.clone(), config.clone(), Some(phases.clone()))
        }
    };

    ParsedPlugin {
        plugin_function,
        plugin_config,
        phases,
    }
}

/// Returns `true` if at least one declaration depends on the active phase.
pub fn needs_phases(declarations: &[Declaration]) -> bool {
    declarations.iter().any(Declaration::depends_on_phase)
}

/// Builds a `Vec<Declaration>` from plugins and tuples.
///
/// ```rust
/// use composer_core::{ComposeInfo, ConfigMap, Plugin, declarations, phases};
/// use composer_core::phase::{PHASE_DEVELOPMENT_SERVER, PHASE_PRODUCTION_BUILD};
///
/// let images = Plugin::transformer(|config: ConfigMap, _: &ComposeInfo| config);
/// let sass = Plugin::transformer(|config: ConfigMap, _: &ComposeInfo| config);
///
/// let list = declarations![
///     images,
///     (sass, phases([PHASE_DEVELOPMENT_SERVER, PHASE_PRODUCTION_BUILD])),
/// ];
/// assert_eq!(list.len(), 2);
/// ```
#[macro_export]
macro_rules! declarations {
    ($($declaration:expr),* $(,)?) => {
        vec![$($crate::Declaration::from($declaration)),*]
    };
}
