//! Named plugins and declaration lists read from JSON data.
//!
//! Declaration lists can come from data rather than code, e.g.
//!
//! ```json
//! [
//!     "images",
//!     ["sass", { "cssModules": true }],
//!     ["analyzer", ["phase-production-build"]],
//!     ["offline", { "phase-production-server": { "cache": true } }, "!phase-development-server"]
//! ]
//! ```
//!
//! Arrays are read by shape: three or more entries are `[plugin, config,
//! phases]`, two entries whose second is an array are `[plugin, phases]`,
//! anything shorter is `[plugin, config?]`. A string naming a registered
//! plugin resolves to that plugin; other values go through `Plugin::from`,
//! so objects act as object-as-plugin shorthands and anything else fails
//! when composed.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ConfigMap, value_kind};
use crate::declaration::Declaration;
use crate::error::{DeclarationError, DeclarationResult};
use crate::phase::PhaseSet;
use crate::plugin::Plugin;

/// Registry of plugins addressable by name.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Plugin>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `plugin` under `name`, returning the plugin it replaced.
    pub fn register(&mut self, name: impl Into<String>, plugin: Plugin) -> Option<Plugin> {
        let name = name.into();
        debug!(plugin = %name, kind = plugin.kind(), "Registering plugin");
        self.plugins.insert(name, plugin)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, plugin: Plugin) -> Self {
        self.register(name, plugin);
        self
    }

    /// Looks up a plugin by name.
    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.get(name)
    }

    /// Returns `true` if a plugin is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if no plugins are registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Resolves the plugin slot of a JSON declaration.
    pub fn resolve(&self, value: &Value) -> Plugin {
        if let Value::String(name) = value
            && let Some(plugin) = self.plugins.get(name)
        {
            return plugin.clone();
        }
        Plugin::from(value.clone())
    }

    /// Parses a JSON array of declarations.
    pub fn parse_declarations(&self, value: &Value) -> DeclarationResult<Vec<Declaration>> {
        let Value::Array(entries) = value else {
            return Err(DeclarationError::NotAList(value_kind(value)));
        };

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| self.parse_declaration(index, entry))
            .collect()
    }

    /// Parses a single JSON declaration at position `index`.
    pub fn parse_declaration(&self, index: usize, value: &Value) -> DeclarationResult<Declaration> {
        let Value::Array(parts) = value else {
            return Ok(Declaration::Bare(self.resolve(value)));
        };

        let plugin = self.resolve(parts.first().unwrap_or(&Value::Null));

        if parts.len() > 2 {
            let config = plugin_config(index, &parts[1]);
            let phases = phase_set(index, &parts[2])?;
            return Ok(Declaration::Full(plugin, config, phases));
        }

        if let Some(phases) = parts.get(1)
            && phases.is_array()
        {
            return Ok(Declaration::WithPhases(plugin, phase_set(index, phases)?));
        }

        match parts.get(1) {
            Some(config) => Ok(Declaration::WithConfig(plugin, plugin_config(index, config))),
            None => Ok(Declaration::Bare(plugin)),
        }
    }
}

/// Reads the config slot; falsy values mean "no config".
fn plugin_config(index: usize, value: &Value) -> ConfigMap {
    match value {
        Value::Object(config) => config.clone(),
        Value::Null | Value::Bool(false) => ConfigMap::new(),
        Value::String(s) if s.is_empty() => ConfigMap::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => ConfigMap::new(),
        other => {
            warn!(
                declaration = index,
                kind = value_kind(other),
                "Plugin config is not a mapping, using an empty one"
            );
            ConfigMap::new()
        }
    }
}

fn phase_set(index: usize, value: &Value) -> DeclarationResult<PhaseSet> {
    PhaseSet::from_value(value).ok_or(DeclarationError::InvalidPhases { index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComposeInfo;
    use serde_json::json;

    fn registry() -> (PluginRegistry, Plugin) {
        let sass = Plugin::transformer(|config: ConfigMap, _: &ComposeInfo| config);
        let registry = PluginRegistry::new().with("sass", sass.clone());
        (registry, sass)
    }

    #[test]
    fn test_register_and_lookup() {
        let (mut registry, sass) = registry();

        assert!(registry.contains("sass"));
        assert!(registry.get("sass").unwrap().ptr_eq(&sass));
        assert_eq!(registry.len(), 1);

        let replaced = registry.register("sass", Plugin::from(json!({})));
        assert!(replaced.unwrap().ptr_eq(&sass));
    }

    #[test]
    fn test_parse_bare_name() {
        let (registry, sass) = registry();

        let declaration = registry.parse_declaration(0, &json!("sass")).unwrap();

        assert!(matches!(&declaration, Declaration::Bare(p) if p.ptr_eq(&sass)));
    }

    #[test]
    fn test_parse_single_element_list() {
        let (registry, sass) = registry();

        let declaration = registry.parse_declaration(0, &json!(["sass"])).unwrap();

        assert!(matches!(&declaration, Declaration::Bare(p) if p.ptr_eq(&sass)));
    }

    #[test]
    fn test_parse_shapes() {
        let (registry, _) = registry();
        let list = registry
            .parse_declarations(&json!([
                ["sass", { "cssModules": true }],
                ["sass", ["phase-production-build"]],
                ["sass", { "a": 1 }, "!phase-development-server"],
                ["sass", null],
            ]))
            .unwrap();

        assert!(matches!(&list[0], Declaration::WithConfig(_, c) if c["cssModules"] == json!(true)));
        assert!(
            matches!(&list[1], Declaration::WithPhases(_, p) if *p == PhaseSet::from(["phase-production-build"]))
        );
        assert!(
            matches!(&list[2], Declaration::Full(_, _, p) if *p == PhaseSet::from("!phase-development-server"))
        );
        assert!(matches!(&list[3], Declaration::WithConfig(_, c) if c.is_empty()));
    }

    #[test]
    fn test_parse_unknown_name_is_raw() {
        let (registry, _) = registry();

        let declaration = registry
            .parse_declaration(0, &json!(["something", "weird"]))
            .unwrap();

        assert!(matches!(&declaration, Declaration::WithConfig(Plugin::Raw(_), c) if c.is_empty()));
    }

    #[test]
    fn test_parse_object_as_plugin() {
        let (registry, _) = registry();

        let declaration = registry.parse_declaration(0, &json!({ "a": 1 })).unwrap();

        assert!(matches!(declaration, Declaration::Bare(Plugin::Config(_))));
    }

    #[test]
    fn test_parse_invalid_phases() {
        let (registry, _) = registry();

        let err = registry
            .parse_declarations(&json!(["sass", ["sass", {}, 42]]))
            .unwrap_err();

        assert_eq!(err, DeclarationError::InvalidPhases { index: 1 });
    }

    #[test]
    fn test_parse_not_a_list() {
        let (registry, _) = registry();
        let err = registry.parse_declarations(&json!({ "sass": {} })).unwrap_err();
        assert_eq!(err, DeclarationError::NotAList("object"));
    }
}
