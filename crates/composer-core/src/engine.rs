//! The composition engine.
//!
//! [`compose_plugins`] folds a declaration list over an initial configuration.
//! For every declaration, in order:
//!
//! 1. Skip it when the caller gated it to phases that do not include the
//!    active one.
//! 2. Resolve optional plugins.
//! 3. Resolve phase-scoped overrides in the plugin config.
//! 4. Call the plugin with the accumulated configuration plus its plugin
//!    config, or take a mapping plugin as the result directly.
//! 5. If the caller did not gate the plugin but the result carries its own
//!    `phases` field, drop the result when that gate excludes the active
//!    phase.
//! 6. Strip `phases` and merge the result into the accumulated configuration.
//!
//! The initial configuration is never mutated, and every plugin works on a
//! fresh copy.

use serde_json::Value;
use tracing::{debug, debug_span, trace};

use crate::config::{ComposeInfo, ConfigMap, PHASES_KEY, shallow_merge};
use crate::declaration::{Declaration, ParsedPlugin, parse_plugin_config};
use crate::error::{ComposeError, ComposeResult};
use crate::optional::resolve_optional_plugin;
use crate::phase::{PhaseSet, is_in_current_phase, merge_phase_configuration};
use crate::plugin::Plugin;

/// Composes `declarations` over `initial_config` for `phase`.
///
/// # Errors
///
/// Returns [`ComposeError::IncompatiblePlugin`] as soon as a participating
/// declaration resolves to something that is neither a transformer nor a
/// mapping. Remaining declarations are not run.
///
/// # Example
///
/// ```rust
/// use composer_core::{ComposeInfo, ConfigMap, Plugin, compose_plugins, declarations, phases};
/// use composer_core::phase::{PHASE_DEVELOPMENT_SERVER, PHASE_PRODUCTION_BUILD};
/// use serde_json::json;
///
/// let images = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
///     config.insert("images".into(), json!(true));
///     config
/// });
/// let analyzer = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
///     config.insert("analyzer".into(), json!(true));
///     config
/// });
///
/// let config = compose_plugins(
///     PHASE_DEVELOPMENT_SERVER,
///     &declarations![images, (analyzer, phases([PHASE_PRODUCTION_BUILD]))],
///     &ConfigMap::new(),
/// )?;
///
/// assert_eq!(config.get("images"), Some(&json!(true)));
/// assert!(!config.contains_key("analyzer"));
/// # Ok::<(), composer_core::ComposeError>(())
/// ```
pub fn compose_plugins(
    phase: &str,
    declarations: &[Declaration],
    initial_config: &ConfigMap,
) -> ComposeResult<ConfigMap> {
    let _span = debug_span!("compose", phase = %phase, plugins = declarations.len()).entered();

    let info = ComposeInfo::new(phase);
    let mut config = initial_config.clone();

    for (index, declaration) in declarations.iter().enumerate() {
        let ParsedPlugin {
            plugin_function,
            plugin_config,
            phases,
        } = parse_plugin_config(declaration);

        if let Some(phases) = &phases
            && !is_in_current_phase(phase, phases)
        {
            debug!(plugin = index, phases = %phases, "Skipping plugin outside the active phase");
            continue;
        }

        let plugin = match plugin_function {
            Plugin::Optional(optional) => {
                debug!(plugin = index, "Resolving optional plugin");
                resolve_optional_plugin(&optional)
            }
            other => other,
        };

        let merged_plugin_config = merge_phase_configuration(phase, &plugin_config);
        let input = shallow_merge(config.clone(), merged_plugin_config);

        let kind = plugin.kind();
        let mut updated = match plugin {
            Plugin::Transform(transformer) => {
                trace!(plugin = index, "Invoking plugin");
                transformer.transform(input, &info)
            }
            Plugin::Config(mapping) => (*mapping).clone(),
            Plugin::Raw(value) => match &*value {
                Value::Object(mapping) => mapping.clone(),
                _ => return Err(ComposeError::incompatible(index, kind)),
            },
            // A factory must yield a usable plugin, not another factory.
            Plugin::Optional(_) => return Err(ComposeError::incompatible(index, kind)),
        };

        let own_phases = updated.shift_remove(PHASES_KEY);

        if phases.is_none()
            && let Some(own_phases) = own_phases.as_ref().and_then(self_declared_phases)
            && !is_in_current_phase(phase, &own_phases)
        {
            debug!(
                plugin = index,
                phases = %own_phases,
                "Discarding plugin output outside its self-declared phases"
            );
            continue;
        }

        config = shallow_merge(config, updated);
    }

    Ok(config)
}

/// Reads a self-declared phase gate from a plugin's output.
///
/// Empty, `null` and `false` values do not gate. Array entries that are not
/// strings are stringified, with `null` becoming empty, before matching.
fn self_declared_phases(value: &Value) -> Option<PhaseSet> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => Some(PhaseSet::List(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect(),
        )),
        other => PhaseSet::from_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::to_config_map;
    use crate::declarations;
    use crate::optional::mark_optional;
    use crate::phase::{
        PHASE_DEVELOPMENT_SERVER, PHASE_PRODUCTION_BUILD, PHASE_PRODUCTION_SERVER, phases,
    };
    use crate::registry::PluginRegistry;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// A plugin that sets `key: true` and counts its invocations.
    fn flag_plugin(key: &'static str) -> (Plugin, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let plugin = Plugin::transformer(move |mut config: ConfigMap, _: &ComposeInfo| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            config.insert(key.into(), json!(true));
            config
        });
        (plugin, calls)
    }

    fn initial() -> ConfigMap {
        to_config_map(json!({ "initial": "config" }))
    }

    #[test]
    fn test_compose_without_plugins_copies_initial() {
        let initial = initial();
        let config = compose_plugins(PHASE_DEVELOPMENT_SERVER, &[], &initial).unwrap();
        assert_eq!(config, initial);
    }

    #[test]
    fn test_compose_runs_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let recorder = |name: &'static str| {
            let order = Arc::clone(&order);
            Plugin::transformer(move |mut config: ConfigMap, _: &ComposeInfo| {
                let mut seen = order.lock().unwrap();
                seen.push(name);
                config.insert("seen".into(), json!(*seen));
                config
            })
        };
        let first = recorder("first");
        let second = recorder("second");

        let config = compose_plugins(
            PHASE_DEVELOPMENT_SERVER,
            &declarations![first, second],
            &ConfigMap::new(),
        )
        .unwrap();

        assert_eq!(config["seen"], json!(["first", "second"]));
    }

    #[test]
    fn test_compose_phase_restrictions() {
        let (plugin1, calls1) = flag_plugin("plugin1");
        let (plugin2, calls2) = flag_plugin("plugin2");
        let (plugin3, calls3) = flag_plugin("plugin3");

        let config = compose_plugins(
            PHASE_DEVELOPMENT_SERVER,
            &declarations![
                (plugin1, phases([PHASE_DEVELOPMENT_SERVER, PHASE_PRODUCTION_BUILD])),
                (plugin2, phases([PHASE_PRODUCTION_BUILD])),
                (plugin3, phases(["!", PHASE_PRODUCTION_SERVER])),
            ],
            &initial(),
        )
        .unwrap();

        assert_eq!(
            Value::Object(config),
            json!({ "initial": "config", "plugin1": true, "plugin3": true })
        );
        assert_eq!(calls1.load(Ordering::SeqCst), 1);
        assert_eq!(calls2.load(Ordering::SeqCst), 0);
        assert_eq!(calls3.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_compose_merges_plugin_config() {
        let seen = Arc::new(Mutex::new(ConfigMap::new()));
        let seen_clone = Arc::clone(&seen);
        let plugin = Plugin::transformer(move |config: ConfigMap, _: &ComposeInfo| {
            *seen_clone.lock().unwrap() = config.clone();
            config
        });

        let plugin_config = to_config_map(json!({
            "initial": "overridden",
            "a": 1,
            (PHASE_DEVELOPMENT_SERVER): { "dev": true },
            (PHASE_PRODUCTION_BUILD): { "prod": true },
        }));

        let config = compose_plugins(
            PHASE_DEVELOPMENT_SERVER,
            &declarations![(plugin, plugin_config)],
            &initial(),
        )
        .unwrap();

        let expected = json!({ "initial": "overridden", "a": 1, "dev": true });
        assert_eq!(Value::Object(seen.lock().unwrap().clone()), expected);
        assert_eq!(Value::Object(config), expected);
    }

    #[test]
    fn test_compose_passes_info() {
        let plugin = Plugin::transformer(|mut config: ConfigMap, info: &ComposeInfo| {
            config.insert("info".into(), serde_json::to_value(info).unwrap());
            config
        });

        let config =
            compose_plugins(PHASE_PRODUCTION_BUILD, &declarations![plugin], &ConfigMap::new())
                .unwrap();

        assert_eq!(
            config["info"],
            json!({ "nextComposePlugins": true, "phase": PHASE_PRODUCTION_BUILD })
        );
    }

    #[test]
    fn test_compose_object_as_plugin() {
        let config = compose_plugins(
            PHASE_DEVELOPMENT_SERVER,
            &declarations![Plugin::from(json!({ "fromObject": true }))],
            &initial(),
        )
        .unwrap();

        assert_eq!(
            Value::Object(config),
            json!({ "initial": "config", "fromObject": true })
        );
    }

    #[test]
    fn test_compose_incompatible_plugin() {
        let (after, calls) = flag_plugin("after");
        let weird = Declaration::from((
            Plugin::from(json!("something")),
            to_config_map(json!("weird")),
        ));

        let err = compose_plugins(
            PHASE_DEVELOPMENT_SERVER,
            &[weird, Declaration::from(after)],
            &ConfigMap::new(),
        )
        .unwrap_err();

        assert_eq!(err, ComposeError::incompatible(0, "string"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_compose_incompatible_plugin_from_data() {
        let declarations = PluginRegistry::new()
            .parse_declarations(&json!([["something", "weird"]]))
            .unwrap();

        let result = compose_plugins(PHASE_DEVELOPMENT_SERVER, &declarations, &ConfigMap::new());

        assert!(matches!(result, Err(ComposeError::IncompatiblePlugin { index: 0, .. })));
    }

    #[test]
    fn test_gated_incompatible_plugin_is_skipped() {
        let config = compose_plugins(
            PHASE_DEVELOPMENT_SERVER,
            &declarations![(Plugin::from(json!(42)), phases([PHASE_PRODUCTION_BUILD]))],
            &initial(),
        )
        .unwrap();

        assert_eq!(config, initial());
    }

    #[test]
    fn test_compose_resolves_optional_plugin_once() {
        let resolutions = Arc::new(AtomicUsize::new(0));
        let resolutions_clone = Arc::clone(&resolutions);
        let (inner, calls) = flag_plugin("optional");

        let optional = mark_optional(move || {
            resolutions_clone.fetch_add(1, Ordering::SeqCst);
            inner.clone()
        });

        let config = compose_plugins(
            PHASE_DEVELOPMENT_SERVER,
            &declarations![optional],
            &ConfigMap::new(),
        )
        .unwrap();

        assert_eq!(config["optional"], json!(true));
        assert_eq!(resolutions.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_compose_does_not_resolve_gated_optional() {
        let resolutions = Arc::new(AtomicUsize::new(0));
        let resolutions_clone = Arc::clone(&resolutions);

        let optional = mark_optional(move || {
            resolutions_clone.fetch_add(1, Ordering::SeqCst);
            Plugin::from(json!({ "optional": true }))
        });

        let config = compose_plugins(
            PHASE_DEVELOPMENT_SERVER,
            &declarations![(optional, phases([PHASE_PRODUCTION_BUILD]))],
            &ConfigMap::new(),
        )
        .unwrap();

        assert!(config.is_empty());
        assert_eq!(resolutions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_optional_resolving_to_optional_is_incompatible() {
        let nested = mark_optional(|| mark_optional(|| Plugin::from(json!({}))));

        let err = compose_plugins(PHASE_DEVELOPMENT_SERVER, &declarations![nested], &ConfigMap::new())
            .unwrap_err();

        assert_eq!(err, ComposeError::incompatible(0, "optional plugin"));
    }

    #[test]
    fn test_self_declared_phases_discard_output() {
        let plugin = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
            config.insert("selfGated".into(), json!(true));
            config.insert(PHASES_KEY.into(), json!([PHASE_DEVELOPMENT_SERVER]));
            config
        });

        let config = compose_plugins(
            PHASE_PRODUCTION_BUILD,
            &declarations![plugin],
            &initial(),
        )
        .unwrap();

        assert_eq!(config, initial());
    }

    #[test]
    fn test_self_declared_phases_are_stripped() {
        let plugin = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
            config.insert("selfGated".into(), json!(true));
            config.insert(PHASES_KEY.into(), json!([PHASE_DEVELOPMENT_SERVER]));
            config
        });
        let observer = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
            let saw = config.contains_key(PHASES_KEY);
            config.insert("observerSawPhases".into(), json!(saw));
            config
        });

        let config = compose_plugins(
            PHASE_DEVELOPMENT_SERVER,
            &declarations![plugin, observer],
            &ConfigMap::new(),
        )
        .unwrap();

        assert_eq!(
            Value::Object(config),
            json!({ "selfGated": true, "observerSawPhases": false })
        );
    }

    #[test]
    fn test_caller_phases_override_self_declared() {
        let plugin = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
            config.insert("selfGated".into(), json!(true));
            config.insert(PHASES_KEY.into(), json!([PHASE_DEVELOPMENT_SERVER]));
            config
        });

        let config = compose_plugins(
            PHASE_PRODUCTION_BUILD,
            &declarations![(plugin, phases([PHASE_PRODUCTION_BUILD]))],
            &ConfigMap::new(),
        )
        .unwrap();

        assert_eq!(Value::Object(config), json!({ "selfGated": true }));
    }

    #[test]
    fn test_falsy_self_declared_phases_do_not_gate() {
        let plugin = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
            config.insert("ran".into(), json!(true));
            config.insert(PHASES_KEY.into(), Value::Null);
            config
        });

        let config =
            compose_plugins(PHASE_PRODUCTION_BUILD, &declarations![plugin], &ConfigMap::new())
                .unwrap();

        assert_eq!(Value::Object(config), json!({ "ran": true }));
    }

    #[test]
    fn test_initial_config_is_not_mutated() {
        let initial = initial();
        let snapshot = initial.clone();
        let plugin = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
            config.insert("initial".into(), json!("changed"));
            config
        });

        let config =
            compose_plugins(PHASE_DEVELOPMENT_SERVER, &declarations![plugin], &initial).unwrap();

        assert_eq!(initial, snapshot);
        assert_eq!(config["initial"], json!("changed"));
    }

    #[test]
    fn test_removed_keys_survive_in_accumulated_config() {
        let plugin = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
            config.shift_remove("initial");
            config
        });

        let config =
            compose_plugins(PHASE_DEVELOPMENT_SERVER, &declarations![plugin], &initial()).unwrap();

        assert_eq!(config, initial());
    }

    #[test]
    fn test_stripping_phases_keeps_key_order() {
        let plugin = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
            config.insert(PHASES_KEY.into(), json!([PHASE_DEVELOPMENT_SERVER]));
            config.insert("a".into(), json!(1));
            config.insert("b".into(), json!(2));
            config.insert("c".into(), json!(3));
            config
        });

        let config =
            compose_plugins(PHASE_DEVELOPMENT_SERVER, &declarations![plugin], &ConfigMap::new())
                .unwrap();

        let keys: Vec<&str> = config.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_self_declared_phases_with_non_string_entries_still_gate() {
        let plugin = Plugin::transformer(|mut config: ConfigMap, _: &ComposeInfo| {
            config.insert("ran".into(), json!(true));
            config.insert(PHASES_KEY.into(), json!([PHASE_DEVELOPMENT_SERVER, 5]));
            config
        });

        let build = compose_plugins(
            PHASE_PRODUCTION_BUILD,
            &declarations![plugin.clone()],
            &ConfigMap::new(),
        )
        .unwrap();
        assert!(build.is_empty());

        let dev =
            compose_plugins(PHASE_DEVELOPMENT_SERVER, &declarations![plugin], &ConfigMap::new())
                .unwrap();
        assert_eq!(Value::Object(dev), json!({ "ran": true }));
    }
}
