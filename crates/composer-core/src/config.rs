//! Configuration mapping threaded through a composition pass.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The configuration object every plugin receives and returns.
///
/// Keys keep their insertion order, so merges behave like object spread:
/// an existing key keeps its position and takes the newer value.
pub type ConfigMap = Map<String, Value>;

/// Name of the field a transformer may set to gate its own output.
pub const PHASES_KEY: &str = "phases";

/// Second argument handed to every transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeInfo {
    /// Always `true`; lets a plugin detect that it runs inside a composition.
    pub next_compose_plugins: bool,
    /// The active phase.
    pub phase: String,
}

impl ComposeInfo {
    /// Creates the info record for `phase`.
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            next_compose_plugins: true,
            phase: phase.into(),
        }
    }
}

/// Returns `base` with every entry of `overlay` merged on top.
///
/// Only the top level is merged; nested mappings are replaced wholesale.
pub fn shallow_merge(mut base: ConfigMap, overlay: ConfigMap) -> ConfigMap {
    base.extend(overlay);
    base
}

/// Converts a JSON value into a mapping, or an empty mapping for non-objects.
pub fn to_config_map(value: Value) -> ConfigMap {
    match value {
        Value::Object(map) => map,
        _ => ConfigMap::new(),
    }
}

/// Short name of a JSON value's type, used in logs and errors.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
