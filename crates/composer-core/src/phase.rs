//! Phase matching and phase-scoped configuration.
//!
//! A phase is an opaque string naming the current build or runtime mode.
//! Plugins and configuration entries can be restricted to a set of phases,
//! optionally negated with a leading `!`.
//!
//! # Matching is substring containment
//!
//! A phase set is flattened into one string (list entries are concatenated
//! without a separator) and the active phase matches when it occurs anywhere
//! inside that string. Phase names that are substrings of each other, or of
//! the concatenation of two other names, therefore match spuriously:
//!
//! ```rust
//! use composer_core::phase::{PhaseSet, is_in_current_phase};
//!
//! let set = PhaseSet::from(["ab", "c"]);
//! assert!(is_in_current_phase("bc", &set));
//! ```
//!
//! Existing callers rely on this, so it is kept as is.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::{ConfigMap, value_kind};

/// Static export.
pub const PHASE_EXPORT: &str = "phase-export";
/// Production build.
pub const PHASE_PRODUCTION_BUILD: &str = "phase-production-build";
/// Production server.
pub const PHASE_PRODUCTION_SERVER: &str = "phase-production-server";
/// Development server.
pub const PHASE_DEVELOPMENT_SERVER: &str = "phase-development-server";
/// Test runner.
pub const PHASE_TEST: &str = "phase-test";

/// Prefix marking a configuration key as phase-scoped.
pub const PHASE_PREFIX: &str = "phase-";
/// Prefix marking a configuration key as negated phase-scoped.
pub const NEGATED_PHASE_PREFIX: &str = "!phase-";

// ─── PhaseSet ─────────────────────────────────────────────────────────────────

/// A set of phases, given either as a list or as one concatenated string.
///
/// A leading `!` (as the first list entry or the first character of the
/// string) negates the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhaseSet {
    /// Phases as separate entries, e.g. `["!", "phase-production-server"]`.
    List(Vec<String>),
    /// Phases already joined, e.g. `"!phase-production-server"`.
    Joined(String),
}

impl PhaseSet {
    /// Flattens the set into the single string used for matching.
    pub fn normalized(&self) -> Cow<'_, str> {
        match self {
            Self::List(phases) => Cow::Owned(phases.concat()),
            Self::Joined(phases) => Cow::Borrowed(phases),
        }
    }

    /// Returns `true` if the set is negated.
    pub fn is_negated(&self) -> bool {
        self.normalized().starts_with('!')
    }

    /// Reads a phase set out of a JSON value.
    ///
    /// Accepts a string or an array of strings; anything else yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Joined(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            _ => None,
        }
    }
}

impl fmt::Display for PhaseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

impl From<&str> for PhaseSet {
    fn from(phases: &str) -> Self {
        Self::Joined(phases.to_owned())
    }
}

impl From<String> for PhaseSet {
    fn from(phases: String) -> Self {
        Self::Joined(phases)
    }
}

impl From<Vec<String>> for PhaseSet {
    fn from(phases: Vec<String>) -> Self {
        Self::List(phases)
    }
}

impl From<Vec<&str>> for PhaseSet {
    fn from(phases: Vec<&str>) -> Self {
        Self::List(phases.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PhaseSet {
    fn from(phases: [&str; N]) -> Self {
        Self::List(phases.iter().map(|p| (*p).to_owned()).collect())
    }
}

/// Shorthand for building a [`PhaseSet`] list.
pub fn phases<I, S>(phases: I) -> PhaseSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    PhaseSet::List(phases.into_iter().map(Into::into).collect())
}

// ─── Matching ─────────────────────────────────────────────────────────────────

/// Checks whether `current_phase` is selected by `phase_set`.
///
/// A negated set selects every phase that does *not* occur in it.
pub fn is_in_current_phase(current_phase: &str, phase_set: &PhaseSet) -> bool {
    let normalized = phase_set.normalized();
    let contained = normalized.contains(current_phase);

    if normalized.starts_with('!') {
        !contained
    } else {
        contained
    }
}

/// Returns `true` if `key` names a phase-scoped override.
pub fn is_phase_key(key: &str) -> bool {
    key.starts_with(PHASE_PREFIX) || key.starts_with(NEGATED_PHASE_PREFIX)
}

/// Resolves phase-scoped overrides in `config` for `current_phase`.
///
/// Plain keys are copied through. Each phase-scoped key whose phase set
/// matches has its sub-mapping shallow-merged into the result, in key order,
/// so later matching keys win. Overrides nested inside an override are
/// resolved the same way, so phase-scoped keys never appear in the output.
pub fn merge_phase_configuration(current_phase: &str, config: &ConfigMap) -> ConfigMap {
    let mut merged = ConfigMap::new();

    for (key, value) in config {
        if !is_phase_key(key) {
            merged.insert(key.clone(), value.clone());
            continue;
        }

        if !is_in_current_phase(current_phase, &PhaseSet::from(key.as_str())) {
            continue;
        }

        match value {
            Value::Object(overrides) => {
                merged.extend(merge_phase_configuration(current_phase, overrides));
            }
            other => {
                warn!(
                    key = %key,
                    kind = value_kind(other),
                    "Ignoring phase-scoped override that is not a mapping"
                );
            }
        }
    }

    merged
}
