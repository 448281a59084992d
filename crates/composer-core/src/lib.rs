//! Composer Core - plugin composition for layered configuration.
//!
//! This crate provides:
//! - Phase matching and phase-scoped configuration (`phase`)
//! - Lazily resolved plugins (`optional`)
//! - Plugin declarations and their parser (`declaration`)
//! - Named plugins and data-driven declaration lists (`registry`)
//! - The composition engine (`engine`)
//!
//! # Data flow
//!
//! ```text
//! declarations ──▶ parse ──▶ phase gate ──▶ resolve optional ──▶ plugin ──▶ merge ──▶ config
//!                                                                   ▲                    │
//!                                                                   └────────────────────┘
//! ```
//!
//! Plugins run strictly in list order, each seeing the merged output of
//! every plugin before it.

pub mod config;
pub mod declaration;
pub mod engine;
pub mod error;
pub mod optional;
pub mod phase;
pub mod plugin;
pub mod registry;

// Re-exports
pub use config::{ComposeInfo, ConfigMap, PHASES_KEY, shallow_merge, to_config_map};
pub use declaration::{Declaration, ParsedPlugin, needs_phases, parse_plugin_config};
pub use engine::compose_plugins;
pub use error::{ComposeError, ComposeResult, DeclarationError, DeclarationResult};
pub use optional::{OptionalPlugin, is_optional, mark_optional, resolve_optional_plugin};
pub use phase::{PhaseSet, is_in_current_phase, merge_phase_configuration, phases};
pub use plugin::{Plugin, Transformer};
pub use registry::PluginRegistry;
