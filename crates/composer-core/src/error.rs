//! Error types for plugin composition.

use thiserror::Error;

/// Errors that abort a composition pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// A declaration resolved to a value that is neither a transformer nor a
    /// configuration mapping.
    #[error("incompatible plugin at position {index}: expected a transformer or a mapping, got {kind}")]
    IncompatiblePlugin {
        /// Position of the offending declaration in the list.
        index: usize,
        /// Short description of what was found instead.
        kind: &'static str,
    },
}

impl ComposeError {
    /// Creates an incompatible plugin error.
    pub fn incompatible(index: usize, kind: &'static str) -> Self {
        Self::IncompatiblePlugin { index, kind }
    }
}

/// Result type for composition.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors raised while reading declarations out of JSON data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// The declaration list itself is not a JSON array.
    #[error("plugin declarations must be a list, got {0}")]
    NotAList(&'static str),

    /// The phase slot holds something other than a string or a list of strings.
    #[error("invalid phase set in declaration {index}: expected a string or a list of strings")]
    InvalidPhases {
        /// Position of the offending declaration in the list.
        index: usize,
    },
}

/// Result type for declaration parsing.
pub type DeclarationResult<T> = Result<T, DeclarationError>;
