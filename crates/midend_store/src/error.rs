//! Error types for the store.

use midend_core::ConfigError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while assembling or querying a store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Invalid configuration of a reducer, schema or action.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Two mods share a name.
    #[error("mod {0:?} is declared more than once")]
    DuplicateMod(String),

    /// No mod with this name.
    #[error("unknown mod {0:?}")]
    UnknownMod(String),

    /// The mod has no action with this name.
    #[error("mod {module:?} has no action {action:?}")]
    UnknownAction {
        /// Mod name.
        module: String,
        /// Action name.
        action: String,
    },

    /// The mod has no selector with this name.
    #[error("mod {module:?} has no selector {selector:?}")]
    UnknownSelector {
        /// Mod name.
        module: String,
        /// Selector name.
        selector: String,
    },

    /// No state branch with this name.
    #[error("unknown state branch {0:?}")]
    UnknownBranch(String),

    /// The branch holds a different state type than requested.
    #[error("state branch {branch:?} is not a {expected}")]
    BranchType {
        /// Branch name.
        branch: String,
        /// Requested type name.
        expected: &'static str,
    },

    /// A mod initializer failed.
    #[error("initializer of mod {module:?} failed: {message}")]
    Initializer {
        /// Mod name.
        module: String,
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Creates an unknown action error.
    pub fn unknown_action(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self::UnknownAction {
            module: module.into(),
            action: action.into(),
        }
    }

    /// Creates an unknown selector error.
    pub fn unknown_selector(module: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::UnknownSelector {
            module: module.into(),
            selector: selector.into(),
        }
    }

    /// Creates an initializer error.
    pub fn initializer(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Initializer {
            module: module.into(),
            message: message.into(),
        }
    }
}
