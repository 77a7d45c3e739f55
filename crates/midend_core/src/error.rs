//! Error types for midend core.

use midend_value::Value;
use thiserror::Error;

/// Result type for setup-time operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Setup-time configuration errors.
///
/// These indicate programmer error (a bad handler table, a relation naming an
/// entity type nobody declared) and are surfaced before any record flows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A handler table key is the literal string `"undefined"`.
    #[error("reducer has an undefined handler; ensure that all operation types used in this reducer exist")]
    UndefinedHandler,

    /// A handler table key is empty.
    #[error("reducer has a handler registered under an empty type")]
    EmptyHandlerKey,

    /// Two handlers were registered for the same type.
    #[error("reducer has more than one handler for type {key:?}")]
    DuplicateHandler {
        /// The duplicated type string.
        key: String,
    },

    /// A handler style does not match the reducer mode.
    #[error("handler for {key:?} does not match the reducer mode (mutable = {mutable})")]
    HandlerStyle {
        /// The type string of the offending handler.
        key: String,
        /// Whether the reducer was configured as mutable.
        mutable: bool,
    },

    /// Two operation type names collide after prefixing.
    #[error("operation type {name:?} resolves to {value:?}, which is already defined")]
    DuplicateType {
        /// Registry name of the colliding entry.
        name: String,
        /// The colliding type string.
        value: String,
    },

    /// An operation type name is not usable.
    #[error("invalid operation type name {name:?}: {reason}")]
    InvalidTypeName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two entity types share a key.
    #[error("entity type {key:?} is declared more than once")]
    DuplicateEntity {
        /// The duplicated entity key.
        key: String,
    },

    /// A relation references an entity type that was never declared.
    #[error("entity type {entity:?} referenced by {referenced_by:?} is not declared")]
    UnknownEntity {
        /// The missing entity key.
        entity: String,
        /// The entity whose relations reference it.
        referenced_by: String,
    },
}

impl ConfigError {
    /// Creates an invalid type name error.
    pub fn invalid_type_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTypeName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown entity error.
    pub fn unknown_entity(entity: impl Into<String>, referenced_by: impl Into<String>) -> Self {
        Self::UnknownEntity {
            entity: entity.into(),
            referenced_by: referenced_by.into(),
        }
    }
}

/// A normalized operation failure.
///
/// Every rejection of an operation handler ends up in this shape: a message
/// plus, when the rejection was not already an error, the rejected value
/// itself under `data`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct OperationError {
    /// Human-readable message.
    pub message: String,
    /// The original rejected value, when it was not an error already.
    pub data: Option<Value>,
}

impl OperationError {
    /// Creates an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// Wraps an arbitrary rejected value.
    ///
    /// The message is taken from the value's `message` field when it is
    /// text, and is empty otherwise.
    pub fn from_value(value: Value) -> Self {
        let message = value
            .get("message")
            .and_then(Value::as_text)
            .unwrap_or_default()
            .to_string();
        Self {
            message,
            data: Some(value),
        }
    }

    /// Renders this error as a record payload: `{ message, data? }`.
    pub fn to_value(&self) -> Value {
        let mut fields = vec![("message", Value::from(self.message.as_str()))];
        if let Some(data) = &self.data {
            fields.push(("data", data.clone()));
        }
        Value::map(fields)
    }
}

/// What an operation handler may reject with.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// An error that already has a message; passed through untouched.
    Error(OperationError),
    /// Any other value; wrapped on normalization.
    Value(Value),
}

impl Rejection {
    /// Wraps any standard error, keeping its display text as the message.
    pub fn from_error(error: impl std::error::Error) -> Self {
        Self::Error(OperationError::new(error.to_string()))
    }

    /// Normalizes this rejection into the uniform error shape.
    pub fn into_error(self) -> OperationError {
        match self {
            Rejection::Error(error) => error,
            Rejection::Value(value) => OperationError::from_value(value),
        }
    }
}

impl From<OperationError> for Rejection {
    fn from(error: OperationError) -> Self {
        Rejection::Error(error)
    }
}

impl From<Value> for Rejection {
    fn from(value: Value) -> Self {
        Rejection::Value(value)
    }
}
