//! Synchronous single-record actions.

use crate::config::{SimpleConfig, Transform};
use crate::record::Record;
use midend_value::Value;

/// Builds `{ type, payload: transform(args) }` records.
#[derive(Debug, Clone)]
pub struct SimpleAction {
    kind: String,
    config: SimpleConfig,
}

impl SimpleAction {
    /// Creates an action for a simple type.
    pub fn new(kind: impl Into<String>, config: SimpleConfig) -> Self {
        Self {
            kind: kind.into(),
            config,
        }
    }

    /// Creates an action with a custom transform.
    pub fn with_transform(kind: impl Into<String>, transform: Transform) -> Self {
        Self::new(kind, SimpleConfig::new().with_transform(transform))
    }

    /// The record type this action emits.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Builds the record for one call.
    pub fn invoke(&self, args: Vec<Value>) -> Record {
        Record::new(self.kind.clone(), (self.config.transform)(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::transform;
    use serde_json::json;

    #[test]
    fn default_transform_payloads() {
        let action = SimpleAction::new("X", SimpleConfig::default());

        let none = action.invoke(vec![]);
        assert_eq!(none.kind, "X");
        assert_eq!(none.payload, Value::Undefined);
        assert_eq!(none.meta, None);

        assert_eq!(action.invoke(vec![Value::Integer(1)]).payload, Value::Integer(1));
        assert_eq!(
            action.invoke(vec![Value::from(json!([1]))]).payload,
            Value::from(json!([[1]]))
        );
        assert_eq!(
            action.invoke(vec![Value::Integer(1), Value::Integer(2)]).payload,
            Value::from(json!([1, 2]))
        );
    }

    #[test]
    fn custom_transform() {
        let action = SimpleAction::with_transform(
            "SET",
            transform(|args| Value::map([("count", Value::from(args.len() as i64))])),
        );
        let record = action.invoke(vec![Value::Null, Value::Null]);
        assert_eq!(record.payload.get("count"), Some(&Value::Integer(2)));
        assert_eq!(action.kind(), "SET");
    }
}
