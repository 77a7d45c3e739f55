//! Lifecycle records.

use crate::types::{AsyncType, Phase};
use midend_value::Value;
use serde::{Deserialize, Deserializer, Serialize};

/// Key of the reference part of a normalized payload.
pub const RESULT_KEY: &str = "result";
/// Key of the entity dictionaries of a normalized payload.
pub const ENTITIES_KEY: &str = "entities";

/// Record metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Fingerprint the record is indexed under, if any.
    #[serde(default)]
    pub index: Option<String>,
    /// Input that produced this completion.
    ///
    /// `Some(Value::Undefined)` means "present but absent-valued", which
    /// still overwrites an index entry's original. JSON has no undefined, so
    /// it serializes as `null` and reads back as `Some(Value::Null)`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub original: Option<Value>,
}

impl Meta {
    /// Metadata carrying only a fingerprint.
    pub fn indexed(index: Option<String>) -> Self {
        Self {
            index,
            original: None,
        }
    }

    /// Metadata carrying a fingerprint and the producing input.
    pub fn completed(index: Option<String>, original: Value) -> Self {
        Self {
            index,
            original: Some(original),
        }
    }
}

/// One emitted event: a phase of an operation, or any plain record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Type string.
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload.
    #[serde(default, skip_serializing_if = "Value::is_undefined")]
    pub payload: Value,
    /// Set on failure records.
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,
    /// Metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Record {
    /// Creates a plain record without metadata.
    pub fn new(kind: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
            error: false,
            meta: None,
        }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Marks the record as an error record.
    #[must_use]
    pub fn with_error(mut self) -> Self {
        self.error = true;
        self
    }

    /// BEGIN record of an async operation.
    pub fn begin(types: &AsyncType, payload: Value, index: Option<String>) -> Self {
        Self::new(types.begin.clone(), payload).with_meta(Meta::indexed(index))
    }

    /// SUCCESS record of an async operation.
    pub fn success(types: &AsyncType, payload: Value, original: Value, index: Option<String>) -> Self {
        Self::new(types.success.clone(), payload).with_meta(Meta::completed(index, original))
    }

    /// FAIL record of an async operation.
    pub fn fail(types: &AsyncType, payload: Value, original: Value, index: Option<String>) -> Self {
        Self::new(types.fail.clone(), payload)
            .with_error()
            .with_meta(Meta::completed(index, original))
    }

    /// The lifecycle phase of this record's type, if any.
    pub fn phase(&self) -> Option<Phase> {
        Phase::of(&self.kind)
    }

    /// The fingerprint, when present and non-empty.
    pub fn fingerprint(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|m| m.index.as_deref())
            .filter(|index| !index.is_empty())
    }

    /// The producing input, when the record explicitly carries one.
    pub fn original(&self) -> Option<&Value> {
        self.meta.as_ref().and_then(|m| m.original.as_ref())
    }

    /// Returns true if the payload is a normalized payload.
    pub fn has_normalized_payload(&self) -> bool {
        is_normalized(&self.payload)
    }
}

/// Returns true if `payload` has a `result` field and a truthy `entities` field.
pub fn is_normalized(payload: &Value) -> bool {
    payload.contains_key(RESULT_KEY) && payload.get(ENTITIES_KEY).is_some_and(Value::is_truthy)
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Any present `original`, `null` included, is kept as `Some`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}
