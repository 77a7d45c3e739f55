//! # Midend Value
//!
//! Dynamic value type shared by every midend crate.
//!
//! Payloads, originals, results and entity fields are all [`Value`]s. The
//! type mirrors JSON with two additions:
//! - `Undefined`, the absent sentinel, distinct from `Null`
//! - JavaScript-style truthiness via [`Value::is_truthy`]
//!
//! ## Usage
//!
//! ```
//! use midend_value::Value;
//!
//! let dog = Value::from(serde_json::json!({ "id": 20, "name": "Ren" }));
//! assert_eq!(dog.get("id"), Some(&Value::Integer(20)));
//! assert!(!Value::Undefined.is_truthy());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod value;

pub use value::{Map, Value};
