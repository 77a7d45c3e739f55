//! Normalization adapter.
//!
//! Entity types are declared up front and collected into a [`SchemaSet`],
//! which resolves and validates every relation once. A [`Schema`] describes
//! where entities sit inside a value; normalizing replaces them with their
//! ids and files them into per-type dictionaries.
//!
//! # Usage
//!
//! ```
//! use midend_core::schema::{EntityType, Schema, SchemaSet};
//! use midend_value::Value;
//!
//! let set = SchemaSet::builder()
//!     .entity(EntityType::new("dogs"))
//!     .build()
//!     .unwrap();
//!
//! let dog = Value::map([("id", Value::Integer(20)), ("name", Value::from("Ren"))]);
//! let normalized = set.normalize(&dog, &Schema::entity("dogs"));
//! assert_eq!(normalized.result, Value::Integer(20));
//! ```

mod entity;
mod normalize;
mod set;

pub use entity::{EntityType, Schema, DEFAULT_ID_ATTRIBUTE};
pub use normalize::{EntitySource, NormalizedPayload};
pub use set::{BoundSchema, Normalize, SchemaSet, SchemaSetBuilder};
