//! # Midend Core
//!
//! Operation lifecycle dispatcher and entity/index cache for client state.
//!
//! This crate provides:
//! - Operation type descriptors and suffix-based phase classification
//! - Simple and async actions; async actions emit BEGIN, then SUCCESS or FAIL
//! - A normalization adapter turning nested results into entity dictionaries
//! - The entity/index cache reducer and a handler-table reducer
//!
//! ## Usage
//!
//! ```
//! use midend_core::{create_types, EntityReducer, Reducer, Record, TypeSpec};
//! use midend_value::Value;
//!
//! let types = create_types(Some("dogs"), [("fetch", TypeSpec::Async)]).unwrap();
//! let fetch = types.async_type("fetch").unwrap();
//!
//! let reducer = EntityReducer::default();
//! let state = reducer.initial_state();
//! let state = reducer.reduce(&state, &Record::begin(fetch, Value::Null, Some("dogs".into())));
//! assert_eq!(state.indexes.get("dogs").unwrap().in_flight, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
mod config;
mod error;
mod record;
pub mod reducer;
pub mod schema;
mod types;

pub use action::{Action, AsyncAction, Dispatch, Dispatchable, Outcome, SimpleAction, Thunk};
pub use config::{
    default_transform, handler, sync_handler, transform, After, AsyncConfig, Completion,
    EntityReducerConfig, Handler, IndexBy, IndexPolicy, MergePolicy, ReducerConfig,
    SimpleConfig, Transform, TOP_FLAG,
};
pub use error::{ConfigError, ConfigResult, OperationError, Rejection};
pub use record::{is_normalized, Meta, Record, ENTITIES_KEY, RESULT_KEY};
pub use reducer::{CacheState, Entities, EntityReducer, IndexEntry, Indexes, Reducer, SimpleReducer};
pub use types::{
    create_types, is_begin, is_fail, is_of_base, is_success, AsyncType, OperationType, Phase,
    TypeRegistry, TypeSpec, BEGIN_SUFFIX, FAIL_SUFFIX, SUCCESS_SUFFIX,
};
