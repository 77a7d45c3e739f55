//! # Midend Store
//!
//! State container for midend reducers.
//!
//! This crate provides:
//! - [`Store`]: holds the current state, runs middleware, applies the
//!   reducer and notifies subscribers; accepts records and thunks
//! - [`CombinedReducer`]: named branches of different state types
//! - [`MiddleEndBuilder`] / [`MiddleEnd`]: assembles feature mods into one
//!   store in two phases
//!
//! ## Usage
//!
//! ```
//! use midend_core::{AsyncAction, AsyncConfig, AsyncType, EntityReducer};
//! use midend_store::Store;
//! use midend_value::Value;
//!
//! let store = Store::new(EntityReducer::default());
//! let fetch = AsyncAction::new(AsyncType::new("fetch"), AsyncConfig::new().with_index(true));
//!
//! let pending = store.dispatch(fetch.invoke(vec![Value::Integer(1)])).into_pending().unwrap();
//! assert_eq!(store.state().indexes.get("fetch").unwrap().in_flight, 1);
//! # drop(pending);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod combine;
mod config;
mod error;
mod feed;
mod middle_end;
mod middleware;
mod store;

pub use combine::{CombinedReducer, RootState};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use feed::{Feed, StoreEvent};
pub use middle_end::{Initializer, MiddleEnd, MiddleEndBuilder, Mod, Mods, Selector};
pub use middleware::{ErrorLogger, Middleware, Next};
pub use store::{Dispatched, Store, StoreBuilder};
