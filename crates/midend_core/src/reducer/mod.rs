//! State-transition functions over lifecycle records.

mod entity;
mod simple;

pub use entity::{CacheState, Entities, EntityDictionary, EntityReducer, IndexEntry, Indexes};
pub use simple::{SimpleReducer, SimpleReducerBuilder};

use crate::record::Record;

/// A pure `(state, record) -> state` function with an initial state.
///
/// Implementations must be total: records they do not understand leave the
/// state unchanged. Returning a clone of the input state signals "no change"
/// and keeps shared structure intact.
pub trait Reducer: Send + Sync + 'static {
    /// The state this reducer maintains.
    type State: Clone + Send + Sync + 'static;

    /// The state before any record has been reduced.
    fn initial_state(&self) -> Self::State;

    /// Computes the state after `record`.
    fn reduce(&self, state: &Self::State, record: &Record) -> Self::State;
}
