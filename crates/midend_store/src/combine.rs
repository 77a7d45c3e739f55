//! Combining named reducers of different state types.

use crate::error::{StoreError, StoreResult};
use midend_core::{Reducer, Record};
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type BranchState = Arc<dyn Any + Send + Sync>;

/// A reducer with its state type erased.
pub(crate) trait ErasedReducer: Send + Sync {
    fn initial(&self) -> BranchState;
    fn reduce(&self, state: &BranchState, record: &Record) -> BranchState;
}

struct Branch<R>(R);

impl<R: Reducer> ErasedReducer for Branch<R> {
    fn initial(&self) -> BranchState {
        Arc::new(self.0.initial_state())
    }

    fn reduce(&self, state: &BranchState, record: &Record) -> BranchState {
        match state.downcast_ref::<R::State>() {
            Some(current) => Arc::new(self.0.reduce(current, record)),
            None => Arc::clone(state),
        }
    }
}

/// Boxes a reducer for storage next to reducers of other state types.
pub(crate) fn erase<R: Reducer>(reducer: R) -> Box<dyn ErasedReducer> {
    Box::new(Branch(reducer))
}

/// State of a [`CombinedReducer`]: one value per branch.
#[derive(Clone, Default)]
pub struct RootState {
    branches: Arc<BTreeMap<String, BranchState>>,
}

impl RootState {
    /// Returns the state of a branch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownBranch`] if there is no such branch and
    /// [`StoreError::BranchType`] if it holds a different type.
    pub fn branch<S: Any>(&self, name: &str) -> StoreResult<&S> {
        let state = self
            .branches
            .get(name)
            .ok_or_else(|| StoreError::UnknownBranch(name.to_string()))?;
        state.downcast_ref::<S>().ok_or_else(|| StoreError::BranchType {
            branch: name.to_string(),
            expected: type_name::<S>(),
        })
    }

    /// Returns the state of a branch, if it exists and has type `S`.
    pub fn get<S: Any>(&self, name: &str) -> Option<&S> {
        self.branches.get(name).and_then(|s| s.downcast_ref::<S>())
    }

    /// Branch names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.branches.keys().map(String::as_str)
    }

    /// Returns true if both values share the same branch for `name`.
    pub fn branch_ptr_eq(&self, other: &Self, name: &str) -> bool {
        match (self.branches.get(name), other.branches.get(name)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for RootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootState")
            .field("branches", &self.branches.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Runs each record through every branch reducer.
#[derive(Default)]
pub struct CombinedReducer {
    branches: BTreeMap<String, Box<dyn ErasedReducer>>,
}

impl CombinedReducer {
    /// Creates a reducer with no branches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a branch.
    #[must_use]
    pub fn branch<R: Reducer>(mut self, name: impl Into<String>, reducer: R) -> Self {
        self.branches.insert(name.into(), erase(reducer));
        self
    }

    pub(crate) fn insert_erased(&mut self, name: String, reducer: Box<dyn ErasedReducer>) {
        self.branches.insert(name, reducer);
    }

    /// Number of branches.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Returns true if there are no branches.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

impl Reducer for CombinedReducer {
    type State = RootState;

    fn initial_state(&self) -> RootState {
        RootState {
            branches: Arc::new(
                self.branches
                    .iter()
                    .map(|(name, reducer)| (name.clone(), reducer.initial()))
                    .collect(),
            ),
        }
    }

    fn reduce(&self, state: &RootState, record: &Record) -> RootState {
        let branches = self
            .branches
            .iter()
            .filter_map(|(name, reducer)| {
                state
                    .branches
                    .get(name)
                    .map(|current| (name.clone(), reducer.reduce(current, record)))
            })
            .collect();
        RootState {
            branches: Arc::new(branches),
        }
    }
}

impl fmt::Debug for CombinedReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("branches", &self.branches.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midend_core::{CacheState, EntityReducer, SimpleReducer};
    use midend_value::Value;

    fn counter() -> SimpleReducer<i64> {
        SimpleReducer::builder(0_i64)
            .on("INC", |s: &i64, _: &Record| s + 1)
            .build()
            .unwrap()
    }

    #[test]
    fn branches_reduce_independently() {
        let reducer = CombinedReducer::new()
            .branch("counter", counter())
            .branch("model", EntityReducer::default());

        let state = reducer.initial_state();
        assert_eq!(state.names().collect::<Vec<_>>(), vec!["counter", "model"]);

        let state = reducer.reduce(&state, &Record::new("INC", Value::Null));
        assert_eq!(*state.branch::<i64>("counter").unwrap(), 1);
        assert!(state.branch::<CacheState>("model").unwrap().indexes.is_empty());
    }

    #[test]
    fn typed_access_errors() {
        let reducer = CombinedReducer::new().branch("counter", counter());
        let state = reducer.initial_state();

        assert_eq!(
            state.branch::<i64>("missing").unwrap_err(),
            StoreError::UnknownBranch("missing".into())
        );
        assert!(matches!(
            state.branch::<String>("counter").unwrap_err(),
            StoreError::BranchType { ref branch, .. } if branch == "counter"
        ));
        assert!(state.get::<String>("counter").is_none());
    }
}
