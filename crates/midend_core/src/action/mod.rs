//! Action constructors.
//!
//! A simple action turns call arguments into one record. An async action
//! turns call arguments into a [`Thunk`] that drives the BEGIN/SUCCESS/FAIL
//! lifecycle when a store runs it.

mod dispatch;
mod lifecycle;
mod simple;

pub use dispatch::{Dispatch, Dispatchable, Outcome, Thunk};
pub use lifecycle::{spread, AsyncAction};
pub use simple::SimpleAction;

use crate::config::{AsyncConfig, SimpleConfig};
use crate::types::OperationType;
use midend_value::Value;

/// Either kind of action, chosen by the operation type.
#[derive(Debug, Clone)]
pub enum Action {
    /// Synchronous, one record per call.
    Simple(SimpleAction),
    /// Asynchronous lifecycle.
    Async(AsyncAction),
}

impl Action {
    /// Creates an action from an operation type.
    ///
    /// Simple types use only the transform of `config`.
    pub fn from_type(kind: &OperationType, config: AsyncConfig) -> Self {
        match kind {
            OperationType::Simple(kind) => Action::Simple(SimpleAction::new(
                kind.clone(),
                SimpleConfig::new().with_transform(config.transform),
            )),
            OperationType::Async(types) => Action::Async(AsyncAction::new(types.clone(), config)),
        }
    }

    /// Invokes the action.
    pub fn invoke(&self, args: Vec<Value>) -> Dispatchable {
        match self {
            Action::Simple(action) => Dispatchable::Record(action.invoke(args)),
            Action::Async(action) => Dispatchable::Thunk(action.invoke(args)),
        }
    }
}

impl From<SimpleAction> for Action {
    fn from(action: SimpleAction) -> Self {
        Action::Simple(action)
    }
}

impl From<AsyncAction> for Action {
    fn from(action: AsyncAction) -> Self {
        Action::Async(action)
    }
}
