//! Dispatch sinks and thunks.

use crate::error::OperationError;
use crate::record::Record;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// What an awaited thunk resolves to.
pub type Outcome = Result<midend_value::Value, OperationError>;

/// A record sink: `dispatch(record) -> record`.
///
/// Cloning is cheap; every clone feeds the same destination.
#[derive(Clone)]
pub struct Dispatch(Arc<dyn Fn(Record) -> Record + Send + Sync>);

impl Dispatch {
    /// Wraps a sink function.
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        Self(Arc::new(sink))
    }

    /// Sends a record into the sink.
    pub fn dispatch(&self, record: Record) -> Record {
        (self.0)(record)
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatch(..)")
    }
}

/// A deferred workflow run with a dispatch sink.
///
/// Running a thunk performs its synchronous prefix immediately (for async
/// operations, computing and emitting BEGIN) and returns a future for the
/// rest.
pub struct Thunk(Box<dyn FnOnce(Dispatch) -> BoxFuture<'static, Outcome> + Send>);

impl Thunk {
    /// Wraps a workflow.
    pub fn new<F>(run: F) -> Self
    where
        F: FnOnce(Dispatch) -> BoxFuture<'static, Outcome> + Send + 'static,
    {
        Self(Box::new(run))
    }

    /// Runs the workflow against a sink.
    pub fn run(self, dispatch: Dispatch) -> BoxFuture<'static, Outcome> {
        (self.0)(dispatch)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(..)")
    }
}

/// Anything a store accepts.
#[derive(Debug)]
pub enum Dispatchable {
    /// A plain record, reduced synchronously.
    Record(Record),
    /// A workflow, run with the store's sink.
    Thunk(Thunk),
}

impl Dispatchable {
    /// Returns the record, if this is a record.
    pub fn into_record(self) -> Option<Record> {
        match self {
            Dispatchable::Record(record) => Some(record),
            Dispatchable::Thunk(_) => None,
        }
    }

    /// Returns the thunk, if this is a thunk.
    pub fn into_thunk(self) -> Option<Thunk> {
        match self {
            Dispatchable::Thunk(thunk) => Some(thunk),
            Dispatchable::Record(_) => None,
        }
    }
}

impl From<Record> for Dispatchable {
    fn from(record: Record) -> Self {
        Dispatchable::Record(record)
    }
}

impl From<Thunk> for Dispatchable {
    fn from(thunk: Thunk) -> Self {
        Dispatchable::Thunk(thunk)
    }
}
