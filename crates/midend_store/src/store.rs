//! The state container.

use crate::config::StoreConfig;
use crate::feed::{Feed, StoreEvent};
use crate::middleware::{ErrorLogger, Middleware, Next};
use futures::future::BoxFuture;
use midend_core::{Dispatch, Dispatchable, Outcome, Reducer, Record, Thunk};
use parking_lot::RwLock;
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::trace;

/// What [`Store::dispatch`] returns.
pub enum Dispatched {
    /// A record that has been reduced.
    Record(Record),
    /// A running thunk. Its synchronous prefix has already happened.
    Pending(BoxFuture<'static, Outcome>),
}

impl Dispatched {
    /// Returns the record, if a record was dispatched.
    pub fn into_record(self) -> Option<Record> {
        match self {
            Dispatched::Record(record) => Some(record),
            Dispatched::Pending(_) => None,
        }
    }

    /// Returns the pending outcome, if a thunk was dispatched.
    pub fn into_pending(self) -> Option<BoxFuture<'static, Outcome>> {
        match self {
            Dispatched::Pending(pending) => Some(pending),
            Dispatched::Record(_) => None,
        }
    }
}

impl fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatched::Record(record) => f.debug_tuple("Record").field(record).finish(),
            Dispatched::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

struct Inner<R: Reducer> {
    reducer: R,
    state: RwLock<R::State>,
    middleware: Vec<Arc<dyn Middleware>>,
    feed: Feed,
}

impl<R: Reducer> Inner<R> {
    fn apply(&self, record: Record) -> Record {
        let reduce = |record: Record| {
            let mut state = self.state.write();
            let next = self.reducer.reduce(&state, &record);
            *state = next;
            // Published under the write lock so sequence follows reduction order.
            let sequence = self.feed.emit(&record);
            drop(state);
            trace!(kind = %record.kind, sequence, "reduced record");
            record
        };
        Next::new(&self.middleware, &reduce).run(record)
    }
}

/// Holds the current state and applies dispatched records to it.
///
/// Clones share the same state.
pub struct Store<R: Reducer> {
    inner: Arc<Inner<R>>,
}

impl<R: Reducer> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Reducer> Store<R> {
    /// Creates a store with default configuration and no middleware.
    pub fn new(reducer: R) -> Self {
        Self::builder(reducer).build()
    }

    /// Starts configuring a store.
    pub fn builder(reducer: R) -> StoreBuilder<R> {
        StoreBuilder {
            reducer,
            config: StoreConfig::default(),
            middleware: Vec::new(),
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> R::State {
        self.inner.state.read().clone()
    }

    /// Runs `f` against the current state without cloning it.
    pub fn with_state<T>(&self, f: impl FnOnce(&R::State) -> T) -> T {
        f(&self.inner.state.read())
    }

    /// The reducer.
    pub fn reducer(&self) -> &R {
        &self.inner.reducer
    }

    /// Dispatches a record or a thunk.
    ///
    /// Records are reduced before this returns. Thunks are started: their
    /// synchronous prefix runs now and the rest is returned as a future.
    pub fn dispatch(&self, item: impl Into<Dispatchable>) -> Dispatched {
        match item.into() {
            Dispatchable::Record(record) => Dispatched::Record(self.dispatch_record(record)),
            Dispatchable::Thunk(thunk) => Dispatched::Pending(self.run(thunk)),
        }
    }

    /// Passes a record through middleware to the reducer.
    pub fn dispatch_record(&self, record: Record) -> Record {
        self.inner.apply(record)
    }

    /// Starts a thunk against this store's sink.
    pub fn run(&self, thunk: Thunk) -> BoxFuture<'static, Outcome> {
        thunk.run(self.sink())
    }

    /// A sink feeding this store.
    pub fn sink(&self) -> Dispatch {
        let inner = Arc::clone(&self.inner);
        Dispatch::new(move |record| inner.apply(record))
    }

    /// Subscribes to reduced records.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.inner.feed.subscribe()
    }

    /// Sequence number of the last reduced record, or 0.
    pub fn latest_sequence(&self) -> u64 {
        self.inner.feed.latest_sequence()
    }
}

impl<R: Reducer + fmt::Debug> fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("reducer", &self.inner.reducer)
            .field("middleware", &self.inner.middleware.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Store`].
pub struct StoreBuilder<R: Reducer> {
    reducer: R,
    config: StoreConfig,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl<R: Reducer> StoreBuilder<R> {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends a middleware to the chain.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends shared middleware to the chain.
    #[must_use]
    pub fn middleware_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Computes the initial state and creates the store.
    pub fn build(self) -> Store<R> {
        let mut middleware: Vec<Arc<dyn Middleware>> = Vec::with_capacity(self.middleware.len() + 1);
        if self.config.log_errors {
            middleware.push(Arc::new(ErrorLogger));
        }
        middleware.extend(self.middleware);

        let state = self.reducer.initial_state();
        Store {
            inner: Arc::new(Inner {
                reducer: self.reducer,
                state: RwLock::new(state),
                middleware,
                feed: Feed::new(),
            }),
        }
    }
}
