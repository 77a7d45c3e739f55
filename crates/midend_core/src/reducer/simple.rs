//! Handler-table reducers.

use super::Reducer;
use crate::config::ReducerConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::record::Record;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Handler table key that signals a missing operation type.
const UNDEFINED_KEY: &str = "undefined";

type PureFn<S> = Arc<dyn Fn(&S, &Record) -> S + Send + Sync>;
type DraftFn<S> = Arc<dyn Fn(&mut S, &Record) + Send + Sync>;

enum Handler<S> {
    Pure(PureFn<S>),
    Draft(DraftFn<S>),
}

impl<S> Clone for Handler<S> {
    fn clone(&self) -> Self {
        match self {
            Handler::Pure(f) => Handler::Pure(Arc::clone(f)),
            Handler::Draft(f) => Handler::Draft(Arc::clone(f)),
        }
    }
}

enum Initial<S> {
    Value(S),
    Producer(Arc<dyn Fn() -> S + Send + Sync>),
}

impl<S: Clone> Initial<S> {
    fn produce(&self) -> S {
        match self {
            Initial::Value(state) => state.clone(),
            Initial::Producer(f) => f(),
        }
    }
}

/// A reducer that dispatches on the exact record type.
///
/// In immutable mode handlers return the next state. In mutable mode they
/// edit a private copy of the state in place; the store still observes a new
/// value.
pub struct SimpleReducer<S> {
    initial: Initial<S>,
    handlers: HashMap<String, Handler<S>>,
    config: ReducerConfig,
}

impl<S: Clone + Send + Sync + 'static> SimpleReducer<S> {
    /// Starts a reducer with a fixed initial state.
    pub fn builder(initial: S) -> SimpleReducerBuilder<S> {
        SimpleReducerBuilder::new(Initial::Value(initial))
    }

    /// Starts a reducer whose initial state is produced on demand.
    pub fn builder_with<F>(producer: F) -> SimpleReducerBuilder<S>
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        SimpleReducerBuilder::new(Initial::Producer(Arc::new(producer)))
    }

    /// The mode this reducer was built with.
    pub fn config(&self) -> ReducerConfig {
        self.config
    }

    /// Returns true if a handler is registered for `kind`.
    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }
}

impl<S: Clone + Send + Sync + 'static> Reducer for SimpleReducer<S> {
    type State = S;

    fn initial_state(&self) -> S {
        self.initial.produce()
    }

    fn reduce(&self, state: &S, record: &Record) -> S {
        match self.handlers.get(&record.kind) {
            Some(Handler::Pure(f)) => f(state, record),
            Some(Handler::Draft(f)) => {
                let mut draft = state.clone();
                f(&mut draft, record);
                draft
            }
            None => state.clone(),
        }
    }
}

impl<S> fmt::Debug for SimpleReducer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("SimpleReducer")
            .field("handlers", &kinds)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SimpleReducer`].
pub struct SimpleReducerBuilder<S> {
    initial: Initial<S>,
    handlers: Vec<(String, Handler<S>)>,
    config: ReducerConfig,
}

impl<S: Clone + Send + Sync + 'static> SimpleReducerBuilder<S> {
    fn new(initial: Initial<S>) -> Self {
        Self {
            initial,
            handlers: Vec::new(),
            config: ReducerConfig::default(),
        }
    }

    /// Sets the reducer mode.
    #[must_use]
    pub fn config(mut self, config: ReducerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a handler that returns the next state.
    #[must_use]
    pub fn on<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&S, &Record) -> S + Send + Sync + 'static,
    {
        self.handlers.push((kind.into(), Handler::Pure(Arc::new(handler))));
        self
    }

    /// Registers a handler that edits a draft in place.
    #[must_use]
    pub fn on_draft<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut S, &Record) + Send + Sync + 'static,
    {
        self.handlers.push((kind.into(), Handler::Draft(Arc::new(handler))));
        self
    }

    /// Validates the handler table.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a handler keyed by `"undefined"` or the
    /// empty string, for two handlers on one type, and for a handler whose
    /// style does not match the configured mode.
    pub fn build(self) -> ConfigResult<SimpleReducer<S>> {
        let mutable = self.config.mutable;
        let mut handlers = HashMap::with_capacity(self.handlers.len());

        for (key, handler) in self.handlers {
            if key == UNDEFINED_KEY {
                return Err(ConfigError::UndefinedHandler);
            }
            if key.is_empty() {
                return Err(ConfigError::EmptyHandlerKey);
            }
            let style_ok = match handler {
                Handler::Pure(_) => !mutable,
                Handler::Draft(_) => mutable,
            };
            if !style_ok {
                return Err(ConfigError::HandlerStyle { key, mutable });
            }
            if handlers.contains_key(&key) {
                return Err(ConfigError::DuplicateHandler { key });
            }
            handlers.insert(key, handler);
        }

        Ok(SimpleReducer {
            initial: self.initial,
            handlers,
            config: self.config,
        })
    }
}
