//! Two-phase assembly of mods into one store.
//!
//! A [`Mod`] bundles what one feature contributes: an optional reducer
//! branch, named actions, named selectors, an entity schema and an
//! initializer. [`MiddleEndBuilder`] collects mods without touching any of
//! them; [`MiddleEndBuilder::initialize`] resolves the mod table, builds the
//! combined store and runs every initializer exactly once, yielding a
//! [`MiddleEnd`].

use crate::combine::{erase, CombinedReducer, ErasedReducer, RootState};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::middleware::Middleware;
use crate::store::{Dispatched, Store};
use midend_core::schema::SchemaSet;
use midend_core::{Action, Dispatchable, Reducer};
use midend_value::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Reads a value out of the root state.
pub type Selector = Arc<dyn Fn(&RootState, &[Value]) -> Value + Send + Sync>;

/// Runs once after the middle-end is assembled.
pub type Initializer = Arc<dyn Fn(&MiddleEnd) -> StoreResult<()> + Send + Sync>;

/// One feature's contribution to the middle-end.
#[derive(Default)]
pub struct Mod {
    reducer: Option<Box<dyn ErasedReducer>>,
    actions: BTreeMap<String, Action>,
    selectors: BTreeMap<String, Selector>,
    schema: Option<Arc<SchemaSet>>,
    initializer: Option<Initializer>,
}

impl Mod {
    /// Creates an empty mod.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reducer branch, stored under the mod's name.
    #[must_use]
    pub fn with_reducer<R: Reducer>(mut self, reducer: R) -> Self {
        self.reducer = Some(erase(reducer));
        self
    }

    /// Adds a named action.
    #[must_use]
    pub fn with_action(mut self, name: impl Into<String>, action: impl Into<Action>) -> Self {
        self.actions.insert(name.into(), action.into());
        self
    }

    /// Adds a named selector.
    #[must_use]
    pub fn with_selector<F>(mut self, name: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&RootState, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.selectors.insert(name.into(), Arc::new(selector));
        self
    }

    /// Sets the entity schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Arc<SchemaSet>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the initializer.
    #[must_use]
    pub fn with_initializer<F>(mut self, initializer: F) -> Self
    where
        F: Fn(&MiddleEnd) -> StoreResult<()> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(initializer));
        self
    }
}

impl fmt::Debug for Mod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mod")
            .field("reducer", &self.reducer.is_some())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("selectors", &self.selectors.keys().collect::<Vec<_>>())
            .field("schema", &self.schema.is_some())
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}

/// Named mods in declaration order.
pub type Mods = Vec<(String, Mod)>;

enum ModSource {
    Ready(Mods),
    Deferred(Box<dyn FnOnce() -> StoreResult<Mods> + Send>),
}

/// An unconfigured middle-end.
pub struct MiddleEndBuilder {
    mods: ModSource,
    config: StoreConfig,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl MiddleEndBuilder {
    /// Starts with an empty mod table.
    pub fn new() -> Self {
        Self {
            mods: ModSource::Ready(Vec::new()),
            config: StoreConfig::default(),
            middleware: Vec::new(),
        }
    }

    /// Adds a mod.
    ///
    /// Has no effect once [`with_mods`](Self::with_mods) supplied a deferred table.
    #[must_use]
    pub fn with_mod(mut self, name: impl Into<String>, module: Mod) -> Self {
        if let ModSource::Ready(mods) = &mut self.mods {
            mods.push((name.into(), module));
        }
        self
    }

    /// Supplies the whole mod table lazily, built during initialization.
    #[must_use]
    pub fn with_mods<F>(mut self, producer: F) -> Self
    where
        F: FnOnce() -> StoreResult<Mods> + Send + 'static,
    {
        self.mods = ModSource::Deferred(Box::new(producer));
        self
    }

    /// Sets the store configuration.
    #[must_use]
    pub fn with_store_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends a store middleware.
    #[must_use]
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Resolves the mods, builds the store and runs initializers.
    ///
    /// # Errors
    ///
    /// Returns an error if the deferred mod table fails to build, if two mods
    /// share a name, or if an initializer fails.
    pub fn initialize(self) -> StoreResult<MiddleEnd> {
        let mods = match self.mods {
            ModSource::Ready(mods) => mods,
            ModSource::Deferred(producer) => producer()?,
        };

        let mut seen = HashSet::new();
        let mut reducer = CombinedReducer::new();
        let mut actions = BTreeMap::new();
        let mut selectors = BTreeMap::new();
        let mut schemas = BTreeMap::new();
        let mut initializers = Vec::new();
        let mut names = Vec::with_capacity(mods.len());

        for (name, module) in mods {
            if !seen.insert(name.clone()) {
                return Err(StoreError::DuplicateMod(name));
            }
            if let Some(branch) = module.reducer {
                reducer.insert_erased(name.clone(), branch);
            }
            if let Some(schema) = module.schema {
                schemas.insert(name.clone(), schema);
            }
            if let Some(initializer) = module.initializer {
                initializers.push((name.clone(), initializer));
            }
            actions.insert(name.clone(), module.actions);
            selectors.insert(name.clone(), module.selectors);
            names.push(name);
        }

        let mut store = Store::builder(reducer).config(self.config);
        for middleware in self.middleware {
            store = store.middleware_arc(middleware);
        }

        let middle_end = MiddleEnd {
            store: store.build(),
            names,
            actions,
            selectors,
            schemas,
        };
        debug!(mods = middle_end.names.len(), "middle-end assembled");

        for (name, initializer) in initializers {
            debug!(module = %name, "running initializer");
            initializer(&middle_end)?;
        }

        Ok(middle_end)
    }
}

impl Default for MiddleEndBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MiddleEndBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mods = match &self.mods {
            ModSource::Ready(mods) => mods.len().to_string(),
            ModSource::Deferred(_) => "deferred".to_string(),
        };
        f.debug_struct("MiddleEndBuilder")
            .field("mods", &mods)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// An initialized middle-end.
pub struct MiddleEnd {
    store: Store<CombinedReducer>,
    names: Vec<String>,
    actions: BTreeMap<String, BTreeMap<String, Action>>,
    selectors: BTreeMap<String, BTreeMap<String, Selector>>,
    schemas: BTreeMap<String, Arc<SchemaSet>>,
}

impl MiddleEnd {
    /// Starts an unconfigured middle-end.
    pub fn builder() -> MiddleEndBuilder {
        MiddleEndBuilder::new()
    }

    /// The combined store.
    pub fn store(&self) -> &Store<CombinedReducer> {
        &self.store
    }

    /// Snapshot of the root state.
    pub fn state(&self) -> RootState {
        self.store.state()
    }

    /// Dispatches a record or a thunk.
    pub fn dispatch(&self, item: impl Into<Dispatchable>) -> Dispatched {
        self.store.dispatch(item)
    }

    /// Looks up an action.
    ///
    /// # Errors
    ///
    /// Returns an error if the mod or the action does not exist.
    pub fn action(&self, module: &str, name: &str) -> StoreResult<&Action> {
        self.actions
            .get(module)
            .ok_or_else(|| StoreError::UnknownMod(module.to_string()))?
            .get(name)
            .ok_or_else(|| StoreError::unknown_action(module, name))
    }

    /// Invokes an action by name and dispatches what it produces.
    ///
    /// # Errors
    ///
    /// Returns an error if the mod or the action does not exist.
    pub fn dispatch_action(
        &self,
        module: &str,
        name: &str,
        args: Vec<Value>,
    ) -> StoreResult<Dispatched> {
        let action = self.action(module, name)?;
        Ok(self.store.dispatch(action.invoke(args)))
    }

    /// Runs a selector against the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the mod or the selector does not exist.
    pub fn select(&self, module: &str, name: &str, args: &[Value]) -> StoreResult<Value> {
        let selector = self
            .selectors
            .get(module)
            .ok_or_else(|| StoreError::UnknownMod(module.to_string()))?
            .get(name)
            .ok_or_else(|| StoreError::unknown_selector(module, name))?;
        Ok(self.store.with_state(|state| selector(state, args)))
    }

    /// The schema of a mod, if it declared one.
    pub fn schema(&self, module: &str) -> Option<&Arc<SchemaSet>> {
        self.schemas.get(module)
    }

    /// Mod names in declaration order.
    pub fn mod_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Debug for MiddleEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddleEnd")
            .field("mods", &self.names)
            .finish_non_exhaustive()
    }
}
