//! Configuration for actions and reducers.

use crate::error::Rejection;
use crate::schema::{Normalize, SchemaSet};
use crate::types::AsyncType;
use futures::future::{self, BoxFuture, FutureExt};
use midend_value::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Entity field that opts an incoming record into merging under [`MergePolicy::TopFlag`].
pub const TOP_FLAG: &str = "_top";

/// Maps call arguments to a payload.
pub type Transform = Arc<dyn Fn(Vec<Value>) -> Value + Send + Sync>;

/// Asynchronous operation body, called with the spread begin payload.
pub type Handler = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, Rejection>> + Send + Sync>;

/// Side effect run after a SUCCESS record is emitted.
pub type After = Arc<dyn Fn(&Completion) + Send + Sync>;

/// What an [`After`] hook observes.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// The begin payload.
    pub original: Value,
    /// The success payload, normalized when a schema is configured.
    pub result: Value,
}

/// Default argument transform.
///
/// No arguments yield `Undefined`; one argument passes through unless it is
/// an array, which gets wrapped in a one-element array; several arguments
/// become an array.
pub fn default_transform(mut args: Vec<Value>) -> Value {
    match args.len() {
        0 => Value::Undefined,
        1 => match args.pop() {
            Some(Value::Array(items)) => Value::Array(vec![Value::Array(items)]),
            Some(single) => single,
            None => Value::Undefined,
        },
        _ => Value::Array(args),
    }
}

/// Wraps an async closure as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Rejection>> + Send + 'static,
{
    Arc::new(move |args| f(args).boxed())
}

/// Wraps a synchronous closure as a [`Handler`].
pub fn sync_handler<F>(f: F) -> Handler
where
    F: Fn(Vec<Value>) -> Result<Value, Rejection> + Send + Sync + 'static,
{
    Arc::new(move |args| future::ready(f(args)).boxed())
}

/// Wraps a closure as a [`Transform`].
pub fn transform<F>(f: F) -> Transform
where
    F: Fn(Vec<Value>) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// How an async operation picks its fingerprint.
#[derive(Clone, Default)]
pub enum IndexBy {
    /// Not indexed.
    #[default]
    None,
    /// Indexed under the operation's base type.
    Base,
    /// Indexed under a fixed string.
    Fixed(String),
    /// Indexed under a value computed from the spread arguments.
    Computed(Arc<dyn Fn(&[Value]) -> Option<String> + Send + Sync>),
}

impl IndexBy {
    /// Creates a computed index.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Option<String> + Send + Sync + 'static,
    {
        IndexBy::Computed(Arc::new(f))
    }

    /// Resolves the fingerprint for one invocation.
    pub fn resolve(&self, types: &AsyncType, args: &[Value]) -> Option<String> {
        match self {
            IndexBy::None => None,
            IndexBy::Base => Some(types.base.clone()),
            IndexBy::Fixed(index) => Some(index.clone()),
            IndexBy::Computed(f) => f(args),
        }
    }
}

impl From<bool> for IndexBy {
    fn from(indexed: bool) -> Self {
        if indexed {
            IndexBy::Base
        } else {
            IndexBy::None
        }
    }
}

impl From<&str> for IndexBy {
    fn from(index: &str) -> Self {
        IndexBy::Fixed(index.to_string())
    }
}

impl fmt::Debug for IndexBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexBy::None => f.write_str("None"),
            IndexBy::Base => f.write_str("Base"),
            IndexBy::Fixed(index) => f.debug_tuple("Fixed").field(index).finish(),
            IndexBy::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Configuration of a simple action.
#[derive(Clone)]
pub struct SimpleConfig {
    /// Argument transform.
    pub transform: Transform,
}

impl SimpleConfig {
    /// Creates a configuration with the default transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

impl Default for SimpleConfig {
    fn default() -> Self {
        Self {
            transform: Arc::new(default_transform),
        }
    }
}

impl fmt::Debug for SimpleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleConfig").finish_non_exhaustive()
    }
}

/// Configuration of an async action.
#[derive(Clone)]
pub struct AsyncConfig {
    /// Maps call arguments to the begin payload.
    pub transform: Transform,
    /// Operation body. Defaults to the default transform of its arguments.
    pub handler: Handler,
    /// Normalization applied to a resolved value.
    pub schema: Option<Arc<dyn Normalize>>,
    /// Hook run after SUCCESS is emitted.
    pub after: Option<After>,
    /// Fingerprint selection.
    pub index: IndexBy,
}

impl AsyncConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the handler.
    #[must_use]
    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = handler;
        self
    }

    /// Sets the normalization schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Arc<dyn Normalize>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the after hook.
    #[must_use]
    pub fn with_after<F>(mut self, after: F) -> Self
    where
        F: Fn(&Completion) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(after));
        self
    }

    /// Sets the fingerprint selection.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<IndexBy>) -> Self {
        self.index = index.into();
        self
    }
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self {
            transform: Arc::new(default_transform),
            handler: sync_handler(|args| Ok(default_transform(args))),
            schema: None,
            after: None,
            index: IndexBy::None,
        }
    }
}

impl fmt::Debug for AsyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncConfig")
            .field("schema", &self.schema.is_some())
            .field("after", &self.after.is_some())
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Decides whether an incoming entity is merged into or replaces the stored one.
#[derive(Clone, Default)]
pub enum MergePolicy {
    /// Always merge field-wise.
    Always,
    /// Always replace wholesale.
    Never,
    /// Merge only entities carrying a truthy `_top` field.
    #[default]
    TopFlag,
    /// Merge when the predicate accepts the incoming entity.
    Predicate(Arc<dyn Fn(&Map) -> bool + Send + Sync>),
}

impl MergePolicy {
    /// Creates a predicate policy.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Map) -> bool + Send + Sync + 'static,
    {
        MergePolicy::Predicate(Arc::new(f))
    }

    /// Applies the policy to an incoming entity.
    pub fn should_merge(&self, entity: &Map) -> bool {
        match self {
            MergePolicy::Always => true,
            MergePolicy::Never => false,
            MergePolicy::TopFlag => entity.get(TOP_FLAG).is_some_and(Value::is_truthy),
            MergePolicy::Predicate(f) => f(entity),
        }
    }
}

impl From<bool> for MergePolicy {
    fn from(merge: bool) -> Self {
        if merge {
            MergePolicy::Always
        } else {
            MergePolicy::Never
        }
    }
}

impl fmt::Debug for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::Always => f.write_str("Always"),
            MergePolicy::Never => f.write_str("Never"),
            MergePolicy::TopFlag => f.write_str("TopFlag"),
            MergePolicy::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Decides which fingerprints are tracked in the index.
#[derive(Clone, Default)]
pub enum IndexPolicy {
    /// Track every fingerprint.
    #[default]
    All,
    /// Track nothing.
    None,
    /// Track fingerprints the predicate accepts.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl IndexPolicy {
    /// Creates a predicate policy.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        IndexPolicy::Predicate(Arc::new(f))
    }

    /// Applies the policy to a fingerprint.
    pub fn allows(&self, fingerprint: &str) -> bool {
        match self {
            IndexPolicy::All => true,
            IndexPolicy::None => false,
            IndexPolicy::Predicate(f) => f(fingerprint),
        }
    }
}

impl From<bool> for IndexPolicy {
    fn from(index: bool) -> Self {
        if index {
            IndexPolicy::All
        } else {
            IndexPolicy::None
        }
    }
}

impl fmt::Debug for IndexPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexPolicy::All => f.write_str("All"),
            IndexPolicy::None => f.write_str("None"),
            IndexPolicy::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Configuration of the entity/index cache reducer.
#[derive(Debug, Clone, Default)]
pub struct EntityReducerConfig {
    /// Entity type keys the store is initialized with and accepts.
    pub entity_types: Vec<String>,
    /// Merge policy for incoming entities.
    pub merge_policy: MergePolicy,
    /// Fingerprint filter for the index.
    pub index_policy: IndexPolicy,
}

impl EntityReducerConfig {
    /// Creates a configuration with no entity types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the entity types of a schema.
    #[must_use]
    pub fn with_schema(mut self, schema: &SchemaSet) -> Self {
        self.entity_types = schema.entity_keys().map(str::to_string).collect();
        self
    }

    /// Declares entity types by key.
    #[must_use]
    pub fn with_entity_types<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.entity_types = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the merge policy.
    #[must_use]
    pub fn with_merge_policy(mut self, policy: impl Into<MergePolicy>) -> Self {
        self.merge_policy = policy.into();
        self
    }

    /// Sets the index policy.
    #[must_use]
    pub fn with_index_policy(mut self, policy: impl Into<IndexPolicy>) -> Self {
        self.index_policy = policy.into();
        self
    }
}

/// Configuration of a simple handler-table reducer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReducerConfig {
    /// Handlers edit a private copy of the state in place instead of
    /// returning a new state.
    pub mutable: bool,
}

impl ReducerConfig {
    /// Creates an immutable-mode configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mutable mode.
    #[must_use]
    pub const fn mutable(mut self, value: bool) -> Self {
        self.mutable = value;
        self
    }
}
