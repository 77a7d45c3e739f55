//! Entity/index cache reducer.
//!
//! The cache state has two independent halves:
//! - `indexes`: one [`IndexEntry`] per operation fingerprint, tracking how
//!   many invocations are in flight and the last original, result and error
//! - `entities`: per entity type, a dictionary of entities keyed by id
//!
//! Both halves are persistent maps behind `Arc`. A transition copies only the
//! path it touches, so untouched entries and dictionaries keep their identity
//! and an ignored record returns the very same state.

use super::Reducer;
use crate::config::EntityReducerConfig;
use crate::record::{is_normalized, Record, ENTITIES_KEY, RESULT_KEY};
use crate::schema::EntitySource;
use crate::types::Phase;
use midend_value::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{trace, warn};

/// Bookkeeping for one operation fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Last input seen for this fingerprint.
    pub original: Value,
    /// Last successful result (reference part only, for normalized payloads).
    pub result: Value,
    /// Last error, or `Null` once a success clears it.
    pub error: Value,
    /// Invocations begun but not yet completed.
    pub in_flight: u32,
}

impl Default for IndexEntry {
    fn default() -> Self {
        Self {
            original: Value::Undefined,
            result: Value::Undefined,
            error: Value::Null,
            in_flight: 0,
        }
    }
}

impl IndexEntry {
    /// Returns true while any invocation is in flight.
    pub fn is_pending(&self) -> bool {
        self.in_flight > 0
    }

    /// Renders as `{ original, result, error, inFlight }`.
    pub fn to_value(&self) -> Value {
        Value::map([
            ("original", self.original.clone()),
            ("result", self.result.clone()),
            ("error", self.error.clone()),
            ("inFlight", Value::from(self.in_flight)),
        ])
    }
}

/// Index entries by fingerprint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Indexes(Arc<BTreeMap<String, Arc<IndexEntry>>>);

impl Indexes {
    /// Looks up the entry for a fingerprint.
    pub fn get(&self, fingerprint: &str) -> Option<&IndexEntry> {
        self.0.get(fingerprint).map(Arc::as_ref)
    }

    /// Iterates entries in fingerprint order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Number of tracked fingerprints.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no fingerprint is tracked.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if both values share the same map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns true if both values share the same entry for `fingerprint`.
    pub fn entry_ptr_eq(&self, other: &Self, fingerprint: &str) -> bool {
        match (self.0.get(fingerprint), other.0.get(fingerprint)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Renders as `{ fingerprint: entry }`.
    pub fn to_value(&self) -> Value {
        Value::Map(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

/// Entities of one type, by id.
pub type EntityDictionary = BTreeMap<String, Arc<Map>>;

/// Entity dictionaries by entity type key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entities(Arc<BTreeMap<String, Arc<EntityDictionary>>>);

impl Entities {
    /// Looks up one entity.
    pub fn get(&self, kind: &str, id: &str) -> Option<&Map> {
        self.0.get(kind).and_then(|d| d.get(id)).map(Arc::as_ref)
    }

    /// Looks up the dictionary of a type.
    pub fn dictionary(&self, kind: &str) -> Option<&EntityDictionary> {
        self.0.get(kind).map(Arc::as_ref)
    }

    /// Entity type keys, in order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns true if both values share the same map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns true if both values share the same dictionary for `kind`.
    pub fn dictionary_ptr_eq(&self, other: &Self, kind: &str) -> bool {
        match (self.0.get(kind), other.0.get(kind)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns true if both values share the same record for `kind`/`id`.
    pub fn entity_ptr_eq(&self, other: &Self, kind: &str, id: &str) -> bool {
        let a = self.0.get(kind).and_then(|d| d.get(id));
        let b = other.0.get(kind).and_then(|d| d.get(id));
        match (a, b) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Renders as `{ kind: { id: entity } }`.
    pub fn to_value(&self) -> Value {
        Value::Map(
            self.0
                .iter()
                .map(|(kind, dictionary)| {
                    let entries = dictionary
                        .iter()
                        .map(|(id, entity)| (id.clone(), Value::Map(entity.as_ref().clone())))
                        .collect();
                    (kind.clone(), Value::Map(entries))
                })
                .collect(),
        )
    }
}

impl EntitySource for Entities {
    fn entity(&self, kind: &str, id: &str) -> Option<Map> {
        self.get(kind, id).cloned()
    }
}

/// The `{ indexes, entities }` cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheState {
    /// Index entries by fingerprint.
    pub indexes: Indexes,
    /// Entity dictionaries by type.
    pub entities: Entities,
}

impl CacheState {
    /// Returns true if both halves are shared with `other`.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.indexes.ptr_eq(&other.indexes) && self.entities.ptr_eq(&other.entities)
    }

    /// Renders as `{ indexes, entities }`.
    pub fn to_value(&self) -> Value {
        Value::map([
            ("indexes", self.indexes.to_value()),
            ("entities", self.entities.to_value()),
        ])
    }
}

/// Reducer maintaining the entity/index cache.
#[derive(Debug, Clone, Default)]
pub struct EntityReducer {
    config: EntityReducerConfig,
}

impl EntityReducer {
    /// Creates a reducer.
    pub fn new(config: EntityReducerConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    pub fn config(&self) -> &EntityReducerConfig {
        &self.config
    }

    /// Applies a record to the index half.
    pub fn reduce_indexes(&self, state: &Indexes, record: &Record) -> Indexes {
        let Some(fingerprint) = record.fingerprint() else {
            return state.clone();
        };
        if !self.config.index_policy.allows(fingerprint) {
            trace!(kind = %record.kind, fingerprint, "fingerprint rejected by index policy");
            return state.clone();
        }

        let mut entries = Arc::clone(&state.0);
        let slot = Arc::make_mut(&mut entries)
            .entry(fingerprint.to_string())
            .or_default();
        let entry = Arc::make_mut(slot);
        let phase = record.phase();

        match phase {
            Some(Phase::Begin) => {
                entry.in_flight = entry.in_flight.saturating_add(1);
                entry.original = record.payload.clone();
            }
            Some(Phase::Success | Phase::Fail) => {
                if entry.in_flight == 0 {
                    warn!(kind = %record.kind, fingerprint, "completion without a matching begin");
                } else {
                    entry.in_flight -= 1;
                }
                if let Some(original) = record.original() {
                    entry.original = original.clone();
                }
            }
            None => {}
        }

        if phase == Some(Phase::Success) {
            entry.result = if is_normalized(&record.payload) {
                record.payload.get(RESULT_KEY).cloned().unwrap_or_default()
            } else {
                record.payload.clone()
            };
            entry.error = Value::Null;
        }

        if record.error {
            entry.error = if record.payload.is_truthy() {
                record.payload.clone()
            } else {
                Value::Bool(true)
            };
        }

        Indexes(entries)
    }

    /// Applies a record to the entity half.
    pub fn reduce_entities(&self, state: &Entities, record: &Record) -> Entities {
        if record.error || !record.has_normalized_payload() {
            return state.clone();
        }
        let Some(incoming) = record.payload.get(ENTITIES_KEY).and_then(Value::as_map) else {
            return state.clone();
        };

        let mut next = Arc::clone(&state.0);
        let mut changed = false;

        for (kind, dictionary) in incoming {
            let Some(existing) = state.0.get(kind) else {
                trace!(kind = %kind, "skipping undeclared entity type");
                continue;
            };
            let Some(dictionary) = dictionary.as_map() else {
                continue;
            };

            let mut updated = Arc::clone(existing);
            let mut touched = false;
            for (id, entity) in dictionary {
                let Some(entity) = entity.as_map() else {
                    trace!(kind = %kind, id = %id, "skipping non-map entity");
                    continue;
                };
                let stored = Arc::make_mut(&mut updated);
                if self.config.merge_policy.should_merge(entity) {
                    let target = Arc::make_mut(stored.entry(id.clone()).or_default());
                    for (field, value) in entity {
                        if !value.is_undefined() {
                            target.insert(field.clone(), value.clone());
                        }
                    }
                } else {
                    stored.insert(id.clone(), Arc::new(entity.clone()));
                }
                touched = true;
            }

            if touched {
                Arc::make_mut(&mut next).insert(kind.clone(), updated);
                changed = true;
            }
        }

        if changed {
            Entities(next)
        } else {
            state.clone()
        }
    }
}

impl Reducer for EntityReducer {
    type State = CacheState;

    fn initial_state(&self) -> CacheState {
        let dictionaries = self
            .config
            .entity_types
            .iter()
            .map(|kind| (kind.clone(), Arc::new(EntityDictionary::new())))
            .collect();
        CacheState {
            indexes: Indexes::default(),
            entities: Entities(Arc::new(dictionaries)),
        }
    }

    fn reduce(&self, state: &CacheState, record: &Record) -> CacheState {
        CacheState {
            indexes: self.reduce_indexes(&state.indexes, record),
            entities: self.reduce_entities(&state.entities, record),
        }
    }
}
