//! Flattening nested values into entity dictionaries and back.

use super::entity::Schema;
use super::set::SchemaSet;
use crate::record::{is_normalized, ENTITIES_KEY, RESULT_KEY};
use midend_value::{Map, Value};

/// A value with its entities replaced by ids.
///
/// `entities` maps each entity type key to a dictionary of entities keyed by
/// their id rendered as a string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPayload {
    /// The input with entities replaced by their ids.
    pub result: Value,
    /// Extracted entities, by type key then id.
    pub entities: Map,
}

impl NormalizedPayload {
    /// Reads a normalized payload out of a record payload.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !is_normalized(value) {
            return None;
        }
        Some(Self {
            result: value.get(RESULT_KEY).cloned().unwrap_or_default(),
            entities: value
                .get(ENTITIES_KEY)
                .and_then(Value::as_map)
                .cloned()
                .unwrap_or_default(),
        })
    }

    /// Renders as `{ result, entities }`.
    pub fn into_value(self) -> Value {
        Value::map([
            (RESULT_KEY, self.result),
            (ENTITIES_KEY, Value::Map(self.entities)),
        ])
    }
}

/// Lookup of stored entities for denormalization.
pub trait EntitySource {
    /// Returns the entity of type `kind` with id `id`.
    fn entity(&self, kind: &str, id: &str) -> Option<Map>;
}

/// Entity dictionaries shaped like [`NormalizedPayload::entities`].
impl EntitySource for Map {
    fn entity(&self, kind: &str, id: &str) -> Option<Map> {
        self.get(kind)
            .and_then(|dictionary| dictionary.get(id))
            .and_then(Value::as_map)
            .cloned()
    }
}

pub(super) fn normalize(set: &SchemaSet, value: &Value, schema: &Schema) -> NormalizedPayload {
    let mut entities = Map::new();
    let result = visit(set, value, schema, &mut entities);
    NormalizedPayload { result, entities }
}

fn visit(set: &SchemaSet, value: &Value, schema: &Schema, entities: &mut Map) -> Value {
    match schema {
        Schema::Entity(key) => visit_entity(set, key, value, entities),
        Schema::Array(inner) => {
            let items: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                Value::Map(map) => map.values().collect(),
                other => return other.clone(),
            };
            Value::Array(
                items
                    .into_iter()
                    .map(|item| visit(set, item, inner, entities))
                    .filter(|item| !item.is_nullish())
                    .collect(),
            )
        }
        Schema::Object(fields) => {
            let Value::Map(map) = value else {
                return value.clone();
            };
            let mut out = map.clone();
            for (field, schema) in fields {
                if let Some(nested) = map.get(field) {
                    let resolved = visit(set, nested, schema, entities);
                    if resolved.is_nullish() {
                        out.remove(field);
                    } else {
                        out.insert(field.clone(), resolved);
                    }
                }
            }
            Value::Map(out)
        }
    }
}

fn visit_entity(set: &SchemaSet, key: &str, value: &Value, entities: &mut Map) -> Value {
    let (Some(entity_type), Value::Map(map)) = (set.entity(key), value) else {
        return value.clone();
    };
    // Entities without a usable id stay inline.
    let Some(id) = entity_type.id_of(map) else {
        return value.clone();
    };

    let mut processed = map.clone();
    for (field, schema) in entity_type.relations() {
        if let Some(nested @ (Value::Array(_) | Value::Map(_))) = map.get(field) {
            let resolved = visit(set, nested, schema, entities);
            processed.insert(field.clone(), resolved);
        }
    }

    let dictionary = entities
        .entry(key.to_string())
        .or_insert_with(Value::empty_map);
    if let Some(dictionary) = dictionary.as_map_mut() {
        match dictionary.get_mut(&id) {
            Some(Value::Map(existing)) => existing.extend(processed),
            _ => {
                dictionary.insert(id, Value::Map(processed));
            }
        }
    }

    map.get(entity_type.id_attribute())
        .cloned()
        .unwrap_or_default()
}

pub(super) fn denormalize<S: EntitySource + ?Sized>(
    set: &SchemaSet,
    result: &Value,
    schema: &Schema,
    source: &S,
) -> Value {
    let mut path = Vec::new();
    unvisit(set, result, schema, source, &mut path)
}

fn unvisit<S: EntitySource + ?Sized>(
    set: &SchemaSet,
    value: &Value,
    schema: &Schema,
    source: &S,
    path: &mut Vec<(String, String)>,
) -> Value {
    match schema {
        Schema::Entity(key) => {
            let Some(entity_type) = set.entity(key) else {
                return value.clone();
            };
            let (id, entity) = match value {
                Value::Map(inline) => (entity_type.id_of(inline), Some(inline.clone())),
                other => match other.to_key() {
                    Some(id) => {
                        let stored = source.entity(key, &id);
                        (Some(id), stored)
                    }
                    None => return other.clone(),
                },
            };
            let Some(mut entity) = entity else {
                return Value::Undefined;
            };

            let frame = id.map(|id| (key.clone(), id));
            if let Some(frame) = &frame {
                // Cycle: leave the reference.
                if path.contains(frame) {
                    return value.clone();
                }
                path.push(frame.clone());
            }

            for (field, schema) in entity_type.relations() {
                if let Some(nested) = entity.get(field).filter(|n| !n.is_nullish()).cloned() {
                    let expanded = unvisit(set, &nested, schema, source, path);
                    entity.insert(field.clone(), expanded);
                }
            }

            if frame.is_some() {
                path.pop();
            }
            Value::Map(entity)
        }
        Schema::Array(inner) => match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| unvisit(set, item, inner, source, path))
                    .collect(),
            ),
            other => other.clone(),
        },
        Schema::Object(fields) => match value {
            Value::Map(map) => {
                let mut out = map.clone();
                for (field, schema) in fields {
                    if let Some(nested) = map.get(field).filter(|n| !n.is_nullish()) {
                        out.insert(field.clone(), unvisit(set, nested, schema, source, path));
                    }
                }
                Value::Map(out)
            }
            other => other.clone(),
        },
    }
}
