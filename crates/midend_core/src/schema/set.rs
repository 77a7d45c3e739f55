//! Validated collections of entity types.

use super::entity::{EntityType, Schema};
use super::normalize::{self, EntitySource, NormalizedPayload};
use crate::error::{ConfigError, ConfigResult};
use midend_value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Referrer name used when a root shape names an undeclared entity type.
const ROOT_REFERRER: &str = "<root>";

/// Normalization seam used by async actions.
pub trait Normalize: Send + Sync {
    /// Flattens a resolved value into a normalized payload.
    fn normalize(&self, value: &Value) -> NormalizedPayload;
}

/// Entity types whose relations have all been resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSet {
    entities: BTreeMap<String, EntityType>,
}

impl SchemaSet {
    /// Starts building a schema set.
    pub fn builder() -> SchemaSetBuilder {
        SchemaSetBuilder::new()
    }

    /// Looks up an entity type.
    pub fn entity(&self, key: &str) -> Option<&EntityType> {
        self.entities.get(key)
    }

    /// Declared entity type keys, in order.
    pub fn entity_keys(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Declared entity types, in key order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.values()
    }

    /// Number of declared entity types.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity types are declared.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Checks that every entity a shape references is declared.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEntity`] for the first undeclared key.
    pub fn validate(&self, schema: &Schema) -> ConfigResult<()> {
        self.check_references(schema, ROOT_REFERRER)
    }

    /// Flattens `value` according to `schema`.
    pub fn normalize(&self, value: &Value, schema: &Schema) -> NormalizedPayload {
        normalize::normalize(self, value, schema)
    }

    /// Expands ids in `result` back into nested entities from `source`.
    ///
    /// References that would re-enter an entity already being expanded are
    /// left as ids. Ids with no stored entity become `Undefined`.
    pub fn denormalize<S: EntitySource + ?Sized>(
        &self,
        result: &Value,
        schema: &Schema,
        source: &S,
    ) -> Value {
        normalize::denormalize(self, result, schema, source)
    }

    /// Binds a root shape to this set for use as an action schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEntity`] if the shape references an
    /// undeclared entity type.
    pub fn bind(self: &Arc<Self>, schema: Schema) -> ConfigResult<BoundSchema> {
        self.validate(&schema)?;
        Ok(BoundSchema {
            set: Arc::clone(self),
            schema,
        })
    }

    fn check_references(&self, schema: &Schema, referrer: &str) -> ConfigResult<()> {
        let mut refs = Vec::new();
        schema.referenced_entities(&mut refs);
        match refs.into_iter().find(|key| !self.entities.contains_key(*key)) {
            Some(missing) => Err(ConfigError::unknown_entity(missing, referrer)),
            None => Ok(()),
        }
    }
}

/// Collects entity types and resolves their relations once.
#[derive(Debug, Clone, Default)]
pub struct SchemaSetBuilder {
    entities: Vec<EntityType>,
}

impl SchemaSetBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity type.
    #[must_use]
    pub fn entity(mut self, entity: EntityType) -> Self {
        self.entities.push(entity);
        self
    }

    /// Adds several entity types.
    #[must_use]
    pub fn entities<I: IntoIterator<Item = EntityType>>(mut self, entities: I) -> Self {
        self.entities.extend(entities);
        self
    }

    /// Validates and freezes the set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateEntity`] when two types share a key and
    /// [`ConfigError::UnknownEntity`] when a relation names a type that was
    /// not added.
    pub fn build(self) -> ConfigResult<SchemaSet> {
        let mut entities = BTreeMap::new();
        for entity in self.entities {
            let key = entity.key().to_string();
            if entities.insert(key.clone(), entity).is_some() {
                return Err(ConfigError::DuplicateEntity { key });
            }
        }

        let set = SchemaSet { entities };
        for entity in set.entities() {
            for schema in entity.relations().values() {
                set.check_references(schema, entity.key())?;
            }
        }
        Ok(set)
    }
}

/// A root shape bound to the schema set it was validated against.
#[derive(Debug, Clone)]
pub struct BoundSchema {
    set: Arc<SchemaSet>,
    schema: Schema,
}

impl BoundSchema {
    /// The schema set.
    pub fn set(&self) -> &Arc<SchemaSet> {
        &self.set
    }

    /// The root shape.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Expands a normalized result against `source`.
    pub fn denormalize<S: EntitySource + ?Sized>(&self, result: &Value, source: &S) -> Value {
        self.set.denormalize(result, &self.schema, source)
    }
}

impl Normalize for BoundSchema {
    fn normalize(&self, value: &Value) -> NormalizedPayload {
        self.set.normalize(value, &self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_lists_keys() {
        let set = SchemaSet::builder()
            .entity(EntityType::new("people"))
            .entity(EntityType::new("dogs").relation("owner", Schema::entity("people")))
            .build()
            .unwrap();

        assert_eq!(set.entity_keys().collect::<Vec<_>>(), vec!["dogs", "people"]);
        assert_eq!(set.len(), 2);
        assert!(set.entity("cats").is_none());
    }

    #[test]
    fn rejects_duplicates() {
        let err = SchemaSet::builder()
            .entities([EntityType::new("dogs"), EntityType::new("dogs")])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateEntity { key: "dogs".into() });
    }

    #[test]
    fn rejects_unknown_relations() {
        let err = SchemaSet::builder()
            .entity(EntityType::new("people").relation("cats", Schema::array(Schema::entity("cats"))))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::unknown_entity("cats", "people"));
    }

    #[test]
    fn bind_validates_root() {
        let set = Arc::new(SchemaSet::builder().entity(EntityType::new("dogs")).build().unwrap());

        assert!(set.bind(Schema::array(Schema::entity("dogs"))).is_ok());
        let err = set.bind(Schema::entity("cats")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEntity { ref entity, .. } if entity == "cats"));
    }

    #[test]
    fn bound_schema_normalizes() {
        let set = Arc::new(SchemaSet::builder().entity(EntityType::new("dogs")).build().unwrap());
        let bound = set.bind(Schema::entity("dogs")).unwrap();
        let dog = Value::map([("id", Value::Integer(3))]);

        let normalized = bound.normalize(&dog);
        assert_eq!(normalized.result, Value::Integer(3));
        assert_eq!(bound.denormalize(&normalized.result, &normalized.entities), dog);
    }
}
