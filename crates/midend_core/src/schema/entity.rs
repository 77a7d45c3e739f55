//! Entity types and schema shapes.

use midend_value::{Map, Value};
use std::collections::BTreeMap;

/// Default id attribute of an entity type.
pub const DEFAULT_ID_ATTRIBUTE: &str = "id";

/// Shape of a value with respect to entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    /// One entity of the named type.
    Entity(String),
    /// A sequence of values of the inner shape.
    Array(Box<Schema>),
    /// A map whose listed fields have the given shapes; other fields pass through.
    Object(BTreeMap<String, Schema>),
}

impl Schema {
    /// Shape of one entity.
    pub fn entity(key: impl Into<String>) -> Self {
        Schema::Entity(key.into())
    }

    /// Shape of a sequence.
    pub fn array(inner: Schema) -> Self {
        Schema::Array(Box::new(inner))
    }

    /// Shape of a map with typed fields.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Schema::Object(fields.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    /// Visits every entity key this shape references.
    pub(crate) fn referenced_entities<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Schema::Entity(key) => out.push(key),
            Schema::Array(inner) => inner.referenced_entities(out),
            Schema::Object(fields) => {
                for schema in fields.values() {
                    schema.referenced_entities(out);
                }
            }
        }
    }
}

/// A kind of domain entity: its key, id attribute and relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    key: String,
    id_attribute: String,
    relations: BTreeMap<String, Schema>,
}

impl EntityType {
    /// Creates an entity type with the default id attribute and no relations.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id_attribute: DEFAULT_ID_ATTRIBUTE.to_string(),
            relations: BTreeMap::new(),
        }
    }

    /// Sets the id attribute.
    #[must_use]
    pub fn with_id_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.id_attribute = attribute.into();
        self
    }

    /// Declares a relation field.
    #[must_use]
    pub fn relation(mut self, field: impl Into<String>, schema: Schema) -> Self {
        self.relations.insert(field.into(), schema);
        self
    }

    /// The entity type key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The id attribute.
    pub fn id_attribute(&self) -> &str {
        &self.id_attribute
    }

    /// Relation fields and their shapes.
    pub fn relations(&self) -> &BTreeMap<String, Schema> {
        &self.relations
    }

    /// Reads the id of an entity as a dictionary key.
    pub fn id_of(&self, entity: &Map) -> Option<String> {
        entity.get(&self.id_attribute).and_then(Value::to_key)
    }

    /// Projects an entity onto its id plus the listed fields it has.
    ///
    /// Returns `None` when none of the listed fields are present.
    pub fn related_fields(&self, entity: &Map, fields: &[&str]) -> Option<Value> {
        let mut projected = Map::new();
        projected.insert(
            self.id_attribute.clone(),
            entity.get(&self.id_attribute).cloned().unwrap_or_default(),
        );
        for field in fields {
            if let Some(value) = entity.get(*field) {
                projected.insert((*field).to_string(), value.clone());
            }
        }

        (projected.len() > 1).then_some(Value::Map(projected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(json: serde_json::Value) -> Map {
        match Value::from(json) {
            Value::Map(m) => m,
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn entity_defaults() {
        let dogs = EntityType::new("dogs");
        assert_eq!(dogs.key(), "dogs");
        assert_eq!(dogs.id_attribute(), "id");
        assert!(dogs.relations().is_empty());
        assert_eq!(dogs.id_of(&map(json!({ "id": 20 }))), Some("20".into()));
        assert_eq!(dogs.id_of(&map(json!({ "name": "Ren" }))), None);
    }

    #[test]
    fn custom_id_attribute() {
        let people = EntityType::new("people").with_id_attribute("slug");
        assert_eq!(people.id_of(&map(json!({ "slug": "ann" }))), Some("ann".into()));
    }

    #[test]
    fn related_fields_projection() {
        let dogs = EntityType::new("dogs");
        let dog = map(json!({ "id": 20, "name": "Ren", "age": 4 }));

        assert_eq!(
            dogs.related_fields(&dog, &["name", "color"]),
            Some(Value::from(json!({ "id": 20, "name": "Ren" })))
        );
        assert_eq!(dogs.related_fields(&dog, &["color"]), None);
        assert_eq!(dogs.related_fields(&dog, &[]), None);
    }

    #[test]
    fn collects_references() {
        let schema = Schema::object([
            ("owner", Schema::entity("people")),
            ("pack", Schema::array(Schema::entity("dogs"))),
        ]);
        let mut refs = Vec::new();
        schema.referenced_entities(&mut refs);
        refs.sort_unstable();
        assert_eq!(refs, vec!["dogs", "people"]);
    }
}
