//! Middle-end assembly with a model mod and a counter mod.

use midend_core::schema::Schema;
use midend_core::{
    create_types, sync_handler, Action, AsyncConfig, CacheState, EntityReducer,
    EntityReducerConfig, Record, SimpleReducer, TypeSpec,
};
use midend_store::{MiddleEnd, Mod, RootState, StoreConfig, StoreError};
use midend_testkit::prelude::*;
use midend_value::Value;
use serde_json::json;
use std::sync::Arc;

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn model_mod() -> Mod {
    let schema = kennel_schema();
    let types = create_types(Some("model"), [("fetchPerson", TypeSpec::Async)]).unwrap();
    let person = Arc::new(schema.bind(Schema::entity(PEOPLE)).unwrap());

    let fetch = Action::from_type(
        types.get("fetchPerson").unwrap(),
        AsyncConfig::new()
            .with_index(true)
            .with_schema(person)
            .with_handler(sync_handler(|args| {
                let id = args.first().and_then(Value::as_integer).unwrap_or_default();
                Ok(v(json!({
                    "id": id,
                    "name": "Ann",
                    "pets": [{ "id": 20, "name": "Ren" }]
                })))
            })),
    );

    let lookup = Arc::clone(&schema);
    Mod::new()
        .with_reducer(EntityReducer::new(EntityReducerConfig::new().with_schema(&schema)))
        .with_schema(schema)
        .with_action("fetchPerson", fetch)
        .with_selector("person", move |state: &RootState, args: &[Value]| {
            let Some(cache) = state.get::<CacheState>("model") else {
                return Value::Undefined;
            };
            let id = args.first().cloned().unwrap_or_default();
            lookup.denormalize(&id, &Schema::entity(PEOPLE), &cache.entities)
        })
}

fn counter_mod() -> Mod {
    let types = create_types(Some("counter"), [("increment", TypeSpec::Simple)]).unwrap();
    let increment = types.simple("increment").unwrap().to_string();

    Mod::new()
        .with_reducer(
            SimpleReducer::builder(0_i64)
                .on(increment.clone(), |s: &i64, _: &Record| s + 1)
                .build()
                .unwrap(),
        )
        .with_action(
            "increment",
            Action::from_type(types.get("increment").unwrap(), AsyncConfig::default()),
        )
}

#[tokio::test]
async fn fetch_then_select_denormalized() {
    let middle_end = MiddleEnd::builder()
        .with_mod("model", model_mod())
        .with_mod("counter", counter_mod())
        .with_store_config(StoreConfig::new().with_log_errors(true))
        .initialize()
        .unwrap();

    let pending = middle_end
        .dispatch_action("model", "fetchPerson", vec![Value::Integer(1)])
        .unwrap()
        .into_pending()
        .unwrap();
    let payload = pending.await.unwrap();
    assert_eq!(payload.get("result"), Some(&Value::Integer(1)));

    let state = middle_end.state();
    let cache = state.branch::<CacheState>("model").unwrap();
    assert_eq!(cache.indexes.get("model/fetchPerson").unwrap().result, Value::Integer(1));
    assert_eq!(
        cache.entities.get(PEOPLE, "1").map(|p| Value::Map(p.clone())),
        Some(v(json!({ "id": 1, "name": "Ann", "pets": [20] })))
    );

    assert_eq!(
        middle_end.select("model", "person", &[Value::Integer(1)]).unwrap(),
        v(json!({ "id": 1, "name": "Ann", "pets": [{ "id": 20, "name": "Ren" }] }))
    );
    assert!(middle_end.schema("model").is_some());
    assert!(middle_end.schema("counter").is_none());
}

#[test]
fn branches_see_every_record() {
    let middle_end = MiddleEnd::builder()
        .with_mod("model", model_mod())
        .with_mod("counter", counter_mod())
        .initialize()
        .unwrap();

    middle_end.dispatch_action("counter", "increment", vec![]).unwrap();

    let state = middle_end.state();
    assert_eq!(*state.branch::<i64>("counter").unwrap(), 1);
    assert!(state.branch::<CacheState>("model").unwrap().indexes.is_empty());
    assert_eq!(
        middle_end.mod_names().collect::<Vec<_>>(),
        vec!["model", "counter"]
    );
}

#[test]
fn deferred_mod_errors_surface() {
    let err = MiddleEnd::builder()
        .with_mods(|| {
            create_types(None, [("", TypeSpec::Simple)])?;
            Ok(Vec::new())
        })
        .initialize()
        .unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));
}
