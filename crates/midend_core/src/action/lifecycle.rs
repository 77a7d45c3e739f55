//! Async operation lifecycle: BEGIN, then SUCCESS or FAIL.

use super::dispatch::{Dispatch, Outcome, Thunk};
use crate::config::{AsyncConfig, Completion, Handler};
use crate::record::Record;
use crate::types::AsyncType;
use futures::future::{BoxFuture, FutureExt};
use midend_value::Value;
use tracing::debug;

/// Turns a begin payload into handler arguments.
///
/// Arrays are spread into their elements; any other value, including the
/// absent sentinel, becomes a single argument.
pub fn spread(payload: &Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Factory of per-invocation lifecycle workflows.
///
/// An `AsyncAction` holds no state between invocations. Each call to
/// [`invoke`](Self::invoke) yields a [`Thunk`] that, when run, emits BEGIN
/// right away, awaits the handler, and then emits exactly one of SUCCESS or
/// FAIL.
#[derive(Debug, Clone)]
pub struct AsyncAction {
    types: AsyncType,
    config: AsyncConfig,
}

impl AsyncAction {
    /// Creates an action from a type quadruple and configuration.
    pub fn new(types: AsyncType, config: AsyncConfig) -> Self {
        Self { types, config }
    }

    /// Creates an action with only a handler configured.
    pub fn with_handler(types: AsyncType, handler: Handler) -> Self {
        Self::new(types, AsyncConfig::new().with_handler(handler))
    }

    /// The type quadruple.
    pub fn types(&self) -> &AsyncType {
        &self.types
    }

    /// The configuration.
    pub fn config(&self) -> &AsyncConfig {
        &self.config
    }

    /// Builds the workflow for one call.
    pub fn invoke(&self, args: Vec<Value>) -> Thunk {
        let types = self.types.clone();
        let config = self.config.clone();
        Thunk::new(move |dispatch| run(types, config, args, dispatch))
    }
}

fn run(
    types: AsyncType,
    config: AsyncConfig,
    args: Vec<Value>,
    dispatch: Dispatch,
) -> BoxFuture<'static, Outcome> {
    let original = (config.transform)(args);
    let computed = spread(&original);
    let index = config.index.resolve(&types, &computed);

    debug!(kind = %types.begin, index = ?index, "emitting begin");
    dispatch.dispatch(Record::begin(&types, original.clone(), index.clone()));

    let pending = (config.handler)(computed);

    async move {
        match pending.await {
            Ok(value) => {
                let payload = match &config.schema {
                    Some(schema) => schema.normalize(&value).into_value(),
                    None => value,
                };

                debug!(kind = %types.success, index = ?index, "emitting success");
                dispatch.dispatch(Record::success(
                    &types,
                    payload.clone(),
                    original.clone(),
                    index,
                ));

                if let Some(after) = &config.after {
                    after(&Completion {
                        original,
                        result: payload.clone(),
                    });
                }

                Ok(payload)
            }
            Err(rejection) => {
                let error = rejection.into_error();

                debug!(kind = %types.fail, index = ?index, message = %error.message, "emitting fail");
                dispatch.dispatch(Record::fail(&types, error.to_value(), original, index));

                Err(error)
            }
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{handler, sync_handler, transform, IndexBy};
    use crate::error::{OperationError, Rejection};
    use crate::schema::{EntityType, Schema, SchemaSet};
    use crate::types::Phase;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn recording_sink() -> (Dispatch, Arc<Mutex<Vec<Record>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let dispatch = Dispatch::new(move |record: Record| {
            sink.lock().unwrap().push(record.clone());
            record
        });
        (dispatch, log)
    }

    #[test]
    fn spreads_arrays_only() {
        assert_eq!(spread(&v(json!([1, 2]))), vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(spread(&Value::Integer(1)), vec![Value::Integer(1)]);
        assert_eq!(spread(&Value::Undefined), vec![Value::Undefined]);
    }

    #[tokio::test]
    async fn default_handler_echoes_arguments() {
        let action = AsyncAction::new(AsyncType::new("X"), AsyncConfig::default());
        let (dispatch, log) = recording_sink();

        let outcome = action.invoke(vec![v(json!({ "id": 1 }))]).run(dispatch).await;
        assert_eq!(outcome, Ok(v(json!({ "id": 1 }))));

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], Record::begin(action.types(), v(json!({ "id": 1 })), None));
        assert_eq!(
            log[1],
            Record::success(action.types(), v(json!({ "id": 1 })), v(json!({ "id": 1 })), None)
        );
    }

    #[tokio::test]
    async fn array_argument_round_trip() {
        let action = AsyncAction::new(AsyncType::new("X"), AsyncConfig::default());
        let (dispatch, log) = recording_sink();

        let outcome = action
            .invoke(vec![v(json!([{ "id": 2 }, { "id": 3 }]))])
            .run(dispatch)
            .await;

        assert_eq!(outcome, Ok(v(json!([[{ "id": 2 }, { "id": 3 }]]))));
        assert_eq!(log.lock().unwrap()[0].payload, v(json!([[{ "id": 2 }, { "id": 3 }]])));
    }

    #[tokio::test]
    async fn handler_receives_spread_arguments() {
        let action = AsyncAction::new(
            AsyncType::new("SUM"),
            AsyncConfig::new().with_handler(sync_handler(|args| {
                Ok(Value::Integer(args.iter().filter_map(Value::as_integer).sum()))
            })),
        );
        let (dispatch, _) = recording_sink();

        let outcome = action
            .invoke(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
            .run(dispatch)
            .await;
        assert_eq!(outcome, Ok(Value::Integer(6)));
    }

    #[tokio::test]
    async fn begin_is_emitted_before_handler_settles() {
        let (tx, rx) = oneshot::channel::<Value>();
        let gate = Arc::new(Mutex::new(Some(rx)));
        let action = AsyncAction::with_handler(
            AsyncType::new("X"),
            handler(move |_| {
                let rx = gate.lock().unwrap().take();
                async move {
                    match rx {
                        Some(rx) => rx.await.map_err(Rejection::from_error),
                        None => Ok(Value::Null),
                    }
                }
            }),
        );
        let (dispatch, log) = recording_sink();

        let pending = action.invoke(vec![]).run(dispatch);
        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(log.lock().unwrap()[0].phase(), Some(Phase::Begin));

        tx.send(Value::from("done")).unwrap();
        assert_eq!(pending.await, Ok(Value::from("done")));
        assert_eq!(log.lock().unwrap()[1].phase(), Some(Phase::Success));
    }

    #[tokio::test]
    async fn rejection_is_normalized() {
        let thrown = v(json!({ "message": "oops!", "code": "BAD" }));
        let rejected = thrown.clone();
        let action = AsyncAction::with_handler(
            AsyncType::new("X"),
            sync_handler(move |_| Err(Rejection::from(rejected.clone()))),
        );
        let (dispatch, log) = recording_sink();

        let error = action.invoke(vec![Value::Integer(1)]).run(dispatch).await.unwrap_err();
        assert_eq!(error.message, "oops!");
        assert_eq!(error.data, Some(thrown.clone()));

        let log = log.lock().unwrap();
        let fail = &log[1];
        assert_eq!(fail.kind, "X/FAIL");
        assert!(fail.error);
        assert_eq!(fail.payload.get("message"), Some(&Value::from("oops!")));
        assert_eq!(fail.payload.get("data"), Some(&thrown));
        assert_eq!(fail.original(), Some(&Value::Integer(1)));
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let action = AsyncAction::with_handler(
            AsyncType::new("X"),
            handler(|_| async { Err(Rejection::from(OperationError::new("nope"))) }),
        );
        let (dispatch, log) = recording_sink();

        let error = action.invoke(vec![]).run(dispatch).await.unwrap_err();
        assert_eq!(error, OperationError::new("nope"));
        assert!(!log.lock().unwrap()[1].payload.contains_key("data"));
    }

    #[tokio::test]
    async fn index_variants() {
        let cases = [
            (IndexBy::None, None),
            (IndexBy::Base, Some("X")),
            (IndexBy::from("FIXED"), Some("FIXED")),
            (
                IndexBy::computed(|args| {
                    args.first()
                        .and_then(|a| a.get("id"))
                        .and_then(Value::to_key)
                        .map(|id| format!("X-{id}"))
                }),
                Some("X-7"),
            ),
        ];

        for (index, expected) in cases {
            let action = AsyncAction::new(AsyncType::new("X"), AsyncConfig::new().with_index(index));
            let (dispatch, log) = recording_sink();
            action.invoke(vec![v(json!({ "id": 7 }))]).run(dispatch).await.unwrap();

            let log = log.lock().unwrap();
            assert_eq!(log[0].fingerprint(), expected);
            assert_eq!(log[1].fingerprint(), expected);
        }
    }

    #[tokio::test]
    async fn after_sees_original_and_result() {
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        let action = AsyncAction::new(
            AsyncType::new("X"),
            AsyncConfig::new()
                .with_transform(transform(|args| Value::from(args.len() as i64)))
                .with_handler(sync_handler(|_| Ok(Value::from("r"))))
                .with_after(move |completion| {
                    *slot.lock().unwrap() = Some(completion.clone());
                }),
        );
        let (dispatch, _) = recording_sink();

        action.invoke(vec![Value::Null, Value::Null]).run(dispatch).await.unwrap();
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some(Completion {
                original: Value::Integer(2),
                result: Value::from("r"),
            })
        );
    }

    #[tokio::test]
    async fn after_is_skipped_on_failure() {
        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);
        let action = AsyncAction::new(
            AsyncType::new("X"),
            AsyncConfig::new()
                .with_handler(sync_handler(|_| Err(Value::Null.into())))
                .with_after(move |_| *flag.lock().unwrap() = true),
        );
        let (dispatch, _) = recording_sink();

        assert!(action.invoke(vec![]).run(dispatch).await.is_err());
        assert!(!*called.lock().unwrap());
    }

    #[tokio::test]
    async fn success_payload_is_normalized() {
        let set = Arc::new(
            SchemaSet::builder()
                .entity(EntityType::new("dogs"))
                .build()
                .unwrap(),
        );
        let schema = set.bind(Schema::array(Schema::entity("dogs"))).unwrap();
        let action = AsyncAction::new(
            AsyncType::new("LIST"),
            AsyncConfig::new()
                .with_handler(sync_handler(|_| Ok(v(json!([{ "id": 1, "name": "Ren" }])))))
                .with_schema(Arc::new(schema)),
        );
        let (dispatch, log) = recording_sink();

        let payload = action.invoke(vec![]).run(dispatch).await.unwrap();
        assert_eq!(
            payload,
            v(json!({
                "result": [1],
                "entities": { "dogs": { "1": { "id": 1, "name": "Ren" } } }
            }))
        );
        assert!(log.lock().unwrap()[1].has_normalized_payload());
    }
}
