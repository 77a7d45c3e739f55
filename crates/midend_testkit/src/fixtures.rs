//! Test fixtures.
//!
//! Provides the dog/person schema used across the test suites, a reducer
//! that records everything it sees, a recording dispatch sink, and gated
//! handlers for driving overlapping async invocations by hand.

use midend_core::schema::{EntityType, Schema, SchemaSet};
use midend_core::{Dispatch, Handler, Record, Reducer, Rejection};
use midend_value::Value;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Entity key of dogs.
pub const DOGS: &str = "dogs";
/// Entity key of people.
pub const PEOPLE: &str = "people";

/// Dogs (with an `owner` person) and people (with `pets` dogs).
pub fn kennel_schema() -> Arc<SchemaSet> {
    let set = SchemaSet::builder()
        .entity(EntityType::new(DOGS).relation("owner", Schema::entity(PEOPLE)))
        .entity(EntityType::new(PEOPLE).relation("pets", Schema::array(Schema::entity(DOGS))))
        .build()
        .expect("kennel schema is valid");
    Arc::new(set)
}

/// A dog entity.
pub fn dog(id: i64, name: &str, age: Option<i64>) -> Value {
    let mut fields = vec![("id", Value::Integer(id)), ("name", Value::from(name))];
    if let Some(age) = age {
        fields.push(("age", Value::Integer(age)));
    }
    Value::map(fields)
}

/// A normalized payload holding the given dogs.
pub fn dogs_payload(dogs: &[Value]) -> Value {
    let ids: Vec<Value> = dogs
        .iter()
        .filter_map(|d| d.get("id").cloned())
        .collect();
    let dictionary = dogs
        .iter()
        .filter_map(|d| Some((d.get("id")?.to_key()?, d.clone())))
        .collect();
    Value::map([
        ("result", Value::Array(ids)),
        ("entities", Value::map([(DOGS, Value::Map(dictionary))])),
    ])
}

/// A reducer whose state is every record it has reduced.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordLog;

impl Reducer for RecordLog {
    type State = Vec<Record>;

    fn initial_state(&self) -> Vec<Record> {
        Vec::new()
    }

    fn reduce(&self, state: &Vec<Record>, record: &Record) -> Vec<Record> {
        let mut next = state.clone();
        next.push(record.clone());
        next
    }
}

/// A dispatch sink that keeps every record it receives.
pub fn recording_sink() -> (Dispatch, Arc<Mutex<Vec<Record>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let dispatch = Dispatch::new(move |record: Record| {
        sink.lock().push(record.clone());
        record
    });
    (dispatch, log)
}

/// Releases the invocations of a [`gated_handler`].
#[derive(Debug)]
pub struct Gates {
    senders: Vec<Option<oneshot::Sender<Result<Value, Rejection>>>>,
}

impl Gates {
    /// Settles the `n`th invocation (0-based, in call order).
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range or was already settled.
    pub fn settle(&mut self, n: usize, outcome: Result<Value, Rejection>) {
        let sender = self.senders[n].take().expect("gate already settled");
        sender.send(outcome).expect("invocation dropped");
    }

    /// Resolves the `n`th invocation with `value`.
    pub fn resolve(&mut self, n: usize, value: Value) {
        self.settle(n, Ok(value));
    }

    /// Rejects the `n`th invocation with `value`.
    pub fn reject(&mut self, n: usize, value: Value) {
        self.settle(n, Err(Rejection::Value(value)));
    }
}

/// A handler whose first `count` invocations each wait for a gate.
///
/// Further invocations resolve to `Null` immediately.
pub fn gated_handler(count: usize) -> (Handler, Gates) {
    let mut senders = Vec::with_capacity(count);
    let mut receivers = VecDeque::with_capacity(count);
    for _ in 0..count {
        let (tx, rx) = oneshot::channel();
        senders.push(Some(tx));
        receivers.push_back(rx);
    }
    let receivers = Arc::new(Mutex::new(receivers));

    let handler = midend_core::handler(move |_args| {
        let gate = receivers.lock().pop_front();
        async move {
            match gate {
                Some(rx) => rx.await.unwrap_or_else(|e| Err(Rejection::from_error(e))),
                None => Ok(Value::Null),
            }
        }
    });

    (handler, Gates { senders })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kennel_has_both_types() {
        let schema = kennel_schema();
        assert_eq!(schema.entity_keys().collect::<Vec<_>>(), vec![DOGS, PEOPLE]);
    }

    #[test]
    fn dogs_payload_is_normalized() {
        let payload = dogs_payload(&[dog(20, "Ren", Some(4))]);
        assert!(midend_core::is_normalized(&payload));
        assert_eq!(
            payload.get("entities").and_then(|e| e.get(DOGS)).and_then(|d| d.get("20")),
            Some(&dog(20, "Ren", Some(4)))
        );
    }

    #[test]
    fn record_log_appends() {
        let log = RecordLog;
        let state = log.reduce(&log.initial_state(), &Record::new("A", Value::Null));
        assert_eq!(state.len(), 1);
    }

    #[tokio::test]
    async fn gates_release_in_any_order() {
        let (handler, mut gates) = gated_handler(2);
        let first = handler(vec![]);
        let second = handler(vec![]);

        gates.resolve(1, Value::Integer(2));
        gates.reject(0, Value::from("bad"));

        assert_eq!(second.await, Ok(Value::Integer(2)));
        assert_eq!(first.await, Err(Rejection::Value(Value::from("bad"))));
    }
}
