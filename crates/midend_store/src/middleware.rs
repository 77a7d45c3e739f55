//! Record middleware.
//!
//! Middleware sees every record on its way to the reducer and decides
//! whether, and in what form, to pass it on.

use midend_core::Record;
use std::sync::Arc;
use tracing::error;

/// A link in the dispatch chain.
pub trait Middleware: Send + Sync {
    /// Handles a record. Call `next.run` to continue the chain.
    fn handle(&self, record: Record, next: Next<'_>) -> Record;
}

/// The rest of the dispatch chain after the current middleware.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    reduce: &'a dyn Fn(Record) -> Record,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware>], reduce: &'a dyn Fn(Record) -> Record) -> Self {
        Self { chain, reduce }
    }

    /// Passes the record to the next middleware, or to the reducer.
    pub fn run(self, record: Record) -> Record {
        match self.chain.split_first() {
            Some((head, rest)) => head.handle(
                record,
                Next {
                    chain: rest,
                    reduce: self.reduce,
                },
            ),
            None => (self.reduce)(record),
        }
    }
}

/// Logs every record flagged as an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorLogger;

impl Middleware for ErrorLogger {
    fn handle(&self, record: Record, next: Next<'_>) -> Record {
        if record.error {
            error!(
                kind = %record.kind,
                meta = ?record.meta,
                payload = %record.payload,
                "error from action"
            );
        }
        next.run(record)
    }
}

impl<F> Middleware for F
where
    F: Fn(Record, Next<'_>) -> Record + Send + Sync,
{
    fn handle(&self, record: Record, next: Next<'_>) -> Record {
        self(record, next)
    }
}
