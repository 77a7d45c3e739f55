//! Notification feed for reduced records.
//!
//! Every record that reaches the reducer is published here after the state
//! has been replaced, so a subscriber reading the store on receipt always
//! sees a state that includes the record.
//!
//! # Usage
//!
//! ```rust,ignore
//! let receiver = store.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(event) = receiver.recv() {
//!         println!("{} {}", event.sequence, event.record.kind);
//!     }
//! });
//! ```

use midend_core::Record;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

/// One reduced record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent {
    /// Position of the record in reduction order, starting at 1.
    pub sequence: u64,
    /// The record as it reached the reducer.
    pub record: Record,
}

/// Distributes reduced records to subscribers.
#[derive(Debug, Default)]
pub struct Feed {
    subscribers: RwLock<Vec<Sender<StoreEvent>>>,
    sequence: AtomicU64,
}

impl Feed {
    /// Creates a feed with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to future records.
    ///
    /// The receiver should be drained regularly to avoid unbounded memory growth.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Publishes a record, dropping disconnected subscribers.
    pub fn emit(&self, record: &Record) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let event = StoreEvent {
            sequence,
            record: record.clone(),
        };

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        sequence
    }

    /// Sequence number of the last published record, or 0.
    pub fn latest_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
