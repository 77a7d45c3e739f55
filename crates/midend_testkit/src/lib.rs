//! # Midend Testkit
//!
//! Test utilities for midend.
//!
//! This crate provides:
//! - Fixtures: the dog/person schema, a recording reducer and sink, gated
//!   handlers for overlapping invocations
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use midend_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn overlapping() {
//!     let (handler, mut gates) = gated_handler(2);
//!     // ... start two invocations, then settle them in any order
//!     gates.resolve(1, Value::Null);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
