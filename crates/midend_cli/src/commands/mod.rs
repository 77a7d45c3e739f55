//! CLI command implementations.

pub mod classify;
pub mod replay;
