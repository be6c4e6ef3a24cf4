//! Data model for the journal store.
//!
//! # Architecture
//!
//! - `error`: model construction errors
//! - `models`: entities, diffs, journals, snapshot and state
//! - `utils`: identifier generation and the timestamp format

mod error;
mod models;
pub mod utils;

#[cfg(test)]
mod error_test;

pub use error::{DbError, DbResult};
pub use models::*;
