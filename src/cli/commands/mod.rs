//! Command implementations for the CLI.

pub mod object;
pub mod sync;
