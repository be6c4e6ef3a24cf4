pub mod config;
pub mod db;
pub mod merge;
pub mod store;
pub mod sync;

#[cfg(feature = "cli")]
pub mod cli;
