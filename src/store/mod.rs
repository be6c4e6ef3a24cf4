//! Store orchestrator and its seams.
//!
//! - `database`: the single entry point mutating store state
//! - `notifier`: optional broadcast of deltas
//! - `persistence`: save plans and the persistence trait

mod database;
mod notifier;
#[cfg(test)]
mod notifier_test;
mod persistence;
#[cfg(test)]
mod persistence_test;

pub use database::{Applied, Database, MergeOutcome};
pub use notifier::{ChangeEvent, ChangeNotifier, ChangeSource};
#[cfg(test)]
pub use persistence::MockStatePersistence;
pub use persistence::{FilePersistence, SavePlan, StatePersistence, StoreError};
