//! Journal merge engine.
//!
//! `demux` turns device journals into per-entity patches of unseen diffs;
//! `state` folds those patches into the snapshot and histories. Neither step
//! can fail: inputs are validated when they are deserialized.

mod demux;
#[cfg(test)]
mod demux_test;
mod state;

pub use demux::{DemuxResult, demux_journals};
pub use state::{GeneratedState, fold_diffs, generate_state, object_delta};
