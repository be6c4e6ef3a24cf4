//! Identifier and timestamp helpers.

use uuid::Uuid;

/// chrono format for persisted timestamps, e.g. `2017-11-04T10:00:00+0000`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Generate a random identifier for a new entity, unique across devices.
pub fn generate_entity_id() -> String {
    Uuid::new_v4().to_string()
}
