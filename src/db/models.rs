//! Domain models for the journal store.
//!
//! These are plain values. Metadata (identifier, creation and modification
//! dates) lives in typed fields next to an opaque string property map, so a
//! property can never shadow it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{DbError, DbResult};
use super::utils::TIMESTAMP_FORMAT;

/// Identifier of a stored entity.
pub type EntityId = String;

/// Identifier of a journal (a device for multiplex journals, an entity for histories).
pub type JournalId = String;

/// Opaque user properties of an entity.
pub type Properties = BTreeMap<String, String>;

/// Keys reserved for metadata in the persisted schemas.
pub const IDENTIFIER_KEY: &str = "_id";
pub const CREATION_DATE_KEY: &str = "_cd";
pub const LAST_MODIFIED_KEY: &str = "_lm";
pub const DELETED_KEY: &str = "_de";

pub const RESERVED_KEYS: [&str; 4] = [
    IDENTIFIER_KEY,
    CREATION_DATE_KEY,
    LAST_MODIFIED_KEY,
    DELETED_KEY,
];

/// Returns true if `key` is one of the reserved metadata keys.
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Remove reserved metadata keys from a property map.
pub fn strip_reserved(mut properties: Properties) -> Properties {
    properties.retain(|key, _| !is_reserved_key(key));
    properties
}

/// Fail if the property map carries a reserved metadata key.
pub fn ensure_no_reserved(properties: &Properties) -> DbResult<()> {
    match properties.keys().find(|key| is_reserved_key(key)) {
        Some(key) => Err(DbError::ReservedKey { key: key.clone() }),
        None => Ok(()),
    }
}

// =============================================================================
// Timestamp
// =============================================================================

/// UTC instant with whole-second precision.
///
/// Persisted as `yyyy-MM-ddTHH:mm:ss+0000`. Sub-second precision is dropped at
/// construction so that every timestamp survives a save/load cycle unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current instant, truncated to whole seconds.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime.trunc_subsecs(0))
    }

    /// Build a timestamp from seconds since the Unix epoch.
    pub fn from_unix(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(Self)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn unix(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn parse(value: &str) -> DbResult<Self> {
        DateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
            .map_err(|e| DbError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Timestamp::parse(&value).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Entity objects
// =============================================================================

/// Materialized value of one entity.
///
/// Equality compares identifier and properties only; the dates are
/// bookkeeping and differ between devices that converge on the same value.
#[derive(Debug, Clone, Serialize)]
pub struct EntityObject {
    pub identifier: EntityId,
    pub creation_date: Timestamp,
    pub last_modified_date: Timestamp,
    pub properties: Properties,
}

impl EntityObject {
    /// Create an object, dropping any reserved keys from `properties`.
    pub fn new(
        identifier: impl Into<EntityId>,
        creation_date: Timestamp,
        last_modified_date: Timestamp,
        properties: Properties,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            creation_date,
            last_modified_date,
            properties: strip_reserved(properties),
        }
    }

    /// An object with no properties, created and modified at `at`.
    pub fn empty(identifier: impl Into<EntityId>, at: Timestamp) -> Self {
        Self::new(identifier, at, at, Properties::new())
    }

    /// An object whose identifier will be assigned on insert.
    pub fn unassigned(properties: Properties) -> Self {
        Self::new(String::new(), Timestamp::now(), Timestamp::now(), properties)
    }

    pub fn is_unassigned(&self) -> bool {
        self.identifier.is_empty()
    }

    /// Overlay `properties` on top of this object's properties.
    pub fn apply(&mut self, properties: &Properties) {
        for (key, value) in properties {
            self.properties.insert(key.clone(), value.clone());
        }
    }

    /// The subset of `properties` whose values differ from this object's.
    pub fn changed_properties(&self, properties: &Properties) -> Properties {
        properties
            .iter()
            .filter(|(key, value)| self.properties.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl PartialEq for EntityObject {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.properties == other.properties
    }
}

impl Eq for EntityObject {}

// =============================================================================
// Diffs and journals
// =============================================================================

/// A timestamped partial property update for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub identifier: EntityId,
    pub timestamp: Timestamp,
    pub properties: Properties,
}

impl Diff {
    pub fn new(identifier: impl Into<EntityId>, timestamp: Timestamp, properties: Properties) -> Self {
        Self {
            identifier: identifier.into(),
            timestamp,
            properties,
        }
    }
}

/// An ordered log of diffs.
///
/// As a multiplex journal it is one device's append-only log; as a
/// single-entity journal it is one entity's history, sorted by timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journal {
    pub identifier: JournalId,
    pub diffs: Vec<Diff>,
}

impl Journal {
    pub fn new(identifier: impl Into<JournalId>, diffs: Vec<Diff>) -> Self {
        Self {
            identifier: identifier.into(),
            diffs,
        }
    }

    pub fn empty(identifier: impl Into<JournalId>) -> Self {
        Self::new(identifier, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.diffs.last().map(|diff| diff.timestamp)
    }
}

/// Journals keyed by identifier.
pub type JournalSet = BTreeMap<JournalId, Journal>;

/// Last-seen copy of each device's multiplex journal.
pub type JournalCache = JournalSet;

/// Full sorted diff history of each entity.
pub type ObjectHistories = JournalSet;

/// Only-new diffs per entity, produced by demux.
pub type EntityPatch = JournalSet;

/// Materialized current value of every known entity.
pub type Snapshot = BTreeMap<EntityId, EntityObject>;

/// Observable property-level changes keyed by entity.
pub type Deltas = BTreeMap<EntityId, EntityObject>;

/// Snapshot plus the histories it was folded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub snapshot: Snapshot,
    pub histories: ObjectHistories,
}

impl StoreState {
    pub fn new(snapshot: Snapshot, histories: ObjectHistories) -> Self {
        Self {
            snapshot,
            histories,
        }
    }

    /// Append a diff to the history of its entity, creating the history if needed.
    pub fn record(&mut self, diff: Diff) {
        self.histories
            .entry(diff.identifier.clone())
            .or_insert_with(|| Journal::empty(diff.identifier.clone()))
            .diffs
            .push(diff);
    }
}
