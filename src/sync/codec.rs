//! Persisted document formats.
//!
//! Journal files, the journal cache and the store state are written as JSON
//! (YAML is accepted for state dumps). Layouts:
//!
//! ```text
//! journal file   {"_id": <device>, "df": [{"_id": <entity>, "ts": .., "pr": {..}}, ..]}
//! journal cache  {<device>: {"df": [{"_id": <entity>, "ts": .., "pr": {..}}, ..]}}
//! snapshot       {<entity>: {<key>: <value>, .., "_cd": .., "_lm": ..}}
//! histories      {<entity>: {"df": [{"ts": .., "pr": {..}}, ..]}}
//! state          {"snapshot": <snapshot>, "histories": <histories>}
//! ```
//!
//! Every diff is validated here so the merge engine only ever sees
//! well-formed values.

use miette::Diagnostic;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::db::{
    CREATION_DATE_KEY, DbError, Diff, EntityObject, Journal, JournalCache, JournalSet,
    LAST_MODIFIED_KEY, ObjectHistories, Properties, Snapshot, StoreState, Timestamp,
    ensure_no_reserved,
};

/// Errors that can occur while reading or writing documents.
#[derive(Error, Diagnostic, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    #[diagnostic(code(driftdb::sync::codec::io))]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(driftdb::sync::codec::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    #[diagnostic(code(driftdb::sync::codec::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid document: {message}")]
    #[diagnostic(code(driftdb::sync::codec::invalid_document))]
    InvalidDocument { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Db(#[from] DbError),
}

/// Text encoding of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// Pick a format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

// =============================================================================
// Wire records
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct DiffRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    identifier: Option<String>,
    ts: Timestamp,
    pr: Properties,
}

impl DiffRecord {
    fn from_diff(diff: &Diff, with_identifier: bool) -> Self {
        Self {
            identifier: with_identifier.then(|| diff.identifier.clone()),
            ts: diff.timestamp,
            pr: diff.properties.clone(),
        }
    }

    /// `implied` is the identifier given by the container key, if any.
    fn into_diff(self, implied: Option<&str>) -> Result<Diff, CodecError> {
        ensure_no_reserved(&self.pr)?;
        let identifier = match (implied, self.identifier) {
            (Some(id), _) => id.to_string(),
            (None, Some(id)) => id,
            (None, None) => {
                return Err(CodecError::InvalidDocument {
                    message: "diff entry is missing its \"_id\"".to_string(),
                });
            }
        };
        Ok(Diff::new(identifier, self.ts, self.pr))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalRecord {
    #[serde(rename = "_id")]
    identifier: String,
    df: Vec<DiffRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DiffList {
    df: Vec<DiffRecord>,
}

type SnapshotRecord = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Serialize, Deserialize)]
struct StateRecord {
    snapshot: SnapshotRecord,
    histories: BTreeMap<String, DiffList>,
}

// =============================================================================
// Conversions
// =============================================================================

fn journal_to_record(journal: &Journal) -> JournalRecord {
    JournalRecord {
        identifier: journal.identifier.clone(),
        df: journal
            .diffs
            .iter()
            .map(|diff| DiffRecord::from_diff(diff, true))
            .collect(),
    }
}

fn journal_from_record(record: JournalRecord) -> Result<Journal, CodecError> {
    let diffs = record
        .df
        .into_iter()
        .map(|diff| diff.into_diff(None))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Journal::new(record.identifier, diffs))
}

fn journal_set_to_record(set: &JournalSet, with_identifier: bool) -> BTreeMap<String, DiffList> {
    set.iter()
        .map(|(id, journal)| {
            let df = journal
                .diffs
                .iter()
                .map(|diff| DiffRecord::from_diff(diff, with_identifier))
                .collect();
            (id.clone(), DiffList { df })
        })
        .collect()
}

/// With `implied_identifier`, diffs take their identifier from the journal key.
fn journal_set_from_record(
    record: BTreeMap<String, DiffList>,
    implied_identifier: bool,
) -> Result<JournalSet, CodecError> {
    let mut set = JournalSet::new();
    for (id, list) in record {
        let implied = implied_identifier.then_some(id.as_str());
        let diffs = list
            .df
            .into_iter()
            .map(|diff| diff.into_diff(implied))
            .collect::<Result<Vec<_>, _>>()?;
        set.insert(id.clone(), Journal::new(id, diffs));
    }
    Ok(set)
}

fn snapshot_to_record(snapshot: &Snapshot) -> SnapshotRecord {
    snapshot
        .iter()
        .map(|(id, object)| {
            let mut fields = object.properties.clone();
            fields.insert(CREATION_DATE_KEY.to_string(), object.creation_date.to_string());
            fields.insert(
                LAST_MODIFIED_KEY.to_string(),
                object.last_modified_date.to_string(),
            );
            (id.clone(), fields)
        })
        .collect()
}

fn snapshot_from_record(record: SnapshotRecord) -> Result<Snapshot, CodecError> {
    let mut snapshot = Snapshot::new();
    for (id, fields) in record {
        let creation_date = match fields.get(CREATION_DATE_KEY) {
            Some(value) => Timestamp::parse(value)?,
            None => {
                return Err(CodecError::InvalidDocument {
                    message: format!("object '{}' has no \"{}\"", id, CREATION_DATE_KEY),
                });
            }
        };
        let last_modified = match fields.get(LAST_MODIFIED_KEY) {
            Some(value) => Timestamp::parse(value)?,
            None => creation_date,
        };
        let object = EntityObject::new(id.clone(), creation_date, last_modified, fields);
        snapshot.insert(id, object);
    }
    Ok(snapshot)
}

// =============================================================================
// Text encoding
// =============================================================================

fn encode<T: Serialize>(value: &T, format: Format) -> Result<String, CodecError> {
    Ok(match format {
        Format::Json => serde_json::to_string(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    })
}

fn decode<T: DeserializeOwned>(text: &str, format: Format) -> Result<T, CodecError> {
    Ok(match format {
        Format::Json => serde_json::from_str(text)?,
        Format::Yaml => serde_yaml::from_str(text)?,
    })
}

fn write_text(path: &Path, text: &str) -> Result<(), CodecError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Encode one device's multiplex journal.
pub fn encode_journal(journal: &Journal) -> Result<String, CodecError> {
    encode(&journal_to_record(journal), Format::Json)
}

/// Decode a multiplex journal. Every diff must carry its entity `_id`.
pub fn decode_journal(text: &str) -> Result<Journal, CodecError> {
    journal_from_record(decode(text, Format::Json)?)
}

pub fn encode_journal_cache(cache: &JournalCache) -> Result<String, CodecError> {
    encode(&journal_set_to_record(cache, true), Format::Json)
}

pub fn decode_journal_cache(text: &str) -> Result<JournalCache, CodecError> {
    journal_set_from_record(decode(text, Format::Json)?, false)
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String, CodecError> {
    encode(&snapshot_to_record(snapshot), Format::Json)
}

pub fn decode_snapshot(text: &str) -> Result<Snapshot, CodecError> {
    snapshot_from_record(decode(text, Format::Json)?)
}

pub fn encode_histories(histories: &ObjectHistories) -> Result<String, CodecError> {
    encode(&journal_set_to_record(histories, false), Format::Json)
}

pub fn decode_histories(text: &str) -> Result<ObjectHistories, CodecError> {
    journal_set_from_record(decode(text, Format::Json)?, true)
}

pub fn encode_state(state: &StoreState, format: Format) -> Result<String, CodecError> {
    let record = StateRecord {
        snapshot: snapshot_to_record(&state.snapshot),
        histories: journal_set_to_record(&state.histories, false),
    };
    encode(&record, format)
}

pub fn decode_state(text: &str, format: Format) -> Result<StoreState, CodecError> {
    let record: StateRecord = decode(text, format)?;
    Ok(StoreState::new(
        snapshot_from_record(record.snapshot)?,
        journal_set_from_record(record.histories, true)?,
    ))
}

// =============================================================================
// Files
// =============================================================================

pub fn read_journal(path: &Path) -> Result<Journal, CodecError> {
    decode_journal(&std::fs::read_to_string(path)?)
}

pub fn write_journal(path: &Path, journal: &Journal) -> Result<(), CodecError> {
    write_text(path, &encode_journal(journal)?)
}

pub fn read_journal_cache(path: &Path) -> Result<JournalCache, CodecError> {
    decode_journal_cache(&std::fs::read_to_string(path)?)
}

pub fn write_journal_cache(path: &Path, cache: &JournalCache) -> Result<(), CodecError> {
    write_text(path, &encode_journal_cache(cache)?)
}

/// Read a state file, choosing JSON or YAML from its extension.
pub fn read_state(path: &Path) -> Result<StoreState, CodecError> {
    decode_state(&std::fs::read_to_string(path)?, Format::from_path(path))
}

/// Write a state file, choosing JSON or YAML from its extension.
pub fn write_state(path: &Path, state: &StoreState) -> Result<(), CodecError> {
    write_text(path, &encode_state(state, Format::from_path(path))?)
}
