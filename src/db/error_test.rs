//! Tests for data model error types.

use crate::db::{DbError, DbResult, Timestamp};

#[test]
fn invalid_timestamp_error_displays_correctly() {
    let err = DbError::InvalidTimestamp {
        value: "yesterday".to_string(),
        reason: "input contains invalid characters".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid timestamp 'yesterday': input contains invalid characters"
    );
}

#[test]
fn reserved_key_error_displays_correctly() {
    let err = DbError::ReservedKey {
        key: "_cd".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Reserved key '_cd' is not allowed in a property map"
    );
}

#[test]
fn timestamp_parse_failure_is_invalid_timestamp() {
    let result: DbResult<Timestamp> = Timestamp::parse("2017-13-45");
    assert!(matches!(result, Err(DbError::InvalidTimestamp { .. })));
}
