use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::db::{EntityObject, Properties, Timestamp};
use crate::store::Database;
use crate::sync::error::SyncError;
use crate::sync::manager::*;
use crate::sync::paths;
use crate::sync::transport::FolderTransport;

fn props(pairs: &[(&str, &str)]) -> Properties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn object(id: &str, pairs: &[(&str, &str)]) -> EntityObject {
    let now = Timestamp::now();
    EntityObject::new(id, now, now, props(pairs))
}

fn device(root: &Path, remote: &Path, id: &str) -> SyncManager<FolderTransport> {
    let data_dir: PathBuf = root.join(id);
    let transport = FolderTransport::new(
        paths::journals_dir(&data_dir),
        remote.to_path_buf(),
        paths::JOURNAL_SUFFIX,
    );
    SyncManager::new(transport, data_dir, id)
}

fn setup() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let remote = temp.path().join("remote");
    std::fs::create_dir(&remote).unwrap();
    (temp, remote)
}

#[tokio::test]
async fn test_first_sync_pushes_local_journal() {
    let (temp, remote) = setup();
    let phone = device(temp.path(), &remote, "phone");
    let mut db = phone.open_database().unwrap();
    db.insert(object("apple", &[("color", "red")]));

    let report = phone.sync(&mut db).await.unwrap();

    assert_eq!(report.pushed, vec!["phone.journal"]);
    assert!(report.pulled.is_empty());
    assert!(remote.join("phone.journal").exists());
    assert!(temp.path().join("phone/state.json").exists());
    assert!(temp.path().join("phone/sync_state.json").exists());
    assert!(db.pending_save().is_empty());
}

#[tokio::test]
async fn test_devices_exchange_changes() {
    let (temp, remote) = setup();
    let phone = device(temp.path(), &remote, "phone");
    let laptop = device(temp.path(), &remote, "laptop");
    let mut phone_db = phone.open_database().unwrap();
    let mut laptop_db = laptop.open_database().unwrap();

    phone_db.insert(object("apple", &[("color", "red")]));
    phone.sync(&mut phone_db).await.unwrap();

    let report = laptop.sync(&mut laptop_db).await.unwrap();
    assert_eq!(report.pulled, vec!["phone.journal"]);
    assert_eq!(report.changed, 1);
    assert_eq!(
        laptop_db.fetch_object("apple").unwrap().properties,
        props(&[("color", "red")])
    );

    laptop_db.update("apple", props(&[("size", "big")]));
    let report = laptop.sync(&mut laptop_db).await.unwrap();
    assert_eq!(report.pushed, vec!["laptop.journal"]);

    let report = phone.sync(&mut phone_db).await.unwrap();
    assert_eq!(report.pulled, vec!["laptop.journal"]);
    assert_eq!(phone_db.state().snapshot, laptop_db.state().snapshot);
}

#[tokio::test]
async fn test_second_sync_without_changes_moves_nothing() {
    let (temp, remote) = setup();
    let phone = device(temp.path(), &remote, "phone");
    let laptop = device(temp.path(), &remote, "laptop");
    let mut laptop_db = laptop.open_database().unwrap();
    laptop_db.insert(object("pear", &[("color", "green")]));
    laptop.sync(&mut laptop_db).await.unwrap();

    let mut db = phone.open_database().unwrap();
    db.insert(object("apple", &[("color", "red")]));
    phone.sync(&mut db).await.unwrap();

    let report = phone.sync(&mut db).await.unwrap();

    assert_eq!(report, SyncReport::default());
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let (temp, remote) = setup();
    let phone = device(temp.path(), &remote, "phone");
    let mut db = phone.open_database().unwrap();
    db.insert(object("apple", &[("color", "red")]));
    phone.sync(&mut db).await.unwrap();

    let reopened = phone.open_database().unwrap();

    assert_eq!(reopened.state(), db.state());
    assert_eq!(reopened.local_journal(), db.local_journal());
}

#[tokio::test]
async fn test_missing_remote_leaves_sync_state_alone() {
    let temp = TempDir::new().unwrap();
    let phone = device(temp.path(), &temp.path().join("missing"), "phone");
    let mut db = phone.open_database().unwrap();
    db.insert(object("apple", &[("color", "red")]));

    let err = phone.sync(&mut db).await.unwrap_err();

    assert!(matches!(err, SyncError::FetchMetadata(_)));
    assert!(!temp.path().join("phone/sync_state.json").exists());
    assert!(temp.path().join("phone/journals/phone.journal").exists());
}

#[tokio::test]
async fn test_status_reports_store_and_remote() {
    let (temp, remote) = setup();
    let phone = device(temp.path(), &remote, "phone");
    let laptop = device(temp.path(), &remote, "laptop");
    let mut laptop_db = laptop.open_database().unwrap();
    laptop_db.insert(object("pear", &[("color", "green")]));
    laptop.sync(&mut laptop_db).await.unwrap();

    let mut db: Database = phone.open_database().unwrap();
    db.insert(object("apple", &[("color", "red")]));
    phone.sync(&mut db).await.unwrap();

    let status = phone.status(&db).unwrap();

    assert_eq!(status.device_id, "phone");
    assert_eq!(status.objects, 2);
    assert_eq!(status.journals["phone"], 1);
    assert_eq!(status.journals["laptop"], 1);
    assert_eq!(status.known_remote_files, 1);
    assert!(!status.unsaved_changes);
}

#[tokio::test]
async fn test_custom_suffix_names_local_journal() {
    let (temp, remote) = setup();
    let data_dir = temp.path().join("phone");
    let transport = FolderTransport::new(paths::journals_dir(&data_dir), remote.clone(), ".log");
    let phone = SyncManager::new(transport, data_dir, "phone").with_suffix(".log");
    let mut db = phone.open_database().unwrap();
    db.insert(object("apple", &[("color", "red")]));

    let report = phone.sync(&mut db).await.unwrap();

    assert_eq!(report.pushed, vec!["phone.log"]);
    assert!(remote.join("phone.log").exists());
    assert!(!remote.join("phone.journal").exists());
}
