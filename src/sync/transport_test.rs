use tempfile::TempDir;

use crate::sync::transport::*;

fn setup() -> (TempDir, FolderTransport) {
    let temp = TempDir::new().unwrap();
    let local = temp.path().join("local");
    let remote = temp.path().join("remote");
    std::fs::create_dir(&local).unwrap();
    std::fs::create_dir(&remote).unwrap();
    let transport = FolderTransport::new(local, remote, ".journal");
    (temp, transport)
}

#[tokio::test]
async fn test_remote_metadata_lists_managed_files() {
    let (temp, transport) = setup();
    std::fs::write(temp.path().join("remote/b.journal"), "{}").unwrap();
    std::fs::write(temp.path().join("remote/other.txt"), "{}").unwrap();

    let metadata = transport.fetch_remote_metadata().await.unwrap();

    assert_eq!(metadata.keys().collect::<Vec<_>>(), vec!["b.journal"]);
    assert_eq!(metadata["b.journal"].filesize, 2);
}

#[tokio::test]
async fn test_missing_remote_directory_is_an_error() {
    let temp = TempDir::new().unwrap();
    let transport = FolderTransport::new(temp.path().into(), temp.path().join("nope"), ".journal");

    let err = transport.fetch_remote_metadata().await.unwrap_err();

    assert!(matches!(err, TransportError::Remote { .. }));
}

#[tokio::test]
async fn test_pull_and_push_copy_files() {
    let (temp, transport) = setup();
    std::fs::write(temp.path().join("remote/b.journal"), "remote").unwrap();
    std::fs::write(temp.path().join("local/a.journal"), "local").unwrap();

    transport.pull(&["b.journal".to_string()]).await.unwrap();
    transport.push(&["a.journal".to_string()]).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(temp.path().join("local/b.journal")).unwrap(),
        "remote"
    );
    assert_eq!(
        std::fs::read_to_string(temp.path().join("remote/a.journal")).unwrap(),
        "local"
    );
}

#[tokio::test]
async fn test_pull_of_missing_file_fails() {
    let (_temp, transport) = setup();

    let err = transport.pull(&["gone.journal".to_string()]).await.unwrap_err();

    assert!(matches!(
        err,
        TransportError::MissingFile { ref filename } if filename == "gone.journal"
    ));
}

#[tokio::test]
async fn test_fetch_to_custom_destination() {
    let (temp, transport) = setup();
    std::fs::write(temp.path().join("remote/b.journal"), "data").unwrap();
    let destination = temp.path().join("copy.journal");

    transport.fetch("b.journal", &destination).await.unwrap();

    assert_eq!(std::fs::read_to_string(destination).unwrap(), "data");
}
