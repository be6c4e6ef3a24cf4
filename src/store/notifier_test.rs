//! Tests for ChangeNotifier pub/sub system.

use super::notifier::{ChangeEvent, ChangeNotifier, ChangeSource};
use crate::db::{Deltas, EntityObject, Timestamp};

fn event(id: &str) -> ChangeEvent {
    let mut deltas = Deltas::new();
    deltas.insert(id.to_string(), EntityObject::empty(id, Timestamp::now()));
    ChangeEvent {
        source: ChangeSource::Local,
        deltas,
    }
}

#[tokio::test]
async fn test_multiple_subscribers_receive_same_event() {
    let notifier = ChangeNotifier::new();
    let mut sub1 = notifier.subscribe();
    let mut sub2 = notifier.subscribe();

    let msg = event("apple");
    notifier.notify(msg.clone());

    assert_eq!(sub1.recv().await.unwrap(), msg);
    assert_eq!(sub2.recv().await.unwrap(), msg);
}

#[tokio::test]
async fn test_notify_with_no_subscribers_does_not_panic() {
    let notifier = ChangeNotifier::new();
    notifier.notify(event("pear"));
}

#[tokio::test]
async fn test_cloned_notifier_shares_channel() {
    let notifier = ChangeNotifier::new();
    let clone = notifier.clone();
    let mut sub = notifier.subscribe();

    clone.notify(event("plum"));

    let received = sub.recv().await.unwrap();
    assert!(received.deltas.contains_key("plum"));
}
