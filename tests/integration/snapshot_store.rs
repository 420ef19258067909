//! Integration tests for snapshot persistence

use crate::common::records;
use tempfile::TempDir;
use youtube_subscription_transfer::snapshot::{SnapshotError, SnapshotStore};
use youtube_subscription_transfer::SubscriptionRecord;

fn full_record(i: usize) -> SubscriptionRecord {
    SubscriptionRecord {
        channel_id: format!("UC{i}"),
        channel_title: format!("Channel {i}"),
        channel_description: format!("About channel {i}"),
        published_at: format!("2023-0{}-01T12:00:00Z", i + 1),
        subscription_id: format!("sub-{i}"),
    }
}

#[test]
fn test_snapshot_preserves_records_and_order() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("subscriptions_backup.json"));
    let items: Vec<_> = (0..3).map(full_record).collect();

    store.save(&items).unwrap();

    assert_eq!(store.try_load().unwrap(), items);
}

#[test]
fn test_snapshot_document_fields() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("subscriptions_backup.json"));
    store.save(&records(2)).unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(value["total_subscriptions"], 2);
    assert!(value["export_date"].is_string());
    assert_eq!(value["subscriptions"][1]["channel_id"], "UC1");
    assert_eq!(value["subscriptions"][1]["channel_title"], "Channel 1");

    let document = store.try_load_document().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(&document.export_date).is_ok());
}

#[test]
fn test_snapshot_accepts_minimal_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("subscriptions_backup.json");
    std::fs::write(
        &path,
        r#"{
            "export_date": "2024-01-01T00:00:00",
            "total_subscriptions": 1,
            "subscriptions": [{"channel_id": "UCmin", "channel_title": "Minimal"}]
        }"#,
    )
    .unwrap();

    let items = SnapshotStore::new(&path).load();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].channel_id, "UCmin");
    assert!(items[0].subscription_id.is_empty());
}

#[test]
fn test_snapshot_drops_records_without_channel_id() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("subscriptions_backup.json");
    std::fs::write(
        &path,
        r#"{
            "export_date": "2024-01-01T00:00:00",
            "total_subscriptions": 2,
            "subscriptions": [
                {"channel_id": "", "channel_title": "Broken"},
                {"channel_id": "UCok", "channel_title": "Fine"}
            ]
        }"#,
    )
    .unwrap();

    let items = SnapshotStore::new(&path).load();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].channel_id, "UCok");
}

#[test]
fn test_missing_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("absent.json"));

    assert!(!store.exists());
    assert!(matches!(store.try_load(), Err(SnapshotError::NotFound(_))));
    assert!(store.load().is_empty());
}
