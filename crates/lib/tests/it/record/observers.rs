use std::sync::{Arc, Mutex};

use objectbase::{ObserverCollection, RecordEvent, SyncFailure, Table};
use serde_json::json;

use crate::helpers::{GatedRemote, pet_row};

fn recording_table(remote: &Arc<GatedRemote>) -> (Table, Arc<Mutex<Vec<RecordEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let table = remote
        .table("pets")
        .with_observer(move |event: &RecordEvent| sink.lock().unwrap().push(event.clone()));
    (table, events)
}

fn names(events: &Mutex<Vec<RecordEvent>>) -> Vec<&'static str> {
    events.lock().unwrap().iter().map(RecordEvent::name).collect()
}

#[tokio::test]
async fn test_event_sequence_for_update_and_delete() {
    let remote = GatedRemote::new();
    remote.store().seed("pets", pet_row(1, "Old", "Lab"));
    let (table, events) = recording_table(&remote);
    let record = table.select_by_id(1).await.unwrap();

    record.update_field("name", json!("Pip"));
    record.sync().await;
    record.delete();
    record.sync().await;
    record.update_field("name", json!("Ghost"));

    assert_eq!(
        names(&events),
        vec![
            "operation_issued",
            "operation_settled",
            "quiescent",
            "operation_issued",
            "operation_settled",
            "deleted",
            "operation_rejected",
        ]
    );
    assert!(
        events
            .lock()
            .unwrap()
            .iter()
            .all(|e| e.table() == "pets" && e.record_id() == record.id())
    );
}

#[tokio::test]
async fn test_observers_do_not_change_outcomes() {
    let remote = GatedRemote::new();
    remote.fail_updates_to("breed");
    remote.store().seed("pets", pet_row(1, "Old", "Lab"));
    let (table, events) = recording_table(&remote);
    let table = table.with_observer(|_: &RecordEvent| {});
    let record = table.select_by_id(1).await.unwrap();

    record.update_field("breed", json!("Pug"));
    let report = record.sync().await;
    assert_eq!(report.failed_fields(), vec!["breed"]);

    let settled = events
        .lock()
        .unwrap()
        .iter()
        .find_map(|event| match event {
            RecordEvent::OperationSettled { outcome, .. } => Some(outcome.clone()),
            _ => None,
        })
        .expect("settled event emitted");
    assert!(!settled.is_success());
}

#[tokio::test]
async fn test_collection_and_failures_from_crate_root() {
    let remote = GatedRemote::new();
    remote.fail_updates_to("breed");
    let record = remote.record("pets", pet_row(1, "Old", "Lab"));

    let count = Arc::new(Mutex::new(0));
    let sink = count.clone();
    let mut observers = ObserverCollection::new();
    observers.add_observer(Arc::new(move |_: &RecordEvent| *sink.lock().unwrap() += 1));
    assert_eq!(observers.len(), 1);

    record.update_field("breed", json!("Pug"));
    let failures: Vec<SyncFailure> = record.sync().await.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].field.as_deref(), Some("breed"));

    let event = RecordEvent::Quiescent {
        table: "pets".to_string(),
        record_id: record.id().clone(),
    };
    observers.notify(&event);
    assert_eq!(*count.lock().unwrap(), 1);
}
