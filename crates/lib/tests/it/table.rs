use std::sync::Arc;

use objectbase::{InMemoryRemote, RecordConfig, RecordError, RecordId, Table};
use serde_json::json;

use crate::helpers::{GatedRemote, pet_row, row};

#[tokio::test]
async fn test_insert_returns_record_with_assigned_id() {
    let table = Table::new(Arc::new(InMemoryRemote::new()), "pets");
    let record = table
        .insert(row(&[("name", json!("Rex")), ("breed", json!("Lab"))]))
        .await
        .unwrap();
    assert_eq!(record.id(), &RecordId::Int(1));
    assert_eq!(record.table(), "pets");
    assert!(record.ready_to_read());
    assert_eq!(record.content().unwrap()["id"], json!(1));
}

#[tokio::test]
async fn test_selects_produce_independent_records() {
    let remote = GatedRemote::new();
    remote.store().seed("pets", pet_row(1, "Rex", "Lab"));
    remote.store().seed("pets", pet_row(2, "Pip", "Pug"));
    remote.store().seed("pets", pet_row(3, "Ace", "Lab"));
    let table = remote.table("pets");

    let labs = table.select_by_field("breed", &json!("Lab")).await.unwrap();
    assert_eq!(labs.len(), 2);

    // Writes to one record never make another busy
    labs[0].update_field("name", json!("Max"));
    assert!(!labs[0].ready_to_read());
    assert!(labs[1].ready_to_read());
    labs[0].sync().await;

    let all = table.select_all().await.unwrap();
    assert_eq!(all.len(), 3);
    let rex = table.select_by_id(1).await.unwrap();
    assert_eq!(rex.content().unwrap()["name"], json!("Max"));
}

#[tokio::test]
async fn test_select_missing_row() {
    let table = Table::new(Arc::new(InMemoryRemote::new()), "pets");
    let err = table.select_by_id("nope").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.is_remote_error());
}

#[tokio::test]
async fn test_config_flows_into_records() {
    let remote = GatedRemote::new();
    let config = RecordConfig {
        operation_timeout_ms: Some(1_000),
        ..Default::default()
    };
    let table = remote.table("pets").with_config(config.clone());
    let record = table.insert(row(&[("name", json!("Rex"))])).await.unwrap();
    assert_eq!(record.config(), &config);

    let err = table
        .record_from(row(&[("name", json!("Rex"))]))
        .unwrap_err();
    assert!(matches!(
        err,
        objectbase::Error::Record(RecordError::MissingId { .. })
    ));
}

#[tokio::test]
async fn test_custom_id_column_keys_writes_and_deletes() {
    let table = Table::new(Arc::new(InMemoryRemote::new().with_id_field("uuid")), "pets");
    let record = table
        .insert(row(&[("uuid", json!("a-1")), ("name", json!("Rex"))]))
        .await
        .unwrap();
    assert_eq!(record.id(), &RecordId::from("a-1"));
    assert_eq!(record.id_field(), "uuid");

    let pet = record.accessor();
    pet.write("name", "Pip");
    assert!(pet.sync().await.is_clean());
    let fetched = table.select_by_id("a-1").await.unwrap();
    assert_eq!(fetched.content().unwrap()["name"], json!("Pip"));

    // The id column is refused locally, whatever it is called
    let outcome = pet.write("uuid", "b-2").outcome().unwrap();
    assert!(matches!(
        outcome.error(),
        Some(RecordError::InvalidFieldValue { .. })
    ));

    record.delete();
    assert!(record.sync().await.is_clean());
    assert!(record.is_deleted());
    assert!(table.select_all().await.unwrap().is_empty());
}
