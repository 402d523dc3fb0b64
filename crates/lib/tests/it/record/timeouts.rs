use std::time::Duration;

use objectbase::{RecordConfig, RecordError};
use serde_json::json;

use crate::helpers::{GatedRemote, pet_row};

#[tokio::test]
async fn test_operation_timeout_settles_as_failure() {
    let remote = GatedRemote::gated();
    let config = RecordConfig::default().with_operation_timeout(Duration::from_millis(50));
    let record = remote.record_with_config("pets", pet_row(1, "Old", "Lab"), config);

    // Never released
    record.update_field("name", json!("Pip"));
    let report = record.sync().await;

    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0].error,
        RecordError::OperationTimeout { timeout_ms: 50, .. }
    ));
    assert!(record.ready_to_read());
    assert_eq!(record.content().unwrap()["name"], json!("Old"));
}

#[tokio::test]
async fn test_sync_timeout_reports_outstanding() {
    let remote = GatedRemote::gated();
    let record = remote.record("pets", pet_row(1, "Old", "Lab"));
    record.update_field("name", json!("Pip"));

    let err = record
        .sync_timeout(Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(err.is_timeout_error());
    assert!(matches!(
        err,
        objectbase::Error::Record(RecordError::SyncTimeout { outstanding: 1, .. })
    ));

    // The operation is unaffected by the barrier giving up
    remote.release(0).await;
    let report = record
        .sync_timeout(Duration::from_secs(5))
        .await
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(record.content().unwrap()["name"], json!("Pip"));
}
