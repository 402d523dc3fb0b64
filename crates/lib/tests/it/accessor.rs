use objectbase::{FieldRead, RecordError};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::helpers::{GatedRemote, pet_row};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Pet {
    id: i64,
    name: String,
    breed: String,
}

#[tokio::test]
async fn test_peek_marks_stale_values_while_busy() {
    let remote = GatedRemote::gated();
    let pet = remote.record("pets", pet_row(1, "Old", "Lab")).accessor();

    let op = pet.write("name", "Pip");
    assert_eq!(pet.peek("name"), Some(FieldRead::Stale(json!("Old"))));
    assert!(pet.read("name").unwrap_err().is_busy_error());
    assert_eq!(pet.peek("colour"), None);

    remote.release(0).await;
    op.wait().await;
    assert_eq!(pet.peek("name"), Some(FieldRead::Fresh(json!("Pip"))));
    assert_eq!(pet.read("name").unwrap(), json!("Pip"));
}

#[tokio::test]
async fn test_typed_write_and_snapshot() {
    let remote = GatedRemote::new();
    let pet = remote.record("pets", pet_row(5, "Old", "Lab")).accessor();

    pet.write("name", String::from("Pip"));
    pet.write("breed", "Russian Dwarf");
    assert!(pet.sync().await.is_clean());

    let snapshot: Pet = pet.snapshot().unwrap();
    assert_eq!(
        snapshot,
        Pet {
            id: 5,
            name: "Pip".to_string(),
            breed: "Russian Dwarf".to_string(),
        }
    );
    let mut fields = pet.fields();
    fields.sort();
    assert_eq!(fields, vec!["breed", "id", "name"]);
}

#[tokio::test]
async fn test_refused_writes_never_reach_the_remote() {
    let remote = GatedRemote::new();
    let pet = remote.record("pets", pet_row(1, "Old", "Lab")).accessor();

    let unknown = pet.write("colour", "brown");
    let id = pet.write("id", 2);
    assert!(matches!(
        unknown.outcome().unwrap().error(),
        Some(RecordError::FieldNotFound { .. })
    ));
    assert!(matches!(
        id.outcome().unwrap().error(),
        Some(RecordError::InvalidFieldValue { .. })
    ));
    assert!(remote.calls().is_empty());
    assert!(pet.record().ready_to_read());
}

#[tokio::test]
async fn test_reads_after_delete() {
    let remote = GatedRemote::new();
    let pet = remote.record("pets", pet_row(1, "Old", "Lab")).accessor();
    pet.record().delete();
    let report = pet.sync().await;
    assert!(report.record_deleted());

    assert!(pet.read("name").unwrap_err().is_deleted_error());
    assert_eq!(pet.peek("name"), Some(FieldRead::Stale(json!("Old"))));

    let write = pet.write("name", "Pip");
    assert!(matches!(
        write.outcome().unwrap().error(),
        Some(RecordError::MutationOnDeletedRecord { .. })
    ));
    assert_eq!(pet.peek("name"), Some(FieldRead::Stale(json!("Old"))));
}
