//! PostgrestRemote against a mock PostgREST server.
//!
//! The mock understands just enough of PostgREST for the client: `eq.`/`is.null` filters,
//! `Prefer: return=representation`, single-object responses and JSON error bodies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use objectbase::{Content, PostgrestRemote, RecordId, RemoteError, RemoteStore, Table};
use serde_json::{Value, json};

use crate::helpers::pet_row;

const API_KEY: &str = "test-anon-key";

#[derive(Default)]
struct MockState {
    tables: Mutex<HashMap<String, Vec<Content>>>,
    next_id: Mutex<i64>,
}

type Shared = Arc<MockState>;

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"code": code, "message": message, "details": null, "hint": null})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    let bearer = format!("Bearer {API_KEY}");
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(API_KEY)
        && headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(bearer.as_str())
}

/// Applies every `column=op.value` filter in the query string.
fn matches(row: &Content, query: &HashMap<String, String>) -> bool {
    query
        .iter()
        .filter(|(column, _)| column.as_str() != "select")
        .all(|(column, filter)| match filter.split_once('.') {
            Some(("eq", expected)) => match row.get(column) {
                Some(Value::String(s)) => s == expected,
                Some(Value::Null) | None => false,
                Some(other) => other.to_string() == expected,
            },
            Some(("is", "null")) => matches!(row.get(column), None | Some(Value::Null)),
            _ => false,
        })
}

async fn select(
    State(state): State<Shared>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "PGRST301", "JWT invalid");
    }
    if table == "broken" {
        return error(
            StatusCode::BAD_REQUEST,
            "42703",
            "column broken.nope does not exist",
        );
    }
    let tables = state.tables.lock().unwrap();
    let rows: Vec<Content> = tables
        .get(&table)
        .map(|rows| rows.iter().filter(|r| matches(r, &query)).cloned().collect())
        .unwrap_or_default();
    Json(rows).into_response()
}

async fn insert(
    State(state): State<Shared>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(mut row): Json<Content>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "PGRST301", "JWT invalid");
    }
    assert_eq!(
        headers.get("prefer").and_then(|v| v.to_str().ok()),
        Some("return=representation")
    );
    if !row.contains_key("id") {
        let mut next = state.next_id.lock().unwrap();
        *next += 1;
        row.insert("id".to_string(), json!(*next));
    }
    state
        .tables
        .lock()
        .unwrap()
        .entry(table)
        .or_default()
        .push(row.clone());
    (StatusCode::CREATED, Json(row)).into_response()
}

async fn update(
    State(state): State<Shared>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(patch): Json<Content>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "PGRST301", "JWT invalid");
    }
    if patch.contains_key("locked") {
        return error(StatusCode::FORBIDDEN, "42501", "permission denied");
    }
    let mut tables = state.tables.lock().unwrap();
    let mut updated = Vec::new();
    for row in tables.entry(table).or_default().iter_mut() {
        if matches(row, &query) {
            for (k, v) in &patch {
                row.insert(k.clone(), v.clone());
            }
            updated.push(row.clone());
        }
    }
    Json(updated).into_response()
}

async fn remove(
    State(state): State<Shared>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "PGRST301", "JWT invalid");
    }
    let mut tables = state.tables.lock().unwrap();
    let rows = tables.entry(table).or_default();
    let (removed, kept): (Vec<_>, Vec<_>) = rows.drain(..).partition(|r| matches(r, &query));
    *rows = kept;
    Json(removed).into_response()
}

/// Starts a mock server on an ephemeral port and returns its base URL.
async fn start_mock(state: Shared) -> String {
    let app = Router::new()
        .route(
            "/rest/v1/{table}",
            get(select).post(insert).patch(update).delete(remove),
        )
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/rest/v1")
}

async fn seeded_remote() -> (PostgrestRemote, Shared) {
    let state = Shared::default();
    state.tables.lock().unwrap().insert(
        "pets".to_string(),
        vec![pet_row(14, "Old", "Lab"), pet_row(7, "Rex", "Pug")],
    );
    *state.next_id.lock().unwrap() = 20;
    let url = start_mock(state.clone()).await;
    let remote = PostgrestRemote::new(&url).unwrap().with_api_key(API_KEY);
    (remote, state)
}

#[tokio::test]
async fn test_select_and_filter() {
    let (remote, _) = seeded_remote().await;

    assert_eq!(remote.select_all("pets").await.unwrap().len(), 2);
    let pip = remote
        .select_by_id("pets", &RecordId::Int(14))
        .await
        .unwrap();
    assert_eq!(pip["name"], json!("Old"));

    let pugs = remote
        .select_by_field("pets", "breed", &json!("Pug"))
        .await
        .unwrap();
    assert_eq!(pugs.len(), 1);
    assert_eq!(pugs[0]["id"], json!(7));

    let err = remote
        .select_by_id("pets", &RecordId::Int(99))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_insert_update_delete() {
    let (remote, state) = seeded_remote().await;

    let mut row = Content::new();
    row.insert("name".to_string(), json!("Ace"));
    let inserted = remote.insert("pets", row).await.unwrap();
    assert_eq!(inserted["id"], json!(21));

    let id = RecordId::Int(21);
    remote
        .update_field("pets", &id, "name", json!("Bo"))
        .await
        .unwrap();
    remote.delete("pets", &RecordId::Int(7)).await.unwrap();

    let tables = state.tables.lock().unwrap();
    let pets = &tables["pets"];
    assert_eq!(pets.len(), 2);
    assert!(pets.iter().any(|r| r["name"] == json!("Bo")));
    assert!(pets.iter().all(|r| r["id"] != json!(7)));
}

#[tokio::test]
async fn test_mutations_on_missing_rows_are_not_found() {
    let (remote, _) = seeded_remote().await;
    let missing = RecordId::Int(404);
    assert!(
        remote
            .update_field("pets", &missing, "name", json!("x"))
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(remote.delete("pets", &missing).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_error_bodies_are_surfaced() {
    let (remote, _) = seeded_remote().await;

    let err = remote.select_all("broken").await.unwrap_err();
    match err {
        objectbase::Error::Remote(RemoteError::Rejected {
            status,
            code,
            message,
            ..
        }) => {
            assert_eq!(status, 400);
            assert_eq!(code.as_deref(), Some("42703"));
            assert!(message.contains("does not exist"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let url = remote.base_url().to_string();
    let anonymous = PostgrestRemote::new(&url).unwrap();
    let err = anonymous.select_all("pets").await.unwrap_err();
    assert!(matches!(
        err,
        objectbase::Error::Remote(RemoteError::Rejected { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    let remote = PostgrestRemote::new("http://127.0.0.1:9/rest/v1").unwrap();
    let err = remote.select_all("pets").await.unwrap_err();
    assert!(err.is_io_error());
}

#[tokio::test]
async fn test_record_writes_over_http() {
    let (remote, state) = seeded_remote().await;
    let table = Table::new(Arc::new(remote), "pets");
    let record = table.select_by_id(14).await.unwrap();
    let pet = record.accessor();

    pet.write("name", "Pip");
    pet.write("breed", "Russian Dwarf");
    let report = pet.sync().await;
    assert!(report.is_clean());
    assert_eq!(pet.read("name").unwrap(), json!("Pip"));

    {
        let tables = state.tables.lock().unwrap();
        let row = tables["pets"].iter().find(|r| r["id"] == json!(14)).unwrap();
        assert_eq!(row["breed"], json!("Russian Dwarf"));
    }

    // A server-side rejection leaves the local mirror untouched
    record.update_field("locked", json!(true));
    let report = record.sync().await;
    assert_eq!(report.failed_fields(), vec!["locked"]);
    assert!(!record.content().unwrap().contains_key("locked"));
}
