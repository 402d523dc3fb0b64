//! PostgREST remote store.
//!
//! Talks to a PostgREST endpoint (including Supabase's `/rest/v1`) over HTTP using reqwest.
//! Rows are addressed with `eq.` filters on the id column; single-field updates are `PATCH`
//! requests with a one-key JSON body.

use std::any::Any;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{RemoteError, RemoteStore};
use crate::Result;
use crate::constants::{ID_FIELD, PGRST_OBJECT_MEDIA_TYPE, PGRST_RETURN_REPRESENTATION};
use crate::record::{Content, RecordId};

/// Error body returned by PostgREST on non-2xx responses.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// A `RemoteStore` backed by a PostgREST HTTP API.
///
/// # Example
///
/// ```no_run
/// use objectbase::PostgrestRemote;
///
/// # fn main() -> objectbase::Result<()> {
/// let remote = PostgrestRemote::new("https://project.supabase.co/rest/v1")?
///     .with_api_key("anon-key");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PostgrestRemote {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    id_field: String,
}

impl PostgrestRemote {
    /// Creates a store rooted at `base_url`, e.g. `http://localhost:3000` or
    /// `https://<project>.supabase.co/rest/v1`.
    pub fn new(base_url: &str) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends with a slash.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| RemoteError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            base_url,
            api_key: None,
            id_field: ID_FIELD.to_string(),
        })
    }

    /// Sends `apikey` and `Authorization: Bearer` headers with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Uses a preconfigured reqwest client (timeouts, proxies, TLS settings).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Filters rows by a column other than `id`.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.base_url.join(table).map_err(|e| {
            RemoteError::InvalidUrl {
                url: format!("{}{table}", self.base_url),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder> {
        let url = self.table_url(table)?;
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            let invalid = |e: reqwest::header::InvalidHeaderValue| RemoteError::InvalidUrl {
                url: url.to_string(),
                reason: format!("api key is not a valid header value: {e}"),
            };
            headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid)?);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?,
            );
        }
        Ok(self.client.request(method, url).headers(headers))
    }

    async fn send(&self, table: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| RemoteError::Transport {
            table: table.to_string(),
            reason: e.to_string(),
        })?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<PostgrestErrorBody>(&body).ok();
        let (code, message) = match parsed {
            Some(b) => {
                let message = match (b.message, b.details) {
                    (Some(m), Some(d)) => format!("{m} ({d})"),
                    (Some(m), None) => m,
                    (None, Some(d)) => d,
                    (None, None) => body,
                };
                (b.code, message)
            }
            None => (None, body),
        };
        Err(RemoteError::Rejected {
            table: table.to_string(),
            status,
            code,
            message,
        }
        .into())
    }

    async fn rows(&self, table: &str, response: Response) -> Result<Vec<Content>> {
        response.json().await.map_err(|e| {
            RemoteError::InvalidResponse {
                table: table.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn id_filter(&self, id: &RecordId) -> [(String, String); 1] {
        [(self.id_field.clone(), format!("eq.{id}"))]
    }

    /// Checks that a `return=representation` mutation touched a row.
    async fn affected_row(&self, table: &str, id: &RecordId, response: Response) -> Result<()> {
        let rows = self.rows(table, response).await?;
        if rows.is_empty() {
            return Err(RemoteError::RecordNotFound {
                table: table.to_string(),
                id: id.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Renders an equality test against a JSON value as a PostgREST filter.
fn equality_filter(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

#[async_trait]
impl RemoteStore for PostgrestRemote {
    async fn select_all(&self, table: &str) -> Result<Vec<Content>> {
        let request = self.request(Method::GET, table)?.query(&[("select", "*")]);
        let response = self.send(table, request).await?;
        self.rows(table, response).await
    }

    async fn select_by_id(&self, table: &str, id: &RecordId) -> Result<Content> {
        let request = self
            .request(Method::GET, table)?
            .query(&[("select", "*")])
            .query(&self.id_filter(id));
        let response = self.send(table, request).await?;
        let mut rows = self.rows(table, response).await?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(RemoteError::RecordNotFound {
                table: table.to_string(),
                id: id.clone(),
            }
            .into()),
            n => Err(RemoteError::InvalidResponse {
                table: table.to_string(),
                reason: format!("expected one row for id {id}, got {n}"),
            }
            .into()),
        }
    }

    async fn select_by_field(
        &self,
        table: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Content>> {
        let filter = [(field.to_string(), equality_filter(value))];
        let request = self
            .request(Method::GET, table)?
            .query(&[("select", "*")])
            .query(&filter);
        let response = self.send(table, request).await?;
        self.rows(table, response).await
    }

    async fn insert(&self, table: &str, content: Content) -> Result<Content> {
        let request = self
            .request(Method::POST, table)?
            .header("Prefer", PGRST_RETURN_REPRESENTATION)
            .header(ACCEPT, PGRST_OBJECT_MEDIA_TYPE)
            .json(&content);
        let response = self.send(table, request).await?;
        let row: Content = response.json().await.map_err(|e| RemoteError::InvalidResponse {
            table: table.to_string(),
            reason: e.to_string(),
        })?;
        debug!(table, id = ?row.get(&self.id_field), "inserted row");
        Ok(row)
    }

    async fn update_field(
        &self,
        table: &str,
        id: &RecordId,
        field: &str,
        value: Value,
    ) -> Result<()> {
        let mut body = Content::new();
        body.insert(field.to_string(), value);
        let request = self
            .request(Method::PATCH, table)?
            .query(&self.id_filter(id))
            .header("Prefer", PGRST_RETURN_REPRESENTATION)
            .json(&body);
        let response = self.send(table, request).await?;
        self.affected_row(table, id, response).await
    }

    async fn delete(&self, table: &str, id: &RecordId) -> Result<()> {
        let request = self
            .request(Method::DELETE, table)?
            .query(&self.id_filter(id))
            .header("Prefer", PGRST_RETURN_REPRESENTATION);
        let response = self.send(table, request).await?;
        self.affected_row(table, id, response).await
    }

    fn id_field(&self) -> &str {
        &self.id_field
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
