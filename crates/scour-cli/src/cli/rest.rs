//! REST/JSON backend for the fetch engine.
//!
//! Implements [`Directory`] over a conventional paginated listing endpoint:
//!
//! ```text
//! GET {base}/{collection}?sortBy={attr}&from={lower}&until={upper}&limit={n}&cursor={c}
//! -> { "items": [ { ... }, ... ], "nextCursor": "opaque-or-absent" }
//! ```
//!
//! Token acquisition, request shaping beyond these parameters, and any
//! richer filter language are out of scope: the backend attaches the bearer
//! token it was given and deserializes whatever the server returns.
//!
//! Failure classification follows HTTP semantics: 429 and 5xx responses and
//! transport-level errors (timeouts, refused connections) are transient and
//! retried by the engine; every other non-success status is permanent and
//! abandons the partition.

use async_trait::async_trait;
use scour::{Cursor, Directory, DirectoryError, Page, PageRequest};
use serde::Deserialize;

/// One directory entity, kept schemaless: the engine does not care what a
/// user or group looks like, and the output layer only plucks named fields.
pub type Record = serde_json::Map<String, serde_json::Value>;

#[derive(Deserialize)]
struct PageBody {
    items: Vec<Record>,
    #[serde(default, rename = "nextCursor")]
    next_cursor: Option<String>,
}

/// A reqwest-backed [`Directory`] over one collection endpoint.
pub struct RestDirectory {
    client: reqwest::Client,
    collection_url: String,
    token: Option<String>,
}

impl RestDirectory {
    /// Builds a backend for `{base_url}/{collection}`.
    ///
    /// # Errors
    ///
    /// Fails only if the underlying HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        collection: &str,
        token: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(core::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            collection_url: format!("{base_url}/{collection}"),
            token,
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.get(url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Fetches a single entity by identifier. `None` on 404.
    ///
    /// # Errors
    ///
    /// Any other non-success status or transport failure.
    pub async fn get_one(&self, id: &str) -> anyhow::Result<Option<Record>> {
        let url = format!("{}/{id}", self.collection_url);
        let resp = self.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record = resp.error_for_status()?.json().await?;
        Ok(Some(record))
    }

    /// Resolves an entity by exact name. `None` when the lookup yields
    /// nothing.
    ///
    /// # Errors
    ///
    /// Any non-success status or transport failure.
    pub async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Record>> {
        let resp = self
            .get(&self.collection_url)
            .query(&[("name", name), ("limit", "1")])
            .send()
            .await?;
        let body: PageBody = resp.error_for_status()?.json().await?;
        Ok(body.items.into_iter().next())
    }
}

#[async_trait]
impl Directory for RestDirectory {
    type Entry = Record;

    async fn fetch_page(&self, req: &PageRequest) -> Result<Page<Record>, DirectoryError> {
        let mut query: Vec<(&str, String)> = vec![
            ("sortBy", req.attribute.clone()),
            ("limit", req.page_size.to_string()),
        ];
        if let Some(lower) = &req.range.lower {
            query.push(("from", lower.clone()));
        }
        if let Some(upper) = &req.range.upper {
            query.push(("until", upper.clone()));
        }
        if let Some(cursor) = &req.cursor {
            query.push(("cursor", cursor.as_str().to_string()));
        }

        let resp = self
            .get(&self.collection_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| DirectoryError::transient(format!("transport: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(DirectoryError::transient(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(DirectoryError::permanent(format!("HTTP {status}")));
        }

        let body: PageBody = resp
            .json()
            .await
            .map_err(|e| DirectoryError::permanent(format!("malformed response body: {e}")))?;

        Ok(Page {
            entries: body.items,
            cursor: body.next_cursor.map(Cursor::new),
        })
    }
}
