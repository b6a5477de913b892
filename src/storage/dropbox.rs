//! Dropbox HTTP API v2 listing provider (`files/list_folder` + `/continue`).

#![allow(missing_docs)]

use serde::Deserialize;
use serde_json::json;

use crate::core::errors::{IvError, Result};
use crate::core::http::blocking_client;
use crate::storage::{Entry, EntryKind, ListPage, ListingProvider};

const API_BASE: &str = "https://api.dropboxapi.com/2";

/// Blocking Dropbox client authenticated with a bearer token.
pub struct DropboxClient {
    token: String,
    base_url: String,
    http: reqwest::blocking::Client,
}

impl std::fmt::Debug for DropboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropboxClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DropboxClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http = blocking_client().map_err(|e| IvError::Runtime {
            details: format!("failed to create HTTP client: {e}"),
        })?;
        Ok(Self {
            token: token.into(),
            base_url: API_BASE.to_string(),
            http,
        })
    }

    /// Point the client at another API host (proxies, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn call(&self, operation: &'static str, body: &serde_json::Value) -> Result<ListPage> {
        let url = format!("{}/{operation}", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| IvError::Listing {
                operation,
                details: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().map_err(|e| IvError::Listing {
            operation,
            details: format!("failed to read response: {e}"),
        })?;
        if !status.is_success() {
            return Err(IvError::Listing {
                operation,
                details: format!("HTTP {status}: {}", text.trim()),
            });
        }

        decode_page(&text).map_err(|e| IvError::Listing {
            operation,
            details: format!("malformed response: {e}"),
        })
    }
}

impl ListingProvider for DropboxClient {
    fn list(&self, path: &str, recursive: bool) -> Result<ListPage> {
        let body = json!({
            "path": api_path(path),
            "recursive": recursive,
        });
        self.call("files/list_folder", &body)
    }

    fn continue_listing(&self, cursor: &str) -> Result<ListPage> {
        self.call("files/list_folder/continue", &json!({ "cursor": cursor }))
    }
}

/// The API addresses the account root as `""`, not `"/"`.
fn api_path(path: &str) -> &str {
    if path == "/" { "" } else { path }
}

#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<Metadata>,
    #[serde(default)]
    cursor: String,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    #[serde(default)]
    path_lower: Option<String>,
    #[serde(default)]
    path_display: Option<String>,
}

impl Metadata {
    fn into_entry(self) -> Option<Entry> {
        let kind = match self.tag.as_str() {
            "folder" => EntryKind::Folder,
            "file" => EntryKind::File,
            _ => return None,
        };
        let path_display = self.path_display.unwrap_or_else(|| self.name.clone());
        let path_lower = self
            .path_lower
            .unwrap_or_else(|| path_display.to_lowercase());
        Some(Entry::new(kind, self.name, path_lower, path_display))
    }
}

fn decode_page(raw: &str) -> std::result::Result<ListPage, serde_json::Error> {
    let result: ListFolderResult = serde_json::from_str(raw)?;
    Ok(ListPage {
        entries: result
            .entries
            .into_iter()
            .filter_map(Metadata::into_entry)
            .collect(),
        cursor: result.cursor,
        has_more: result.has_more,
    })
}
