//! Remote state mirror client.
//!
//! The mirror is an external document store holding one global master
//! document at a fixed path. It is entirely optional: when no mirror is
//! configured the application runs local-only. Absence of the document is a
//! valid state meaning "not yet bootstrapped".

use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::config::MirrorConfig;
use crate::error::MirrorError;
use crate::models::MasterState;

/// Default timeout for mirror requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Logical path of the single shared document under the mirror base URL.
const DOCUMENT_PATH: &str = "/state/master.json";

/// A remote document store holding the shared master document.
///
/// Implementations are blocking; callers are expected to run them off the
/// hot path (background thread or `spawn_blocking`).
pub trait Mirror: Send + Sync {
    /// Fetch the shared document. `None` means it has not been bootstrapped.
    fn fetch(&self) -> Result<Option<MasterState>, MirrorError>;

    /// Overwrite the shared document with `snapshot` wholesale.
    fn publish(&self, snapshot: &MasterState) -> Result<(), MirrorError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Mirror over plain HTTP: GET/PUT of a single JSON document.
pub struct HttpMirror {
    client: Client,
    document_url: String,
    api_key: Option<String>,
}

impl HttpMirror {
    pub fn new(config: &MirrorConfig) -> Result<Self, MirrorError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| MirrorError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        let base = normalize_base_url(&config.base_url);
        Ok(Self {
            client,
            document_url: format!("{base}{DOCUMENT_PATH}"),
            api_key: config.api_key.clone(),
        })
    }

    fn authorized(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("X-Platefront-Key", key),
            None => req,
        }
    }
}

impl Mirror for HttpMirror {
    fn fetch(&self) -> Result<Option<MasterState>, MirrorError> {
        let resp = self
            .authorized(self.client.get(&self.document_url))
            .send()
            .map_err(|e| MirrorError::Unavailable(friendly_error(&self.document_url, &e)))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!("mirror document not yet bootstrapped");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MirrorError::Rejected(status_error(status)));
        }

        let body = resp
            .text()
            .map_err(|e| MirrorError::Unavailable(friendly_error(&self.document_url, &e)))?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        let state = serde_json::from_str::<MasterState>(&body)?;
        Ok(Some(state))
    }

    fn publish(&self, snapshot: &MasterState) -> Result<(), MirrorError> {
        let resp = self
            .authorized(self.client.put(&self.document_url))
            .json(snapshot)
            .send()
            .map_err(|e| MirrorError::Unavailable(friendly_error(&self.document_url, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MirrorError::Rejected(status_error(status)));
        }
        debug!(timestamp = snapshot.timestamp, "published snapshot to mirror");
        Ok(())
    }
}

/// Normalise the mirror base URL: ensure a scheme, strip trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("cannot reach state mirror at {url}");
    }
    if err.is_timeout() {
        return format!("connection to {url} timed out");
    }
    format!("network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 | 403 => "mirror rejected credentials".to_string(),
        s if s >= 500 => format!("mirror server error (HTTP {s})"),
        s => format!("unexpected response from mirror (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Mirror backed by process memory. Used by tests and local development;
/// behaves like the HTTP mirror with a perfectly reliable network.
#[derive(Default)]
pub struct InMemoryMirror {
    document: Mutex<Option<MasterState>>,
}

impl InMemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held document directly (simulates another client's write).
    pub fn put(&self, snapshot: MasterState) {
        *self.document.lock().expect("mirror lock poisoned") = Some(snapshot);
    }

    /// Read the held document directly.
    pub fn document(&self) -> Option<MasterState> {
        self.document.lock().expect("mirror lock poisoned").clone()
    }
}

impl Mirror for InMemoryMirror {
    fn fetch(&self) -> Result<Option<MasterState>, MirrorError> {
        Ok(self.document())
    }

    fn publish(&self, snapshot: &MasterState) -> Result<(), MirrorError> {
        self.put(snapshot.clone());
        Ok(())
    }
}
