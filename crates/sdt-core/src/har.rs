//! HAR (HTTP Archive) exchange adapter.
//!
//! Turns each HAR 1.2 entry into *two* raw exchanges sharing a request id:
//! one carrying only request-side headers, one carrying only response-side
//! headers. This reproduces the two racing observation channels of a live
//! interceptor. HAR pages become tabs: entries are attributed to their page
//! via `pageref`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::descriptor::TabContext;
use crate::exchange::{Header, RawExchange};
use crate::host::TabLookup;

#[derive(Debug, Error)]
pub enum HarError {
    #[error("read HAR file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse HAR JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("HAR file has no entries")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct HarLog {
    log: HarRoot,
}

#[derive(Debug, Deserialize)]
struct HarRoot {
    #[serde(default)]
    pages: Vec<HarPage>,
    entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
struct HarPage {
    id: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct HarEntry {
    #[serde(default)]
    pageref: Option<String>,
    #[serde(default, rename = "startedDateTime")]
    started_date_time: Option<String>,
    request: HarRequest,
    response: HarResponse,
}

#[derive(Debug, Deserialize)]
struct HarRequest {
    url: String,
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct HarResponse {
    #[serde(default)]
    headers: Vec<Header>,
}

/// Tab metadata reconstructed from HAR pages.
#[derive(Debug, Default)]
pub struct HarTabs {
    contexts: HashMap<i64, TabContext>,
}

#[async_trait]
impl TabLookup for HarTabs {
    async fn tab_context(&self, tab_id: i64) -> Option<TabContext> {
        self.contexts.get(&tab_id).cloned()
    }
}

/// A parsed capture: the exchange stream plus its tab lookup.
#[derive(Debug)]
pub struct HarCapture {
    pub exchanges: Vec<RawExchange>,
    pub tabs: HarTabs,
}

/// Reads a HAR file into an exchange stream.
pub fn read_har(path: &Path) -> Result<HarCapture, HarError> {
    let bytes = std::fs::read(path).map_err(|source| HarError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let har: HarLog = serde_json::from_slice(&bytes)?;
    if har.log.entries.is_empty() {
        return Err(HarError::Empty);
    }

    // Pages become tabs 1..=N; entries without a resolvable pageref land on
    // tab 1.
    let mut page_tabs: HashMap<&str, i64> = HashMap::new();
    let mut tabs = HarTabs::default();
    for (index, page) in har.log.pages.iter().enumerate() {
        let tab_id = index as i64 + 1;
        page_tabs.insert(page.id.as_str(), tab_id);
        tabs.contexts.insert(
            tab_id,
            TabContext {
                title: Some(page.title.clone()),
                url: page.title.starts_with("http").then(|| page.title.clone()),
                incognito: false,
            },
        );
    }

    let mut exchanges = Vec::new();
    for (index, entry) in har.log.entries.iter().enumerate() {
        let tab_id = entry
            .pageref
            .as_deref()
            .and_then(|p| page_tabs.get(p).copied())
            .unwrap_or(1);
        let time_stamp = entry
            .started_date_time
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.timestamp_millis())
            .unwrap_or_default();
        let request_id = format!("har-{}", index + 1);

        exchanges.push(RawExchange {
            url: entry.request.url.clone(),
            request_id: request_id.clone(),
            tab_id: Some(tab_id),
            time_stamp,
            headers: entry.request.headers.clone(),
            document_url: None,
            origin_url: None,
            initiator: None,
        });
        if !entry.response.headers.is_empty() {
            exchanges.push(RawExchange {
                url: entry.request.url.clone(),
                request_id,
                tab_id: Some(tab_id),
                time_stamp,
                headers: entry.response.headers.clone(),
                document_url: None,
                origin_url: None,
                initiator: None,
            });
        }
    }

    Ok(HarCapture { exchanges, tabs })
}
