//! Persisted resource descriptors: the classified representation of one
//! detected resource, as stored in `urlStorage`/`urlStorageRestore`.

mod filename;

pub use filename::{filename_from_url, hostname_from_url, sanitize_path_component, strip_extension};

use serde::{Deserialize, Serialize};

use crate::classify::Verdict;
use crate::exchange::{Header, RawExchange};
use crate::rules::Category;

/// Headers worth keeping on a descriptor; everything else is dropped when the
/// exchange is converted.
const RETAINED_HEADERS: [&str; 5] = [
    "user-agent",
    "referer",
    "cookie",
    "set-cookie",
    "content-length",
];

/// Tab metadata captured at detection time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabContext {
    pub title: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub incognito: bool,
}

/// The persisted unit: one detected resource. At most one live descriptor
/// exists per distinct URL within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub request_id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub category: Category,
    pub filename: String,
    pub hostname: String,
    pub headers: Vec<Header>,
    pub tab_context: TabContext,
    /// Epoch milliseconds.
    pub time_stamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<String>,
}

impl ResourceDescriptor {
    /// Builds a descriptor from a classified exchange plus tab metadata.
    pub fn from_exchange(exchange: &RawExchange, verdict: &Verdict, tab: TabContext) -> Self {
        let filename = filename_from_url(&exchange.url, verdict.directory_manifest)
            .or_else(|| hostname_from_url(&exchange.url))
            .unwrap_or_else(|| "download".to_string());
        let hostname = hostname_from_url(&exchange.url).unwrap_or_default();
        Self {
            request_id: exchange.request_id.clone(),
            url: exchange.url.clone(),
            resource_type: verdict.resource_type.clone(),
            category: verdict.category,
            filename,
            hostname,
            headers: retained_headers(&exchange.headers),
            tab_context: tab,
            time_stamp: exchange.time_stamp,
            tab_id: exchange.tab_id,
            document_url: exchange.document_url.clone(),
            origin_url: exchange.origin_url.clone(),
            initiator: exchange.initiator.clone(),
        }
    }

    /// Unions incoming headers into the descriptor. Headers already present
    /// (by case-insensitive name) keep their first observed value.
    pub fn merge_headers(&mut self, incoming: &[Header]) {
        for h in retained_headers(incoming) {
            if !self
                .headers
                .iter()
                .any(|e| e.name.eq_ignore_ascii_case(&h.name))
            {
                self.headers.push(h);
            }
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        crate::exchange::find_header(&self.headers, name)
    }
}

fn retained_headers(headers: &[Header]) -> Vec<Header> {
    headers
        .iter()
        .filter(|h| {
            RETAINED_HEADERS
                .iter()
                .any(|keep| h.name.eq_ignore_ascii_case(keep))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(resource_type: &str, category: Category) -> Verdict {
        Verdict {
            resource_type: resource_type.to_string(),
            category,
            directory_manifest: false,
        }
    }

    fn exchange(url: &str) -> RawExchange {
        RawExchange {
            url: url.to_string(),
            request_id: "r1".to_string(),
            tab_id: Some(3),
            time_stamp: 1_700_000_000_000,
            headers: vec![
                Header::new("User-Agent", "UA1"),
                Header::new("Accept", "*/*"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn from_exchange_derives_filename_and_hostname() {
        let d = ResourceDescriptor::from_exchange(
            &exchange("https://cdn.example.com/abc/master.m3u8"),
            &verdict("HLS", Category::Stream),
            TabContext::default(),
        );
        assert_eq!(d.filename, "master.m3u8");
        assert_eq!(d.hostname, "cdn.example.com");
        assert_eq!(d.resource_type, "HLS");
    }

    #[test]
    fn only_relevant_headers_are_retained() {
        let d = ResourceDescriptor::from_exchange(
            &exchange("https://cdn.example.com/a.mp4"),
            &verdict("MP4", Category::Files),
            TabContext::default(),
        );
        assert_eq!(d.headers.len(), 1);
        assert_eq!(d.header("user-agent"), Some("UA1"));
    }

    #[test]
    fn merge_headers_unions_without_overwrite() {
        let mut d = ResourceDescriptor::from_exchange(
            &exchange("https://cdn.example.com/a.vtt"),
            &verdict("VTT", Category::Subtitles),
            TabContext::default(),
        );
        d.merge_headers(&[
            Header::new("User-Agent", "UA2"),
            Header::new("Content-Length", "512"),
        ]);
        assert_eq!(d.header("user-agent"), Some("UA1"));
        assert_eq!(d.header("content-length"), Some("512"));
    }

    #[test]
    fn descriptor_json_roundtrip() {
        let d = ResourceDescriptor::from_exchange(
            &exchange("https://cdn.example.com/abc/master.m3u8"),
            &verdict("HLS", Category::Stream),
            TabContext::default(),
        );
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"requestId\":\"r1\""));
        assert!(json.contains("\"type\":\"HLS\""));
        let back: ResourceDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.url, d.url);
        assert_eq!(back.category, Category::Stream);
    }
}
