//! Raw network exchange metadata handed over by the interception collaborator.
//!
//! One exchange carries either request-side or response-side headers, never
//! both: the same underlying transaction may be observed twice under one
//! `request_id`, once per channel.

use serde::{Deserialize, Serialize};

/// One header name/value pair as observed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Case-insensitive header lookup.
pub fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// One observed network event. Ephemeral: produced by the interception
/// collaborator and discarded after classification.
#[derive(Debug, Clone, Default)]
pub struct RawExchange {
    pub url: String,
    /// Unique per underlying network transaction; both observation channels
    /// report the same id for one transaction.
    pub request_id: String,
    /// `None` when the exchange is not associated with any tab.
    pub tab_id: Option<i64>,
    /// Epoch milliseconds.
    pub time_stamp: i64,
    /// Request-side or response-side headers, depending on the channel.
    pub headers: Vec<Header>,
    pub document_url: Option<String>,
    pub origin_url: Option<String>,
    pub initiator: Option<String>,
}

impl RawExchange {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|v| v.trim().parse().ok())
    }

    /// First present referring-context value (document, origin, initiator).
    pub fn referring_context(&self) -> Option<&str> {
        self.document_url
            .as_deref()
            .or(self.origin_url.as_deref())
            .or(self.initiator.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let x = RawExchange {
            headers: vec![Header::new("Content-Type", "video/mp4")],
            ..Default::default()
        };
        assert_eq!(x.content_type(), Some("video/mp4"));
        assert_eq!(x.header("CONTENT-TYPE"), Some("video/mp4"));
        assert_eq!(x.header("content-length"), None);
    }

    #[test]
    fn content_length_parses_or_none() {
        let x = RawExchange {
            headers: vec![Header::new("Content-Length", " 2048 ")],
            ..Default::default()
        };
        assert_eq!(x.content_length(), Some(2048));

        let bad = RawExchange {
            headers: vec![Header::new("Content-Length", "many")],
            ..Default::default()
        };
        assert_eq!(bad.content_length(), None);
    }

    #[test]
    fn referring_context_prefers_document_url() {
        let x = RawExchange {
            document_url: Some("https://doc.example".to_string()),
            origin_url: Some("https://origin.example".to_string()),
            ..Default::default()
        };
        assert_eq!(x.referring_context(), Some("https://doc.example"));

        let y = RawExchange {
            initiator: Some("https://init.example".to_string()),
            ..Default::default()
        };
        assert_eq!(y.referring_context(), Some("https://init.example"));
    }
}
