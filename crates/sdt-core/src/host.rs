//! Interfaces to the host collaborators: tab metadata, direct downloads, and
//! the fire-and-forget message protocol.
//!
//! The core only depends on these traits and shapes; the host (browser
//! bridge, CLI, tests) supplies the implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::descriptor::{ResourceDescriptor, TabContext};

/// Asynchronous tab-metadata lookup. Awaited before a descriptor is
/// considered complete.
#[async_trait]
pub trait TabLookup: Send + Sync {
    async fn tab_context(&self, tab_id: i64) -> Option<TabContext>;
}

/// Lookup for hosts without tab metadata (headless captures).
pub struct NoTabs;

#[async_trait]
impl TabLookup for NoTabs {
    async fn tab_context(&self, _tab_id: i64) -> Option<TabContext> {
        None
    }
}

/// What the core hands to the external download collaborator; how bytes are
/// fetched is not this system's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// `<tab title or hostname>/<derived filename>`, both parts sanitized.
    pub filename: String,
    pub referer: Option<String>,
    pub incognito: bool,
}

/// Direct-download hand-off. A failure is a DeliveryFailure: reported, never
/// fatal, and never corrupts persisted state.
#[async_trait]
pub trait DirectDownloader: Send + Sync {
    async fn download(&self, request: DownloadRequest) -> anyhow::Result<()>;
}

/// Inbound fire-and-forget messages, matching the persisted-protocol shapes
/// `{delete, previous}`, `{options}`, `{urlStorage}`, `{reset}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Delete {
        delete: Vec<ResourceDescriptor>,
        #[serde(default)]
        previous: bool,
    },
    Options { options: bool },
    UrlStorage {
        #[serde(rename = "urlStorage")]
        url_storage: bool,
    },
    Reset { reset: bool },
}

impl Message {
    pub fn delete(entries: Vec<ResourceDescriptor>, previous: bool) -> Self {
        Message::Delete {
            delete: entries,
            previous,
        }
    }

    pub fn options() -> Self {
        Message::Options { options: true }
    }

    pub fn reset() -> Self {
        Message::Reset { reset: true }
    }
}

/// Outbound events for the rendering collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The descriptor list changed; re-render.
    UrlStorageChanged,
    /// Configuration was reseeded; re-read preferences and re-render.
    OptionsChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_protocol_shapes_deserialize() {
        let m: Message = serde_json::from_str(r#"{"options": true}"#).unwrap();
        assert!(matches!(m, Message::Options { options: true }));

        let m: Message = serde_json::from_str(r#"{"urlStorage": true}"#).unwrap();
        assert!(matches!(m, Message::UrlStorage { url_storage: true }));

        let m: Message = serde_json::from_str(r#"{"reset": true}"#).unwrap();
        assert!(matches!(m, Message::Reset { reset: true }));

        let m: Message = serde_json::from_str(r#"{"delete": [], "previous": true}"#).unwrap();
        match m {
            Message::Delete { delete, previous } => {
                assert!(delete.is_empty());
                assert!(previous);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn delete_defaults_to_live_list() {
        let m: Message = serde_json::from_str(r#"{"delete": []}"#).unwrap();
        match m {
            Message::Delete { previous, .. } => assert!(!previous),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
