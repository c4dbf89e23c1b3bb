//! User-facing notification payloads. Delivery is the host's concern; the
//! core only builds the titles and messages.

use super::BatchItem;

/// Newline used when joining filename lists for display.
pub fn platform_newline() -> &'static str {
    if cfg!(windows) {
        "\r\n"
    } else {
        "\n"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Payload for one batch flush: a single filename message, or an N-item list
/// joined by the platform newline.
pub fn detection_notification(batch: &[BatchItem], newline: &str) -> Notification {
    if batch.len() > 1 {
        let names: Vec<&str> = batch.iter().map(|b| b.filename.as_str()).collect();
        Notification {
            title: "Streams detected".to_string(),
            message: format!("{} files detected:{}{}", batch.len(), newline, names.join(newline)),
        }
    } else {
        let item = &batch[0];
        Notification {
            title: "Stream detected".to_string(),
            message: format!("{} file detected: {}", item.resource_type, item.filename),
        }
    }
}

/// Payload after a copy action; degraded entries are called out rather than
/// silently hidden.
pub fn copy_notification(filenames: &[String], any_degraded: bool, newline: &str) -> Notification {
    let title = if any_degraded {
        "Copied with some incompatibilities"
    } else {
        "Copied to clipboard"
    };
    Notification {
        title: title.to_string(),
        message: filenames.join(newline),
    }
}

/// Payload for a DeliveryFailure (clipboard or direct download).
pub fn error_notification(reason: &str) -> Notification {
    Notification {
        title: "Error".to_string(),
        message: reason.to_string(),
    }
}
