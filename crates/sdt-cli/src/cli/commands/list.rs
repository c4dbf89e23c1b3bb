//! `sdt list` – show stored detections, most recent first.

use std::sync::Arc;

use anyhow::Result;
use sdt_core::command::format_timestamp;
use sdt_core::config::Preferences;
use sdt_core::descriptor::ResourceDescriptor;
use sdt_core::store::sqlite::SqliteStore;
use sdt_core::store::{get_descriptors, KEY_URL_STORAGE, KEY_URL_STORAGE_RESTORE};

pub async fn run_list(
    store: Arc<SqliteStore>,
    prefs: Preferences,
    previous: bool,
    filter: Option<&str>,
) -> Result<()> {
    let key = if previous {
        KEY_URL_STORAGE_RESTORE
    } else {
        KEY_URL_STORAGE
    };
    let mut list = get_descriptors(store.as_ref(), key).await?;

    if let Some(filter) = filter {
        let needle = filter.to_lowercase();
        list.retain(|d| matches_filter(d, &needle));
    }

    if list.is_empty() {
        println!("No detections stored.");
        return Ok(());
    }

    println!(
        "{:<10} {:<28} {:<32} {:<20} {}",
        "TYPE", "FILENAME", "SOURCE", "TIME", "ID"
    );
    for d in list.iter().rev() {
        println!(
            "{:<10} {:<28} {:<32} {:<20} {}",
            d.resource_type,
            d.filename,
            source_column(d, &prefs),
            format_timestamp(d.time_stamp),
            d.request_id
        );
    }
    Ok(())
}

fn matches_filter(d: &ResourceDescriptor, needle: &str) -> bool {
    d.filename.to_lowercase().contains(needle)
        || d.resource_type.to_lowercase().contains(needle)
        || d.hostname.to_lowercase().contains(needle)
        || d.tab_context
            .title
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(needle))
}

/// Tab title when preferred and informative, hostname otherwise.
fn source_column<'a>(d: &'a ResourceDescriptor, prefs: &Preferences) -> &'a str {
    match &d.tab_context.title {
        Some(title) if prefs.display_title && !d.url.contains(title.as_str()) => title.as_str(),
        _ => d.hostname.as_str(),
    }
}
