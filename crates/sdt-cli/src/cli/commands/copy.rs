//! `sdt copy` – synthesize downloader command lines for stored detections.
//!
//! Commands go to stdout (the clipboard stands outside this tool); the copy
//! notification goes to stderr so piping stdout stays clean.

use std::sync::Arc;

use anyhow::Result;
use sdt_core::aggregate::notify;
use sdt_core::command::{synthesize_batch, Tool};
use sdt_core::config::Preferences;
use sdt_core::store::sqlite::SqliteStore;
use sdt_core::store::{get_descriptors, KEY_URL_STORAGE, KEY_URL_STORAGE_RESTORE};

pub async fn run_copy(
    store: Arc<SqliteStore>,
    prefs: Preferences,
    ids: &[String],
    all: bool,
    previous: bool,
    tool: Option<Tool>,
) -> Result<()> {
    let key = if previous {
        KEY_URL_STORAGE_RESTORE
    } else {
        KEY_URL_STORAGE
    };
    let mut list = get_descriptors(store.as_ref(), key).await?;
    if !all {
        list.retain(|d| ids.contains(&d.request_id));
    }
    if list.is_empty() {
        anyhow::bail!("no matching detections (see `sdt list` for ids)");
    }
    // export most recent first
    list.reverse();

    let config = prefs.synthesis_config(tool);
    let batch = synthesize_batch(&list, &config);

    let newline = notify::platform_newline();
    let texts: Vec<&str> = batch.commands.iter().map(|c| c.text.as_str()).collect();
    println!("{}", texts.join(newline));

    if prefs.notify_on_copy {
        let notification = notify::copy_notification(&batch.filenames, batch.any_degraded, newline);
        eprintln!("{}: {}", notification.title, notification.message);
    }
    Ok(())
}
