//! `sdt delete` – remove stored detections by request id.

use std::sync::Arc;

use anyhow::Result;
use sdt_core::config::Preferences;
use sdt_core::host::{Message, NoTabs};
use sdt_core::session::Session;
use sdt_core::store::sqlite::SqliteStore;

pub async fn run_delete(
    store: Arc<SqliteStore>,
    prefs: Preferences,
    ids: &[String],
    previous: bool,
) -> Result<()> {
    let mut session = Session::attach(prefs, store, Arc::new(NoTabs)).await?;

    let source = if previous {
        session.restore()
    } else {
        session.live()
    };
    let targets: Vec<_> = source
        .iter()
        .filter(|d| ids.contains(&d.request_id))
        .cloned()
        .collect();
    if targets.is_empty() {
        anyhow::bail!("no matching detections (see `sdt list` for ids)");
    }

    let count = targets.len();
    session
        .handle_message(Message::delete(targets, previous))
        .await?;
    println!(
        "Deleted {count} detection(s) from the {} list.",
        if previous { "previous" } else { "live" }
    );
    Ok(())
}
