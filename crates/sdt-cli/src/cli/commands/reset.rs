//! `sdt reset` – wipe all stored detections and reseed default preferences.

use std::sync::Arc;

use anyhow::Result;
use sdt_core::config::{self, Preferences};
use sdt_core::host::{Event, Message, NoTabs};
use sdt_core::session::Session;
use sdt_core::store::sqlite::SqliteStore;

pub async fn run_reset(store: Arc<SqliteStore>, prefs: Preferences) -> Result<()> {
    let mut session = Session::attach(prefs, store, Arc::new(NoTabs)).await?;
    let events = session.handle_message(Message::reset()).await?;
    if events.contains(&Event::OptionsChanged) {
        config::write_config(session.preferences())?;
    }
    println!("All detections cleared; preferences reset to defaults.");
    Ok(())
}
