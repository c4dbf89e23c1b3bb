//! `sdt import-har <path>` – scan a HAR capture for downloadable media.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use sdt_core::config::Preferences;
use sdt_core::har;
use sdt_core::session::Session;
use sdt_core::store::sqlite::SqliteStore;

pub async fn run_import_har(
    store: Arc<SqliteStore>,
    prefs: Preferences,
    path: &Path,
) -> Result<()> {
    let capture =
        har::read_har(path).with_context(|| format!("import HAR capture: {}", path.display()))?;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let mut session = Session::start(prefs, store, Arc::new(capture.tabs), now_ms).await?;

    for exchange in &capture.exchanges {
        if let Some(notification) = session.on_exchange(exchange, Instant::now()).await? {
            eprintln!("{}: {}", notification.title, notification.message);
        }
    }

    // Let the debounce quiet period elapse so the burst flushes once.
    if let Some(deadline) = session.flush_deadline() {
        tokio::time::sleep_until(deadline.into()).await;
    }

    match session.flush().await? {
        Some(outcome) => {
            println!(
                "Detected {} resource(s); {} in the live list.",
                outcome.persisted, outcome.badge_count
            );
            if session.preferences().notify_on_detect {
                eprintln!(
                    "{}: {}",
                    outcome.notification.title, outcome.notification.message
                );
            }
        }
        None => println!("No downloadable media detected."),
    }
    Ok(())
}
