//! The session: owner of aggregator state and loaded preferences, and the
//! single entry point for the host collaborators.
//!
//! Both observation channels funnel into [`Session::on_exchange`]; the
//! enable flag covers them together, so disabling removes both
//! subscriptions atomically by construction. The classifier and synthesizer
//! stay pure; the session and its aggregator are the only mutable state.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::aggregate::{Aggregator, FlushOutcome, Notification};
use crate::aggregate::notify;
use crate::classify::{classify, FilterSettings};
use crate::config::Preferences;
use crate::descriptor::{sanitize_path_component, ResourceDescriptor};
use crate::exchange::RawExchange;
use crate::host::{DirectDownloader, DownloadRequest, Event, Message, TabLookup};
use crate::rules::RuleTable;
use crate::store::{self, Store, KEY_URL_STORAGE, KEY_URL_STORAGE_RESTORE};

pub struct Session {
    prefs: Preferences,
    rules: RuleTable,
    filters: FilterSettings,
    aggregator: Aggregator,
    store: Arc<dyn Store>,
    tabs: Arc<dyn TabLookup>,
    downloader: Option<Arc<dyn DirectDownloader>>,
    enabled: bool,
}

impl Session {
    /// Attaches to existing persisted state without the startup shuffle.
    /// Used by short-lived drivers (list, copy, delete).
    pub async fn attach(
        prefs: Preferences,
        store: Arc<dyn Store>,
        tabs: Arc<dyn TabLookup>,
    ) -> Result<Self> {
        let live = store::get_descriptors(store.as_ref(), KEY_URL_STORAGE).await?;
        let restore = store::get_descriptors(store.as_ref(), KEY_URL_STORAGE_RESTORE).await?;
        let enabled = !prefs.disable_detection;
        Ok(Self {
            rules: prefs.rule_table(),
            filters: prefs.filter_settings(),
            prefs,
            aggregator: Aggregator::from_lists(live, restore),
            store,
            tabs,
            downloader: None,
            enabled,
        })
    }

    /// Starts a new detection session: leftover descriptors move to the
    /// restore list (age-capped when cleanup is on, incognito purged).
    pub async fn start(
        prefs: Preferences,
        store: Arc<dyn Store>,
        tabs: Arc<dyn TabLookup>,
        now_ms: i64,
    ) -> Result<Self> {
        let mut session = Self::attach(prefs, store, tabs).await?;
        let window = session.prefs.restore_window_ms();
        session
            .aggregator
            .restore_session(session.store.as_ref(), window, now_ms)
            .await?;
        Ok(session)
    }

    /// Supplies the direct-download collaborator.
    pub fn with_downloader(mut self, downloader: Arc<dyn DirectDownloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Applies a fresh preference snapshot: rebuilds the rule table and
    /// filters and re-evaluates the subscription state. Called by the host
    /// after an `{options}` message, and internally on reset. Configuration
    /// changes take effect before any subsequently scheduled flush.
    pub fn apply_preferences(&mut self, prefs: Preferences) {
        self.rules = prefs.rule_table();
        self.filters = prefs.filter_settings();
        self.enabled = !prefs.disable_detection;
        self.prefs = prefs;
    }

    /// Flips both observation-channel subscriptions together.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn live(&self) -> &[ResourceDescriptor] {
        self.aggregator.live()
    }

    pub fn restore(&self) -> &[ResourceDescriptor] {
        self.aggregator.restore()
    }

    /// Intake for one observed exchange, from either channel.
    ///
    /// Returns a DeliveryFailure notification when a direct-download
    /// hand-off failed; everything else is absorbed silently (a miss) or
    /// queued for the next flush.
    pub async fn on_exchange(
        &mut self,
        exchange: &RawExchange,
        now: Instant,
    ) -> Result<Option<Notification>> {
        if !self.enabled {
            return Ok(None);
        }
        let Some(verdict) = classify(exchange, &self.rules, &self.filters) else {
            return Ok(None);
        };

        if verdict.category.is_file_like() && self.prefs.direct_download && self.prefs.auto_download
        {
            if let Some(downloader) = self.downloader.clone() {
                return self.hand_off_download(exchange, downloader).await;
            }
        }

        self.aggregator
            .on_verdict(exchange, &verdict, self.tabs.as_ref(), now)
            .await;
        Ok(None)
    }

    /// Bypasses the descriptor list and hands the detection straight to the
    /// download collaborator.
    async fn hand_off_download(
        &mut self,
        exchange: &RawExchange,
        downloader: Arc<dyn DirectDownloader>,
    ) -> Result<Option<Notification>> {
        let Some(tab_id) = exchange.tab_id else {
            return Ok(None);
        };
        let tab = self.tabs.tab_context(tab_id).await.unwrap_or_default();
        let folder = tab
            .title
            .clone()
            .or_else(|| crate::descriptor::hostname_from_url(&exchange.url))
            .unwrap_or_default();
        let filename = crate::descriptor::filename_from_url(&exchange.url, false)
            .unwrap_or_else(|| "download".to_string());
        let request = DownloadRequest {
            url: exchange.url.clone(),
            filename: format!(
                "{}/{}",
                sanitize_path_component(&folder),
                sanitize_path_component(&filename)
            ),
            referer: exchange.header("referer").map(|r| r.to_string()),
            incognito: tab.incognito,
        };
        match downloader.download(request).await {
            Ok(()) => Ok(None),
            Err(err) => {
                tracing::warn!(url = %exchange.url, %err, "direct download failed");
                Ok(Some(notify::error_notification(&format!(
                    "Download failed: {err:#}"
                ))))
            }
        }
    }

    pub fn flush_due(&self, now: Instant) -> bool {
        self.aggregator.flush_due(now)
    }

    pub fn flush_deadline(&self) -> Option<Instant> {
        self.aggregator.flush_deadline()
    }

    /// Persists the current batch. Callers gate the returned notification on
    /// the detect-notification preference.
    pub async fn flush(&mut self) -> Result<Option<FlushOutcome>> {
        self.aggregator.flush(self.store.as_ref()).await
    }

    /// Handles one fire-and-forget protocol message.
    ///
    /// `{options}` only signals; the host re-reads its preference source and
    /// calls [`Session::apply_preferences`].
    pub async fn handle_message(&mut self, message: Message) -> Result<Vec<Event>> {
        match message {
            Message::Delete { delete, previous } => {
                let ids: Vec<String> = delete.into_iter().map(|d| d.request_id).collect();
                self.aggregator
                    .delete(&ids, previous, self.store.as_ref())
                    .await?;
                Ok(vec![Event::UrlStorageChanged])
            }
            Message::Options { .. } => Ok(Vec::new()),
            Message::UrlStorage { .. } => Ok(Vec::new()),
            Message::Reset { .. } => {
                self.store.clear().await?;
                self.aggregator.clear();
                self.apply_preferences(Preferences::default());
                Ok(vec![Event::OptionsChanged])
            }
        }
    }
}
