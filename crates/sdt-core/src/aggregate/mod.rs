//! Detection aggregation: dedup, header merge, debounced batch flush, and
//! the restore/eviction protocol.
//!
//! All session state lives in one owned [`Aggregator`] value; the classifier
//! and synthesizer stay pure, so this is the only place that mutates the
//! descriptor lists.

mod debounce;
pub mod notify;

pub use debounce::{DebounceState, DEBOUNCE_WINDOW};
pub use notify::Notification;

use std::time::Instant;

use anyhow::Result;

use crate::classify::Verdict;
use crate::descriptor::ResourceDescriptor;
use crate::exchange::RawExchange;
use crate::host::TabLookup;
use crate::store::{self, Store, KEY_URL_STORAGE, KEY_URL_STORAGE_RESTORE};

/// One detection queued since the last flush; drives notification phrasing.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub request_id: String,
    pub filename: String,
    pub resource_type: String,
}

/// An in-flight detection: the verdict exists but the descriptor list has
/// not been durably updated yet. Consulted synchronously before deciding
/// add vs merge, which closes the two-channel race.
#[derive(Debug)]
struct PendingEntry {
    request_id: String,
    url: String,
    /// Headers observed for this request id while its descriptor was still
    /// being built (tab lookup in flight).
    extra_headers: Vec<crate::exchange::Header>,
}

/// Result of one flush: what was persisted and what to tell the user.
#[derive(Debug)]
pub struct FlushOutcome {
    /// Number of detections in the flushed batch.
    pub persisted: usize,
    /// Live-list length, for the badge UI collaborator.
    pub badge_count: usize,
    pub notification: Notification,
}

/// Owned aggregator state: live + restore lists, the pending queue, the
/// current batch, and the debounce machine.
#[derive(Debug, Default)]
pub struct Aggregator {
    live: Vec<ResourceDescriptor>,
    restore: Vec<ResourceDescriptor>,
    pending: Vec<PendingEntry>,
    batch: Vec<BatchItem>,
    debounce: DebounceState,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an aggregator around previously loaded lists.
    pub fn from_lists(live: Vec<ResourceDescriptor>, restore: Vec<ResourceDescriptor>) -> Self {
        Self {
            live,
            restore,
            ..Default::default()
        }
    }

    /// Live descriptors, insertion order (oldest first). Display and export
    /// reverse this to most-recent-first.
    pub fn live(&self) -> &[ResourceDescriptor] {
        &self.live
    }

    /// Descriptors carried over from a previous session.
    pub fn restore(&self) -> &[ResourceDescriptor] {
        &self.restore
    }

    /// Intake for one classified exchange. Returns `true` when a new
    /// descriptor was queued (as opposed to merged or dropped).
    ///
    /// Invariants upheld here: at most one live descriptor per URL, and an
    /// idempotent header-union merge when the same `request_id` is observed
    /// from both channels. The pending queue is consulted synchronously,
    /// before the tab lookup suspension point.
    pub async fn on_verdict(
        &mut self,
        exchange: &RawExchange,
        verdict: &Verdict,
        tabs: &dyn TabLookup,
        now: Instant,
    ) -> bool {
        let Some(tab_id) = exchange.tab_id else {
            // Not associated with any tab; nothing to attribute it to.
            return false;
        };

        // Second observation channel for a known transaction: merge headers.
        if let Some(existing) = self
            .live
            .iter_mut()
            .find(|d| d.request_id == exchange.request_id)
        {
            existing.merge_headers(&exchange.headers);
            return false;
        }
        if let Some(pending) = self
            .pending
            .iter_mut()
            .find(|p| p.request_id == exchange.request_id)
        {
            pending.extra_headers.extend(exchange.headers.iter().cloned());
            return false;
        }

        // A different transaction for an already-detected URL: drop it.
        if self.live.iter().any(|d| d.url == exchange.url)
            || self.pending.iter().any(|p| p.url == exchange.url)
        {
            return false;
        }

        self.pending.push(PendingEntry {
            request_id: exchange.request_id.clone(),
            url: exchange.url.clone(),
            extra_headers: Vec::new(),
        });

        // Suspension point: a racing observation of the same URL lands in
        // the pending entry above instead of creating a duplicate.
        let tab = tabs.tab_context(tab_id).await.unwrap_or_default();

        let mut descriptor = ResourceDescriptor::from_exchange(exchange, verdict, tab);
        if let Some(pending) = self
            .pending
            .iter_mut()
            .find(|p| p.request_id == exchange.request_id)
        {
            let buffered = std::mem::take(&mut pending.extra_headers);
            descriptor.merge_headers(&buffered);
        }

        tracing::debug!(
            url = %descriptor.url,
            resource_type = %descriptor.resource_type,
            "queued detection"
        );

        self.batch.push(BatchItem {
            request_id: descriptor.request_id.clone(),
            filename: descriptor.filename.clone(),
            resource_type: descriptor.resource_type.clone(),
        });
        self.live.push(descriptor);
        self.debounce.on_detection(now);
        true
    }

    /// True once the quiet period after the last detection has elapsed.
    pub fn flush_due(&self, now: Instant) -> bool {
        self.debounce.flush_due(now)
    }

    /// The armed flush deadline, for drivers that sleep until it.
    pub fn flush_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Persists the live list and reports the batch. A flush with an empty
    /// batch is a no-op: no write, no notification.
    pub async fn flush(&mut self, store: &dyn Store) -> Result<Option<FlushOutcome>> {
        if self.batch.is_empty() {
            self.debounce.reset();
            return Ok(None);
        }

        store::put_descriptors(store, KEY_URL_STORAGE, &self.live).await?;

        // The batch is durable now; its entries leave the pending queue.
        self.pending
            .retain(|p| !self.batch.iter().any(|b| b.request_id == p.request_id));

        let notification = notify::detection_notification(&self.batch, notify::platform_newline());
        let outcome = FlushOutcome {
            persisted: self.batch.len(),
            badge_count: self.live.len(),
            notification,
        };
        tracing::info!(persisted = outcome.persisted, live = outcome.badge_count, "flushed detections");
        self.batch.clear();
        self.debounce.reset();
        Ok(Some(outcome))
    }

    /// Removes entries by request id from the live or restore list and
    /// persists both. Returns the new badge count.
    pub async fn delete(
        &mut self,
        request_ids: &[String],
        previous: bool,
        store: &dyn Store,
    ) -> Result<usize> {
        if previous {
            self.restore.retain(|d| !request_ids.contains(&d.request_id));
        } else {
            self.live.retain(|d| !request_ids.contains(&d.request_id));
        }
        store::put_descriptors(store, KEY_URL_STORAGE, &self.live).await?;
        store::put_descriptors(store, KEY_URL_STORAGE_RESTORE, &self.restore).await?;
        Ok(self.live.len())
    }

    /// Startup restore protocol: leftover live descriptors move en masse to
    /// the restore list, optionally age-capped, and incognito entries are
    /// purged. The live list starts empty.
    pub async fn restore_session(
        &mut self,
        store: &dyn Store,
        max_age_ms: Option<i64>,
        now_ms: i64,
    ) -> Result<()> {
        let leftover = store::get_descriptors(store, KEY_URL_STORAGE).await?;
        let mut restore = store::get_descriptors(store, KEY_URL_STORAGE_RESTORE).await?;
        restore.extend(leftover);

        if let Some(max_age) = max_age_ms {
            restore.retain(|d| now_ms - d.time_stamp < max_age);
        }
        restore.retain(|d| !d.tab_context.incognito);

        self.live = Vec::new();
        self.restore = restore;
        store::put_descriptors(store, KEY_URL_STORAGE_RESTORE, &self.restore).await?;
        store::put_descriptors(store, KEY_URL_STORAGE, &self.live).await?;
        Ok(())
    }

    /// Drops all state (user reset).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
