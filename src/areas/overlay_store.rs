//! In-memory overlay store
//!
//! Holds every live overlay together with each file's immutable baseline.
//! Overlays expire on a TTL anchored to creation and are lazily deleted on
//! read; [`OverlayStore::sweep_expired`] purges the rest. A per-file cap
//! evicts the least-recently-updated overlay first, and bounded snapshot
//! history preserves pre-update content.
//!
//! The store is caller-owned: construct one per scope, no globals.

use crate::artifacts::core::{Clock, SystemClock};
use crate::artifacts::diff::engine::compute;
use crate::artifacts::overlay::{
    ContentStrategy, CreateOverlay, Overlay, OverlayId, OverlaySnapshot,
};
use crate::artifacts::unified::UnifiedOptions;
use crate::artifacts::unified::codec::{apply_hunks_lenient, hunks_of};
use crate::artifacts::version::{ContentId, FileId, Metadata};
use chrono::{DateTime, Duration, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Macro for debug logging that is enabled with the debug_diff feature flag
///
/// # Usage
/// ```rust,ignore
/// debug_log!("replaying overlay {}", overlay_id);
/// ```
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(any(feature = "debug_diff"))]
        {
            eprintln!($($arg)*);
        }
    };
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverlayError {
    #[error("overlay {0} not found")]
    NotFound(OverlayId),
    #[error("file {0} has no baseline and no active overlays")]
    MissingBaseline(FileId),
}

#[derive(Debug, Clone, Copy)]
pub struct OverlayStoreOptions {
    max_overlays_per_file: usize,
    default_ttl: Duration,
    history_cap: usize,
    sweep_interval: std::time::Duration,
}

impl Default for OverlayStoreOptions {
    fn default() -> Self {
        Self {
            max_overlays_per_file: 10,
            default_ttl: Duration::minutes(30),
            history_cap: 10,
            sweep_interval: std::time::Duration::from_secs(5 * 60),
        }
    }
}

impl OverlayStoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_overlays_per_file(&mut self, max: usize) -> &mut Self {
        self.max_overlays_per_file = max;
        self
    }

    pub fn set_default_ttl(&mut self, ttl: Duration) -> &mut Self {
        self.default_ttl = ttl;
        self
    }

    pub fn set_history_cap(&mut self, cap: usize) -> &mut Self {
        self.history_cap = cap;
        self
    }

    pub fn set_sweep_interval(&mut self, interval: std::time::Duration) -> &mut Self {
        self.sweep_interval = interval;
        self
    }

    pub fn max_overlays_per_file(&self) -> usize {
        self.max_overlays_per_file
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn history_cap(&self) -> usize {
        self.history_cap
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        self.sweep_interval
    }
}

/// A file's immutable pristine content
#[derive(Debug, Clone)]
struct Baseline {
    content: String,
    content_id: ContentId,
}

pub struct OverlayStore {
    overlays: HashMap<OverlayId, Overlay>,
    by_file: HashMap<FileId, Vec<OverlayId>>,
    baselines: HashMap<FileId, Baseline>,
    history: HashMap<FileId, Vec<OverlaySnapshot>>,
    next_id: u64,
    options: OverlayStoreOptions,
    clock: Arc<dyn Clock>,
}

impl OverlayStore {
    pub fn new(options: OverlayStoreOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    pub fn with_clock(options: OverlayStoreOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            overlays: HashMap::new(),
            by_file: HashMap::new(),
            baselines: HashMap::new(),
            history: HashMap::new(),
            next_id: 1,
            options,
            clock,
        }
    }

    pub fn options(&self) -> &OverlayStoreOptions {
        &self.options
    }

    /// Record a file's pristine content, first write wins
    ///
    /// Returns whether the baseline was set; a repeated set is a no-op.
    pub fn set_baseline(&mut self, file_id: &FileId, content: String) -> bool {
        if self.baselines.contains_key(file_id) {
            return false;
        }

        let content_id = ContentId::of(&content);
        self.baselines.insert(
            file_id.clone(),
            Baseline {
                content,
                content_id,
            },
        );
        true
    }

    pub fn baseline(&self, file_id: &FileId) -> Option<&str> {
        self.baselines.get(file_id).map(|b| b.content.as_str())
    }

    /// Create an overlay over the file's baseline
    ///
    /// Enforces the per-file cap over active overlays, evicting the
    /// least-recently-updated first. The TTL falls back to the store
    /// default and anchors to creation.
    pub fn create_overlay(
        &mut self,
        file_id: &FileId,
        content: String,
        mut request: CreateOverlay,
    ) -> Overlay {
        let now = self.clock.now();
        self.expire_file_overlays(file_id, now);
        self.evict_for_capacity(file_id);

        let id = OverlayId::new(self.next_id);
        self.next_id += 1;

        let ttl = request.ttl().unwrap_or(self.options.default_ttl);
        let baseline_ref = self
            .baselines
            .get(file_id)
            .map(|baseline| baseline.content_id.clone());
        let overlay = Overlay::new(
            id,
            file_id.clone(),
            content,
            baseline_ref,
            now,
            now + ttl,
            request.priority(),
            request.take_metadata(),
        );

        self.overlays.insert(id, overlay.clone());
        self.by_file.entry(file_id.clone()).or_default().push(id);
        overlay
    }

    /// Replace an overlay's content and fold in metadata
    ///
    /// The pre-update state is pushed into the file's bounded snapshot
    /// history. Expiry stays anchored to creation. A missing or expired id
    /// is reported as [`OverlayError::NotFound`].
    pub fn update_overlay(
        &mut self,
        id: OverlayId,
        content: String,
        metadata: Metadata,
    ) -> Result<Overlay, OverlayError> {
        let now = self.clock.now();
        if self
            .overlays
            .get(&id)
            .is_some_and(|overlay| overlay.is_expired_at(now))
        {
            self.delete(id);
        }

        let overlay = self
            .overlays
            .get_mut(&id)
            .ok_or(OverlayError::NotFound(id))?;
        let file_id = overlay.file_id().clone();
        let snapshot = overlay.snapshot(now);

        overlay.apply_update(content, metadata, now);
        let updated = overlay.clone();

        let history = self.history.entry(file_id).or_default();
        history.push(snapshot);
        if history.len() > self.options.history_cap {
            history.remove(0);
        }

        Ok(updated)
    }

    /// Look up an overlay, lazily deleting it when expired
    pub fn get_overlay(&mut self, id: OverlayId) -> Option<&Overlay> {
        let now = self.clock.now();
        if self
            .overlays
            .get(&id)
            .is_some_and(|overlay| overlay.is_expired_at(now))
        {
            self.delete(id);
        }
        self.overlays.get(&id)
    }

    /// Active overlays of a file, most recently updated first
    pub fn get_file_overlays(&mut self, file_id: &FileId) -> Vec<&Overlay> {
        let now = self.clock.now();
        self.expire_file_overlays(file_id, now);

        let mut overlays: Vec<&Overlay> = self
            .by_file
            .get(file_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.overlays.get(id))
            .collect();
        overlays.sort_by_key(|overlay| Reverse((overlay.updated_at(), overlay.id())));
        overlays
    }

    /// Remove an overlay outright; a second remove of the same id is a no-op
    pub fn remove_overlay(&mut self, id: OverlayId) -> Option<Overlay> {
        let removed = self.overlays.remove(&id)?;
        if let Some(ids) = self.by_file.get_mut(removed.file_id()) {
            ids.retain(|other| *other != id);
        }
        Some(removed)
    }

    /// Resolve the file's preview content under the given strategy
    ///
    /// With no active overlays the baseline is returned as-is; with neither
    /// a baseline nor overlays this is [`OverlayError::MissingBaseline`].
    pub fn get_merged_content(
        &mut self,
        file_id: &FileId,
        strategy: ContentStrategy,
    ) -> Result<String, OverlayError> {
        let now = self.clock.now();
        self.expire_file_overlays(file_id, now);

        let baseline = self.baselines.get(file_id).map(|b| b.content.as_str());
        let mut active: Vec<&Overlay> = self
            .by_file
            .get(file_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.overlays.get(id))
            .collect();

        if active.is_empty() {
            return baseline
                .map(str::to_string)
                .ok_or_else(|| OverlayError::MissingBaseline(file_id.clone()));
        }

        match strategy {
            ContentStrategy::Latest => {
                let winner = active
                    .iter()
                    .max_by_key(|overlay| (overlay.updated_at(), overlay.id()))
                    .ok_or_else(|| OverlayError::MissingBaseline(file_id.clone()))?;
                Ok(winner.content().to_string())
            }
            ContentStrategy::Priority => {
                let winner = active
                    .iter()
                    .max_by_key(|overlay| (overlay.priority(), overlay.updated_at(), overlay.id()))
                    .ok_or_else(|| OverlayError::MissingBaseline(file_id.clone()))?;
                Ok(winner.content().to_string())
            }
            ContentStrategy::Composite => {
                // whole-content fold in descending priority order, each
                // step fully replacing the previous content
                active.sort_by_key(|overlay| {
                    (
                        Reverse(overlay.priority()),
                        overlay.updated_at(),
                        overlay.id(),
                    )
                });
                let mut content = baseline.unwrap_or_default().to_string();
                for overlay in active {
                    content = overlay.content().to_string();
                }
                Ok(content)
            }
            ContentStrategy::Merge => {
                let base = baseline.unwrap_or_default().to_string();
                active.sort_by_key(|overlay| {
                    (overlay.priority(), overlay.updated_at(), overlay.id())
                });

                let options = UnifiedOptions::default();
                let mut merged = base.clone();
                for overlay in active {
                    let hunks = hunks_of(&compute(&base, overlay.content()), &options);
                    debug_log!(
                        "replaying overlay {} onto {}: {} hunks",
                        overlay.id(),
                        file_id,
                        hunks.len()
                    );
                    let (next, skipped) = apply_hunks_lenient(&merged, &hunks);
                    if skipped > 0 {
                        debug!(
                            file = %file_id,
                            overlay = %overlay.id(),
                            skipped,
                            "merge skipped mismatching hunks"
                        );
                    }
                    merged = next;
                }
                Ok(merged)
            }
        }
    }

    /// Purge every expired overlay, returning how many went away
    pub fn sweep_expired(&mut self) -> usize {
        self.sweep_expired_detailed().len()
    }

    /// Like [`OverlayStore::sweep_expired`] but hands back the purged
    /// overlays, marked expired, so callers can report them
    pub(crate) fn sweep_expired_detailed(&mut self) -> Vec<Overlay> {
        let now = self.clock.now();
        let expired: Vec<OverlayId> = self
            .overlays
            .values()
            .filter(|overlay| overlay.is_expired_at(now))
            .map(Overlay::id)
            .collect();

        let mut purged = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(mut overlay) = self.remove_overlay(id) {
                overlay.mark_expired();
                purged.push(overlay);
            }
        }

        if !purged.is_empty() {
            debug!(count = purged.len(), "swept expired overlays");
        }
        purged
    }

    /// Pre-update snapshots of a file, oldest first
    pub fn history(&self, file_id: &FileId) -> &[OverlaySnapshot] {
        self.history.get(file_id).map_or(&[], Vec::as_slice)
    }

    /// Drop every overlay, baseline and snapshot
    pub fn clear(&mut self) {
        self.overlays.clear();
        self.by_file.clear();
        self.baselines.clear();
        self.history.clear();
    }

    fn expire_file_overlays(&mut self, file_id: &FileId, now: DateTime<Utc>) {
        let expired: Vec<OverlayId> = self
            .by_file
            .get(file_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.overlays.get(id))
            .filter(|overlay| overlay.is_expired_at(now))
            .map(Overlay::id)
            .collect();

        for id in expired {
            self.delete(id);
        }
    }

    fn evict_for_capacity(&mut self, file_id: &FileId) {
        let mut active: Vec<(DateTime<Utc>, OverlayId)> = self
            .by_file
            .get(file_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.overlays.get(id))
            .map(|overlay| (overlay.updated_at(), overlay.id()))
            .collect();
        active.sort_unstable();

        let excess = (active.len() + 1).saturating_sub(self.options.max_overlays_per_file);
        for &(_, id) in active.iter().take(excess) {
            self.delete(id);
            debug!(overlay = %id, file = %file_id, "evicted overlay for capacity");
        }
    }

    fn delete(&mut self, id: OverlayId) {
        if let Some(overlay) = self.overlays.remove(&id)
            && let Some(ids) = self.by_file.get_mut(overlay.file_id())
        {
            ids.retain(|other| *other != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::core::ManualClock;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    fn file(id: &str) -> FileId {
        FileId::try_parse(id.to_string()).unwrap()
    }

    #[fixture]
    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::starting_at(Utc::now()))
    }

    fn store_with(clock: &Arc<ManualClock>, options: OverlayStoreOptions) -> OverlayStore {
        OverlayStore::with_clock(options, Arc::clone(clock) as Arc<dyn Clock>)
    }

    #[rstest]
    fn created_overlays_read_back(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let created = store.create_overlay(&file, "preview".to_string(), CreateOverlay::new());

        let read = store.get_overlay(created.id()).unwrap();
        assert_eq!(read.content(), "preview");
        assert_eq!(read.version(), 1);
        assert_eq!(read.baseline_ref(), None);
    }

    #[rstest]
    fn overlays_reference_the_baseline_content_id(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        assert!(store.set_baseline(&file, "pristine".to_string()));
        let created = store.create_overlay(&file, "changed".to_string(), CreateOverlay::new());

        assert_eq!(created.baseline_ref(), Some(&ContentId::of("pristine")));
    }

    #[rstest]
    fn baseline_writes_after_the_first_are_ignored(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        assert!(store.set_baseline(&file, "first".to_string()));
        assert!(!store.set_baseline(&file, "second".to_string()));
        assert_eq!(store.baseline(&file), Some("first"));
    }

    #[rstest]
    fn overlays_expire_strictly_after_their_ttl(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let mut request = CreateOverlay::new();
        request.set_ttl(Duration::minutes(10));
        let created = store.create_overlay(&file, "short-lived".to_string(), request);

        clock.advance(Duration::minutes(10));
        assert!(store.get_overlay(created.id()).is_some());

        clock.advance(Duration::seconds(1));
        assert!(store.get_overlay(created.id()).is_none());
        assert!(store.get_file_overlays(&file).is_empty());
    }

    #[rstest]
    fn sweep_purges_once_and_is_idempotent(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let mut request = CreateOverlay::new();
        request.set_ttl(Duration::minutes(1));
        store.create_overlay(&file, "a".to_string(), request.clone());
        store.create_overlay(&file, "b".to_string(), request);

        clock.advance(Duration::minutes(2));

        assert_eq!(store.sweep_expired(), 2);
        assert_eq!(store.sweep_expired(), 0);
    }

    #[rstest]
    fn updates_preserve_creation_and_expiry(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let created = store.create_overlay(&file, "v1".to_string(), CreateOverlay::new());
        clock.advance(Duration::minutes(5));

        let updated = store
            .update_overlay(created.id(), "v2".to_string(), Metadata::new())
            .unwrap();

        assert_eq!(updated.version(), 2);
        assert_eq!(updated.content(), "v2");
        assert_eq!(updated.created_at(), created.created_at());
        assert_eq!(updated.expires_at(), created.expires_at());
        assert!(updated.updated_at() > created.updated_at());
    }

    #[rstest]
    fn updating_a_missing_or_expired_overlay_is_not_found(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let unknown = OverlayId::new(999);
        assert_eq!(
            store.update_overlay(unknown, "x".to_string(), Metadata::new()),
            Err(OverlayError::NotFound(unknown))
        );

        let mut request = CreateOverlay::new();
        request.set_ttl(Duration::minutes(1));
        let created = store.create_overlay(&file, "short".to_string(), request);
        clock.advance(Duration::minutes(2));

        assert_eq!(
            store.update_overlay(created.id(), "x".to_string(), Metadata::new()),
            Err(OverlayError::NotFound(created.id()))
        );
    }

    #[rstest]
    fn history_keeps_the_newest_snapshots_up_to_the_cap(clock: Arc<ManualClock>) {
        let mut options = OverlayStoreOptions::new();
        options.set_history_cap(2);
        let mut store = store_with(&clock, options);
        let file = file("src/app.ts");

        let created = store.create_overlay(&file, "v1".to_string(), CreateOverlay::new());
        for content in ["v2", "v3", "v4"] {
            store
                .update_overlay(created.id(), content.to_string(), Metadata::new())
                .unwrap();
        }

        let history = store.history(&file);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content(), "v2");
        assert_eq!(history[1].content(), "v3");
        assert_eq!(history[1].version(), 3);
    }

    #[rstest]
    fn capacity_evicts_the_least_recently_updated(clock: Arc<ManualClock>) {
        let mut options = OverlayStoreOptions::new();
        options.set_max_overlays_per_file(3);
        let mut store = store_with(&clock, options);
        let file = file("src/app.ts");

        let mut ids = Vec::new();
        for content in ["a", "b", "c", "d"] {
            ids.push(
                store
                    .create_overlay(&file, content.to_string(), CreateOverlay::new())
                    .id(),
            );
            clock.advance(Duration::seconds(1));
        }

        assert!(store.get_overlay(ids[0]).is_none());
        let remaining = store.get_file_overlays(&file);
        assert_eq!(remaining.len(), 3);
    }

    #[rstest]
    fn remove_is_idempotent(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let created = store.create_overlay(&file, "x".to_string(), CreateOverlay::new());

        assert!(store.remove_overlay(created.id()).is_some());
        assert!(store.remove_overlay(created.id()).is_none());
    }

    #[rstest]
    fn merged_content_without_anything_is_missing_baseline(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        assert_eq!(
            store.get_merged_content(&file, ContentStrategy::Latest),
            Err(OverlayError::MissingBaseline(file.clone()))
        );
    }

    #[rstest]
    fn merged_content_falls_back_to_the_baseline(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        store.set_baseline(&file, "pristine".to_string());
        let mut request = CreateOverlay::new();
        request.set_ttl(Duration::minutes(1));
        store.create_overlay(&file, "ephemeral".to_string(), request);
        clock.advance(Duration::minutes(2));

        assert_eq!(
            store.get_merged_content(&file, ContentStrategy::Latest),
            Ok("pristine".to_string())
        );
    }

    #[rstest]
    fn latest_takes_the_most_recently_updated(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let first = store.create_overlay(&file, "first".to_string(), CreateOverlay::new());
        clock.advance(Duration::seconds(1));
        store.create_overlay(&file, "second".to_string(), CreateOverlay::new());
        clock.advance(Duration::seconds(1));
        store
            .update_overlay(first.id(), "first again".to_string(), Metadata::new())
            .unwrap();

        assert_eq!(
            store.get_merged_content(&file, ContentStrategy::Latest),
            Ok("first again".to_string())
        );
    }

    #[rstest]
    fn priority_takes_the_highest_priority(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let mut low = CreateOverlay::new();
        low.set_priority(1);
        store.create_overlay(&file, "A".to_string(), low);

        let mut high = CreateOverlay::new();
        high.set_priority(2);
        store.create_overlay(&file, "B".to_string(), high);

        assert_eq!(
            store.get_merged_content(&file, ContentStrategy::Priority),
            Ok("B".to_string())
        );
    }

    #[rstest]
    fn composite_folds_in_descending_priority_order(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");
        store.set_baseline(&file, "base".to_string());

        let mut high = CreateOverlay::new();
        high.set_priority(2);
        store.create_overlay(&file, "high".to_string(), high);

        let mut low = CreateOverlay::new();
        low.set_priority(1);
        store.create_overlay(&file, "low".to_string(), low);

        // every step fully replaces, so the fold ends on the lowest priority
        assert_eq!(
            store.get_merged_content(&file, ContentStrategy::Composite),
            Ok("low".to_string())
        );
    }

    #[rstest]
    fn merge_stacks_non_overlapping_edits(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let baseline = "1\n2\n3\n4\n5\n6\n7\n8\n9\n";
        store.set_baseline(&file, baseline.to_string());

        let mut first = CreateOverlay::new();
        first.set_priority(1);
        store.create_overlay(
            &file,
            "one\n2\n3\n4\n5\n6\n7\n8\n9\n".to_string(),
            first,
        );

        let mut second = CreateOverlay::new();
        second.set_priority(2);
        store.create_overlay(
            &file,
            "1\n2\n3\n4\n5\n6\n7\n8\nnine\n".to_string(),
            second,
        );

        assert_eq!(
            store.get_merged_content(&file, ContentStrategy::Merge),
            Ok("one\n2\n3\n4\n5\n6\n7\n8\nnine\n".to_string())
        );
    }

    #[rstest]
    fn merge_skips_overlays_that_no_longer_fit(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        let baseline = "1\n2\n3\n4\n5\n6\n7\n8\n9\n";
        store.set_baseline(&file, baseline.to_string());

        let mut first = CreateOverlay::new();
        first.set_priority(1);
        store.create_overlay(
            &file,
            "one\n2\n3\n4\n5\n6\n7\n8\n9\n".to_string(),
            first,
        );

        // conflicts with the first overlay on line 1
        let mut second = CreateOverlay::new();
        second.set_priority(2);
        store.create_overlay(
            &file,
            "uno\n2\n3\n4\n5\n6\n7\n8\n9\n".to_string(),
            second,
        );

        assert_eq!(
            store.get_merged_content(&file, ContentStrategy::Merge),
            Ok("one\n2\n3\n4\n5\n6\n7\n8\n9\n".to_string())
        );
    }

    #[rstest]
    fn clear_resets_the_store(clock: Arc<ManualClock>) {
        let mut store = store_with(&clock, OverlayStoreOptions::default());
        let file = file("src/app.ts");

        store.set_baseline(&file, "base".to_string());
        let created = store.create_overlay(&file, "x".to_string(), CreateOverlay::new());
        store.clear();

        assert!(store.get_overlay(created.id()).is_none());
        assert_eq!(store.baseline(&file), None);
        assert!(store.history(&file).is_empty());
    }
}
