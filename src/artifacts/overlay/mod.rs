//! Overlay value types
//!
//! An overlay is a short-lived full-content candidate layered over a file's
//! immutable baseline. Overlays expire on a TTL, carry a priority for
//! content resolution and count their updates in a `version` field; bounded
//! [`OverlaySnapshot`] copies preserve pre-update content for history.

use crate::artifacts::version::{ContentId, FileId, Metadata};
use chrono::{DateTime, Duration, Utc};
use derive_new::new;

/// Identifier of one overlay, monotonic within its store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, new)]
pub struct OverlayId(u64);

impl std::fmt::Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStatus {
    Active,
    Expired,
}

/// How overlapping overlays resolve into one preview content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentStrategy {
    /// The most recently updated active overlay wins outright
    #[default]
    Latest,
    /// The highest-priority active overlay wins outright
    Priority,
    /// Whole-content fold over the baseline in descending priority order
    Composite,
    /// Each overlay's edit script against the baseline, replayed
    /// cumulatively in ascending priority order; mismatching hunks skipped
    Merge,
}

/// One live preview layered over a file's baseline
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    id: OverlayId,
    file_id: FileId,
    content: String,
    baseline_ref: Option<ContentId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    priority: i64,
    version: u64,
    status: OverlayStatus,
    metadata: Metadata,
}

impl Overlay {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: OverlayId,
        file_id: FileId,
        content: String,
        baseline_ref: Option<ContentId>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        priority: i64,
        metadata: Metadata,
    ) -> Self {
        Self {
            id,
            file_id,
            content,
            baseline_ref,
            created_at,
            updated_at: created_at,
            expires_at,
            priority,
            version: 1,
            status: OverlayStatus::Active,
            metadata,
        }
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn baseline_ref(&self) -> Option<&ContentId> {
        self.baseline_ref.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Update counter, 1 on creation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn status(&self) -> OverlayStatus {
        self.status
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Expiry anchors to creation; updates never extend it
    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == OverlayStatus::Expired || now > self.expires_at
    }

    pub(crate) fn mark_expired(&mut self) {
        self.status = OverlayStatus::Expired;
    }

    /// Replace content, fold in metadata, bump the update counter
    pub(crate) fn apply_update(&mut self, content: String, metadata: Metadata, at: DateTime<Utc>) {
        self.content = content;
        self.metadata.extend(metadata);
        self.updated_at = at;
        self.version += 1;
    }

    pub(crate) fn snapshot(&self, recorded_at: DateTime<Utc>) -> OverlaySnapshot {
        OverlaySnapshot::new(self.id, self.version, self.content.clone(), recorded_at)
    }
}

/// Bounded pre-update copy of an overlay's content
#[derive(Debug, Clone, PartialEq, new)]
pub struct OverlaySnapshot {
    overlay_id: OverlayId,
    version: u64,
    content: String,
    recorded_at: DateTime<Utc>,
}

impl OverlaySnapshot {
    pub fn overlay_id(&self) -> OverlayId {
        self.overlay_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Parameters for creating one overlay
///
/// `ttl` falls back to the store's default when unset.
#[derive(Debug, Clone, Default)]
pub struct CreateOverlay {
    ttl: Option<Duration>,
    priority: i64,
    metadata: Metadata,
}

impl CreateOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ttl(&mut self, ttl: Duration) -> &mut Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn set_priority(&mut self, priority: i64) -> &mut Self {
        self.priority = priority;
        self
    }

    pub fn set_metadata(&mut self, metadata: Metadata) -> &mut Self {
        self.metadata = metadata;
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn take_metadata(&mut self) -> Metadata {
        std::mem::take(&mut self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_overlay(created_at: DateTime<Utc>) -> Overlay {
        Overlay::new(
            OverlayId::new(1),
            FileId::try_parse("src/app.ts".to_string()).unwrap(),
            "original".to_string(),
            None,
            created_at,
            created_at + Duration::minutes(30),
            0,
            Metadata::new(),
        )
    }

    #[test]
    fn updates_bump_the_counter_but_not_the_expiry() {
        let created = Utc::now();
        let mut overlay = sample_overlay(created);
        let expires = overlay.expires_at();

        overlay.apply_update(
            "changed".to_string(),
            Metadata::new(),
            created + Duration::seconds(5),
        );

        assert_eq!(overlay.version(), 2);
        assert_eq!(overlay.content(), "changed");
        assert_eq!(overlay.created_at(), created);
        assert_eq!(overlay.expires_at(), expires);
    }

    #[test]
    fn expiry_is_strict() {
        let created = Utc::now();
        let overlay = sample_overlay(created);

        assert!(!overlay.is_expired_at(created + Duration::minutes(30)));
        assert!(overlay.is_expired_at(created + Duration::minutes(30) + Duration::seconds(1)));
    }

    #[test]
    fn updates_fold_metadata_in() {
        let created = Utc::now();
        let mut overlay = sample_overlay(created);

        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), serde_json::json!("editor"));
        overlay.apply_update("x".to_string(), metadata, created);

        assert_eq!(
            overlay.metadata().get("source"),
            Some(&serde_json::json!("editor"))
        );
    }

    #[test]
    fn snapshots_copy_the_pre_update_state() {
        let created = Utc::now();
        let overlay = sample_overlay(created);

        let snapshot = overlay.snapshot(created);

        assert_eq!(snapshot.overlay_id(), overlay.id());
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.content(), "original");
    }
}
