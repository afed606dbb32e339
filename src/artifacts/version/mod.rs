//! Version-graph value types
//!
//! Versions are immutable snapshots of one file's content, addressed by a
//! SHA-1 [`VersionId`] that also covers parentage, timestamp and a per-graph
//! sequence number, so identical content still yields a fresh id. Branches
//! and tags are named references; their names follow the usual ref-name
//! rules (no leading dot or slash, no `..`, no `.lock` suffix, no control
//! or glob characters).

use crate::artifacts::diff::DiffStats;
use crate::artifacts::diff::codec::CompressedDiff;
use anyhow::Context;
use chrono::{DateTime, Utc};
use derive_new::new;
use sha1::{Digest, Sha1};
use std::collections::HashMap;

pub const VERSION_ID_LENGTH: usize = 40;
pub const SHORT_ID_LENGTH: usize = 7;
pub const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Free-form string-keyed JSON attached to versions, tags and overlays
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Identifier of one version (SHA-1 hash)
///
/// Covers the file id, the parent ids, the timestamp, the graph sequence
/// number and the content, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionId(String);

impl VersionId {
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != VERSION_ID_LENGTH {
            return Err(anyhow::anyhow!("invalid version id length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("invalid version id characters: {id}"));
        }
        Ok(Self(id))
    }

    pub(crate) fn compute(
        file_id: &FileId,
        parents: &[VersionId],
        timestamp: DateTime<Utc>,
        sequence: u64,
        content: &str,
    ) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(file_id.as_ref().as_bytes());
        hasher.update(b"\0");
        for parent in parents {
            hasher.update(parent.as_ref().as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(timestamp.to_rfc3339().as_bytes());
        hasher.update(sequence.to_be_bytes());
        hasher.update(content.as_bytes());

        let digest = hasher.finalize();
        Self(format!("{digest:x}"))
    }

    /// Abbreviated form, first 7 characters
    pub fn short(&self) -> String {
        self.0.split_at(SHORT_ID_LENGTH).0.to_string()
    }
}

impl AsRef<str> for VersionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a content blob alone (SHA-1 hash)
///
/// Baseline references use this: two equal texts share one content id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    pub fn of(content: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(content.as_bytes());

        let digest = hasher.finalize();
        Self(format!("{digest:x}"))
    }

    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != VERSION_ID_LENGTH {
            return Err(anyhow::anyhow!("invalid content id length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("invalid content id characters: {id}"));
        }
        Ok(Self(id))
    }

    pub fn short(&self) -> String {
        self.0.split_at(SHORT_ID_LENGTH).0.to_string()
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one tracked file (any non-empty string, typically a path)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(String);

impl FileId {
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.is_empty() {
            anyhow::bail!("file id cannot be empty");
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: String) -> anyhow::Result<Self> {
        validate_ref_name("branch", &name)?;
        Ok(Self(name))
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagName(String);

impl TagName {
    pub fn try_parse(name: String) -> anyhow::Result<Self> {
        validate_ref_name("tag", &name)?;
        Ok(Self(name))
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_ref_name(kind: &str, name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        anyhow::bail!("{kind} name cannot be empty");
    }

    let re = regex::Regex::new(INVALID_REF_NAME_REGEX)
        .with_context(|| format!("invalid ref name regex: {INVALID_REF_NAME_REGEX}"))?;

    if re.is_match(name) {
        anyhow::bail!("invalid {kind} name: {name}");
    }
    Ok(())
}

/// One immutable snapshot of a file's content
///
/// `patches` holds the edit script from each parent to this version; merges
/// add a second parent edge, which is the only growth after creation.
#[derive(Debug, Clone)]
pub struct Version {
    id: VersionId,
    file_id: FileId,
    content: String,
    timestamp: DateTime<Utc>,
    parents: Vec<VersionId>,
    patches: HashMap<VersionId, Patch>,
    metadata: Metadata,
}

impl Version {
    pub(crate) fn new(
        id: VersionId,
        file_id: FileId,
        content: String,
        timestamp: DateTime<Utc>,
        parents: Vec<VersionId>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id,
            file_id,
            content,
            timestamp,
            parents,
            patches: HashMap::new(),
            metadata,
        }
    }

    pub fn id(&self) -> &VersionId {
        &self.id
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn parents(&self) -> &[VersionId] {
        &self.parents
    }

    /// Edit script carried on the `parent` → self edge, if that edge exists
    pub fn patch_from(&self, parent: &VersionId) -> Option<&Patch> {
        self.patches.get(parent)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn add_patch(&mut self, parent: VersionId, patch: Patch) {
        self.patches.insert(parent, patch);
    }
}

/// Edit script plus its tallies on a parent → child edge
#[derive(Debug, Clone, new)]
pub struct Patch {
    diff: CompressedDiff,
    stats: DiffStats,
}

impl Patch {
    pub fn diff(&self) -> &CompressedDiff {
        &self.diff
    }

    pub fn stats(&self) -> &DiffStats {
        &self.stats
    }
}

/// Named line of development over one file
///
/// `history` is the linear append log of versions landed on this branch;
/// `head` always equals its last entry.
#[derive(Debug, Clone)]
pub struct Branch {
    name: BranchName,
    file_id: FileId,
    base: VersionId,
    head: VersionId,
    history: Vec<VersionId>,
    metadata: Metadata,
}

impl Branch {
    pub(crate) fn new(
        name: BranchName,
        file_id: FileId,
        base: VersionId,
        metadata: Metadata,
    ) -> Self {
        Self {
            name,
            file_id,
            head: base.clone(),
            history: vec![base.clone()],
            base,
            metadata,
        }
    }

    pub fn name(&self) -> &BranchName {
        &self.name
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn base(&self) -> &VersionId {
        &self.base
    }

    pub fn head(&self) -> &VersionId {
        &self.head
    }

    pub fn history(&self) -> &[VersionId] {
        &self.history
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn advance(&mut self, id: VersionId) {
        self.head = id.clone();
        self.history.push(id);
    }
}

/// Named immutable pointer to one version
#[derive(Debug, Clone, new)]
pub struct Tag {
    name: TagName,
    version_id: VersionId,
    created_at: DateTime<Utc>,
    metadata: Metadata,
}

impl Tag {
    pub fn name(&self) -> &TagName {
        &self.name
    }

    pub fn version_id(&self) -> &VersionId {
        &self.version_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
