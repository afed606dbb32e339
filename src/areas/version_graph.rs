//! File version graph
//!
//! Tracks immutable content versions per file as a DAG: every version names
//! its parents and carries a compressed edit script on each parent edge.
//! Branches are named linear append logs over the DAG, tags are immutable
//! pointers, and each file keeps a cursor (current version + active branch).
//!
//! Unknown-id references fail fast with a typed [`GraphError`]; the graph
//! never degrades silently.

use crate::artifacts::core::{Clock, SystemClock};
use crate::artifacts::diff::codec::compress;
use crate::artifacts::diff::engine::{compute, replay, stats};
use crate::artifacts::version::{
    Branch, BranchName, FileId, Metadata, Patch, Tag, TagName, Version, VersionId,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("file {0} is already tracked")]
    FileExists(FileId),
    #[error("file {0} not found")]
    FileNotFound(FileId),
    #[error("version {0} not found")]
    VersionNotFound(VersionId),
    #[error("branch {0} not found")]
    BranchNotFound(BranchName),
    #[error("branch {0} already exists")]
    BranchExists(BranchName),
    #[error("tag {0} already exists")]
    TagExists(TagName),
    #[error("invalid ref name: {0}")]
    InvalidName(String),
    #[error("version {version} does not belong to file {file}")]
    ForeignVersion { file: FileId, version: VersionId },
}

/// How [`VersionGraph::merge_branch`] resolves the merged content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Take the source head's content
    Source,
    /// Take the target head's content
    Target,
    /// Replay the source→target edit script onto the target head
    Diff,
}

#[derive(Debug, Clone)]
pub struct GraphOptions {
    max_versions_per_file: usize,
    default_branch: String,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            max_versions_per_file: 100,
            default_branch: "main".to_string(),
        }
    }
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_versions_per_file(&mut self, max: usize) -> &mut Self {
        self.max_versions_per_file = max;
        self
    }

    pub fn set_default_branch(&mut self, name: impl Into<String>) -> &mut Self {
        self.default_branch = name.into();
        self
    }

    pub fn max_versions_per_file(&self) -> usize {
        self.max_versions_per_file
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }
}

/// A file's mutable position in the graph
#[derive(Debug, Clone)]
struct FileCursor {
    current: VersionId,
    active_branch: BranchName,
}

pub struct VersionGraph {
    versions: HashMap<VersionId, Version>,
    files: HashMap<FileId, FileCursor>,
    file_versions: HashMap<FileId, Vec<VersionId>>,
    branches: HashMap<(FileId, BranchName), Branch>,
    tags: HashMap<TagName, Tag>,
    sequence: u64,
    options: GraphOptions,
    clock: Arc<dyn Clock>,
}

impl VersionGraph {
    pub fn new(options: GraphOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    pub fn with_clock(options: GraphOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            versions: HashMap::new(),
            files: HashMap::new(),
            file_versions: HashMap::new(),
            branches: HashMap::new(),
            tags: HashMap::new(),
            sequence: 0,
            options,
            clock,
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// Start tracking a file at its first version
    ///
    /// v₀ has no parents. The default branch is seeded with base and head at
    /// v₀ and becomes the file's active branch.
    pub fn create_file(
        &mut self,
        file_id: &FileId,
        content: String,
        metadata: Metadata,
    ) -> Result<Version, GraphError> {
        if self.files.contains_key(file_id) {
            return Err(GraphError::FileExists(file_id.clone()));
        }
        let branch_name = BranchName::try_parse(self.options.default_branch.clone())
            .map_err(|err| GraphError::InvalidName(err.to_string()))?;

        let now = self.clock.now();
        let id = self.next_version_id(file_id, &[], now, &content);
        let version = Version::new(
            id.clone(),
            file_id.clone(),
            content,
            now,
            Vec::new(),
            metadata,
        );
        let branch = Branch::new(
            branch_name.clone(),
            file_id.clone(),
            id.clone(),
            Metadata::new(),
        );

        self.versions.insert(id.clone(), version.clone());
        self.file_versions
            .entry(file_id.clone())
            .or_default()
            .push(id.clone());
        self.branches
            .insert((file_id.clone(), branch_name.clone()), branch);
        self.files.insert(
            file_id.clone(),
            FileCursor {
                current: id,
                active_branch: branch_name,
            },
        );
        Ok(version)
    }

    /// Record a new version of the file on its active branch
    ///
    /// Computes the edit script from the current head, appends to the active
    /// branch history, and advances head and cursor. Exceeding the per-file
    /// ceiling evicts the oldest versions that are neither a branch head nor
    /// a file's current version.
    pub fn create_version(
        &mut self,
        file_id: &FileId,
        content: String,
        metadata: Metadata,
    ) -> Result<Version, GraphError> {
        let cursor = self
            .files
            .get(file_id)
            .ok_or_else(|| GraphError::FileNotFound(file_id.clone()))?;
        let parent_id = cursor.current.clone();
        let branch_name = cursor.active_branch.clone();

        self.record_version(file_id, parent_id, branch_name, content, metadata)
    }

    /// Record a new forward version carrying the target's content
    ///
    /// History is never truncated; the returned id is always fresh. The
    /// version's metadata is tagged with `revert_of: <target id>`.
    pub fn revert_to_version(
        &mut self,
        file_id: &FileId,
        target_id: &VersionId,
        mut metadata: Metadata,
    ) -> Result<Version, GraphError> {
        let cursor = self
            .files
            .get(file_id)
            .ok_or_else(|| GraphError::FileNotFound(file_id.clone()))?;
        let target = self
            .versions
            .get(target_id)
            .ok_or_else(|| GraphError::VersionNotFound(target_id.clone()))?;
        if target.file_id() != file_id {
            return Err(GraphError::ForeignVersion {
                file: file_id.clone(),
                version: target_id.clone(),
            });
        }

        let content = target.content().to_string();
        metadata.insert(
            "revert_of".to_string(),
            serde_json::Value::String(target_id.to_string()),
        );
        let parent_id = cursor.current.clone();
        let branch_name = cursor.active_branch.clone();

        self.record_version(file_id, parent_id, branch_name, content, metadata)
    }

    /// Create a branch based at an existing version
    ///
    /// Branch names are namespaced per file and the active cursor does not
    /// move.
    pub fn create_branch(
        &mut self,
        name: &str,
        base_version_id: &VersionId,
        metadata: Metadata,
    ) -> Result<Branch, GraphError> {
        let name = BranchName::try_parse(name.to_string())
            .map_err(|err| GraphError::InvalidName(err.to_string()))?;
        let base = self
            .versions
            .get(base_version_id)
            .ok_or_else(|| GraphError::VersionNotFound(base_version_id.clone()))?;
        let file_id = base.file_id().clone();
        let key = (file_id.clone(), name.clone());
        if self.branches.contains_key(&key) {
            return Err(GraphError::BranchExists(name));
        }

        let branch = Branch::new(name, file_id, base_version_id.clone(), metadata);
        self.branches.insert(key, branch.clone());
        Ok(branch)
    }

    /// Repoint the file's active cursor at the branch's head
    pub fn switch_to_branch(
        &mut self,
        file_id: &FileId,
        name: &str,
    ) -> Result<Branch, GraphError> {
        let name = BranchName::try_parse(name.to_string())
            .map_err(|err| GraphError::InvalidName(err.to_string()))?;
        if !self.files.contains_key(file_id) {
            return Err(GraphError::FileNotFound(file_id.clone()));
        }
        let branch = self
            .branches
            .get(&(file_id.clone(), name.clone()))
            .ok_or(GraphError::BranchNotFound(name))?
            .clone();

        if let Some(cursor) = self.files.get_mut(file_id) {
            cursor.active_branch = branch.name().clone();
            cursor.current = branch.head().clone();
        }
        Ok(branch)
    }

    /// Merge the source branch into the target branch
    ///
    /// The merge version has parents `[target_head, source_head]` and a
    /// Patch on both parent edges. It lands on the target branch; the file's
    /// cursor follows only when the target is the active branch.
    pub fn merge_branch(
        &mut self,
        file_id: &FileId,
        source: &str,
        target: &str,
        strategy: MergeStrategy,
    ) -> Result<Version, GraphError> {
        let source_name = BranchName::try_parse(source.to_string())
            .map_err(|err| GraphError::InvalidName(err.to_string()))?;
        let target_name = BranchName::try_parse(target.to_string())
            .map_err(|err| GraphError::InvalidName(err.to_string()))?;
        if !self.files.contains_key(file_id) {
            return Err(GraphError::FileNotFound(file_id.clone()));
        }

        let source_head_id = self
            .branches
            .get(&(file_id.clone(), source_name.clone()))
            .ok_or(GraphError::BranchNotFound(source_name))?
            .head()
            .clone();
        let target_head_id = self
            .branches
            .get(&(file_id.clone(), target_name.clone()))
            .ok_or_else(|| GraphError::BranchNotFound(target_name.clone()))?
            .head()
            .clone();
        let source_head = self
            .versions
            .get(&source_head_id)
            .ok_or_else(|| GraphError::VersionNotFound(source_head_id.clone()))?;
        let target_head = self
            .versions
            .get(&target_head_id)
            .ok_or_else(|| GraphError::VersionNotFound(target_head_id.clone()))?;

        let content = match strategy {
            MergeStrategy::Source => source_head.content().to_string(),
            MergeStrategy::Target => target_head.content().to_string(),
            MergeStrategy::Diff => replay(&compute(source_head.content(), target_head.content())),
        };
        let target_patch = patch_between(target_head.content(), &content);
        let source_patch = patch_between(source_head.content(), &content);

        let now = self.clock.now();
        let parents = vec![target_head_id.clone(), source_head_id.clone()];
        let id = self.next_version_id(file_id, &parents, now, &content);
        let mut version = Version::new(
            id.clone(),
            file_id.clone(),
            content,
            now,
            parents,
            Metadata::new(),
        );
        version.add_patch(target_head_id, target_patch);
        version.add_patch(source_head_id, source_patch);

        self.versions.insert(id.clone(), version.clone());
        self.file_versions
            .entry(file_id.clone())
            .or_default()
            .push(id.clone());
        if let Some(branch) = self.branches.get_mut(&(file_id.clone(), target_name.clone())) {
            branch.advance(id.clone());
        }
        if let Some(cursor) = self.files.get_mut(file_id)
            && cursor.active_branch == target_name
        {
            cursor.current = id;
        }
        self.evict_over_ceiling(file_id);
        Ok(version)
    }

    /// Pin a version under an immutable name, global across files
    pub fn create_tag(
        &mut self,
        name: &str,
        version_id: &VersionId,
        metadata: Metadata,
    ) -> Result<Tag, GraphError> {
        let name = TagName::try_parse(name.to_string())
            .map_err(|err| GraphError::InvalidName(err.to_string()))?;
        if !self.versions.contains_key(version_id) {
            return Err(GraphError::VersionNotFound(version_id.clone()));
        }
        if self.tags.contains_key(&name) {
            return Err(GraphError::TagExists(name));
        }

        let tag = Tag::new(name.clone(), version_id.clone(), self.clock.now(), metadata);
        self.tags.insert(name, tag.clone());
        Ok(tag)
    }

    pub fn version(&self, id: &VersionId) -> Option<&Version> {
        self.versions.get(id)
    }

    /// Surviving versions of a file, oldest first
    pub fn file_versions(&self, file_id: &FileId) -> Vec<&Version> {
        self.file_versions
            .get(file_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.versions.get(id))
            .collect()
    }

    /// Branches of a file, ordered by name
    pub fn branches(&self, file_id: &FileId) -> Vec<&Branch> {
        let mut branches: Vec<&Branch> = self
            .branches
            .iter()
            .filter(|((file, _), _)| file == file_id)
            .map(|(_, branch)| branch)
            .collect();
        branches.sort_by_key(|branch| branch.name().clone());
        branches
    }

    pub fn branch(&self, file_id: &FileId, name: &str) -> Option<&Branch> {
        let name = BranchName::try_parse(name.to_string()).ok()?;
        self.branches.get(&(file_id.clone(), name))
    }

    /// The version under the file's cursor
    pub fn head_version(&self, file_id: &FileId) -> Option<&Version> {
        let cursor = self.files.get(file_id)?;
        self.versions.get(&cursor.current)
    }

    pub fn current_content(&self, file_id: &FileId) -> Option<&str> {
        self.head_version(file_id).map(Version::content)
    }

    /// Append log of versions landed on the branch, base first
    pub fn history(&self, file_id: &FileId, name: &str) -> Option<&[VersionId]> {
        self.branch(file_id, name).map(Branch::history)
    }

    /// Every tag, ordered by name
    pub fn tags(&self) -> Vec<&Tag> {
        let mut tags: Vec<&Tag> = self.tags.values().collect();
        tags.sort_by_key(|tag| tag.name().clone());
        tags
    }

    fn next_version_id(
        &mut self,
        file_id: &FileId,
        parents: &[VersionId],
        timestamp: DateTime<Utc>,
        content: &str,
    ) -> VersionId {
        let id = VersionId::compute(file_id, parents, timestamp, self.sequence, content);
        self.sequence += 1;
        id
    }

    fn record_version(
        &mut self,
        file_id: &FileId,
        parent_id: VersionId,
        branch_name: BranchName,
        content: String,
        metadata: Metadata,
    ) -> Result<Version, GraphError> {
        let parent = self
            .versions
            .get(&parent_id)
            .ok_or_else(|| GraphError::VersionNotFound(parent_id.clone()))?;
        let patch = patch_between(parent.content(), &content);
        if !self
            .branches
            .contains_key(&(file_id.clone(), branch_name.clone()))
        {
            return Err(GraphError::BranchNotFound(branch_name));
        }

        let now = self.clock.now();
        let id = self.next_version_id(file_id, std::slice::from_ref(&parent_id), now, &content);
        let mut version = Version::new(
            id.clone(),
            file_id.clone(),
            content,
            now,
            vec![parent_id.clone()],
            metadata,
        );
        version.add_patch(parent_id, patch);

        self.versions.insert(id.clone(), version.clone());
        self.file_versions
            .entry(file_id.clone())
            .or_default()
            .push(id.clone());
        if let Some(branch) = self.branches.get_mut(&(file_id.clone(), branch_name)) {
            branch.advance(id.clone());
        }
        if let Some(cursor) = self.files.get_mut(file_id) {
            cursor.current = id;
        }
        self.evict_over_ceiling(file_id);
        Ok(version)
    }

    fn evict_over_ceiling(&mut self, file_id: &FileId) {
        let Some(ids) = self.file_versions.get(file_id) else {
            return;
        };
        if ids.len() <= self.options.max_versions_per_file {
            return;
        }

        let pinned: HashSet<&VersionId> = self
            .branches
            .values()
            .map(Branch::head)
            .chain(self.files.values().map(|cursor| &cursor.current))
            .collect();

        let mut excess = ids.len() - self.options.max_versions_per_file;
        let mut evicted = Vec::new();
        for id in ids {
            if excess == 0 {
                break;
            }
            if pinned.contains(id) {
                continue;
            }
            evicted.push(id.clone());
            excess -= 1;
        }

        for id in &evicted {
            self.versions.remove(id);
            debug!(version = %id.short(), file = %file_id, "evicted version over ceiling");
        }
        if !evicted.is_empty()
            && let Some(ids) = self.file_versions.get_mut(file_id)
        {
            ids.retain(|id| !evicted.contains(id));
        }
    }
}

fn patch_between(original: &str, modified: &str) -> Patch {
    let diff = compute(original, modified);
    Patch::new(compress(&diff), stats(&diff))
}
