//! Workbench facade
//!
//! Caller-owned composition root over the overlay store, the version graph,
//! the persistence bridge and the semantic analyzer:
//! - `preview_edit` records an overlay and debounces an auto-save
//! - `finalize` promotes the merged preview into a durable version
//! - `export_diff` / `import_diff` move previews through the wire format
//! - `subscribe` streams [`CoreEvent`]s over an unbounded channel
//!
//! The bridge and the analyzer are best-effort collaborators: their failures
//! are logged and reported as events, never propagated into the in-memory
//! state.

use crate::areas::bridge::{PersistenceBridge, RetryPolicy, SaveOverlayRequest};
use crate::areas::overlay_store::{OverlayStore, OverlayStoreOptions};
use crate::areas::semantic::SemanticAnalyzer;
use crate::areas::version_graph::{GraphOptions, MergeStrategy, VersionGraph};
use crate::artifacts::core::scheduler::DebounceScheduler;
use crate::artifacts::overlay::{ContentStrategy, CreateOverlay, Overlay, OverlayId};
use crate::artifacts::unified::UnifiedOptions;
use crate::artifacts::unified::codec::{apply_hunks, create_unified_diff, parse_unified_diff};
use crate::artifacts::version::{Branch, BranchName, FileId, Metadata, Tag, TagName, Version, VersionId};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::warn;

/// Default quiet window before an auto-save fires
const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_secs(2);

/// Notification stream of everything the core does
#[derive(Debug, Clone)]
pub enum CoreEvent {
    OverlayCreated {
        file_id: FileId,
        overlay_id: OverlayId,
    },
    OverlayUpdated {
        file_id: FileId,
        overlay_id: OverlayId,
        version: u64,
    },
    OverlayRemoved {
        file_id: FileId,
        overlay_id: OverlayId,
    },
    OverlayExpired {
        file_id: FileId,
        overlay_id: OverlayId,
    },
    VersionCreated {
        file_id: FileId,
        version_id: VersionId,
    },
    BranchCreated {
        file_id: FileId,
        name: BranchName,
    },
    BranchSwitched {
        file_id: FileId,
        name: BranchName,
    },
    BranchMerged {
        file_id: FileId,
        source: BranchName,
        target: BranchName,
        version_id: VersionId,
    },
    TagCreated {
        name: TagName,
        version_id: VersionId,
    },
    AutoSaved {
        file_id: FileId,
        overlay_id: OverlayId,
    },
    AutoSaveFailed {
        file_id: FileId,
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct WorkbenchOptions {
    overlay: OverlayStoreOptions,
    graph: GraphOptions,
    unified: UnifiedOptions,
    preview_strategy: ContentStrategy,
    debounce_delay: Duration,
    retry: RetryPolicy,
}

impl Default for WorkbenchOptions {
    fn default() -> Self {
        Self {
            overlay: OverlayStoreOptions::default(),
            graph: GraphOptions::default(),
            unified: UnifiedOptions::default(),
            preview_strategy: ContentStrategy::default(),
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

impl WorkbenchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_overlay(&mut self, options: OverlayStoreOptions) -> &mut Self {
        self.overlay = options;
        self
    }

    pub fn set_graph(&mut self, options: GraphOptions) -> &mut Self {
        self.graph = options;
        self
    }

    pub fn set_unified(&mut self, options: UnifiedOptions) -> &mut Self {
        self.unified = options;
        self
    }

    pub fn set_preview_strategy(&mut self, strategy: ContentStrategy) -> &mut Self {
        self.preview_strategy = strategy;
        self
    }

    pub fn set_debounce_delay(&mut self, delay: Duration) -> &mut Self {
        self.debounce_delay = delay;
        self
    }

    pub fn set_retry(&mut self, policy: RetryPolicy) -> &mut Self {
        self.retry = policy;
        self
    }

    pub fn overlay(&self) -> &OverlayStoreOptions {
        &self.overlay
    }

    pub fn graph(&self) -> &GraphOptions {
        &self.graph
    }

    pub fn unified(&self) -> &UnifiedOptions {
        &self.unified
    }

    pub fn preview_strategy(&self) -> ContentStrategy {
        self.preview_strategy
    }

    pub fn debounce_delay(&self) -> Duration {
        self.debounce_delay
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

/// Knobs for one preview edit
#[derive(Debug, Clone, Default)]
pub struct PreviewOptions {
    overlay: CreateOverlay,
    temporary: bool,
}

impl PreviewOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ttl(&mut self, ttl: chrono::Duration) -> &mut Self {
        self.overlay.set_ttl(ttl);
        self
    }

    pub fn set_priority(&mut self, priority: i64) -> &mut Self {
        self.overlay.set_priority(priority);
        self
    }

    pub fn set_metadata(&mut self, metadata: Metadata) -> &mut Self {
        self.overlay.set_metadata(metadata);
        self
    }

    /// Marks the backend copy as temporary (session-scoped)
    pub fn set_temporary(&mut self, temporary: bool) -> &mut Self {
        self.temporary = temporary;
        self
    }
}

#[derive(Clone, Default)]
struct EventHub {
    senders: Arc<StdMutex<Vec<UnboundedSender<CoreEvent>>>>,
}

impl EventHub {
    fn subscribe(&self) -> UnboundedReceiver<CoreEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    fn emit(&self, event: CoreEvent) {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|sender| sender.send(event.clone()).is_ok());
    }
}

pub struct Workbench {
    overlays: Arc<Mutex<OverlayStore>>,
    graph: Arc<Mutex<VersionGraph>>,
    bridge: Arc<dyn PersistenceBridge>,
    analyzer: Arc<dyn SemanticAnalyzer>,
    scheduler: Mutex<DebounceScheduler>,
    sweeper: StdMutex<Option<JoinHandle<()>>>,
    events: EventHub,
    options: WorkbenchOptions,
}

impl Workbench {
    pub fn new(options: WorkbenchOptions) -> Self {
        Self::with_collaborators(
            options,
            Arc::new(crate::areas::bridge::NoopBridge),
            Arc::new(crate::areas::semantic::NoopAnalyzer),
        )
    }

    pub fn with_collaborators(
        options: WorkbenchOptions,
        bridge: Arc<dyn PersistenceBridge>,
        analyzer: Arc<dyn SemanticAnalyzer>,
    ) -> Self {
        Self {
            overlays: Arc::new(Mutex::new(OverlayStore::new(options.overlay))),
            graph: Arc::new(Mutex::new(VersionGraph::new(options.graph.clone()))),
            bridge,
            analyzer,
            scheduler: Mutex::new(DebounceScheduler::default()),
            sweeper: StdMutex::new(None),
            events: EventHub::default(),
            options,
        }
    }

    pub fn options(&self) -> &WorkbenchOptions {
        &self.options
    }

    pub fn overlay_store(&self) -> Arc<Mutex<OverlayStore>> {
        self.overlays.clone()
    }

    pub fn version_graph(&self) -> Arc<Mutex<VersionGraph>> {
        self.graph.clone()
    }

    /// Opens a notification stream; dropped receivers are pruned lazily
    pub fn subscribe(&self) -> UnboundedReceiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Spawns the periodic expiry sweeper
    ///
    /// Each sweep reports purged overlays as [`CoreEvent::OverlayExpired`].
    /// Calling again replaces the previous sweeper.
    pub fn start_maintenance(&self) {
        let store = Arc::clone(&self.overlays);
        let events = self.events.clone();
        let interval = self.options.overlay.sweep_interval();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let purged = { store.lock().await.sweep_expired_detailed() };
                for overlay in purged {
                    events.emit(CoreEvent::OverlayExpired {
                        file_id: overlay.file_id().clone(),
                        overlay_id: overlay.id(),
                    });
                }
            }
        });

        let mut slot = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Cancels pending timers and the sweeper
    pub async fn shutdown(&self) {
        self.scheduler.lock().await.shutdown();
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Record an in-memory preview of the file and debounce an auto-save
    ///
    /// The file's most recent active overlay is updated in place; the first
    /// preview creates one. A tracked file's baseline is seeded from the
    /// version graph on first touch.
    pub async fn preview_edit(
        &self,
        file_id: &FileId,
        content: &str,
        options: PreviewOptions,
    ) -> anyhow::Result<Overlay> {
        self.seed_baseline(file_id).await;

        let PreviewOptions {
            overlay: mut request,
            temporary,
        } = options;

        let (overlay, baseline, created) = {
            let mut store = self.overlays.lock().await;
            let existing = store.get_file_overlays(file_id).first().map(|o| o.id());
            let (overlay, created) = match existing {
                Some(id) => {
                    let updated =
                        store.update_overlay(id, content.to_string(), request.take_metadata())?;
                    (updated, false)
                }
                None => (
                    store.create_overlay(file_id, content.to_string(), request),
                    true,
                ),
            };
            let baseline = store.baseline(file_id).unwrap_or_default().to_string();
            (overlay, baseline, created)
        };

        if created {
            self.events.emit(CoreEvent::OverlayCreated {
                file_id: file_id.clone(),
                overlay_id: overlay.id(),
            });
        } else {
            self.events.emit(CoreEvent::OverlayUpdated {
                file_id: file_id.clone(),
                overlay_id: overlay.id(),
                version: overlay.version(),
            });
        }

        let save = save_with_retry(
            Arc::clone(&self.bridge),
            *self.options.retry(),
            self.events.clone(),
            file_id.clone(),
            overlay.id(),
            SaveOverlayRequest::new(
                file_id.to_string(),
                baseline,
                content.to_string(),
                overlay.metadata().clone(),
                temporary,
            ),
        );
        self.scheduler
            .lock()
            .await
            .debounce(file_id.as_ref(), self.options.debounce_delay, save);

        Ok(overlay)
    }

    /// Promote the file's merged preview into a durable version
    ///
    /// First touch creates the file in the graph, later calls append to the
    /// active branch. The semantic summary and the bridge notification are
    /// best-effort, with the notification retried under the workbench retry
    /// policy; the file's overlays are cleared afterwards.
    pub async fn finalize(
        &self,
        file_id: &FileId,
        strategy: ContentStrategy,
        mut metadata: Metadata,
    ) -> anyhow::Result<Version> {
        self.scheduler.lock().await.cancel(file_id.as_ref());

        let (content, overlay_ids) = {
            let mut store = self.overlays.lock().await;
            let content = store.get_merged_content(file_id, strategy)?;
            let ids: Vec<OverlayId> = store
                .get_file_overlays(file_id)
                .iter()
                .map(|overlay| overlay.id())
                .collect();
            (content, ids)
        };

        let previous = {
            let graph = self.graph.lock().await;
            graph.current_content(file_id).map(str::to_string)
        };
        let language = metadata
            .get("language")
            .and_then(|value| value.as_str())
            .unwrap_or("text")
            .to_string();
        let old = previous.clone().unwrap_or_default();
        if let Ok(summary) = self.analyzer.change_summary(&old, &content, &language).await
            && let Ok(value) = serde_json::to_value(summary)
        {
            metadata.insert("semantic".to_string(), value);
        }

        let version = {
            let mut graph = self.graph.lock().await;
            if previous.is_some() {
                graph.create_version(file_id, content, metadata)?
            } else {
                graph.create_file(file_id, content, metadata)?
            }
        };

        for overlay_id in &overlay_ids {
            let id = overlay_id.to_string();
            let outcome = self
                .options
                .retry()
                .run(|| {
                    let bridge = Arc::clone(&self.bridge);
                    let id = id.clone();
                    async move { bridge.finalize_overlay(&id).await }
                })
                .await;
            if let Err(error) = outcome {
                warn!(overlay = %overlay_id, error = %error, "bridge finalize attempts exhausted");
            }
        }

        {
            let mut store = self.overlays.lock().await;
            for overlay_id in overlay_ids {
                if store.remove_overlay(overlay_id).is_some() {
                    self.events.emit(CoreEvent::OverlayRemoved {
                        file_id: file_id.clone(),
                        overlay_id,
                    });
                }
            }
        }

        self.events.emit(CoreEvent::VersionCreated {
            file_id: file_id.clone(),
            version_id: version.id().clone(),
        });
        Ok(version)
    }

    /// Emit the baseline→preview diff in the unified wire format
    ///
    /// `None` when the preview does not differ from the baseline.
    pub async fn export_diff(&self, file_id: &FileId) -> anyhow::Result<Option<String>> {
        let mut store = self.overlays.lock().await;
        let preview = store.get_merged_content(file_id, self.options.preview_strategy)?;
        let baseline = store.baseline(file_id).unwrap_or_default().to_string();

        Ok(create_unified_diff(
            &baseline,
            &preview,
            file_id.as_ref(),
            &self.options.unified,
        ))
    }

    /// Apply a wire-format diff onto the baseline and record the result as
    /// a preview overlay
    ///
    /// Parsing is tolerant of decoration, but application is strict: any
    /// mismatching hunk rejects the whole import.
    pub async fn import_diff(&self, file_id: &FileId, text: &str) -> anyhow::Result<Overlay> {
        let hunks = parse_unified_diff(text);
        if hunks.is_empty() {
            anyhow::bail!("no hunks found in diff for {file_id}");
        }

        let baseline = {
            let store = self.overlays.lock().await;
            store.baseline(file_id).map(str::to_string)
        };
        let baseline = match baseline {
            Some(content) => content,
            None => {
                let graph = self.graph.lock().await;
                graph
                    .current_content(file_id)
                    .map(str::to_string)
                    .ok_or_else(|| anyhow::anyhow!("file {file_id} has no baseline to patch"))?
            }
        };

        let patched = apply_hunks(&baseline, &hunks)?;
        let overlay = {
            let mut store = self.overlays.lock().await;
            store.set_baseline(file_id, baseline);
            store.create_overlay(file_id, patched, CreateOverlay::new())
        };

        self.events.emit(CoreEvent::OverlayCreated {
            file_id: file_id.clone(),
            overlay_id: overlay.id(),
        });
        Ok(overlay)
    }

    /// Record a forward version carrying an older version's content
    pub async fn revert(
        &self,
        file_id: &FileId,
        target_id: &VersionId,
        metadata: Metadata,
    ) -> anyhow::Result<Version> {
        let version = {
            let mut graph = self.graph.lock().await;
            graph.revert_to_version(file_id, target_id, metadata)?
        };
        self.events.emit(CoreEvent::VersionCreated {
            file_id: file_id.clone(),
            version_id: version.id().clone(),
        });
        Ok(version)
    }

    pub async fn create_branch(
        &self,
        name: &str,
        base_version_id: &VersionId,
        metadata: Metadata,
    ) -> anyhow::Result<Branch> {
        let branch = {
            let mut graph = self.graph.lock().await;
            graph.create_branch(name, base_version_id, metadata)?
        };
        self.events.emit(CoreEvent::BranchCreated {
            file_id: branch.file_id().clone(),
            name: branch.name().clone(),
        });
        Ok(branch)
    }

    pub async fn switch_branch(&self, file_id: &FileId, name: &str) -> anyhow::Result<Branch> {
        let branch = {
            let mut graph = self.graph.lock().await;
            graph.switch_to_branch(file_id, name)?
        };
        self.events.emit(CoreEvent::BranchSwitched {
            file_id: file_id.clone(),
            name: branch.name().clone(),
        });
        Ok(branch)
    }

    pub async fn merge_branch(
        &self,
        file_id: &FileId,
        source: &str,
        target: &str,
        strategy: MergeStrategy,
    ) -> anyhow::Result<Version> {
        let version = {
            let mut graph = self.graph.lock().await;
            graph.merge_branch(file_id, source, target, strategy)?
        };
        let source = BranchName::try_parse(source.to_string())?;
        let target = BranchName::try_parse(target.to_string())?;
        self.events.emit(CoreEvent::BranchMerged {
            file_id: file_id.clone(),
            source,
            target,
            version_id: version.id().clone(),
        });
        Ok(version)
    }

    pub async fn create_tag(
        &self,
        name: &str,
        version_id: &VersionId,
        metadata: Metadata,
    ) -> anyhow::Result<Tag> {
        let tag = {
            let mut graph = self.graph.lock().await;
            graph.create_tag(name, version_id, metadata)?
        };
        self.events.emit(CoreEvent::TagCreated {
            name: tag.name().clone(),
            version_id: tag.version_id().clone(),
        });
        Ok(tag)
    }

    /// Seed the overlay baseline from the graph for tracked files
    async fn seed_baseline(&self, file_id: &FileId) {
        let seeded = {
            let store = self.overlays.lock().await;
            store.baseline(file_id).is_some()
        };
        if seeded {
            return;
        }

        let current = {
            let graph = self.graph.lock().await;
            graph.current_content(file_id).map(str::to_string)
        };
        if let Some(content) = current {
            self.overlays.lock().await.set_baseline(file_id, content);
        }
    }
}

impl Drop for Workbench {
    fn drop(&mut self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Push one save to the backend under the retry policy
///
/// Emits AutoSaved on success, AutoSaveFailed once the attempts run out;
/// in-memory state stays authoritative either way.
async fn save_with_retry(
    bridge: Arc<dyn PersistenceBridge>,
    policy: RetryPolicy,
    events: EventHub,
    file_id: FileId,
    overlay_id: OverlayId,
    request: SaveOverlayRequest,
) {
    let outcome = policy
        .run(|| {
            let bridge = Arc::clone(&bridge);
            let request = request.clone();
            async move { bridge.save_overlay(request).await }
        })
        .await;

    match outcome {
        Ok(_) => {
            events.emit(CoreEvent::AutoSaved {
                file_id,
                overlay_id,
            });
        }
        Err(error) => {
            warn!(file = %file_id, error = %error, "auto-save attempts exhausted");
            events.emit(CoreEvent::AutoSaveFailed {
                file_id,
                error: error.to_string(),
            });
        }
    }
}
