//! The class editing session: selection tracking, buffer management, commit, and
//! post-commit reconciliation wired together.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::app::buffer::{BufferPhase, BufferView, EditBuffer, PendingCommit};
use crate::app::commit::{CommitOutcome, CommitPipeline, RefreshPolicy, SelectorCapture};
use crate::app::notify::{Notice, Notifier};
use crate::app::ports::{NodeResolver, Services};
use crate::app::selection::SelectionTracker;
use crate::app::snapshot::ClassSnapshotLoader;
use crate::domain::errors::{BufferError, CommitError, SyncError};
use crate::domain::model::{BufferTarget, MutationRequest, Selector, TemplateNode};

/// Runtime knobs for a [`ClassEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// How long to wait after an applied commit before re-reading the document.
    pub settle_delay: Duration,
    pub load_timeout: Duration,
    pub selector_capture: SelectorCapture,
    pub refresh: RefreshPolicy,
    /// Keys that end editing (and therefore commit) without touching the text.
    pub commit_keys: Vec<String>,
    pub usage_event: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            load_timeout: Duration::from_millis(5000),
            selector_capture: SelectorCapture::AtCommit,
            refresh: RefreshPolicy::Detached,
            commit_keys: vec!["enter".into(), "tab".into(), "escape".into()],
            usage_event: Some("tailwind action".into()),
        }
    }
}

/// Both buffers as they should be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    pub instance: BufferView,
    pub root: BufferView,
}

struct Buffers {
    instance: EditBuffer,
    root: EditBuffer,
}

impl Buffers {
    fn get(&self, target: BufferTarget) -> &EditBuffer {
        match target {
            BufferTarget::Instance => &self.instance,
            BufferTarget::Root => &self.root,
        }
    }

    fn get_mut(&mut self, target: BufferTarget) -> &mut EditBuffer {
        match target {
            BufferTarget::Instance => &mut self.instance,
            BufferTarget::Root => &mut self.root,
        }
    }
}

struct Inner {
    resolver: Arc<dyn NodeResolver>,
    loader: ClassSnapshotLoader,
    pipeline: CommitPipeline,
    notifier: Arc<dyn Notifier>,
    selection: SelectionTracker,
    config: EditorConfig,
    buffers: Mutex<Buffers>,
    reconciliations: Mutex<Vec<JoinHandle<()>>>,
}

/// Keeps the instance and root class buffers in sync with the document model.
///
/// Cheap to clone; clones share the same buffers. Buffer state is only touched between
/// suspension points, so each transition is atomic with respect to other operations on the
/// same editor. The two buffers never wait on each other.
#[derive(Clone)]
pub struct ClassEditor {
    inner: Arc<Inner>,
}

impl ClassEditor {
    pub fn new(services: Services, selection: SelectionTracker, config: EditorConfig) -> Self {
        let Services {
            resolver,
            classes,
            code,
            views,
            usage,
            notifier,
        } = services;

        let pipeline = CommitPipeline::new(code, views, usage, notifier.clone())
            .with_refresh_policy(config.refresh)
            .with_usage_event(config.usage_event.clone());

        Self {
            inner: Arc::new(Inner {
                resolver,
                loader: ClassSnapshotLoader::new(classes, config.load_timeout),
                pipeline,
                notifier,
                selection,
                config,
                buffers: Mutex::new(Buffers {
                    instance: EditBuffer::new(BufferTarget::Instance),
                    root: EditBuffer::new(BufferTarget::Root),
                }),
                reconciliations: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.inner.config
    }

    pub fn view(&self, target: BufferTarget) -> BufferView {
        self.inner.buffers.lock().get(target).view()
    }

    pub fn panel(&self) -> PanelState {
        let buffers = self.inner.buffers.lock();
        PanelState {
            instance: buffers.instance.view(),
            root: buffers.root.view(),
        }
    }

    /// Follow the selection until its feed is dropped, re-syncing on every non-empty change.
    pub async fn run(&self) {
        let mut tracker = self.inner.selection.clone();
        if let Some(selector) = tracker.front() {
            self.sync_selector(&selector).await;
        }
        while let Some(selector) = tracker.next_selection().await {
            self.sync_selector(&selector).await;
        }
        debug!("selection feed closed");
    }

    /// Resolve and load both buffers for the current front selection. Returns `false` and leaves
    /// the buffers untouched when nothing is selected.
    pub async fn sync_selection(&self) -> bool {
        match self.inner.selection.front() {
            Some(selector) => {
                self.sync_selector(&selector).await;
                true
            }
            None => false,
        }
    }

    #[instrument(skip_all, fields(selector = %selector))]
    async fn sync_selector(&self, selector: &Selector) {
        let instance = self.inner.resolver.resolve_instance(selector);
        let root = self.inner.resolver.resolve_root(selector);
        if instance.is_none() {
            debug!("selection has no instance node");
        }
        if root.is_none() {
            debug!("selection has no root node");
        }

        let (instance_generation, root_generation) = {
            let mut buffers = self.inner.buffers.lock();
            (
                buffers.instance.retarget(instance.clone()),
                buffers.root.retarget(root.clone()),
            )
        };

        tokio::join!(
            self.load_into(BufferTarget::Instance, instance_generation, instance),
            self.load_into(BufferTarget::Root, root_generation, root),
        );
    }

    async fn load_into(&self, target: BufferTarget, generation: u64, node: Option<TemplateNode>) {
        let Some(node) = node else {
            return;
        };

        match self.inner.loader.load(&node).await {
            Ok(snapshot) => {
                let applied = self
                    .inner
                    .buffers
                    .lock()
                    .get_mut(target)
                    .apply_snapshot(generation, snapshot);
                if !applied {
                    debug!(%target, %node, "discarded snapshot for a superseded selection");
                }
            }
            Err(error) => self
                .inner
                .notifier
                .notify(Notice::from_sync_error(Some(target), &error)),
        }
    }

    pub fn focus(&self, target: BufferTarget) -> Result<(), BufferError> {
        let front = self.inner.selection.front();
        self.inner.buffers.lock().get_mut(target).focus(front)
    }

    pub fn input(&self, target: BufferTarget, text: impl Into<String>) -> Result<(), BufferError> {
        self.inner.buffers.lock().get_mut(target).input(text)
    }

    pub fn is_commit_key(&self, key: &str) -> bool {
        self.inner
            .config
            .commit_keys
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(key))
    }

    /// Handle a key press while editing. Commit keys blur the buffer, which commits it; any
    /// other key returns `None` and is left to the text input.
    pub async fn key(
        &self,
        target: BufferTarget,
        key: &str,
    ) -> Option<Result<CommitOutcome, CommitError>> {
        if !self.is_commit_key(key) {
            return None;
        }
        Some(self.blur(target).await)
    }

    /// End editing on `target` and commit its text when a node is behind it.
    #[instrument(skip(self))]
    pub async fn blur(&self, target: BufferTarget) -> Result<CommitOutcome, CommitError> {
        let pending = {
            let mut buffers = self.inner.buffers.lock();
            let buffer = buffers.get_mut(target);
            let was_editing = buffer.phase() == BufferPhase::Editing;
            match buffer.blur() {
                Ok(Some(pending)) => pending,
                Ok(None) if was_editing => return Ok(CommitOutcome::NoTarget),
                Ok(None) => return Ok(CommitOutcome::NotEditing),
                Err(error) => {
                    drop(buffers);
                    return Err(self.report(target, error.into()));
                }
            }
        };

        let generation = pending.generation;
        let Some(selector) = self.commit_selector(&pending) else {
            self.settle(target, generation, None);
            return Err(self.report(target, CommitError::NoSelection));
        };

        let request =
            MutationRequest::override_classes(pending.node, selector, pending.class_name.clone());
        match self.inner.pipeline.commit(request).await {
            Ok(report) => {
                self.settle(target, generation, Some(&pending.class_name));
                self.schedule_reconciliation();
                Ok(CommitOutcome::Applied(report))
            }
            Err(error) => {
                self.settle(target, generation, None);
                Err(self.report(target, error))
            }
        }
    }

    fn commit_selector(&self, pending: &PendingCommit) -> Option<Selector> {
        match self.inner.config.selector_capture {
            SelectorCapture::AtCommit => self.inner.selection.front(),
            SelectorCapture::AtFocus => pending.focus_selector.clone(),
        }
    }

    fn settle(&self, target: BufferTarget, generation: u64, committed: Option<&str>) {
        self.inner
            .buffers
            .lock()
            .get_mut(target)
            .settle(generation, committed);
    }

    fn report(&self, target: BufferTarget, error: CommitError) -> CommitError {
        self.inner
            .notifier
            .notify(Notice::from_commit_error(target, &error));
        error
    }

    fn schedule_reconciliation(&self) {
        let editor = self.clone();
        let delay = self.inner.config.settle_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            editor.reconcile().await;
        });

        let mut pending = self.inner.reconciliations.lock();
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }

    async fn reconcile(&self) {
        match self.inner.selection.front() {
            Some(selector) => self.sync_selector(&selector).await,
            None => self.inner.notifier.notify(Notice::from_sync_error(
                None,
                &SyncError::StaleSelection,
            )),
        }
    }

    /// Wait until every scheduled reconciliation has finished.
    pub async fn wait_for_reconciliation(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.reconciliations.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(error) = handle.await {
                    warn!("reconciliation task failed: {error}");
                }
            }
        }
    }
}
