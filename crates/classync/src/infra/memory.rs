//! In-memory document model and live views.
//!
//! [`MemoryDocument`] stands in for the document model and the code mutation service: it maps
//! selectors to template nodes, stores the class tokens written for each node, and applies code
//! diffs to itself. Documents round-trip through JSON so the CLI can edit files on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ClassSource, CodeService, LiveView, LiveViewRegistry, NodeResolver};
use crate::domain::model::{CodeDiff, MutationRequest, Selector, TemplateNode};

/// On-disk representation of a [`MemoryDocument`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeRecord>,
    #[serde(default)]
    pub elements: BTreeMap<String, ElementRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(flatten)]
    pub node: TemplateNode,
    #[serde(default)]
    pub classes: Vec<String>,
}

/// Node ids backing a rendered element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

/// What [`MemoryDocument::apply_code_diffs`] does with the next diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyBehavior {
    #[default]
    Accept,
    /// Report `false` without writing.
    Reject,
    /// Return an error without writing.
    Fail,
}

#[derive(Debug, Default)]
struct Counters {
    resolve: AtomicUsize,
    fetch: AtomicUsize,
    diff: AtomicUsize,
    apply: AtomicUsize,
}

/// Snapshot of how often each collaborator operation was invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub resolve: usize,
    pub fetch: usize,
    pub diff: usize,
    pub apply: usize,
}

#[derive(Debug, Default)]
pub struct MemoryDocument {
    file: RwLock<DocumentFile>,
    counters: Counters,
    fail_fetch: AtomicBool,
    apply_behavior: Mutex<ApplyBehavior>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(file: DocumentFile) -> Self {
        Self {
            file: RwLock::new(file),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: DocumentFile = serde_json::from_str(json).context("invalid document JSON")?;
        Ok(Self::from_file(file))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read document at {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("invalid document in {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&*self.file.read()).context("failed to serialize document")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        fs::write(path, data)
            .with_context(|| format!("failed to write document to {}", path.display()))
    }

    /// Register a node under `id` with its current class tokens.
    pub fn insert_node(&self, id: impl Into<String>, node: TemplateNode, classes: &[&str]) {
        let record = NodeRecord {
            node,
            classes: classes.iter().map(|class| class.to_string()).collect(),
        };
        self.file.write().nodes.insert(id.into(), record);
    }

    /// Map `selector` to the ids of its instance and root nodes.
    pub fn insert_element(
        &self,
        selector: impl Into<String>,
        instance: Option<&str>,
        root: Option<&str>,
    ) {
        let record = ElementRecord {
            instance: instance.map(str::to_owned),
            root: root.map(str::to_owned),
        };
        self.file.write().elements.insert(selector.into(), record);
    }

    pub fn remove_element(&self, selector: &str) {
        self.file.write().elements.remove(selector);
    }

    /// Overwrite the classes of a node, as another actor editing the source would.
    pub fn set_classes(&self, id: &str, classes: &[&str]) -> bool {
        match self.file.write().nodes.get_mut(id) {
            Some(record) => {
                record.classes = classes.iter().map(|class| class.to_string()).collect();
                true
            }
            None => false,
        }
    }

    pub fn classes(&self, id: &str) -> Option<Vec<String>> {
        self.file
            .read()
            .nodes
            .get(id)
            .map(|record| record.classes.clone())
    }

    pub fn node(&self, id: &str) -> Option<TemplateNode> {
        self.file.read().nodes.get(id).map(|record| record.node.clone())
    }

    pub fn set_fetch_failure(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_apply_behavior(&self, behavior: ApplyBehavior) {
        *self.apply_behavior.lock() = behavior;
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            resolve: self.counters.resolve.load(Ordering::SeqCst),
            fetch: self.counters.fetch.load(Ordering::SeqCst),
            diff: self.counters.diff.load(Ordering::SeqCst),
            apply: self.counters.apply.load(Ordering::SeqCst),
        }
    }

    fn resolve(
        &self,
        selector: &Selector,
        pick: fn(&ElementRecord) -> Option<&String>,
    ) -> Option<TemplateNode> {
        self.counters.resolve.fetch_add(1, Ordering::SeqCst);
        let file = self.file.read();
        let id = file.elements.get(selector.as_str()).and_then(pick)?;
        file.nodes.get(id).map(|record| record.node.clone())
    }

    fn with_record<T>(
        &self,
        node: &TemplateNode,
        f: impl FnOnce(&mut NodeRecord) -> T,
    ) -> Option<T> {
        let mut file = self.file.write();
        file.nodes
            .values_mut()
            .find(|record| &record.node == node)
            .map(f)
    }
}

impl NodeResolver for MemoryDocument {
    fn resolve_instance(&self, selector: &Selector) -> Option<TemplateNode> {
        self.resolve(selector, |element| element.instance.as_ref())
    }

    fn resolve_root(&self, selector: &Selector) -> Option<TemplateNode> {
        self.resolve(selector, |element| element.root.as_ref())
    }
}

#[async_trait]
impl ClassSource for MemoryDocument {
    async fn fetch_class_tokens(&self, node: &TemplateNode) -> Result<Vec<String>> {
        self.counters.fetch.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(anyhow!("class lookup unavailable"));
        }
        self.with_record(node, |record| record.classes.clone())
            .ok_or_else(|| anyhow!("unknown template node {node}"))
    }
}

#[async_trait]
impl CodeService for MemoryDocument {
    async fn build_code_diffs(&self, requests: &[MutationRequest]) -> Result<Vec<CodeDiff>> {
        self.counters.diff.fetch_add(1, Ordering::SeqCst);
        requests
            .iter()
            .map(|request| {
                self.with_record(&request.template_node, |record| CodeDiff {
                    template_node: request.template_node.clone(),
                    original: record.classes.join(" "),
                    generated: rewrite_classes(
                        &record.classes,
                        &request.attributes.class_name,
                        request.override_classes,
                    ),
                })
                .ok_or_else(|| anyhow!("unknown template node {}", request.template_node))
            })
            .collect()
    }

    async fn apply_code_diffs(&self, diffs: &[CodeDiff]) -> Result<bool> {
        self.counters.apply.fetch_add(1, Ordering::SeqCst);
        match *self.apply_behavior.lock() {
            ApplyBehavior::Accept => {}
            ApplyBehavior::Reject => return Ok(false),
            ApplyBehavior::Fail => return Err(anyhow!("write to source failed")),
        }

        let mut file = self.file.write();
        let known = |node: &TemplateNode| file.nodes.values().any(|record| &record.node == node);
        if let Some(missing) = diffs.iter().find(|diff| !known(&diff.template_node)) {
            tracing::warn!(node = %missing.template_node, "diff targets an unknown node");
            return Ok(false);
        }

        for diff in diffs {
            if let Some(record) = file
                .nodes
                .values_mut()
                .find(|record| record.node == diff.template_node)
            {
                record.classes = diff.generated.split_whitespace().map(str::to_owned).collect();
            }
        }
        Ok(true)
    }
}

/// New class attribute for a node: a wholesale replacement when `override_classes` is set,
/// otherwise the existing tokens followed by any new ones.
fn rewrite_classes(existing: &[String], class_name: &str, override_classes: bool) -> String {
    if override_classes {
        return class_name.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    let mut merged: Vec<&str> = existing.iter().map(String::as_str).collect();
    for token in class_name.split_whitespace() {
        if !merged.contains(&token) {
            merged.push(token);
        }
    }
    merged.join(" ")
}

/// A live view that counts refresh signals.
#[derive(Debug)]
pub struct CountingLiveView {
    id: String,
    refreshes: AtomicUsize,
    fail: AtomicBool,
}

impl CountingLiveView {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            refreshes: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LiveView for CountingLiveView {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process_dom(&self) -> Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(view = %self.id, "re-processing document");
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("view {} is gone", self.id));
        }
        Ok(())
    }
}

/// The set of open views, shared with whoever opens and closes them.
#[derive(Debug, Default)]
pub struct MemoryLiveViews {
    views: RwLock<Vec<Arc<CountingLiveView>>>,
}

impl MemoryLiveViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, id: impl Into<String>) -> Arc<CountingLiveView> {
        let view = Arc::new(CountingLiveView::new(id));
        self.views.write().push(view.clone());
        view
    }

    pub fn close(&self, id: &str) {
        self.views.write().retain(|view| view.id != id);
    }

    /// Refresh signals received across every open view.
    pub fn total_refreshes(&self) -> usize {
        self.views.read().iter().map(|view| view.refreshes()).sum()
    }
}

impl LiveViewRegistry for MemoryLiveViews {
    fn views(&self) -> Vec<Arc<dyn LiveView>> {
        self.views
            .read()
            .iter()
            .map(|view| view.clone() as Arc<dyn LiveView>)
            .collect()
    }
}
