//! Collaborator interfaces the synchronization core depends on.
//!
//! The document model, the code mutation service, the open live views, and telemetry are owned
//! elsewhere; the core only reaches them through these traits. Implementations must be cheap to
//! share across tasks.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::app::notify::Notifier;
use crate::domain::model::{CodeDiff, MutationRequest, Selector, TemplateNode};

/// Synchronous lookups over already-materialized document structure.
pub trait NodeResolver: Send + Sync {
    /// Template node that produced the element behind `selector`.
    fn resolve_instance(&self, selector: &Selector) -> Option<TemplateNode>;

    /// Nearest enclosing component root of the element behind `selector`.
    fn resolve_root(&self, selector: &Selector) -> Option<TemplateNode>;
}

/// Source of the class tokens currently written for a node.
#[async_trait]
pub trait ClassSource: Send + Sync {
    async fn fetch_class_tokens(&self, node: &TemplateNode) -> Result<Vec<String>>;
}

/// Turns semantic edits into code changes and persists them.
#[async_trait]
pub trait CodeService: Send + Sync {
    async fn build_code_diffs(&self, requests: &[MutationRequest]) -> Result<Vec<CodeDiff>>;

    /// Returns `false` when the diffs were not written.
    async fn apply_code_diffs(&self, diffs: &[CodeDiff]) -> Result<bool>;
}

/// An open rendering surface.
#[async_trait]
pub trait LiveView: Send + Sync {
    fn id(&self) -> &str;

    /// Re-process the rendered document after an underlying mutation.
    async fn process_dom(&self) -> Result<()>;
}

/// The set of currently open live views.
pub trait LiveViewRegistry: Send + Sync {
    fn views(&self) -> Vec<Arc<dyn LiveView>>;
}

/// Fire-and-forget usage telemetry.
pub trait UsageReporter: Send + Sync {
    fn report_usage_event(&self, name: &str);
}

/// Every collaborator a [`ClassEditor`](crate::app::session::ClassEditor) needs.
#[derive(Clone)]
pub struct Services {
    pub resolver: Arc<dyn NodeResolver>,
    pub classes: Arc<dyn ClassSource>,
    pub code: Arc<dyn CodeService>,
    pub views: Arc<dyn LiveViewRegistry>,
    pub usage: Arc<dyn UsageReporter>,
    pub notifier: Arc<dyn Notifier>,
}
