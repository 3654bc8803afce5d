//! Turning a committed class string into an applied code change.

use std::str::FromStr;
use std::sync::Arc;

use clap::ValueEnum;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app::notify::{Notice, NoticeKind, Notifier, Severity};
use crate::app::ports::{CodeService, LiveViewRegistry, UsageReporter};
use crate::domain::errors::{CommitError, SyncError};
use crate::domain::model::MutationRequest;

/// How the pipeline waits for live views after a successful apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// Spawn one refresh per view and move on without waiting.
    #[default]
    Detached,
    /// Wait for every view and report the ones that failed.
    AwaitAll,
}

/// Which selector a commit is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum SelectorCapture {
    /// Re-read the front selection when the buffer is blurred.
    #[default]
    AtCommit,
    /// Use the front selection captured when editing began.
    AtFocus,
}

impl SelectorCapture {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorCapture::AtCommit => "at-commit",
            SelectorCapture::AtFocus => "at-focus",
        }
    }
}

impl FromStr for SelectorCapture {
    type Err = PolicyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "at-commit" | "commit" | "blur" => Ok(SelectorCapture::AtCommit),
            "at-focus" | "focus" => Ok(SelectorCapture::AtFocus),
            other => Err(PolicyParseError::UnknownSelectorCapture(other.to_string())),
        }
    }
}

impl FromStr for RefreshPolicy {
    type Err = PolicyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "detached" => Ok(RefreshPolicy::Detached),
            "await-all" | "await" => Ok(RefreshPolicy::AwaitAll),
            other => Err(PolicyParseError::UnknownRefreshPolicy(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`SelectorCapture`] or [`RefreshPolicy`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PolicyParseError {
    #[error("unknown selector capture '{0}'")]
    UnknownSelectorCapture(String),
    #[error("unknown refresh policy '{0}'")]
    UnknownRefreshPolicy(String),
}

/// Summary of an applied commit.
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub request: MutationRequest,
    pub diffs: usize,
    pub views_signaled: usize,
}

/// Result of blurring a buffer.
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    Applied(CommitReport),
    /// The buffer had no node behind it; no service was called.
    NoTarget,
    /// The buffer was not being edited.
    NotEditing,
}

impl CommitOutcome {
    pub fn report(&self) -> Option<&CommitReport> {
        match self {
            CommitOutcome::Applied(report) => Some(report),
            _ => None,
        }
    }
}

pub struct CommitPipeline {
    code: Arc<dyn CodeService>,
    views: Arc<dyn LiveViewRegistry>,
    usage: Arc<dyn UsageReporter>,
    notifier: Arc<dyn Notifier>,
    refresh: RefreshPolicy,
    usage_event: Option<String>,
}

impl CommitPipeline {
    pub fn new(
        code: Arc<dyn CodeService>,
        views: Arc<dyn LiveViewRegistry>,
        usage: Arc<dyn UsageReporter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            code,
            views,
            usage,
            notifier,
            refresh: RefreshPolicy::default(),
            usage_event: None,
        }
    }

    pub fn with_refresh_policy(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    /// Event name reported after every applied commit. `None` disables reporting.
    pub fn with_usage_event(mut self, event: Option<String>) -> Self {
        self.usage_event = event;
        self
    }

    /// Build diffs for `request`, apply them, then refresh live views and report usage.
    ///
    /// Nothing past the apply step runs unless the service confirms the write.
    pub async fn commit(&self, request: MutationRequest) -> Result<CommitReport, CommitError> {
        let batch = [request];
        let diffs = self
            .code
            .build_code_diffs(&batch)
            .await
            .map_err(|error| SyncError::DiffFailure {
                reason: SyncError::reason(&error),
            })?;
        let [request] = batch;
        debug!(node = %request.template_node, diffs = diffs.len(), "built code diffs");

        let applied = self
            .code
            .apply_code_diffs(&diffs)
            .await
            .map_err(|error| SyncError::ApplyFailure {
                reason: SyncError::reason(&error),
            })?;
        if !applied {
            warn!(node = %request.template_node, "code diffs were not applied");
            return Err(SyncError::Rejected.into());
        }

        let views_signaled = self.refresh_views().await;
        if let Some(event) = &self.usage_event {
            self.usage.report_usage_event(event);
        }

        info!(
            node = %request.template_node,
            selector = %request.selector,
            class_name = %request.attributes.class_name,
            views = views_signaled,
            "applied class override"
        );

        Ok(CommitReport {
            request,
            diffs: diffs.len(),
            views_signaled,
        })
    }

    async fn refresh_views(&self) -> usize {
        let views = self.views.views();
        let count = views.len();

        match self.refresh {
            RefreshPolicy::Detached => {
                for view in views {
                    tokio::spawn(async move {
                        if let Err(error) = view.process_dom().await {
                            warn!(view = view.id(), "live view refresh failed: {error:#}");
                        }
                    });
                }
            }
            RefreshPolicy::AwaitAll => {
                let results = join_all(views.iter().map(|view| view.process_dom())).await;
                for (view, result) in views.iter().zip(results) {
                    if let Err(error) = result {
                        self.notifier.notify(Notice {
                            severity: Severity::Warning,
                            kind: NoticeKind::LiveViewFailure,
                            target: None,
                            message: format!("live view {} failed to refresh: {error:#}", view.id()),
                        });
                    }
                }
            }
        }

        count
    }
}
