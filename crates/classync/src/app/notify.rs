//! Non-blocking, dismissible failure notices.

use parking_lot::Mutex;

use crate::domain::errors::{CommitError, SyncError};
use crate::domain::model::BufferTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Category of a notice, mirroring the failure taxonomy of the sync protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    LoadFailure,
    MutationServiceFailure,
    StaleSelection,
    NoSelection,
    Busy,
    LiveViewFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub kind: NoticeKind,
    pub target: Option<BufferTarget>,
    pub message: String,
}

impl Notice {
    pub fn from_sync_error(target: Option<BufferTarget>, error: &SyncError) -> Self {
        let (severity, kind) = match error {
            SyncError::LoadFailure { .. } | SyncError::LoadTimeout { .. } => {
                (Severity::Warning, NoticeKind::LoadFailure)
            }
            SyncError::DiffFailure { .. }
            | SyncError::ApplyFailure { .. }
            | SyncError::Rejected => (Severity::Error, NoticeKind::MutationServiceFailure),
            SyncError::StaleSelection => (Severity::Info, NoticeKind::StaleSelection),
        };
        Self {
            severity,
            kind,
            target,
            message: error.to_string(),
        }
    }

    pub fn from_commit_error(target: BufferTarget, error: &CommitError) -> Self {
        match error {
            CommitError::Service(inner) => Self::from_sync_error(Some(target), inner),
            CommitError::NoSelection => Self {
                severity: Severity::Warning,
                kind: NoticeKind::NoSelection,
                target: Some(target),
                message: error.to_string(),
            },
            CommitError::Buffer(_) => Self {
                severity: Severity::Info,
                kind: NoticeKind::Busy,
                target: Some(target),
                message: error.to_string(),
            },
        }
    }
}

/// Caller-visible error reporting hook. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// A notice that has not been dismissed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNotice {
    pub id: u64,
    pub notice: Notice,
}

/// Notices kept by [`NotificationCenter::new`].
pub const DEFAULT_NOTICE_CAPACITY: usize = 32;

/// In-process notice queue. Every notice is also mirrored to `tracing`.
///
/// At most `capacity` notices stay active. When full, the oldest `Info` notice is evicted first,
/// then the oldest notice of any severity.
#[derive(Debug)]
pub struct NotificationCenter {
    capacity: usize,
    state: Mutex<CenterState>,
}

#[derive(Debug, Default)]
struct CenterState {
    next_id: u64,
    active: Vec<ActiveNotice>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_NOTICE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CenterState::default()),
        }
    }

    /// Notices that are still showing, oldest first.
    pub fn active(&self) -> Vec<ActiveNotice> {
        self.state.lock().active.clone()
    }

    /// Remove a notice. Returns `false` when `id` is unknown or already dismissed.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        let before = state.active.len();
        state.active.retain(|entry| entry.id != id);
        state.active.len() != before
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notice: Notice) {
        let (kind, target) = (notice.kind, notice.target);
        match notice.severity {
            Severity::Info => tracing::info!(?kind, buffer = ?target, "{}", notice.message),
            Severity::Warning => tracing::warn!(?kind, buffer = ?target, "{}", notice.message),
            Severity::Error => tracing::error!(?kind, buffer = ?target, "{}", notice.message),
        }

        let mut state = self.state.lock();
        if state.active.len() >= self.capacity {
            let evict = state
                .active
                .iter()
                .position(|entry| entry.notice.severity == Severity::Info)
                .unwrap_or(0);
            state.active.remove(evict);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.active.push(ActiveNotice { id, notice });
    }
}
