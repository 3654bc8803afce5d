//! Per-target edit buffers.
//!
//! A buffer holds the text the user is editing, decoupled from the last authoritative
//! [`ClassSnapshot`] until a commit succeeds. Transitions:
//!
//! ```text
//! Idle --focus--> Editing --input--> Editing
//! Editing --blur--> Committing   (node present)
//! Editing --blur--> Idle         (no node)
//! Committing --settle--> Idle
//! Editing --retarget--> Idle   (different node)
//! ```

use crate::domain::errors::BufferError;
use crate::domain::model::{BufferTarget, ClassSnapshot, Selector, TemplateNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPhase {
    Idle,
    Editing,
    Committing,
}

/// Work handed to the commit pipeline when an edited buffer loses focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    pub target: BufferTarget,
    pub node: TemplateNode,
    pub class_name: String,
    /// Front selector captured when editing began.
    pub focus_selector: Option<Selector>,
    pub generation: u64,
}

/// Read-only copy of a buffer for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferView {
    pub target: BufferTarget,
    pub node: Option<TemplateNode>,
    pub text: String,
    pub phase: BufferPhase,
    pub focused: bool,
}

#[derive(Debug, Clone)]
pub struct EditBuffer {
    target: BufferTarget,
    node: Option<TemplateNode>,
    snapshot: ClassSnapshot,
    text: String,
    phase: BufferPhase,
    focus_selector: Option<Selector>,
    generation: u64,
}

impl EditBuffer {
    pub fn new(target: BufferTarget) -> Self {
        Self {
            target,
            node: None,
            snapshot: ClassSnapshot::default(),
            text: String::new(),
            phase: BufferPhase::Idle,
            focus_selector: None,
            generation: 0,
        }
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub fn node(&self) -> Option<&TemplateNode> {
        self.node.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn snapshot(&self) -> &ClassSnapshot {
        &self.snapshot
    }

    pub fn phase(&self) -> BufferPhase {
        self.phase
    }

    /// Whether the focus hint should be shown.
    pub fn is_focused(&self) -> bool {
        self.phase == BufferPhase::Editing
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self) -> BufferView {
        BufferView {
            target: self.target,
            node: self.node.clone(),
            text: self.text.clone(),
            phase: self.phase,
            focused: self.is_focused(),
        }
    }

    /// Point the buffer at a freshly resolved node. Returns the generation that snapshot loads
    /// must present to be accepted.
    ///
    /// Moving to a different node abandons an edit in progress, so the next snapshot replaces the
    /// typed text. Re-resolving the same node keeps it. The displayed text is otherwise kept,
    /// even when `node` is `None`, until a snapshot for the new node arrives.
    pub fn retarget(&mut self, node: Option<TemplateNode>) -> u64 {
        if self.node != node && self.phase == BufferPhase::Editing {
            self.phase = BufferPhase::Idle;
            self.focus_selector = None;
        }
        self.node = node;
        self.generation += 1;
        self.generation
    }

    /// Install a loaded snapshot. Ignored when the buffer was re-targeted since the load began.
    /// While the user is editing only the snapshot is replaced, never the text being typed.
    pub fn apply_snapshot(&mut self, generation: u64, snapshot: ClassSnapshot) -> bool {
        if generation != self.generation {
            return false;
        }
        if self.phase != BufferPhase::Editing {
            self.text = snapshot.joined();
        }
        self.snapshot = snapshot;
        true
    }

    pub fn focus(&mut self, front: Option<Selector>) -> Result<(), BufferError> {
        match self.phase {
            BufferPhase::Committing => Err(BufferError::Busy(self.target)),
            BufferPhase::Editing => Ok(()),
            BufferPhase::Idle => {
                self.phase = BufferPhase::Editing;
                self.focus_selector = front;
                Ok(())
            }
        }
    }

    /// Replace the text verbatim. No validation is performed.
    pub fn input(&mut self, text: impl Into<String>) -> Result<(), BufferError> {
        if self.phase != BufferPhase::Editing {
            return Err(BufferError::NotEditing(self.target));
        }
        self.text = text.into();
        Ok(())
    }

    /// Leave editing. Yields the commit to run when a node is present; without one the buffer
    /// returns straight to idle. Blurring an idle buffer is a no-op.
    pub fn blur(&mut self) -> Result<Option<PendingCommit>, BufferError> {
        match self.phase {
            BufferPhase::Committing => Err(BufferError::Busy(self.target)),
            BufferPhase::Idle => Ok(None),
            BufferPhase::Editing => {
                let focus_selector = self.focus_selector.take();
                match self.node.clone() {
                    Some(node) => {
                        self.phase = BufferPhase::Committing;
                        Ok(Some(PendingCommit {
                            target: self.target,
                            node,
                            class_name: self.text.clone(),
                            focus_selector,
                            generation: self.generation,
                        }))
                    }
                    None => {
                        self.phase = BufferPhase::Idle;
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Finish a commit. On success the committed string becomes the authoritative snapshot,
    /// unless the buffer was re-targeted while the commit was in flight; on failure the
    /// submitted text stays on display unconfirmed.
    pub fn settle(&mut self, generation: u64, committed: Option<&str>) {
        if self.phase != BufferPhase::Committing {
            return;
        }
        self.phase = BufferPhase::Idle;
        if let Some(class_name) = committed
            && generation == self.generation
        {
            self.snapshot = ClassSnapshot::from_class_string(class_name);
        }
    }
}
