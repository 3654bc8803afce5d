//! Observing the editor selection.

use tokio::sync::watch;

use crate::domain::model::{SelectedElement, Selector};

/// Publishing side of the selection. Owned by whatever tracks clicks in the live views.
#[derive(Debug)]
pub struct SelectionFeed {
    sender: watch::Sender<Vec<SelectedElement>>,
}

impl SelectionFeed {
    /// Create a feed with an empty selection.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self { sender }
    }

    /// Replace the selection with the provided elements, in order.
    pub fn select<I, S>(&self, selectors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Selector>,
    {
        let elements = selectors.into_iter().map(SelectedElement::new).collect();
        self.sender.send_replace(elements);
    }

    /// Clear the selection.
    pub fn clear(&self) {
        self.sender.send_replace(Vec::new());
    }

    /// Read-only handle for the sync core.
    pub fn tracker(&self) -> SelectionTracker {
        SelectionTracker {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for SelectionFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the selection. Only the front element is ever consumed; a multi-selection
/// behaves like a selection of its first entry.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    receiver: watch::Receiver<Vec<SelectedElement>>,
}

impl SelectionTracker {
    /// Selector of the front element, if anything is selected.
    pub fn front(&self) -> Option<Selector> {
        self.receiver
            .borrow()
            .first()
            .map(|element| element.selector.clone())
    }

    /// Number of selected elements.
    pub fn len(&self) -> usize {
        self.receiver.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.borrow().is_empty()
    }

    /// Wait for the next change that leaves something selected.
    ///
    /// Changes to an empty selection are skipped without clearing anything downstream. Returns
    /// `None` once the feed has been dropped.
    pub async fn next_selection(&mut self) -> Option<Selector> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(selector) = self.front_marking_seen() {
                return Some(selector);
            }
        }
    }

    fn front_marking_seen(&mut self) -> Option<Selector> {
        self.receiver
            .borrow_and_update()
            .first()
            .map(|element| element.selector.clone())
    }
}
