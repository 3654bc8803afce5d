//! Loading class snapshots from the document model.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::app::ports::ClassSource;
use crate::domain::errors::SyncError;
use crate::domain::model::{ClassSnapshot, TemplateNode};

/// Fetches the classes currently written for a node, bounded by a timeout.
#[derive(Clone)]
pub struct ClassSnapshotLoader {
    source: Arc<dyn ClassSource>,
    timeout: Duration,
}

impl ClassSnapshotLoader {
    pub fn new(source: Arc<dyn ClassSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub async fn load(&self, node: &TemplateNode) -> Result<ClassSnapshot, SyncError> {
        let fetch = self.source.fetch_class_tokens(node);
        let tokens = match tokio::time::timeout(self.timeout, fetch).await {
            Ok(Ok(tokens)) => tokens,
            Ok(Err(error)) => {
                return Err(SyncError::LoadFailure {
                    node: node.clone(),
                    reason: SyncError::reason(&error),
                });
            }
            Err(_) => {
                return Err(SyncError::LoadTimeout {
                    node: node.clone(),
                    timeout: self.timeout,
                });
            }
        };

        debug!(%node, count = tokens.len(), "loaded class snapshot");
        Ok(ClassSnapshot::new(tokens))
    }
}
