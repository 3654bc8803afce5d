//! Usage reporting backed by `tracing`.

use crate::app::ports::UsageReporter;

/// Emits usage events as structured log records under the `classync::usage` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingUsageReporter;

impl UsageReporter for TracingUsageReporter {
    fn report_usage_event(&self, name: &str) {
        tracing::info!(target: "classync::usage", event = name, "usage event");
    }
}
