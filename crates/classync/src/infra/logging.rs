//! Tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

const LOG_ENV: &str = "CLASSYNC_LOG";

/// Install the global subscriber. `CLASSYNC_LOG` wins over `RUST_LOG`; without either, `default`
/// is used as the filter. Calling this more than once is harmless.
pub fn init(default: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    let tree = HierarchicalLayer::new(2)
        .with_writer(std::io::stderr)
        .with_targets(true)
        .with_bracketed_fields(true);

    let _ = Registry::default().with(filter).with(tree).try_init();
}
