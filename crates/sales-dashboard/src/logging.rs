//! Tracing subscriber setup
//!
//! Diagnostics go to stderr so stdout stays free for tables and summaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug,hyper=info,reqwest=info"
    } else {
        "info"
    }
}

pub fn init(verbose: bool) {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(verbose).into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(verbose))
        .init();
}
