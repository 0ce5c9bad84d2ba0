//! Log output for the analysis server.
//!
//! `KILN_LOG` holds the filter directives (falling back to `RUST_LOG`), and
//! `KILN_LOG_FORMAT` picks how events are rendered:
//!
//! - `text`: flat `tracing-subscriber` lines, the default
//! - `tree`: nested `tracing-tree` output with one level per request,
//!   recheck phase and analysis batch
//! - `json`: newline-delimited JSON, suitable for attaching to a rage report
//!
//! ```bash
//! KILN_LOG=debug KILN_LOG_FORMAT=tree kiln-server --root .
//! KILN_LOG="kiln_server=debug,kiln_solver=trace" kiln-server --root .
//! ```
//!
//! Nothing is installed unless one of the filter variables is set. Every
//! format writes to stderr because stdout carries the protocol.

use std::io::stderr;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const FILTER_VAR: &str = "KILN_LOG";
const FORMAT_VAR: &str = "KILN_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Tree,
    Json,
}

impl LogFormat {
    /// Unrecognized names fall back to [`LogFormat::Text`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Pick the filter directives: `KILN_LOG` first, then `RUST_LOG`.
fn directives(kiln_log: Option<String>, rust_log: Option<String>) -> Option<String> {
    kiln_log.or(rust_log)
}

/// Install the global subscriber if logging was requested.
pub fn init_tracing() {
    let Some(directives) = directives(
        std::env::var(FILTER_VAR).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    ) else {
        return;
    };
    let filter = EnvFilter::builder().parse_lossy(directives);
    let format = std::env::var(FORMAT_VAR)
        .map(|value| LogFormat::parse(&value))
        .unwrap_or_default();

    let registry = Registry::default().with(filter);
    let installed = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(stderr))
            .try_init(),
        LogFormat::Tree => registry
            .with(
                tracing_tree::HierarchicalLayer::new(2)
                    .with_writer(stderr)
                    .with_indent_lines(true)
                    .with_deferred_spans(true)
                    .with_targets(true),
            )
            .try_init(),
    };
    // A subscriber installed earlier (a test harness, an embedding host) wins.
    let _ = installed;
}
