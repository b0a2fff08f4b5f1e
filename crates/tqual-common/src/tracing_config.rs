//! Tracing configuration for debugging qualifier checks.
//!
//! Supports three output formats controlled by `TQUAL_LOG_FORMAT`:
//!
//! - `text` (default): Standard `tracing-subscriber` flat output
//! - `tree`: Hierarchical indented output via `tracing-tree`, handy for
//!   following one subtype query through its kind-pair dispatches
//! - `json`: One JSON object per span/event, machine-readable
//!
//! ## Quick start
//!
//! ```bash
//! # Human-readable tree
//! TQUAL_LOG=debug TQUAL_LOG_FORMAT=tree cargo test -p tqual-solver
//!
//! # JSON
//! TQUAL_LOG=trace TQUAL_LOG_FORMAT=json cargo test -p tqual-solver
//!
//! # Fine-grained filtering
//! TQUAL_LOG="tqual_solver::bounds=trace,tqual_solver::subtype=debug" cargo test
//! ```
//!
//! The subscriber is only initialised when `TQUAL_LOG` (or `RUST_LOG`) is set,
//! so there is zero overhead otherwise.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a format name. Unknown names fall back to [`LogFormat::Text`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Read from the `TQUAL_LOG_FORMAT` environment variable.
    fn from_env() -> Self {
        Self::parse(&std::env::var("TQUAL_LOG_FORMAT").unwrap_or_default())
    }
}

/// Build an `EnvFilter` from `TQUAL_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("TQUAL_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `TQUAL_LOG` nor `RUST_LOG` is set.
/// All output goes to stderr.
pub fn init_tracing() {
    let _ = try_init_tracing();
}

/// Like [`init_tracing`] but reports whether a subscriber was installed.
///
/// Returns `false` when logging was not requested or when another global
/// subscriber is already set (common when many tests call this).
pub fn try_init_tracing() -> bool {
    let has_tqual_log = std::env::var("TQUAL_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_tqual_log && !has_rust_log {
        return false;
    }

    let filter = build_filter();

    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            Registry::default()
                .with(filter)
                .with(tree_layer)
                .try_init()
                .is_ok()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default()
                .with(filter)
                .with(json_layer)
                .try_init()
                .is_ok()
        }
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_formats() {
        assert_eq!(LogFormat::parse("tree"), LogFormat::Tree);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" text "), LogFormat::Text);
    }

    #[test]
    fn parse_unknown_format_is_text() {
        assert_eq!(LogFormat::parse("yaml"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
    }
}
