//! Story Inspector
//!
//! Reads an exported story document and prints a JSON report: analytics,
//! structural issues, and (optionally) every reading path.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//! - `STORY_MAX_PATHS`: Path enumeration cap (default: 100000)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin story_inspect -- story.json [--paths]
//! cargo run --bin story_inspect -- --sample
//! ```

use std::process::ExitCode;

use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use story_graph_kernel::paths::DEFAULT_MAX_PATHS;
use story_graph_kernel::{parse_document, sample_story, PathAnalyzer, StoryGraph};

/// Initialize the tracing subscriber with JSON or pretty format.
/// Logs go to stderr so the report on stdout stays machine-readable.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "story_inspect=info,story_graph_kernel=warn".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load(source: &str) -> Result<StoryGraph, String> {
    if source == "--sample" {
        return Ok(sample_story());
    }
    let raw = std::fs::read_to_string(source).map_err(|e| format!("{source}: {e}"))?;
    parse_document(&raw).map_err(|e| format!("{source}: {e}"))
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(source) = args.iter().find(|a| *a != "--paths") else {
        eprintln!("usage: story_inspect <story.json | --sample> [--paths]");
        return ExitCode::from(2);
    };
    let with_paths = args.iter().any(|a| a == "--paths");

    let max_paths = match std::env::var("STORY_MAX_PATHS") {
        Ok(raw) => match raw.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                error!(value = %raw, "STORY_MAX_PATHS must be a positive integer");
                return ExitCode::from(2);
            }
        },
        Err(_) => DEFAULT_MAX_PATHS,
    };

    let graph = match load(source) {
        Ok(graph) => graph,
        Err(e) => {
            error!(error = %e, "failed to load story");
            return ExitCode::FAILURE;
        }
    };
    info!(scenes = graph.len(), "story loaded");

    let analyzer = PathAnalyzer::new(&graph).with_max_paths(max_paths);
    let issues: Vec<String> = graph.validate().iter().map(ToString::to_string).collect();
    let mut report = json!({
        "title": graph.metadata().title,
        "analytics": analyzer.analyze(),
        "issues": issues,
    });
    if with_paths {
        let (paths, truncated) = analyzer.enumerate();
        report["paths"] = json!(paths);
        report["pathsTruncated"] = json!(truncated);
    }

    match serde_json::to_string_pretty(&report) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "failed to render report");
            ExitCode::FAILURE
        }
    }
}
