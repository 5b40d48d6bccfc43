//! domeval: streaming domain appraisal in the terminal.
//!
//! Streams the model's reasoning (dim) and final analysis as they arrive,
//! or fetches the whole result in one round trip with `--no-stream`. With
//! `--json`, snapshots and the outcome are emitted as NDJSON instead. When
//! the API is unreachable the local heuristic appraisal is shown.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::style::Stylize;
use serde::Deserialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use domeval_core::{AnalyzerConfig, DomainAnalyzer, HttpTransport, Snapshot};

#[derive(Parser)]
#[command(
    name = "domeval",
    version,
    about = "Streaming domain appraisal powered by deepseek-reasoner"
)]
struct Cli {
    /// Domain to analyze, e.g. shop123.ai
    domain: String,

    /// Fetch the result in one round trip instead of streaming
    #[arg(long)]
    no_stream: bool,

    /// Emit NDJSON: one snapshot per line, then the tagged outcome
    #[arg(long)]
    json: bool,

    /// Milliseconds between streamed snapshot updates
    #[arg(long, default_value_t = 50)]
    flush_interval_ms: u64,

    /// API key (falls back to DEEPSEEK_API_KEY, then the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Config file path (default: <config dir>/domeval/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_key: Option<String>,
    api_url: Option<String>,
    model: Option<String>,
}

fn load_file_config(explicit: Option<PathBuf>) -> FileConfig {
    let path = explicit
        .or_else(|| dirs::config_dir().map(|dir| dir.join("domeval").join("config.toml")));
    let Some(path) = path else {
        return FileConfig::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(raw) => toml::from_str(&raw).unwrap_or_else(|err| {
            warn!("ignoring invalid config file {}: {err}", path.display());
            FileConfig::default()
        }),
        Err(_) => FileConfig::default(),
    }
}

fn emit_json_line<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(err) => warn!("failed to encode output: {err}"),
    }
}

/// Prints only the unseen suffix of each snapshot, so the transcript grows
/// in place as frames arrive. Remembers what it already rendered: a terminal
/// message can replace a buffer wholesale, in which case the section restarts
/// instead of slicing at a byte offset that no longer means anything.
#[derive(Default)]
struct SnapshotPrinter {
    reasoning_seen: String,
    final_seen: String,
}

impl SnapshotPrinter {
    fn print(&mut self, snapshot: &Snapshot) {
        let mut out = io::stdout();
        self.print_to(&mut out, snapshot);
    }

    fn print_to(&mut self, out: &mut impl Write, snapshot: &Snapshot) {
        render_section(
            out,
            &mut self.reasoning_seen,
            &snapshot.reasoning_content,
            "Reasoning",
            true,
        );
        render_section(
            out,
            &mut self.final_seen,
            &snapshot.final_content,
            "Analysis",
            false,
        );
        let _ = out.flush();
    }
}

fn render_section(out: &mut impl Write, seen: &mut String, content: &str, header: &str, dim: bool) {
    // Overridden content keeps nothing of the printed prefix; start over
    let revised = !content.starts_with(seen.as_str());
    if revised {
        seen.clear();
    }
    if content.len() <= seen.len() {
        return;
    }

    if seen.is_empty() {
        let title = if revised {
            format!("{header} (revised)")
        } else {
            header.to_string()
        };
        let _ = writeln!(out, "\n{}", title.bold());
    }

    let fresh = &content[seen.len()..];
    if dim {
        let _ = write!(out, "{}", fresh.dark_grey());
    } else {
        let _ = write!(out, "{fresh}");
    }
    *seen = content.to_string();
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let file = load_file_config(cli.config);

    let api_key = cli
        .api_key
        .or_else(|| std::env::var("DEEPSEEK_API_KEY").ok())
        .or(file.api_key)
        .unwrap_or_default();

    let mut config = AnalyzerConfig {
        api_key,
        flush_interval: Duration::from_millis(cli.flush_interval_ms),
        ..Default::default()
    };
    if let Some(url) = file.api_url {
        config.api_url = url;
    }
    if let Some(model) = file.model {
        config.model = model;
    }

    let transport = HttpTransport::new(&config.api_url, &config.api_key);
    let analyzer = DomainAnalyzer::new(transport, config);

    let mut printer = SnapshotPrinter::default();
    let outcome = if cli.no_stream {
        analyzer.analyze(&cli.domain, None).await
    } else if cli.json {
        let mut sink = |snapshot: Snapshot| emit_json_line(&snapshot);
        analyzer.analyze(&cli.domain, Some(&mut sink)).await
    } else {
        let mut sink = |snapshot: Snapshot| printer.print(&snapshot);
        analyzer.analyze(&cli.domain, Some(&mut sink)).await
    };

    if outcome.is_degraded() {
        eprintln!(
            "{}",
            "warning: DeepSeek API unreachable, local analysis shown".yellow()
        );
    }

    if cli.json {
        emit_json_line(&outcome);
        return;
    }

    // Anything not yet rendered: the whole result in non-streaming and
    // degraded modes, or a trailing terminal override in streaming mode
    let result = outcome.result();
    printer.print(&Snapshot {
        reasoning_content: result.reasoning_content.clone(),
        final_content: result.final_content.clone(),
        is_reasoning_phase: false,
    });
    println!();
}
