//! Aggregate sentiment over texts read one per line (stdin or a file argument).
//!
//! Usage: analyze_lines [--results] [FILE]

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use text_analytics::{aggregate::aggregate_with_results, build_scorer, AppConfig};

/// Aggregate sentiment over one text per line
#[derive(Parser, Debug)]
#[command(name = "analyze_lines", about, long_about = None)]
struct Cli {
    /// Also print the per-text sentiment results
    #[arg(long)]
    results: bool,

    /// Input file (defaults to stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let input = match &cli.file {
        Some(p) => {
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    let texts: Vec<String> = input
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();

    let cfg = AppConfig::from_env()?;
    let scorer = build_scorer(&cfg)?;
    let (analysis, results) = aggregate_with_results(&scorer, &texts).await?;

    let out = if cli.results {
        json!({ "analysis": analysis, "results": results })
    } else {
        serde_json::to_value(&analysis)?
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
