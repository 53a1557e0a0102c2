//! CLI for ggml-multipart: split, inspect, vocab.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ggml_multipart::{inspect_model, read_header, split_file, SplitConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ggml-multipart")]
#[command(about = "Split single-file ggml models into a header plus tensor-parallel parts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a model: header at <FILE> (or --output), parts at <FILE>.0 .. <FILE>.N-1
    Split {
        file: PathBuf,
        /// Number of part files [default: 2, or GGML_SPLIT_PARTS]
        #[arg(short = 'n', long = "parts")]
        parts: Option<usize>,
        /// JSON config file (part count, quantization block layouts)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write outputs here instead of converting in place (no backup is made)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write a JSON conversion report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show hyperparameters and the split plan without writing anything
    Inspect {
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print vocabulary entries
    Vocab {
        file: PathBuf,
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

/// Filter used when `RUST_LOG` is unset, empty, or unparsable.
const DEFAULT_LOG: &str = "info";

/// Directives for the log filter: `RUST_LOG` as given, or [`DEFAULT_LOG`].
fn log_directives(rust_log: Option<String>) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG.to_string())
}

fn main() -> Result<()> {
    let directives = log_directives(std::env::var("RUST_LOG").ok());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG)),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Split {
            file,
            parts,
            config,
            output,
            report,
        } => run_split(&file, parts, config.as_deref(), output.as_deref(), report.as_deref())?,
        Commands::Inspect { file, config, json } => run_inspect(&file, config.as_deref(), json)?,
        Commands::Vocab { file, limit } => run_vocab(&file, limit)?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>, parts: Option<usize>) -> Result<SplitConfig> {
    SplitConfig::resolve(path, parts).with_context(|| match path {
        Some(p) => format!("loading config {}", p.display()),
        None => "loading config".to_string(),
    })
}

fn run_split(
    file: &Path,
    parts: Option<usize>,
    config: Option<&Path>,
    output: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config, parts)?;
    let (paths, report) = split_file(file, output, &config)
        .with_context(|| format!("splitting {}", file.display()))?;

    for d in &report.diagnostics {
        eprintln!("warning: {}", d);
    }
    println!(
        "{} -> {} ({} bytes)",
        paths.source.display(),
        paths.header.display(),
        report.header_bytes
    );
    for (p, bytes) in paths.parts.iter().zip(&report.part_bytes) {
        println!("  {} ({} bytes)", p.display(), bytes);
    }
    if let Some(rp) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(rp, json).with_context(|| format!("writing report {}", rp.display()))?;
        info!(report = %rp.display(), "report written");
    }
    Ok(())
}

fn run_inspect(file: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config, None)?;
    let result = inspect_model(file, &config.blocks)
        .with_context(|| format!("inspecting {}", file.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    let h = &result.hparams;
    println!(
        "n_vocab={} n_embd={} n_mult={} n_head={} n_layer={} n_rot={} encoding={}",
        h.n_vocab, h.n_embd, h.n_mult, h.n_head, h.n_layer, h.n_rot, h.encoding
    );
    println!(
        "vocab: {} entries (pad id {}, {} not valid UTF-8)",
        result.vocab.entries, result.vocab.pad_id, result.vocab.invalid_utf8
    );
    for t in &result.tensors {
        println!(
            "{:<40} {:>5} {:>16} {:>12} {}",
            t.frame.name,
            t.frame.encoding.to_string(),
            format!("{:?}", t.frame.extents),
            t.data_bytes,
            t.split
        );
    }
    for d in &result.diagnostics {
        println!("warning: {}", d);
    }
    Ok(())
}

fn run_vocab(file: &Path, limit: usize) -> Result<()> {
    let mut reader = BufReader::new(
        File::open(file).with_context(|| format!("opening {}", file.display()))?,
    );
    let (_, vocab) = read_header(&mut reader, &mut std::io::sink())?;
    for (id, _) in vocab.iter().take(limit) {
        let text = vocab.token_text(id).unwrap_or_default();
        println!("{:>6}: {:?}", id, text);
    }
    if vocab.len() > limit {
        println!("... {} more", vocab.len() - limit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_is_used_as_given() {
        assert_eq!(log_directives(Some("debug".into())), "debug");
        assert_eq!(
            log_directives(Some("ggml_multipart=trace,warn".into())),
            "ggml_multipart=trace,warn"
        );
    }

    #[test]
    fn unset_or_blank_rust_log_falls_back_to_info() {
        assert_eq!(log_directives(None), DEFAULT_LOG);
        assert_eq!(log_directives(Some("  ".into())), DEFAULT_LOG);
    }

    #[test]
    fn directives_parse() {
        assert!(EnvFilter::try_new(log_directives(Some("debug".into()))).is_ok());
        assert!(EnvFilter::try_new(log_directives(None)).is_ok());
    }
}
