//! bibjoin - Main entry point
//!
//! Reads JSON-lines record files produced by the extraction layer, correlates
//! package entries with item files, and writes one merged record per
//! correlated item.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use bibjoin::probe::{AlwaysPresent, ContentProbe, KnownPaths};
use bibjoin::runner::CrawlRunner;
use bibjoin::sink::{EmissionSink, JsonLinesSink};
use bibjoin::source::JsonLinesSource;
use bibjoin::{CrawlSession, DeferredExtractor, RawRecord};
use bibjoin_common::config::ConfigResolver;
use bibjoin_common::logging::init_logging;

/// Command-line arguments for bibjoin
#[derive(Parser, Debug)]
#[command(name = "bibjoin")]
#[command(about = "Correlate package-level and item-level bibliographic metadata")]
#[command(version)]
struct Args {
    /// JSON-lines record files (`-` or none reads stdin)
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Write merged records here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Archive listing, one member path per line, for the full-text check
    #[arg(long, value_name = "FILE")]
    listing: Option<PathBuf>,

    /// Emit records even when the full-text file is missing
    #[arg(long)]
    no_full_text_check: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "1")]
    workers: usize,

    /// Override the configured log level
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) = ConfigResolver::new("bibjoin")
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.no_full_text_check {
        config.correlation.require_full_text = false;
    }
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging("bibjoin", &config.logging).context("Failed to initialize logging")?;
    match source.path() {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: compiled defaults"),
    }

    let probe: Arc<dyn ContentProbe> = match &args.listing {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open listing {}", path.display()))?;
            let known = KnownPaths::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to read listing {}", path.display()))?;
            info!("Loaded {} archive paths from {}", known.len(), path.display());
            Arc::new(known)
        }
        None => Arc::new(AlwaysPresent),
    };

    let writer: Box<dyn Write + Send> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    let sink = Arc::new(JsonLinesSink::new(writer));

    let extractor = Arc::new(DeferredExtractor::new(&config.correlation, probe));
    let session = Arc::new(CrawlSession::new());
    info!(session_id = %session.id(), "Starting crawl");

    let runner = CrawlRunner::new(
        extractor,
        Arc::clone(&session),
        Arc::clone(&sink) as Arc<dyn EmissionSink>,
    );

    let inputs = input_labels(&args.inputs);
    if args.workers > 1 {
        let mut records = Vec::new();
        for input in &inputs {
            records.extend(read_records(input)?);
        }
        runner.run_parallel(records, args.workers).await;
    } else {
        for input in &inputs {
            for record in open_source(input)? {
                let record =
                    record.with_context(|| format!("Failed to read {}", input.display()))?;
                runner.ingest(record);
            }
        }
    }

    if let Err(e) = sink.flush() {
        warn!("Failed to flush output: {}", e);
    }
    session.finish();
    Ok(())
}

fn input_labels(inputs: &[PathBuf]) -> Vec<PathBuf> {
    if inputs.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        inputs.to_vec()
    }
}

fn open_source(input: &Path) -> Result<JsonLinesSource<Box<dyn BufRead>>> {
    if input == Path::new("-") {
        let reader: Box<dyn BufRead> = Box::new(BufReader::new(std::io::stdin()));
        return Ok(JsonLinesSource::new(reader, "stdin"));
    }
    let file = File::open(input)
        .with_context(|| format!("Failed to open input {}", input.display()))?;
    let reader: Box<dyn BufRead> = Box::new(BufReader::new(file));
    Ok(JsonLinesSource::new(reader, input.display().to_string()))
}

fn read_records(input: &Path) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for record in open_source(input)? {
        records.push(record.with_context(|| format!("Failed to read {}", input.display()))?);
    }
    Ok(records)
}
