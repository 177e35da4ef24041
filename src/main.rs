//! Command-line driver: filter a JSON-lines event log, build next-action examples, or run
//! the collated baseline over them. Ctrl+C stops cleanly between records.

use clap::{Parser, Subcommand};
use recsys_pipeline::{
    config::PipelineConfig,
    logging::StructuredLogger,
    pipeline::Pipeline,
    sink::NdjsonSink,
    source::JsonLinesSource,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

static STOP: AtomicBool = AtomicBool::new(false);

#[derive(Parser, Debug)]
#[command(name = "recsys-pipeline", about = "Streaming next-action dataset builder")]
struct Cli {
    /// JSON config file; defaults are used when it does not exist
    #[arg(long, env = "RECSYS_CONFIG_PATH", default_value = "config.json")]
    config: PathBuf,

    /// Input JSON-lines file (overrides source.path)
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Stop after N distinct days (overrides stream.max_days)
    #[arg(long, global = true)]
    max_days: Option<usize>,

    /// Allowed domains (overrides stream.domains)
    #[arg(long, global = true, num_args = 1..)]
    domains: Option<Vec<String>>,

    /// Actions to drop (overrides stream.exclude_actions)
    #[arg(long, global = true, num_args = 1..)]
    exclude_actions: Option<Vec<String>>,

    /// Domain to attach to rows that have none
    #[arg(long, global = true)]
    domain_value: Option<String>,

    /// Max filtered rows to read, 0 for unlimited (overrides source.limit)
    #[arg(long, global = true)]
    limit: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter rows and save them as JSON lines
    Stream {
        #[arg(long, default_value = "data/tecd_subset.jsonl")]
        output: PathBuf,
    },
    /// Build supervised examples and save them as JSON lines
    Sequences {
        #[arg(long, default_value = "data/sequences.jsonl")]
        output: PathBuf,
    },
    /// Collate examples into batches and evaluate the transition baseline
    Batches,
}

fn apply_overrides(config: &mut PipelineConfig, cli: &Cli) {
    if let Some(ref input) = cli.input {
        config.source.path = input.clone();
    }
    if let Some(max_days) = cli.max_days {
        config.stream.max_days = Some(max_days);
    }
    if let Some(ref domains) = cli.domains {
        config.stream.domains = Some(domains.iter().cloned().collect());
    }
    if let Some(ref actions) = cli.exclude_actions {
        config.stream.exclude_actions = actions.iter().cloned().collect();
    }
    if let Some(ref value) = cli.domain_value {
        config.stream.domain_value = Some(value.clone());
    }
    if cli.limit.is_some() {
        config.source.limit = cli.limit;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let mut config = PipelineConfig::load(&cli.config)?;
    apply_overrides(&mut config, &cli);

    StructuredLogger::init(config.log.json, &config.log.level);

    let pipeline = Pipeline::new(config)?;
    let input = pipeline.config().source.path.clone();
    info!(run_id = %pipeline.run_id(), input = %input.display(), "pipeline starting");

    if let Err(e) = ctrlc::set_handler(|| STOP.store(true, Ordering::Relaxed)) {
        warn!(error = %e, "could not install Ctrl+C handler");
    }

    let mut source = JsonLinesSource::open(&input)?;
    match cli.command {
        Command::Stream { ref output } => {
            let mut sink = NdjsonSink::create(output)?;
            let stats = pipeline.write_rows(source.by_ref(), &mut sink, &STOP)?;
            sink.finish()?;
            info!(rows = stats.emitted, output = %output.display(), "saved rows");
        }
        Command::Sequences { ref output } => {
            let mut sink = NdjsonSink::create(output)?;
            let written = pipeline.write_sequences(source.by_ref(), &mut sink, &STOP)?;
            sink.finish()?;
            info!(examples = written, output = %output.display(), "saved examples");
        }
        Command::Batches => {
            let report = pipeline.run_baseline(source.by_ref(), &STOP)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if source.malformed() > 0 {
        warn!(lines = source.malformed(), "malformed input lines were skipped");
    }
    if let Some(e) = source.take_error() {
        return Err(e.into());
    }
    if STOP.load(Ordering::Relaxed) {
        info!("stopped by signal");
    }
    Ok(())
}
