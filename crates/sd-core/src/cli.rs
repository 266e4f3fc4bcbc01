//! Command-line surface and command execution.

use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use sd_common::{BatchIndex, EntityId, Error, Result, SCHEMA_VERSION};
use sd_config::{resolve_config, ConfigOverrides, EtlConfig};

use crate::exit_codes::ExitCode;
use crate::history::entity_history;
use crate::logging::LogFormat;
use crate::pipeline::{Pipeline, RunSummary};
use crate::sink::TableSink;
use crate::source::JsonBatchSource;

/// Per-industry percentile ranks over a sliding window of batches.
#[derive(Debug, Parser)]
#[command(name = "score-drift", author, version, about, long_about = None)]
pub struct Cli {
    /// JSON config file (falls back to SCORE_DRIFT_CONFIG).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Batch files are read from `<PREFIX>_<index>.json`.
    #[arg(long, global = true, value_name = "PREFIX")]
    pub input_prefix: Option<PathBuf>,

    /// Directory for both output tables.
    #[arg(long, global = true, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Path of the scores table.
    #[arg(long, global = true)]
    pub scores_table: Option<PathBuf>,

    /// Path of the historical drift table.
    #[arg(long, global = true)]
    pub drift_table: Option<PathBuf>,

    /// Industry to rank (repeatable; replaces the configured set).
    #[arg(long = "industry", global = true, value_name = "LABEL")]
    pub industries: Vec<String>,

    /// Output format for command results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log line format (logs go to stderr).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Result output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Process batches and append to the output tables.
    Run(RunArgs),
    /// Show the percentile history of one entity.
    Drift(DriftArgs),
    /// Inspect the resolved configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Process batch indices below this bound.
    #[arg(long, value_name = "N")]
    pub batches: u64,

    /// First batch index to process; earlier batches are only read to
    /// rebuild the window.
    #[arg(long, default_value_t = 0, value_name = "S")]
    pub start: u64,
}

#[derive(Debug, Args)]
pub struct DriftArgs {
    /// Entity id as written in the tables.
    pub entity: String,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration as JSON.
    Show,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            input_prefix: self.input_prefix.clone(),
            out_dir: self.out_dir.clone(),
            scores_table: self.scores_table.clone(),
            drift_table: self.drift_table.clone(),
            industries: self.industries.clone(),
        }
    }

    /// Resolve config and run the selected command, writing results to `out`.
    pub fn execute(&self, out: &mut dyn Write) -> Result<ExitCode> {
        let config = resolve_config(&self.overrides())?;
        match &self.command {
            Commands::Run(args) => run(&config, args, self.format, out),
            Commands::Drift(args) => drift(&config, args, self.format, out),
            Commands::Config(ConfigCommand::Show) => {
                serde_json::to_writer_pretty(&mut *out, &config)?;
                writeln!(out)?;
                Ok(ExitCode::Clean)
            }
        }
    }
}

fn run(
    config: &EtlConfig,
    args: &RunArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    if args.start > args.batches {
        return Err(Error::Config(format!(
            "--start {} is past --batches {}",
            args.start, args.batches
        )));
    }
    let source = JsonBatchSource::new(&config.input_prefix);
    let sink = TableSink::from_config(config);
    let mut pipeline = Pipeline::new(config, source, sink);
    let summary = pipeline.process_range(BatchIndex(args.start), BatchIndex(args.batches))?;

    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "summary": &summary,
            });
            serde_json::to_writer_pretty(&mut *out, &body)?;
            writeln!(out)?;
        }
        OutputFormat::Text => write_summary(&summary, out)?,
    }
    Ok(ExitCode::Clean)
}

fn write_summary(summary: &RunSummary, out: &mut dyn Write) -> std::io::Result<()> {
    for batch in &summary.batches {
        writeln!(
            out,
            "batch {}: {} records, {} ranked, {} not computed",
            batch.index, batch.records, batch.ranked, batch.not_computed
        )?;
    }
    writeln!(
        out,
        "processed {} batches ({} records, {} ranked, {} unparseable scores)",
        summary.batch_count(),
        summary.records(),
        summary.ranked(),
        summary.score_failures()
    )
}

fn drift(
    config: &EtlConfig,
    args: &DriftArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let history = entity_history(config, &EntityId(args.entity.clone()))?;
    if history.points.is_empty() {
        if format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut *out, &history)?;
            writeln!(out)?;
        } else {
            writeln!(out, "no drift history for {}", args.entity)?;
        }
        return Ok(ExitCode::NoData);
    }

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &history)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            let changes = history.changes();
            writeln!(out, "{}", history.id)?;
            for point in &history.points {
                let delta = changes
                    .iter()
                    .find(|(index, _)| *index == point.batch_index)
                    .map(|(_, d)| format!(" ({d:+})"))
                    .unwrap_or_default();
                writeln!(out, "  run {}: {}{delta}", point.batch_index, point.percentile)?;
            }
            if let Some(range) = history.range() {
                writeln!(out, "  range: {range}")?;
            }
        }
    }
    Ok(ExitCode::Clean)
}
