//! Command-line interface components.

use crate::config::SpedConfig;
use crate::constants::{CONSOLIDATED_SUFFIX, EXPECTED_EXTENSIONS};
use crate::export::write_parquet;
use crate::processor::{BatchOutput, SpedProcessor};
use crate::schema::SpedSchema;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug, Clone)]
#[command(name = "sped-consolidator")]
#[command(about = "Parse SPED bookkeeping files and consolidate record hierarchies into Parquet")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// SPED files or directories containing them (.txt/.sped)
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for consolidated Parquet files
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// YAML configuration file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// YAML schema replacing the bundled record layouts and groups
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Abort on the first malformed line or failing file
    #[arg(long)]
    pub strict: bool,

    /// Number of files processed concurrently
    #[arg(short = 'j', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Set up structured logging to stderr
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("sped_consolidator={}", args.get_log_level()))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Layer configuration: defaults, then the YAML file, then flags
pub fn load_configuration(args: &Args) -> Result<SpedConfig> {
    let config_file = match &args.config {
        Some(path) => Some(path.clone()),
        None => SpedConfig::default_config_path()
            .ok()
            .filter(|path| path.exists()),
    };

    let mut config = match &config_file {
        Some(path) => {
            info!("Using config file: {}", path.display());
            SpedConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?
        }
        None => {
            debug!("No config file found, using defaults");
            SpedConfig::default()
        }
    };

    if args.strict {
        config = config.with_strict_mode(true);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    config = config.with_progress(args.show_progress());

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load_schema(args: &Args) -> Result<SpedSchema> {
    match &args.schema {
        Some(path) => SpedSchema::from_yaml_file(path)
            .with_context(|| format!("Failed to load schema {}", path.display())),
        None => Ok(SpedSchema::default()),
    }
}

/// Expand directories into the SPED files they contain, sorted by path
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).follow_links(true) {
            let entry =
                entry.with_context(|| format!("Failed to walk directory {}", input.display()))?;
            if entry.file_type().is_file() && has_sped_extension(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        if found.is_empty() {
            warn!("No SPED files found in {}", input.display());
        }
        files.extend(found);
    }
    Ok(files)
}

fn has_sped_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXPECTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Write every non-empty consolidated frame as `<group>_CONSOLIDADO.parquet`.
/// Returns the paths written with their row counts.
pub fn write_outputs(batch: &BatchOutput, output_dir: &Path) -> Result<Vec<(PathBuf, u64)>> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory {}", output_dir.display())
    })?;

    let mut written = Vec::new();
    for (group, df) in &batch.consolidated {
        if df.height() == 0 {
            debug!("Group {} is empty, no file written", group);
            continue;
        }
        let path = output_dir.join(format!("{}{}", group, CONSOLIDATED_SUFFIX));
        let rows = write_parquet(df, &path)?;
        info!("Wrote {} rows to {}", rows, path.display());
        written.push((path, rows));
    }
    Ok(written)
}

/// Run the consolidator for parsed arguments
pub async fn run(args: Args) -> Result<BatchOutput> {
    let start_time = Instant::now();
    let config = load_configuration(&args)?;
    let schema = load_schema(&args)?;
    debug!("Loaded configuration: {:?}", config);

    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No SPED files to process");
    }
    info!("Processing {} files with {} workers", files.len(), config.workers);

    let processor = SpedProcessor::new(schema, config).context("Invalid schema")?;
    let batch = processor.process_files(&files).await?;
    batch.metrics.log_summary();

    let written = match &args.output {
        Some(dir) => write_outputs(&batch, dir)?,
        None => Vec::new(),
    };

    if !args.quiet {
        print_summary(&batch, &written, start_time.elapsed().as_millis());
    }
    Ok(batch)
}

fn print_summary(batch: &BatchOutput, written: &[(PathBuf, u64)], elapsed_ms: u128) {
    let metrics = &batch.metrics;

    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        elapsed_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        batch.files_processed().to_string().bright_white()
    );
    if batch.files_failed() > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            batch.files_failed().to_string().bright_red().bold()
        );
        for failure in &batch.failures {
            println!(
                "    {} {}",
                failure.path.display().to_string().bright_red(),
                failure.message
            );
        }
    }
    println!(
        "  {} {} ({} processed, {} unknown, {} errors)",
        "Lines:".bright_cyan(),
        metrics.total_lines.to_string().bright_white().bold(),
        metrics.processed_lines,
        metrics.unknown_lines,
        metrics.error_lines
    );
    println!(
        "  {} {:.1}%",
        "Success rate:".bright_cyan(),
        metrics.success_rate()
    );
    if metrics.conversion_failures > 0 {
        println!(
            "  {} {}",
            "Numeric conversion failures:".bright_yellow(),
            metrics.conversion_failures
        );
    }

    println!("\n{}", "Consolidated groups".bright_green().bold());
    for (group, df) in &batch.consolidated {
        let rows = df.height().to_string();
        let rows = if df.height() == 0 {
            rows.dimmed()
        } else {
            rows.bright_white().bold()
        };
        println!("  {:<8} {} rows", group.bright_cyan(), rows);
    }

    for (path, rows) in written {
        println!(
            "  {} {} ({} rows)",
            "Wrote".bright_green(),
            path.display(),
            rows
        );
    }
}
