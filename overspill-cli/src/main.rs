//! CLI for overspill archive chains.
//!
//! Provides commands for replaying recorded samples through a chain,
//! inspecting chain configurations, and benchmarking the accept path.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use overspill::{ArchiveChain, ChainConfig, Sample, TierConfig};
use tracing_subscriber::EnvFilter;

/// overspill: bounded, time-ordered sample archives CLI.
#[derive(Parser)]
#[command(name = "overspill", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Replay JSON-lines samples through a chain and print what each tier retains.
    Replay {
        /// File with one `{"timestamp": .., "value": ..}` object per line ("-" for stdin).
        input: PathBuf,

        /// Chain configuration file (JSON). Defaults to a single tier.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Capacity of the single tier used when no config is given.
        #[arg(long, default_value = "60")]
        capacity: usize,

        /// Only print samples with timestamp >= this value.
        #[arg(long, allow_hyphen_values = true)]
        since: Option<i64>,

        /// Output format.
        #[arg(long, default_value = "csv")]
        format: OutputFormat,
    },

    /// Validate a chain configuration and print its tiers.
    Inspect {
        /// Chain configuration file (JSON).
        config: PathBuf,
    },

    /// Run an accept-path microbenchmark.
    Bench {
        /// Number of samples to accept.
        #[arg(long, default_value = "1000000")]
        samples: u64,

        /// Capacity of each tier.
        #[arg(long, default_value = "60")]
        capacity: usize,

        /// Number of chained tiers.
        #[arg(long, default_value = "3")]
        tiers: usize,
    },
}

/// Output format for replay results.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Comma-separated values.
    Csv,
    /// JSON object per tier.
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Replay {
            input,
            config,
            capacity,
            since,
            format,
        } => cmd_replay(&input, config.as_deref(), capacity, since, &format),
        Commands::Inspect { config } => cmd_inspect(&config),
        Commands::Bench {
            samples,
            capacity,
            tiers,
        } => cmd_bench(samples, capacity, tiers),
    };

    if let Err(e) = result {
        tracing::error!("command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Loads the chain config from `path`, or builds a single-tier config.
fn load_config(path: Option<&Path>, capacity: usize) -> overspill::Result<ChainConfig> {
    match path {
        Some(path) => ChainConfig::load(path),
        None => ChainConfig::single(capacity),
    }
}

/// Implements `overspill replay <input>`.
fn cmd_replay(
    input: &Path,
    config_path: Option<&Path>,
    capacity: usize,
    since: Option<i64>,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path, capacity)?;
    let chain = ArchiveChain::<f64>::from_config(&config)?;

    let reader: Box<dyn BufRead> = if input.as_os_str() == "-" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let file = std::fs::File::open(input)
            .map_err(|e| format!("failed to open '{}': {e}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let accepted = replay(reader, &chain)?;
    tracing::debug!(accepted, discarded = chain.discarded(), "replay finished");

    let since = since.unwrap_or(i64::MIN);
    let may_be_incomplete = chain.may_be_incomplete(since);

    match format {
        OutputFormat::Csv => {
            println!(
                "# accepted={accepted}, retained={}, discarded={}, incomplete={}",
                chain.len(),
                chain.discarded(),
                may_be_incomplete
            );
            for (name, archive) in chain.tiers() {
                let samples = archive.get_archive_since(since);
                println!(
                    "# tier={name}, capacity={}, points={}",
                    archive.capacity(),
                    samples.len()
                );
                println!("timestamp,value");
                for sample in &samples {
                    println!("{},{}", sample.timestamp(), sample.value());
                }
            }
        }
        OutputFormat::Json => {
            let tiers: Vec<serde_json::Value> = chain
                .tiers()
                .map(|(name, archive)| {
                    let samples = archive.get_archive_since(since);
                    serde_json::json!({
                        "name": name,
                        "capacity": archive.capacity(),
                        "count": samples.len(),
                        "samples": samples,
                    })
                })
                .collect();

            let output = serde_json::json!({
                "accepted": accepted,
                "discarded": chain.discarded(),
                "oldest": chain.oldest_timestamp(),
                "newest": chain.newest_timestamp(),
                "may_be_incomplete": may_be_incomplete,
                "tiers": tiers,
            });

            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Feeds every sample in `reader` into `chain`, returning how many were read.
fn replay<R: BufRead>(reader: R, chain: &ArchiveChain<f64>) -> Result<u64, Box<dyn std::error::Error>> {
    let mut accepted = 0u64;
    let mut last_timestamp = i64::MIN;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let sample: Sample<f64> = serde_json::from_str(line)
            .map_err(|e| format!("line {}: invalid sample: {e}", index + 1))?;

        // Archives assume non-decreasing timestamps; flag input that breaks that.
        if sample.timestamp() < last_timestamp {
            tracing::warn!(
                line = index + 1,
                timestamp = sample.timestamp(),
                previous = last_timestamp,
                "timestamp went backwards; since-queries may be inaccurate"
            );
        }
        last_timestamp = sample.timestamp();

        chain.accept(sample);
        accepted += 1;
    }

    Ok(accepted)
}

/// Implements `overspill inspect <config>`.
fn cmd_inspect(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = ChainConfig::load(config_path)?;

    println!("Chain: {}", config_path.display());
    println!("  Tiers: {}", config.tiers.len());
    for (i, tier) in config.tiers.iter().enumerate() {
        let next = config
            .tiers
            .get(i + 1)
            .map_or("discard", |next| next.name.as_str());
        println!(
            "    Tier {i}: name={}, capacity={}, overspill -> {next}",
            tier.name, tier.capacity
        );
    }
    println!("  Total capacity: {} samples", config.total_capacity());

    Ok(())
}

/// Implements `overspill bench`.
#[allow(clippy::cast_precision_loss)] // Benchmark stats are fine with f64 precision
fn cmd_bench(samples: u64, capacity: usize, tier_count: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("overspill accept-path benchmark");
    println!("  Samples: {samples}");
    println!("  Capacity: {capacity} per tier");
    println!("  Tiers: {tier_count}");
    println!();

    let config = ChainConfig::new(
        (0..tier_count)
            .map(|i| TierConfig::new(format!("tier_{i}"), capacity))
            .collect(),
    )?;
    let chain = ArchiveChain::<f64>::from_config(&config)?;

    println!("Accepting {samples} samples...");

    let base_time = 1_700_000_000_000i64;
    let start = Instant::now();

    let mut ts = base_time;
    for i in 0..samples {
        ts += 1_000;
        chain.accept(Sample::new(ts, i as f64));
    }

    let elapsed = start.elapsed();
    let ns_per_accept = elapsed.as_nanos() as f64 / samples.max(1) as f64;
    let accepts_per_sec = samples as f64 / elapsed.as_secs_f64();

    println!();
    println!("Results:");
    println!("  Retained: {}", chain.len());
    println!("  Discarded: {}", chain.discarded());
    println!("  Elapsed: {elapsed:.3?}");
    println!("  Avg latency: {ns_per_accept:.1} ns/accept");
    println!("  Throughput: {accepts_per_sec:.0} accepts/sec");

    Ok(())
}
