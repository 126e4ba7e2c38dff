//! `trace-generator`: standalone CLI for the synthetic trace generator
//! (spec §6 companion, [SUPPLEMENT]).

use std::path::PathBuf;

use clap::Parser;
use dhcache_sim::generator::{TraceGenConfig, TraceGenerator};

/// Generates a synthetic `;`-delimited request trace for `dhcache-sim`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Total number of trace lines to emit (requests plus idle lines).
    #[arg(long, default_value = "100000")]
    lines: u64,

    /// Number of distinct object keys.
    #[arg(long, default_value = "10000")]
    objects: u32,

    /// Percentage of traffic directed at popular objects.
    #[arg(long, default_value = "80")]
    popular_traffic: u8,

    /// Percentage of objects considered popular.
    #[arg(long, default_value = "20")]
    popular_objects: u8,

    /// Minimum object size in bytes.
    #[arg(long, default_value = "1024")]
    min_size: u64,

    /// Maximum object size in bytes.
    #[arg(long, default_value = "1048576")]
    max_size: u64,

    /// Probability (0.0-1.0) that a given line is an idle cycle.
    #[arg(long, default_value = "0.0")]
    idle_probability: f64,

    /// RNG seed, for a reproducible trace.
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Output trace file path.
    #[arg(short, long, default_value = "trace.txt")]
    output: PathBuf,
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let config = TraceGenConfig {
        lines: args.lines,
        unique_objects: args.objects,
        popular_objects_percent: args.popular_objects,
        popular_traffic_percent: args.popular_traffic,
        min_size: args.min_size,
        max_size: args.max_size,
        idle_probability: args.idle_probability,
        seed: args.seed,
        output: args.output.clone(),
    };

    let generator = TraceGenerator::new(config);
    let requests = generator.generate()?;
    println!(
        "Wrote {requests} requests ({} lines total) to {}",
        args.lines,
        args.output.display()
    );
    Ok(())
}
