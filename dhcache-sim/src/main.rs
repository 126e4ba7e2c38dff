//! `dhcache-sim`: the trace-replay CLI (spec §6/§7c).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dhcache::PolicyKind;
use dhcache_sim::generator::{TraceGenConfig, TraceGenerator};
use dhcache_sim::models::RunConfig;
use dhcache_sim::{runner, stats};
use log::info;

/// Trace-driven delayed-hit cache simulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the input trace file (spec §6 `--trace`).
    #[arg(long, value_name = "PATH")]
    trace: Option<PathBuf>,

    /// Directory to write result files into (spec §6 `--outpath`).
    #[arg(long, value_name = "DIR")]
    outpath: Option<PathBuf>,

    /// Cache capacity in mebibytes (spec §6 `--csize`).
    #[arg(long, value_name = "MIB")]
    csize: Option<f64>,

    /// Base miss latency `Z`, in cycles (spec §6 `--latency`).
    #[arg(long, value_name = "CYCLES")]
    latency: Option<u64>,

    /// Replacement policy: lru, lfu, fifo, 2q, lruk, belady, belady-size,
    /// pblru, or pbs.
    #[arg(long, value_name = "POLICY")]
    policy: Option<String>,

    /// If set, stream per-packet records to this path (spec §6 `--packets`).
    #[arg(long, value_name = "PATH")]
    packets: Option<PathBuf>,

    /// Set-associativity in bytes per set; 0 means one set holding all
    /// capacity (spec §6 `--csa`).
    #[arg(long, default_value = "0")]
    csa: u64,

    /// Cycles to run before counters are zeroed (spec §6 `--warmup`).
    #[arg(long, default_value = "0")]
    warmup: u64,

    /// Increase log verbosity (repeatable: `-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a synthetic request trace (ambient companion tool).
    Generate {
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
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match &args.command {
        Some(Commands::Generate {
            lines,
            objects,
            popular_traffic,
            popular_objects,
            min_size,
            max_size,
            idle_probability,
            seed,
            output,
        }) => run_generate(
            *lines,
            *objects,
            *popular_traffic,
            *popular_objects,
            *min_size,
            *max_size,
            *idle_probability,
            *seed,
            output.clone(),
        ),
        None => run_simulation(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_generate(
    lines: u64,
    objects: u32,
    popular_traffic: u8,
    popular_objects: u8,
    min_size: u64,
    max_size: u64,
    idle_probability: f64,
    seed: u64,
    output: PathBuf,
) -> ExitCode {
    let config = TraceGenConfig {
        lines,
        unique_objects: objects,
        popular_objects_percent: popular_objects,
        popular_traffic_percent: popular_traffic,
        min_size,
        max_size,
        idle_probability,
        seed,
        output: output.clone(),
    };

    match TraceGenerator::new(config).generate() {
        Ok(requests) => {
            println!(
                "Wrote {requests} requests ({lines} lines total) to {}",
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: failed to write trace: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Validates the run-path required flags manually (spec §7c: "unknown or
/// missing required flag prints usage and returns non-zero"), since they
/// only become required once `generate` isn't the chosen subcommand.
fn run_simulation(args: Args) -> ExitCode {
    let Some(trace) = args.trace else {
        return missing_flag("--trace");
    };
    let Some(outpath) = args.outpath else {
        return missing_flag("--outpath");
    };
    let Some(csize_mib) = args.csize else {
        return missing_flag("--csize");
    };
    let Some(latency) = args.latency else {
        return missing_flag("--latency");
    };
    let policy_name = args.policy.as_deref().unwrap_or("lru");
    let Some(policy) = PolicyKind::from_str(policy_name) else {
        eprintln!("Error: unknown policy '{policy_name}'");
        return ExitCode::FAILURE;
    };

    let config = RunConfig {
        trace,
        outpath,
        csize_mib,
        latency,
        policy,
        packets: args.packets,
        csa: args.csa,
        warmup: args.warmup,
    };

    if let Err(e) = std::fs::create_dir_all(&config.outpath) {
        eprintln!(
            "Error: failed to create outpath {}: {e}",
            config.outpath.display()
        );
        return ExitCode::FAILURE;
    }

    info!(
        "running {} over {} (capacity {} MiB, Z={})",
        config.policy.name(),
        config.trace.display(),
        config.csize_mib,
        config.latency
    );

    let output = match runner::run(&config) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Counters are printed before any file I/O is attempted, so a
    // write failure still leaves the run's results visible (spec §7d).
    println!("Total latency: {}", output.summary.total_latency);
    println!("Full Hit: {}", output.summary.full_hits);
    println!("Delayed Hit: {}", output.summary.delayed_hits);
    println!("Miss: {}", output.summary.misses);

    if let Err(e) = stats::write_result_file(&config, &output.summary) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    println!("Result written to {}", config.result_path().display());

    if config.packets.is_some() {
        if let Err(e) = stats::write_packet_dump(&config, &output.summary, &output.packets) {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn missing_flag(name: &str) -> ExitCode {
    eprintln!("Error: missing required argument {name}");
    ExitCode::FAILURE
}
