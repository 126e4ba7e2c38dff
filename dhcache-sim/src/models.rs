//! Configuration and summary types shared between the CLI, the driver
//! loop, and result serialization (spec §6).

use std::path::PathBuf;

use dhcache::PolicyKind;

/// Fully resolved configuration for one simulation run, after CLI
/// validation (spec §6's CLI surface table).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub trace: PathBuf,
    pub outpath: PathBuf,
    /// Cache capacity in mebibytes, as given on the command line (`csize`).
    pub csize_mib: f64,
    /// Base miss latency `Z`, in cycles (`latency`).
    pub latency: u64,
    pub policy: PolicyKind,
    /// If set, stream per-packet records to this path (`packets`).
    pub packets: Option<PathBuf>,
    /// Set-associativity in bytes per set; 0 means one set holding all
    /// capacity (`csa`).
    pub csa: u64,
    /// Cycles to run before counters are zeroed (`warmup`).
    pub warmup: u64,
}

impl RunConfig {
    /// Total cache capacity in bytes (`csize` MiB, spec §6).
    pub fn total_bytes(&self) -> u64 {
        (self.csize_mib * 1024.0 * 1024.0) as u64
    }

    /// Resolves `(num_sets, capacity_bytes_per_set)` from `csa` (spec §6 /
    /// §2 "Hash router"): `csa == 0` degenerates to a single set holding
    /// the whole capacity; otherwise `csa` is the per-set byte budget and
    /// the number of sets is however many fit in the total capacity.
    pub fn set_layout(&self) -> (usize, u64) {
        let total = self.total_bytes();
        if self.csa == 0 {
            (1, total)
        } else {
            let num_sets = (total / self.csa).max(1) as usize;
            (num_sets, self.csa)
        }
    }

    /// The result-file path, spec §6: `{outpath}/{policy_name}_{capacity_MiB}c_{Z}l.txt`.
    pub fn result_path(&self) -> PathBuf {
        self.outpath.join(format!(
            "{}_{}c_{}l.txt",
            self.policy.name(),
            format_mib(self.csize_mib),
            self.latency
        ))
    }
}

/// Trims a float the way a capacity like `10` (not `10.0`) should read in
/// a result filename, while still showing fractional MiB sizes exactly.
fn format_mib(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Aggregate counters and per-request traces produced by one run (spec
/// §3 "Engine state" counters, §6 result file).
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_latency: u64,
    pub full_hits: u64,
    pub delayed_hits: u64,
    pub misses: u64,
    pub latency_trace: Vec<u64>,
    pub num_sets: usize,
    pub capacity_bytes_per_set: u64,
    pub total_bytes: u64,
}

/// One line of the packet dump (spec §6): `{key};{total_latency};{queueing_delay}`.
#[derive(Debug, Clone)]
pub struct PacketRecord {
    pub key: std::sync::Arc<str>,
    pub total_latency: u64,
    pub queueing_delay: u64,
}
