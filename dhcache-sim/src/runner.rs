//! The replay driver (spec §4.5): wires a [`dhcache::Engine`] to a trace
//! file and produces the aggregate counters, latency trace, and (if
//! requested) per-packet records the CLI writes out via `stats.rs`.

use std::sync::Arc;

use dhcache::Engine;
use log::warn;

use crate::error::TraceError;
use crate::input::{prescan_keys, TraceLine, TraceReader};
use crate::models::{PacketRecord, RunConfig, RunSummary};

/// Everything a completed run produces: the aggregate summary plus the
/// packet records, empty unless `--packets` was requested.
pub struct RunOutput {
    pub summary: RunSummary,
    pub packets: Vec<PacketRecord>,
}

/// Replays `config.trace` through a freshly built engine end to end:
/// optional oracle pre-scan (spec §4.5 step 1), line-by-line replay with a
/// one-shot warmup reset (step 3), and a teardown drain (step 4).
pub fn run(config: &RunConfig) -> Result<RunOutput, TraceError> {
    let (num_sets, capacity_bytes_per_set) = config.set_layout();
    let mut engine: Engine<Arc<str>> = Engine::new(
        config.policy,
        num_sets,
        capacity_bytes_per_set,
        config.latency,
        Engine::<Arc<str>>::DEFAULT_BANDWIDTH,
    );

    if config.policy.requires_trace_prescan() {
        let ordered_keys = prescan_keys(&config.trace)?;
        engine.init_trace(&ordered_keys);
    }

    let want_packets = config.packets.is_some();
    let mut packets = Vec::new();
    let mut warmed_up = config.warmup == 0;

    let reader = TraceReader::open(&config.trace)?;
    for line in reader {
        match line {
            Ok(TraceLine::Request { key, size }) => {
                engine.process(key, size);
            }
            Ok(TraceLine::Idle) => engine.idle_cycle(),
            Err(e) => {
                warn!("skipping malformed trace line: {e}");
                engine.idle_cycle();
            }
        }

        if !warmed_up && engine.clk() >= config.warmup {
            engine.warmup_reset();
            warmed_up = true;
        }

        if want_packets {
            drain_packets(&mut engine, &mut packets);
        }
    }

    engine.teardown();
    if want_packets {
        drain_packets(&mut engine, &mut packets);
    }

    let summary = RunSummary {
        total_latency: engine.total_latency,
        full_hits: engine.full_hits,
        delayed_hits: engine.delayed_hits,
        misses: engine.misses,
        latency_trace: std::mem::take(&mut engine.latency_trace),
        num_sets,
        capacity_bytes_per_set,
        total_bytes: config.total_bytes(),
    };

    Ok(RunOutput { summary, packets })
}

fn drain_packets(engine: &mut Engine<Arc<str>>, out: &mut Vec<PacketRecord>) {
    for p in engine.take_processed() {
        out.push(PacketRecord {
            key: p.key,
            total_latency: p.total_latency,
            queueing_delay: p.queueing_delay,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn write_trace(contents: &str) -> std::path::PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "dhcache_sim_runner_test_{}_{n}.txt",
            std::process::id()
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn config(trace: std::path::PathBuf, policy: dhcache::PolicyKind) -> RunConfig {
        RunConfig {
            trace,
            outpath: std::env::temp_dir(),
            csize_mib: 10.0 / (1024.0 * 1024.0),
            latency: 100,
            policy,
            packets: None,
            csa: 0,
            warmup: 0,
        }
    }

    #[test]
    fn lru_capacity_ten_sees_four_misses() {
        // spec §8 scenario: capacity=10, Z=100, trace A,B,C,A -> 4 misses
        // (A is evicted by the time it returns because each object is
        // sized to fill the whole cache by itself).
        let path = write_trace("0;A;10\n0;B;10\n0;C;10\n0;A;10\n");
        let mut c = config(path.clone(), dhcache::PolicyKind::Lru);
        c.csize_mib = 10.0 / (1024.0 * 1024.0);
        let out = run(&c).unwrap();
        assert_eq!(out.summary.misses, 4);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn oracle_policy_triggers_prescan() {
        let path = write_trace("0;A;1\n0;B;1\n0;A;1\n");
        let mut c = config(path.clone(), dhcache::PolicyKind::Belady);
        c.csize_mib = 2.0 / (1024.0 * 1024.0);
        let out = run(&c).unwrap();
        assert_eq!(out.summary.full_hits + out.summary.delayed_hits + out.summary.misses, 3);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_line_is_skipped_not_fatal() {
        let path = write_trace("0;A;1\nbroken-line\n0;A;1\n");
        let c = config(path.clone(), dhcache::PolicyKind::Lru);
        let out = run(&c).unwrap();
        assert_eq!(out.summary.full_hits + out.summary.delayed_hits + out.summary.misses, 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn packet_dump_collects_one_record_per_request() {
        let path = write_trace("0;A;1\n0;B;1\n");
        let mut c = config(path.clone(), dhcache::PolicyKind::Lru);
        c.packets = Some(std::env::temp_dir().join("unused-packets.txt"));
        let out = run(&c).unwrap();
        assert_eq!(out.packets.len(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
