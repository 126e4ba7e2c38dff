//! Result serialization (spec §6): the result file (total latency, hit
//! breakdown, per-request latency trace) and the optional packet dump.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::error::ResultWriteError;
use crate::models::{PacketRecord, RunConfig, RunSummary};

/// Writes the result file at `config.result_path()` (spec §6): four
/// summary lines followed by a `Latency:` section with one integer per
/// trace request, in request order.
pub fn write_result_file(config: &RunConfig, summary: &RunSummary) -> Result<(), ResultWriteError> {
    let path = config.result_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let file = File::create(&path).map_err(|source| ResultWriteError {
        path: path.clone(),
        source,
    })?;
    let mut w = BufWriter::new(file);
    write_result(&mut w, summary).map_err(|source| ResultWriteError {
        path: path.clone(),
        source,
    })
}

fn write_result(w: &mut impl Write, summary: &RunSummary) -> io::Result<()> {
    writeln!(w, "Total latency: {}", summary.total_latency)?;
    writeln!(w, "Full Hit: {}", summary.full_hits)?;
    writeln!(w, "Delayed Hit: {}", summary.delayed_hits)?;
    writeln!(w, "Miss: {}", summary.misses)?;
    writeln!(w, "Latency:")?;
    for v in &summary.latency_trace {
        writeln!(w, "{v}")?;
    }
    Ok(())
}

/// Writes the optional packet dump (spec §6), one line per finalized
/// packet: a header line `{policy};{capacity_per_set};{num_sets};{total_bytes}`
/// followed by `{key};{total_latency};{queueing_delay}` records.
pub fn write_packet_dump(
    config: &RunConfig,
    summary: &RunSummary,
    packets: &[PacketRecord],
) -> Result<(), ResultWriteError> {
    let Some(path) = &config.packets else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let file = File::create(path).map_err(|source| ResultWriteError {
        path: path.clone(),
        source,
    })?;
    let mut w = BufWriter::new(file);
    write_packets(&mut w, config, summary, packets).map_err(|source| ResultWriteError {
        path: path.clone(),
        source,
    })
}

fn write_packets(
    w: &mut impl Write,
    config: &RunConfig,
    summary: &RunSummary,
    packets: &[PacketRecord],
) -> io::Result<()> {
    writeln!(
        w,
        "{};{};{};{}",
        config.policy.name(),
        summary.capacity_bytes_per_set,
        summary.num_sets,
        summary.total_bytes
    )?;
    for p in packets {
        writeln!(w, "{};{};{}", p.key, p.total_latency, p.queueing_delay)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhcache::PolicyKind;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("dhcache_sim_stats_test_{}_{n}", std::process::id()))
    }

    fn config(outpath: PathBuf) -> RunConfig {
        RunConfig {
            trace: PathBuf::from("trace.txt"),
            outpath,
            csize_mib: 10.0,
            latency: 100,
            policy: PolicyKind::Lru,
            packets: None,
            csa: 0,
            warmup: 0,
        }
    }

    fn summary() -> RunSummary {
        RunSummary {
            total_latency: 42,
            full_hits: 1,
            delayed_hits: 2,
            misses: 3,
            latency_trace: vec![0, 5, 10],
            num_sets: 1,
            capacity_bytes_per_set: 10 * 1024 * 1024,
            total_bytes: 10 * 1024 * 1024,
        }
    }

    #[test]
    fn result_file_has_expected_sections() {
        let out = temp_dir();
        let c = config(out.clone());
        let s = summary();
        write_result_file(&c, &s).unwrap();
        let contents = std::fs::read_to_string(c.result_path()).unwrap();
        assert!(contents.starts_with("Total latency: 42\n"));
        assert!(contents.contains("Full Hit: 1\n"));
        assert!(contents.contains("Delayed Hit: 2\n"));
        assert!(contents.contains("Miss: 3\n"));
        assert!(contents.contains("Latency:\n0\n5\n10\n"));
        let _ = std::fs::remove_dir_all(&out);
    }

    #[test]
    fn packet_dump_header_matches_spec_layout() {
        let out = temp_dir();
        let mut c = config(out.clone());
        let dump_path = out.join("packets.txt");
        c.packets = Some(dump_path.clone());
        let s = summary();
        let packets = vec![PacketRecord {
            key: Arc::from("A"),
            total_latency: 7,
            queueing_delay: 0,
        }];
        write_packet_dump(&c, &s, &packets).unwrap();
        let contents = std::fs::read_to_string(&dump_path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("LRUCache;10485760;1;10485760"));
        assert_eq!(lines.next(), Some("A;7;0"));
        let _ = std::fs::remove_dir_all(&out);
    }
}
