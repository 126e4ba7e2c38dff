//! Synthetic trace generation (spec §6's companion tool, [SUPPLEMENT]):
//! produces a `;`-delimited trace file in the same `timestamp;key;size`
//! format `input.rs` reads, with a Zipf-ish popularity split and
//! occasional idle lines, deterministic for a given `--seed`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Parameters for a synthetic trace (spec §6 companion, [SUPPLEMENT]).
#[derive(Debug, Clone)]
pub struct TraceGenConfig {
    /// Total number of trace lines to emit (requests + idle lines).
    pub lines: u64,
    /// Number of distinct object keys.
    pub unique_objects: u32,
    /// Percentage of objects considered "popular".
    pub popular_objects_percent: u8,
    /// Percentage of traffic directed at popular objects.
    pub popular_traffic_percent: u8,
    /// Minimum object size in bytes.
    pub min_size: u64,
    /// Maximum object size in bytes.
    pub max_size: u64,
    /// Probability that a given line is an idle cycle rather than a request.
    pub idle_probability: f64,
    /// RNG seed, for reproducible traces.
    pub seed: u64,
    /// Output trace file path.
    pub output: PathBuf,
}

impl Default for TraceGenConfig {
    fn default() -> Self {
        Self {
            lines: 100_000,
            unique_objects: 10_000,
            popular_objects_percent: 20,
            popular_traffic_percent: 80,
            min_size: 1024,
            max_size: 1024 * 1024,
            idle_probability: 0.0,
            seed: 0,
            output: PathBuf::from("trace.txt"),
        }
    }
}

/// Generates a trace file from a [`TraceGenConfig`].
pub struct TraceGenerator {
    config: TraceGenConfig,
}

impl TraceGenerator {
    pub fn new(config: TraceGenConfig) -> Self {
        Self { config }
    }

    /// Writes the trace to `config.output`, returning the number of
    /// request lines (excluding idle lines) emitted.
    pub fn generate(&self) -> io::Result<u64> {
        let cfg = &self.config;
        if let Some(parent) = cfg.output.parent() {
            fs::create_dir_all(parent)?;
        }

        let popular_objects =
            ((cfg.unique_objects as f64) * (cfg.popular_objects_percent as f64) / 100.0) as u32;
        let popular_objects = popular_objects.max(1).min(cfg.unique_objects.max(1));

        let file = File::create(&cfg.output)?;
        let mut w = BufWriter::new(file);
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let mut requests = 0u64;
        for timestamp in 0..cfg.lines {
            if cfg.idle_probability > 0.0 && rng.gen_bool(cfg.idle_probability) {
                writeln!(w)?;
                continue;
            }

            let from_popular = rng.gen_range(0..100) < cfg.popular_traffic_percent;
            let object_id = if from_popular && popular_objects > 0 {
                rng.gen_range(0..popular_objects)
            } else {
                let regular = cfg.unique_objects.saturating_sub(popular_objects).max(1);
                popular_objects + rng.gen_range(0..regular)
            };

            let size = if cfg.max_size > cfg.min_size {
                rng.gen_range(cfg.min_size..=cfg.max_size)
            } else {
                cfg.min_size
            };

            writeln!(w, "{timestamp};object-{object_id};{size}")?;
            requests += 1;
        }

        w.flush()?;
        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "dhcache_sim_gen_test_{}_{n}.txt",
            std::process::id()
        ))
    }

    #[test]
    fn generates_requested_number_of_lines() {
        let path = temp_path();
        let cfg = TraceGenConfig {
            lines: 50,
            output: path.clone(),
            ..TraceGenConfig::default()
        };
        let generator = TraceGenerator::new(cfg);
        let requests = generator.generate().unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count() as u64, 50);
        assert_eq!(requests, 50);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn same_seed_produces_identical_trace() {
        let path_a = temp_path();
        let path_b = temp_path();
        let cfg_a = TraceGenConfig {
            lines: 200,
            seed: 7,
            output: path_a.clone(),
            ..TraceGenConfig::default()
        };
        let cfg_b = TraceGenConfig {
            seed: 7,
            output: path_b.clone(),
            ..cfg_a.clone()
        };
        TraceGenerator::new(cfg_a).generate().unwrap();
        TraceGenerator::new(cfg_b).generate().unwrap();
        let a = std::fs::read_to_string(&path_a).unwrap();
        let b = std::fs::read_to_string(&path_b).unwrap();
        assert_eq!(a, b);
        let _ = std::fs::remove_file(&path_a);
        let _ = std::fs::remove_file(&path_b);
    }

    #[test]
    fn idle_probability_one_emits_only_blank_lines() {
        let path = temp_path();
        let cfg = TraceGenConfig {
            lines: 10,
            idle_probability: 1.0,
            output: path.clone(),
            ..TraceGenConfig::default()
        };
        let requests = TraceGenerator::new(cfg).generate().unwrap();
        assert_eq!(requests, 0);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.lines().all(|l| l.is_empty()));
        let _ = std::fs::remove_file(&path);
    }
}
