//! The delayed-hit request-processing engine (spec §4.3/§4.4): couples a
//! virtual clock, an in-flight fetch table, and per-key deferred packet
//! queues across one or more cache-sets reached through the hash router.
//!
//! `clk` advances by exactly one on every call to [`Engine::advance_fetches`]
//! (spec §4.4: "called on every cycle with or without a new request"), and
//! that call happens exactly once per [`Engine::process`] (its final step)
//! and once per idle trace line via [`Engine::idle_cycle`] — one call per
//! trace line, request or blank, matching the driver loop of spec §4.5.
//!
//! A trace line's own `timestamp` field plays no role in clock advancement:
//! the engine's `clk` is a pure line counter. Some of spec.md §8's narrative
//! walkthroughs describe fetches completing within the same handful of
//! lines that start them, which isn't reconcilable with this mechanical
//! clock — see DESIGN.md for the judgment call (the literal §4.3/§4.4
//! algorithm is authoritative over the prose).

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::hash::Hash;

use crate::error::CacheError;
use crate::policy::{CacheSet, PolicyKind};
use crate::router;

#[cfg(feature = "hashbrown")]
use hashbrown::{HashMap, HashSet};
#[cfg(not(feature = "hashbrown"))]
use std::collections::{HashMap, HashSet};

/// A single trace request as it threads through the engine (spec §3
/// "Packet").
#[derive(Debug, Clone)]
pub struct Packet<K> {
    pub key: K,
    pub size: u64,
    pub arrival_clock: u64,
    pub total_latency: u64,
    pub queueing_delay: u64,
    pub finalized: bool,
}

impl<K> Packet<K> {
    fn new(key: K, size: u64, arrival_clock: u64) -> Self {
        Packet {
            key,
            size,
            arrival_clock,
            total_latency: 0,
            queueing_delay: 0,
            finalized: false,
        }
    }
}

/// How a single request was classified (spec GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    FullHit,
    DelayedHit,
    Miss,
}

impl Classification {
    /// One-character trace-mirror symbol (spec §3: `hit_trace`).
    pub fn symbol(self) -> char {
        match self {
            Classification::FullHit => '2',
            Classification::DelayedHit => '1',
            Classification::Miss => '0',
        }
    }
}

/// Result of a single [`Engine::process`] call.
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub classification: Classification,
    pub latency: u64,
}

/// The delayed-hit engine: clock, in-flight table, deferred queues, and the
/// bank of cache-sets it routes requests into (spec §3 "Engine state").
#[derive(Debug)]
pub struct Engine<K: Clone + Hash + Eq> {
    clk: u64,
    z: u64,
    bandwidth: u64,
    num_sets: usize,
    sets: Vec<CacheSet<K>>,
    memory: HashSet<K>,
    inflight: HashMap<K, u64>,
    deferred: HashMap<K, Vec<Packet<K>>>,
    pub full_hits: u64,
    pub delayed_hits: u64,
    pub misses: u64,
    pub total_latency: u64,
    pub hit_trace: String,
    pub latency_trace: Vec<u64>,
    processed: Vec<Packet<K>>,
    writeq_calls: u64,
}

impl<K: Clone + Hash + Eq> Engine<K> {
    /// Default bandwidth, bytes/cycle (spec §3).
    pub const DEFAULT_BANDWIDTH: u64 = 104_857_600;

    pub fn new(
        policy: PolicyKind,
        num_sets: usize,
        capacity_bytes_per_set: u64,
        z: u64,
        bandwidth: u64,
    ) -> Self {
        let num_sets = num_sets.max(1);
        let sets = (0..num_sets)
            .map(|_| CacheSet::new(policy, capacity_bytes_per_set, z, bandwidth))
            .collect();
        Engine {
            clk: 0,
            z,
            bandwidth: bandwidth.max(1),
            num_sets,
            sets,
            memory: HashSet::new(),
            inflight: HashMap::new(),
            deferred: HashMap::new(),
            full_hits: 0,
            delayed_hits: 0,
            misses: 0,
            total_latency: 0,
            hit_trace: String::new(),
            latency_trace: Vec::new(),
            processed: Vec::new(),
            writeq_calls: 0,
        }
    }

    pub fn clk(&self) -> u64 {
        self.clk
    }

    pub fn writeq_calls(&self) -> u64 {
        self.writeq_calls
    }

    fn set_index(&self, key: &K) -> usize {
        router::route(key, self.num_sets)
    }

    /// One-time oracle pre-scan (spec §4.5 step 1 / design notes). A no-op
    /// on every non-oracle policy; see [`CacheSet::init_trace`].
    pub fn init_trace(&mut self, ordered_keys: &[K]) {
        for set in &mut self.sets {
            set.init_trace(ordered_keys);
        }
    }

    /// Processes one trace request at the current clock (spec §4.3).
    pub fn process(&mut self, key: K, size: u64) -> Outcome {
        let mut packet = Packet::new(key.clone(), size, self.clk);
        let idx = self.set_index(&key);

        self.sets[idx].touch(&key, size, self.clk);

        if !self.memory.contains(&key) {
            self.memory.insert(key.clone());
        }

        let outcome = if self.sets[idx].contains(&key) {
            self.full_hits += 1;
            self.sets[idx].write(key.clone(), size);
            packet.finalized = true;
            self.processed.push(packet);
            Outcome {
                classification: Classification::FullHit,
                latency: 0,
            }
        } else if let Some(&completion) = self.inflight.get(&key) {
            self.delayed_hits += 1;
            let queue = self.deferred.entry(key.clone()).or_default();
            packet.queueing_delay = queue.len() as u64;
            let added = completion.saturating_sub(self.clk);
            packet.total_latency += added;
            packet.finalized = true;
            self.total_latency += added;
            self.deferred
                .get_mut(&key)
                .unwrap_or_else(|| {
                    panic!(
                        "{}",
                        CacheError::InvariantViolation("deferred queue must exist for an in-flight key")
                    )
                })
                .push(packet.clone());
            Outcome {
                classification: Classification::DelayedHit,
                latency: added,
            }
        } else {
            self.misses += 1;
            let miss_latency = self.z + (size * 1000) / self.bandwidth;
            let completion = self.clk + miss_latency + 1;
            self.inflight.insert(key.clone(), completion);
            packet.total_latency += miss_latency;
            packet.finalized = true;
            self.total_latency += miss_latency;
            self.deferred.entry(key).or_default().push(packet.clone());
            Outcome {
                classification: Classification::Miss,
                latency: miss_latency,
            }
        };

        self.hit_trace.push(outcome.classification.symbol());
        self.latency_trace.push(outcome.latency);

        self.advance_fetches();
        outcome
    }

    /// A blank trace line: no request, clock still advances (spec §4.5).
    pub fn idle_cycle(&mut self) {
        self.advance_fetches();
    }

    /// Commits every fetch whose completion clock has arrived, then
    /// advances `clk` by one (spec §4.4).
    fn advance_fetches(&mut self) {
        let mut completed: Vec<K> = Vec::new();
        for (key, &completion) in self.inflight.iter() {
            if completion <= self.clk {
                completed.push(key.clone());
            }
        }

        for key in completed {
            let queue = self.deferred.remove(&key).unwrap_or_else(|| {
                panic!(
                    "{}",
                    CacheError::InvariantViolation("fetch completion with no deferred queue")
                )
            });
            let last = queue.last().unwrap_or_else(|| {
                panic!(
                    "{}",
                    CacheError::InvariantViolation("empty deferred queue at completion")
                )
            });
            let idx = self.set_index(&key);
            self.sets[idx].writeq(last.key.clone(), last.size);
            self.writeq_calls += 1;
            self.processed.extend(queue);
            self.inflight.remove(&key);
        }

        self.clk += 1;
    }

    /// Runs the replay until both `deferred` and `inflight` drain (spec
    /// §4.5 step 4, `teardown`).
    pub fn teardown(&mut self) {
        while !self.deferred.is_empty() || !self.inflight.is_empty() {
            self.advance_fetches();
        }
    }

    /// Zeroes latency and discards in-flight state at the warmup boundary
    /// (spec §4.5 step 3; SPEC_FULL.md §9 on why `inflight` is cleared too).
    pub fn warmup_reset(&mut self) {
        self.total_latency = 0;
        self.deferred.clear();
        self.inflight.clear();
        self.processed.clear();
    }

    /// Drains packets that have completed processing since the last call
    /// (full hits immediately, miss/delayed-hit packets once their fetch
    /// commits), for the driver's packet dump (spec §6).
    pub fn take_processed(&mut self) -> Vec<Packet<K>> {
        core::mem::take(&mut self.processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyKind;

    fn engine(policy: PolicyKind, capacity: u64, z: u64) -> Engine<&'static str> {
        Engine::new(policy, 1, capacity, z, Engine::<&str>::DEFAULT_BANDWIDTH)
    }

    #[test]
    fn exactly_one_classification_per_request() {
        let mut e = engine(PolicyKind::Lru, 10, 100);
        for k in ["a", "b", "c", "a"] {
            e.process(k, 4);
        }
        assert_eq!(e.full_hits + e.delayed_hits + e.misses, 4);
    }

    #[test]
    fn repeated_request_before_fetch_completes_is_delayed_hit() {
        // capacity=100, Z=50: X;X;X with no idle lines between. The first
        // is a miss; both repeats, since X is still in flight, are delayed
        // hits rather than misses (spec GLOSSARY "Delayed hit").
        let mut e = engine(PolicyKind::Lru, 100, 50);
        let o1 = e.process("x", 1);
        assert_eq!(o1.classification, Classification::Miss);
        let o2 = e.process("x", 1);
        assert_eq!(o2.classification, Classification::DelayedHit);
        let o3 = e.process("x", 1);
        assert_eq!(o3.classification, Classification::DelayedHit);
        assert_eq!(e.misses, 1);
        assert_eq!(e.delayed_hits, 2);
    }

    #[test]
    fn full_hit_after_fetch_completes_has_zero_latency() {
        let mut e = engine(PolicyKind::Lru, 100, 50);
        let miss = e.process("x", 1);
        assert_eq!(miss.classification, Classification::Miss);
        assert_eq!(miss.latency, 50);
        // idle out past the completion clock (miss at clk 0, completion 51)
        for _ in 0..60 {
            e.idle_cycle();
        }
        let hit = e.process("x", 1);
        assert_eq!(hit.classification, Classification::FullHit);
        assert_eq!(hit.latency, 0);
    }

    #[test]
    fn writeq_count_equals_distinct_misses_not_delayed_hits() {
        let mut e = engine(PolicyKind::Lru, 100, 10);
        e.process("x", 1); // miss
        e.process("x", 1); // delayed hit, same fetch
        e.process("x", 1); // delayed hit, same fetch
        for _ in 0..20 {
            e.idle_cycle();
        }
        assert_eq!(e.writeq_calls(), 1);
    }

    #[test]
    fn teardown_drains_all_in_flight_state() {
        let mut e = engine(PolicyKind::Lru, 100, 10);
        e.process("x", 1);
        e.process("y", 1);
        e.teardown();
        assert_eq!(e.clk > 0, true);
        let processed = e.take_processed();
        assert_eq!(processed.len(), 2);
        for p in &processed {
            assert!(p.finalized);
        }
    }

    #[test]
    fn capacity_bound_holds_after_many_evictions() {
        let mut e = engine(PolicyKind::Lru, 4, 5);
        for k in ["a", "b", "c", "d", "e", "f", "a", "b"] {
            e.process(k, 1);
        }
        for _ in 0..50 {
            e.idle_cycle();
        }
        assert!(e.sets[0].used_bytes() <= 4);
    }
}
