//! PB-LRU / PBS: probability-based eviction using a per-key arrival-rate
//! estimate and a payoff score recomputed at eviction time (spec §4.2
//! "PB-LRU / PBS"). The two variants share the sliding inter-arrival window
//! ([`crate::meta::ArrivalMeta`]) but diverge in their payoff formula, per
//! SPEC_FULL.md §4.2's recovered `PBLQueue`/`PBSQueue` split: PBS drops the
//! `lrt` divisor and substitutes `lambda := 1/lrt` once `lrt` grows past
//! `12/lambda`, for the miss-latency regime (`Z <= 10^6`) where that
//! original code path is active.

extern crate alloc;

use crate::entry::Entry;
use crate::list::{List, ListEntry};
use crate::meta::ArrivalMeta;
use crate::policy::ReplacementPolicy;
use core::hash::Hash;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Threshold below which PBS's alternate lambda substitution applies,
/// mirroring the original's build-time `Z <= 10^6` gate (spec §4.2).
const PBS_Z_THRESHOLD: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbVariant {
    Lru,
    Pbs,
}

#[derive(Debug)]
pub struct PbSet<K: Clone + Hash + Eq> {
    capacity_bytes: u64,
    pub(crate) used_bytes: u64,
    variant: PbVariant,
    z: u64,
    bandwidth: u64,
    now: u64,
    history: HashMap<K, ArrivalMeta>,
    list: List<Entry<K, ArrivalMeta>>,
    map: HashMap<K, *mut ListEntry<Entry<K, ArrivalMeta>>>,
}

impl<K: Clone + Hash + Eq> PbSet<K> {
    pub fn new(capacity_bytes: u64, variant: PbVariant, z: u64, bandwidth: u64) -> Self {
        PbSet {
            capacity_bytes,
            used_bytes: 0,
            variant,
            z,
            bandwidth: bandwidth.max(1),
            now: 0,
            history: HashMap::new(),
            list: List::new(),
            map: HashMap::new(),
        }
    }

    fn payoff(&self, meta: &ArrivalMeta, size: u64, now: u64) -> f64 {
        let lt_base = self.z as f64 + (size.max(1) as f64 * 1000.0) / (self.bandwidth as f64);
        let lrt = meta.lrt(now) as f64;
        let size_f = size.max(1) as f64;

        if self.variant == PbVariant::Pbs && self.z <= PBS_Z_THRESHOLD {
            let mut lambda = meta.lambda();
            if lambda > 0.0 && lrt >= 12.0 / lambda {
                lambda = 1.0 / lrt.max(1.0);
            }
            let lt = lambda * lt_base;
            let num = lt * (lt + 1.0) / (lt + 2.0);
            return num / size_f;
        }

        let lambda = meta.lambda();
        let lt = lambda * lt_base;
        let num = lt * (lt + 1.0) / (lt + 2.0);
        num / lrt.max(1.0) / size_f
    }
}

impl<K: Clone + Hash + Eq> ReplacementPolicy<K> for PbSet<K> {
    fn touch(&mut self, key: &K, _size: u64, now: u64) {
        self.now = now;
        let meta = self.history.entry(key.clone()).or_default();
        meta.record(now);
        let updated = meta.clone();
        if let Some(&node) = self.map.get(key) {
            // SAFETY: node came from `map` and is still attached.
            unsafe { self.list.get_mut(node) }.meta = updated;
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn write(&mut self, key: K, size: u64) -> Entry<K> {
        if self.map.contains_key(&key) {
            return Entry::new(key, size);
        }

        let meta = self.history.get(&key).cloned().unwrap_or_default();
        let node = self.list.push_back(Entry::with_meta(key.clone(), size, meta));
        self.map.insert(key.clone(), node);
        self.used_bytes += size;

        let now = self.now;
        while self.used_bytes > self.capacity_bytes {
            let mut victim: Option<*mut ListEntry<Entry<K, ArrivalMeta>>> = None;
            let mut victim_val = f64::INFINITY;
            for (n, e) in self.list.iter() {
                let val = self.payoff(&e.meta, e.size, now);
                if val < victim_val {
                    victim_val = val;
                    victim = Some(n);
                }
            }
            let Some(n) = victim else { break };
            // SAFETY: `n` came from iterating `self.list` above.
            let removed = unsafe { self.list.remove(n) };
            // SAFETY: uniquely owned after detaching.
            let entry = unsafe { removed.into_value() };
            self.map.remove(&entry.key);
            self.used_bytes -= entry.size;
        }

        Entry::new(key, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_lowest_payoff() {
        let mut set = PbSet::<&str>::new(1, PbVariant::Lru, 100, 104_857_600);
        let mut now = 0u64;
        for _ in 0..5 {
            set.touch(&"hot", 1, now);
            set.write("hot", 1);
            now += 1;
        }
        set.touch(&"cold", 1, now);
        set.write("cold", 1); // capacity is full: forces an eviction
        // "hot" has a tight, well-established inter-arrival pattern and a
        // recent reference; "cold" has no history at all (lambda epsilon,
        // huge lrt), so "cold" always scores lower and is the one evicted.
        assert!(set.contains("hot"));
        assert!(!set.contains("cold"));
    }

    #[test]
    fn pbs_variant_drops_lrt_divisor_below_threshold() {
        let mut set = PbSet::<&str>::new(100, PbVariant::Pbs, 10, 104_857_600);
        set.touch(&"a", 1, 0);
        set.write("a", 1);
        assert!(set.contains("a"));
    }
}
