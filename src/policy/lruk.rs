//! LRU-K (K=4): a resident set backed by a non-resident *ghost* history.
//! A key only earns residency once it has been seen `K` times while in
//! ghost state (spec §4.2 "LRU-K"); the resident victim is whichever key
//! has the largest gap since its K-th-most-recent reference.
//!
//! Per spec §4.2, the timestamp vector is recorded on *every* `touch`
//! regardless of residency, so a key promoted out of the ghost set carries
//! its real reference history forward rather than starting a fresh ring at
//! admission time. `write` itself has no virtual-clock parameter (the
//! cache-set contract, spec §4.1), so eviction reuses the clock value
//! observed on the most recent `touch` — always the same request's clock,
//! since the engine calls `touch` immediately before classification.

extern crate alloc;

use crate::entry::Entry;
use crate::list::{List, ListEntry};
use crate::meta::LruKMeta;
use crate::policy::ReplacementPolicy;
use core::hash::Hash;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

const K: usize = 4;

#[derive(Debug)]
struct History {
    meta: LruKMeta,
    hits: u32,
    size: u64,
}

#[derive(Debug)]
pub struct LruKSet<K: Clone + Hash + Eq> {
    capacity_bytes: u64,
    pub(crate) used_bytes: u64,
    ghost_capacity_bytes: u64,
    ghost_used_bytes: u64,
    now: u64,
    list: List<Entry<K>>,
    map: HashMap<K, *mut ListEntry<Entry<K>>>,
    history: HashMap<K, History>,
    ghost_order: List<K>,
    ghost_nodes: HashMap<K, *mut ListEntry<K>>,
}

impl<K: Clone + Hash + Eq> LruKSet<K> {
    pub fn new(capacity_bytes: u64) -> Self {
        LruKSet {
            capacity_bytes,
            used_bytes: 0,
            ghost_capacity_bytes: capacity_bytes.saturating_mul(4),
            ghost_used_bytes: 0,
            now: 0,
            list: List::new(),
            map: HashMap::new(),
            history: HashMap::new(),
            ghost_order: List::new(),
            ghost_nodes: HashMap::new(),
        }
    }

    fn evict_ghost(&mut self) {
        while self.ghost_used_bytes > self.ghost_capacity_bytes {
            let Some(evicted) = self.ghost_order.remove_first() else {
                break;
            };
            // SAFETY: uniquely owned after detaching.
            let key = unsafe { evicted.into_value() };
            self.ghost_nodes.remove(&key);
            if let Some(h) = self.history.remove(&key) {
                self.ghost_used_bytes -= h.size;
            }
        }
    }

    fn evict_one(&mut self) -> bool {
        let now = self.now;
        let history = &self.history;
        let mut victim: Option<*mut ListEntry<Entry<K>>> = None;
        let mut victim_gap = 0u64;
        for (node, entry) in self.list.iter() {
            let gap = history.get(&entry.key).map_or(0, |h| h.meta.kth_gap(now));
            if victim.is_none() || gap >= victim_gap {
                victim_gap = gap;
                victim = Some(node);
            }
        }
        let Some(node) = victim else {
            return false;
        };
        // SAFETY: `node` came from iterating `self.list` above.
        let removed = unsafe { self.list.remove(node) };
        // SAFETY: uniquely owned after detaching.
        let entry = unsafe { removed.into_value() };
        self.map.remove(&entry.key);
        self.history.remove(&entry.key);
        self.used_bytes -= entry.size;
        true
    }
}

impl<K: Clone + Hash + Eq> ReplacementPolicy<K> for LruKSet<K> {
    fn touch(&mut self, key: &K, size: u64, now: u64) {
        self.now = now;
        let resident = self.map.contains_key(key);
        let h = self.history.entry(key.clone()).or_insert_with(|| History {
            meta: LruKMeta::default(),
            hits: 0,
            size,
        });
        h.size = size;
        h.meta.record(K, now);
        if !resident {
            h.hits += 1;
            if !self.ghost_nodes.contains_key(key) {
                let node = self.ghost_order.push_back(key.clone());
                self.ghost_nodes.insert(key.clone(), node);
                self.ghost_used_bytes += size;
            }
            self.evict_ghost();
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn write(&mut self, key: K, size: u64) -> Entry<K> {
        if let Some(&node) = self.map.get(&key) {
            // SAFETY: node came from `map` and is still attached.
            unsafe { self.list.move_to_back(node) };
            return Entry::new(key, size);
        }

        let hits = self.history.get(&key).map_or(0, |h| h.hits);
        if hits < K as u32 {
            // Not yet qualified: stays ghost-only, never admitted.
            return Entry::rejected(key, size, ());
        }

        if let Some(node) = self.ghost_nodes.remove(&key) {
            // SAFETY: `node` is still attached to `ghost_order`.
            let removed = unsafe { self.ghost_order.remove(node) };
            // SAFETY: uniquely owned after detaching.
            let _ = unsafe { removed.into_value() };
            if let Some(h) = self.history.get(&key) {
                self.ghost_used_bytes -= h.size;
            }
        }

        let node = self.list.push_back(Entry::new(key.clone(), size));
        self.map.insert(key.clone(), node);
        self.used_bytes += size;

        while self.used_bytes > self.capacity_bytes {
            if !self.evict_one() {
                break;
            }
        }

        Entry::new(key, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_only_after_k_ghost_hits() {
        let mut set = LruKSet::<&str>::new(100);
        for t in 0..4u64 {
            set.touch(&"a", 1, t);
            if t < 3 {
                assert!(!set.write("a", 1).valid);
            }
        }
        assert!(set.write("a", 1).valid);
        assert!(set.contains("a"));
    }

    #[test]
    fn eviction_keeps_capacity_bound() {
        let mut set = LruKSet::<&str>::new(2);
        let mut now = 0u64;
        for k in ["a", "b", "c"] {
            for _ in 0..K {
                set.touch(&k, 1, now);
                set.write(k, 1);
                now += 1;
            }
        }
        assert!(set.used_bytes <= 2);
        assert!(set.contains("c"));
    }
}
