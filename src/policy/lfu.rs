//! LFU: per-key frequency incremented on every `touch` (resident or not,
//! matching the original `Freqs` map which is never pruned on eviction).
//! Victim is the resident with the lowest frequency; ties go to whichever
//! is encountered first in insertion order (spec §4.2 "LFU").

extern crate alloc;

use crate::entry::Entry;
use crate::list::{List, ListEntry};
use crate::policy::ReplacementPolicy;
use core::hash::Hash;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

#[derive(Debug)]
pub struct LfuSet<K: Clone + Hash + Eq> {
    capacity_bytes: u64,
    pub(crate) used_bytes: u64,
    list: List<Entry<K>>,
    map: HashMap<K, *mut ListEntry<Entry<K>>>,
    freq: HashMap<K, u64>,
}

impl<K: Clone + Hash + Eq> LfuSet<K> {
    pub fn new(capacity_bytes: u64) -> Self {
        LfuSet {
            capacity_bytes,
            used_bytes: 0,
            list: List::new(),
            map: HashMap::new(),
            freq: HashMap::new(),
        }
    }

    fn evict_one(&mut self) -> bool {
        let mut victim: Option<*mut ListEntry<Entry<K>>> = None;
        let mut victim_freq = u64::MAX;
        for (node, entry) in self.list.iter() {
            let f = self.freq.get(&entry.key).copied().unwrap_or(0);
            if f < victim_freq {
                victim_freq = f;
                victim = Some(node);
            }
        }
        let Some(node) = victim else {
            return false;
        };
        // SAFETY: `node` came from iterating `self.list` just above and is
        // still attached to it.
        let removed = unsafe { self.list.remove(node) };
        // SAFETY: uniquely owned after detaching.
        let entry = unsafe { removed.into_value() };
        self.map.remove(&entry.key);
        self.used_bytes -= entry.size;
        true
    }
}

impl<K: Clone + Hash + Eq> ReplacementPolicy<K> for LfuSet<K> {
    fn touch(&mut self, key: &K, _size: u64, _now: u64) {
        *self.freq.entry(key.clone()).or_insert(0) += 1;
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn write(&mut self, key: K, size: u64) -> Entry<K> {
        if self.map.contains_key(&key) {
            return Entry::new(key, size);
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
    fn evicts_least_frequent() {
        let mut set = LfuSet::<&str>::new(10);
        set.write("a", 4);
        set.write("b", 4);
        // bump a's frequency well above b's
        for _ in 0..5 {
            set.touch(&"a", 4, 0);
        }
        set.touch(&"b", 4, 0);
        set.touch(&"c", 4, 0);
        set.write("c", 4); // forces an eviction; b has the lowest frequency
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
        assert!(set.contains("c"));
    }

    #[test]
    fn ties_break_by_scan_order() {
        let mut set = LfuSet::<&str>::new(8);
        set.write("a", 4);
        set.write("b", 4);
        // both have equal (zero) frequency; a was inserted first
        set.write("c", 4);
        assert!(!set.contains("a"));
        assert!(set.contains("b"));
        assert!(set.contains("c"));
    }
}
