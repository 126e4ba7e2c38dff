//! 2Q: a FIFO probation region feeds a promoted LRU region. A key survives
//! two "rounds" (once through FIFO, then promoted) before it earns
//! recency-based treatment, which gives scan resistance LRU alone lacks
//! (spec §4.2 "2Q").

extern crate alloc;

use crate::entry::Entry;
use crate::list::{List, ListEntry};
use crate::policy::ReplacementPolicy;
use core::hash::Hash;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Fraction of capacity given to the promoted LRU region.
const P: f64 = 0.9;

#[derive(Debug)]
pub struct TwoQSet<K: Clone + Hash + Eq> {
    lru_capacity: u64,
    fifo_capacity: u64,
    used_lru: u64,
    used_fifo: u64,
    lru_list: List<Entry<K>>,
    lru_map: HashMap<K, *mut ListEntry<Entry<K>>>,
    fifo_list: List<Entry<K>>,
    fifo_map: HashMap<K, *mut ListEntry<Entry<K>>>,
}

impl<K: Clone + Hash + Eq> TwoQSet<K> {
    pub fn new(capacity_bytes: u64) -> Self {
        let lru_capacity = (capacity_bytes as f64 * P).round() as u64;
        let fifo_capacity = capacity_bytes.saturating_sub(lru_capacity);
        TwoQSet {
            lru_capacity,
            fifo_capacity,
            used_lru: 0,
            used_fifo: 0,
            lru_list: List::new(),
            lru_map: HashMap::new(),
            fifo_list: List::new(),
            fifo_map: HashMap::new(),
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_lru + self.used_fifo
    }

    fn promote(&mut self, key: K, size: u64) {
        let node = self.lru_list.push_back(Entry::new(key.clone(), size));
        self.lru_map.insert(key, node);
        self.used_lru += size;
        while self.used_lru > self.lru_capacity {
            let Some(evicted) = self.lru_list.remove_first() else {
                break;
            };
            // SAFETY: uniquely owned after detaching.
            let entry = unsafe { evicted.into_value() };
            self.lru_map.remove(&entry.key);
            self.used_lru -= entry.size;
        }
    }
}

impl<K: Clone + Hash + Eq> ReplacementPolicy<K> for TwoQSet<K> {
    fn touch(&mut self, _key: &K, _size: u64, _now: u64) {}

    fn contains(&self, key: &K) -> bool {
        self.lru_map.contains_key(key) || self.fifo_map.contains_key(key)
    }

    fn write(&mut self, key: K, size: u64) -> Entry<K> {
        if let Some(&node) = self.lru_map.get(&key) {
            // SAFETY: node came from `lru_map` and is still attached.
            unsafe { self.lru_list.move_to_back(node) };
            return Entry::new(key, size);
        }

        if let Some(node) = self.fifo_map.remove(&key) {
            // SAFETY: `node` is still attached to `fifo_list`.
            let removed = unsafe { self.fifo_list.remove(node) };
            // SAFETY: uniquely owned after detaching.
            let entry = unsafe { removed.into_value() };
            self.used_fifo -= entry.size;
            self.promote(key.clone(), size);
            return Entry::new(key, size);
        }

        let node = self.fifo_list.push_back(Entry::new(key.clone(), size));
        self.fifo_map.insert(key.clone(), node);
        self.used_fifo += size;
        while self.used_fifo >= self.fifo_capacity {
            let Some(evicted) = self.fifo_list.remove_first() else {
                break;
            };
            // SAFETY: uniquely owned after detaching.
            let entry = unsafe { evicted.into_value() };
            self.fifo_map.remove(&entry.key);
            self.used_fifo -= entry.size;
        }

        Entry::new(key, size)
    }
}
