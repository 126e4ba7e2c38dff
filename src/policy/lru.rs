//! LRU: victim is the least-recently-used resident key; a hit moves its
//! key to the hot end of the list (spec §4.2 "LRU").

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
pub struct LruSet<K: Clone + Hash + Eq> {
    capacity_bytes: u64,
    pub(crate) used_bytes: u64,
    list: List<Entry<K>>,
    map: HashMap<K, *mut ListEntry<Entry<K>>>,
}

impl<K: Clone + Hash + Eq> LruSet<K> {
    pub fn new(capacity_bytes: u64) -> Self {
        LruSet {
            capacity_bytes,
            used_bytes: 0,
            list: List::new(),
            map: HashMap::new(),
        }
    }
}

impl<K: Clone + Hash + Eq> ReplacementPolicy<K> for LruSet<K> {
    fn touch(&mut self, _key: &K, _size: u64, _now: u64) {
        // LRU needs no bookkeeping outside of residency itself.
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn write(&mut self, key: K, size: u64) -> Entry<K> {
        if let Some(&node) = self.map.get(&key) {
            // SAFETY: node came from `self.map` and is still attached.
            unsafe { self.list.move_to_back(node) };
            return Entry::new(key, size);
        }

        let node = self.list.push_back(Entry::new(key.clone(), size));
        self.map.insert(key.clone(), node);
        self.used_bytes += size;

        while self.used_bytes > self.capacity_bytes {
            let Some(evicted) = self.list.remove_first() else {
                break;
            };
            // SAFETY: `evicted` was detached from the list and is
            // uniquely owned here; its value was never read elsewhere.
            let evicted_entry = unsafe { evicted.into_value() };
            self.map.remove(&evicted_entry.key);
            self.used_bytes -= evicted_entry.size;
        }

        Entry::new(key, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_refreshes_recency() {
        let mut set = LruSet::<&str>::new(10);
        set.write("a", 4);
        set.write("b", 4);
        set.write("a", 4); // refresh a
        set.write("c", 4); // should evict b, not a
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
        assert!(set.contains("c"));
    }

    #[test]
    fn eviction_keeps_capacity_bound() {
        let mut set = LruSet::<&str>::new(10);
        set.write("a", 4);
        set.write("b", 4);
        set.write("c", 4);
        assert!(set.used_bytes <= 10);
        assert!(!set.contains("a"));
    }
}
