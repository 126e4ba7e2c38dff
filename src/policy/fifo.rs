//! FIFO: insertion-ordered; a hit does not reorder. Victim is always the
//! oldest resident (spec §4.2 "FIFO").

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
pub struct FifoSet<K: Clone + Hash + Eq> {
    capacity_bytes: u64,
    pub(crate) used_bytes: u64,
    list: List<Entry<K>>,
    map: HashMap<K, *mut ListEntry<Entry<K>>>,
}

impl<K: Clone + Hash + Eq> FifoSet<K> {
    pub fn new(capacity_bytes: u64) -> Self {
        FifoSet {
            capacity_bytes,
            used_bytes: 0,
            list: List::new(),
            map: HashMap::new(),
        }
    }
}

impl<K: Clone + Hash + Eq> ReplacementPolicy<K> for FifoSet<K> {
    fn touch(&mut self, _key: &K, _size: u64, _now: u64) {}

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
            let Some(evicted) = self.list.remove_first() else {
                break;
            };
            // SAFETY: uniquely owned after detaching from the list.
            let evicted_entry = unsafe { evicted.into_value() };
            self.map.remove(&evicted_entry.key);
            self.used_bytes -= evicted_entry.size;
        }

        Entry::new(key, size)
    }
}
