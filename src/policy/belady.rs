//! Belady (oracle): requires the full trace up front via `init_trace`.
//! Victim is the resident key whose *next reference* is furthest in the
//! future (or never again, the `MaxLim` sentinel) — spec §4.2 "Belady".
//!
//! Resolves spec §9's open question on admission-reject semantics (see
//! SPEC_FULL.md §4.2): when admitting a new key would require an eviction,
//! and the new key's own next-reference-time is worse than every resident's,
//! the candidate is rejected outright — never inserted, never evicted after
//! the fact. This is checked once, before insertion, not as a second trip
//! through the eviction loop.

extern crate alloc;

use alloc::vec::Vec;
use crate::entry::Entry;
use crate::list::{List, ListEntry};
use crate::meta::OracleMeta;
use crate::policy::ReplacementPolicy;
use core::hash::Hash;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

#[derive(Debug)]
pub struct BeladySet<K: Clone + Hash + Eq> {
    capacity_bytes: u64,
    pub(crate) used_bytes: u64,
    refs: HashMap<K, Vec<u64>>,
    cursor: HashMap<K, usize>,
    nrt: HashMap<K, Option<u64>>,
    pos: u64,
    list: List<Entry<K, OracleMeta>>,
    map: HashMap<K, *mut ListEntry<Entry<K, OracleMeta>>>,
}

impl<K: Clone + Hash + Eq> BeladySet<K> {
    pub fn new(capacity_bytes: u64) -> Self {
        BeladySet {
            capacity_bytes,
            used_bytes: 0,
            refs: HashMap::new(),
            cursor: HashMap::new(),
            nrt: HashMap::new(),
            pos: 0,
            list: List::new(),
            map: HashMap::new(),
        }
    }

    /// Next reference position strictly after `at`, if any.
    fn next_ref(&mut self, key: &K, at: u64) -> Option<u64> {
        let idxs = self.refs.get(key)?;
        let cursor = self.cursor.entry(key.clone()).or_insert(0);
        while *cursor < idxs.len() && idxs[*cursor] <= at {
            *cursor += 1;
        }
        idxs.get(*cursor).copied()
    }
}

impl<K: Clone + Hash + Eq> ReplacementPolicy<K> for BeladySet<K> {
    fn touch(&mut self, key: &K, _size: u64, _now: u64) {
        let at = self.pos;
        self.pos += 1;
        let next = self.next_ref(key, at);
        self.nrt.insert(key.clone(), next);
        if let Some(&node) = self.map.get(key) {
            // SAFETY: node came from `map` and is still attached.
            unsafe { self.list.get_mut(node) }.meta.nrt = next;
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn write(&mut self, key: K, size: u64) -> Entry<K> {
        if self.map.contains_key(&key) {
            return Entry::new(key, size);
        }

        let new_nrt = self.nrt.get(&key).copied().flatten();
        let new_score = OracleMeta { nrt: new_nrt }.nrt_or_max();

        if self.used_bytes + size > self.capacity_bytes && !self.list.is_empty() {
            let worst_resident = self
                .list
                .iter()
                .map(|(_, e)| e.meta.nrt_or_max())
                .max()
                .unwrap_or(0);
            if new_score > worst_resident {
                return Entry::rejected(key, size, ());
            }
        }

        let node = self
            .list
            .push_back(Entry::with_meta(key.clone(), size, OracleMeta { nrt: new_nrt }));
        self.map.insert(key.clone(), node);
        self.used_bytes += size;

        while self.used_bytes > self.capacity_bytes {
            let mut victim: Option<*mut ListEntry<Entry<K, OracleMeta>>> = None;
            let mut victim_score = 0u64;
            for (n, e) in self.list.iter() {
                let s = e.meta.nrt_or_max();
                if victim.is_none() || s >= victim_score {
                    victim_score = s;
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

    fn init_trace(&mut self, ordered_keys: &[K]) {
        self.refs.clear();
        self.cursor.clear();
        for (i, k) in ordered_keys.iter().enumerate() {
            self.refs.entry(k.clone()).or_default().push(i as u64);
        }
    }
}
