//! The pluggable replacement-policy abstraction (spec §4.1/§4.2).
//!
//! [`ReplacementPolicy`] is the capability interface every policy
//! implements; [`CacheSet`] is a tagged enum selecting among the seven (plus
//! the PBS variant) concrete implementations and dispatching to them
//! without virtual-call overhead in the hot path, per the two options design
//! note §9 offers ("trait / capability interface ... or a tagged enum
//! dispatch. Either captures the five required operations").
//!
//! Every concrete policy owns its *own* `used_bytes`/`capacity_bytes`
//! accounting rather than sharing one generic eviction loop, because the
//! eviction protocol genuinely differs per policy: most admit the new key
//! first and then evict residents, but Belady/Belady-Size must be able to
//! reject the new key itself mid-loop (see [`belady`]).

extern crate alloc;

use crate::entry::Entry;
use core::hash::Hash;

pub mod belady;
pub mod belady_size;
pub mod fifo;
pub mod lfu;
pub mod lru;
pub mod lruk;
pub mod pblru;
pub mod twoq;

/// The five operations every replacement policy exposes to the cache-set
/// contract (spec §4.1). `writeq` has a uniform default: for every shipped
/// policy, committing a coalesced fetch's queue is equivalent to writing
/// just its last (most recent) packet.
pub trait ReplacementPolicy<K: Clone + Hash + Eq> {
    /// Called on every request before classification. Must not admit or
    /// evict; only updates bookkeeping (frequency, recency, oracle cursor).
    fn touch(&mut self, key: &K, size: u64, now: u64);

    fn contains(&self, key: &K) -> bool;

    /// Idempotent admission. Refreshes `key`'s position if already
    /// resident; otherwise inserts and evicts until back under capacity.
    /// A rejected admission (Belady family) comes back with `valid = false`
    /// and was never actually inserted.
    fn write(&mut self, key: K, size: u64) -> Entry<K>;

    /// One-time setup for oracle policies that need the full trace ahead
    /// of replay. A no-op for every non-oracle policy.
    fn init_trace(&mut self, _ordered_keys: &[K]) {}

    fn writeq(&mut self, last_key: K, last_size: u64) -> Entry<K> {
        self.write(last_key, last_size)
    }
}

/// Selects which concrete policy a `CacheSet` runs. Also the CLI's
/// `--policy` vocabulary (see `dhcache-sim`'s gap-fill, SPEC_FULL.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Lru,
    Lfu,
    Fifo,
    TwoQ,
    LruK,
    Belady,
    BeladySize,
    PbLru,
    Pbs,
}

impl PolicyKind {
    /// Canonical name used in result-file and packet-dump headers (spec
    /// §6), following the original's one-class-per-policy `name()` method.
    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Lru => "LRUCache",
            PolicyKind::Lfu => "LFUCache",
            PolicyKind::Fifo => "FIFOCache",
            PolicyKind::TwoQ => "TwoQCache",
            PolicyKind::LruK => "LRUKCache",
            PolicyKind::Belady => "BeladyCache",
            PolicyKind::BeladySize => "BeladySCache",
            PolicyKind::PbLru => "PBLCache",
            PolicyKind::Pbs => "PBSCache",
        }
    }

    pub fn requires_trace_prescan(self) -> bool {
        matches!(self, PolicyKind::Belady | PolicyKind::BeladySize)
    }

    pub fn from_str(s: &str) -> Option<PolicyKind> {
        match s {
            "lru" => Some(PolicyKind::Lru),
            "lfu" => Some(PolicyKind::Lfu),
            "fifo" => Some(PolicyKind::Fifo),
            "2q" => Some(PolicyKind::TwoQ),
            "lruk" => Some(PolicyKind::LruK),
            "belady" => Some(PolicyKind::Belady),
            "belady-size" => Some(PolicyKind::BeladySize),
            "pblru" => Some(PolicyKind::PbLru),
            "pbs" => Some(PolicyKind::Pbs),
            _ => None,
        }
    }
}

/// A tagged union over the concrete replacement-policy implementations.
/// `K` is the key type (the simulator binary instantiates this as
/// `Arc<str>`; see SPEC_FULL.md §3).
#[derive(Debug)]
pub enum CacheSet<K: Clone + Hash + Eq> {
    Lru(lru::LruSet<K>),
    Lfu(lfu::LfuSet<K>),
    Fifo(fifo::FifoSet<K>),
    TwoQ(twoq::TwoQSet<K>),
    LruK(lruk::LruKSet<K>),
    Belady(belady::BeladySet<K>),
    BeladySize(belady_size::BeladySizeSet<K>),
    Pb(pblru::PbSet<K>),
}

impl<K: Clone + Hash + Eq> CacheSet<K> {
    /// `z` (base miss latency) and `bandwidth` (bytes/cycle) only matter to
    /// the PB-LRU/PBS payoff formula (spec §4.2); every other policy ignores
    /// them. Both come from the engine's own configuration (spec §3), so
    /// threading them through construction keeps the cache-set contract
    /// itself free of clock/bandwidth parameters, per spec §4.1.
    pub fn new(kind: PolicyKind, capacity_bytes: u64, z: u64, bandwidth: u64) -> Self {
        match kind {
            PolicyKind::Lru => CacheSet::Lru(lru::LruSet::new(capacity_bytes)),
            PolicyKind::Lfu => CacheSet::Lfu(lfu::LfuSet::new(capacity_bytes)),
            PolicyKind::Fifo => CacheSet::Fifo(fifo::FifoSet::new(capacity_bytes)),
            PolicyKind::TwoQ => CacheSet::TwoQ(twoq::TwoQSet::new(capacity_bytes)),
            PolicyKind::LruK => CacheSet::LruK(lruk::LruKSet::new(capacity_bytes)),
            PolicyKind::Belady => CacheSet::Belady(belady::BeladySet::new(capacity_bytes)),
            PolicyKind::BeladySize => {
                CacheSet::BeladySize(belady_size::BeladySizeSet::new(capacity_bytes))
            }
            PolicyKind::PbLru => CacheSet::Pb(pblru::PbSet::new(
                capacity_bytes,
                pblru::PbVariant::Lru,
                z,
                bandwidth,
            )),
            PolicyKind::Pbs => CacheSet::Pb(pblru::PbSet::new(
                capacity_bytes,
                pblru::PbVariant::Pbs,
                z,
                bandwidth,
            )),
        }
    }

    pub fn touch(&mut self, key: &K, size: u64, now: u64) {
        match self {
            CacheSet::Lru(s) => s.touch(key, size, now),
            CacheSet::Lfu(s) => s.touch(key, size, now),
            CacheSet::Fifo(s) => s.touch(key, size, now),
            CacheSet::TwoQ(s) => s.touch(key, size, now),
            CacheSet::LruK(s) => s.touch(key, size, now),
            CacheSet::Belady(s) => s.touch(key, size, now),
            CacheSet::BeladySize(s) => s.touch(key, size, now),
            CacheSet::Pb(s) => s.touch(key, size, now),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match self {
            CacheSet::Lru(s) => s.contains(key),
            CacheSet::Lfu(s) => s.contains(key),
            CacheSet::Fifo(s) => s.contains(key),
            CacheSet::TwoQ(s) => s.contains(key),
            CacheSet::LruK(s) => s.contains(key),
            CacheSet::Belady(s) => s.contains(key),
            CacheSet::BeladySize(s) => s.contains(key),
            CacheSet::Pb(s) => s.contains(key),
        }
    }

    pub fn write(&mut self, key: K, size: u64) -> Entry<K> {
        match self {
            CacheSet::Lru(s) => s.write(key, size),
            CacheSet::Lfu(s) => s.write(key, size),
            CacheSet::Fifo(s) => s.write(key, size),
            CacheSet::TwoQ(s) => s.write(key, size),
            CacheSet::LruK(s) => s.write(key, size),
            CacheSet::Belady(s) => s.write(key, size),
            CacheSet::BeladySize(s) => s.write(key, size),
            CacheSet::Pb(s) => s.write(key, size),
        }
    }

    pub fn writeq(&mut self, last_key: K, last_size: u64) -> Entry<K> {
        match self {
            CacheSet::Lru(s) => s.writeq(last_key, last_size),
            CacheSet::Lfu(s) => s.writeq(last_key, last_size),
            CacheSet::Fifo(s) => s.writeq(last_key, last_size),
            CacheSet::TwoQ(s) => s.writeq(last_key, last_size),
            CacheSet::LruK(s) => s.writeq(last_key, last_size),
            CacheSet::Belady(s) => s.writeq(last_key, last_size),
            CacheSet::BeladySize(s) => s.writeq(last_key, last_size),
            CacheSet::Pb(s) => s.writeq(last_key, last_size),
        }
    }

    pub fn init_trace(&mut self, ordered_keys: &[K]) {
        match self {
            CacheSet::Belady(s) => s.init_trace(ordered_keys),
            CacheSet::BeladySize(s) => s.init_trace(ordered_keys),
            _ => {}
        }
    }

    /// Current resident byte total, for the packet-dump header (spec §6).
    pub fn used_bytes(&self) -> u64 {
        match self {
            CacheSet::Lru(s) => s.used_bytes,
            CacheSet::Lfu(s) => s.used_bytes,
            CacheSet::Fifo(s) => s.used_bytes,
            CacheSet::TwoQ(s) => s.used_bytes(),
            CacheSet::LruK(s) => s.used_bytes,
            CacheSet::Belady(s) => s.used_bytes,
            CacheSet::BeladySize(s) => s.used_bytes,
            CacheSet::Pb(s) => s.used_bytes,
        }
    }
}

