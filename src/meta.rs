//! Per-policy metadata carried on an [`crate::entry::Entry`].
//!
//! Each replacement policy that needs more than key/size/validity defines
//! its metadata type here, the same way the original algorithm library kept
//! one metadata struct per algorithm (`LfuMeta`, `SlruMeta`, ...) instead of
//! growing one god-struct with every algorithm's fields.

extern crate alloc;

/// LFU: access frequency, incremented on every `touch` regardless of
/// residency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LfuMeta {
    pub frequency: u64,
}

impl LfuMeta {
    #[inline]
    pub fn increment(&mut self) -> u64 {
        self.frequency += 1;
        self.frequency
    }
}

/// LRU-K: the last up to `K` reference timestamps, newest last. Used to
/// compute `now - timestamps[0]` (the K-th-most-recent gap) once the ring
/// is full; entries with fewer than `K` references can't be victims yet
/// since nothing's in position `len - K` — the engine only admits keys that
/// already met the ghost-set frequency gate, so in practice a resident
/// entry always has a full ring by the time it's evictable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LruKMeta {
    pub timestamps: alloc::vec::Vec<u64>,
}

impl LruKMeta {
    pub fn record(&mut self, k: usize, now: u64) {
        self.timestamps.push(now);
        if self.timestamps.len() > k {
            self.timestamps.remove(0);
        }
    }

    /// `now - timestamps[0]`, i.e. the gap since the K-th most recent
    /// reference. Larger means "more overdue for eviction".
    pub fn kth_gap(&self, now: u64) -> u64 {
        self.timestamps.first().map_or(u64::MAX, |t0| now - t0)
    }
}

/// Belady / Belady-Size: the precomputed next-reference-time for a
/// resident key, refreshed on every `touch`. `None` means "no further
/// reference in the trace" (the sentinel `MaxLim` from the original).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleMeta {
    pub nrt: Option<u64>,
}

impl OracleMeta {
    /// Sentinel-aware ordering key: "never again" sorts as the largest
    /// possible value so it is always the preferred eviction victim.
    #[inline]
    pub fn nrt_or_max(&self) -> u64 {
        self.nrt.unwrap_or(u64::MAX)
    }
}

/// PB-LRU / PBS: the sliding inter-arrival window (last `L` = 20 gaps) and
/// the cycle of the most recent reference, from which `lrt` ("cycles since
/// last reference") and the arrival-rate estimate `lambda` are derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrivalMeta {
    pub gaps: alloc::collections::VecDeque<u64>,
    pub last_ref: u64,
}

const ARRIVAL_WINDOW: usize = 20;

impl ArrivalMeta {
    /// Records a reference at cycle `now`, pushing the inter-arrival gap
    /// into the sliding window.
    pub fn record(&mut self, now: u64) {
        if now > self.last_ref || (!self.gaps.is_empty() || self.last_ref != 0) {
            let gap = now.saturating_sub(self.last_ref);
            self.gaps.push_back(gap);
            if self.gaps.len() > ARRIVAL_WINDOW {
                self.gaps.pop_front();
            }
        }
        self.last_ref = now;
    }

    /// Arrival-rate estimate `1 / mean(gaps)`. The original only trusts
    /// this once at least 3 samples are available, falling back to a tiny
    /// epsilon rate (an effectively-infinite inter-arrival time)
    /// beforehand so a brand new key doesn't look artificially hot.
    pub fn lambda(&self) -> f64 {
        if self.gaps.len() < 3 {
            return 0.000_000_01;
        }
        let sum: u64 = self.gaps.iter().sum();
        let mean = sum as f64 / self.gaps.len() as f64;
        if mean <= 0.0 {
            1.0
        } else {
            1.0 / mean
        }
    }

    pub fn lrt(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_ref) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lfu_increments() {
        let mut m = LfuMeta::default();
        assert_eq!(m.increment(), 1);
        assert_eq!(m.increment(), 2);
    }

    #[test]
    fn lruk_kth_gap_tracks_ring() {
        let mut m = LruKMeta::default();
        for t in [1, 5, 9, 20] {
            m.record(4, t);
        }
        // ring full at [1,5,9,20]; kth_gap(now) = now - 1
        assert_eq!(m.kth_gap(25), 24);
        m.record(4, 30);
        // ring is now [5,9,20,30]
        assert_eq!(m.kth_gap(35), 30);
    }

    #[test]
    fn oracle_meta_sentinel_sorts_highest() {
        let never = OracleMeta { nrt: None };
        let soon = OracleMeta { nrt: Some(3) };
        assert!(never.nrt_or_max() > soon.nrt_or_max());
    }

    #[test]
    fn arrival_lambda_needs_three_samples() {
        let mut m = ArrivalMeta::default();
        m.record(0);
        m.record(10);
        assert!((m.lambda() - 0.000_000_01).abs() < f64::EPSILON);
        m.record(20);
        assert!(m.lambda() > 0.0);
    }
}
