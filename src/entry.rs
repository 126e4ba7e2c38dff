//! The resident-entry type shared by every replacement policy.
//!
//! Mirrors the original implementation's `CacheEntry`, but fixes the bug
//! noted during porting: there, `size` was declared on the entry but never
//! actually populated (sizes lived only in a sidecar map). Here `size` is
//! always set at construction and is the value every policy accounts
//! against `used_bytes`.
//!
//! The optional `meta` slot is the same idea as the library's `meta`
//! module: per-policy bookkeeping (a frequency counter, a small timestamp
//! ring, a precomputed NRT) that rides along with the entry instead of
//! living in a second, easy-to-desync hash map.

/// A single resident object: identity, validity, size, and whatever a
/// policy needs to remember about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<K, M = ()> {
    pub key: K,
    /// `false` means "constructed but never actually admitted" — used by
    /// the Belady family to represent a rejected contender without a
    /// separate `Option`.
    pub valid: bool,
    pub size: u64,
    pub meta: M,
}

impl<K> Entry<K, ()> {
    #[inline]
    pub fn new(key: K, size: u64) -> Self {
        Entry {
            key,
            valid: true,
            size,
            meta: (),
        }
    }
}

impl<K, M> Entry<K, M> {
    #[inline]
    pub fn with_meta(key: K, size: u64, meta: M) -> Self {
        Entry {
            key,
            valid: true,
            size,
            meta,
        }
    }

    /// Constructs a rejected (never-admitted) entry, per Belady's
    /// admission-reject semantics.
    #[inline]
    pub fn rejected(key: K, size: u64, meta: M) -> Self {
        Entry {
            key,
            valid: false,
            size,
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_valid() {
        let e: Entry<&str> = Entry::new("k", 4);
        assert!(e.valid);
        assert_eq!(e.size, 4);
    }

    #[test]
    fn rejected_entry_is_invalid() {
        let e = Entry::rejected("k", 4, 7u32);
        assert!(!e.valid);
        assert_eq!(e.meta, 7);
    }
}
