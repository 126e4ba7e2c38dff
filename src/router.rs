//! Hash routing: maps a key to one of `N` cache-sets.
//!
//! The original keyed this off MurmurHash3's 128-bit digest (taking the
//! low 64 bits), with a shortcut for the single-set case that avoids
//! hashing a key only to immediately discard the result. No crate in this
//! workspace carries a MurmurHash3 implementation, so it's hand-rolled here
//! — the standard public-domain x64_128 variant, seeded with zero.

extern crate alloc;

use alloc::vec::Vec;
use core::hash::{Hash, Hasher};

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// MurmurHash3 x64_128, seed 0, returning the low 64 bits of the digest —
/// exactly what the original's `HashFamily` used as a cache-set index.
fn murmur3_x64_128_low(data: &[u8]) -> u64 {
    let len = data.len();
    let nblocks = len / 16;
    let mut h1: u64 = 0;
    let mut h2: u64 = 0;

    for block in data[..nblocks * 16].chunks_exact(16) {
        let mut k1 = u64::from_le_bytes(block[0..8].try_into().unwrap());
        let mut k2 = u64::from_le_bytes(block[8..16].try_into().unwrap());

        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
        h1 = h1.rotate_left(27).wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
        h2 ^= k2;
        h2 = h2.rotate_left(31).wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    let tail = &data[nblocks * 16..];
    let mut k1: u64 = 0;
    let mut k2: u64 = 0;
    if tail.len() > 8 {
        for i in (8..tail.len()).rev() {
            k2 ^= (tail[i] as u64) << ((i - 8) * 8);
        }
        k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
        h2 ^= k2;
        for i in (0..8).rev() {
            k1 ^= (tail[i] as u64) << (i * 8);
        }
        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
    } else if !tail.is_empty() {
        for i in (0..tail.len()).rev() {
            k1 ^= (tail[i] as u64) << (i * 8);
        }
        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= len as u64;
    h2 ^= len as u64;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    // h2 is discarded on purpose: the original index is derived from the
    // low 64 bits only.
    h1
}

/// A `core::hash::Hasher` wrapping [`murmur3_x64_128_low`] so any
/// `K: Hash` key can be routed without requiring `AsRef<[u8]>`.
#[derive(Default)]
struct MurmurHasher {
    buf: Vec<u8>,
}

impl Hasher for MurmurHasher {
    fn finish(&self) -> u64 {
        murmur3_x64_128_low(&self.buf)
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// Maps `key` to a cache-set index in `0..num_sets`.
///
/// `num_sets <= 1` always routes to set 0 without hashing, matching the
/// original's shortcut (and the default CLI configuration, where
/// `csa = 0` degenerates to exactly one set).
pub fn route<K: Hash>(key: &K, num_sets: usize) -> usize {
    if num_sets <= 1 {
        return 0;
    }
    let mut hasher = MurmurHasher::default();
    key.hash(&mut hasher);
    (hasher.finish() % num_sets as u64) as usize
}
