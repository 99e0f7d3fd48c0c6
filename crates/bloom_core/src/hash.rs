//! Kirsch–Mitzenmacher double hashing: two xxh32 seeds drive all k probes.

use crate::consts::HASH_SEED;
use xxhash_rust::xxh32::xxh32;

/// Two seeds for `buf`; the second hash is seeded with the first.
#[inline]
pub fn seeds(buf: &[u8]) -> (u32, u32) {
    let a = xxh32(buf, HASH_SEED);
    let b = xxh32(buf, a);
    (a, b)
}

/// Probe positions `(a + i*b) mod bits` for `i in 0..hashes`.
///
/// Computed in 64 bits so filters larger than 2^32 bits are fully addressed.
#[inline]
pub fn probes(buf: &[u8], hashes: u8, bits: u64) -> impl Iterator<Item = u64> {
    debug_assert!(bits > 0);
    let (a, b) = seeds(buf);
    let (a, b) = (u64::from(a), u64::from(b));
    (0..u64::from(hashes)).map(move |i| (a + i * b) % bits)
}
