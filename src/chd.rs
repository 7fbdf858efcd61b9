//! CHD (Compress, Hash and Displace) minimal perfect hash builder.
//!
//! Keys are grouped into buckets of average size `LAMBDA`; buckets are
//! placed largest-first, each searching for a displacement pair `(d1, d2)`
//! that sends every key in the bucket to a free slot. A generation-stamped
//! scratch buffer avoids clearing state between failed attempts.

use alloc::vec;
use alloc::vec::Vec;

use crate::siphash::siphash13_128;

pub const LAMBDA: usize = 5;

/// The three values derived from hashing a key under a given seed.
pub(crate) struct Hashes {
    pub(crate) g: u32,
    pub(crate) f1: u32,
    pub(crate) f2: u32,
}

pub(crate) fn hash_key(seed: u32, key: &[u8]) -> Hashes {
    let (low, high) = siphash13_128(seed, key);
    Hashes {
        f1: (low & 0xffff_ffff) as u32,
        f2: (high & 0xffff_ffff) as u32,
        g: (low >> 32) as u32,
    }
}

/// `(f1 * d1 + d2 + f2) mod 2^32`, the displacement function CHD uses to
/// spread a bucket's keys across the slot table.
pub fn displace(f1: u32, f2: u32, d1: u32, d2: u32) -> u32 {
    f1.wrapping_mul(d1).wrapping_add(d2).wrapping_add(f2)
}

/// The result of a successful CHD build: per-bucket displacement pairs, and
/// the slot each original key index landed in.
pub struct ChdState {
    pub seed: u32,
    pub bucket_count: usize,
    /// Indexed by bucket number.
    pub displacements: Vec<(u32, u32)>,
    /// `slot_to_key[slot]` is the original index of the key occupying that
    /// slot, for `slot < n`.
    pub slot_to_key: Vec<u32>,
}

/// Attempts one CHD build at a fixed seed. Returns `None` if no `(d1, d2)`
/// pair clears every bucket's collisions within the search bound.
pub fn try_build(keys: &[&[u8]], seed: u32) -> Option<ChdState> {
    let n = keys.len();
    if n == 0 {
        return Some(ChdState {
            seed,
            bucket_count: 0,
            displacements: Vec::new(),
            slot_to_key: Vec::new(),
        });
    }

    let bucket_count = (n + LAMBDA - 1) / LAMBDA;
    let hashes: Vec<Hashes> = keys.iter().map(|k| hash_key(seed, k)).collect();

    let mut buckets: Vec<Vec<u32>> = vec![Vec::new(); bucket_count];
    for (idx, h) in hashes.iter().enumerate() {
        let b = (h.g as usize) % bucket_count;
        buckets[b].push(idx as u32);
    }

    let mut bucket_order: Vec<usize> = (0..bucket_count).collect();
    bucket_order.sort_by(|&a, &b| buckets[b].len().cmp(&buckets[a].len()));

    let mut displacements = vec![(0u32, 0u32); bucket_count];
    let mut slot_to_key: Vec<i64> = vec![-1; n];
    let mut occupied_generation: Vec<u32> = vec![0; n];
    let mut generation: u32 = 0;

    let search_bound = (n as u32).min(65_535).max(1);

    for &b in &bucket_order {
        let bucket = &buckets[b];
        if bucket.is_empty() {
            continue;
        }

        let mut found = false;
        'search: for d1 in 0..search_bound {
            for d2 in 0..search_bound {
                generation = generation.wrapping_add(1);
                let mut slots: Vec<u32> = Vec::with_capacity(bucket.len());
                let mut ok = true;

                for &key_idx in bucket {
                    let h = &hashes[key_idx as usize];
                    let slot = (displace(h.f1, h.f2, d1, d2) as usize) % n;

                    if occupied_generation[slot] == generation {
                        ok = false;
                        break;
                    }
                    if slot_to_key[slot] != -1 {
                        ok = false;
                        break;
                    }

                    occupied_generation[slot] = generation;
                    slots.push(slot as u32);
                }

                if ok {
                    for (i, &key_idx) in bucket.iter().enumerate() {
                        slot_to_key[slots[i] as usize] = key_idx as i64;
                    }
                    displacements[b] = (d1, d2);
                    found = true;
                    break 'search;
                }
            }
        }

        if !found {
            return None;
        }
    }

    let slot_to_key = slot_to_key.into_iter().map(|v| v as u32).collect();

    Some(ChdState {
        seed,
        bucket_count,
        displacements,
        slot_to_key,
    })
}

/// Retries `try_build` across successive seeds starting at `start_seed`,
/// giving up after `max_attempts`.
pub fn build_with_retry(keys: &[&[u8]], start_seed: u32, max_attempts: u32) -> Option<ChdState> {
    for attempt in 0..max_attempts {
        let seed = start_seed.wrapping_add(attempt);
        if let Some(state) = try_build(keys, seed) {
            return Some(state);
        }
    }
    None
}

/// Looks up `key` against a built table, returning the slot it would occupy
/// if present (CHD does not itself reject absent keys: callers must confirm
/// the key stored at that slot matches).
pub fn lookup_slot(
    seed: u32,
    bucket_count: usize,
    displacements: &[(u32, u32)],
    slot_count: usize,
    key: &[u8],
) -> usize {
    let h = hash_key(seed, key);
    let b = (h.g as usize) % bucket_count.max(1);
    let (d1, d2) = displacements[b];
    (displace(h.f1, h.f2, d1, d2) as usize) % slot_count.max(1)
}
