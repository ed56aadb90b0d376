//! Generation-time perfect hashing (hash and displace).
//!
//! Keys are spread over buckets with a seed-0 hash. Buckets are then placed
//! largest first: for each bucket the smallest seed is searched such that
//! every key of the bucket hashes, under that seed, to a distinct free slot.
//! Lookup is two hashes and one comparison:
//!
//! ```text
//! seed = seeds[fnv1a(0, key) % buckets]
//! slot = slots[fnv1a(seed, key) % slots.len()]
//! hit  = slot is occupied && keys[slot] == key
//! ```
//!
//! The generated C lookup performs exactly the same computation, so the
//! tables built here are written out verbatim.

use crate::error::{CodegenError, CodegenResult};

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Upper bound on the seed search for a single bucket.
const MAX_SEED: u32 = 1 << 20;

/// 32-bit FNV-1a with the offset basis perturbed by `seed`.
pub fn fnv1a(seed: u32, key: &[u8]) -> u32 {
    let mut h = FNV_OFFSET ^ seed;
    for &b in key {
        h ^= u32::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// A collision-free table over a fixed key set.
#[derive(Debug, Clone)]
pub struct PerfectHash {
    keys: Vec<String>,
    seeds: Vec<u32>,
    /// Index into `keys`, or `None` for an empty slot.
    slots: Vec<Option<usize>>,
}

impl PerfectHash {
    /// Build a table over `keys`, which must be distinct.
    pub fn build(keys: &[&str]) -> CodegenResult<Self> {
        let n = keys.len();
        let nbuckets = n.div_ceil(4).max(1);
        let nslots = (n + n / 4).max(1);

        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); nbuckets];
        for (i, k) in keys.iter().enumerate() {
            buckets[fnv1a(0, k.as_bytes()) as usize % nbuckets].push(i);
        }
        let mut order: Vec<usize> = (0..nbuckets).collect();
        order.sort_by(|&a, &b| buckets[b].len().cmp(&buckets[a].len()).then(a.cmp(&b)));

        let mut seeds = vec![0u32; nbuckets];
        let mut slots: Vec<Option<usize>> = vec![None; nslots];
        for b in order {
            let members = &buckets[b];
            if members.is_empty() {
                continue;
            }
            let placed = (1..MAX_SEED).find_map(|seed| {
                let mut taken = Vec::with_capacity(members.len());
                for &i in members {
                    let s = fnv1a(seed, keys[i].as_bytes()) as usize % nslots;
                    if slots[s].is_some() || taken.contains(&s) {
                        return None;
                    }
                    taken.push(s);
                }
                Some((seed, taken))
            });
            let Some((seed, taken)) = placed else {
                return Err(CodegenError::PerfectHash { keys: n });
            };
            seeds[b] = seed;
            for (&i, s) in members.iter().zip(taken) {
                slots[s] = Some(i);
            }
        }

        Ok(Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            seeds,
            slots,
        })
    }

    /// Index (into the build keys) of `key`, if present.
    pub fn lookup(&self, key: &str) -> Option<usize> {
        let seed = self.seeds[fnv1a(0, key.as_bytes()) as usize % self.seeds.len()];
        let slot = fnv1a(seed, key.as_bytes()) as usize % self.slots.len();
        self.slots[slot].filter(|&i| self.keys[i] == key)
    }

    pub fn seeds(&self) -> &[u32] {
        &self.seeds
    }

    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}
