//! Stable randomized ordering for paged results.
//!
//! Random sort must not reshuffle between pages, or a client walking pages would see
//! duplicates and misses. Each (user, namespace) pair keeps a shuffle seed: a request
//! for the first page draws a fresh seed, subsequent offsets replay the same
//! permutation and slice further into it.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[derive(Default)]
pub struct Randomizer {
    seeds: Mutex<HashMap<(String, String), u64>>,
}

impl Randomizer {
    pub fn new() -> Randomizer {
        Randomizer::default()
    }

    /// Indices of the requested page within a randomized permutation of `0..total`.
    pub fn pick_indices(
        &self,
        total: usize,
        offset: usize,
        limit: Option<usize>,
        user_id: &str,
        namespace: &str,
    ) -> Vec<usize> {
        let key = (user_id.to_string(), namespace.to_string());
        let mut seeds = self.seeds.lock().unwrap();
        let seed = if offset == 0 {
            let seed = rand::thread_rng().gen();
            seeds.insert(key, seed);
            seed
        } else {
            *seeds.entry(key).or_insert_with(|| rand::thread_rng().gen())
        };
        drop(seeds);

        let mut indices: Vec<usize> = (0..total).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let end = match limit {
            Some(limit) => (offset + limit).min(total),
            None => total,
        };
        if offset >= end {
            return Vec::new();
        }
        indices[offset..end].to_vec()
    }
}
