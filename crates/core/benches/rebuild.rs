//! Rebuild benchmark: cost of recomputing the collaborative model.
//! Every rating submission triggers a full rebuild, so this is the write-path latency.
//!
//! Usage: cargo bench --bench rebuild

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smarttour_core::catalog::{Catalog, Item};
use smarttour_core::collaborative::CollaborativeModel;
use smarttour_core::ratings::Rating;
use std::time::Instant;

const STATES: [&str; 4] = ["kedah", "penang", "perak", "sabah"];
const CATEGORIES: [&str; 4] = ["beach", "nature", "museum", "island"];

fn synthetic_ratings(users: usize, items: u32, per_user: usize) -> Vec<Rating> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut ratings = Vec::with_capacity(users * per_user);
    for u in 0..users {
        for _ in 0..per_user {
            ratings.push(Rating {
                user_id: format!("user{u}"),
                item_id: rng.gen_range(1..=items),
                score: rng.gen_range(1..=5),
            });
        }
    }
    ratings
}

fn synthetic_catalog(items: u32) -> Catalog {
    Catalog::new((1..=items).map(|id| {
        Item::new(
            id,
            &format!("Place {id}"),
            CATEGORIES[id as usize % CATEGORIES.len()],
            STATES[id as usize % STATES.len()],
        )
    }))
}

fn main() {
    println!("=== Collaborative model rebuild ===");
    println!();
    println!("  users | items | ratings | rebuild (ms) | score (us/user)");
    println!("  ------+-------+---------+--------------+----------------");

    for &(users, items, per_user) in &[(50, 100, 10), (200, 500, 20), (1000, 2000, 20)] {
        let ratings = synthetic_ratings(users, items, per_user);
        let catalog = synthetic_catalog(items);

        let rounds = 5;
        let t0 = Instant::now();
        let mut model = CollaborativeModel::default();
        for _ in 0..rounds {
            model = CollaborativeModel::build(&ratings);
        }
        let rebuild_ms = t0.elapsed().as_secs_f64() * 1000.0 / rounds as f64;

        let queries = users.min(100);
        let t0 = Instant::now();
        let mut returned = 0usize;
        for u in 0..queries {
            returned += model
                .score(&format!("user{u}"), &catalog, 10, None)
                .len();
        }
        let score_us = t0.elapsed().as_secs_f64() * 1e6 / queries as f64;

        println!(
            "  {users:>5} | {items:>5} | {:>7} | {rebuild_ms:>12.2} | {score_us:>14.1}",
            ratings.len()
        );
        assert!(returned > 0);
    }
}
