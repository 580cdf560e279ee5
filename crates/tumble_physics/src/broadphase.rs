//! Broadphase: cheap AABB culling of body pairs before narrowphase

use serde::{Deserialize, Serialize};

use crate::shapes::Aabb;

/// Strategy for finding candidate pairs
///
/// Both strategies return the same pairs in the same order; sweep-and-prune
/// just gets there faster when bodies are spread out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Broadphase {
    /// Test every pair
    BruteForce,
    /// Sort by min x and sweep
    #[default]
    SweepAndPrune,
}

impl Broadphase {
    /// Overlapping index pairs `(i, j)` with `i < j`, sorted
    pub fn candidate_pairs(&self, bounds: &[Aabb]) -> Vec<(usize, usize)> {
        match self {
            Broadphase::BruteForce => brute_force(bounds),
            Broadphase::SweepAndPrune => sweep_and_prune(bounds),
        }
    }
}

fn brute_force(bounds: &[Aabb]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..bounds.len() {
        for j in (i + 1)..bounds.len() {
            if bounds[i].overlaps(&bounds[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

fn sweep_and_prune(bounds: &[Aabb]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..bounds.len()).collect();
    order.sort_by(|&a, &b| {
        bounds[a]
            .min
            .x
            .total_cmp(&bounds[b].min.x)
            .then(a.cmp(&b))
    });

    let mut pairs = Vec::new();
    let mut active: Vec<usize> = Vec::new();
    for &i in &order {
        // Drop boxes that end before this one starts on the sweep axis
        active.retain(|&j| bounds[j].max.x >= bounds[i].min.x);
        for &j in &active {
            if bounds[i].overlaps(&bounds[j]) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
        active.push(i);
    }

    pairs.sort_unstable();
    pairs
}
