#![allow(dead_code)]

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Counts drawn uniformly from `0..=max_count`.
pub fn uniform_histogram(groups: usize, max_count: u32, seed: u64) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    uniform_histogram_with_rng(groups, max_count, &mut rng)
}

pub fn uniform_histogram_with_rng<R: Rng + ?Sized>(
    groups: usize,
    max_count: u32,
    rng: &mut R,
) -> Vec<u32> {
    (0..groups).map(|_| rng.gen_range(0..=max_count)).collect()
}

/// Route `tokens` items to `groups` groups, each item landing on group `i`
/// with weight proportional to `1 / (i + 1)^skew`.
///
/// `skew = 0` is uniform routing; larger values concentrate load on the
/// first few groups. The histogram always sums to exactly `tokens`.
pub fn routed_histogram(groups: usize, tokens: usize, skew: f64, seed: u64) -> Vec<u32> {
    let mut hist = vec![0u32; groups];
    if groups == 0 {
        return hist;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut cdf = Vec::with_capacity(groups);
    let mut acc = 0.0f64;
    for i in 0..groups {
        acc += 1.0 / ((i + 1) as f64).powf(skew);
        cdf.push(acc);
    }

    for _ in 0..tokens {
        let u: f64 = rng.gen_range(0.0..acc);
        let g = cdf.partition_point(|&c| c <= u).min(groups - 1);
        hist[g] += 1;
    }
    hist
}

/// Mostly-empty histogram: each group is nonzero with probability `density`.
pub fn sparse_histogram(groups: usize, density: f64, max_count: u32, seed: u64) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..groups)
        .map(|_| {
            if rng.gen_bool(density) {
                rng.gen_range(1..=max_count.max(1))
            } else {
                0
            }
        })
        .collect()
}

/// Every item routed to a single group.
pub fn single_hot_group(groups: usize, hot: usize, tokens: u32) -> Vec<u32> {
    let mut hist = vec![0u32; groups];
    hist[hot] = tokens;
    hist
}

/// Counts sitting exactly on, just under, and just over tile boundaries.
pub fn boundary_histogram(groups: usize, tile_dim: u32, seed: u64) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..groups)
        .map(|_| {
            let tiles = rng.gen_range(0..4u32);
            match rng.gen_range(0..3) {
                0 => tiles * tile_dim,
                1 => (tiles * tile_dim).saturating_sub(1),
                _ => tiles * tile_dim + 1,
            }
        })
        .collect()
}

/// `total_work_items` that is just large enough for `histogram`.
pub fn tight_total(histogram: &[u32]) -> usize {
    histogram.iter().map(|&c| c as usize).sum()
}
