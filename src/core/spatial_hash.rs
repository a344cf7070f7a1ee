//! Spatial hashing for neighbor search
//!
//! Uniform grid keyed by floor(position / cell_size), open-hashed into
//! [`IndexMap`] buckets so the grid grows with the particles and iteration
//! order stays deterministic. With cell_size >= query radius, a 3x3 cell
//! scan is guaranteed to contain every true neighbor; the exact distance
//! check happens when the per-particle neighbor lists are built.

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::core::kernel;
use crate::core::particle::Particle;
use crate::math::{Real, Vector};

pub const NEIGHBOR_OFFSETS: [(i32, i32); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// One entry of a particle's neighbor list, discovery-ordered. Kernel value
/// and gradient are cached here so every solver stage reuses them.
#[derive(Clone, Copy, Debug)]
pub struct Neighbor {
    pub index: usize,
    pub distance: Real,
    pub kernel: Real,
    pub gradient: Vector,
}

#[derive(Default)]
pub struct SpatialHash {
    cell_size: Real,
    buckets: IndexMap<(i32, i32), Vec<usize>>,
    lists: Vec<Vec<Neighbor>>,
}

impl SpatialHash {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    fn cell_of(&self, position: Vector) -> (i32, i32) {
        let inv = 1.0 / self.cell_size;
        (
            (position.x * inv).floor() as i32,
            (position.y * inv).floor() as i32,
        )
    }

    /// Bucket all particles into the grid. Amortized O(n): bucket storage is
    /// reused across steps, cells that emptied out are dropped.
    pub fn rebuild(&mut self, particles: &[Particle], cell_size: Real) {
        debug_assert!(cell_size > 0.0);
        self.cell_size = cell_size;

        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
        for (i, particle) in particles.iter().enumerate() {
            let cell = self.cell_of(particle.position);
            self.buckets.entry(cell).or_default().push(i);
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
    }

    /// Candidate indices within `radius` of `position`, from the 3x3 cell
    /// block around the query cell. Requires `radius <= cell_size`. May
    /// include slightly-further candidates (same block, larger distance);
    /// callers filter by exact distance.
    pub fn query_neighbors(&self, position: Vector, radius: Real) -> Vec<usize> {
        debug_assert!(radius <= self.cell_size + Real::EPSILON);
        let (cx, cy) = self.cell_of(position);
        let mut candidates = Vec::new();
        for (dx, dy) in NEIGHBOR_OFFSETS {
            if let Some(bucket) = self.buckets.get(&(cx + dx, cy + dy)) {
                candidates.extend_from_slice(bucket);
            }
        }
        candidates
    }

    /// Build the per-particle neighbor lists: exact distance check, self
    /// excluded, kernel value and gradient evaluated once. Per-particle
    /// output depends only on the read-only buckets, so the fan-out is
    /// data-parallel.
    pub fn build_neighbor_lists(&mut self, particles: &[Particle], h: Real) {
        let h2 = h * h;
        let lists = (0..particles.len())
            .into_par_iter()
            .map(|i| {
                let pos_i = particles[i].position;
                let mut list = Vec::new();
                for j in self.query_neighbors(pos_i, h) {
                    if j == i {
                        continue;
                    }
                    let r_ij = pos_i - particles[j].position;
                    let dist_sq = r_ij.length_squared();
                    if dist_sq < h2 {
                        let distance = dist_sq.sqrt();
                        list.push(Neighbor {
                            index: j,
                            distance,
                            kernel: kernel::value(distance, h),
                            gradient: kernel::gradient(r_ij, h),
                        });
                    }
                }
                list
            })
            .collect();
        self.lists = lists;
    }

    pub fn neighbor_lists(&self) -> &[Vec<Neighbor>] {
        &self.lists
    }

    pub fn neighbors(&self, i: usize) -> &[Neighbor] {
        &self.lists[i]
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
