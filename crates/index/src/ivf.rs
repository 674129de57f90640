//! Inverted-file (IVF) partitioning for inner-product search.
//!
//! Training runs spherical k-means on a bounded sample of the collection: the
//! sample and the initial centroids come from a seeded RNG, so the same data
//! and config always produce the same partitions. Every stored vector is then
//! filed under its best-scoring centroid. A query scores all centroids,
//! probes the `nprobe` best lists and ranks only the vectors found there.
//!
//! ## Trade-offs
//!
//! - **Speed**: scans roughly `nprobe / nlist` of the collection
//! - **Recall**: neighbours filed under unprobed lists are missed
//! - **Build time**: `train_iterations` passes over the sample
//!
//! Below `min_vectors_for_ivf` vectors the collection is scanned exactly.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::IndexError;

/// Configuration for IVF training and probing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IvfConfig {
    /// Train an IVF index at all. When false every search is exact.
    pub enabled: bool,
    /// Number of partitions. Clamped to the collection size.
    /// Default: 384
    pub nlist: usize,
    /// Partitions probed per query.
    /// Default: 10
    pub nprobe: usize,
    /// Collections smaller than this are searched exactly.
    /// Default: 1000
    pub min_vectors_for_ivf: usize,
    /// k-means iterations.
    /// Default: 10
    pub train_iterations: usize,
    /// Upper bound on vectors sampled for training.
    /// Default: 50000
    pub max_training_points: usize,
    /// Seed for sampling and centroid initialisation.
    pub seed: u64,
}

impl Default for IvfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nlist: 384,
            nprobe: 10,
            min_vectors_for_ivf: 1000,
            train_iterations: 10,
            max_training_points: 50_000,
            seed: 0x5eed_1f5a,
        }
    }
}

impl IvfConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_nlist(mut self, nlist: usize) -> Self {
        self.nlist = nlist;
        self
    }

    pub fn with_nprobe(mut self, nprobe: usize) -> Self {
        self.nprobe = nprobe;
        self
    }

    pub fn with_min_vectors_for_ivf(mut self, min: usize) -> Self {
        self.min_vectors_for_ivf = min;
        self
    }

    pub fn with_train_iterations(mut self, iterations: usize) -> Self {
        self.train_iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check if IVF should be trained for a collection of `num_vectors`.
    pub fn should_use_ivf(&self, num_vectors: usize) -> bool {
        self.enabled && num_vectors >= self.min_vectors_for_ivf.max(1)
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.nlist == 0 {
            return Err(IndexError::InvalidConfig("nlist must be > 0".into()));
        }
        if self.nprobe == 0 {
            return Err(IndexError::InvalidConfig("nprobe must be > 0".into()));
        }
        if self.train_iterations == 0 {
            return Err(IndexError::InvalidConfig(
                "train_iterations must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Trained partitions of one collection.
#[derive(Debug, Clone)]
pub(crate) struct IvfIndex {
    /// `nlist x dim`, unit-length rows.
    centroids: Array2<f32>,
    /// Slot numbers per partition, ascending.
    lists: Vec<Vec<u32>>,
    /// Partition of every slot.
    assignment: Vec<u32>,
}

/// Persisted form; lists are rebuilt from `assignment` on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct IvfSnapshot {
    pub(crate) nlist: usize,
    pub(crate) centroids: Vec<f32>,
    pub(crate) assignment: Vec<u32>,
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

impl IvfIndex {
    /// Trains on `data` (`n x dim`, row-major) and assigns every row.
    pub(crate) fn train(data: &[f32], dim: usize, cfg: &IvfConfig) -> Result<Self, IndexError> {
        cfg.validate()?;
        if dim == 0 || data.len() % dim != 0 {
            return Err(IndexError::InvalidConfig(format!(
                "vector data of length {} is not a multiple of dimension {dim}",
                data.len()
            )));
        }
        let n = data.len() / dim;
        if n == 0 {
            return Err(IndexError::InvalidConfig(
                "cannot train IVF on an empty collection".into(),
            ));
        }
        let row = |i: usize| &data[i * dim..(i + 1) * dim];

        let mut rng = fastrand::Rng::with_seed(cfg.seed);
        let sample_size = n.min(cfg.max_training_points.max(cfg.nlist));
        let mut order: Vec<usize> = (0..n).collect();
        for i in 0..sample_size {
            let j = rng.usize(i..n);
            order.swap(i, j);
        }
        order.truncate(sample_size);
        let nlist = cfg.nlist.min(sample_size);

        let mut centroids = Array2::<f32>::zeros((nlist, dim));
        for (c, &slot) in order.iter().take(nlist).enumerate() {
            let mut seed_row = row(slot).to_vec();
            normalize(&mut seed_row);
            copy_row(&mut centroids, c, &seed_row);
        }

        for _ in 0..cfg.train_iterations {
            let labels: Vec<usize> = order
                .par_iter()
                .map(|&slot| nearest(&centroids, row(slot)))
                .collect();

            let mut sums = Array2::<f32>::zeros((nlist, dim));
            let mut counts = vec![0usize; nlist];
            for (&slot, &label) in order.iter().zip(labels.iter()) {
                for (acc, value) in sums.row_mut(label).iter_mut().zip(row(slot)) {
                    *acc += value;
                }
                counts[label] += 1;
            }

            for c in 0..nlist {
                let mut updated: Vec<f32> = if counts[c] == 0 {
                    // Empty partition: reseed from a random sample point.
                    row(order[rng.usize(0..order.len())]).to_vec()
                } else {
                    sums.row(c).to_vec()
                };
                normalize(&mut updated);
                copy_row(&mut centroids, c, &updated);
            }
        }

        let assignment: Vec<u32> = (0..n)
            .into_par_iter()
            .map(|slot| nearest(&centroids, row(slot)) as u32)
            .collect();
        Ok(Self::from_parts(centroids, assignment))
    }

    fn from_parts(centroids: Array2<f32>, assignment: Vec<u32>) -> Self {
        let mut lists = vec![Vec::new(); centroids.nrows()];
        for (slot, &label) in assignment.iter().enumerate() {
            lists[label as usize].push(slot as u32);
        }
        Self {
            centroids,
            lists,
            assignment,
        }
    }

    pub(crate) fn nlist(&self) -> usize {
        self.centroids.nrows()
    }

    /// Files `slot` under its nearest partition, moving it if it was already filed.
    pub(crate) fn assign(&mut self, slot: u32, vector: &[f32]) {
        let label = nearest(&self.centroids, vector) as u32;
        let idx = slot as usize;
        if idx < self.assignment.len() {
            let previous = self.assignment[idx] as usize;
            self.lists[previous].retain(|&s| s != slot);
            self.assignment[idx] = label;
        } else {
            self.assignment.push(label);
        }
        let list = &mut self.lists[label as usize];
        let pos = list.partition_point(|&s| s < slot);
        list.insert(pos, slot);
    }

    /// Slots filed under the `nprobe` best-scoring partitions for `query`.
    pub(crate) fn candidates(&self, query: &[f32], nprobe: usize) -> Vec<u32> {
        let scores: Vec<f32> = self
            .centroids
            .outer_iter()
            .map(|centroid| score_row(centroid, query))
            .collect();
        let mut ranked: Vec<usize> = (0..self.nlist()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        ranked
            .into_iter()
            .take(nprobe.max(1))
            .flat_map(|c| self.lists[c].iter().copied())
            .collect()
    }

    pub(crate) fn to_snapshot(&self) -> IvfSnapshot {
        IvfSnapshot {
            nlist: self.nlist(),
            centroids: self.centroids.iter().copied().collect(),
            assignment: self.assignment.clone(),
        }
    }

    pub(crate) fn from_snapshot(
        snapshot: IvfSnapshot,
        dim: usize,
        slots: usize,
    ) -> Result<Self, IndexError> {
        if snapshot.nlist == 0 {
            return Err(IndexError::Decode("ivf snapshot has no partitions".into()));
        }
        if snapshot.assignment.len() != slots {
            return Err(IndexError::Decode(format!(
                "ivf assignment covers {} vectors, collection has {slots}",
                snapshot.assignment.len()
            )));
        }
        if snapshot
            .assignment
            .iter()
            .any(|&label| label as usize >= snapshot.nlist)
        {
            return Err(IndexError::Decode(
                "ivf assignment references a missing partition".into(),
            ));
        }
        let centroids = Array2::from_shape_vec((snapshot.nlist, dim), snapshot.centroids)
            .map_err(|e| IndexError::Decode(e.to_string()))?;
        Ok(Self::from_parts(centroids, snapshot.assignment))
    }
}

fn score_row(centroid: ArrayView1<'_, f32>, vector: &[f32]) -> f32 {
    centroid.iter().zip(vector).map(|(a, b)| a * b).sum()
}

fn copy_row(centroids: &mut Array2<f32>, c: usize, values: &[f32]) {
    for (dst, src) in centroids.row_mut(c).iter_mut().zip(values) {
        *dst = *src;
    }
}

/// Index of the best-scoring centroid; the lowest index wins ties.
fn nearest(centroids: &Array2<f32>, vector: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_score = f32::NEG_INFINITY;
    for (c, centroid) in centroids.outer_iter().enumerate() {
        let score = score_row(centroid, vector);
        if score > best_score {
            best = c;
            best_score = score;
        }
    }
    best
}
