//! k-means over the sampled dataset.
//!
//! Two backends share one contract: `clusters` real-valued centres that are
//! thresholded at 0.5 and ordered by ink. `MiniBatch` is the default
//! (k-means++ seeding on a subset, Sculley style mini-batch updates),
//! `Flat` runs full Lloyd iterations for a fixed number of rounds.
use std::fmt;
use std::str::FromStr;

use rand::{seq::index, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    bitmap::{Bitmap, GLYPH_CELLS},
    config::{seeded_rng, ClusterConfig},
    dataset::Dataset,
    error::{GlyphError, Result},
};

/// Points considered per cluster while seeding the mini-batch backend.
const INIT_POINTS_PER_CLUSTER: usize = 37;
/// Points per cluster in one mini-batch.
const BATCH_POINTS_PER_CLUSTER: usize = 8;
/// Mini-batch steps without an inertia improvement before stopping early.
const MAX_NO_IMPROVEMENT: usize = 10;

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    MiniBatch,
    Flat,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minibatch" | "mini-batch" | "sklearn" => Ok(Backend::MiniBatch),
            "flat" | "lloyd" | "faiss" => Ok(Backend::Flat),
            other => Err(format!(
                "unknown backend '{other}' (expected minibatch or flat)"
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::MiniBatch => f.write_str("minibatch"),
            Backend::Flat => f.write_str("flat"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct KMeans {
    pub clusters: usize,
    pub iterations: usize,
    pub backend: Backend,
}

impl KMeans {
    pub fn new(clusters: usize, backend: Backend) -> Self {
        Self {
            clusters,
            iterations: 100,
            backend,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Real-valued centres, `clusters * dataset.dim()` values row-major.
    pub fn fit<R: Rng>(&self, dataset: &Dataset, rng: &mut R) -> Result<Vec<f32>> {
        if self.clusters == 0 {
            return Err(GlyphError::InvalidConfig("cluster count must be positive".into()));
        }
        if self.clusters > dataset.len() {
            return Err(GlyphError::InsufficientData {
                clusters: self.clusters,
                samples: dataset.len(),
            });
        }
        let points = dataset.to_f32();
        let dim = dataset.dim();
        tracing::info!(
            backend = %self.backend,
            clusters = self.clusters,
            samples = dataset.len(),
            dim,
            "clustering"
        );
        let centers = match self.backend {
            Backend::MiniBatch => self.fit_minibatch(&points, dim, rng),
            Backend::Flat => self.fit_flat(&points, dim, rng),
        };
        Ok(centers)
    }

    fn fit_minibatch<R: Rng>(&self, points: &[f32], dim: usize, rng: &mut R) -> Vec<f32> {
        let n = points.len() / dim;
        let k = self.clusters;

        let init_size = (INIT_POINTS_PER_CLUSTER * k).min(n);
        let init_idx = index::sample(rng, n, init_size).into_vec();
        let init_points = gather(points, dim, &init_idx);
        let mut centers = kmeans_plus_plus(&init_points, dim, k, rng);

        let batch_size = (BATCH_POINTS_PER_CLUSTER * k).min(n);
        let steps = self.iterations * n.div_ceil(batch_size);
        let alpha = (2.0 * batch_size as f64 / (n + 1) as f64).min(1.0);
        let mut counts = vec![0usize; k];
        let mut ewa: Option<f64> = None;
        let mut best = f64::INFINITY;
        let mut stale = 0;

        for step in 0..steps {
            let batch_idx: Vec<usize> = (0..batch_size).map(|_| rng.gen_range(0..n)).collect();
            let batch = gather(points, dim, &batch_idx);
            let labels = assign(&batch, dim, &centers);
            let inertia =
                labels.iter().map(|&(_, d)| d as f64).sum::<f64>() / batch_size as f64;

            let mut sums = vec![0f32; k * dim];
            let mut members = vec![0usize; k];
            for (point, &(label, _)) in batch.chunks_exact(dim).zip(&labels) {
                members[label] += 1;
                for (s, &x) in sums[label * dim..(label + 1) * dim].iter_mut().zip(point) {
                    *s += x;
                }
            }
            for c in 0..k {
                if members[c] == 0 {
                    continue;
                }
                counts[c] += members[c];
                let scale = 1.0 / counts[c] as f32;
                let center = &mut centers[c * dim..(c + 1) * dim];
                for (v, &s) in center.iter_mut().zip(&sums[c * dim..(c + 1) * dim]) {
                    *v += (s - members[c] as f32 * *v) * scale;
                }
            }

            let smoothed = match ewa {
                None => inertia,
                Some(prev) => prev * (1.0 - alpha) + inertia * alpha,
            };
            ewa = Some(smoothed);
            tracing::debug!(step, inertia, smoothed, "mini-batch step");
            if smoothed < best {
                best = smoothed;
                stale = 0;
            } else {
                stale += 1;
                if stale >= MAX_NO_IMPROVEMENT {
                    tracing::info!(step, inertia = smoothed, "mini-batch converged");
                    break;
                }
            }
        }
        centers
    }

    fn fit_flat<R: Rng>(&self, points: &[f32], dim: usize, rng: &mut R) -> Vec<f32> {
        let n = points.len() / dim;
        let k = self.clusters;
        let mut centers = kmeans_plus_plus(points, dim, k, rng);

        for iteration in 0..self.iterations {
            let labels = assign(points, dim, &centers);
            let inertia: f64 = labels.iter().map(|&(_, d)| d as f64).sum();

            let mut sums = vec![0f64; k * dim];
            let mut members = vec![0usize; k];
            for (point, &(label, _)) in points.chunks_exact(dim).zip(&labels) {
                members[label] += 1;
                for (s, &x) in sums[label * dim..(label + 1) * dim].iter_mut().zip(point) {
                    *s += x as f64;
                }
            }

            let mut taken = vec![false; n];
            for c in 0..k {
                let center = &mut centers[c * dim..(c + 1) * dim];
                if members[c] > 0 {
                    let inv = 1.0 / members[c] as f64;
                    for (v, &s) in center.iter_mut().zip(&sums[c * dim..(c + 1) * dim]) {
                        *v = (s * inv) as f32;
                    }
                    continue;
                }
                // re-seed an empty cluster with the worst-fitting point
                let far = labels
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !taken[*i])
                    .max_by(|a, b| a.1 .1.total_cmp(&b.1 .1))
                    .map(|(i, _)| i);
                if let Some(i) = far {
                    taken[i] = true;
                    center.copy_from_slice(&points[i * dim..(i + 1) * dim]);
                }
            }
            tracing::debug!(iteration, inertia, "lloyd iteration");
        }
        centers
    }
}

/// Run the configured backend and return binary centroids ordered by ink.
pub fn cluster(dataset: &Dataset, config: &ClusterConfig) -> Result<Vec<Bitmap>> {
    dataset.ensure_dim(GLYPH_CELLS)?;
    let mut rng = seeded_rng(config.seed);
    let centers = KMeans::new(config.clusters, config.backend)
        .with_iterations(config.iterations)
        .fit(dataset, &mut rng)?;
    binarize_sorted(&centers, dataset.dim())
}

/// Threshold real-valued centres at 0.5 and stable-sort them by ink.
pub fn binarize_sorted(centers: &[f32], dim: usize) -> Result<Vec<Bitmap>> {
    let mut bitmaps = centers
        .chunks_exact(dim)
        .map(Bitmap::from_weights)
        .collect::<Result<Vec<_>>>()?;
    bitmaps.sort_by_key(Bitmap::ink);
    Ok(bitmaps)
}

fn gather(points: &[f32], dim: usize, idx: &[usize]) -> Vec<f32> {
    let mut out = Vec::with_capacity(idx.len() * dim);
    for &i in idx {
        out.extend_from_slice(&points[i * dim..(i + 1) * dim]);
    }
    out
}

fn sq_dist(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the closest centre (lowest index wins ties) and its squared distance.
fn nearest(point: &[f32], centers: &[f32], dim: usize) -> (usize, f32) {
    let mut best = (0, f32::INFINITY);
    for (c, center) in centers.chunks_exact(dim).enumerate() {
        let d = sq_dist(point, center);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn assign(points: &[f32], dim: usize, centers: &[f32]) -> Vec<(usize, f32)> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        points
            .par_chunks_exact(dim)
            .map(|p| nearest(p, centers, dim))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        points
            .chunks_exact(dim)
            .map(|p| nearest(p, centers, dim))
            .collect()
    }
}

/// k-means++ seeding: each further centre is drawn with probability
/// proportional to its squared distance from the closest chosen centre.
fn kmeans_plus_plus<R: Rng>(points: &[f32], dim: usize, k: usize, rng: &mut R) -> Vec<f32> {
    let n = points.len() / dim;
    let mut centers = Vec::with_capacity(k * dim);
    let first = rng.gen_range(0..n);
    centers.extend_from_slice(&points[first * dim..(first + 1) * dim]);
    let mut closest: Vec<f32> = points
        .chunks_exact(dim)
        .map(|p| sq_dist(p, &centers[..dim]))
        .collect();

    for _ in 1..k {
        let total: f64 = closest.iter().map(|&d| d as f64).sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &d) in closest.iter().enumerate() {
                target -= d as f64;
                if target < 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            rng.gen_range(0..n)
        };
        let new_center = points[pick * dim..(pick + 1) * dim].to_vec();
        for (d, p) in closest.iter_mut().zip(points.chunks_exact(dim)) {
            *d = d.min(sq_dist(p, &new_center));
        }
        centers.extend_from_slice(&new_center);
    }
    centers
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn two_blobs() -> Dataset {
        let rows = (0..80).map(|i| if i < 40 { [0u8; 4] } else { [1u8; 4] });
        Dataset::from_rows(4, rows).unwrap()
    }

    fn center_sums(centers: &[f32]) -> Vec<f32> {
        let mut sums: Vec<f32> = centers.chunks(4).map(|c| c.iter().sum()).collect();
        sums.sort_by(f32::total_cmp);
        sums
    }

    #[test]
    fn backend_names_parse() {
        assert_eq!("sklearn".parse::<Backend>().unwrap(), Backend::MiniBatch);
        assert_eq!("FAISS".parse::<Backend>().unwrap(), Backend::Flat);
        assert!("gpu".parse::<Backend>().is_err());
    }

    #[test]
    fn flat_separates_blobs() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let centers = KMeans::new(2, Backend::Flat)
            .with_iterations(10)
            .fit(&two_blobs(), &mut rng)
            .unwrap();
        assert_eq!(center_sums(&centers), vec![0.0, 4.0]);
    }

    #[test]
    fn minibatch_separates_blobs() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let centers = KMeans::new(2, Backend::MiniBatch)
            .with_iterations(20)
            .fit(&two_blobs(), &mut rng)
            .unwrap();
        let sums = center_sums(&centers);
        assert!(sums[0] < 0.5, "low blob centre drifted: {sums:?}");
        assert!(sums[1] > 3.5, "high blob centre drifted: {sums:?}");
    }

    #[test]
    fn plus_plus_picks_distinct_points_when_possible() {
        let points = [0.0, 0.0, 10.0, 10.0, 0.0, 0.0, 10.0, 10.0];
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let centers = kmeans_plus_plus(&points, 2, 2, &mut rng);
        assert_ne!(&centers[..2], &centers[2..]);
    }

    #[test]
    fn too_many_clusters() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = KMeans::new(81, Backend::Flat)
            .fit(&two_blobs(), &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            GlyphError::InsufficientData {
                clusters: 81,
                samples: 80
            }
        ));
    }

    #[test]
    fn binarize_orders_by_ink() {
        let mut centers = vec![0.9f32; GLYPH_CELLS];
        centers.extend(vec![0.1f32; GLYPH_CELLS]);
        let bitmaps = binarize_sorted(&centers, GLYPH_CELLS).unwrap();
        assert_eq!(bitmaps[0].ink(), 0);
        assert_eq!(bitmaps[1].ink(), GLYPH_CELLS);
    }
}
