//! Density-based clustering over position and block color.
//!
//! Each block becomes a 6D feature `[x, y, z, r, g, b]` (positions scaled by
//! the coordinate weight, reference colors by the color weight). Columns are
//! standardized, then DBSCAN groups the blocks. Every cluster is retyped to
//! its most frequent kind; noise keeps its type.

use super::{majority, reference_color, KindTable};
use crate::assign::AssignedBlock;
use crate::atlas::BlockAtlas;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

pub type Feature = [f32; 6];

/// Smallest neighborhood radius the clustering passes accept.
pub const MIN_EPS: f32 = 1e-6;

/// Whether `eps` is a usable neighborhood radius.
pub fn eps_is_usable(eps: f32) -> bool {
    eps.is_finite() && eps >= MIN_EPS
}

/// Clustering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Neighborhood radius in standardized feature space.
    pub eps: f32,
    /// Points (including itself) a core point needs within `eps`.
    pub min_samples: usize,
    pub coord_weight: f32,
    pub color_weight: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            eps: 3.0,
            min_samples: 5,
            coord_weight: 1.0,
            color_weight: 10.0,
        }
    }
}

/// Build feature vectors for blocks.
pub fn features(blocks: &[AssignedBlock], atlas: &BlockAtlas, coord_weight: f32, color_weight: f32) -> Vec<Feature> {
    blocks
        .iter()
        .map(|b| {
            let color = reference_color(atlas, &b.block_name);
            [
                b.position.x as f32 * coord_weight,
                b.position.y as f32 * coord_weight,
                b.position.z as f32 * coord_weight,
                color[0] * color_weight,
                color[1] * color_weight,
                color[2] * color_weight,
            ]
        })
        .collect()
}

/// Standardize each column to zero mean and unit variance.
///
/// Zero-variance columns are only centered.
pub fn standardize(features: &mut [Feature]) {
    if features.is_empty() {
        return;
    }
    let n = features.len() as f64;
    for c in 0..6 {
        let mean = features.iter().map(|f| f[c] as f64).sum::<f64>() / n;
        let var = features.iter().map(|f| (f[c] as f64 - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        let scale = if std > 1e-12 { std } else { 1.0 };
        for f in features.iter_mut() {
            f[c] = ((f[c] as f64 - mean) / scale) as f32;
        }
    }
}

fn distance_squared(a: &Feature, b: &Feature) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Spatial hash over the first three feature columns, cell size `eps`.
struct CellIndex {
    eps: f32,
    cells: HashMap<[i64; 3], Vec<usize>>,
}

impl CellIndex {
    fn new(features: &[Feature], eps: f32) -> Self {
        let mut cells: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
        for (i, f) in features.iter().enumerate() {
            cells.entry(Self::cell(f, eps)).or_default().push(i);
        }
        Self { eps, cells }
    }

    /// Float-to-int casts saturate, so far-out coordinates pile into the edge cells.
    fn cell(f: &Feature, eps: f32) -> [i64; 3] {
        [
            (f[0] / eps).floor() as i64,
            (f[1] / eps).floor() as i64,
            (f[2] / eps).floor() as i64,
        ]
    }

    /// Indices within `eps` of point `i` (including `i`), ascending.
    fn region(&self, features: &[Feature], i: usize) -> Vec<usize> {
        let eps_sq = self.eps * self.eps;
        let [cx, cy, cz] = Self::cell(&features[i], self.eps);
        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = [cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz)];
                    if let Some(members) = self.cells.get(&key) {
                        found.extend(
                            members
                                .iter()
                                .copied()
                                .filter(|&j| distance_squared(&features[i], &features[j]) <= eps_sq),
                        );
                    }
                }
            }
        }
        // Saturated neighbor keys can repeat a cell
        found.sort_unstable();
        found.dedup();
        found
    }
}

/// DBSCAN cluster labels; `None` marks noise.
///
/// Clusters are numbered in order of their first core point.
pub fn dbscan(features: &[Feature], eps: f32, min_samples: usize) -> Vec<Option<usize>> {
    let index = CellIndex::new(features, eps);
    let core: Vec<bool> = (0..features.len())
        .into_par_iter()
        .map(|i| index.region(features, i).len() >= min_samples)
        .collect();

    let mut labels: Vec<Option<usize>> = vec![None; features.len()];
    let mut next = 0;
    for seed in 0..features.len() {
        if !core[seed] || labels[seed].is_some() {
            continue;
        }
        let cluster = next;
        next += 1;
        labels[seed] = Some(cluster);

        let mut queue = VecDeque::from([seed]);
        while let Some(point) = queue.pop_front() {
            if !core[point] {
                continue;
            }
            for neighbor in index.region(features, point) {
                if labels[neighbor].is_none() {
                    labels[neighbor] = Some(cluster);
                    queue.push_back(neighbor);
                }
            }
        }
    }
    labels
}

/// Group block indices by cluster label, in label order.
pub(crate) fn group_by_label(labels: &[Option<usize>]) -> Vec<Vec<usize>> {
    let count = labels.iter().flatten().max().map_or(0, |&m| m + 1);
    let mut groups = vec![Vec::new(); count];
    for (i, label) in labels.iter().enumerate() {
        if let Some(l) = label {
            groups[*l].push(i);
        }
    }
    groups
}

/// Retype every cluster to its most frequent block kind.
///
/// With fewer blocks than `min_samples`, or an `eps` below [`MIN_EPS`], the
/// pass is skipped.
pub fn unify_clusters(blocks: Vec<AssignedBlock>, atlas: &BlockAtlas, config: &ClusterConfig) -> Vec<AssignedBlock> {
    if !eps_is_usable(config.eps) {
        log::warn!("skipping clustering: unusable eps {}", config.eps);
        return blocks;
    }
    if blocks.len() < config.min_samples {
        log::info!(
            "skipping clustering: {} blocks, min_samples {}",
            blocks.len(),
            config.min_samples
        );
        return blocks;
    }

    let mut feats = features(&blocks, atlas, config.coord_weight, config.color_weight);
    standardize(&mut feats);
    let labels = dbscan(&feats, config.eps, config.min_samples);
    let groups = group_by_label(&labels);
    let noise = labels.iter().filter(|l| l.is_none()).count();

    let table = KindTable::new(&blocks);
    let mut target: Vec<usize> = table.of_block.clone();
    for members in &groups {
        if let Some(dominant) = majority(members.iter().map(|&i| table.of_block[i])) {
            for &i in members {
                target[i] = dominant;
            }
        }
    }

    let mut retyped = 0;
    let result: Vec<AssignedBlock> = blocks
        .into_iter()
        .enumerate()
        .map(|(i, mut block)| {
            if target[i] != table.of_block[i] {
                table.kinds[target[i]].apply(&mut block);
                retyped += 1;
            }
            block
        })
        .collect();

    log::info!(
        "clustering found {} clusters and {} noise blocks, retyped {}",
        groups.len(),
        noise,
        retyped
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasEntry;
    use crate::types::VoxelPosition;

    fn atlas() -> BlockAtlas {
        BlockAtlas::from_entries(vec![
            AtlasEntry::uniform("red", [0.9, 0.1, 0.1, 1.0]),
            AtlasEntry::uniform("dark_red", [0.88, 0.1, 0.1, 1.0]),
            AtlasEntry::uniform("blue", [0.1, 0.1, 0.9, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_standardize_columns() {
        let mut feats = vec![[0.0, 1.0, 5.0, 0.0, 0.0, 0.0], [2.0, 3.0, 5.0, 0.0, 0.0, 0.0]];
        standardize(&mut feats);
        assert!((feats[0][0] + 1.0).abs() < 1e-6);
        assert!((feats[1][0] - 1.0).abs() < 1e-6);
        assert_eq!(feats[0][2], 0.0);
    }

    #[test]
    fn test_dbscan_two_groups_and_noise() {
        let mut feats: Vec<Feature> = Vec::new();
        for i in 0..5 {
            feats.push([i as f32 * 0.1, 0.0, 0.0, 0.0, 0.0, 0.0]);
        }
        for i in 0..5 {
            feats.push([10.0 + i as f32 * 0.1, 0.0, 0.0, 0.0, 0.0, 0.0]);
        }
        feats.push([5.0, 5.0, 5.0, 0.0, 0.0, 0.0]);

        let labels = dbscan(&feats, 0.5, 3);
        assert!(labels[..5].iter().all(|l| *l == Some(0)));
        assert!(labels[5..10].iter().all(|l| *l == Some(1)));
        assert_eq!(labels[10], None);
    }

    #[test]
    fn test_dbscan_tiny_eps_isolates_points() {
        let feats: Vec<Feature> = vec![
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [1.0, -2.0, 0.5, 0.0, 0.0, 0.0],
            [3.0e9, -3.0e9, 0.0, 0.0, 0.0, 0.0],
            [3.1e9, -3.0e9, 0.0, 0.0, 0.0, 0.0],
        ];
        let labels = dbscan(&feats, 1e-30, 1);
        assert_eq!(labels, vec![Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_unusable_eps_is_skipped() {
        let blocks: Vec<AssignedBlock> = (0..6)
            .map(|x| {
                let name = if x == 2 { "dark_red" } else { "red" };
                AssignedBlock::new(VoxelPosition::new(x, 0, 0), [0.9, 0.1, 0.1, 1.0], name)
            })
            .collect();
        for eps in [1e-30, 0.0, f32::NAN, f32::INFINITY] {
            let config = ClusterConfig {
                eps,
                min_samples: 1,
                ..Default::default()
            };
            assert_eq!(unify_clusters(blocks.clone(), &atlas(), &config), blocks);
        }
        assert!(!eps_is_usable(1e-7));
        assert!(eps_is_usable(MIN_EPS));
    }

    #[test]
    fn test_cluster_retypes_jitter() {
        // A red wall with two near-identical dark red blocks, next to a blue wall
        let mut blocks = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                let name = if (x, y) == (1, 1) || (x, y) == (2, 3) { "dark_red" } else { "red" };
                blocks.push(AssignedBlock::new(VoxelPosition::new(x, y, 0), [0.9, 0.1, 0.1, 1.0], name));
            }
        }
        for x in 4..8 {
            for y in 0..4 {
                blocks.push(AssignedBlock::new(VoxelPosition::new(x, y, 0), [0.1, 0.1, 0.9, 1.0], "blue"));
            }
        }

        let config = ClusterConfig {
            eps: 1.5,
            ..Default::default()
        };
        let result = unify_clusters(blocks, &atlas(), &config);
        for block in &result {
            let expected = if block.position.x < 4 { "red" } else { "blue" };
            assert_eq!(block.block_name, expected);
        }
    }

    #[test]
    fn test_too_few_blocks_is_skipped() {
        let blocks = vec![
            AssignedBlock::new(VoxelPosition::new(0, 0, 0), [1.0; 4], "red"),
            AssignedBlock::new(VoxelPosition::new(1, 0, 0), [1.0; 4], "blue"),
        ];
        let result = unify_clusters(blocks.clone(), &atlas(), &ClusterConfig::default());
        assert_eq!(result, blocks);
    }
}
