//! Cluster-based hole filling.
//!
//! Blocks are clustered as in [`cluster`](super::cluster). Within each
//! cluster, every horizontal layer is scanned for empty cells inside the
//! layer's bounding rectangle that have a cluster cell somewhere to the west,
//! east, north and south along their row and column. Those cells are filled
//! with the cluster's dominant kind.

use super::cluster::{dbscan, eps_is_usable, features, group_by_label, standardize};
use super::{majority, reference_color, KindTable};
use crate::assign::AssignedBlock;
use crate::atlas::BlockAtlas;
use crate::types::VoxelPosition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

const MIN_LAYER_CELLS: usize = 4;

/// Hole-filling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleFillConfig {
    pub eps: f32,
    pub min_samples: usize,
    pub color_weight: f32,
}

impl Default for HoleFillConfig {
    fn default() -> Self {
        Self {
            eps: 0.7,
            min_samples: 5,
            color_weight: 10.0,
        }
    }
}

/// Cells enclosed on all four sides within one layer, as (x, z).
fn layer_holes(cells: &HashSet<(i32, i32)>) -> Vec<(i32, i32)> {
    if cells.len() < MIN_LAYER_CELLS {
        return Vec::new();
    }

    // Extent of each row (fixed z) and column (fixed x)
    let mut rows: HashMap<i32, (i32, i32)> = HashMap::new();
    let mut columns: HashMap<i32, (i32, i32)> = HashMap::new();
    for &(x, z) in cells {
        let row = rows.entry(z).or_insert((x, x));
        row.0 = row.0.min(x);
        row.1 = row.1.max(x);
        let column = columns.entry(x).or_insert((z, z));
        column.0 = column.0.min(z);
        column.1 = column.1.max(z);
    }

    let (min_x, max_x) = (rows.values().map(|r| r.0).min(), rows.values().map(|r| r.1).max());
    let (min_z, max_z) = (columns.values().map(|c| c.0).min(), columns.values().map(|c| c.1).max());
    let (Some(min_x), Some(max_x), Some(min_z), Some(max_z)) = (min_x, max_x, min_z, max_z) else {
        return Vec::new();
    };

    let mut holes = Vec::new();
    for x in min_x..=max_x {
        for z in min_z..=max_z {
            if cells.contains(&(x, z)) {
                continue;
            }
            let enclosed_x = rows.get(&z).map_or(false, |&(lo, hi)| lo < x && x < hi);
            let enclosed_z = columns.get(&x).map_or(false, |&(lo, hi)| lo < z && z < hi);
            if enclosed_x && enclosed_z {
                holes.push((x, z));
            }
        }
    }
    holes
}

/// Unify cluster types and fill enclosed single-layer holes.
///
/// Filled blocks are appended after the (possibly retyped) input blocks.
/// With fewer blocks than `min_samples`, or an unusable `eps`, the pass is
/// skipped.
pub fn fill_holes(blocks: Vec<AssignedBlock>, atlas: &BlockAtlas, config: &HoleFillConfig) -> Vec<AssignedBlock> {
    if !eps_is_usable(config.eps) {
        log::warn!("skipping hole filling: unusable eps {}", config.eps);
        return blocks;
    }
    if blocks.len() < config.min_samples {
        log::info!(
            "skipping hole filling: {} blocks, min_samples {}",
            blocks.len(),
            config.min_samples
        );
        return blocks;
    }

    let mut feats = features(&blocks, atlas, 1.0, config.color_weight);
    standardize(&mut feats);
    let labels = dbscan(&feats, config.eps, config.min_samples);
    let groups = group_by_label(&labels);

    let table = KindTable::new(&blocks);
    let mut target = table.of_block.clone();
    let mut occupied: HashSet<VoxelPosition> = blocks.iter().map(|b| b.position).collect();
    let mut filled = Vec::new();

    for members in &groups {
        let Some(dominant) = majority(members.iter().map(|&i| table.of_block[i])) else {
            continue;
        };
        let kind = &table.kinds[dominant];

        let mut layers: BTreeMap<i32, HashSet<(i32, i32)>> = BTreeMap::new();
        for &i in members {
            target[i] = dominant;
            let p = blocks[i].position;
            layers.entry(p.y).or_default().insert((p.x, p.z));
        }

        for (y, cells) in &layers {
            for (x, z) in layer_holes(cells) {
                let position = VoxelPosition::new(x, *y, z);
                if occupied.insert(position) {
                    let mut block = AssignedBlock::new(position, reference_color(atlas, &kind.name), kind.name.clone());
                    kind.apply(&mut block);
                    filled.push(block);
                }
            }
        }
    }

    log::info!(
        "hole filling found {} clusters, filled {} holes",
        groups.len(),
        filled.len()
    );

    let mut result: Vec<AssignedBlock> = blocks
        .into_iter()
        .enumerate()
        .map(|(i, mut block)| {
            if target[i] != table.of_block[i] {
                table.kinds[target[i]].apply(&mut block);
            }
            block
        })
        .collect();
    result.extend(filled);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasEntry;

    fn atlas() -> BlockAtlas {
        BlockAtlas::from_entries(vec![AtlasEntry::uniform("stone", [0.5, 0.5, 0.5, 1.0])]).unwrap()
    }

    fn ring() -> Vec<AssignedBlock> {
        let mut blocks = Vec::new();
        for x in 0..3 {
            for z in 0..3 {
                if (x, z) != (1, 1) {
                    blocks.push(AssignedBlock::new(VoxelPosition::new(x, 0, z), [0.5, 0.5, 0.5, 1.0], "stone"));
                }
            }
        }
        blocks
    }

    #[test]
    fn test_layer_holes_rule() {
        let mut cells: HashSet<(i32, i32)> = ring().iter().map(|b| (b.position.x, b.position.z)).collect();
        assert_eq!(layer_holes(&cells), vec![(1, 1)]);

        // Open the ring on the east side: (1, 1) has no blocker to the east
        cells.remove(&(2, 1));
        assert!(layer_holes(&cells).is_empty());
    }

    #[test]
    fn test_ring_interior_is_filled() {
        let config = HoleFillConfig {
            eps: 2.0,
            min_samples: 3,
            ..Default::default()
        };
        let result = fill_holes(ring(), &atlas(), &config);
        assert_eq!(result.len(), 9);

        let center = result
            .iter()
            .find(|b| b.position == VoxelPosition::new(1, 0, 1))
            .unwrap();
        assert_eq!(center.block_name, "stone");

        // Nothing outside the ring
        assert!(result.iter().all(|b| (0..3).contains(&b.position.x) && (0..3).contains(&b.position.z)));
    }

    #[test]
    fn test_tiny_eps_unchanged() {
        let config = HoleFillConfig {
            eps: 1e-30,
            min_samples: 3,
            ..Default::default()
        };
        assert_eq!(fill_holes(ring(), &atlas(), &config), ring());
    }

    #[test]
    fn test_small_input_unchanged() {
        let blocks = ring()[..3].to_vec();
        let result = fill_holes(blocks.clone(), &atlas(), &HoleFillConfig::default());
        assert_eq!(result, blocks);
    }
}
