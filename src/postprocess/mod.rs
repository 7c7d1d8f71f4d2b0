//! Refinement passes over assigned blocks.
//!
//! All passes take the finished block list and return a new one. Retyping
//! copies the full block kind (name, state suffix and shape) of the winning
//! type, so partial blocks stay consistent.

pub mod cluster;
pub mod denoise;
pub mod holes;
pub mod isolated;

pub use cluster::{dbscan, eps_is_usable, standardize, unify_clusters, ClusterConfig, MIN_EPS};
pub use denoise::{denoise, DenoiseConfig};
pub use holes::{fill_holes, HoleFillConfig};
pub use isolated::{remove_isolated, IsolatedConfig};

use crate::assign::{AssignedBlock, ShapeTag};
use crate::atlas::BlockAtlas;
use crate::types::{Rgba, VoxelPosition, NEUTRAL_GRAY};
use std::collections::HashMap;

/// A block type as far as post-processing is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BlockKind {
    name: String,
    state: String,
    shape: ShapeTag,
}

impl BlockKind {
    fn of(block: &AssignedBlock) -> Self {
        Self {
            name: block.block_name.clone(),
            state: block.block_state.clone(),
            shape: block.shape,
        }
    }

    fn apply(&self, block: &mut AssignedBlock) {
        block.block_name.clone_from(&self.name);
        block.block_state.clone_from(&self.state);
        block.shape = self.shape;
    }
}

/// Interned kinds of a block list, one index per block.
struct KindTable {
    kinds: Vec<BlockKind>,
    of_block: Vec<usize>,
}

impl KindTable {
    fn new(blocks: &[AssignedBlock]) -> Self {
        let mut kinds = Vec::new();
        let mut lookup: HashMap<BlockKind, usize> = HashMap::new();
        let of_block = blocks
            .iter()
            .map(|block| {
                let kind = BlockKind::of(block);
                *lookup.entry(kind.clone()).or_insert_with(|| {
                    kinds.push(kind);
                    kinds.len() - 1
                })
            })
            .collect();
        Self { kinds, of_block }
    }
}

/// Most frequent item; ties go to the item seen first.
fn majority(items: impl IntoIterator<Item = usize>) -> Option<usize> {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(k, _)| *k == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    let mut best: Option<(usize, usize)> = None;
    for (item, n) in counts {
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((item, n));
        }
    }
    best.map(|(item, _)| item)
}

/// Positions within a cube of `radius` around `center`, excluding the center.
fn neighborhood(center: VoxelPosition, radius: i32) -> impl Iterator<Item = VoxelPosition> {
    (-radius..=radius).flat_map(move |dx| {
        (-radius..=radius).flat_map(move |dy| {
            (-radius..=radius).filter_map(move |dz| {
                if dx == 0 && dy == 0 && dz == 0 {
                    None
                } else {
                    Some(center.offset(dx, dy, dz))
                }
            })
        })
    })
}

/// Atlas reference color of a block, neutral gray if the block is unknown.
fn reference_color(atlas: &BlockAtlas, name: &str) -> Rgba {
    atlas.lookup(name).map(|e| e.color).unwrap_or(NEUTRAL_GRAY)
}
