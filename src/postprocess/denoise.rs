//! Local majority-vote denoising.

use super::{majority, neighborhood, KindTable};
use crate::assign::AssignedBlock;
use crate::types::VoxelPosition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Denoise configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    /// Neighborhood radius (1 = 3x3x3 cube).
    pub radius: i32,
    /// A block with fewer same-type neighbors than this is retyped.
    pub threshold: usize,
    /// Maximum number of passes.
    pub iterations: usize,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            radius: 1,
            threshold: 3,
            iterations: 1,
        }
    }
}

/// Retype blocks that disagree with their neighborhood.
///
/// Each pass computes all replacements against the previous pass's types,
/// then applies them. Stops early once a pass changes nothing.
pub fn denoise(blocks: Vec<AssignedBlock>, config: &DenoiseConfig) -> Vec<AssignedBlock> {
    if blocks.is_empty() {
        return blocks;
    }

    let table = KindTable::new(&blocks);
    let mut kind = table.of_block.clone();
    let index: HashMap<VoxelPosition, usize> =
        blocks.iter().enumerate().map(|(i, b)| (b.position, i)).collect();

    let mut passes = 0;
    let mut total_changes = 0;
    for _ in 0..config.iterations {
        passes += 1;
        let mut changes: Vec<(usize, usize)> = Vec::new();

        for (i, block) in blocks.iter().enumerate() {
            let neighbors: Vec<usize> = neighborhood(block.position, config.radius)
                .filter_map(|p| index.get(&p).map(|&j| kind[j]))
                .collect();
            if neighbors.is_empty() {
                continue;
            }

            let same = neighbors.iter().filter(|&&k| k == kind[i]).count();
            if same < config.threshold {
                if let Some(winner) = majority(neighbors) {
                    if winner != kind[i] {
                        changes.push((i, winner));
                    }
                }
            }
        }

        if changes.is_empty() {
            break;
        }
        total_changes += changes.len();
        for (i, winner) in changes {
            kind[i] = winner;
        }
    }

    log::info!("denoise retyped {} blocks in {} passes", total_changes, passes);

    blocks
        .into_iter()
        .enumerate()
        .map(|(i, mut block)| {
            if kind[i] != table.of_block[i] {
                table.kinds[kind[i]].apply(&mut block);
            }
            block
        })
        .collect()
}
