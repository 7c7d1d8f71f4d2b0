//! Removal of spatially isolated blocks.

use super::neighborhood;
use crate::assign::AssignedBlock;
use crate::types::VoxelPosition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Isolated-block removal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolatedConfig {
    pub radius: i32,
    /// Blocks with fewer neighbors (of any type) are removed.
    pub min_neighbors: usize,
}

impl Default for IsolatedConfig {
    fn default() -> Self {
        Self {
            radius: 1,
            min_neighbors: 3,
        }
    }
}

/// Drop blocks with fewer than `min_neighbors` occupied cells around them.
///
/// Neighbor counts are taken on the input set, so removals in the same call
/// do not cascade.
pub fn remove_isolated(blocks: Vec<AssignedBlock>, config: &IsolatedConfig) -> Vec<AssignedBlock> {
    let occupied: HashSet<VoxelPosition> = blocks.iter().map(|b| b.position).collect();
    let before = blocks.len();

    let kept: Vec<AssignedBlock> = blocks
        .into_iter()
        .filter(|b| {
            neighborhood(b.position, config.radius)
                .filter(|p| occupied.contains(p))
                .count()
                >= config.min_neighbors
        })
        .collect();

    let removed = before - kept.len();
    if removed > 0 {
        log::info!(
            "removed {} isolated blocks (min_neighbors={})",
            removed,
            config.min_neighbors
        );
    }
    kept
}
