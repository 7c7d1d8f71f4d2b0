//! Batched assignment: bulk nearest-color search without face context.
//!
//! Voxels are processed in fixed-size chunks; within a chunk, dithering and
//! the search against the palette's global colors run in parallel.

use super::{AssignedBlock, BlockAssigner};
use crate::grid::{FaceVisibility, Voxel};
use rayon::prelude::*;

const CHUNK_SIZE: usize = 10_000;

/// Assign blocks to voxels against global palette colors.
///
/// Output order matches `voxels`. Progress is reported after each chunk.
pub fn assign_batched(
    assigner: &BlockAssigner<'_>,
    voxels: &[&Voxel],
    mut progress: Option<&mut dyn FnMut(f32)>,
) -> Vec<AssignedBlock> {
    let total = voxels.len();
    let mut results = Vec::with_capacity(total);

    for chunk in voxels.chunks(CHUNK_SIZE) {
        let assigned: Vec<AssignedBlock> = chunk
            .par_iter()
            .map(|voxel| {
                let color = assigner.prepare_color(voxel);
                let name = assigner.find_best_block(&color, FaceVisibility::NONE);
                assigner.finish(voxel, name)
            })
            .collect();
        results.extend(assigned);

        if let Some(cb) = progress.as_deref_mut() {
            cb(results.len() as f32 / total as f32);
        }
    }

    if total == 0 {
        if let Some(cb) = progress.as_deref_mut() {
            cb(1.0);
        }
    }

    log::debug!(
        "batch-assigned {} voxels against {} palette blocks",
        results.len(),
        assigner.palette().len()
    );
    results
}
