//! Short-range ray estimate of the surface normal around each voxel.
//!
//! Six rays start 0.6 units behind the voxel center along each principal
//! direction. The hit nearest the voxel center, if within 1.5 units of it,
//! supplies the normal of the triangle it landed on.

use super::query::SpatialQuery;
use crate::grid::VoxelGrid;
use crate::mesh::Mesh;
use crate::types::{Direction, VoxelPosition};
use glam::Vec3;

const RAY_BACKOFF: f32 = 0.6;
const NORMAL_RANGE: f32 = 1.5;
const VOXELS_PER_BATCH: usize = 4096;

/// Estimate normals for every voxel in the grid and store them on the voxels.
///
/// Returns the number of voxels that received a normal. Failed batches are
/// logged and leave their voxels without a normal.
pub fn estimate_normals(mesh: &Mesh, query: &dyn SpatialQuery, grid: &mut VoxelGrid) -> usize {
    let positions: Vec<VoxelPosition> = grid.sorted_voxels().iter().map(|v| v.position).collect();
    let mut assigned = 0;

    for chunk in positions.chunks(VOXELS_PER_BATCH) {
        let mut origins = Vec::with_capacity(chunk.len() * 6);
        let mut directions = Vec::with_capacity(chunk.len() * 6);
        for position in chunk {
            let center = position.as_vec3();
            for direction in Direction::ALL {
                let d = Vec3::from_array(direction.normal());
                origins.push((center - d * RAY_BACKOFF).to_array());
                directions.push(d.to_array());
            }
        }

        let hits = match query.batch_intersect(&origins, &directions) {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!("normal estimation failed for {} voxels: {}", chunk.len(), e);
                continue;
            }
        };

        let mut nearest: Vec<Option<(f32, usize)>> = vec![None; chunk.len()];
        for hit in &hits {
            let voxel = hit.ray / 6;
            let Some(position) = chunk.get(voxel) else {
                continue;
            };
            let distance = Vec3::from_array(hit.location).distance(position.as_vec3());
            if distance >= NORMAL_RANGE {
                continue;
            }
            match nearest.get_mut(voxel) {
                Some(slot @ None) => *slot = Some((distance, hit.triangle)),
                Some(Some(best)) if distance < best.0 => *best = (distance, hit.triangle),
                _ => {}
            }
        }

        for (position, found) in chunk.iter().zip(nearest) {
            let normal = found.and_then(|(_, triangle)| mesh.triangle_normal(triangle));
            if let Some(normal) = normal {
                grid.set_normal(*position, normal.to_array());
                assigned += 1;
            }
        }
    }

    assigned
}
