//! Uniform scaling and translation of meshes onto the voxel lattice.

use super::Mesh;
use crate::error::{Result, VoxelizerError};
use crate::types::Axis;

/// Scale a mesh uniformly so its extent along `axis` equals `target_size - 1`.
///
/// Returns the scaled mesh and the scale factor, or `None` when the mesh has
/// no extent along `axis` and so no scale fits. The source mesh is untouched.
pub fn scale_to_size(mesh: &Mesh, target_size: u32, axis: Axis) -> Result<Option<(Mesh, f32)>> {
    if target_size == 0 {
        return Err(VoxelizerError::InvalidConfig(
            "target size must be at least 1".to_string(),
        ));
    }

    let extent = mesh.dimensions()[axis.index()];
    if !(extent > f32::EPSILON) {
        return Ok(None);
    }

    let scale = (target_size - 1) as f32 / extent;
    let mut scaled = mesh.clone();
    for v in scaled.vertices.iter_mut() {
        for c in v.iter_mut() {
            *c *= scale;
        }
    }
    Ok(Some((scaled, scale)))
}

/// Offset applied along the constrained axis for even target sizes, so voxel
/// centers land on integer coordinates for both parities.
pub fn even_size_offset(target_size: u32, axis: Axis) -> [f32; 3] {
    let mut offset = [0.0; 3];
    if target_size % 2 == 0 {
        offset[axis.index()] = 0.5;
    }
    offset
}

/// Translate every vertex by `delta`.
pub fn translate(mesh: &Mesh, delta: [f32; 3]) -> Mesh {
    let mut moved = mesh.clone();
    for v in moved.vertices.iter_mut() {
        v[0] += delta[0];
        v[1] += delta[1];
        v[2] += delta[2];
    }
    moved
}

/// Translate a mesh so its minimum bound sits at the origin.
pub fn normalize_position(mesh: &Mesh) -> Mesh {
    match mesh.bounds() {
        Some(bounds) => translate(mesh, [-bounds.min[0], -bounds.min[1], -bounds.min[2]]),
        None => mesh.clone(),
    }
}

/// Scale a mesh to `target_size` along `axis` and place it on the lattice.
///
/// With `normalize` set, the minimum bound is moved to the origin before the
/// even-size offset is applied, so every vertex coordinate is non-negative.
/// A mesh with zero extent along `axis` yields `None`.
pub fn fit_to_lattice(mesh: &Mesh, target_size: u32, axis: Axis, normalize: bool) -> Result<Option<Mesh>> {
    let Some((scaled, scale)) = scale_to_size(mesh, target_size, axis)? else {
        return Ok(None);
    };
    log::debug!("scaled mesh by {:.4} to size {} along {}", scale, target_size, axis);

    let placed = if normalize {
        normalize_position(&scaled)
    } else {
        scaled
    };
    Ok(Some(translate(&placed, even_size_offset(target_size, axis))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::unit_cube;
    use approx::assert_relative_eq;

    fn skewed_mesh() -> Mesh {
        Mesh::new(
            vec![[-3.0, 2.0, 5.0], [4.0, -1.5, 6.5], [0.5, 7.0, -2.0]],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_scale_extent_matches_target() {
        let mesh = skewed_mesh();
        for axis in Axis::ALL {
            for target in [1u32, 2, 7, 10, 80, 255] {
                let (scaled, _) = scale_to_size(&mesh, target, axis).unwrap().unwrap();
                let extent = scaled.dimensions()[axis.index()];
                assert_relative_eq!(extent, (target - 1) as f32, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_scale_is_uniform() {
        let (scaled, scale) = scale_to_size(&unit_cube([1.0; 4]), 10, Axis::Y).unwrap().unwrap();
        assert_relative_eq!(scale, 9.0);
        assert_eq!(scaled.dimensions(), [9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_scale_rejects_zero_target() {
        assert!(matches!(
            scale_to_size(&skewed_mesh(), 0, Axis::Y),
            Err(VoxelizerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_flat_axis_has_no_scale() {
        let flat = Mesh::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]], vec![[0, 1, 2]]);
        assert!(scale_to_size(&flat, 10, Axis::Y).unwrap().is_none());
        assert!(fit_to_lattice(&flat, 10, Axis::Y, true).unwrap().is_none());
        // Flat along Y but not along X
        assert!(fit_to_lattice(&flat, 10, Axis::X, true).unwrap().is_some());
    }

    #[test]
    fn test_normalize_non_negative() {
        let normalized = normalize_position(&skewed_mesh());
        for v in &normalized.vertices {
            assert!(v.iter().all(|&c| c >= 0.0));
        }
        assert_eq!(normalized.bounds().unwrap().min, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fit_even_and_odd() {
        let even = fit_to_lattice(&skewed_mesh(), 10, Axis::Y, true).unwrap().unwrap();
        let b = even.bounds().unwrap();
        assert_relative_eq!(b.min[1], 0.5);
        assert_relative_eq!(b.min[0], 0.0);

        let odd = fit_to_lattice(&skewed_mesh(), 9, Axis::Y, true).unwrap().unwrap();
        assert_relative_eq!(odd.bounds().unwrap().min[1], 0.0);
    }
}
