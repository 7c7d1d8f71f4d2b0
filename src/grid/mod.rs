//! Sparse voxel grid with accumulated colors.
//!
//! The grid is keyed by integer lattice position. Every ray hit rounds to the
//! nearest lattice point and contributes its color according to the
//! configured [`OverlapRule`].

mod visibility;

pub use visibility::FaceVisibility;

use crate::types::{Direction, Rgba, VoxelPosition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How colors from several hits on the same voxel are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapRule {
    /// Keep the first contributing color.
    First,
    /// Running mean of all contributing colors.
    #[default]
    Average,
}

/// One occupied lattice cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Voxel {
    pub position: VoxelPosition,
    /// Accumulated RGBA in `[0, 1]`.
    pub color: Rgba,
    /// Number of hits folded into `color`.
    pub hits: u32,
    /// Estimated unit surface normal, if any.
    pub normal: Option<[f32; 3]>,
}

impl Voxel {
    pub fn is_opaque(&self) -> bool {
        self.color[3] >= 1.0
    }
}

/// Sparse map from lattice position to voxel.
#[derive(Debug, Clone, Default)]
pub struct VoxelGrid {
    voxels: HashMap<VoxelPosition, Voxel>,
    overlap_rule: OverlapRule,
}

impl VoxelGrid {
    pub fn new(overlap_rule: OverlapRule) -> Self {
        Self {
            voxels: HashMap::new(),
            overlap_rule,
        }
    }

    pub fn overlap_rule(&self) -> OverlapRule {
        self.overlap_rule
    }

    /// Add a hit at a floating point location.
    ///
    /// Returns `false` if the color was rejected (zero alpha) or ignored under
    /// the `First` rule.
    pub fn add(&mut self, location: [f32; 3], color: Rgba) -> bool {
        self.add_at(VoxelPosition::round(location), color)
    }

    /// Add a hit at a lattice position.
    pub fn add_at(&mut self, position: VoxelPosition, color: Rgba) -> bool {
        if color[3] <= 0.0 {
            return false;
        }

        match self.voxels.get_mut(&position) {
            Some(existing) => match self.overlap_rule {
                OverlapRule::First => false,
                OverlapRule::Average => {
                    let n = existing.hits as f32;
                    for c in 0..4 {
                        existing.color[c] = (existing.color[c] * n + color[c]) / (n + 1.0);
                    }
                    existing.hits += 1;
                    true
                }
            },
            None => {
                self.voxels.insert(
                    position,
                    Voxel {
                        position,
                        color,
                        hits: 1,
                        normal: None,
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, position: VoxelPosition) -> Option<&Voxel> {
        self.voxels.get(&position)
    }

    pub fn contains(&self, position: VoxelPosition) -> bool {
        self.voxels.contains_key(&position)
    }

    /// Check if a fully opaque voxel exists at a position.
    pub fn is_opaque_at(&self, position: VoxelPosition) -> bool {
        self.voxels.get(&position).is_some_and(Voxel::is_opaque)
    }

    /// Faces of the voxel at `position` not hidden by an opaque neighbor.
    pub fn face_visibility(&self, position: VoxelPosition) -> FaceVisibility {
        let mut visibility = FaceVisibility::NONE;
        for direction in Direction::ALL {
            if !self.is_opaque_at(position.neighbor(direction)) {
                visibility.set(direction);
            }
        }
        visibility
    }

    /// Attach a surface normal estimate to an existing voxel.
    pub fn set_normal(&mut self, position: VoxelPosition, normal: [f32; 3]) {
        if let Some(voxel) = self.voxels.get_mut(&position) {
            voxel.normal = Some(normal);
        }
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voxel> {
        self.voxels.values()
    }

    /// All voxels ordered by position (x, then y, then z).
    pub fn sorted_voxels(&self) -> Vec<&Voxel> {
        let mut voxels: Vec<_> = self.voxels.values().collect();
        voxels.sort_by_key(|v| v.position);
        voxels
    }

    /// Inclusive (min, max) lattice bounds, or `None` if empty.
    pub fn bounds(&self) -> Option<(VoxelPosition, VoxelPosition)> {
        let mut iter = self.voxels.keys();
        let first = *iter.next()?;
        let (mut min, mut max) = (first, first);
        for p in iter {
            min = VoxelPosition::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = VoxelPosition::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Some((min, max))
    }

    /// Size of the occupied region in voxels along each axis.
    pub fn dimensions(&self) -> [i32; 3] {
        match self.bounds() {
            Some((min, max)) => [max.x - min.x + 1, max.y - min.y + 1, max.z - min.z + 1],
            None => [0, 0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const C1: Rgba = [0.9, 0.1, 0.0, 1.0];
    const C2: Rgba = [0.3, 0.4, 0.5, 1.0];
    const C3: Rgba = [0.0, 1.0, 0.7, 1.0];

    #[test]
    fn test_average_rule_is_mean() {
        let mut grid = VoxelGrid::new(OverlapRule::Average);
        grid.add([1.1, 2.0, 2.9], C1);
        grid.add([0.9, 2.2, 3.0], C2);
        grid.add([1.0, 1.8, 3.4], C3);

        assert_eq!(grid.len(), 1);
        let voxel = grid.get(VoxelPosition::new(1, 2, 3)).unwrap();
        assert_eq!(voxel.hits, 3);
        for c in 0..3 {
            assert_relative_eq!(voxel.color[c], (C1[c] + C2[c] + C3[c]) / 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_first_rule_keeps_first() {
        for (second, third) in [(C2, C3), (C3, C2)] {
            let mut grid = VoxelGrid::new(OverlapRule::First);
            assert!(grid.add([0.0; 3], C1));
            assert!(!grid.add([0.0; 3], second));
            assert!(!grid.add([0.0; 3], third));
            let voxel = grid.get(VoxelPosition::new(0, 0, 0)).unwrap();
            assert_eq!(voxel.color, C1);
            assert_eq!(voxel.hits, 1);
        }
    }

    #[test]
    fn test_zero_alpha_rejected() {
        let mut grid = VoxelGrid::new(OverlapRule::Average);
        assert!(!grid.add([0.0; 3], [1.0, 1.0, 1.0, 0.0]));
        assert!(grid.is_empty());

        grid.add([0.0; 3], C1);
        grid.add([0.0; 3], [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(grid.get(VoxelPosition::new(0, 0, 0)).unwrap().color, C1);
    }

    #[test]
    fn test_face_visibility() {
        let mut grid = VoxelGrid::new(OverlapRule::Average);
        let center = VoxelPosition::new(0, 0, 0);
        grid.add_at(center, C1);
        assert_eq!(grid.face_visibility(center), FaceVisibility::ALL);

        // Opaque neighbor above hides the top face
        grid.add_at(center.neighbor(Direction::Up), C2);
        // Translucent neighbor to the east does not
        grid.add_at(center.neighbor(Direction::East), [0.2, 0.2, 0.2, 0.5]);

        let vis = grid.face_visibility(center);
        assert!(!vis.is_visible(Direction::Up));
        assert!(vis.is_visible(Direction::East));
        assert_eq!(vis.count(), 5);
    }

    #[test]
    fn test_fully_enclosed_voxel_has_no_visible_faces() {
        let mut grid = VoxelGrid::new(OverlapRule::First);
        let center = VoxelPosition::new(5, 5, 5);
        grid.add_at(center, C1);
        for d in Direction::ALL {
            grid.add_at(center.neighbor(d), C2);
        }
        assert!(grid.face_visibility(center).is_none());
    }

    #[test]
    fn test_bounds_and_dimensions() {
        let mut grid = VoxelGrid::new(OverlapRule::Average);
        assert_eq!(grid.dimensions(), [0, 0, 0]);
        grid.add_at(VoxelPosition::new(0, 0, 0), C1);
        grid.add_at(VoxelPosition::new(3, -1, 2), C1);
        assert_eq!(
            grid.bounds(),
            Some((VoxelPosition::new(0, -1, 0), VoxelPosition::new(3, 0, 2)))
        );
        assert_eq!(grid.dimensions(), [4, 2, 3]);
        assert_eq!(grid.sorted_voxels()[0].position, VoxelPosition::new(0, 0, 0));
    }
}
