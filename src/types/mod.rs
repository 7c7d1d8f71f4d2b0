//! Shared types used throughout the library.

mod color;
mod direction;

pub use color::{clamp_unit, from_rgba8, interpolate3, rgb_distance_squared, Rgba, NEUTRAL_GRAY};
pub use direction::{Axis, Direction};

use serde::{Deserialize, Serialize};

/// An integer position on the voxel lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelPosition {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Round a floating point location to the nearest lattice point.
    pub fn round(p: [f32; 3]) -> Self {
        Self {
            x: p[0].round() as i32,
            y: p[1].round() as i32,
            z: p[2].round() as i32,
        }
    }

    /// Get the neighboring position in the given direction.
    pub fn neighbor(&self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        self.offset(dx, dy, dz)
    }

    /// Get the position shifted by the given deltas.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Component along an axis.
    pub fn get(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn to_array(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Center of the voxel in floating point space.
    pub fn as_vec3(&self) -> glam::Vec3 {
        glam::Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl From<[i32; 3]> for VoxelPosition {
    fn from(p: [i32; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl Iterator<Item = [f32; 3]>) -> Option<Self> {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        let mut has_points = false;

        for p in points {
            has_points = true;
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        if has_points {
            Some(Self { min, max })
        } else {
            None
        }
    }

    pub fn dimensions(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Integer lattice range covering this box (floor of min, ceil of max).
    pub fn lattice_range(&self) -> ([i32; 3], [i32; 3]) {
        let mut lo = [0; 3];
        let mut hi = [0; 3];
        for i in 0..3 {
            lo[i] = self.min[i].floor() as i32;
            hi[i] = self.max[i].ceil() as i32;
        }
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_lattice() {
        assert_eq!(VoxelPosition::round([0.4, 0.6, -0.6]), VoxelPosition::new(0, 1, -1));
    }

    #[test]
    fn test_neighbor() {
        let p = VoxelPosition::new(1, 2, 3);
        assert_eq!(p.neighbor(Direction::Up), VoxelPosition::new(1, 3, 3));
        assert_eq!(p.neighbor(Direction::North), VoxelPosition::new(1, 2, 2));
        assert_eq!(p.get(Axis::Z), 3);
    }

    #[test]
    fn test_bounding_box() {
        let bb = BoundingBox::from_points([[0.5, 1.0, -2.0], [3.2, -1.0, 4.0]].into_iter()).unwrap();
        assert_eq!(bb.min, [0.5, -1.0, -2.0]);
        assert_eq!(bb.max, [3.2, 1.0, 4.0]);
        assert_eq!(bb.lattice_range(), ([0, -1, -2], [4, 1, 4]));
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }
}
