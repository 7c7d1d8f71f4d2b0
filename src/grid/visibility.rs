//! Six-bit face visibility masks.

use crate::types::Direction;

/// Which faces of a voxel are not hidden by an opaque neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaceVisibility(u8);

impl FaceVisibility {
    pub const NONE: FaceVisibility = FaceVisibility(0);
    pub const ALL: FaceVisibility = FaceVisibility(0b11_1111);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_visible(&self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    pub fn set(&mut self, direction: Direction) {
        self.0 |= direction.bit();
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Iterate over the visible directions.
    pub fn visible(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(move |d| self.is_visible(*d))
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }
}
