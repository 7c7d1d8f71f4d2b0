//! Ordered and random dithering applied to voxel colors before matching.
//!
//! Magnitudes are expressed in 8-bit channel units (0-255) while colors stay
//! in `[0, 1]`, so a magnitude of 32 perturbs each channel by at most 16/255.

use crate::types::{Rgba, VoxelPosition};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Dithering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DitherMode {
    Off,
    /// Position-indexed 8x8 Bayer threshold.
    #[default]
    Ordered,
    /// Independent uniform offset per voxel.
    Random,
}

/// 8x8 Bayer matrix, values 0..64.
const BAYER_8X8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Threshold in `[-0.5, 0.5)` for a voxel, indexed by `((x + z) mod 8, y mod 8)`.
pub fn ordered_threshold(position: VoxelPosition) -> f32 {
    let column = (position.x + position.z).rem_euclid(8) as usize;
    let row = position.y.rem_euclid(8) as usize;
    BAYER_8X8[row][column] as f32 / 64.0 - 0.5
}

fn offset_rgb(color: Rgba, offsets: [f32; 3]) -> Rgba {
    [
        (color[0] + offsets[0]).clamp(0.0, 1.0),
        (color[1] + offsets[1]).clamp(0.0, 1.0),
        (color[2] + offsets[2]).clamp(0.0, 1.0),
        color[3],
    ]
}

/// Apply ordered dithering: the same threshold is added to all RGB channels.
pub fn apply_ordered(color: Rgba, position: VoxelPosition, magnitude: f32) -> Rgba {
    if magnitude == 0.0 {
        return color;
    }
    let offset = ordered_threshold(position) * magnitude / 255.0;
    offset_rgb(color, [offset; 3])
}

/// Apply random dithering with an independent offset per channel.
pub fn apply_random<R: Rng>(color: Rgba, rng: &mut R, magnitude: f32) -> Rgba {
    if magnitude == 0.0 {
        return color;
    }
    let scale = magnitude / 255.0;
    let mut offsets = [0.0; 3];
    for o in offsets.iter_mut() {
        *o = (rng.gen::<f32>() - 0.5) * scale;
    }
    offset_rgb(color, offsets)
}

/// Seed for the random offset of one voxel, so random dithering is
/// reproducible for a run seed and independent of processing order.
pub fn position_seed(run_seed: u64, position: VoxelPosition) -> u64 {
    let mut rng = StdRng::seed_from_u64(run_seed);
    let x = rng.gen::<u64>() ^ StdRng::seed_from_u64(position.x as u64).gen::<u64>();
    let y = rng.gen::<u64>() ^ StdRng::seed_from_u64(position.y as u64).gen::<u64>().rotate_left(21);
    let z = rng.gen::<u64>() ^ StdRng::seed_from_u64(position.z as u64).gen::<u64>().rotate_left(42);
    x ^ y ^ z
}

/// Dither a voxel color with the given policy.
pub fn dither(color: Rgba, position: VoxelPosition, mode: DitherMode, magnitude: f32, seed: u64) -> Rgba {
    match mode {
        DitherMode::Off => color,
        DitherMode::Ordered => apply_ordered(color, position, magnitude),
        DitherMode::Random => {
            let mut rng = StdRng::seed_from_u64(position_seed(seed, position));
            apply_random(color, &mut rng, magnitude)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_colors() -> Vec<Rgba> {
        vec![
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [0.02, 0.5, 0.98, 1.0],
            [0.3, 0.7, 0.1, 0.5],
        ]
    }

    #[test]
    fn test_threshold_range() {
        for y in 0..8 {
            for x in 0..8 {
                let t = ordered_threshold(VoxelPosition::new(x, y, 0));
                assert!((-0.5..0.5).contains(&t));
            }
        }
    }

    #[test]
    fn test_dithering_bounded() {
        for color in sample_colors() {
            for magnitude in [1.0, 32.0, 128.0, 255.0, 1000.0] {
                for (i, mode) in [DitherMode::Ordered, DitherMode::Random].into_iter().enumerate() {
                    let pos = VoxelPosition::new(i as i32 * 3, 7, -5);
                    let out = dither(color, pos, mode, magnitude, 42);
                    for c in out.iter().take(3) {
                        assert!((0.0..=1.0).contains(c), "{:?} out of range", out);
                    }
                    assert_eq!(out[3], color[3]);
                }
            }
        }
    }

    #[test]
    fn test_zero_magnitude_is_identity() {
        for color in sample_colors() {
            let pos = VoxelPosition::new(3, 1, 4);
            assert_eq!(dither(color, pos, DitherMode::Ordered, 0.0, 7), color);
            assert_eq!(dither(color, pos, DitherMode::Random, 0.0, 7), color);
            assert_eq!(dither(color, pos, DitherMode::Off, 64.0, 7), color);
        }
    }

    #[test]
    fn test_ordered_is_deterministic_and_periodic() {
        let color = [0.4, 0.5, 0.6, 1.0];
        let pos = VoxelPosition::new(3, 5, 2);
        let first = apply_ordered(color, pos, 32.0);
        assert_eq!(first, apply_ordered(color, pos, 32.0));

        for (dx, dy, dz) in [(8, 0, 0), (0, 8, 0), (0, 0, 8), (-16, 24, 8)] {
            let shifted = pos.offset(dx, dy, dz);
            assert_eq!(ordered_threshold(pos), ordered_threshold(shifted));
            assert_eq!(apply_ordered(color, shifted, 32.0), first);
        }
    }

    #[test]
    fn test_ordered_handles_negative_positions() {
        let a = ordered_threshold(VoxelPosition::new(-1, -1, 0));
        let b = ordered_threshold(VoxelPosition::new(7, 7, 0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_reproducible_per_seed() {
        let color = [0.5, 0.5, 0.5, 1.0];
        let pos = VoxelPosition::new(10, 20, 30);
        let a = dither(color, pos, DitherMode::Random, 64.0, 1);
        let b = dither(color, pos, DitherMode::Random, 64.0, 1);
        assert_eq!(a, b);
        assert!((0..3).any(|c| (a[c] - 0.5).abs() > 0.0));
    }
}
