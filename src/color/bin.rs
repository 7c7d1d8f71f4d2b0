//! Color binning for palette-size reduction.

use crate::types::Rgba;

/// Floor every channel to one of `resolution` discrete levels.
///
/// A resolution of 0 leaves the color untouched.
pub fn bin_color(color: Rgba, resolution: u32) -> Rgba {
    if resolution == 0 {
        return color;
    }
    let r = resolution as f32;
    let mut binned = color;
    for c in binned.iter_mut() {
        *c = ((*c * r).floor() / r).clamp(0.0, 1.0);
    }
    binned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_floors_to_levels() {
        let binned = bin_color([0.49, 0.51, 0.99, 1.0], 2);
        assert_eq!(binned, [0.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_bin_output_is_on_grid() {
        let resolution = 32;
        let binned = bin_color([0.123, 0.456, 0.789, 0.5], resolution);
        for c in binned {
            let level = c * resolution as f32;
            assert!((level - level.round()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_zero_resolution_is_identity() {
        let color = [0.3, 0.2, 0.1, 1.0];
        assert_eq!(bin_color(color, 0), color);
    }
}
