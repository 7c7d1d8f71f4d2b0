//! RGBA color helpers. Colors are `[f32; 4]` with channels in `[0, 1]`.

/// An RGBA color with channels in `[0, 1]`.
pub type Rgba = [f32; 4];

/// Fallback color for surfaces with no color information.
pub const NEUTRAL_GRAY: Rgba = [0.5, 0.5, 0.5, 1.0];

/// Squared Euclidean distance over the RGB channels (alpha ignored).
pub fn rgb_distance_squared(a: &Rgba, b: &Rgba) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

/// Clamp every channel into `[0, 1]`.
pub fn clamp_unit(color: Rgba) -> Rgba {
    [
        color[0].clamp(0.0, 1.0),
        color[1].clamp(0.0, 1.0),
        color[2].clamp(0.0, 1.0),
        color[3].clamp(0.0, 1.0),
    ]
}

/// Weighted sum of three colors (barycentric interpolation).
pub fn interpolate3(colors: [&Rgba; 3], weights: [f32; 3]) -> Rgba {
    let mut out = [0.0; 4];
    for (color, w) in colors.iter().zip(weights) {
        for c in 0..4 {
            out[c] += color[c] * w;
        }
    }
    out
}

/// Convert 8-bit RGBA to float RGBA.
pub fn from_rgba8(pixel: [u8; 4]) -> Rgba {
    [
        pixel[0] as f32 / 255.0,
        pixel[1] as f32 / 255.0,
        pixel[2] as f32 / 255.0,
        pixel[3] as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_distance_ignores_alpha() {
        let a = [1.0, 0.0, 0.0, 1.0];
        let b = [1.0, 0.0, 0.0, 0.0];
        assert_eq!(rgb_distance_squared(&a, &b), 0.0);
        assert_eq!(rgb_distance_squared(&a, &[0.0, 0.0, 0.0, 1.0]), 1.0);
    }

    #[test]
    fn test_interpolate3() {
        let red = [1.0, 0.0, 0.0, 1.0];
        let green = [0.0, 1.0, 0.0, 1.0];
        let blue = [0.0, 0.0, 1.0, 1.0];
        let mixed = interpolate3([&red, &green, &blue], [0.5, 0.25, 0.25]);
        assert_eq!(mixed, [0.5, 0.25, 0.25, 1.0]);
    }

    #[test]
    fn test_from_rgba8() {
        assert_eq!(from_rgba8([255, 0, 255, 255]), [1.0, 0.0, 1.0, 1.0]);
    }
}
