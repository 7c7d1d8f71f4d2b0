//! Texture images and nearest-texel sampling.

use crate::types::{from_rgba8, Rgba};
use std::path::Path;

/// Raw RGBA8 texture data.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    /// RGBA8 pixel data (4 bytes per pixel), top row first.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Create a new texture from RGBA data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Get a pixel at (x, y), with (0, 0) at the top-left.
    ///
    /// Coordinates outside the image, or past the end of the pixel data,
    /// read as opaque white.
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [255, 255, 255, 255];
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        match self.pixels.get(idx..idx + 4) {
            Some(p) => [p[0], p[1], p[2], p[3]],
            None => [255, 255, 255, 255],
        }
    }

    /// Sample the nearest texel at a UV coordinate.
    ///
    /// UVs wrap into `[0, 1)`; V runs bottom-to-top so the row is flipped
    /// against the top-left image origin.
    pub fn sample(&self, uv: [f32; 2]) -> Rgba {
        if self.width == 0 || self.height == 0 {
            return [1.0, 1.0, 1.0, 1.0];
        }

        let u = uv[0].rem_euclid(1.0);
        let v = uv[1].rem_euclid(1.0);

        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = (u * max_x).clamp(0.0, max_x) as u32;
        let y = ((1.0 - v) * max_y).clamp(0.0, max_y) as u32;

        from_rgba8(self.get_pixel(x, y))
    }
}

/// Load a texture from encoded image bytes (PNG or JPEG).
pub fn load_texture_from_bytes(data: &[u8]) -> Result<TextureData, image::ImageError> {
    let img = image::load_from_memory(data)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TextureData {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Load a texture from an image file.
pub fn load_texture_from_path<P: AsRef<Path>>(path: P) -> Result<TextureData, image::ImageError> {
    let rgba = image::open(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TextureData {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_texture() -> TextureData {
        // Top row: red, green. Bottom row: blue, white.
        TextureData::new(
            2,
            2,
            vec![
                255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 255, 255,
            ],
        )
    }

    #[test]
    fn test_get_pixel() {
        let tex = quad_texture();
        assert_eq!(tex.get_pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(tex.get_pixel(1, 0), [0, 255, 0, 255]);
        assert_eq!(tex.get_pixel(0, 1), [0, 0, 255, 255]);
        assert_eq!(tex.get_pixel(1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn test_sample_flips_v() {
        let tex = quad_texture();
        // v = 0 is the bottom of the image
        assert_eq!(tex.sample([0.0, 0.0]), [0.0, 0.0, 1.0, 1.0]);
        // v close to 1 is the top
        assert_eq!(tex.sample([0.0, 0.99]), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_sample_wraps() {
        let tex = quad_texture();
        assert_eq!(tex.sample([1.0, 1.0]), tex.sample([0.0, 0.0]));
        assert_eq!(tex.sample([-0.01, 0.0]), tex.sample([0.99, 0.0]));
    }

    #[test]
    fn test_get_pixel_out_of_range() {
        let tex = quad_texture();
        // Would otherwise read the first pixel of the next row
        assert_eq!(tex.get_pixel(2, 0), [255, 255, 255, 255]);
        assert_eq!(tex.get_pixel(0, 2), [255, 255, 255, 255]);

        // Row offset exceeds u32; pixel data is short
        let huge = TextureData::new(70_000, 70_000, vec![0; 16]);
        assert_eq!(huge.get_pixel(1, 69_999), [255, 255, 255, 255]);
        assert_eq!(huge.get_pixel(1, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_load_png_roundtrip() {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();

        let tex = load_texture_from_bytes(bytes.get_ref()).unwrap();
        assert_eq!(tex.width, 1);
        assert_eq!(tex.get_pixel(0, 0), [10, 20, 30, 255]);
    }
}
