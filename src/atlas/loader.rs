//! Atlas loading from the declarative JSON resource.
//!
//! Format:
//!
//! ```json
//! { "blocks": [
//!     { "name": "minecraft:stone",
//!       "colour": { "r": 0.49, "g": 0.49, "b": 0.49, "a": 1.0 },
//!       "faceColours": {
//!         "up": { "colour": { "r": 0.5, "g": 0.5, "b": 0.5, "a": 1.0 }, "std": 0.04 }
//!       } }
//! ] }
//! ```
//!
//! Channels are either all in `[0, 1]` or all in `[0, 255]` within one file;
//! a file with any channel above 1 is treated as 8-bit. Missing faces use
//! the global color with zero variance.

use super::{AtlasEntry, BlockAtlas, FaceColor};
use crate::error::{Result, VoxelizerError};
use crate::types::Direction;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct AtlasFile {
    #[serde(default)]
    blocks: Vec<BlockRecord>,
}

#[derive(Debug, Deserialize)]
struct BlockRecord {
    name: String,
    #[serde(alias = "color")]
    colour: ColourRecord,
    #[serde(default, rename = "faceColours", alias = "faceColors", alias = "faces")]
    face_colours: HashMap<String, FaceRecord>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ColourRecord {
    r: f32,
    g: f32,
    b: f32,
    #[serde(default)]
    a: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct FaceRecord {
    #[serde(alias = "color")]
    colour: ColourRecord,
    #[serde(default)]
    std: f32,
}

impl ColourRecord {
    fn max_channel(&self) -> f32 {
        self.r.max(self.g).max(self.b).max(self.a.unwrap_or(0.0))
    }

    fn to_rgba(self, scale: f32) -> [f32; 4] {
        [
            (self.r / scale).clamp(0.0, 1.0),
            (self.g / scale).clamp(0.0, 1.0),
            (self.b / scale).clamp(0.0, 1.0),
            self.a.map(|a| (a / scale).clamp(0.0, 1.0)).unwrap_or(1.0),
        ]
    }
}

/// Load an atlas from a file path.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<BlockAtlas> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VoxelizerError::AtlasNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let atlas = load_from_str(&contents)?;
    log::info!("loaded {} atlas blocks from {}", atlas.len(), path.display());
    Ok(atlas)
}

/// Load an atlas from JSON bytes.
pub fn load_from_bytes(data: &[u8]) -> Result<BlockAtlas> {
    let file: AtlasFile = serde_json::from_slice(data)?;
    build_atlas(file)
}

/// Load an atlas from a JSON string.
pub fn load_from_str(contents: &str) -> Result<BlockAtlas> {
    let file: AtlasFile = serde_json::from_str(contents)?;
    build_atlas(file)
}

fn build_atlas(file: AtlasFile) -> Result<BlockAtlas> {
    if file.blocks.is_empty() {
        return Err(VoxelizerError::EmptyAtlas(
            "atlas resource lists no blocks".to_string(),
        ));
    }

    let max_channel = file
        .blocks
        .iter()
        .flat_map(|b| {
            std::iter::once(b.colour.max_channel())
                .chain(b.face_colours.values().map(|f| f.colour.max_channel()))
        })
        .fold(0.0f32, f32::max);
    let scale = if max_channel > 1.0 { 255.0 } else { 1.0 };

    let mut entries = Vec::with_capacity(file.blocks.len());
    for block in file.blocks {
        if block.name.is_empty() {
            return Err(VoxelizerError::InvalidAtlasEntry(
                "block with empty name".to_string(),
            ));
        }

        let color = block.colour.to_rgba(scale);
        let mut faces = [FaceColor { color, std: 0.0 }; 6];
        for (face_name, face) in &block.face_colours {
            match Direction::from_str(face_name) {
                Some(direction) => {
                    faces[direction.index()] = FaceColor {
                        color: face.colour.to_rgba(scale),
                        std: face.std,
                    };
                }
                None => log::warn!(
                    "ignoring unknown face '{}' on atlas block {}",
                    face_name,
                    block.name
                ),
            }
        }

        entries.push(AtlasEntry {
            name: block.name,
            color,
            faces,
        });
    }

    BlockAtlas::from_entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NORMALIZED: &str = r#"{
        "blocks": [
            { "name": "minecraft:red_concrete",
              "colour": { "r": 0.55, "g": 0.13, "b": 0.13, "a": 1.0 } },
            { "name": "minecraft:grass_block",
              "colour": { "r": 0.5, "g": 0.45, "b": 0.3, "a": 1.0 },
              "faceColours": {
                  "up": { "colour": { "r": 0.3, "g": 0.6, "b": 0.2, "a": 1.0 }, "std": 0.05 },
                  "down": { "colour": { "r": 0.5, "g": 0.35, "b": 0.25, "a": 1.0 }, "std": 0.08 }
              } }
        ]
    }"#;

    #[test]
    fn test_load_normalized_atlas() {
        let atlas = load_from_str(NORMALIZED).unwrap();
        assert_eq!(atlas.len(), 2);

        let red = atlas.lookup("minecraft:red_concrete").unwrap();
        assert_eq!(red.color, [0.55, 0.13, 0.13, 1.0]);
        for dir in Direction::ALL {
            assert_eq!(red.face(dir).color, red.color);
            assert_eq!(red.face(dir).std, 0.0);
        }

        let grass = atlas.lookup("minecraft:grass_block").unwrap();
        assert_eq!(grass.face(Direction::Up).color, [0.3, 0.6, 0.2, 1.0]);
        assert_eq!(grass.face(Direction::Up).std, 0.05);
        // Faces missing from the table default to the global color
        assert_eq!(grass.face(Direction::North).color, grass.color);
    }

    #[test]
    fn test_load_8bit_atlas() {
        let json = r#"{ "blocks": [
            { "name": "blue", "colour": { "r": 0, "g": 0, "b": 255 } },
            { "name": "white", "color": { "r": 255, "g": 255, "b": 255, "a": 255 } }
        ] }"#;
        let atlas = load_from_str(json).unwrap();
        assert_eq!(atlas.lookup("blue").unwrap().color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(atlas.lookup("white").unwrap().color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_empty_atlas_is_fatal() {
        assert!(matches!(
            load_from_str(r#"{ "blocks": [] }"#),
            Err(VoxelizerError::EmptyAtlas(_))
        ));
        assert!(matches!(load_from_str("{}"), Err(VoxelizerError::EmptyAtlas(_))));
    }

    #[test]
    fn test_missing_atlas_is_fatal() {
        let result = load_from_path("/definitely/not/here/vanilla.atlas");
        assert!(matches!(result, Err(VoxelizerError::AtlasNotFound(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(load_from_str("{ blocks"), Err(VoxelizerError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(NORMALIZED.as_bytes()).unwrap();
        let atlas = load_from_path(file.path()).unwrap();
        assert_eq!(atlas.all_names(), vec!["minecraft:red_concrete", "minecraft:grass_block"]);
    }
}
