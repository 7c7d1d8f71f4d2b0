//! Block atlas: reference colors of the candidate block types.
//!
//! The atlas is loaded once (see [`loader`]) and then shared read-only for
//! the lifetime of a run. Each entry has a global reference color and six
//! face colors with a per-face variance ("std") describing how non-uniform
//! the face texture is.

pub mod loader;

use crate::error::{Result, VoxelizerError};
use crate::grid::FaceVisibility;
use crate::types::{Direction, Rgba};
use std::collections::HashMap;

/// Reference color and texture variance of one block face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceColor {
    pub color: Rgba,
    pub std: f32,
}

/// One candidate block type.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasEntry {
    /// Block name, e.g. "minecraft:red_concrete".
    pub name: String,
    /// Global average color.
    pub color: Rgba,
    /// Face colors indexed by [`Direction::index`].
    pub faces: [FaceColor; 6],
}

impl AtlasEntry {
    /// Create an entry whose faces all use the global color with zero variance.
    pub fn uniform(name: impl Into<String>, color: Rgba) -> Self {
        Self {
            name: name.into(),
            color,
            faces: [FaceColor { color, std: 0.0 }; 6],
        }
    }

    pub fn with_face(mut self, direction: Direction, color: Rgba, std: f32) -> Self {
        self.faces[direction.index()] = FaceColor { color, std };
        self
    }

    pub fn face(&self, direction: Direction) -> &FaceColor {
        &self.faces[direction.index()]
    }

    /// Average color and variance over the visible faces.
    ///
    /// With no visible face the global color and zero variance are returned.
    pub fn contextual_color(&self, visibility: FaceVisibility) -> (Rgba, f32) {
        if visibility.is_none() {
            return (self.color, 0.0);
        }

        let mut color = [0.0f32; 4];
        let mut std = 0.0f32;
        let mut count = 0.0f32;
        for direction in visibility.visible() {
            let face = self.face(direction);
            for c in 0..4 {
                color[c] += face.color[c];
            }
            std += face.std;
            count += 1.0;
        }

        for c in color.iter_mut() {
            *c /= count;
        }
        (color, std / count)
    }
}

/// Lookup table of block name to reference colors.
#[derive(Debug, Clone)]
pub struct BlockAtlas {
    entries: Vec<AtlasEntry>,
    index: HashMap<String, usize>,
}

impl BlockAtlas {
    /// Build an atlas from entries. Later duplicates replace earlier ones.
    pub fn from_entries(entries: Vec<AtlasEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(VoxelizerError::EmptyAtlas(
                "no block entries supplied".to_string(),
            ));
        }

        let mut atlas = Self {
            entries: Vec::with_capacity(entries.len()),
            index: HashMap::with_capacity(entries.len()),
        };
        for entry in entries {
            match atlas.index.get(&entry.name) {
                Some(&i) => atlas.entries[i] = entry,
                None => {
                    atlas.index.insert(entry.name.clone(), atlas.entries.len());
                    atlas.entries.push(entry);
                }
            }
        }
        Ok(atlas)
    }

    pub fn lookup(&self, name: &str) -> Option<&AtlasEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All block names, in load order.
    pub fn all_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtlasEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass_like() -> AtlasEntry {
        AtlasEntry::uniform("minecraft:grass_block", [0.5, 0.4, 0.3, 1.0])
            .with_face(Direction::Up, [0.2, 0.8, 0.2, 1.0], 0.1)
            .with_face(Direction::Down, [0.5, 0.3, 0.1, 1.0], 0.3)
    }

    #[test]
    fn test_contextual_top_only() {
        let entry = grass_like();
        let mut vis = FaceVisibility::NONE;
        vis.set(Direction::Up);
        let (color, std) = entry.contextual_color(vis);
        assert_eq!(color, [0.2, 0.8, 0.2, 1.0]);
        assert_eq!(std, 0.1);
    }

    #[test]
    fn test_contextual_uniform_average() {
        let entry = grass_like();
        let mut vis = FaceVisibility::NONE;
        vis.set(Direction::Up);
        vis.set(Direction::Down);
        let (color, std) = entry.contextual_color(vis);
        assert!((color[0] - 0.35).abs() < 1e-6);
        assert!((color[1] - 0.55).abs() < 1e-6);
        assert!((std - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_contextual_none_uses_global() {
        let entry = grass_like();
        assert_eq!(entry.contextual_color(FaceVisibility::NONE), (entry.color, 0.0));
    }

    #[test]
    fn test_atlas_lookup() {
        let atlas = BlockAtlas::from_entries(vec![
            AtlasEntry::uniform("a", [1.0, 0.0, 0.0, 1.0]),
            AtlasEntry::uniform("b", [0.0, 1.0, 0.0, 1.0]),
            AtlasEntry::uniform("a", [0.0, 0.0, 1.0, 1.0]),
        ])
        .unwrap();
        assert_eq!(atlas.len(), 2);
        assert_eq!(atlas.all_names(), vec!["a", "b"]);
        assert_eq!(atlas.lookup("a").unwrap().color, [0.0, 0.0, 1.0, 1.0]);
        assert!(atlas.lookup("c").is_none());
    }

    #[test]
    fn test_empty_atlas_is_error() {
        assert!(matches!(
            BlockAtlas::from_entries(Vec::new()),
            Err(VoxelizerError::EmptyAtlas(_))
        ));
    }
}
