//! Per-run cache of nearest-block lookups.

use crate::grid::FaceVisibility;
use crate::types::Rgba;
use std::collections::HashMap;

/// Cache from quantized color + visibility mask to a palette index.
///
/// Owned by a single assignment run; never shared between palettes.
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: HashMap<u32, usize>,
    hits: u64,
    misses: u64,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key from 8-bit RGB shifted above the six visibility bits.
    pub fn key(color: &Rgba, visibility: FaceVisibility) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u32;
        let rgb = (channel(color[0]) << 16) | (channel(color[1]) << 8) | channel(color[2]);
        (rgb << 6) | visibility.bits() as u32
    }

    pub fn get(&mut self, key: u32) -> Option<usize> {
        let found = self.entries.get(&key).copied();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn insert(&mut self, key: u32, palette_index: usize) {
        self.entries.insert(key, palette_index);
    }

    /// Number of distinct keys stored.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_separates_visibility() {
        let color = [1.0, 0.5, 0.0, 1.0];
        let a = MatchCache::key(&color, FaceVisibility::ALL);
        let b = MatchCache::key(&color, FaceVisibility::NONE);
        assert_ne!(a, b);
        assert_eq!(a >> 6, b >> 6);
        assert_eq!(b >> 6, (255 << 16) | (127 << 8));
    }

    #[test]
    fn test_hit_and_miss_counts() {
        let mut cache = MatchCache::new();
        assert_eq!(cache.get(7), None);
        cache.insert(7, 3);
        assert_eq!(cache.get(7), Some(3));
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }
}
