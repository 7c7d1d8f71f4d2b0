//! Block assignment: map each voxel to the closest-matching atlas block.
//!
//! Each voxel color is optionally dithered and binned, then compared against
//! every palette entry with
//! `error = (1 - w) * rgb_distance² + w * face_std`.
//! In contextual mode the candidate color is the average over the voxel's
//! visible faces; in batched mode only global colors are used.

pub mod batch;
pub mod cache;
pub mod shape;

pub use cache::MatchCache;
pub use shape::{determine_block_shape, ShapeTag, SmoothInfo, StairHalf, SMOOTH_VARIANTS};

use crate::atlas::{AtlasEntry, BlockAtlas};
use crate::color::{bin_color, dither, DitherMode};
use crate::error::{Result, VoxelizerError};
use crate::grid::{FaceVisibility, Voxel, VoxelGrid};
use crate::types::{rgb_distance_squared, Rgba, VoxelPosition};
use serde::{Deserialize, Serialize};

/// Blocks used when no explicit palette is given, filtered against the atlas.
pub const DEFAULT_PALETTE: &[&str] = &[
    "minecraft:white_wool",
    "minecraft:orange_wool",
    "minecraft:magenta_wool",
    "minecraft:light_blue_wool",
    "minecraft:yellow_wool",
    "minecraft:lime_wool",
    "minecraft:pink_wool",
    "minecraft:gray_wool",
    "minecraft:light_gray_wool",
    "minecraft:cyan_wool",
    "minecraft:purple_wool",
    "minecraft:blue_wool",
    "minecraft:brown_wool",
    "minecraft:green_wool",
    "minecraft:red_wool",
    "minecraft:black_wool",
    "minecraft:white_concrete",
    "minecraft:orange_concrete",
    "minecraft:magenta_concrete",
    "minecraft:light_blue_concrete",
    "minecraft:yellow_concrete",
    "minecraft:lime_concrete",
    "minecraft:pink_concrete",
    "minecraft:gray_concrete",
    "minecraft:light_gray_concrete",
    "minecraft:cyan_concrete",
    "minecraft:purple_concrete",
    "minecraft:blue_concrete",
    "minecraft:brown_concrete",
    "minecraft:green_concrete",
    "minecraft:red_concrete",
    "minecraft:black_concrete",
    "minecraft:white_terracotta",
    "minecraft:orange_terracotta",
    "minecraft:magenta_terracotta",
    "minecraft:light_blue_terracotta",
    "minecraft:yellow_terracotta",
    "minecraft:lime_terracotta",
    "minecraft:pink_terracotta",
    "minecraft:gray_terracotta",
    "minecraft:light_gray_terracotta",
    "minecraft:cyan_terracotta",
    "minecraft:purple_terracotta",
    "minecraft:blue_terracotta",
    "minecraft:brown_terracotta",
    "minecraft:green_terracotta",
    "minecraft:red_terracotta",
    "minecraft:black_terracotta",
    "minecraft:terracotta",
    "minecraft:stone",
    "minecraft:granite",
    "minecraft:diorite",
    "minecraft:andesite",
    "minecraft:deepslate",
    "minecraft:cobblestone",
    "minecraft:oak_planks",
    "minecraft:spruce_planks",
    "minecraft:birch_planks",
    "minecraft:jungle_planks",
    "minecraft:acacia_planks",
    "minecraft:dark_oak_planks",
    "minecraft:sand",
    "minecraft:sandstone",
    "minecraft:red_sand",
    "minecraft:red_sandstone",
    "minecraft:bricks",
    "minecraft:prismarine",
    "minecraft:netherrack",
    "minecraft:obsidian",
    "minecraft:gold_block",
    "minecraft:iron_block",
    "minecraft:diamond_block",
    "minecraft:emerald_block",
    "minecraft:lapis_block",
    "minecraft:quartz_block",
    "minecraft:bone_block",
    "minecraft:snow_block",
];

/// Which matching strategy the assigner uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Per-voxel search with face-visibility context and a match cache.
    #[default]
    Contextual,
    /// Parallel bulk search against global colors only.
    Batched,
}

/// Block assigner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignerConfig {
    pub mode: MatchMode,
    pub dithering: DitherMode,
    /// Dithering strength in 8-bit channel units.
    pub dither_magnitude: f32,
    /// Seed for random dithering.
    pub dither_seed: u64,
    /// Quantize colors to `color_resolution` levels before matching.
    pub bin_colors: bool,
    pub color_resolution: u32,
    /// Match against visible-face colors instead of global colors.
    pub contextual: bool,
    /// Trade color fidelity (0) against texture flatness (1).
    pub error_weight: f32,
    /// Substitute stairs and slabs on sloped surfaces.
    pub smooth_blocks: bool,
    /// Explicit palette; `None` uses [`DEFAULT_PALETTE`].
    pub palette: Option<Vec<String>>,
}

impl Default for AssignerConfig {
    fn default() -> Self {
        Self {
            mode: MatchMode::Contextual,
            dithering: DitherMode::Ordered,
            dither_magnitude: 32.0,
            dither_seed: 0,
            bin_colors: false,
            color_resolution: 32,
            contextual: true,
            error_weight: 0.0,
            smooth_blocks: false,
            palette: None,
        }
    }
}

impl AssignerConfig {
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_dithering(mut self, mode: DitherMode, magnitude: f32) -> Self {
        self.dithering = mode;
        self.dither_magnitude = magnitude;
        self
    }

    pub fn with_palette<S: Into<String>>(mut self, palette: impl IntoIterator<Item = S>) -> Self {
        self.palette = Some(palette.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_contextual(mut self, contextual: bool) -> Self {
        self.contextual = contextual;
        self
    }

    pub fn with_error_weight(mut self, weight: f32) -> Self {
        self.error_weight = weight;
        self
    }

    pub fn with_smooth_blocks(mut self, smooth: bool) -> Self {
        self.smooth_blocks = smooth;
        self
    }

    pub fn with_binning(mut self, resolution: u32) -> Self {
        self.bin_colors = true;
        self.color_resolution = resolution;
        self
    }
}

/// One voxel mapped to a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedBlock {
    pub position: VoxelPosition,
    /// Voxel color before dithering.
    pub voxel_color: Rgba,
    pub block_name: String,
    /// Block-state suffix such as `[type=top]`, possibly empty.
    pub block_state: String,
    pub shape: ShapeTag,
}

impl AssignedBlock {
    /// A full-block assignment with no state suffix.
    pub fn new(position: VoxelPosition, voxel_color: Rgba, block_name: impl Into<String>) -> Self {
        Self {
            position,
            voxel_color,
            block_name: block_name.into(),
            block_state: String::new(),
            shape: ShapeTag::Full,
        }
    }

    /// Block name with its state suffix, e.g. `minecraft:oak_slab[type=top]`.
    pub fn full_block_id(&self) -> String {
        format!("{}{}", self.block_name, self.block_state)
    }
}

/// Matches voxel colors against a palette drawn from the atlas.
pub struct BlockAssigner<'a> {
    palette: Vec<&'a AtlasEntry>,
    config: AssignerConfig,
}

impl<'a> BlockAssigner<'a> {
    /// Create an assigner, filtering the palette against the atlas.
    ///
    /// Fails if no palette entry exists in the atlas.
    pub fn new(atlas: &'a BlockAtlas, config: AssignerConfig) -> Result<Self> {
        let palette: Vec<&AtlasEntry> = match &config.palette {
            Some(names) => names.iter().filter_map(|n| atlas.lookup(n)).collect(),
            None => DEFAULT_PALETTE.iter().filter_map(|n| atlas.lookup(n)).collect(),
        };

        if palette.is_empty() {
            return Err(VoxelizerError::EmptyPalette(format!(
                "none of the {} palette blocks are in the atlas ({} entries)",
                config.palette.as_ref().map(|p| p.len()).unwrap_or(DEFAULT_PALETTE.len()),
                atlas.len()
            )));
        }

        log::debug!("assigner palette has {} blocks", palette.len());
        Ok(Self { palette, config })
    }

    pub fn config(&self) -> &AssignerConfig {
        &self.config
    }

    pub fn palette(&self) -> &[&'a AtlasEntry] {
        &self.palette
    }

    pub fn palette_names(&self) -> Vec<&str> {
        self.palette.iter().map(|e| e.name.as_str()).collect()
    }

    /// Palette index and error of the best match for a color.
    ///
    /// With contextual matching off, or no visible face, global colors are
    /// compared with zero variance.
    pub fn best_match(&self, color: &Rgba, visibility: FaceVisibility) -> (usize, f32) {
        let w = self.config.error_weight;
        let use_faces = self.config.contextual && !visibility.is_none();

        let mut best = (0, f32::INFINITY);
        for (i, entry) in self.palette.iter().enumerate() {
            let (reference, std) = if use_faces {
                entry.contextual_color(visibility)
            } else {
                (entry.color, 0.0)
            };
            let error = rgb_distance_squared(color, &reference) * (1.0 - w) + std * w;
            if error < best.1 {
                best = (i, error);
            }
        }
        best
    }

    /// Name of the best matching block for a color.
    pub fn find_best_block(&self, color: &Rgba, visibility: FaceVisibility) -> &'a str {
        let (index, _) = self.best_match(color, visibility);
        let entry: &'a AtlasEntry = self.palette[index];
        entry.name.as_str()
    }

    /// Like [`find_best_block`](Self::find_best_block), through a cache.
    pub fn find_best_block_cached(&self, cache: &mut MatchCache, color: &Rgba, visibility: FaceVisibility) -> &'a str {
        let key = MatchCache::key(color, visibility);
        let index = match cache.get(key) {
            Some(index) => index,
            None => {
                let (index, _) = self.best_match(color, visibility);
                cache.insert(key, index);
                index
            }
        };
        let entry: &'a AtlasEntry = self.palette[index];
        entry.name.as_str()
    }

    /// Dither and optionally bin a voxel color before matching.
    pub fn prepare_color(&self, voxel: &Voxel) -> Rgba {
        let color = dither(
            voxel.color,
            voxel.position,
            self.config.dithering,
            self.config.dither_magnitude,
            self.config.dither_seed,
        );
        if self.config.bin_colors {
            bin_color(color, self.config.color_resolution)
        } else {
            color
        }
    }

    /// Build the output record, substituting a stair or slab when enabled.
    fn finish(&self, voxel: &Voxel, block_name: &str) -> AssignedBlock {
        let mut block = AssignedBlock::new(voxel.position, voxel.color, block_name);
        if self.config.smooth_blocks {
            if let Some(normal) = voxel.normal {
                let info = determine_block_shape(normal);
                let (name, state, shape) = shape::smooth_block(block_name, &info);
                block.block_name = name;
                block.block_state = state;
                block.shape = shape;
            }
        }
        block
    }

    /// Assign a block to every voxel of the grid, in position order.
    pub fn assign_blocks(&self, grid: &VoxelGrid, progress: Option<&mut dyn FnMut(f32)>) -> Vec<AssignedBlock> {
        let voxels = grid.sorted_voxels();
        match self.config.mode {
            MatchMode::Contextual => self.assign_contextual(grid, &voxels, progress),
            MatchMode::Batched => batch::assign_batched(self, &voxels, progress),
        }
    }

    fn assign_contextual(
        &self,
        grid: &VoxelGrid,
        voxels: &[&Voxel],
        mut progress: Option<&mut dyn FnMut(f32)>,
    ) -> Vec<AssignedBlock> {
        let mut cache = MatchCache::new();
        let total = voxels.len();
        let mut results = Vec::with_capacity(total);

        for (i, voxel) in voxels.iter().enumerate() {
            let color = self.prepare_color(voxel);
            let visibility = if self.config.contextual {
                grid.face_visibility(voxel.position)
            } else {
                FaceVisibility::NONE
            };
            let name = self.find_best_block_cached(&mut cache, &color, visibility);
            results.push(self.finish(voxel, name));

            if i % 1000 == 0 {
                if let Some(cb) = progress.as_deref_mut() {
                    cb(i as f32 / total as f32);
                }
            }
        }
        if let Some(cb) = progress.as_deref_mut() {
            cb(1.0);
        }

        let (hits, misses) = cache.stats();
        log::debug!(
            "assigned {} voxels, match cache {} entries, {} hits / {} misses",
            results.len(),
            cache.len(),
            hits,
            misses
        );
        results
    }
}
