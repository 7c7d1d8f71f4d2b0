//! Partial-block shapes (slabs and stairs) chosen from surface orientation.

use crate::types::Direction;
use serde::{Deserialize, Serialize};

/// Surfaces closer to horizontal than this become slabs.
pub const SLAB_ANGLE_DEGREES: f32 = 22.5;
/// Surfaces between the slab angle and this become stairs.
pub const STAIR_ANGLE_DEGREES: f32 = 67.5;

/// Geometry of an assigned block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeTag {
    #[default]
    Full,
    SlabBottom,
    SlabTop,
    Stair,
}

impl ShapeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeTag::Full => "full",
            ShapeTag::SlabBottom => "slab_bottom",
            ShapeTag::SlabTop => "slab_top",
            ShapeTag::Stair => "stair",
        }
    }
}

impl std::fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of the block a stair occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StairHalf {
    Bottom,
    Top,
}

impl StairHalf {
    pub fn as_str(&self) -> &'static str {
        match self {
            StairHalf::Bottom => "bottom",
            StairHalf::Top => "top",
        }
    }
}

/// Shape chosen for one voxel, with stair orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothInfo {
    pub shape: ShapeTag,
    pub facing: Option<Direction>,
    pub half: Option<StairHalf>,
}

impl SmoothInfo {
    pub fn full() -> Self {
        Self {
            shape: ShapeTag::Full,
            facing: None,
            half: None,
        }
    }

    fn slab(shape: ShapeTag) -> Self {
        Self {
            shape,
            facing: None,
            half: None,
        }
    }

    /// Block-state suffix, e.g. `[type=top]` or `[facing=east,half=bottom]`.
    pub fn state_suffix(&self) -> String {
        match self.shape {
            ShapeTag::Full => String::new(),
            ShapeTag::SlabBottom => "[type=bottom]".to_string(),
            ShapeTag::SlabTop => "[type=top]".to_string(),
            ShapeTag::Stair => format!(
                "[facing={},half={}]",
                self.facing.unwrap_or(Direction::North),
                self.half.unwrap_or(StairHalf::Bottom).as_str()
            ),
        }
    }
}

/// Classify a surface normal by its angle from vertical.
///
/// Below [`SLAB_ANGLE_DEGREES`] the surface is a slab (top when the normal
/// points up), below [`STAIR_ANGLE_DEGREES`] a stair facing the dominant
/// horizontal direction of the normal, otherwise a full block.
pub fn determine_block_shape(normal: [f32; 3]) -> SmoothInfo {
    let n = glam::Vec3::from_array(normal);
    if !n.is_finite() || n.length_squared() < 1e-12 {
        return SmoothInfo::full();
    }
    let n = n.normalize();

    let angle = n.y.abs().clamp(0.0, 1.0).acos().to_degrees();
    let facing_up = n.y > 0.0;

    if angle < SLAB_ANGLE_DEGREES {
        SmoothInfo::slab(if facing_up {
            ShapeTag::SlabTop
        } else {
            ShapeTag::SlabBottom
        })
    } else if angle < STAIR_ANGLE_DEGREES {
        SmoothInfo {
            shape: ShapeTag::Stair,
            facing: Some(Direction::dominant_horizontal(n.x, n.z).unwrap_or(Direction::North)),
            half: Some(if facing_up {
                StairHalf::Bottom
            } else {
                StairHalf::Top
            }),
        }
    } else {
        SmoothInfo::full()
    }
}

/// Base block to (stairs, slab) variant.
pub const SMOOTH_VARIANTS: &[(&str, &str, &str)] = &[
    ("minecraft:oak_planks", "minecraft:oak_stairs", "minecraft:oak_slab"),
    ("minecraft:spruce_planks", "minecraft:spruce_stairs", "minecraft:spruce_slab"),
    ("minecraft:birch_planks", "minecraft:birch_stairs", "minecraft:birch_slab"),
    ("minecraft:jungle_planks", "minecraft:jungle_stairs", "minecraft:jungle_slab"),
    ("minecraft:acacia_planks", "minecraft:acacia_stairs", "minecraft:acacia_slab"),
    ("minecraft:dark_oak_planks", "minecraft:dark_oak_stairs", "minecraft:dark_oak_slab"),
    ("minecraft:mangrove_planks", "minecraft:mangrove_stairs", "minecraft:mangrove_slab"),
    ("minecraft:cherry_planks", "minecraft:cherry_stairs", "minecraft:cherry_slab"),
    ("minecraft:bamboo_planks", "minecraft:bamboo_stairs", "minecraft:bamboo_slab"),
    ("minecraft:crimson_planks", "minecraft:crimson_stairs", "minecraft:crimson_slab"),
    ("minecraft:warped_planks", "minecraft:warped_stairs", "minecraft:warped_slab"),
    ("minecraft:stone", "minecraft:stone_stairs", "minecraft:stone_slab"),
    ("minecraft:cobblestone", "minecraft:cobblestone_stairs", "minecraft:cobblestone_slab"),
    ("minecraft:stone_bricks", "minecraft:stone_brick_stairs", "minecraft:stone_brick_slab"),
    ("minecraft:mossy_stone_bricks", "minecraft:mossy_stone_brick_stairs", "minecraft:mossy_stone_brick_slab"),
    ("minecraft:granite", "minecraft:granite_stairs", "minecraft:granite_slab"),
    ("minecraft:polished_granite", "minecraft:polished_granite_stairs", "minecraft:polished_granite_slab"),
    ("minecraft:diorite", "minecraft:diorite_stairs", "minecraft:diorite_slab"),
    ("minecraft:polished_diorite", "minecraft:polished_diorite_stairs", "minecraft:polished_diorite_slab"),
    ("minecraft:andesite", "minecraft:andesite_stairs", "minecraft:andesite_slab"),
    ("minecraft:polished_andesite", "minecraft:polished_andesite_stairs", "minecraft:polished_andesite_slab"),
    ("minecraft:deepslate", "minecraft:cobbled_deepslate_stairs", "minecraft:cobbled_deepslate_slab"),
    ("minecraft:deepslate_bricks", "minecraft:deepslate_brick_stairs", "minecraft:deepslate_brick_slab"),
    ("minecraft:deepslate_tiles", "minecraft:deepslate_tile_stairs", "minecraft:deepslate_tile_slab"),
    ("minecraft:sandstone", "minecraft:sandstone_stairs", "minecraft:sandstone_slab"),
    ("minecraft:smooth_sandstone", "minecraft:smooth_sandstone_stairs", "minecraft:smooth_sandstone_slab"),
    ("minecraft:red_sandstone", "minecraft:red_sandstone_stairs", "minecraft:red_sandstone_slab"),
    ("minecraft:smooth_red_sandstone", "minecraft:smooth_red_sandstone_stairs", "minecraft:smooth_red_sandstone_slab"),
    ("minecraft:bricks", "minecraft:brick_stairs", "minecraft:brick_slab"),
    ("minecraft:mud_bricks", "minecraft:mud_brick_stairs", "minecraft:mud_brick_slab"),
    ("minecraft:nether_bricks", "minecraft:nether_brick_stairs", "minecraft:nether_brick_slab"),
    ("minecraft:red_nether_bricks", "minecraft:red_nether_brick_stairs", "minecraft:red_nether_brick_slab"),
    ("minecraft:blackstone", "minecraft:blackstone_stairs", "minecraft:blackstone_slab"),
    ("minecraft:polished_blackstone", "minecraft:polished_blackstone_stairs", "minecraft:polished_blackstone_slab"),
    ("minecraft:polished_blackstone_bricks", "minecraft:polished_blackstone_brick_stairs", "minecraft:polished_blackstone_brick_slab"),
    ("minecraft:quartz_block", "minecraft:quartz_stairs", "minecraft:quartz_slab"),
    ("minecraft:smooth_quartz", "minecraft:smooth_quartz_stairs", "minecraft:smooth_quartz_slab"),
    ("minecraft:prismarine", "minecraft:prismarine_stairs", "minecraft:prismarine_slab"),
    ("minecraft:prismarine_bricks", "minecraft:prismarine_brick_stairs", "minecraft:prismarine_brick_slab"),
    ("minecraft:dark_prismarine", "minecraft:dark_prismarine_stairs", "minecraft:dark_prismarine_slab"),
    ("minecraft:purpur_block", "minecraft:purpur_stairs", "minecraft:purpur_slab"),
    ("minecraft:end_stone_bricks", "minecraft:end_stone_brick_stairs", "minecraft:end_stone_brick_slab"),
    ("minecraft:cut_copper", "minecraft:cut_copper_stairs", "minecraft:cut_copper_slab"),
    ("minecraft:exposed_cut_copper", "minecraft:exposed_cut_copper_stairs", "minecraft:exposed_cut_copper_slab"),
    ("minecraft:weathered_cut_copper", "minecraft:weathered_cut_copper_stairs", "minecraft:weathered_cut_copper_slab"),
    ("minecraft:oxidized_cut_copper", "minecraft:oxidized_cut_copper_stairs", "minecraft:oxidized_cut_copper_slab"),
];

/// Stair and slab variants of a base block.
pub fn smooth_variants(base: &str) -> Option<(&'static str, &'static str)> {
    SMOOTH_VARIANTS
        .iter()
        .find(|(name, _, _)| *name == base)
        .map(|&(_, stairs, slab)| (stairs, slab))
}

pub fn can_smooth(base: &str) -> bool {
    smooth_variants(base).is_some()
}

/// Resolve the block name, state suffix and shape for a base block.
///
/// Blocks without registered variants keep their full form.
pub fn smooth_block(base: &str, info: &SmoothInfo) -> (String, String, ShapeTag) {
    let variants = match info.shape {
        ShapeTag::Full => None,
        _ => smooth_variants(base),
    };
    match (info.shape, variants) {
        (ShapeTag::SlabBottom | ShapeTag::SlabTop, Some((_, slab))) => {
            (slab.to_string(), info.state_suffix(), info.shape)
        }
        (ShapeTag::Stair, Some((stairs, _))) => (stairs.to_string(), info.state_suffix(), info.shape),
        _ => (base.to_string(), String::new(), ShapeTag::Full),
    }
}
