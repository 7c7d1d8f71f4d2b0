//! # Schematic Voxelizer
//!
//! A Rust library for turning textured 3D meshes into Minecraft block
//! placements.
//!
//! ## Overview
//!
//! A mesh is scaled so one axis spans a target number of voxels, swept with
//! rays along all six axis directions, and every surface hit is colored from
//! the mesh's texture, vertex colors or face colors. The resulting voxels are
//! matched against a block atlas of reference colors, optionally refined by
//! denoising, isolated-block removal, clustering and hole filling, and handed
//! out as a list of block assignments.
//!
//! ## Quick Start
//!
//! ```ignore
//! use schematic_voxelizer::{load_atlas, load_obj, run, PipelineConfig};
//!
//! let atlas = load_atlas("atlas.json")?;
//! let mesh = load_obj("model.obj", Some("model.png".as_ref()))?;
//!
//! let config = PipelineConfig::default();
//! let blocks = run(&mesh, &atlas, &config, None)?;
//! let json = schematic_voxelizer::export_json(&blocks, true)?;
//! ```
//!
//! ## Custom ray intersection
//!
//! The voxelizer ships [`TriMeshQuery`], a parry3d triangle mesh. Anything
//! that implements [`SpatialQuery`] can stand in for it:
//!
//! ```ignore
//! use schematic_voxelizer::{Voxelizer, VoxelizerConfig};
//!
//! let voxelizer = Voxelizer::new(VoxelizerConfig::default());
//! let grid = voxelizer.voxelize_with(&mesh, |scaled| MyBvh::build(scaled), None)?;
//! ```

pub mod error;
pub mod types;
pub mod mesh;
pub mod grid;
pub mod color;
pub mod atlas;
pub mod raycast;
pub mod assign;
pub mod postprocess;
pub mod pipeline;
pub mod export;

// Re-export main types for convenience
pub use error::{Result, VoxelizerError};
pub use types::{Axis, BoundingBox, Direction, Rgba, VoxelPosition};
pub use mesh::{ColorSource, Mesh, TextureData};
pub use grid::{FaceVisibility, OverlapRule, Voxel, VoxelGrid};
pub use color::DitherMode;
pub use atlas::{AtlasEntry, BlockAtlas};
pub use raycast::{QueryError, RayHit, SpatialQuery, TriMeshQuery, Voxelizer, VoxelizerConfig};
pub use assign::{AssignedBlock, AssignerConfig, BlockAssigner, MatchMode, ShapeTag};
pub use postprocess::{ClusterConfig, DenoiseConfig, HoleFillConfig, IsolatedConfig};
pub use pipeline::{run, Pipeline, PipelineConfig};
pub use export::{export_commands, export_json, CommandOrigin};

/// Load a block atlas from a JSON file.
pub fn load_atlas<P: AsRef<std::path::Path>>(path: P) -> Result<BlockAtlas> {
    atlas::loader::load_from_path(path)
}

/// Load a block atlas from JSON bytes.
pub fn load_atlas_from_bytes(data: &[u8]) -> Result<BlockAtlas> {
    atlas::loader::load_from_bytes(data)
}

/// Load a Wavefront OBJ mesh, with an optional texture image.
pub fn load_obj<P: AsRef<std::path::Path>>(path: P, texture: Option<&std::path::Path>) -> Result<Mesh> {
    mesh::loader::load_obj(path, texture)
}
