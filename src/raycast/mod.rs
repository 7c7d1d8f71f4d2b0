//! Ray-cast voxelization.
//!
//! The mesh is fitted to the lattice, then swept with dense grids of
//! axis-aligned rays from both sides of each principal axis. Every hit is
//! colored from the mesh's color source and folded into a [`VoxelGrid`].
//!
//! Ray intersection goes through the [`SpatialQuery`] trait; the crate ships
//! [`TriMeshQuery`], backed by parry3d, as the default implementation.
//!
//! [`VoxelGrid`]: crate::grid::VoxelGrid

pub mod intersector;
pub mod normals;
pub mod query;
pub mod sampling;
pub mod voxelizer;

pub use intersector::TriMeshQuery;
pub use normals::estimate_normals;
pub use query::{QueryError, RayHit, SpatialQuery};
pub use sampling::{barycentric_weights, sample_color};
pub use voxelizer::{Voxelizer, VoxelizerConfig};
