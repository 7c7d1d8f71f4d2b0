//! The spatial-query seam between the voxelizer and a ray intersector.

use thiserror::Error;

/// One ray/triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Index of the ray within the batch.
    pub ray: usize,
    /// World-space hit location.
    pub location: [f32; 3],
    /// Index of the hit triangle in the mesh.
    pub triangle: usize,
}

/// A ray batch the intersector could not process.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("ray batch rejected: {0}")]
pub struct QueryError(pub String);

/// Batch ray intersection against a triangulated surface.
///
/// Implementations return every intersection along every ray (not only the
/// nearest), in any order. "No hit" is an empty result, not an error; errors
/// are reserved for batches that cannot be processed at all.
pub trait SpatialQuery: Sync {
    fn batch_intersect(
        &self,
        origins: &[[f32; 3]],
        directions: &[[f32; 3]],
    ) -> Result<Vec<RayHit>, QueryError>;
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for &T {
    fn batch_intersect(
        &self,
        origins: &[[f32; 3]],
        directions: &[[f32; 3]],
    ) -> Result<Vec<RayHit>, QueryError> {
        (**self).batch_intersect(origins, directions)
    }
}
