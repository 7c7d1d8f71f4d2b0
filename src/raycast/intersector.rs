//! Bundled [`SpatialQuery`] implementation backed by a parry3d [`TriMesh`].
//!
//! parry answers the nearest hit along a ray; every further hit is found by
//! casting again from just past the previous one. Rays run in parallel.

use super::query::{QueryError, RayHit, SpatialQuery};
use crate::mesh::Mesh;
use parry3d::math::{Point, Vector};
use parry3d::query::{PointQueryWithLocation, Ray, RayCast};
use parry3d::shape::{FeatureId, TriMesh};
use rayon::prelude::*;

/// Distance stepped past a hit before casting for the next one.
const SKIP_DISTANCE: f32 = 1e-4;
/// Hits closer than this to the ray origin are ignored.
const MIN_DISTANCE: f32 = 1e-6;

/// Ray queries over a triangle mesh.
pub struct TriMeshQuery {
    shape: Option<std::result::Result<TriMesh, String>>,
    triangles: usize,
    center: Point<f32>,
    radius: f32,
}

impl TriMeshQuery {
    /// Build a parry [`TriMesh`] over the mesh's triangles. Triangle indices in
    /// returned hits match `mesh.faces`.
    pub fn new(mesh: &Mesh) -> Self {
        let triangles = mesh.faces.len();
        let (center, radius) = match mesh.bounds() {
            Some(b) => {
                let min = Point::new(b.min[0], b.min[1], b.min[2]);
                let max = Point::new(b.max[0], b.max[1], b.max[2]);
                (midpoint(&min, &max), (max - min).norm() * 0.5)
            }
            None => (Point::origin(), 0.0),
        };
        if triangles == 0 {
            return Self {
                shape: None,
                triangles,
                center,
                radius,
            };
        }

        let vertices: Vec<Point<f32>> = mesh
            .vertices
            .iter()
            .map(|v| Point::new(v[0], v[1], v[2]))
            .collect();
        let shape = TriMesh::new(vertices, mesh.faces.clone()).map_err(|e| format!("{:?}", e));
        if let Err(e) = &shape {
            log::warn!("could not build triangle mesh: {}", e);
        }

        Self {
            shape: Some(shape),
            triangles,
            center,
            radius,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles
    }

    /// Every hit along one ray, nearest first, as (distance, triangle).
    fn cast_all(&self, shape: &TriMesh, origin: Point<f32>, direction: Vector<f32>) -> Vec<(f32, usize)> {
        let mut hits = Vec::new();
        let mut travelled = 0.0f32;
        // Past this distance the ray has left the mesh's bounding sphere
        let reach = (origin - self.center).norm() + self.radius + 1.0;

        // A straight ray crosses each planar triangle at most once
        for _ in 0..self.triangles {
            if travelled >= reach {
                break;
            }
            let ray = Ray::new(origin + direction * travelled, direction);
            let Some(hit) = shape.cast_local_ray_and_get_normal(&ray, reach - travelled, false) else {
                break;
            };
            let distance = travelled + hit.time_of_impact;
            if distance > MIN_DISTANCE {
                let triangle = self.triangle_of(shape, hit.feature, &ray.point_at(hit.time_of_impact));
                hits.push((distance, triangle));
            }
            travelled = distance + SKIP_DISTANCE;
        }

        hits
    }

    fn triangle_of(&self, shape: &TriMesh, feature: FeatureId, point: &Point<f32>) -> usize {
        match feature {
            // Back-face hits are numbered after the front faces
            FeatureId::Face(i) => i as usize % self.triangles,
            _ => {
                let (_, (triangle, _)) = shape.project_local_point_and_get_location(point, false);
                triangle as usize
            }
        }
    }
}

fn midpoint(min: &Point<f32>, max: &Point<f32>) -> Point<f32> {
    Point::from((min.coords + max.coords) * 0.5)
}

impl SpatialQuery for TriMeshQuery {
    fn batch_intersect(
        &self,
        origins: &[[f32; 3]],
        directions: &[[f32; 3]],
    ) -> Result<Vec<RayHit>, QueryError> {
        if origins.len() != directions.len() {
            return Err(QueryError(format!(
                "{} origins but {} directions",
                origins.len(),
                directions.len()
            )));
        }
        for (i, (o, d)) in origins.iter().zip(directions).enumerate() {
            let finite = o.iter().chain(d).all(|c| c.is_finite());
            if !finite || d.iter().all(|c| *c == 0.0) {
                return Err(QueryError(format!("ray {} is degenerate", i)));
            }
        }

        let shape = match &self.shape {
            None => return Ok(Vec::new()),
            Some(Err(e)) => return Err(QueryError(e.clone())),
            Some(Ok(shape)) => shape,
        };

        let per_ray: Vec<Vec<RayHit>> = origins
            .par_iter()
            .zip(directions.par_iter())
            .enumerate()
            .map(|(ray, (o, d))| {
                let origin = Point::new(o[0], o[1], o[2]);
                let direction = Vector::new(d[0], d[1], d[2]).normalize();
                self.cast_all(shape, origin, direction)
                    .into_iter()
                    .map(|(distance, triangle)| {
                        let p = origin + direction * distance;
                        RayHit {
                            ray,
                            location: [p.x, p.y, p.z],
                            triangle,
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(per_ray.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::unit_cube;

    fn single_triangle() -> Mesh {
        Mesh::new(
            vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 0.0, 4.0]],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_hit_single_triangle_both_sides() {
        let query = TriMeshQuery::new(&single_triangle());
        let hits = query
            .batch_intersect(
                &[[1.0, -1.0, 1.0], [1.0, 1.0, 1.0]],
                &[[0.0, 1.0, 0.0], [0.0, -1.0, 0.0]],
            )
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].ray, 0);
        assert_eq!(hits[1].ray, 1);
        for hit in hits {
            assert_eq!(hit.triangle, 0);
            assert!((hit.location[1]).abs() < 1e-5);
            assert!((hit.location[0] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_miss_is_empty_not_error() {
        let query = TriMeshQuery::new(&single_triangle());
        let hits = query
            .batch_intersect(&[[3.5, -1.0, 3.5]], &[[0.0, 1.0, 0.0]])
            .unwrap();
        assert!(hits.is_empty());
        // Pointing away from the surface
        let hits = query
            .batch_intersect(&[[1.0, -1.0, 1.0]], &[[0.0, -1.0, 0.0]])
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_all_hits_along_ray() {
        let query = TriMeshQuery::new(&unit_cube([1.0; 4]));
        let hits = query
            .batch_intersect(&[[0.3, -1.0, 0.6]], &[[0.0, 1.0, 0.0]])
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].location[1].abs() < 1e-5);
        assert!((hits[1].location[1] - 1.0).abs() < 1e-5);
        assert_ne!(hits[0].triangle, hits[1].triangle);
    }

    #[test]
    fn test_unnormalized_direction() {
        let query = TriMeshQuery::new(&single_triangle());
        let hits = query
            .batch_intersect(&[[1.0, -2.0, 1.0]], &[[0.0, 5.0, 0.0]])
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].location[1].abs() < 1e-5);
    }

    #[test]
    fn test_oblique_ray() {
        let query = TriMeshQuery::new(&unit_cube([1.0; 4]));
        let hits = query
            .batch_intersect(&[[-0.5, -0.3, -0.4]], &[[1.0, 1.0, 1.0]])
            .unwrap();
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert!(hit.triangle < query.triangle_count());
        }
    }

    #[test]
    fn test_malformed_batch_is_error() {
        let query = TriMeshQuery::new(&single_triangle());
        assert!(query.batch_intersect(&[[0.0; 3]], &[]).is_err());
        assert!(query.batch_intersect(&[[0.0; 3]], &[[0.0; 3]]).is_err());
        assert!(query
            .batch_intersect(&[[f32::NAN, 0.0, 0.0]], &[[0.0, 1.0, 0.0]])
            .is_err());
    }

    #[test]
    fn test_empty_mesh() {
        let query = TriMeshQuery::new(&Mesh::default());
        assert_eq!(query.triangle_count(), 0);
        let hits = query
            .batch_intersect(&[[0.0; 3]], &[[1.0, 0.0, 0.0]])
            .unwrap();
        assert!(hits.is_empty());
    }
}
