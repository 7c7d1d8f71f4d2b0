//! Six-direction ray sweep that turns a mesh surface into a voxel grid.

use super::intersector::TriMeshQuery;
use super::normals::estimate_normals;
use super::query::{RayHit, SpatialQuery};
use super::sampling::sample_color;
use crate::error::{Result, VoxelizerError};
use crate::grid::{OverlapRule, VoxelGrid};
use crate::mesh::{fit_to_lattice, ColorSource, Mesh};
use crate::types::{Axis, Rgba};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Voxelizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelizerConfig {
    /// Number of voxels along the constrained axis.
    pub target_size: u32,
    /// Axis whose extent is fixed to `target_size`.
    pub axis: Axis,
    /// How hits on the same voxel are combined.
    pub overlap_rule: OverlapRule,
    /// Move the mesh minimum to the origin before scanning.
    pub normalize_position: bool,
    /// Distance outside the mesh bounds at which rays start.
    pub margin: f32,
    /// Estimate a surface normal for every voxel after the scan.
    pub estimate_normals: bool,
}

impl Default for VoxelizerConfig {
    fn default() -> Self {
        Self {
            target_size: 80,
            axis: Axis::Y,
            overlap_rule: OverlapRule::Average,
            normalize_position: true,
            margin: 1.0,
            estimate_normals: false,
        }
    }
}

impl VoxelizerConfig {
    pub fn with_target_size(mut self, target_size: u32) -> Self {
        self.target_size = target_size;
        self
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_overlap_rule(mut self, rule: OverlapRule) -> Self {
        self.overlap_rule = rule;
        self
    }

    pub fn with_normalize_position(mut self, normalize: bool) -> Self {
        self.normalize_position = normalize;
        self
    }

    pub fn with_estimate_normals(mut self, estimate: bool) -> Self {
        self.estimate_normals = estimate;
        self
    }
}

/// Ray-cast voxelizer.
pub struct Voxelizer {
    config: VoxelizerConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl Voxelizer {
    pub fn new(config: VoxelizerConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Abort between axis sweeps once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &VoxelizerConfig {
        &self.config
    }

    /// Fit the mesh to the lattice and scan it with the bundled intersector.
    pub fn voxelize(&self, mesh: &Mesh, progress: Option<&mut dyn FnMut(f32)>) -> Result<VoxelGrid> {
        self.voxelize_with(mesh, TriMeshQuery::new, progress)
    }

    /// Fit the mesh to the lattice and scan it with a caller-supplied query,
    /// built from the fitted mesh.
    pub fn voxelize_with<Q, F>(
        &self,
        mesh: &Mesh,
        make_query: F,
        progress: Option<&mut dyn FnMut(f32)>,
    ) -> Result<VoxelGrid>
    where
        Q: SpatialQuery,
        F: FnOnce(&Mesh) -> Q,
    {
        mesh.validate()?;
        if mesh.is_empty() {
            log::warn!("mesh has no triangles, nothing to voxelize");
            return Ok(VoxelGrid::new(self.config.overlap_rule));
        }

        let Some(prepared) = fit_to_lattice(
            mesh,
            self.config.target_size,
            self.config.axis,
            self.config.normalize_position,
        )?
        else {
            log::warn!(
                "mesh has zero extent along the {} axis, nothing to voxelize",
                self.config.axis
            );
            return Ok(VoxelGrid::new(self.config.overlap_rule));
        };
        let query = make_query(&prepared);
        self.scan(&prepared, &query, progress)
    }

    /// Sweep rays from both sides of all three axes over an already fitted mesh.
    pub fn scan(
        &self,
        mesh: &Mesh,
        query: &dyn SpatialQuery,
        mut progress: Option<&mut dyn FnMut(f32)>,
    ) -> Result<VoxelGrid> {
        let mut grid = VoxelGrid::new(self.config.overlap_rule);
        let Some(bounds) = mesh.bounds() else {
            return Ok(grid);
        };
        let (lo, hi) = bounds.lattice_range();

        let source = mesh.color_source();
        if let ColorSource::None = source {
            log::warn!("mesh has no texture, vertex or face colors; sampling neutral gray");
        }
        log::debug!(
            "scanning {} triangles, lattice {:?}..{:?}, color source {}",
            mesh.triangle_count(),
            lo,
            hi,
            source.name()
        );

        for (step, axis) in Axis::ALL.iter().enumerate() {
            if self.is_cancelled() {
                return Err(VoxelizerError::Cancelled);
            }

            let a = axis.index();
            let (u_axis, v_axis) = axis.others();
            let (u, v) = (u_axis.index(), v_axis.index());

            for sign in [1.0f32, -1.0] {
                let start = if sign > 0.0 {
                    bounds.min[a] - self.config.margin
                } else {
                    bounds.max[a] + self.config.margin
                };

                let mut origins = Vec::new();
                for pu in lo[u]..=hi[u] {
                    for pv in lo[v]..=hi[v] {
                        let mut origin = [0.0; 3];
                        origin[a] = start;
                        origin[u] = pu as f32;
                        origin[v] = pv as f32;
                        origins.push(origin);
                    }
                }
                let mut direction = [0.0; 3];
                direction[a] = sign;
                let directions = vec![direction; origins.len()];

                let hits = match query.batch_intersect(&origins, &directions) {
                    Ok(hits) => hits,
                    Err(e) => {
                        log::warn!("skipping {} rays along {}{}: {}", origins.len(), sign_char(sign), axis, e);
                        Vec::new()
                    }
                };

                let added = insert_hits(&mut grid, mesh, &source, &hits);
                log::debug!(
                    "{}{}: {} rays, {} hits, {} contributions",
                    sign_char(sign),
                    axis,
                    origins.len(),
                    hits.len(),
                    added
                );
            }

            if let Some(cb) = progress.as_deref_mut() {
                cb((step + 1) as f32 / 3.0);
            }
        }

        if self.config.estimate_normals {
            if self.is_cancelled() {
                return Err(VoxelizerError::Cancelled);
            }
            let estimated = estimate_normals(mesh, query, &mut grid);
            log::debug!("estimated normals for {} of {} voxels", estimated, grid.len());
        }

        log::info!("voxelized mesh into {} voxels", grid.len());
        Ok(grid)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// Sample hit colors in parallel, then insert them in hit order.
fn insert_hits(grid: &mut VoxelGrid, mesh: &Mesh, source: &ColorSource<'_>, hits: &[RayHit]) -> usize {
    let colors: Vec<Rgba> = hits
        .par_iter()
        .map(|hit| sample_color(mesh, source, hit.triangle, hit.location))
        .collect();

    hits.iter()
        .zip(colors)
        .filter(|(hit, color)| grid.add(hit.location, *color))
        .count()
}

fn sign_char(sign: f32) -> char {
    if sign > 0.0 {
        '+'
    } else {
        '-'
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::unit_cube;
    use crate::raycast::query::QueryError;
    use crate::types::VoxelPosition;

    const RED: Rgba = [1.0, 0.0, 0.0, 1.0];

    struct FailingQuery;

    impl SpatialQuery for FailingQuery {
        fn batch_intersect(&self, _: &[[f32; 3]], _: &[[f32; 3]]) -> std::result::Result<Vec<RayHit>, QueryError> {
            Err(QueryError("unsupported".to_string()))
        }
    }

    #[test]
    fn test_cube_shell() {
        let voxelizer = Voxelizer::new(VoxelizerConfig::default().with_target_size(10));
        let grid = voxelizer.voxelize(&unit_cube(RED), None).unwrap();

        let (min, max) = grid.bounds().unwrap();
        assert_eq!(max.y - min.y + 1, 10);
        assert_eq!(max.x - min.x + 1, 10);
        assert_eq!(max.z - min.z + 1, 10);

        // Hollow: the center is not occupied
        assert!(!grid.contains(VoxelPosition::new(5, 5, 5)));
        for voxel in grid.iter() {
            assert!((voxel.color[0] - 1.0).abs() < 1e-4);
            assert!(voxel.color[1].abs() < 1e-4);
        }
    }

    #[test]
    fn test_progress_is_monotonic() {
        let voxelizer = Voxelizer::new(VoxelizerConfig::default().with_target_size(4));
        let mut reports = Vec::new();
        let mut record = |f: f32| reports.push(f);
        voxelizer.voxelize(&unit_cube(RED), Some(&mut record)).unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.windows(2).all(|w| w[0] < w[1]));
        assert!((reports[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_failed_batches_are_skipped() {
        let voxelizer = Voxelizer::new(VoxelizerConfig::default().with_target_size(4));
        let grid = voxelizer
            .voxelize_with(&unit_cube(RED), |_| FailingQuery, None)
            .unwrap();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_empty_mesh_gives_empty_grid() {
        let voxelizer = Voxelizer::new(VoxelizerConfig::default());
        let grid = voxelizer.voxelize(&Mesh::default(), None).unwrap();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_collapsed_mesh_gives_empty_grid() {
        let voxelizer = Voxelizer::new(VoxelizerConfig::default().with_target_size(8));
        let point = Mesh::new(vec![[1.0, 1.0, 1.0]; 3], vec![[0, 1, 2]]);
        assert!(voxelizer.voxelize(&point, None).unwrap().is_empty());

        let flat = Mesh::new(vec![[0.0, 2.0, 0.0], [3.0, 2.0, 0.0], [0.0, 2.0, 3.0]], vec![[0, 1, 2]]);
        assert!(voxelizer.voxelize(&flat, None).unwrap().is_empty());
    }

    #[test]
    fn test_cancel_between_axes() {
        let flag = Arc::new(AtomicBool::new(true));
        let voxelizer = Voxelizer::new(VoxelizerConfig::default().with_target_size(4)).with_cancel_flag(flag);
        assert!(matches!(
            voxelizer.voxelize(&unit_cube(RED), None),
            Err(VoxelizerError::Cancelled)
        ));
    }

    #[test]
    fn test_first_rule_keeps_first_color() {
        let voxelizer = Voxelizer::new(
            VoxelizerConfig::default()
                .with_target_size(4)
                .with_overlap_rule(OverlapRule::First),
        );
        let grid = voxelizer.voxelize(&unit_cube(RED), None).unwrap();
        assert!(grid.iter().all(|v| v.hits == 1));
    }

    #[test]
    fn test_normals_on_top_face() {
        let voxelizer = Voxelizer::new(
            VoxelizerConfig::default()
                .with_target_size(6)
                .with_estimate_normals(true),
        );
        let grid = voxelizer.voxelize(&unit_cube(RED), None).unwrap();
        let (_, max) = grid.bounds().unwrap();
        let top = grid.get(VoxelPosition::new(2, max.y, 2)).unwrap();
        let normal = top.normal.unwrap();
        assert!(normal[1].abs() > 0.99);
    }
}
