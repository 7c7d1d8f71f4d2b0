//! End-to-end run: mesh in, assigned blocks out.

use crate::assign::{AssignedBlock, AssignerConfig, BlockAssigner};
use crate::atlas::BlockAtlas;
use crate::error::{Result, VoxelizerError};
use crate::mesh::Mesh;
use crate::postprocess::{
    denoise, eps_is_usable, fill_holes, remove_isolated, unify_clusters, ClusterConfig, DenoiseConfig,
    HoleFillConfig, IsolatedConfig,
};
use crate::raycast::{Voxelizer, VoxelizerConfig};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Share of the progress range spent on voxelization.
const VOXELIZE_SHARE: f32 = 0.5;
/// Share spent on block assignment; post-processing gets the rest.
const ASSIGN_SHARE: f32 = 0.4;

/// Configuration for a full pipeline run.
///
/// Post-processing passes are disabled unless their config is present, and
/// run in field order: denoise, isolated removal, clustering, hole filling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub voxelizer: VoxelizerConfig,
    pub assigner: AssignerConfig,
    pub denoise: Option<DenoiseConfig>,
    pub isolated: Option<IsolatedConfig>,
    pub cluster: Option<ClusterConfig>,
    pub holes: Option<HoleFillConfig>,
}

impl PipelineConfig {
    pub fn with_voxelizer(mut self, config: VoxelizerConfig) -> Self {
        self.voxelizer = config;
        self
    }

    pub fn with_assigner(mut self, config: AssignerConfig) -> Self {
        self.assigner = config;
        self
    }

    pub fn with_denoise(mut self, config: DenoiseConfig) -> Self {
        self.denoise = Some(config);
        self
    }

    pub fn with_isolated_removal(mut self, config: IsolatedConfig) -> Self {
        self.isolated = Some(config);
        self
    }

    pub fn with_clustering(mut self, config: ClusterConfig) -> Self {
        self.cluster = Some(config);
        self
    }

    pub fn with_hole_filling(mut self, config: HoleFillConfig) -> Self {
        self.holes = Some(config);
        self
    }

    /// Reject out-of-range parameters before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.voxelizer.target_size == 0 {
            return Err(invalid("target_size must be at least 1"));
        }
        if !(self.voxelizer.margin > 0.0) {
            return Err(invalid("margin must be positive"));
        }
        let assigner = &self.assigner;
        if !(assigner.dither_magnitude >= 0.0) {
            return Err(invalid("dither_magnitude must not be negative"));
        }
        if !(0.0..=1.0).contains(&assigner.error_weight) {
            return Err(invalid("error_weight must be within [0, 1]"));
        }
        if assigner.color_resolution == 0 {
            return Err(invalid("color_resolution must be at least 1"));
        }
        if let Some(cluster) = &self.cluster {
            if !eps_is_usable(cluster.eps) {
                return Err(invalid("cluster eps must be finite and at least 1e-6"));
            }
        }
        if let Some(holes) = &self.holes {
            if !eps_is_usable(holes.eps) {
                return Err(invalid("hole filling eps must be finite and at least 1e-6"));
            }
        }
        if let Some(denoise) = &self.denoise {
            if denoise.radius < 1 {
                return Err(invalid("denoise radius must be at least 1"));
            }
        }
        if let Some(isolated) = &self.isolated {
            if isolated.radius < 1 {
                return Err(invalid("isolated radius must be at least 1"));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> VoxelizerError {
    VoxelizerError::InvalidConfig(message.to_string())
}

/// A configured pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, cancel: None }
    }

    /// Abort voxelization with [`VoxelizerError::Cancelled`] once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Voxelize `mesh`, assign blocks from `atlas` and run the enabled passes.
    ///
    /// A mesh that produces no voxels yields an empty list.
    pub fn run(
        &self,
        mesh: &Mesh,
        atlas: &BlockAtlas,
        mut progress: Option<&mut dyn FnMut(f32)>,
    ) -> Result<Vec<AssignedBlock>> {
        self.config.validate()?;

        // Fail on an unusable palette before spending time on the scan
        let assigner = BlockAssigner::new(atlas, self.config.assigner.clone())?;

        let mut voxel_config = self.config.voxelizer.clone();
        voxel_config.estimate_normals |= self.config.assigner.smooth_blocks;
        let mut voxelizer = Voxelizer::new(voxel_config);
        if let Some(flag) = &self.cancel {
            voxelizer = voxelizer.with_cancel_flag(Arc::clone(flag));
        }

        let mut report = |p: f32| {
            if let Some(callback) = progress.as_deref_mut() {
                callback(p);
            }
        };

        let grid = {
            let mut stage = |p: f32| report(p * VOXELIZE_SHARE);
            voxelizer.voxelize(mesh, Some(&mut stage))?
        };
        if grid.is_empty() {
            log::info!("no voxels produced, returning no blocks");
            report(1.0);
            return Ok(Vec::new());
        }

        let mut blocks = {
            let mut stage = |p: f32| report(VOXELIZE_SHARE + p * ASSIGN_SHARE);
            assigner.assign_blocks(&grid, Some(&mut stage))
        };

        if let Some(config) = &self.config.denoise {
            blocks = denoise(blocks, config);
        }
        if let Some(config) = &self.config.isolated {
            blocks = remove_isolated(blocks, config);
        }
        if let Some(config) = &self.config.cluster {
            blocks = unify_clusters(blocks, atlas, config);
        }
        if let Some(config) = &self.config.holes {
            blocks = fill_holes(blocks, atlas, config);
        }

        log::info!("pipeline produced {} blocks", blocks.len());
        report(1.0);
        Ok(blocks)
    }
}

/// Run the pipeline once with `config`.
pub fn run(
    mesh: &Mesh,
    atlas: &BlockAtlas,
    config: &PipelineConfig,
    progress: Option<&mut dyn FnMut(f32)>,
) -> Result<Vec<AssignedBlock>> {
    Pipeline::new(config.clone()).run(mesh, atlas, progress)
}
