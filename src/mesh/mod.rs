//! In-memory triangle mesh with optional color information.
//!
//! A [`Mesh`] is built by an external loader (or [`loader::load_obj`]) and is
//! treated as immutable once voxelization starts. Scaling and translation
//! helpers in [`scale`] always produce a new mesh.

pub mod loader;
pub mod scale;
pub mod texture;

pub use scale::{even_size_offset, fit_to_lattice, normalize_position, scale_to_size, translate};
pub use texture::TextureData;

use crate::error::{Result, VoxelizerError};
use crate::types::{BoundingBox, Rgba};
use std::sync::Arc;

/// A triangle mesh with optional per-vertex colors, UVs + texture, or per-face colors.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Triangle vertex indices.
    pub faces: Vec<[u32; 3]>,
    /// Per-vertex RGBA colors.
    pub vertex_colors: Option<Vec<Rgba>>,
    /// Per-vertex texture coordinates.
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Texture sampled through `uvs`.
    pub texture: Option<Arc<TextureData>>,
    /// Per-face RGBA colors.
    pub face_colors: Option<Vec<Rgba>>,
}

/// The authoritative color information of a mesh, resolved in priority order.
#[derive(Debug, Clone, Copy)]
pub enum ColorSource<'a> {
    /// UV coordinates plus a texture image.
    Texture {
        uvs: &'a [[f32; 2]],
        texture: &'a TextureData,
    },
    /// Per-vertex colors, interpolated across each triangle.
    VertexColors(&'a [Rgba]),
    /// One color per triangle.
    FaceColors(&'a [Rgba]),
    /// No color information; samples fall back to neutral gray.
    None,
}

impl ColorSource<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            ColorSource::Texture { .. } => "texture",
            ColorSource::VertexColors(_) => "vertex colors",
            ColorSource::FaceColors(_) => "face colors",
            ColorSource::None => "none",
        }
    }
}

impl Mesh {
    pub fn new(vertices: Vec<[f32; 3]>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            faces,
            ..Default::default()
        }
    }

    pub fn with_vertex_colors(mut self, colors: Vec<Rgba>) -> Self {
        self.vertex_colors = Some(colors);
        self
    }

    pub fn with_face_colors(mut self, colors: Vec<Rgba>) -> Self {
        self.face_colors = Some(colors);
        self
    }

    pub fn with_texture(mut self, uvs: Vec<[f32; 2]>, texture: TextureData) -> Self {
        self.uvs = Some(uvs);
        self.texture = Some(Arc::new(texture));
        self
    }

    /// Resolve which color information is authoritative:
    /// texture + UV, then vertex colors, then face colors, then none.
    pub fn color_source(&self) -> ColorSource<'_> {
        if let (Some(uvs), Some(texture)) = (&self.uvs, &self.texture) {
            return ColorSource::Texture { uvs, texture };
        }
        if let Some(colors) = &self.vertex_colors {
            return ColorSource::VertexColors(colors);
        }
        if let Some(colors) = &self.face_colors {
            return ColorSource::FaceColors(colors);
        }
        ColorSource::None
    }

    /// Check that face indices and attribute arrays are consistent.
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        for (i, face) in self.faces.iter().enumerate() {
            if face.iter().any(|&idx| idx as usize >= n) {
                return Err(VoxelizerError::InvalidMesh(format!(
                    "face {} references vertex out of range ({:?}, {} vertices)",
                    i, face, n
                )));
            }
        }
        if let Some(colors) = &self.vertex_colors {
            if colors.len() != n {
                return Err(VoxelizerError::InvalidMesh(format!(
                    "{} vertex colors for {} vertices",
                    colors.len(),
                    n
                )));
            }
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != n {
                return Err(VoxelizerError::InvalidMesh(format!(
                    "{} UVs for {} vertices",
                    uvs.len(),
                    n
                )));
            }
        }
        if let Some(colors) = &self.face_colors {
            if colors.len() != self.faces.len() {
                return Err(VoxelizerError::InvalidMesh(format!(
                    "{} face colors for {} faces",
                    colors.len(),
                    self.faces.len()
                )));
            }
        }
        Ok(())
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().copied())
    }

    /// Extent of the bounding box along each axis.
    pub fn dimensions(&self) -> [f32; 3] {
        self.bounds().map(|b| b.dimensions()).unwrap_or([0.0; 3])
    }

    /// Get the three vertex positions of a triangle.
    pub fn triangle(&self, index: usize) -> Option<[glam::Vec3; 3]> {
        let face = self.faces.get(index)?;
        let get = |i: u32| self.vertices.get(i as usize).map(|v| glam::Vec3::from_array(*v));
        Some([get(face[0])?, get(face[1])?, get(face[2])?])
    }

    /// Unit normal of a triangle, or `None` if it is degenerate.
    pub fn triangle_normal(&self, index: usize) -> Option<glam::Vec3> {
        let [v0, v1, v2] = self.triangle(index)?;
        let n = (v1 - v0).cross(v2 - v0);
        if n.length() < 1e-10 {
            None
        } else {
            Some(n.normalize())
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Build an axis-aligned unit cube (8 vertices, 12 triangles) with a solid vertex color.
pub fn unit_cube(color: Rgba) -> Mesh {
    let vertices = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let faces = vec![
        // -Z
        [0, 2, 1],
        [0, 3, 2],
        // +Z
        [4, 5, 6],
        [4, 6, 7],
        // -X
        [0, 4, 7],
        [0, 7, 3],
        // +X
        [1, 2, 6],
        [1, 6, 5],
        // -Y
        [0, 1, 5],
        [0, 5, 4],
        // +Y
        [3, 7, 6],
        [3, 6, 2],
    ];
    Mesh::new(vertices, faces).with_vertex_colors(vec![color; 8])
}
