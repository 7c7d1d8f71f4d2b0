//! Surface color sampling at ray hit points.

use crate::mesh::{ColorSource, Mesh};
use crate::types::{clamp_unit, interpolate3, Rgba, NEUTRAL_GRAY};
use glam::Vec3;

const DEGENERATE_AREA: f32 = 1e-10;

/// Area-based barycentric weights of `point` against a triangle.
///
/// Returns `None` for degenerate triangles.
pub fn barycentric_weights(point: Vec3, tri: &[Vec3; 3]) -> Option<[f32; 3]> {
    let [a, b, c] = *tri;
    let area = (b - a).cross(c - a).length() * 0.5;
    if area < DEGENERATE_AREA {
        return None;
    }

    let w0 = (b - point).cross(c - point).length() * 0.5 / area;
    let w1 = (c - point).cross(a - point).length() * 0.5 / area;
    let w2 = (a - point).cross(b - point).length() * 0.5 / area;
    Some([w0, w1, w2])
}

/// Sample the mesh color at a hit on `triangle`.
///
/// Resolution follows [`Mesh::color_source`]; without color information, or
/// for a degenerate triangle, the result is neutral gray.
pub fn sample_color(mesh: &Mesh, source: &ColorSource<'_>, triangle: usize, location: [f32; 3]) -> Rgba {
    let Some(face) = mesh.faces.get(triangle) else {
        return NEUTRAL_GRAY;
    };

    if let ColorSource::FaceColors(colors) = source {
        return colors.get(triangle).copied().unwrap_or(NEUTRAL_GRAY);
    }
    if let ColorSource::None = source {
        return NEUTRAL_GRAY;
    }

    let Some(tri) = mesh.triangle(triangle) else {
        return NEUTRAL_GRAY;
    };
    let Some(weights) = barycentric_weights(Vec3::from_array(location), &tri) else {
        return NEUTRAL_GRAY;
    };
    let [i0, i1, i2] = face.map(|i| i as usize);

    match source {
        ColorSource::Texture { uvs, texture } => {
            let (Some(a), Some(b), Some(c)) = (uvs.get(i0), uvs.get(i1), uvs.get(i2)) else {
                return NEUTRAL_GRAY;
            };
            let uv = [
                a[0] * weights[0] + b[0] * weights[1] + c[0] * weights[2],
                a[1] * weights[0] + b[1] * weights[1] + c[1] * weights[2],
            ];
            texture.sample(uv)
        }
        ColorSource::VertexColors(colors) => {
            match (colors.get(i0), colors.get(i1), colors.get(i2)) {
                (Some(a), Some(b), Some(c)) => clamp_unit(interpolate3([a, b, c], weights)),
                _ => NEUTRAL_GRAY,
            }
        }
        ColorSource::FaceColors(_) | ColorSource::None => NEUTRAL_GRAY,
    }
}
