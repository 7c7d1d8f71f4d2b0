//! Wavefront OBJ loading.
//!
//! Supports `v x y z [r g b]` (trailing vertex colors), `vt u v`, and polygon
//! `f` records in the `v`, `v/vt`, `v//vn` and `v/vt/vn` forms, including
//! negative (relative) indices. Polygons are fan-triangulated. Because UVs in
//! OBJ are indexed separately from positions, vertices are split whenever one
//! position is used with different texture coordinates.

use super::texture::{load_texture_from_bytes, load_texture_from_path};
use super::Mesh;
use crate::error::{Result, VoxelizerError};
use crate::types::Rgba;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Load an OBJ file, optionally with a texture image for its UVs.
pub fn load_obj<P: AsRef<Path>>(path: P, texture: Option<&Path>) -> Result<Mesh> {
    let source = std::fs::read_to_string(path.as_ref())?;
    let mut mesh = parse_obj(&source)?;
    if let Some(texture_path) = texture {
        let tex = load_texture_from_path(texture_path)?;
        log::debug!(
            "loaded texture {} ({}x{})",
            texture_path.display(),
            tex.width,
            tex.height
        );
        mesh.texture = Some(Arc::new(tex));
    }
    mesh.validate()?;
    Ok(mesh)
}

/// Load an OBJ from in-memory text plus optional encoded texture bytes.
pub fn load_obj_from_bytes(obj: &[u8], texture: Option<&[u8]>) -> Result<Mesh> {
    let source = String::from_utf8_lossy(obj);
    let mut mesh = parse_obj(&source)?;
    if let Some(bytes) = texture {
        mesh.texture = Some(Arc::new(load_texture_from_bytes(bytes)?));
    }
    mesh.validate()?;
    Ok(mesh)
}

/// Parse OBJ text into a mesh (without texture image).
pub fn parse_obj(source: &str) -> Result<Mesh> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut colors: Vec<Option<Rgba>> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();

    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut vertex_colors: Vec<Rgba> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut faces: Vec<[u32; 3]> = Vec::new();
    let mut has_uv = false;

    // (position index, uv index) -> output vertex index
    let mut vertex_map: HashMap<(usize, Option<usize>), u32> = HashMap::new();

    for (line_no, raw) in source.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or("");
        let args: Vec<&str> = parts.collect();
        let line = line_no + 1;

        match keyword {
            "v" => {
                let values = parse_floats(&args, line)?;
                if values.len() < 3 {
                    return Err(parse_error(line, "vertex needs at least 3 coordinates"));
                }
                positions.push([values[0], values[1], values[2]]);
                colors.push(if values.len() >= 6 {
                    Some([values[3], values[4], values[5], 1.0])
                } else {
                    None
                });
            }
            "vt" => {
                let values = parse_floats(&args, line)?;
                if values.is_empty() {
                    return Err(parse_error(line, "texture coordinate needs a value"));
                }
                tex_coords.push([values[0], values.get(1).copied().unwrap_or(0.0)]);
            }
            "f" => {
                if args.len() < 3 {
                    return Err(parse_error(line, "face needs at least 3 vertices"));
                }
                let mut polygon = Vec::with_capacity(args.len());
                for arg in &args {
                    let (pos, uv) = parse_face_vertex(arg, positions.len(), tex_coords.len(), line)?;
                    has_uv |= uv.is_some();
                    let index = *vertex_map.entry((pos, uv)).or_insert_with(|| {
                        vertices.push(positions[pos]);
                        vertex_colors.push(colors[pos].unwrap_or([1.0, 1.0, 1.0, 1.0]));
                        uvs.push(uv.map(|i| tex_coords[i]).unwrap_or([0.0, 0.0]));
                        (vertices.len() - 1) as u32
                    });
                    polygon.push(index);
                }
                for i in 1..polygon.len() - 1 {
                    faces.push([polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            // Groups, materials, normals, smoothing: not needed for voxelization
            _ => {}
        }
    }

    let mut mesh = Mesh::new(vertices, faces);
    if colors.iter().any(|c| c.is_some()) {
        mesh.vertex_colors = Some(vertex_colors);
    }
    if has_uv {
        mesh.uvs = Some(uvs);
    }

    log::debug!(
        "parsed OBJ: {} vertices, {} triangles, colors: {}, uvs: {}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.vertex_colors.is_some(),
        mesh.uvs.is_some()
    );
    Ok(mesh)
}

fn parse_error(line: usize, message: impl Into<String>) -> VoxelizerError {
    VoxelizerError::MeshParse {
        line,
        message: message.into(),
    }
}

fn parse_floats(args: &[&str], line: usize) -> Result<Vec<f32>> {
    args.iter()
        .map(|a| {
            a.parse::<f32>()
                .map_err(|_| parse_error(line, format!("invalid number '{}'", a)))
        })
        .collect()
}

/// Resolve a 1-based (or negative, relative) OBJ index into a 0-based index.
fn resolve_index(token: &str, count: usize, line: usize) -> Result<usize> {
    let value: i64 = token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index '{}'", token)))?;
    let resolved = if value > 0 {
        value - 1
    } else if value < 0 {
        count as i64 + value
    } else {
        return Err(parse_error(line, "index 0 is not valid in OBJ"));
    };
    if resolved < 0 || resolved as usize >= count {
        return Err(parse_error(
            line,
            format!("index {} out of range ({} available)", value, count),
        ));
    }
    Ok(resolved as usize)
}

fn parse_face_vertex(
    token: &str,
    position_count: usize,
    uv_count: usize,
    line: usize,
) -> Result<(usize, Option<usize>)> {
    let mut fields = token.split('/');
    let pos = resolve_index(fields.next().unwrap_or(""), position_count, line)?;
    let uv = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, uv_count, line)?),
        _ => None,
    };
    Ok((pos, uv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ColorSource;
    use std::io::Write;

    const QUAD: &str = "\
# a colored quad
v 0 0 0 1 0 0
v 1 0 0 1 0 0
v 1 1 0 0 0 1
v 0 1 0 0 0 1
f 1 2 3 4
";

    #[test]
    fn test_parse_colored_quad() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert!(matches!(mesh.color_source(), ColorSource::VertexColors(_)));
        assert_eq!(mesh.vertex_colors.as_ref().unwrap()[2], [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_uv_splits_vertices() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vt 0.5 0.5
f 1/1 2/2 3/3
f 1/4/1 3/3/1 2/2/1
";
        let mesh = parse_obj(src).unwrap();
        // vertex 1 appears with two different UVs
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.uvs.as_ref().unwrap()[3], [0.5, 0.5]);
        assert!(mesh.vertex_colors.is_none());
    }

    #[test]
    fn test_negative_indices() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = parse_obj(src).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_obj("v 0 0\n"),
            Err(VoxelizerError::MeshParse { line: 1, .. })
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 3\n"),
            Err(VoxelizerError::MeshParse { line: 3, .. })
        ));
        assert!(parse_obj("v a b c\n").is_err());
    }

    #[test]
    fn test_load_obj_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(QUAD.as_bytes()).unwrap();
        let mesh = load_obj(file.path(), None).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }
}
