use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::{Aabb, Triangle};

/// Indexed triangle soup in model space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Unit cube centred on the origin, faces wound outwards.
    pub fn unit_cube() -> Self {
        let positions = vec![
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(0.5, 0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
        ];
        let indices = vec![
            [0, 1, 2], [0, 2, 3], // front
            [5, 4, 7], [5, 7, 6], // back
            [4, 0, 3], [4, 3, 7], // left
            [1, 5, 6], [1, 6, 2], // right
            [4, 5, 1], [4, 1, 0], // bottom
            [3, 2, 6], [3, 6, 7], // top
        ];
        Self { positions, indices }
    }

    /// Unit square in the XZ plane facing +Y.
    pub fn unit_plane() -> Self {
        let positions = vec![
            Vec3::new(-0.5, 0.0, 0.5),
            Vec3::new(0.5, 0.0, 0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(-0.5, 0.0, -0.5),
        ];
        Self {
            positions,
            indices: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    /// Triangles transformed by `transform` into world space.
    pub fn world_triangles<'a>(
        &'a self,
        transform: &'a Mat4,
    ) -> impl Iterator<Item = Triangle> + 'a {
        self.indices.iter().map(move |[a, b, c]| {
            Triangle::new(
                transform.transform_point3(self.positions[*a as usize]),
                transform.transform_point3(self.positions[*b as usize]),
                transform.transform_point3(self.positions[*c as usize]),
            )
        })
    }

    pub fn world_bounds(&self, transform: &Mat4) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for position in &self.positions {
            bounds.include_point(transform.transform_point3(*position));
        }
        bounds
    }
}

/// Parses an OBJ file from memory into a triangle mesh.
///
/// Only `v` and `f` records are used; polygons are fan-triangulated and
/// negative (relative) indices are resolved.
pub fn load_obj_from_str(data: &str) -> Result<TriangleMesh> {
    let mut positions = Vec::new();
    let mut faces: Vec<[i32; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                triangulate_face(&polygon, &mut faces);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut indices = Vec::with_capacity(faces.len());
    for face in &faces {
        let mut resolved = [0u32; 3];
        for (slot, index) in resolved.iter_mut().zip(face) {
            let fixed = fix_index(*index, positions.len())
                .ok_or_else(|| anyhow!("invalid vertex index {index}"))?;
            *slot = fixed as u32;
        }
        indices.push(resolved);
    }

    Ok(TriangleMesh { positions, indices })
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut component = || -> Result<f32> {
        Ok(parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()?)
    };
    let x = component()?;
    let y = component()?;
    let z = component()?;
    Ok(Vec3::new(x, y, z))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<i32>> {
    let mut indices = Vec::new();
    for part in parts {
        // `v`, `v/vt`, `v//vn` and `v/vt/vn` all lead with the position index.
        let vertex = part
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        indices.push(vertex);
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn triangulate_face(polygon: &[i32], faces: &mut Vec<[i32; 3]>) {
    if polygon.len() < 3 {
        return;
    }
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}
