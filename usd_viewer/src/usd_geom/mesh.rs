/// UsdGeomMesh: polygon mesh schema view of a prim

use glam::DVec3;

use crate::error::{Error, Result};
use crate::gf::Aabb;
use crate::usd::{Prim, SceneStage, TimeCode};

pub const MESH_TYPE_NAME: &str = "Mesh";

/// Default surface color when `primvars:displayColor` is not authored.
pub const FALLBACK_DISPLAY_COLOR: DVec3 = DVec3::new(0.5, 0.5, 0.5);

/// Stands in for a negative entry of an index array, so later entries keep
/// their positions. Faces that use it are skipped.
pub const INVALID_INDEX: usize = usize::MAX;

const DISPLAY_COLOR: &str = "primvars:displayColor";

/// How a primvar's values map onto the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// One value for the whole mesh
    Constant,
    /// One value per face
    Uniform,
    /// One value per point
    Vertex,
    /// One value per face-vertex
    FaceVarying,
}

impl Interpolation {
    /// Parse an `interpolation` metadata token. `varying` maps to `Vertex`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "constant" => Some(Interpolation::Constant),
            "uniform" => Some(Interpolation::Uniform),
            "vertex" | "varying" => Some(Interpolation::Vertex),
            "faceVarying" => Some(Interpolation::FaceVarying),
            _ => None,
        }
    }
}

/// Triangle produced by fan triangulation, with the face it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    /// Point indices
    pub points: [usize; 3],
    /// Face-vertex indices (positions in `faceVertexIndices`)
    pub face_vertices: [usize; 3],
    pub face: usize,
}

pub struct UsdGeomMesh<'s, S: SceneStage + ?Sized> {
    stage: &'s S,
    prim: Prim,
}

impl<'s, S: SceneStage + ?Sized> UsdGeomMesh<'s, S> {
    /// Mesh view of `prim`; `Error::SchemaMismatch` unless it is typed `Mesh`.
    pub fn new(stage: &'s S, prim: Prim) -> Result<Self> {
        if prim.type_name() != MESH_TYPE_NAME {
            return Err(Error::SchemaMismatch {
                path: prim.path().to_string(),
                expected: MESH_TYPE_NAME.to_string(),
                found: prim.type_name().to_string(),
            });
        }
        Ok(Self { stage, prim })
    }

    pub fn prim(&self) -> &Prim {
        &self.prim
    }

    pub fn points(&self, time: TimeCode) -> Vec<DVec3> {
        self.stage
            .attribute(&self.prim, "points", time)
            .and_then(|v| v.as_dvec3_array())
            .unwrap_or_default()
    }

    pub fn face_vertex_counts(&self, time: TimeCode) -> Vec<usize> {
        self.index_array("faceVertexCounts", time)
    }

    pub fn face_vertex_indices(&self, time: TimeCode) -> Vec<usize> {
        self.index_array("faceVertexIndices", time)
    }

    fn index_array(&self, name: &str, time: TimeCode) -> Vec<usize> {
        self.stage
            .attribute(&self.prim, name, time)
            .and_then(|v| v.as_i64_array())
            .map(|values| {
                values
                    .into_iter()
                    .map(|i| usize::try_from(i).unwrap_or(INVALID_INDEX))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Authored `extent`, if any.
    pub fn extent(&self, time: TimeCode) -> Option<Aabb> {
        let corners = self
            .stage
            .attribute(&self.prim, "extent", time)?
            .as_dvec3_array()?;
        match corners.as_slice() {
            [min, max] => Some(Aabb::new(*min, *max)),
            _ => None,
        }
    }

    /// `primvars:displayColor` values with their interpolation.
    ///
    /// The authored `interpolation` metadata wins. Without it the
    /// interpolation is inferred from the element count (one value, one per
    /// face, one per point, one per face-vertex).
    pub fn display_color(&self, time: TimeCode) -> Option<(Vec<DVec3>, Interpolation)> {
        let colors = self
            .stage
            .attribute(&self.prim, DISPLAY_COLOR, time)?
            .as_dvec3_array()?;
        if colors.is_empty() {
            return None;
        }

        let authored = self
            .stage
            .attribute_metadata(&self.prim, DISPLAY_COLOR, "interpolation")
            .and_then(|v| v.as_str().and_then(Interpolation::from_token));
        if let Some(interpolation) = authored {
            return Some((colors, interpolation));
        }

        let counts = self.face_vertex_counts(time);
        let face_vertices: usize = counts.iter().filter(|&&c| c != INVALID_INDEX).sum();
        let interpolation = match colors.len() {
            1 => Interpolation::Constant,
            n if n == counts.len() => Interpolation::Uniform,
            n if n == self.points(time).len() => Interpolation::Vertex,
            n if n == face_vertices => Interpolation::FaceVarying,
            _ => return None,
        };
        Some((colors, interpolation))
    }

    /// False when `visibility` is `invisible`.
    pub fn is_visible(&self, time: TimeCode) -> bool {
        self.stage
            .attribute(&self.prim, "visibility", time)
            .map_or(true, |v| v.as_str() != Some("invisible"))
    }

    /// Fan triangulation of all faces. Faces with fewer than three vertices
    /// or out-of-range (including negative) indices are skipped.
    pub fn triangulate(&self, time: TimeCode) -> Vec<Triangle> {
        let counts = self.face_vertex_counts(time);
        let indices = self.face_vertex_indices(time);
        let point_count = self.points(time).len();
        triangulate_faces(&counts, &indices, point_count)
    }
}

/// Fan-triangulate polygon faces.
pub fn triangulate_faces(counts: &[usize], indices: &[usize], point_count: usize) -> Vec<Triangle> {
    let mut triangles = Vec::new();
    let mut start: usize = 0;

    for (face, &count) in counts.iter().enumerate() {
        // a negative count leaves the rest of the index array unaddressable
        let Some(end) = start.checked_add(count).filter(|&end| end <= indices.len()) else {
            break;
        };
        let face_indices = &indices[start..end];
        if count >= 3 && face_indices.iter().all(|&i| i < point_count) {
            for k in 1..count - 1 {
                triangles.push(Triangle {
                    points: [face_indices[0], face_indices[k], face_indices[k + 1]],
                    face_vertices: [start, start + k, start + k + 1],
                    face,
                });
            }
        }
        start = end;
    }

    triangles
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
