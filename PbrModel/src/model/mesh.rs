//! Meshes, face groups and vertex weights.

use indexmap::IndexMap;

/// Bone index to weight, in the order the influences were declared.
pub type VertexWeights = IndexMap<u16, f32>;

/// A triangle. Each corner indexes the mesh's position, normal and
/// (optionally) UV arrays separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub positions: [u16; 3],
    pub normals: [u16; 3],
    pub uvs: Option<[u16; 3]>,
}

impl Face {
    /// A face whose corners use the same index into every array.
    #[must_use]
    pub fn shared(indices: [u16; 3], with_uvs: bool) -> Self {
        Self {
            positions: indices,
            normals: indices,
            uvs: with_uvs.then_some(indices),
        }
    }

    /// Whether two corners share a position.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.positions;
        a == b || b == c || a == c
    }
}

/// Faces drawn with one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshPart {
    /// Index into [`Model::materials`](super::Model::materials).
    pub material: usize,
    pub faces: Vec<Face>,
}

/// Bounding sphere used for culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: [f32; 3],
    pub radius: f32,
}

impl Bounds {
    /// Smallest sphere centered on the box midpoint that contains `positions`.
    #[must_use]
    pub fn enclosing(positions: &[[f32; 3]]) -> Option<Self> {
        let first = positions.first()?;
        let (min, max) = positions.iter().fold((*first, *first), |(mut lo, mut hi), p| {
            for i in 0..3 {
                lo[i] = lo[i].min(p[i]);
                hi[i] = hi[i].max(p[i]);
            }
            (lo, hi)
        });
        let center = [
            (min[0] + max[0]) / 2.0,
            (min[1] + max[1]) / 2.0,
            (min[2] + max[2]) / 2.0,
        ];
        let radius = positions
            .iter()
            .map(|p| {
                let d = [p[0] - center[0], p[1] - center[1], p[2] - center[2]];
                (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
            })
            .fold(0.0f32, f32::max);
        Some(Self { center, radius })
    }
}

/// Vertex data plus face groups.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    /// Parallel to `positions`.
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates, bottom-left origin.
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Per-vertex bone influences, parallel to `positions`.
    pub weights: Option<Vec<VertexWeights>>,
    pub parts: Vec<MeshPart>,
    pub bounds: Option<Bounds>,
}

impl Mesh {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Total number of faces across all parts.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.parts.iter().map(|p| p.faces.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_face() {
        assert!(Face::shared([1, 1, 2], false).is_degenerate());
        assert!(!Face::shared([0, 1, 2], true).is_degenerate());
    }

    #[test]
    fn test_bounds_enclose_points() {
        let bounds = Bounds::enclosing(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 1.0, 0.0]]).unwrap();
        assert_eq!(bounds.center, [1.0, 0.5, 0.0]);
        assert!((bounds.radius - 1.118_034).abs() < 1e-5);
        assert_eq!(Bounds::enclosing(&[]), None);
    }
}
