//! Weighted vertex blending.

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};
use crate::model::Mesh;

/// Positions and normals of a mesh after skinning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinnedMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
}

/// Deform `mesh` by the bones it is weighted to.
///
/// Each vertex is moved by `sum(w_i * G_i * IBM_i)`, where `G` are the
/// posed global transforms and `IBM` the inverse bind matrices. Normals use
/// the same matrix without its translation and are re-normalized. A mesh
/// without weights is returned unchanged.
///
/// # Errors
/// Returns [`Error::InvalidModel`] if a weight names a bone outside the pose.
pub fn skin_mesh(mesh: &Mesh, globals: &[Mat4], inverse_binds: &[Mat4]) -> Result<SkinnedMesh> {
    let Some(weights) = &mesh.weights else {
        return Ok(SkinnedMesh {
            positions: mesh.positions.clone(),
            normals: mesh.normals.clone(),
        });
    };

    let skinning: Vec<Mat4> = globals.iter().zip(inverse_binds).map(|(g, ibm)| *g * *ibm).collect();

    let mut positions = Vec::with_capacity(mesh.positions.len());
    let mut normals = Vec::with_capacity(mesh.normals.len());
    for (vertex, (position, normal)) in mesh.positions.iter().zip(&mesh.normals).enumerate() {
        let mut blended = Mat4::ZERO;
        if let Some(map) = weights.get(vertex) {
            for (&bone, &weight) in map {
                let matrix = skinning.get(usize::from(bone)).ok_or_else(|| {
                    Error::InvalidModel(format!("vertex {vertex} is weighted to missing bone {bone}"))
                })?;
                blended += *matrix * weight;
            }
        }
        positions.push(blended.transform_point3(Vec3::from_array(*position)).to_array());
        normals.push(
            blended
                .transform_vector3(Vec3::from_array(*normal))
                .normalize_or_zero()
                .to_array(),
        );
    }

    Ok(SkinnedMesh { positions, normals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VertexWeights;

    fn mesh(weights: Vec<VertexWeights>) -> Mesh {
        Mesh {
            positions: vec![[1.0, 0.0, 0.0]],
            normals: vec![[0.0, 2.0, 0.0]],
            weights: Some(weights),
            ..Mesh::default()
        }
    }

    #[test]
    fn test_bind_pose_leaves_vertices() {
        let bind = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let skinned = skin_mesh(
            &mesh(vec![VertexWeights::from([(0, 1.0)])]),
            &[bind],
            &[bind.inverse()],
        )
        .unwrap();
        let p = Vec3::from_array(skinned.positions[0]);
        assert!(p.abs_diff_eq(Vec3::X, 1e-6));
        assert_eq!(skinned.normals[0], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_blend_two_bones() {
        let globals = [
            Mat4::IDENTITY,
            Mat4::from_translation(Vec3::new(0.0, 0.0, 4.0)),
        ];
        let inverse = [Mat4::IDENTITY, Mat4::IDENTITY];
        let skinned = skin_mesh(
            &mesh(vec![VertexWeights::from([(0, 0.75), (1, 0.25)])]),
            &globals,
            &inverse,
        )
        .unwrap();
        let p = Vec3::from_array(skinned.positions[0]);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn test_missing_bone() {
        let result = skin_mesh(
            &mesh(vec![VertexWeights::from([(3, 1.0)])]),
            &[Mat4::IDENTITY],
            &[Mat4::IDENTITY],
        );
        assert!(matches!(result, Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_unweighted_mesh_unchanged() {
        let plain = Mesh {
            positions: vec![[1.0, 2.0, 3.0]],
            normals: vec![[0.0, 0.0, 1.0]],
            ..Mesh::default()
        };
        let skinned = skin_mesh(&plain, &[], &[]).unwrap();
        assert_eq!(skinned.positions, plain.positions);
    }
}
