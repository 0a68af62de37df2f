//! In-memory model
//!
//! The parser produces and the serializer consumes a [`Model`]. Objects refer
//! to each other by index into the model's tables, never by file address.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

mod material;
mod mesh;
mod skeleton;

pub use material::{Material, RENDER_STATE_LEN, RENDER_STATE_OFFSET, RenderState, Texture, UvTransform};
pub use mesh::{Bounds, Face, Mesh, MeshPart, VertexWeights};
pub use skeleton::{
    Bone, DEFAULT_BONE_FLAGS, IDENTITY_3X4, NodeKind, PivotSet, PlaceholderKind, Skeleton,
};

use crate::error::{Error, Result};
use crate::sdr::Variant;
use crate::texture::Image;

/// A complete model file's content.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub variant: Variant,
    /// Decoded image payloads, shared by textures.
    pub images: Vec<Image>,
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub skeletons: Vec<Skeleton>,
}

impl Model {
    /// An empty model of the given variant.
    #[must_use]
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            images: Vec::new(),
            textures: Vec::new(),
            materials: Vec::new(),
            meshes: Vec::new(),
            skeletons: Vec::new(),
        }
    }

    /// Check that every index reference points into its table and that each
    /// skeleton is a tree rooted at bone 0.
    pub fn validate(&self) -> Result<()> {
        for (i, texture) in self.textures.iter().enumerate() {
            if texture.image >= self.images.len() {
                return Err(Error::InvalidModel(format!(
                    "texture {i} references missing image {}",
                    texture.image
                )));
            }
        }
        for material in &self.materials {
            if let Some(texture) = material.texture
                && texture >= self.textures.len()
            {
                return Err(Error::InvalidModel(format!(
                    "material '{}' references missing texture {texture}",
                    material.name
                )));
            }
        }
        for (i, mesh) in self.meshes.iter().enumerate() {
            self.validate_mesh(i, mesh)?;
        }
        for skeleton in &self.skeletons {
            self.validate_skeleton(skeleton)?;
        }
        Ok(())
    }

    fn validate_mesh(&self, index: usize, mesh: &Mesh) -> Result<()> {
        let invalid = |what: String| Error::InvalidModel(format!("mesh {index}: {what}"));
        if mesh.normals.len() != mesh.positions.len() {
            return Err(invalid(format!(
                "{} normals for {} positions",
                mesh.normals.len(),
                mesh.positions.len()
            )));
        }
        if let Some(weights) = &mesh.weights
            && weights.len() != mesh.positions.len()
        {
            return Err(invalid(format!("{} weight maps for {} vertices", weights.len(), mesh.positions.len())));
        }
        let uv_count = mesh.uvs.as_ref().map_or(0, Vec::len);
        for part in &mesh.parts {
            if part.material >= self.materials.len() {
                return Err(invalid(format!("part references missing material {}", part.material)));
            }
            for face in &part.faces {
                let in_range = |indices: [u16; 3], len: usize| indices.iter().all(|&i| usize::from(i) < len);
                if !in_range(face.positions, mesh.positions.len())
                    || !in_range(face.normals, mesh.normals.len())
                    || face.uvs.is_some_and(|uvs| !in_range(uvs, uv_count))
                {
                    return Err(invalid(format!("face {face:?} indexes past the vertex arrays")));
                }
            }
        }
        Ok(())
    }

    fn validate_skeleton(&self, skeleton: &Skeleton) -> Result<()> {
        let invalid = |what: String| Error::InvalidModel(format!("skeleton '{}': {what}", skeleton.name));
        let Some(root) = skeleton.bones.first() else {
            return Err(invalid("no bones".to_string()));
        };
        if root.parent.is_some() {
            return Err(invalid("root bone has a parent".to_string()));
        }
        for (i, bone) in skeleton.bones.iter().enumerate() {
            if i > 0 && bone.parent.is_none() {
                return Err(invalid(format!("bone '{}' has no parent", bone.name)));
            }
            if bone.parent.is_some_and(|p| p >= skeleton.bones.len() || !skeleton.bones[p].children.contains(&i)) {
                return Err(invalid(format!("bone '{}' is missing from its parent's children", bone.name)));
            }
            for &child in &bone.children {
                if skeleton.bones.get(child).and_then(|c| c.parent) != Some(i) {
                    return Err(invalid(format!("bone '{}' lists child {child} with another parent", bone.name)));
                }
            }
            if let NodeKind::Skin { mesh: Some(mesh) } = bone.kind
                && mesh >= self.meshes.len()
            {
                return Err(invalid(format!("bone '{}' references missing mesh {mesh}", bone.name)));
            }
        }
        // parent and child links agree, so only a cycle can hide bones
        if skeleton.depth_first().len() != skeleton.bones.len() {
            return Err(invalid("bones unreachable from the root".to_string()));
        }
        for action in &skeleton.actions {
            if let Some(track) = action.tracks.iter().find(|t| t.bone >= skeleton.bones.len()) {
                return Err(invalid(format!("action '{}' animates missing bone {}", action.name, track.bone)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_dangling_material() {
        let mut model = Model::new(Variant::Sdr);
        model.meshes.push(Mesh {
            positions: vec![[0.0; 3]; 3],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            parts: vec![MeshPart {
                material: 0,
                faces: vec![Face::shared([0, 1, 2], false)],
            }],
            ..Mesh::default()
        });
        assert!(matches!(model.validate(), Err(Error::InvalidModel(_))));

        model.materials.push(Material::new("body"));
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_cyclic_children() {
        let mut model = Model::new(Variant::Sdr);
        let mut skeleton = Skeleton::new("rig", Bone::new("root", NodeKind::Transform { pivots: None }));
        let a = skeleton.add_bone(0, Bone::new("a", NodeKind::Placeholder(PlaceholderKind::Null)));
        skeleton.bones[a].children.push(0);
        model.skeletons.push(skeleton);
        assert!(matches!(model.validate(), Err(Error::InvalidModel(_))));

        // a child index past the bone table
        model.skeletons[0].bones[a].children = vec![7];
        assert!(matches!(model.validate(), Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_validate_rejects_orphan_bone() {
        let mut model = Model::new(Variant::Sdr);
        let mut skeleton = Skeleton::new("rig", Bone::new("root", NodeKind::Transform { pivots: None }));
        skeleton.bones.push(Bone::new("stray", NodeKind::Placeholder(PlaceholderKind::Null)));
        model.skeletons.push(skeleton);
        assert!(model.validate().is_err());
    }
}
