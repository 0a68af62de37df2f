//! Model inspection utilities
//!
//! Summarizes a parsed model for listings and JSON reports.

use std::path::Path;

use serde::Serialize;

use crate::error::{Result, Warning};
use crate::model::Model;
use crate::sdr::ParsedModel;

/// Summary of one texture.
#[derive(Debug, Clone, Serialize)]
pub struct TextureInfo {
    pub index: usize,
    pub image: usize,
    pub width: u32,
    pub height: u32,
    pub encoding: String,
    pub palette_size: Option<usize>,
}

/// Summary of one material.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialInfo {
    pub index: usize,
    pub name: String,
    pub texture: Option<usize>,
    pub uv_tracks: usize,
}

/// Summary of one mesh.
#[derive(Debug, Clone, Serialize)]
pub struct MeshInfo {
    pub index: usize,
    pub vertex_count: usize,
    pub face_count: usize,
    pub part_count: usize,
    pub has_uvs: bool,
    pub weighted: bool,
}

/// Summary of one bone.
#[derive(Debug, Clone, Serialize)]
pub struct BoneInfo {
    pub name: String,
    pub kind: &'static str,
    pub parent: Option<usize>,
}

/// Summary of one action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionInfo {
    pub name: String,
    pub duration: f32,
    pub animated_bones: usize,
}

/// Summary of one skeleton.
#[derive(Debug, Clone, Serialize)]
pub struct SkeletonInfo {
    pub name: String,
    pub bone_count: usize,
    pub bones: Vec<BoneInfo>,
    pub actions: Vec<ActionInfo>,
}

/// Complete model summary, including parse warnings.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub file_path: Option<String>,
    pub variant: String,
    pub textures: Vec<TextureInfo>,
    pub materials: Vec<MaterialInfo>,
    pub meshes: Vec<MeshInfo>,
    pub skeletons: Vec<SkeletonInfo>,
    pub warnings: Vec<String>,
}

impl ModelInfo {
    /// Summarize `model`.
    #[must_use]
    pub fn from_model(model: &Model, warnings: &[Warning]) -> Self {
        let textures = model
            .textures
            .iter()
            .enumerate()
            .map(|(index, texture)| {
                let image = &model.images[texture.image];
                TextureInfo {
                    index,
                    image: texture.image,
                    width: image.width,
                    height: image.height,
                    encoding: format!("{:?}", image.encoding),
                    palette_size: image.palette.as_ref().map(|p| p.colors.len()),
                }
            })
            .collect();

        let materials = model
            .materials
            .iter()
            .enumerate()
            .map(|(index, material)| MaterialInfo {
                index,
                name: material.name.clone(),
                texture: material.texture,
                uv_tracks: material.uv_tracks.len(),
            })
            .collect();

        let meshes = model
            .meshes
            .iter()
            .enumerate()
            .map(|(index, mesh)| MeshInfo {
                index,
                vertex_count: mesh.vertex_count(),
                face_count: mesh.face_count(),
                part_count: mesh.parts.len(),
                has_uvs: mesh.uvs.is_some(),
                weighted: mesh.weights.is_some(),
            })
            .collect();

        let skeletons = model
            .skeletons
            .iter()
            .map(|skeleton| SkeletonInfo {
                name: skeleton.name.clone(),
                bone_count: skeleton.bones.len(),
                bones: skeleton
                    .bones
                    .iter()
                    .map(|bone| BoneInfo {
                        name: bone.name.clone(),
                        kind: bone.kind.label(),
                        parent: bone.parent,
                    })
                    .collect(),
                actions: skeleton
                    .actions
                    .iter()
                    .map(|action| ActionInfo {
                        name: action.name.clone(),
                        duration: action.duration,
                        animated_bones: action.tracks.len(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            file_path: None,
            variant: model.variant.to_string(),
            textures,
            materials,
            meshes,
            skeletons,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }

    /// Total triangle count over every mesh.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.face_count).sum()
    }
}

/// Parse a model file and summarize it.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn inspect_model<P: AsRef<Path>>(source: P) -> Result<ModelInfo> {
    let source = source.as_ref();
    let ParsedModel { model, warnings } = crate::read_model(source)?;
    let mut info = ModelInfo::from_model(&model, &warnings);
    info.file_path = Some(source.display().to_string());
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bone, Material, NodeKind, Skeleton};
    use crate::sdr::Variant;

    #[test]
    fn test_summary_counts() {
        let mut model = Model::new(Variant::Mdr);
        model.materials.push(Material::new("body"));
        let mut skeleton = Skeleton::new("rig", Bone::new("root", NodeKind::Transform { pivots: None }));
        skeleton.add_bone(0, Bone::new("skin", NodeKind::Skin { mesh: None }));
        model.skeletons.push(skeleton);

        let info = ModelInfo::from_model(&model, &[Warning::UnrecognizedPivotSentinel { address: 0x40 }]);
        assert_eq!(info.variant, "MDR");
        assert_eq!(info.materials[0].name, "body");
        assert_eq!(info.skeletons[0].bones[1].kind, "skin");
        assert_eq!(info.skeletons[0].bones[1].parent, Some(0));
        assert_eq!(info.warnings, vec!["unrecognized pivot sentinel at 0x40".to_string()]);
    }
}
