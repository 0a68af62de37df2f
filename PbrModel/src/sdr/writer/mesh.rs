//! Mesh, face group and draw stream layout.

use super::{SerializeContext, count_u16};
use crate::binary::align_up;
use crate::error::{Error, Result};
use crate::model::{Bounds, Mesh, MeshPart, NodeKind};
use crate::sdr::constants::{
    ATTR_NORMAL, ATTR_POSITION, ATTR_TEX0, BONE_MESH, BOUNDS_BLOCK_SIZE, BOUNDS_COUNT, BOUNDS_ENTRY,
    BOUNDS_ENTRY_KIND, BOUNDS_ENTRY_OFFSET, BOUNDS_VALUES_OFFSET, MESH_BOUNDS, MESH_FORMAT,
    MESH_FORMAT_TAG, MESH_HEADER_SIZE, MESH_PARTS, MESH_UV_LAYERS, MESH_UVS, MESH_VERTEX_COUNT,
    MESH_VERTICES, MESH_WEIGHTS, OP_TRIANGLES, OPS_ALIGNMENT, PART_HEADER_SIZE, PART_KIND,
    PART_KIND_TRIANGLES, PART_MATERIAL, PART_NEXT, PART_OP_COUNT, PART_OPS, PART_OPS_SIZE,
    PART_VERTEX_INFO, UV_HEADER_SIZE, UV_STRIDE, VERTEX_INFO_END, VERTEX_INFO_ENTRY_SIZE,
    VERTEX_INFO_SIZE, VERTEX_STRIDE,
};

/// Faces per triangle-list operation; the corner count is a u16.
const MAX_OP_FACES: usize = u16::MAX as usize / 3;

/// Vertex-info entry: attribute, index type, component type, component
/// count and stride.
fn vertex_info_entry(attribute: u8) -> [u8; VERTEX_INFO_ENTRY_SIZE] {
    match attribute {
        ATTR_POSITION => [ATTR_POSITION, 1, 4, 0, 3, VERTEX_STRIDE as u8, 0, 0],
        ATTR_NORMAL => [ATTR_NORMAL, 0, 4, 0, 3, VERTEX_STRIDE as u8, 0, 0],
        _ => [ATTR_TEX0, 1, 4, 0, 3, UV_STRIDE as u8, 0, 0],
    }
}

impl SerializeContext<'_> {
    /// Second pass over the bone trees: write each skin node's mesh once and
    /// point the node at it.
    pub(super) fn write_meshes(&mut self, bone_addresses: &[Vec<usize>]) -> Result<()> {
        let model = self.model;

        for (skeleton, addresses) in model.skeletons.iter().zip(bone_addresses) {
            for index in skeleton.depth_first() {
                let NodeKind::Skin { mesh: Some(mesh) } = skeleton.bones[index].kind else {
                    continue;
                };
                let header = match self.meshes[mesh] {
                    Some(header) => header,
                    None => {
                        let header = self.write_mesh(&model.meshes[mesh])?;
                        self.meshes[mesh] = Some(header);
                        header
                    }
                };
                self.out.write_ptr(addresses[index], BONE_MESH, header);
            }
        }

        let orphans = self.meshes.iter().filter(|m| m.is_none()).count();
        if orphans > 0 {
            tracing::debug!("{orphans} meshes are not attached to a skin node and were not written");
        }
        Ok(())
    }

    /// Header, vertices, weights, UVs, face groups, then bounds.
    fn write_mesh(&mut self, mesh: &Mesh) -> Result<usize> {
        let vertex_count = count_u16(mesh.positions.len(), "vertices")?;
        let header = self.allocate(MESH_HEADER_SIZE, 4);
        self.out.write_field(header, MESH_FORMAT, MESH_FORMAT_TAG);
        self.out.write_field(header, MESH_VERTEX_COUNT, vertex_count);
        self.out.write_field(header, MESH_UV_LAYERS, u16::from(mesh.uvs.is_some()));

        let vertices = self.allocate(mesh.positions.len() * VERTEX_STRIDE, 4);
        for (i, (position, normal)) in mesh.positions.iter().zip(&mesh.normals).enumerate() {
            let vertex = vertices + i * VERTEX_STRIDE;
            self.out.write_vec3(vertex, *position);
            self.out.write_vec3(vertex + 0x0C, *normal);
        }
        self.out.write_ptr(header, MESH_VERTICES, vertices);

        if let Some(weights) = &mesh.weights {
            let table = self.write_weights(weights)?;
            self.out.write_ptr(header, MESH_WEIGHTS, table);
        }

        if let Some(uvs) = &mesh.uvs {
            let block = self.allocate(UV_HEADER_SIZE, 4);
            let coords = self.allocate(uvs.len() * UV_STRIDE, 4);
            self.out.write_ptr(block, 0x00, coords);
            self.out.write_field(block, 0x04, count_u16(uvs.len(), "texture coordinates")?);
            for (i, [u, v]) in uvs.iter().enumerate() {
                self.out.write_field(coords, i * UV_STRIDE, *u);
                self.out.write_field(coords, i * UV_STRIDE + 4, 1.0 - *v);
            }
            self.out.write_ptr(header, MESH_UVS, block);
        }

        let mut previous: Option<usize> = None;
        for part in &mesh.parts {
            let address = self.write_part(part, mesh.uvs.is_some())?;
            match previous {
                Some(previous) => self.out.write_ptr(previous, PART_NEXT, address),
                None => self.out.write_ptr(header, MESH_PARTS, address),
            }
            previous = Some(address);
        }

        if let Some(bounds) = mesh.bounds {
            let block = self.write_bounds(bounds);
            self.out.write_ptr(header, MESH_BOUNDS, block);
        }

        tracing::debug!(
            "Wrote mesh at {header:#x}: {} vertices, {} parts, {} faces",
            mesh.vertex_count(),
            mesh.parts.len(),
            mesh.face_count()
        );
        Ok(header)
    }

    /// One face group: header, triangle-list stream, then vertex info.
    fn write_part(&mut self, part: &MeshPart, mesh_has_uvs: bool) -> Result<usize> {
        let with_uvs = match part.faces.iter().filter(|f| f.uvs.is_some()).count() {
            0 if part.faces.is_empty() => mesh_has_uvs,
            0 => false,
            n if n == part.faces.len() => true,
            _ => {
                return Err(Error::InvalidModel(
                    "a mesh part mixes faces with and without texture coordinates".to_string(),
                ));
            }
        };
        let mut attributes = vec![ATTR_POSITION, ATTR_NORMAL];
        if with_uvs {
            attributes.push(ATTR_TEX0);
        }

        let address = self.allocate(PART_HEADER_SIZE, 4);
        self.out.write_field(address, PART_KIND, PART_KIND_TRIANGLES);
        self.out.write_ptr(address, PART_MATERIAL, self.materials[part.material]);

        let ops = align_up(self.cursor, OPS_ALIGNMENT);
        self.out.seek(ops, crate::binary::Whence::Start);
        let chunks: Vec<_> = part.faces.chunks(MAX_OP_FACES).collect();
        for chunk in &chunks {
            self.out.write_next(OP_TRIANGLES);
            self.out.write_next((chunk.len() * 3) as u16);
            for face in *chunk {
                // drawn as (1, 0, 2); the reader's winding restores (0, 1, 2)
                for corner in [1, 0, 2] {
                    self.out.write_next(face.positions[corner]);
                    self.out.write_next(face.normals[corner]);
                    if let Some(uvs) = face.uvs {
                        self.out.write_next(uvs[corner]);
                    }
                }
            }
        }
        let written = self.out.tell() - ops;
        let size = align_up(written, self.options.revision.ops_size_rounding());
        self.out.reserve_to(ops + size);

        let info = ops + size;
        for (i, &attribute) in attributes.iter().enumerate() {
            self.out.write_chunk(info + i * VERTEX_INFO_ENTRY_SIZE, &vertex_info_entry(attribute));
        }
        self.out.write_at(info + attributes.len() * VERTEX_INFO_ENTRY_SIZE, VERTEX_INFO_END);
        self.out.reserve_to(info + VERTEX_INFO_SIZE);
        self.cursor = info + VERTEX_INFO_SIZE;

        self.out.write_field(address, PART_OP_COUNT, count_u16(chunks.len(), "draw operations")?);
        self.out.write_ptr(address, PART_VERTEX_INFO, info);
        self.out.write_ptr(address, PART_OPS, ops);
        self.out.write_field(address, PART_OPS_SIZE, size as u32);

        Ok(address)
    }

    fn write_bounds(&mut self, bounds: Bounds) -> usize {
        let block = self.allocate(BOUNDS_BLOCK_SIZE, 4);
        let entry = block + BOUNDS_ENTRY_OFFSET;
        let values = block + BOUNDS_VALUES_OFFSET;

        self.out.write_field(block, BOUNDS_COUNT, 1u16);
        self.out.write_ptr(block, BOUNDS_ENTRY, entry);
        self.out.write_at(entry, 1u16);
        self.out.write_next(BOUNDS_ENTRY_KIND);
        self.out.write_next(0u8);
        self.out.write_ptr(entry, 0x04, values);

        self.out.write_vec3(values, bounds.center);
        self.out.write_next(1.0f32);
        self.out.write_next(bounds.radius);
        self.out.write_next(1.0f32);
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_info_strides() {
        assert_eq!(vertex_info_entry(ATTR_POSITION)[5], 0x18);
        assert_eq!(vertex_info_entry(ATTR_NORMAL)[5], 0x18);
        assert_eq!(vertex_info_entry(ATTR_TEX0)[5], 0x08);
    }

    #[test]
    fn test_op_face_limit_fits_corner_count() {
        assert!(MAX_OP_FACES * 3 <= usize::from(u16::MAX));
    }
}
