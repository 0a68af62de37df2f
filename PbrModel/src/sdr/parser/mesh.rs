//! Mesh, face group and draw stream parsing.

use std::collections::HashSet;

use super::ParseContext;
use crate::error::{Error, Result};
use crate::model::{Bounds, Face, Mesh, MeshPart};
use crate::sdr::constants::{
    ATTR_NBT, ATTR_NORMAL, ATTR_POSITION, ATTR_TEX0, BOUNDS_COUNT, BOUNDS_ENTRY, MESH_BOUNDS,
    MESH_PARTS, MESH_UV_LAYERS, MESH_UVS, MESH_VERTEX_COUNT, MESH_VERTICES, MESH_WEIGHTS, OP_QUADS,
    OP_TRIANGLE_STRIP, OP_TRIANGLES, PART_MATERIAL, PART_NEXT, PART_OP_COUNT, PART_OPS,
    PART_VERTEX_INFO, UV_STRIDE, VERTEX_INFO_END, VERTEX_INFO_ENTRY_SIZE, VERTEX_INFO_SIZE,
    VERTEX_STRIDE,
};

/// Attribute streams of a face group, in draw-stream order.
#[derive(Debug, Clone, Default)]
struct VertexLayout {
    attributes: Vec<u8>,
    position_stride: Option<usize>,
    uv_stride: Option<usize>,
}

impl VertexLayout {
    fn has(&self, attribute: u8) -> bool {
        self.attributes.contains(&attribute)
    }
}

/// One emitted vertex of a draw stream.
#[derive(Debug, Clone, Copy, Default)]
struct Corner {
    position: u16,
    normal: Option<u16>,
    uv: Option<u16>,
}

impl ParseContext<'_> {
    /// Parse the mesh at `address` once, returning its index.
    pub(super) fn read_mesh(&mut self, address: usize) -> Result<usize> {
        if let Some(index) = self.meshes.get_index_of(&address) {
            return Ok(index);
        }

        let vertex_count: u16 = self.reader.read_field(address, MESH_VERTEX_COUNT)?;
        let uv_layers: u16 = self.reader.read_field(address, MESH_UV_LAYERS)?;

        let mut parts = Vec::new();
        let mut layout = None;
        let mut visited = HashSet::new();
        let mut next = self.reader.read_ptr(address, MESH_PARTS)?;
        while let Some(part) = next {
            if !visited.insert(part) {
                tracing::debug!("face group list loops back to {part:#x}");
                break;
            }
            let (mesh_part, part_layout) = self.read_part(part)?;
            parts.push(mesh_part);
            layout.get_or_insert(part_layout);
            next = self.reader.read_ptr(part, PART_NEXT)?;
        }
        let layout = layout.unwrap_or_default();

        let stride = layout.position_stride.unwrap_or(VERTEX_STRIDE);
        let (positions, normals) = match self.reader.read_ptr(address, MESH_VERTICES)? {
            Some(buffer) => {
                let mut positions = Vec::with_capacity(usize::from(vertex_count));
                let mut normals = Vec::with_capacity(usize::from(vertex_count));
                for i in 0..usize::from(vertex_count) {
                    let vertex = buffer + i * stride;
                    positions.push(self.reader.read_vec3(vertex)?);
                    normals.push(self.reader.read_vec3(vertex + 0x0C)?);
                }
                (positions, normals)
            }
            None => (Vec::new(), Vec::new()),
        };

        let uvs = match self.reader.read_ptr(address, MESH_UVS)? {
            Some(block) if uv_layers > 0 => Some(self.read_uvs(block, layout.uv_stride.unwrap_or(UV_STRIDE))?),
            _ => None,
        };

        let weights = match self.reader.read_ptr(address, MESH_WEIGHTS)? {
            Some(table) => Some(self.read_weights(table)?),
            None => None,
        };

        let bounds = match self.reader.read_ptr(address, MESH_BOUNDS)? {
            Some(block) => self.read_bounds(block)?,
            None => None,
        };

        let mesh = Mesh {
            positions,
            normals,
            uvs,
            weights,
            parts,
            bounds,
        };
        tracing::debug!(
            "Mesh at {address:#x}: {} vertices, {} parts, {} faces",
            mesh.vertex_count(),
            mesh.parts.len(),
            mesh.face_count()
        );
        Ok(self.meshes.insert_full(address, mesh).0)
    }

    fn read_uvs(&mut self, block: usize, stride: usize) -> Result<Vec<[f32; 2]>> {
        let count: u16 = self.reader.read_field(block, 0x04)?;
        let Some(coords) = self.reader.read_ptr(block, 0x00)? else {
            return Ok(Vec::new());
        };
        (0..usize::from(count))
            .map(|i| {
                let u: f32 = self.reader.read_field(coords, i * stride)?;
                let v: f32 = self.reader.read_field(coords, i * stride + 4)?;
                Ok([u, 1.0 - v])
            })
            .collect()
    }

    fn read_bounds(&mut self, block: usize) -> Result<Option<Bounds>> {
        let count: u16 = self.reader.read_field(block, BOUNDS_COUNT)?;
        if count == 0 {
            return Ok(None);
        }
        if count > 1 {
            tracing::debug!("bounds block at {block:#x} holds {count} entries, keeping the first");
        }
        let Some(entry) = self.reader.read_ptr(block, BOUNDS_ENTRY)? else {
            return Ok(None);
        };
        let Some(values) = self.reader.read_ptr(entry, 0x04)? else {
            return Ok(None);
        };
        Ok(Some(Bounds {
            center: self.reader.read_vec3(values)?,
            radius: self.reader.read_field(values, 0x10)?,
        }))
    }

    fn read_part(&mut self, address: usize) -> Result<(MeshPart, VertexLayout)> {
        let target = self.reader.read_ptr(address, PART_MATERIAL)?.unwrap_or(0);
        let material = self.materials.get_index_of(&target).ok_or(Error::DanglingReference {
            kind: "material",
            address: address + PART_MATERIAL,
            target,
        })?;

        let layout = match self.reader.read_ptr(address, PART_VERTEX_INFO)? {
            Some(info) => self.read_vertex_layout(info)?,
            None => VertexLayout::default(),
        };

        let op_count: u16 = self.reader.read_field(address, PART_OP_COUNT)?;
        let faces = match self.reader.read_ptr(address, PART_OPS)? {
            Some(ops) => self.read_draw_stream(ops, usize::from(op_count), &layout)?,
            None => Vec::new(),
        };

        Ok((MeshPart { material, faces }, layout))
    }

    fn read_vertex_layout(&mut self, info: usize) -> Result<VertexLayout> {
        let mut layout = VertexLayout::default();
        for slot in 0..VERTEX_INFO_SIZE / VERTEX_INFO_ENTRY_SIZE {
            let entry = info + slot * VERTEX_INFO_ENTRY_SIZE;
            let attribute: u8 = self.reader.read_at(entry)?;
            if attribute == VERTEX_INFO_END {
                break;
            }
            let stride = usize::from(self.reader.read_field::<u8>(entry, 5)?);
            match attribute {
                ATTR_POSITION => layout.position_stride = Some(stride),
                ATTR_TEX0 => layout.uv_stride = Some(stride),
                _ => {}
            }
            layout.attributes.push(attribute);
        }
        Ok(layout)
    }

    /// Decode `op_count` draw operations into triangles, dropping degenerate ones.
    fn read_draw_stream(&mut self, ops: usize, op_count: usize, layout: &VertexLayout) -> Result<Vec<Face>> {
        let with_uvs = layout.has(ATTR_TEX0);
        let mut faces = Vec::new();
        let mut dropped = 0usize;
        self.reader.seek(ops, crate::binary::Whence::Start)?;

        for _ in 0..op_count {
            let at = self.reader.tell();
            let opcode: u8 = self.reader.read_next()?;
            let count: u16 = self.reader.read_next()?;

            let mut corners = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                let mut corner = Corner::default();
                for &attribute in &layout.attributes {
                    let index: u16 = self.reader.read_next()?;
                    match attribute {
                        ATTR_POSITION => corner.position = index,
                        ATTR_NORMAL | ATTR_NBT => corner.normal = Some(index),
                        ATTR_TEX0 => corner.uv = Some(index),
                        _ => {}
                    }
                }
                corners.push(corner);
            }

            for [a, b, c] in triangulate(opcode, corners.len(), at)? {
                let face = make_face(&corners, [a, b, c], with_uvs);
                if face.is_degenerate() {
                    dropped += 1;
                } else {
                    faces.push(face);
                }
            }
        }

        if dropped > 0 {
            tracing::debug!("dropped {dropped} degenerate faces in stream at {ops:#x}");
        }
        Ok(faces)
    }
}

/// Corner triples of the triangles an operation draws.
fn triangulate(opcode: u8, count: usize, address: usize) -> Result<Vec<[usize; 3]>> {
    let triangles = match opcode {
        OP_QUADS => (0..count / 4)
            .flat_map(|q| {
                let i = q * 4;
                [[i + 1, i, i + 2], [i + 2, i, i + 3]]
            })
            .collect(),
        OP_TRIANGLES => (0..count / 3)
            .map(|t| {
                let i = t * 3;
                [i + 1, i, i + 2]
            })
            .collect(),
        OP_TRIANGLE_STRIP => (0..count.saturating_sub(2))
            .map(|i| if i % 2 == 0 { [i + 1, i, i + 2] } else { [i, i + 1, i + 2] })
            .collect(),
        _ => return Err(Error::UnknownDrawOpcode { address, opcode }),
    };
    Ok(triangles)
}

fn make_face(corners: &[Corner], [a, b, c]: [usize; 3], with_uvs: bool) -> Face {
    let pick = |i: usize| corners[i];
    let (a, b, c) = (pick(a), pick(b), pick(c));
    Face {
        positions: [a.position, b.position, c.position],
        normals: [
            a.normal.unwrap_or(a.position),
            b.normal.unwrap_or(b.position),
            c.normal.unwrap_or(c.position),
        ],
        uvs: with_uvs.then(|| [a.uv.unwrap_or(0), b.uv.unwrap_or(0), c.uv.unwrap_or(0)]),
    }
}
