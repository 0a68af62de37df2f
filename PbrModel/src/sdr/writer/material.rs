//! Material table layout.

use super::{SerializeContext, count_u16};
use crate::binary::align_up;
use crate::error::Result;
use crate::model::{Material, RENDER_STATE_OFFSET};
use crate::sdr::constants::{
    BLEND_BLOCK, HEADER_MATERIAL_COUNT, HEADER_MATERIAL_LIST, MAT_BLEND, MAT_NAME, MAT_TEXTURE,
    MAT_UV_CURVES, MAT_UV_TRANSFORM, MATERIAL_HEADER_SIZE, UV_TRANSFORM_COMPONENTS,
    UV_TRANSFORM_KIND, UV_TRANSFORM_SIZE,
};

impl SerializeContext<'_> {
    pub(super) fn write_materials(&mut self) -> Result<()> {
        let model = self.model;
        let count = count_u16(model.materials.len(), "materials")?;

        let list = self.allocate(model.materials.len() * 4, 4);
        self.out.write_ptr(0, HEADER_MATERIAL_LIST, list);
        self.out.write_at(HEADER_MATERIAL_COUNT, count);
        self.cursor = align_up(self.cursor, 0x10);

        for (i, material) in model.materials.iter().enumerate() {
            let header = self.write_material(material)?;
            self.out.write_ptr(list, i * 4, header);
            self.materials.push(header);
        }

        tracing::debug!("Wrote {} materials, cursor at {:#x}", model.materials.len(), self.cursor);
        Ok(())
    }

    /// Header, name, UV transform, blend block, then UV curves.
    fn write_material(&mut self, material: &Material) -> Result<usize> {
        let header = self.allocate(MATERIAL_HEADER_SIZE, 4);
        self.write_name(header, MAT_NAME, &material.name);

        if let Some(texture) = material.texture {
            self.out.write_ptr(header, MAT_TEXTURE, self.textures[texture]);
        }

        if let Some(uv) = material.uv_transform {
            let block = self.allocate(UV_TRANSFORM_SIZE, 4);
            self.out.write_at(block, UV_TRANSFORM_KIND);
            self.out.write_next(UV_TRANSFORM_COMPONENTS);
            self.out.write_at(block + 0x04, uv.translation[0]);
            self.out.write_next(uv.translation[1]);
            self.out.write_next(uv.rotation);
            self.out.write_next(uv.scale[0]);
            self.out.write_next(uv.scale[1]);
            self.out.write_ptr(header, MAT_UV_TRANSFORM, block);
        }

        let blend = self.allocate(BLEND_BLOCK.len(), 4);
        self.out.write_chunk(blend, &BLEND_BLOCK);
        self.out.write_ptr(header, MAT_BLEND, blend);

        self.out.write_chunk(header + RENDER_STATE_OFFSET, &material.render_state.0);

        let tracks: Vec<_> = material
            .uv_tracks
            .iter()
            .map(|t| (t.action, t.length, t.curves.as_slice()))
            .collect();
        if let Some(first) = self.write_curve_chain(&tracks)? {
            self.out.write_ptr(header, MAT_UV_CURVES, first);
        }

        Ok(header)
    }
}
