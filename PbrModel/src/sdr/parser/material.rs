//! Material table parsing.

use super::ParseContext;
use crate::animation::MaterialTrack;
use crate::error::{Error, Result};
use crate::model::{Material, RENDER_STATE_LEN, RENDER_STATE_OFFSET, RenderState, UvTransform};
use crate::sdr::constants::{
    HEADER_MATERIAL_COUNT, HEADER_MATERIAL_LIST, MAT_NAME, MAT_TEXTURE, MAT_UV_CURVES,
    MAT_UV_TRANSFORM,
};

impl ParseContext<'_> {
    pub(super) fn read_material_table(&mut self) -> Result<()> {
        let count: u16 = self.reader.read_at(HEADER_MATERIAL_COUNT)?;
        let Some(list) = self.reader.read_ptr(0, HEADER_MATERIAL_LIST)? else {
            return Ok(());
        };

        for (i, entry) in self.read_pointer_list(list, usize::from(count))?.into_iter().enumerate() {
            let address = entry.ok_or(Error::DanglingReference {
                kind: "material",
                address: list + i * 4,
                target: 0,
            })?;
            if self.materials.contains_key(&address) {
                continue;
            }
            let material = self.read_material(address)?;
            tracing::debug!("Material '{}' at {address:#x}", material.name);
            self.materials.insert(address, material);
        }
        Ok(())
    }

    fn read_material(&mut self, address: usize) -> Result<Material> {
        let name = self.read_name(address, MAT_NAME)?;

        let texture = match self.reader.read_ptr(address, MAT_TEXTURE)? {
            Some(target) => Some(self.textures.get_index_of(&target).ok_or(Error::DanglingReference {
                kind: "texture",
                address: address + MAT_TEXTURE,
                target,
            })?),
            None => None,
        };

        let uv_transform = match self.reader.read_ptr(address, MAT_UV_TRANSFORM)? {
            Some(block) => Some(UvTransform {
                translation: [self.reader.read_field(block, 0x04)?, self.reader.read_next()?],
                rotation: self.reader.read_next()?,
                scale: [self.reader.read_next()?, self.reader.read_next()?],
            }),
            None => None,
        };

        let mut state = [0u8; RENDER_STATE_LEN];
        state.copy_from_slice(self.reader.read_chunk(address + RENDER_STATE_OFFSET, RENDER_STATE_LEN)?);

        let uv_tracks = match self.reader.read_ptr(address, MAT_UV_CURVES)? {
            Some(first) => self
                .read_curve_chain(first, None)?
                .into_iter()
                .map(|(action, length, curves)| MaterialTrack { action, length, curves })
                .collect(),
            None => Vec::new(),
        };

        Ok(Material {
            name,
            texture,
            uv_transform,
            render_state: RenderState(state),
            uv_tracks,
        })
    }
}
