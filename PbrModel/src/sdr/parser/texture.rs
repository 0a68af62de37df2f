//! Texture table parsing.

use super::ParseContext;
use crate::error::{Error, Result};
use crate::model::Texture;
use crate::sdr::constants::{
    HEADER_TEXTURE_COUNT, HEADER_TEXTURE_LIST, TEX_DATA_SIZE, TEX_ENCODING, TEX_HEIGHT,
    TEX_PALETTE_COUNT, TEX_PALETTE_ENCODING, TEX_PALETTE_OFFSET, TEX_PIXEL_OFFSET, TEX_WIDTH,
    TEX_WRAP_S, TEX_WRAP_T,
};
use crate::texture::{self, PaletteEncoding, TexelEncoding, WrapMode};

impl ParseContext<'_> {
    pub(super) fn read_texture_table(&mut self) -> Result<()> {
        let count: u16 = self.reader.read_at(HEADER_TEXTURE_COUNT)?;
        let Some(list) = self.reader.read_ptr(0, HEADER_TEXTURE_LIST)? else {
            return Ok(());
        };

        for (i, entry) in self.read_pointer_list(list, usize::from(count))?.into_iter().enumerate() {
            let address = entry.ok_or(Error::DanglingReference {
                kind: "texture",
                address: list + i * 4,
                target: 0,
            })?;
            if self.textures.contains_key(&address) {
                continue;
            }
            let texture = self.read_texture(address)?;
            self.textures.insert(address, texture);
        }

        tracing::debug!("Read {} textures ({} images)", self.textures.len(), self.images.len());
        Ok(())
    }

    fn read_texture(&mut self, address: usize) -> Result<Texture> {
        let wrap_s = self.read_wrap_mode(address, TEX_WRAP_S)?;
        let wrap_t = self.read_wrap_mode(address, TEX_WRAP_T)?;

        let offset: u32 = self.reader.read_field(address, TEX_PIXEL_OFFSET)?;
        let pixels = (address as u32).wrapping_add(offset) as usize;

        let image = match self.images.get_index_of(&pixels) {
            Some(index) => index,
            None => {
                let image = self.read_image(address, pixels)?;
                self.images.insert_full(pixels, image).0
            }
        };

        Ok(Texture { image, wrap_s, wrap_t })
    }

    fn read_wrap_mode(&mut self, address: usize, field: usize) -> Result<WrapMode> {
        let value: u32 = self.reader.read_field(address, field)?;
        WrapMode::from_code(value).ok_or(Error::UnknownWrapMode { address, value })
    }

    fn read_image(&mut self, header: usize, pixels: usize) -> Result<texture::Image> {
        let width: u16 = self.reader.read_field(header, TEX_WIDTH)?;
        let height: u16 = self.reader.read_field(header, TEX_HEIGHT)?;
        let code: u32 = self.reader.read_field(header, TEX_ENCODING)?;
        let encoding = TexelEncoding::from_code(code).ok_or(Error::UnsupportedEncoding {
            address: header,
            code,
        })?;

        let size = encoding.encoded_size(usize::from(width), usize::from(height));
        let declared: u32 = self.reader.read_field(header, TEX_DATA_SIZE)?;
        if declared as usize != size {
            tracing::debug!("texture at {header:#x} declares {declared:#x} bytes, decoding {size:#x}");
        }
        let texels = self.reader.read_chunk(pixels, size)?;

        let palette = if encoding.is_indexed() {
            let code: u32 = self.reader.read_field(header, TEX_PALETTE_ENCODING)?;
            let palette_encoding = PaletteEncoding::from_code(code).ok_or(
                Error::UnsupportedPaletteEncoding {
                    address: header,
                    code,
                },
            )?;
            let offset: u32 = self.reader.read_field(header, TEX_PALETTE_OFFSET)?;
            let count: u16 = self.reader.read_field(header, TEX_PALETTE_COUNT)?;
            let data = self.reader.read_chunk(pixels + offset as usize, usize::from(count) * 2)?;
            Some((data, usize::from(count), palette_encoding))
        } else {
            None
        };

        tracing::debug!("Decoding {width}x{height} {encoding:?} image at {pixels:#x}");
        texture::decode_image(texels, width, height, encoding, palette)
    }
}
