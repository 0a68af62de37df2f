//! Texture table layout.

use super::{SerializeContext, WrittenImage, WrittenPalette, count_u16};
use crate::binary::align_up;
use crate::error::Result;
use crate::sdr::constants::{
    HEADER_TEXTURE_COUNT, HEADER_TEXTURE_LIST, PAYLOAD_ALIGNMENT, TEX_DATA_SIZE, TEX_ENCODING,
    TEX_HEIGHT, TEX_LEVELS, TEX_PALETTE_COUNT, TEX_PALETTE_ENCODING, TEX_PALETTE_OFFSET,
    TEX_PIXEL_OFFSET, TEX_WIDTH, TEX_WRAP_S, TEX_WRAP_T, TEXTURE_GAP, TEXTURE_HEADER_SIZE,
};
use crate::texture;

impl SerializeContext<'_> {
    pub(super) fn write_textures(&mut self) -> Result<()> {
        let model = self.model;
        let textures = &model.textures;
        let count = count_u16(textures.len(), "textures")?;
        let alignment = self.options.revision.texture_header_alignment();

        let list = self.allocate(textures.len() * 4, 4);
        self.out.write_ptr(0, HEADER_TEXTURE_LIST, list);
        self.out.write_at(HEADER_TEXTURE_COUNT, count);
        self.cursor = align_up(self.cursor, 0x10);

        for (i, tex) in textures.iter().enumerate() {
            let header = self.allocate(TEXTURE_HEADER_SIZE, alignment);
            self.out.write_ptr(list, i * 4, header);
            self.textures.push(header);

            let image = &model.images[tex.image];
            self.out.write_field(header, TEX_WIDTH, image.width as u16);
            self.out.write_field(header, TEX_HEIGHT, image.height as u16);
            self.out.write_field(header, TEX_LEVELS, 1u8);
            self.out.write_field(header, TEX_ENCODING, image.encoding.code());
            self.out.write_field(header, TEX_WRAP_S, tex.wrap_s.code());
            self.out.write_field(header, TEX_WRAP_T, tex.wrap_t.code());

            let written = match self.images[tex.image] {
                Some(written) => written,
                None => {
                    let written = self.write_image_payload(header, tex.image)?;
                    self.images[tex.image] = Some(written);
                    written
                }
            };

            let offset = (written.pixels as u32).wrapping_sub(header as u32);
            self.out.write_field(header, TEX_PIXEL_OFFSET, offset);
            self.out.write_field(header, TEX_DATA_SIZE, written.size as u32);
            if let Some(palette) = written.palette {
                self.out.write_field(header, TEX_PALETTE_ENCODING, palette.encoding);
                self.out.write_field(header, TEX_PALETTE_OFFSET, palette.offset as u32);
                self.out.write_field(header, TEX_PALETTE_COUNT, palette.count);
            }

            self.cursor = align_up(self.cursor + TEXTURE_GAP, alignment);
        }

        tracing::debug!("Wrote {} textures, cursor at {:#x}", textures.len(), self.cursor);
        Ok(())
    }

    /// Encode and place an image payload for the texture header at `header`.
    fn write_image_payload(&mut self, header: usize, image: usize) -> Result<WrittenImage> {
        let model = self.model;
        let image = &model.images[image];
        let encoded = texture::encode_image(image)?;

        let pixels = header + self.options.revision.pixel_offset(header);
        self.out.write_chunk(pixels, &encoded.texels);
        self.cursor = pixels + encoded.texels.len();

        let palette = match encoded.palette {
            Some(palette) => {
                let start = self.allocate(palette.data.len(), PAYLOAD_ALIGNMENT);
                self.out.write_chunk(start, &palette.data);
                Some(WrittenPalette {
                    offset: start - pixels,
                    count: palette.count,
                    encoding: palette.encoding.code(),
                })
            }
            None => None,
        };

        Ok(WrittenImage {
            pixels,
            size: encoded.texels.len(),
            palette,
        })
    }
}
