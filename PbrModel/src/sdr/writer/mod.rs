//! Pointer-graph serializer.
//!
//! Lays a [`Model`] out into a fresh buffer. A single cursor marks the next
//! free address; each table is written at the cursor and the pointer that
//! refers to it is patched as soon as its address is known. Tables follow
//! the order the parser reads them in: textures, materials, actions,
//! skeletons with their bone trees, then the meshes attached to skin nodes.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

mod curve;
mod material;
mod mesh;
mod skeleton;
mod texture;
mod weights;

use super::constants::{FILE_HEADER_SIZE, FORMAT_VERSION, HEADER_TAG, HEADER_VERSION};
use super::header::{Variant, WriteOptions};
use crate::binary::{BinaryWriter, align_up};
use crate::error::{Error, Result};
use crate::model::Model;

/// Serialize `model` into a complete container.
///
/// # Errors
/// Returns an error if the model fails validation or holds more objects
/// than the format's 16-bit counts allow.
pub fn serialize(model: &Model, options: WriteOptions) -> Result<Vec<u8>> {
    model.validate()?;
    let variant = options.variant.unwrap_or(model.variant);
    if variant == Variant::Odr && model.skeletons.len() != 1 {
        return Err(Error::InvalidModel(format!(
            "ODR containers hold exactly one skeleton, model has {}",
            model.skeletons.len()
        )));
    }

    let mut ctx = SerializeContext::new(model, options);
    ctx.out.write_at(HEADER_TAG, variant.tag());
    ctx.out.write_at(HEADER_VERSION, FORMAT_VERSION);
    ctx.out.reserve_to(FILE_HEADER_SIZE);
    ctx.cursor = FILE_HEADER_SIZE;

    ctx.write_textures()?;
    ctx.write_materials()?;
    let bone_addresses = ctx.write_skeletons(variant)?;
    ctx.write_meshes(&bone_addresses)?;

    let bytes = ctx.out.into_inner();
    tracing::info!("Serialized {variant} model: {:#x} bytes", bytes.len());
    Ok(bytes)
}

/// Call-scoped serializer state.
///
/// The address tables are indexed like the model's own tables and filled as
/// objects are placed.
struct SerializeContext<'m> {
    model: &'m Model,
    options: WriteOptions,
    out: BinaryWriter,
    /// Next free address.
    cursor: usize,
    images: Vec<Option<WrittenImage>>,
    textures: Vec<usize>,
    materials: Vec<usize>,
    meshes: Vec<Option<usize>>,
}

/// Where an image payload landed, for textures that share it.
#[derive(Debug, Clone, Copy)]
struct WrittenImage {
    pixels: usize,
    size: usize,
    palette: Option<WrittenPalette>,
}

#[derive(Debug, Clone, Copy)]
struct WrittenPalette {
    /// Relative to the pixel payload.
    offset: usize,
    count: u16,
    encoding: u32,
}

impl<'m> SerializeContext<'m> {
    fn new(model: &'m Model, options: WriteOptions) -> Self {
        Self {
            model,
            options,
            out: BinaryWriter::new(),
            cursor: 0,
            images: vec![None; model.images.len()],
            textures: Vec::with_capacity(model.textures.len()),
            materials: Vec::with_capacity(model.materials.len()),
            meshes: vec![None; model.meshes.len()],
        }
    }

    /// Claim `size` bytes at the cursor, aligned to `alignment`, returning
    /// their start address.
    fn allocate(&mut self, size: usize, alignment: usize) -> usize {
        let start = align_up(self.cursor, alignment);
        self.out.reserve_to(start + size);
        self.cursor = start + size;
        start
    }

    /// Write a name string at the cursor and point `base + field` at it.
    fn write_name(&mut self, base: usize, field: usize, name: &str) {
        let address = self.cursor;
        self.cursor += self.out.write_string(address, name);
        self.out.write_ptr(base, field, address);
    }
}

/// Convert a table length to its 16-bit on-disk count.
fn count_u16(len: usize, what: &str) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::InvalidModel(format!("{len} {what} exceed the format limit of 65535")))
}
