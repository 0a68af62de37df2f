//! Pointer-graph parser.
//!
//! Walks the file header's texture, material and skeleton tables, then each
//! skeleton's bone tree, following absolute pointers. Objects reachable
//! through more than one pointer (images, textures, materials, meshes) are
//! decoded once and referred to by index afterwards.
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

use indexmap::IndexMap;

use super::constants::{FORMAT_VERSION, HEADER_TAG, HEADER_VERSION};
use super::header::Variant;
use crate::binary::BinaryReader;
use crate::error::{Result, Warning};
use crate::model::{Material, Mesh, Model, Texture};
use crate::texture::Image;

/// A parsed model together with the non-fatal problems found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedModel {
    pub model: Model,
    pub warnings: Vec<Warning>,
}

/// Parse a model file held in memory.
///
/// The variant is taken from the header tag unless `variant` overrides it.
///
/// # Errors
/// Returns an error on any out-of-range pointer, unsupported encoding or
/// malformed bone tree.
pub fn parse(data: &[u8], variant: Option<Variant>) -> Result<ParsedModel> {
    let mut reader = BinaryReader::new(data);
    let tag: u8 = reader.read_at(HEADER_TAG)?;
    let version: u16 = reader.read_at(HEADER_VERSION)?;
    let variant = match variant {
        Some(variant) => variant,
        None => Variant::from_tag(tag)?,
    };
    if version != FORMAT_VERSION {
        tracing::debug!("unexpected format version {version}, continuing");
    }

    let mut ctx = ParseContext::new(reader);
    ctx.read_texture_table()?;
    ctx.read_material_table()?;
    let skeletons = ctx.read_skeleton_table(variant)?;

    let ParseContext {
        images,
        textures,
        materials,
        meshes,
        warnings,
        ..
    } = ctx;

    let model = Model {
        variant,
        images: images.into_values().collect(),
        textures: textures.into_values().collect(),
        materials: materials.into_values().collect(),
        meshes: meshes.into_values().collect(),
        skeletons,
    };

    tracing::info!(
        "Parsed {variant} model: {} textures, {} materials, {} meshes, {} skeletons",
        model.textures.len(),
        model.materials.len(),
        model.meshes.len(),
        model.skeletons.len()
    );

    Ok(ParsedModel { model, warnings })
}

/// Call-scoped parse state.
///
/// Every table is keyed by the absolute address its object was read from;
/// insertion order is the object's index in the finished [`Model`].
struct ParseContext<'a> {
    reader: BinaryReader<'a>,
    /// Keyed by pixel payload address.
    images: IndexMap<usize, Image>,
    /// Keyed by texture header address.
    textures: IndexMap<usize, Texture>,
    materials: IndexMap<usize, Material>,
    meshes: IndexMap<usize, Mesh>,
    warnings: Vec<Warning>,
}

impl<'a> ParseContext<'a> {
    fn new(reader: BinaryReader<'a>) -> Self {
        Self {
            reader,
            images: IndexMap::new(),
            textures: IndexMap::new(),
            materials: IndexMap::new(),
            meshes: IndexMap::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Read a table of `count` absolute pointers starting at `list`.
    fn read_pointer_list(&mut self, list: usize, count: usize) -> Result<Vec<Option<usize>>> {
        (0..count).map(|i| self.reader.read_ptr(list, i * 4)).collect()
    }

    /// Read a name through a pointer field, or an empty name for null.
    fn read_name(&mut self, base: usize, offset: usize) -> Result<String> {
        match self.reader.read_ptr(base, offset)? {
            Some(address) => self.reader.read_string(address),
            None => Ok(String::new()),
        }
    }
}
