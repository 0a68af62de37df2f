//! # `PbrModel`
//!
//! A pure-Rust codec for Pokémon Battle Revolution model containers.
//!
//! ## Supported Formats
//!
//! - **SDR** - Character and Pokémon models (skeleton list)
//! - **ODR** - Object models (a single skeleton)
//! - **MDR** - Map and stage models (skeleton list at a second slot)
//!
//! All three share one pointer-graph grammar: textures in the console GPU's
//! tiled encodings, materials, bone trees with skinned meshes, and quantized
//! animation curves.
//!
//! ## Quick Start
//!
//! ### Reading a Model
//!
//! ```no_run
//! use pbrmodel::read_model;
//!
//! let parsed = read_model("pikachu.sdr")?;
//! for warning in &parsed.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! println!("{} meshes", parsed.model.meshes.len());
//! # Ok::<(), pbrmodel::Error>(())
//! ```
//!
//! ### Writing a Model
//!
//! ```no_run
//! use pbrmodel::prelude::*;
//!
//! let parsed = read_model("pikachu.sdr")?;
//! let options = WriteOptions::default().with_revision(Revision::Legacy);
//! write_model("rebuilt.sdr", &parsed.model, options)?;
//! # Ok::<(), pbrmodel::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `pbrmodel` command-line binary

pub mod animation;
pub mod batch;
pub mod binary;
pub mod error;
pub mod inspect;
pub mod model;
pub mod rig;
pub mod sdr;
pub mod texture;

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::model::Model;

// Re-exports for convenience
pub use error::{Error, Result, Warning};
pub use sdr::{ParsedModel, Revision, Variant, WriteOptions};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::animation::{
        Action, BoneTrack, CurveComponent, FCurve, Interpolation, Keyframe, MaterialTrack, ValueFormat,
    };
    pub use crate::batch::{BatchOperation, BatchResult, batch_process, find_model_files};
    pub use crate::error::{Error, Result, Warning};
    pub use crate::inspect::{ModelInfo, inspect_model};
    pub use crate::model::{
        Bone, Bounds, Face, Material, Mesh, MeshPart, Model, NodeKind, PivotSet, PlaceholderKind,
        Skeleton, Texture, UvTransform, VertexWeights,
    };
    pub use crate::rig::{global_transforms, inverse_bind_matrices, posed_transforms, skin_mesh};
    pub use crate::sdr::{ParsedModel, Revision, Variant, WriteOptions};
    pub use crate::texture::{Image, PaletteEncoding, TexelEncoding, WrapMode};
    pub use crate::{parse_bytes, read_model, serialize_to_bytes, write_model};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a model held in memory, taking the variant from its header tag.
///
/// # Errors
/// Returns an error if the bytes are not a well-formed container.
pub fn parse_bytes(data: &[u8]) -> Result<ParsedModel> {
    sdr::parse(data, None)
}

/// Read and parse a model file.
///
/// The variant comes from the file extension when it names one, and from
/// the header tag otherwise.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<ParsedModel> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    tracing::debug!("Read {} ({} bytes)", path.display(), data.len());
    sdr::parse(&data, Variant::from_extension(path))
}

/// Serialize a model into memory.
///
/// # Errors
/// Returns an error if the model is invalid or exceeds the format's limits.
pub fn serialize_to_bytes(model: &Model, options: WriteOptions) -> Result<Vec<u8>> {
    sdr::serialize(model, options)
}

/// Serialize a model and write it to `path`.
///
/// The bytes go to a temporary file next to the destination, which replaces
/// `path` only once it is complete.
///
/// # Errors
/// Returns an error if serialization fails or the file cannot be written.
pub fn write_model<P: AsRef<Path>>(path: P, model: &Model, options: WriteOptions) -> Result<()> {
    let path = path.as_ref();
    let bytes = sdr::serialize(model, options)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&bytes)?;
    file.flush()?;
    file.persist(path)?;

    tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
