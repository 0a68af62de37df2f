//! Container variants and their file header layouts.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// The three container variants. They share every sub-layout and differ only
/// in where the file header keeps the skeleton table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Variant {
    /// Single-model container with a skeleton list.
    #[default]
    Sdr,
    /// Single-skeleton container.
    Odr,
    /// Multi-skeleton container.
    Mdr,
}

/// Where a variant keeps its skeleton table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonSlot {
    /// A pointer to a list of skeleton pointers plus a count.
    List { pointer: usize, count: usize },
    /// A direct pointer to the only skeleton.
    Single { pointer: usize },
}

impl Variant {
    /// Identify a variant by file extension (case-insensitive).
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "sdr" => Some(Self::Sdr),
            "odr" => Some(Self::Odr),
            "mdr" => Some(Self::Mdr),
            _ => None,
        }
    }

    /// Identify a variant by the tag byte at the start of the file.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(Self::Sdr),
            2 => Ok(Self::Odr),
            3 => Ok(Self::Mdr),
            other => Err(Error::UnknownVariant(format!("header tag {other:#04x}"))),
        }
    }

    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Sdr => 1,
            Self::Odr => 2,
            Self::Mdr => 3,
        }
    }

    /// Lowercase file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Sdr => "sdr",
            Self::Odr => "odr",
            Self::Mdr => "mdr",
        }
    }

    /// Header offsets of the skeleton table.
    #[must_use]
    pub const fn skeleton_slot(self) -> SkeletonSlot {
        match self {
            Self::Sdr => SkeletonSlot::List {
                pointer: 0x08,
                count: 0x18,
            },
            Self::Odr => SkeletonSlot::Single { pointer: 0x08 },
            Self::Mdr => SkeletonSlot::List {
                pointer: 0x10,
                count: 0x1C,
            },
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sdr => "SDR",
            Self::Odr => "ODR",
            Self::Mdr => "MDR",
        })
    }
}

/// Layout revision used when writing.
///
/// The two revisions place texture payloads and round face-group streams
/// differently; files of both kinds exist on disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Revision {
    /// Texture headers on 0x20 boundaries with payloads at a flat 0x80,
    /// face-group streams rounded to 0x10.
    Legacy,
    /// Texture headers on 0x10 boundaries with payloads at `0x80 + addr % 0x20`,
    /// face-group streams rounded to 0x20.
    #[default]
    Current,
}

impl Revision {
    /// Offset of a texture payload from its header at `header`.
    #[must_use]
    pub const fn pixel_offset(self, header: usize) -> usize {
        match self {
            Self::Legacy => 0x80,
            Self::Current => 0x80 + header % 0x20,
        }
    }

    #[must_use]
    pub const fn texture_header_alignment(self) -> usize {
        match self {
            Self::Legacy => 0x20,
            Self::Current => 0x10,
        }
    }

    #[must_use]
    pub const fn ops_size_rounding(self) -> usize {
        match self {
            Self::Legacy => 0x10,
            Self::Current => 0x20,
        }
    }
}

/// Serializer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    pub revision: Revision,
    /// Write as this variant instead of the model's own.
    pub variant: Option<Variant>,
}

impl WriteOptions {
    #[must_use]
    pub fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }

    #[must_use]
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_extension() {
        assert_eq!(Variant::from_extension(Path::new("pm0001_00.SDR")), Some(Variant::Sdr));
        assert_eq!(Variant::from_extension(Path::new("stage/field.mdr")), Some(Variant::Mdr));
        assert_eq!(Variant::from_extension(Path::new("model.bin")), None);
        assert_eq!(Variant::from_extension(Path::new("model")), None);
    }

    #[test]
    fn test_variant_tags() {
        for variant in [Variant::Sdr, Variant::Odr, Variant::Mdr] {
            assert_eq!(Variant::from_tag(variant.tag()).unwrap(), variant);
        }
        assert!(matches!(Variant::from_tag(9), Err(Error::UnknownVariant(_))));
    }

    #[test]
    fn test_revision_pixel_offsets() {
        assert_eq!(Revision::Current.pixel_offset(0x30), 0x90);
        assert_eq!(Revision::Current.pixel_offset(0x40), 0x80);
        assert_eq!(Revision::Legacy.pixel_offset(0x30), 0x80);
    }
}
