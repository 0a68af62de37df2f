//! Error types for `PbrModel`

use std::fmt;

use thiserror::Error;

/// The error type for `PbrModel` operations.
///
/// Every variant raised while walking a model's pointer graph carries the
/// absolute file address that could not be decoded.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The serialized model could not be committed to its destination.
    #[error("failed to persist model: {0}")]
    Persist(#[from] tempfile::PersistError),

    // ==================== Binary Access Errors ====================
    /// A read reached past the end of the buffer.
    #[error("read of {size} bytes at {address:#x} is out of bounds (buffer length {len:#x})")]
    OutOfBounds {
        /// Absolute address of the read.
        address: usize,
        /// Number of bytes requested.
        size: usize,
        /// Length of the backing buffer.
        len: usize,
    },

    /// A null-terminated string was not valid text.
    #[error("invalid string at {address:#x}")]
    InvalidString {
        /// Absolute address of the string.
        address: usize,
    },

    // ==================== Texture Errors ====================
    /// The texel encoding code is not one the codec understands.
    #[error("unsupported texel encoding {code:#x} in texture at {address:#x}")]
    UnsupportedEncoding {
        /// Address of the texture header.
        address: usize,
        /// The raw encoding code.
        code: u32,
    },

    /// The palette encoding code is not IA8, RGB565 or RGB5A3.
    #[error("unsupported palette encoding {code:#x} in texture at {address:#x}")]
    UnsupportedPaletteEncoding {
        /// Address of the texture header.
        address: usize,
        /// The raw palette encoding code.
        code: u32,
    },

    /// The wrap mode is not clamp, repeat or mirror.
    #[error("unknown wrap mode {value} in texture at {address:#x}")]
    UnknownWrapMode {
        /// Address of the texture header.
        address: usize,
        /// The raw wrap mode.
        value: u32,
    },

    /// A pixel buffer does not match its declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    InvalidImageSize {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Required buffer length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// An image holds more distinct colors than its palette format allows.
    #[error("image needs {colors} palette entries, format allows {capacity}")]
    PaletteOverflow {
        /// Number of distinct colors found.
        colors: usize,
        /// Maximum palette size for the format.
        capacity: usize,
    },

    /// Reading or writing an image file failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    // ==================== Model Graph Errors ====================
    /// The file extension or header tag does not name a known variant.
    #[error("unknown model variant: {0}")]
    UnknownVariant(String),

    /// A face group uses a draw opcode other than quads, triangles or strips.
    #[error("unknown draw opcode {opcode:#x} at {address:#x}")]
    UnknownDrawOpcode {
        /// Address of the opcode byte.
        address: usize,
        /// The raw opcode.
        opcode: u8,
    },

    /// A curve descriptor names an unknown component or storage format.
    #[error("unknown curve descriptor code {code:#x} at {address:#x}")]
    UnknownCurveFormat {
        /// Address of the offending descriptor field.
        address: usize,
        /// The raw format code.
        code: u8,
    },

    /// A keyframe uses an unknown interpolation code.
    #[error("unknown interpolation {code} at {address:#x}")]
    UnknownInterpolation {
        /// Address of the keyframe entry.
        address: usize,
        /// The raw interpolation code.
        code: u16,
    },

    /// A pointer refers to an object that was never declared in its table.
    #[error("{kind} reference at {address:#x} points to undeclared object {target:#x}")]
    DanglingReference {
        /// What kind of object was expected.
        kind: &'static str,
        /// Address of the pointer field.
        address: usize,
        /// The pointer value.
        target: usize,
    },

    /// The bone tree is not a tree rooted at index 0.
    #[error("malformed skeleton at {address:#x}: {message}")]
    MalformedSkeleton {
        /// Address of the offending bone or skeleton header.
        address: usize,
        /// Description of what is invalid.
        message: String,
    },

    /// The in-memory model cannot be laid out.
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// A `Result` type alias using `PbrModel`'s [`enum@Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// A non-fatal condition found while parsing.
///
/// Warnings never abort a parse; the affected object is still produced.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Warning {
    /// A bone tag outside the recognized set; the bone keeps a default transform.
    UnknownNodeType {
        /// Address of the bone.
        address: usize,
        /// The raw tag.
        tag: u32,
    },
    /// A vertex weight map that does not sum to 1.0.
    MalformedWeightTable {
        /// Address of the weight table.
        address: usize,
        /// Vertex index.
        vertex: usize,
        /// The actual weight sum.
        sum: f32,
    },
    /// Two keyframes of one curve share a time; the later one is kept.
    DuplicateKeyframeTime {
        /// Address of the keyframe block.
        address: usize,
        /// The shared time.
        time: f32,
    },
    /// A pivot block whose sentinel fields match neither known form.
    UnrecognizedPivotSentinel {
        /// Address of the bone.
        address: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNodeType { address, tag } => {
                write!(f, "unknown node type {tag} at {address:#x}")
            }
            Self::MalformedWeightTable { address, vertex, sum } => {
                write!(f, "weights of vertex {vertex} in table at {address:#x} sum to {sum}")
            }
            Self::DuplicateKeyframeTime { address, time } => {
                write!(f, "duplicate keyframe time {time} in curve at {address:#x}")
            }
            Self::UnrecognizedPivotSentinel { address } => {
                write!(f, "unrecognized pivot sentinel at {address:#x}")
            }
        }
    }
}
