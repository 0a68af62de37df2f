//! Textures and materials.

use crate::animation::MaterialTrack;
use crate::texture::WrapMode;

/// A sampler binding an image with per-axis wrap modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Texture {
    /// Index into [`Model::images`](super::Model::images).
    pub image: usize,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

/// Static UV transform applied before any UV animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub translation: [f32; 2],
    /// Rotation in radians.
    pub rotation: f32,
    pub scale: [f32; 2],
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0],
            rotation: 0.0,
            scale: [1.0, 1.0],
        }
    }
}

/// Offset of the render state bytes in a material header.
pub const RENDER_STATE_OFFSET: usize = 0x58;
/// Number of render state bytes.
pub const RENDER_STATE_LEN: usize = 0x2C;

/// Raw fixed-function render state (colors and blend parameters) kept
/// verbatim between parse and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState(pub [u8; RENDER_STATE_LEN]);

impl Default for RenderState {
    fn default() -> Self {
        let mut bytes = [0u8; RENDER_STATE_LEN];
        let mut set = |offset: usize, values: &[u8]| {
            let start = offset - RENDER_STATE_OFFSET;
            bytes[start..start + values.len()].copy_from_slice(values);
        };
        set(0x5A, &[0x01, 0x01, 0x01, 0xFF]);
        set(0x60, &[0x80, 0x80, 0x80, 0xFF]);
        set(0x64, &[0xFF; 4]);
        set(0x70, &[0x00, 0x00, 0x00, 0xFF]);
        set(0x74, &[0xFF]);
        set(0x78, &[0x33, 0x33, 0x33, 0xFF]);
        set(0x80, &[0xFF; 4]);
        Self(bytes)
    }
}

/// A surface description referenced by mesh parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    pub name: String,
    /// Index into [`Model::textures`](super::Model::textures).
    pub texture: Option<usize>,
    pub uv_transform: Option<UvTransform>,
    pub render_state: RenderState,
    pub uv_tracks: Vec<MaterialTrack>,
}

impl Material {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uv_transform: Some(UvTransform::default()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_render_state_layout() {
        let state = RenderState::default();
        assert_eq!(&state.0[2..6], &[0x01, 0x01, 0x01, 0xFF]);
        assert_eq!(state.0[0x74 - RENDER_STATE_OFFSET], 0xFF);
        assert_eq!(&state.0[RENDER_STATE_LEN - 4..], &[0xFF; 4]);
        assert_eq!(state.0[0], 0);
    }
}
