//! Fixed sizes, offsets and codes of the container layout.

// ============================================================================
// File Header
// ============================================================================

pub const FILE_HEADER_SIZE: usize = 0x30;
pub const FORMAT_VERSION: u16 = 4;

pub const HEADER_TAG: usize = 0x00;
pub const HEADER_VERSION: usize = 0x02;
pub const HEADER_TEXTURE_LIST: usize = 0x0C;
pub const HEADER_TEXTURE_COUNT: usize = 0x1A;
pub const HEADER_MATERIAL_LIST: usize = 0x14;
pub const HEADER_MATERIAL_COUNT: usize = 0x1E;

// ============================================================================
// Textures
// ============================================================================

pub const TEXTURE_HEADER_SIZE: usize = 0x80;
pub const TEX_WIDTH: usize = 0x00;
pub const TEX_HEIGHT: usize = 0x02;
pub const TEX_LEVELS: usize = 0x05;
pub const TEX_ENCODING: usize = 0x08;
pub const TEX_PALETTE_ENCODING: usize = 0x0C;
pub const TEX_WRAP_S: usize = 0x10;
pub const TEX_WRAP_T: usize = 0x14;
pub const TEX_PIXEL_OFFSET: usize = 0x28;
pub const TEX_PALETTE_OFFSET: usize = 0x30;
pub const TEX_PALETTE_COUNT: usize = 0x34;
pub const TEX_DATA_SIZE: usize = 0x4C;

/// Alignment of pixel and palette payloads.
pub const PAYLOAD_ALIGNMENT: usize = 0x20;
/// Gap left between the end of one texture and the next header.
pub const TEXTURE_GAP: usize = 0x10;

// ============================================================================
// Materials
// ============================================================================

pub const MATERIAL_HEADER_SIZE: usize = 0x8C;
pub const MAT_NAME: usize = 0x00;
pub const MAT_TEXTURE: usize = 0x18;
pub const MAT_UV_TRANSFORM: usize = 0x2C;
pub const MAT_UV_CURVES: usize = 0x30;
pub const MAT_BLEND: usize = 0x40;

pub const UV_TRANSFORM_SIZE: usize = 0x18;
pub const UV_TRANSFORM_KIND: u8 = 1;
pub const UV_TRANSFORM_COMPONENTS: u8 = 4;

pub const BLEND_BLOCK: [u8; 8] = [0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00];

// ============================================================================
// Skeletons and Actions
// ============================================================================

pub const SKELETON_HEADER_SIZE: usize = 0x1C;
pub const SKEL_NAME: usize = 0x00;
pub const SKEL_BONE_COUNT: usize = 0x06;
pub const SKEL_ACTION_COUNT: usize = 0x08;
pub const SKEL_ACTIONS: usize = 0x0C;
pub const SKEL_ROOT: usize = 0x10;

pub const ACTION_RECORD_SIZE: usize = 0x30;
pub const ACT_NAME: usize = 0x00;
pub const ACT_ATTACK_WINDOW: usize = 0x04;
pub const ACT_STAGE_OFFSET: usize = 0x08;
pub const ACT_DURATION: usize = 0x0C;
pub const ACT_FLAGS: usize = 0x28;

// ============================================================================
// Bones
// ============================================================================

pub const BONE_HEADER_SIZE: usize = 0x30;
pub const SKIN_HEADER_SIZE: usize = 0x3C;
pub const JOINT_HEADER_SIZE: usize = 0x78;

pub const BONE_TAG: usize = 0x00;
pub const BONE_NAME: usize = 0x04;
pub const BONE_INDEX: usize = 0x08;
pub const BONE_FLAGS: usize = 0x0A;
pub const BONE_TRANSLATION: usize = 0x0C;
pub const BONE_ROTATION: usize = 0x10;
pub const BONE_SCALE: usize = 0x14;
pub const BONE_PIVOTS: usize = 0x18;
pub const BONE_VIEW_DISTANCE: usize = 0x1C;
pub const BONE_CURVES: usize = 0x20;
pub const BONE_CHILD: usize = 0x24;
pub const BONE_SIBLING: usize = 0x28;
pub const BONE_MESH: usize = 0x30;
pub const BONE_BIND_ROTATION: usize = 0x34;
pub const BONE_INVERSE_BIND: usize = 0x44;

pub const TAG_TRANSFORM: u32 = 0;
pub const TAG_NULL: u32 = 1;
pub const TAG_RIGID_JOINT: u32 = 2;
pub const TAG_SKIN: u32 = 3;
pub const TAG_CAMERA: u32 = 4;
pub const TAG_LIGHT: u32 = 5;

/// Four vec3 slots.
pub const PIVOT_BLOCK_SIZE: usize = 0x30;

// ============================================================================
// Meshes
// ============================================================================

pub const MESH_HEADER_SIZE: usize = 0x30;
pub const MESH_FORMAT: usize = 0x00;
pub const MESH_VERTEX_COUNT: usize = 0x02;
pub const MESH_UV_LAYERS: usize = 0x06;
pub const MESH_VERTICES: usize = 0x08;
pub const MESH_WEIGHTS: usize = 0x0C;
pub const MESH_UVS: usize = 0x14;
pub const MESH_PARTS: usize = 0x18;
pub const MESH_BOUNDS: usize = 0x1C;

pub const MESH_FORMAT_TAG: u16 = 0x0A00;
/// Interleaved position and normal.
pub const VERTEX_STRIDE: usize = 0x18;
pub const UV_STRIDE: usize = 0x08;
/// Coordinates follow the coordinate pointer and count.
pub const UV_HEADER_SIZE: usize = 0x08;

pub const BOUNDS_BLOCK_SIZE: usize = 0x48;
pub const BOUNDS_COUNT: usize = 0x18;
pub const BOUNDS_ENTRY: usize = 0x1C;
pub const BOUNDS_ENTRY_OFFSET: usize = 0x24;
pub const BOUNDS_VALUES_OFFSET: usize = 0x30;
pub const BOUNDS_ENTRY_KIND: u8 = 0x1E;

// ============================================================================
// Face Groups
// ============================================================================

pub const PART_HEADER_SIZE: usize = 0x40;
pub const PART_KIND: usize = 0x00;
pub const PART_MATERIAL: usize = 0x08;
pub const PART_OP_COUNT: usize = 0x0C;
pub const PART_VERTEX_INFO: usize = 0x10;
pub const PART_OPS: usize = 0x14;
pub const PART_OPS_SIZE: usize = 0x18;
pub const PART_NEXT: usize = 0x1C;

pub const PART_KIND_TRIANGLES: u32 = 1;
pub const OPS_ALIGNMENT: usize = 0x20;

pub const VERTEX_INFO_SIZE: usize = 0xC0;
pub const VERTEX_INFO_ENTRY_SIZE: usize = 8;
pub const VERTEX_INFO_END: u8 = 0xFF;

pub const ATTR_POSITION: u8 = 0x09;
pub const ATTR_NORMAL: u8 = 0x0A;
pub const ATTR_TEX0: u8 = 0x0D;
pub const ATTR_NBT: u8 = 0x19;

pub const OP_QUADS: u8 = 0x80;
pub const OP_TRIANGLES: u8 = 0x90;
pub const OP_TRIANGLE_STRIP: u8 = 0x98;

// ============================================================================
// Weights
// ============================================================================

pub const WEIGHT_HEADER_SIZE: usize = 0x1C;
pub const WT_SINGLE_COUNT: usize = 0x00;
pub const WT_SINGLE: usize = 0x04;
pub const WT_PAIR_COUNT: usize = 0x08;
pub const WT_PAIR_VERTICES: usize = 0x0A;
pub const WT_PAIRS: usize = 0x0C;
pub const WT_PAIR_WEIGHTS: usize = 0x10;
pub const WT_EXTRA_COUNT: usize = 0x14;
pub const WT_EXTRA: usize = 0x18;

pub const SINGLE_RUN_SIZE: usize = 4;
pub const PAIR_RUN_SIZE: usize = 6;
pub const EXTRA_ENTRY_SIZE: usize = 10;
/// Marks an unused fourth-bone slot in a correction entry.
pub const NO_BONE: u16 = 0xFFFF;
pub const WEIGHT_SCALE: f32 = 65535.0;

// ============================================================================
// Curves
// ============================================================================

pub const CURVE_HEADER_SIZE: usize = 0x10;
pub const CH_ACTION: usize = 0x00;
pub const CH_COUNT: usize = 0x02;
pub const CH_DESCRIPTORS: usize = 0x04;
pub const CH_LENGTH: usize = 0x08;
pub const CH_NEXT: usize = 0x0C;

pub const DESCRIPTOR_SIZE: usize = 0x10;
pub const CD_COMPONENT: usize = 0x01;
pub const CD_AXIS: usize = 0x02;
pub const CD_FORMAT: usize = 0x06;
pub const CD_EXPONENT: usize = 0x07;
pub const CD_KEYS: usize = 0x08;

pub const KEY_BLOCK_SIZE: usize = 0x20;
pub const KB_VALUES: usize = 0x00;
pub const KB_HANDLES: usize = 0x04;
pub const KB_VALUE_COUNT: usize = 0x08;
pub const KB_HANDLE_COUNT: usize = 0x0A;
pub const KB_END_TIME: usize = 0x0C;
pub const KB_FRAMES: usize = 0x10;
pub const KB_FRAME_COUNT: usize = 0x14;
pub const KB_SENTINEL: usize = 0x18;
pub const KEY_BLOCK_SENTINEL: f32 = -1_234_567.0;

pub const FRAME_SIZE: usize = 0x0C;
pub const FR_INTERPOLATION: usize = 0x00;
pub const FR_VALUE: usize = 0x02;
pub const FR_LEFT_HANDLE: usize = 0x04;
pub const FR_RIGHT_HANDLE: usize = 0x06;
pub const FR_TIME: usize = 0x08;
