//! Bind pose and skinning math
//!
//! Global transforms are derived from the bone tree on demand and never
//! stored in the model. A bone's local transform depends on its node kind:
//! rigid joints pre-multiply their bind rotation, pivot nodes expand into
//! the pivot-corrected sequence, and unknown nodes contribute identity so
//! the tree below them stays walkable.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

mod skinning;
mod transform;

pub use skinning::{SkinnedMesh, skin_mesh};
pub use transform::{
    euler_rotation, global_transforms, inverse_bind_matrices, local_transform, matrix_from_rows,
    posed_transforms,
};
