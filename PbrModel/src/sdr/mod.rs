//! SDR/ODR/MDR container codec
//!
//! A container is a single big-endian buffer in which every structure is
//! reached through 32-bit absolute pointers from a fixed file header.
//! [`parse`] walks that graph into a [`Model`](crate::model::Model);
//! [`serialize`] lays a model out again, assigning addresses in the order
//! the game expects and patching every pointer once its target is written.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

pub mod constants;
mod header;
mod parser;
mod writer;

pub use header::{Revision, SkeletonSlot, Variant, WriteOptions};
pub use parser::{ParsedModel, parse};
pub use writer::serialize;
