// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Operator descriptor registry.
//!
//! Each operator is described by its ordered IO slots, its attribute
//! declarations and the table of dtype/format combinations a backend kernel
//! accepts. Descriptors are validated once when they are built, registered
//! into an [`OperatorRegistry`] during startup and looked up by name when a
//! dispatcher needs to pick a kernel.

pub mod builder;
pub mod catalog;
pub mod descriptor;
pub mod dtype;
pub mod error;
pub mod op_info;
pub mod registry;

pub use builder::OpInfoBuilder;
pub use descriptor::{
    AttrDecl, AttrKind, FusionType, ImplyType, IoSlot, OperatorDescriptor, ParamType, SlotRole,
    TypeFormatTuple,
};
pub use dtype::{DType, DTypeFormat, Format};
pub use error::{OpInfoError, OpInfoResult};
pub use op_info::{parse_catalog, OpInfoRecord, SlotRecord};
pub use registry::{KernelSelection, OperatorRegistry, RegistryHandle};
