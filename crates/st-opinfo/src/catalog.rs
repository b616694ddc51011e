// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Built-in AiCPU kernel declarations.

use crate::builder::OpInfoBuilder;
use crate::descriptor::ParamType::{Optional, Required};
use crate::descriptor::{AttrKind, FusionType, OperatorDescriptor};
use crate::dtype::DType;
use crate::error::OpInfoResult;
use crate::registry::{OperatorRegistry, RegistryHandle};

const INTEGER: [DType; 8] = [
    DType::I8,
    DType::I16,
    DType::I32,
    DType::I64,
    DType::U8,
    DType::U16,
    DType::U32,
    DType::U64,
];

const REAL_FLOAT: [DType; 3] = [DType::F16, DType::F32, DType::F64];

const COMPLEX: [DType; 2] = [DType::C64, DType::C128];

fn numeric() -> impl Iterator<Item = DType> {
    INTEGER.into_iter().chain(REAL_FLOAT).chain(COMPLEX)
}

/// Every built-in descriptor.
pub fn aicpu() -> OpInfoResult<Vec<OperatorDescriptor>> {
    Ok(vec![
        pad_v3()?,
        adaptive_max_pool_2d()?,
        cast()?,
        acosh()?,
        data_format_vec_permute()?,
        zeros_like()?,
    ])
}

/// Register the built-in descriptors into `registry`.
pub fn register_aicpu(registry: &OperatorRegistry) -> OpInfoResult<Vec<RegistryHandle>> {
    registry.register_all(aicpu()?)
}

pub fn pad_v3() -> OpInfoResult<OperatorDescriptor> {
    let mut builder = OpInfoBuilder::aicpu("PadV3")
        .with_fusion_type(FusionType::Opaque)
        .with_input(0, "x", Required)
        .with_input(1, "paddings", Required)
        .with_input(2, "constant_values", Optional)
        .with_output(0, "y", Required)
        .with_attr("mode", AttrKind::Str)
        .with_attr("paddings_contiguous", AttrKind::Bool);
    for paddings in [DType::I32, DType::I64] {
        for dtype in numeric() {
            let value = dtype.with_default_format();
            builder = builder.with_dtype_format([
                value,
                paddings.with_default_format(),
                value,
                value,
            ]);
        }
    }
    builder.build()
}

pub fn adaptive_max_pool_2d() -> OpInfoResult<OperatorDescriptor> {
    let mut builder = OpInfoBuilder::aicpu("AdaptiveMaxPool2D")
        .with_fusion_type(FusionType::Opaque)
        .with_input(0, "x", Required)
        .with_output(0, "y", Required)
        .with_output(1, "argmax", Required);
    for argmax in [DType::I32, DType::I64] {
        for dtype in REAL_FLOAT {
            let value = dtype.with_default_format();
            builder = builder.with_dtype_format([value, value, argmax.with_default_format()]);
        }
    }
    builder.build()
}

/// Conversions between every pair of bool, integer and real float types.
pub fn cast() -> OpInfoResult<OperatorDescriptor> {
    let types: Vec<DType> = std::iter::once(DType::Bool)
        .chain(INTEGER)
        .chain(REAL_FLOAT)
        .collect();
    let mut builder = OpInfoBuilder::aicpu("Cast")
        .with_fusion_type(FusionType::Opaque)
        .with_input(0, "x", Required)
        .with_output(0, "y", Required);
    for &src in &types {
        for &dst in &types {
            builder = builder.with_dtype_format([src.with_default_format(), dst.with_default_format()]);
        }
    }
    builder.build()
}

pub fn acosh() -> OpInfoResult<OperatorDescriptor> {
    OpInfoBuilder::aicpu("Acosh")
        .with_fusion_type(FusionType::ElemWise)
        .with_input(0, "x", Required)
        .with_output(0, "y", Required)
        .with_dtype_formats(REAL_FLOAT.into_iter().chain(COMPLEX).map(|dtype| {
            vec![dtype.with_default_format(), dtype.with_default_format()]
        }))
        .build()
}

pub fn data_format_vec_permute() -> OpInfoResult<OperatorDescriptor> {
    OpInfoBuilder::aicpu("DataFormatVecPermute")
        .with_fusion_type(FusionType::Opaque)
        .with_input(0, "x", Required)
        .with_output(0, "y", Required)
        .with_attr("src_format", AttrKind::Str)
        .with_attr("dst_format", AttrKind::Str)
        .with_dtype_formats([DType::I32, DType::I64].into_iter().map(|dtype| {
            vec![dtype.with_default_format(), dtype.with_default_format()]
        }))
        .build()
}

pub fn zeros_like() -> OpInfoResult<OperatorDescriptor> {
    OpInfoBuilder::aicpu("ZerosLike")
        .with_fusion_type(FusionType::ElemWise)
        .with_input(0, "x", Required)
        .with_output(0, "y", Required)
        .with_dtype_formats(std::iter::once(DType::Bool).chain(numeric()).map(|dtype| {
            vec![dtype.with_default_format(), dtype.with_default_format()]
        }))
        .build()
}
