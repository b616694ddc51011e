// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::descriptor::{
    AttrDecl, AttrKind, FusionType, ImplyType, IoSlot, OperatorDescriptor, ParamType,
    TypeFormatTuple,
};
use crate::dtype::DTypeFormat;
use crate::error::OpInfoResult;

/// Chained declaration of an operator descriptor.
///
/// ```
/// use st_opinfo::{DTypeFormat, FusionType, OpInfoBuilder, ParamType};
///
/// let relu = OpInfoBuilder::aicpu("Relu")
///     .with_fusion_type(FusionType::ElemWise)
///     .with_input(0, "x", ParamType::Required)
///     .with_output(0, "y", ParamType::Required)
///     .with_dtype_format([DTypeFormat::F32_DEFAULT, DTypeFormat::F32_DEFAULT])
///     .build()
///     .unwrap();
/// assert_eq!(relu.combinations().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct OpInfoBuilder {
    name: String,
    imply_type: ImplyType,
    fusion_type: FusionType,
    slots: Vec<IoSlot>,
    attrs: Vec<AttrDecl>,
    combinations: Vec<TypeFormatTuple>,
}

impl OpInfoBuilder {
    /// Create a new builder for the given backend.
    pub fn new(name: impl Into<String>, imply_type: ImplyType) -> Self {
        Self {
            name: name.into(),
            imply_type,
            fusion_type: FusionType::default(),
            slots: Vec::new(),
            attrs: Vec::new(),
            combinations: Vec::new(),
        }
    }

    /// Shorthand for an AiCPU operator.
    pub fn aicpu(name: impl Into<String>) -> Self {
        Self::new(name, ImplyType::AiCpu)
    }

    pub fn with_fusion_type(mut self, fusion_type: FusionType) -> Self {
        self.fusion_type = fusion_type;
        self
    }

    /// Declare the next input slot.
    pub fn with_input(mut self, index: usize, name: impl Into<String>, param_type: ParamType) -> Self {
        self.slots.push(IoSlot::input(index, name, param_type));
        self
    }

    /// Declare the next output slot.
    pub fn with_output(
        mut self,
        index: usize,
        name: impl Into<String>,
        param_type: ParamType,
    ) -> Self {
        self.slots.push(IoSlot::output(index, name, param_type));
        self
    }

    /// Declare a fixed attribute.
    pub fn with_attr(mut self, name: impl Into<String>, kind: AttrKind) -> Self {
        self.attrs.push(AttrDecl::required(name, kind));
        self
    }

    pub fn with_optional_attr(mut self, name: impl Into<String>, kind: AttrKind) -> Self {
        self.attrs.push(AttrDecl::optional(name, kind));
        self
    }

    /// Append one valid combination, one pair per declared slot.
    pub fn with_dtype_format<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = DTypeFormat>,
    {
        self.combinations.push(pairs.into_iter().collect());
        self
    }

    /// Append many combinations at once.
    pub fn with_dtype_formats<I, T>(mut self, tuples: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeFormatTuple>,
    {
        self.combinations.extend(tuples.into_iter().map(Into::into));
        self
    }

    /// Validate and freeze the descriptor.
    pub fn build(self) -> OpInfoResult<OperatorDescriptor> {
        OperatorDescriptor::from_parts(
            self.name,
            self.imply_type,
            self.fusion_type,
            self.slots,
            self.attrs,
            self.combinations,
        )
    }
}
