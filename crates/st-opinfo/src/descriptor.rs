// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Static operator metadata: IO slots, attribute declarations and the table
//! of dtype/format combinations a backend kernel accepts.

use crate::dtype::DTypeFormat;
use crate::error::{OpInfoError, OpInfoResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Whether a slot feeds the kernel or is produced by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRole {
    Input,
    Output,
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotRole::Input => write!(f, "input"),
            SlotRole::Output => write!(f, "output"),
        }
    }
}

/// Presence requirement of a slot or attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    Required,
    Optional,
    /// Variadic slot (a list of tensors sharing one dtype/format entry).
    Dynamic,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Required => write!(f, "required"),
            ParamType::Optional => write!(f, "optional"),
            ParamType::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// One declared operand position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IoSlot {
    pub role: SlotRole,
    pub index: usize,
    pub name: String,
    pub param_type: ParamType,
}

impl IoSlot {
    pub fn input(index: usize, name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            role: SlotRole::Input,
            index,
            name: name.into(),
            param_type,
        }
    }

    pub fn output(index: usize, name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            role: SlotRole::Output,
            index,
            name: name.into(),
            param_type,
        }
    }

    pub fn is_required(&self) -> bool {
        self.param_type == ParamType::Required
    }
}

/// Value kind of an operator attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrKind {
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "listInt")]
    ListInt,
    #[serde(rename = "listFloat")]
    ListFloat,
    #[serde(rename = "listBool")]
    ListBool,
    #[serde(rename = "listStr")]
    ListStr,
    #[serde(rename = "type")]
    Type,
}

/// Attribute declaration; fixed (`Required`) or `Optional`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttrKind,
    #[serde(default)]
    pub param_type: ParamType,
}

impl AttrDecl {
    pub fn required(name: impl Into<String>, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            kind,
            param_type: ParamType::Required,
        }
    }

    pub fn optional(name: impl Into<String>, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            kind,
            param_type: ParamType::Optional,
        }
    }
}

/// Backend family that implements the operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImplyType {
    #[default]
    #[serde(rename = "AiCPU")]
    AiCpu,
    #[serde(rename = "TBE")]
    Tbe,
    #[serde(rename = "AKG")]
    Akg,
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "GPU")]
    Gpu,
}

impl fmt::Display for ImplyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImplyType::AiCpu => write!(f, "AiCPU"),
            ImplyType::Tbe => write!(f, "TBE"),
            ImplyType::Akg => write!(f, "AKG"),
            ImplyType::Cpu => write!(f, "CPU"),
            ImplyType::Gpu => write!(f, "GPU"),
        }
    }
}

impl std::str::FromStr for ImplyType {
    type Err = OpInfoError;

    fn from_str(raw: &str) -> OpInfoResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "aicpu" => Ok(ImplyType::AiCpu),
            "tbe" => Ok(ImplyType::Tbe),
            "akg" => Ok(ImplyType::Akg),
            "cpu" => Ok(ImplyType::Cpu),
            "gpu" => Ok(ImplyType::Gpu),
            _ => Err(OpInfoError::Parse {
                what: "imply type",
                value: raw.to_string(),
            }),
        }
    }
}

/// Hint for the graph fuser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FusionType {
    #[default]
    Opaque,
    ElemWise,
    Broadcast,
    CommReduce,
    Segment,
}

/// One jointly valid dtype/format assignment, one entry per declared slot in
/// declared order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeFormatTuple(Vec<DTypeFormat>);

impl TypeFormatTuple {
    pub fn new(entries: Vec<DTypeFormat>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[DTypeFormat] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&DTypeFormat> {
        self.0.get(position)
    }
}

impl From<Vec<DTypeFormat>> for TypeFormatTuple {
    fn from(entries: Vec<DTypeFormat>) -> Self {
        Self(entries)
    }
}

impl FromIterator<DTypeFormat> for TypeFormatTuple {
    fn from_iter<I: IntoIterator<Item = DTypeFormat>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for TypeFormatTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Validated, immutable metadata for one operator.
#[derive(Clone, Debug, PartialEq)]
pub struct OperatorDescriptor {
    name: String,
    imply_type: ImplyType,
    fusion_type: FusionType,
    slots: Vec<IoSlot>,
    attrs: Vec<AttrDecl>,
    combinations: Vec<TypeFormatTuple>,
}

impl OperatorDescriptor {
    /// Builds an AiCPU descriptor with an opaque fusion hint. Use
    /// [`crate::OpInfoBuilder`] for other backends or hints.
    pub fn new(
        name: impl Into<String>,
        slots: Vec<IoSlot>,
        attrs: Vec<AttrDecl>,
        combinations: Vec<TypeFormatTuple>,
    ) -> OpInfoResult<Self> {
        Self::from_parts(
            name.into(),
            ImplyType::default(),
            FusionType::default(),
            slots,
            attrs,
            combinations,
        )
    }

    pub(crate) fn from_parts(
        name: String,
        imply_type: ImplyType,
        fusion_type: FusionType,
        slots: Vec<IoSlot>,
        attrs: Vec<AttrDecl>,
        combinations: Vec<TypeFormatTuple>,
    ) -> OpInfoResult<Self> {
        let descriptor = Self {
            name,
            imply_type,
            fusion_type,
            slots,
            attrs,
            combinations,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn validate(&self) -> OpInfoResult<()> {
        if self.name.trim().is_empty() {
            return Err(OpInfoError::EmptyName);
        }

        let mut next_input = 0usize;
        let mut next_output = 0usize;
        for slot in &self.slots {
            let expected = match slot.role {
                SlotRole::Input => &mut next_input,
                SlotRole::Output => &mut next_output,
            };
            if slot.index != *expected {
                return Err(OpInfoError::SlotIndex {
                    op: self.name.clone(),
                    role: slot.role,
                    slot: slot.name.clone(),
                    expected: *expected,
                    found: slot.index,
                });
            }
            *expected += 1;
        }

        let mut attr_names = HashSet::new();
        for attr in &self.attrs {
            if !attr_names.insert(attr.name.as_str()) {
                return Err(OpInfoError::DuplicateAttribute {
                    op: self.name.clone(),
                    attr: attr.name.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for (combo, tuple) in self.combinations.iter().enumerate() {
            if tuple.len() != self.slots.len() {
                return Err(OpInfoError::ComboArity {
                    op: self.name.clone(),
                    combo,
                    expected: self.slots.len(),
                    found: tuple.len(),
                });
            }
            if !seen.insert(tuple) {
                return Err(OpInfoError::DuplicateCombination {
                    op: self.name.clone(),
                    combo,
                });
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn imply_type(&self) -> ImplyType {
        self.imply_type
    }

    pub fn fusion_type(&self) -> FusionType {
        self.fusion_type
    }

    /// Slots in declared order.
    pub fn slots(&self) -> &[IoSlot] {
        &self.slots
    }

    pub fn attrs(&self) -> &[AttrDecl] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrDecl> {
        self.attrs.iter().find(|attr| attr.name == name)
    }

    pub fn combinations(&self) -> &[TypeFormatTuple] {
        &self.combinations
    }

    pub fn inputs(&self) -> impl Iterator<Item = &IoSlot> {
        self.slots.iter().filter(|slot| slot.role == SlotRole::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &IoSlot> {
        self.slots.iter().filter(|slot| slot.role == SlotRole::Output)
    }

    /// Tuple positions of the slots with the given role, in declared order.
    pub fn positions(&self, role: SlotRole) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.role == role)
            .map(|(position, _)| position)
            .collect()
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs().count()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs().count()
    }

    /// Whether `tuple` is one of the declared combinations.
    pub fn supports(&self, tuple: &TypeFormatTuple) -> bool {
        self.combinations.iter().any(|candidate| candidate == tuple)
    }

    /// Kernel selection: the first combination whose input entries accept
    /// the requested input pairs.
    ///
    /// `requested[k]` describes the k-th declared input. `None` stands for an
    /// omitted optional operand and matches anything; trailing inputs that
    /// are not mentioned are unconstrained. Returns the row index with the
    /// row, or `None` when more inputs are requested than declared or nothing
    /// matches.
    pub fn select(
        &self,
        requested: &[Option<DTypeFormat>],
    ) -> Option<(usize, &TypeFormatTuple)> {
        let inputs = self.positions(SlotRole::Input);
        if requested.len() > inputs.len() {
            return None;
        }
        self.combinations.iter().enumerate().find(|(_, tuple)| {
            requested
                .iter()
                .zip(&inputs)
                .all(|(request, &position)| match (request, tuple.get(position)) {
                    (None, _) => true,
                    (Some(request), Some(declared)) => declared.accepts(request),
                    (Some(_), None) => false,
                })
        })
    }
}
