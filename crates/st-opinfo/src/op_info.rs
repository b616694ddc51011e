// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! JSON op-info records, the interchange shape handed to kernel selection.
//!
//! Records list inputs and outputs separately; each `dtype_format` row holds
//! the input entries followed by the output entries. Converting a descriptor
//! therefore re-orders interleaved slot declarations into inputs-then-outputs,
//! which is semantically the same table.

use crate::descriptor::{
    AttrDecl, FusionType, ImplyType, IoSlot, OperatorDescriptor, ParamType, SlotRole,
    TypeFormatTuple,
};
use crate::dtype::DTypeFormat;
use crate::error::{OpInfoError, OpInfoResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub index: usize,
    pub name: String,
    #[serde(default)]
    pub param_type: ParamType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpInfoRecord {
    pub op_name: String,
    #[serde(default)]
    pub imply_type: ImplyType,
    #[serde(default)]
    pub fusion_type: FusionType,
    #[serde(default)]
    pub inputs: Vec<SlotRecord>,
    #[serde(default)]
    pub outputs: Vec<SlotRecord>,
    #[serde(default)]
    pub attr: Vec<AttrDecl>,
    #[serde(default)]
    pub dtype_format: Vec<Vec<DTypeFormat>>,
}

impl From<&OperatorDescriptor> for OpInfoRecord {
    fn from(descriptor: &OperatorDescriptor) -> Self {
        let slot_record = |slot: &IoSlot| SlotRecord {
            index: slot.index,
            name: slot.name.clone(),
            param_type: slot.param_type,
        };
        let order: Vec<usize> = descriptor
            .positions(SlotRole::Input)
            .into_iter()
            .chain(descriptor.positions(SlotRole::Output))
            .collect();
        let dtype_format = descriptor
            .combinations()
            .iter()
            .map(|tuple| {
                order
                    .iter()
                    .filter_map(|&position| tuple.get(position).copied())
                    .collect()
            })
            .collect();

        OpInfoRecord {
            op_name: descriptor.name().to_string(),
            imply_type: descriptor.imply_type(),
            fusion_type: descriptor.fusion_type(),
            inputs: descriptor.inputs().map(slot_record).collect(),
            outputs: descriptor.outputs().map(slot_record).collect(),
            attr: descriptor.attrs().to_vec(),
            dtype_format,
        }
    }
}

impl TryFrom<OpInfoRecord> for OperatorDescriptor {
    type Error = OpInfoError;

    fn try_from(record: OpInfoRecord) -> OpInfoResult<Self> {
        let slots = record
            .inputs
            .into_iter()
            .map(|slot| IoSlot::input(slot.index, slot.name, slot.param_type))
            .chain(
                record
                    .outputs
                    .into_iter()
                    .map(|slot| IoSlot::output(slot.index, slot.name, slot.param_type)),
            )
            .collect();
        let combinations = record
            .dtype_format
            .into_iter()
            .map(TypeFormatTuple::new)
            .collect();
        OperatorDescriptor::from_parts(
            record.op_name,
            record.imply_type,
            record.fusion_type,
            slots,
            record.attr,
            combinations,
        )
    }
}

impl OperatorDescriptor {
    pub fn to_record(&self) -> OpInfoRecord {
        OpInfoRecord::from(self)
    }

    pub fn to_json(&self) -> OpInfoResult<String> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    pub fn to_json_pretty(&self) -> OpInfoResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    pub fn from_json(data: &str) -> OpInfoResult<Self> {
        let record: OpInfoRecord = serde_json::from_str(data)?;
        Self::try_from(record)
    }
}

/// Parses either a single record or an array of records.
pub fn parse_catalog(data: &str) -> OpInfoResult<Vec<OperatorDescriptor>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Catalog {
        Many(Vec<OpInfoRecord>),
        One(OpInfoRecord),
    }

    let records = match serde_json::from_str(data)? {
        Catalog::Many(records) => records,
        Catalog::One(record) => vec![record],
    };
    records.into_iter().map(OperatorDescriptor::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::OpInfoBuilder;
    use crate::descriptor::AttrKind;

    const PAD_RECORD: &str = r#"{
        "op_name": "PadLike",
        "imply_type": "AiCPU",
        "fusion_type": "OPAQUE",
        "inputs": [
            {"index": 0, "name": "x", "param_type": "required"},
            {"index": 1, "name": "paddings", "param_type": "required"}
        ],
        "outputs": [{"index": 0, "name": "y", "param_type": "required"}],
        "attr": [{"name": "mode", "type": "str"}],
        "dtype_format": [
            [["float32", "DefaultFormat"], ["int64", "DefaultFormat"], ["float32", "DefaultFormat"]]
        ]
    }"#;

    #[test]
    fn parses_record_into_descriptor() {
        let op = OperatorDescriptor::from_json(PAD_RECORD).unwrap();
        assert_eq!(op.name(), "PadLike");
        assert_eq!(op.num_inputs(), 2);
        assert_eq!(op.attrs()[0].kind, AttrKind::Str);
        assert_eq!(op.attrs()[0].param_type, ParamType::Required);
        assert_eq!(
            op.combinations()[0].entries(),
            &[
                DTypeFormat::F32_DEFAULT,
                DTypeFormat::I64_DEFAULT,
                DTypeFormat::F32_DEFAULT
            ]
        );
    }

    #[test]
    fn record_orders_inputs_before_outputs() {
        let op = OpInfoBuilder::aicpu("Interleaved")
            .with_input(0, "x", ParamType::Required)
            .with_output(0, "y", ParamType::Required)
            .with_input(1, "scale", ParamType::Optional)
            .with_dtype_format([
                DTypeFormat::F16_DEFAULT,
                DTypeFormat::F32_DEFAULT,
                DTypeFormat::I8_DEFAULT,
            ])
            .build()
            .unwrap();

        let record = op.to_record();
        assert_eq!(
            record.dtype_format[0],
            vec![
                DTypeFormat::F16_DEFAULT,
                DTypeFormat::I8_DEFAULT,
                DTypeFormat::F32_DEFAULT
            ]
        );

        let back = OperatorDescriptor::try_from(record).unwrap();
        let names: Vec<&str> = back.slots().iter().map(|slot| slot.name.as_str()).collect();
        assert_eq!(names, ["x", "scale", "y"]);
        assert_eq!(
            back.select(&[Some(DTypeFormat::F16_DEFAULT)])
                .map(|(_, tuple)| tuple.entries().to_vec()),
            Some(vec![
                DTypeFormat::F16_DEFAULT,
                DTypeFormat::I8_DEFAULT,
                DTypeFormat::F32_DEFAULT
            ])
        );
    }

    #[test]
    fn invalid_record_is_rejected() {
        let err = parse_catalog(r#"[{"op_name": "Bad", "inputs": [{"index": 1, "name": "x"}]}]"#)
            .unwrap_err();
        assert!(matches!(err, OpInfoError::SlotIndex { .. }));

        let err = parse_catalog(r#"{"op_name": 3}"#).unwrap_err();
        assert!(matches!(err, OpInfoError::Json(_)));
    }

    #[test]
    fn single_record_catalog() {
        let ops = parse_catalog(PAD_RECORD).unwrap();
        assert_eq!(ops.len(), 1);
    }
}
