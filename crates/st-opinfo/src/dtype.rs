// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Element types and memory layouts a kernel can be declared for.
//!
//! Pairs are usually written in the short `<DTYPE>_<Layout>` notation
//! (`F32_Default`, `I64_NCHW`, `F16_5HD`), which [`DTypeFormat`] parses and
//! prints.

use crate::error::{OpInfoError, OpInfoResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tensor element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DType {
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int8")]
    I8,
    #[serde(rename = "int16")]
    I16,
    #[serde(rename = "int32")]
    I32,
    #[serde(rename = "int64")]
    I64,
    #[serde(rename = "uint8")]
    U8,
    #[serde(rename = "uint16")]
    U16,
    #[serde(rename = "uint32")]
    U32,
    #[serde(rename = "uint64")]
    U64,
    #[serde(rename = "float16")]
    F16,
    #[serde(rename = "float32")]
    F32,
    #[serde(rename = "float64")]
    F64,
    #[serde(rename = "bfloat16")]
    BF16,
    #[serde(rename = "complex64")]
    C64,
    #[serde(rename = "complex128")]
    C128,
}

impl DType {
    pub const ALL: [DType; 15] = [
        DType::Bool,
        DType::I8,
        DType::I16,
        DType::I32,
        DType::I64,
        DType::U8,
        DType::U16,
        DType::U32,
        DType::U64,
        DType::F16,
        DType::F32,
        DType::F64,
        DType::BF16,
        DType::C64,
        DType::C128,
    ];

    /// Canonical name used in op-info records (`float32`, `int64`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::U8 => "uint8",
            DType::U16 => "uint16",
            DType::U32 => "uint32",
            DType::U64 => "uint64",
            DType::F16 => "float16",
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::BF16 => "bfloat16",
            DType::C64 => "complex64",
            DType::C128 => "complex128",
        }
    }

    /// Prefix used by the short pair notation (`F32` in `F32_Default`).
    pub fn short_name(self) -> &'static str {
        match self {
            DType::Bool => "BOOL",
            DType::I8 => "I8",
            DType::I16 => "I16",
            DType::I32 => "I32",
            DType::I64 => "I64",
            DType::U8 => "U8",
            DType::U16 => "U16",
            DType::U32 => "U32",
            DType::U64 => "U64",
            DType::F16 => "F16",
            DType::F32 => "F32",
            DType::F64 => "F64",
            DType::BF16 => "BF16",
            DType::C64 => "C64",
            DType::C128 => "C128",
        }
    }

    fn from_short_name(raw: &str) -> Option<Self> {
        DType::ALL
            .into_iter()
            .find(|dtype| dtype.short_name().eq_ignore_ascii_case(raw))
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::F16 | DType::F32 | DType::F64 | DType::BF16)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, DType::C64 | DType::C128)
    }

    /// Pairs the dtype with [`Format::Default`].
    pub fn with_default_format(self) -> DTypeFormat {
        DTypeFormat::new(self, Format::Default)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = OpInfoError;

    fn from_str(raw: &str) -> OpInfoResult<Self> {
        DType::ALL
            .into_iter()
            .find(|dtype| dtype.as_str() == raw)
            .or_else(|| DType::from_short_name(raw))
            .ok_or_else(|| OpInfoError::Parse {
                what: "dtype",
                value: raw.to_string(),
            })
    }
}

/// Memory layout of a tensor operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Format {
    /// Layout-agnostic; matches whatever layout the caller supplies.
    #[serde(rename = "DefaultFormat")]
    Default,
    #[serde(rename = "ND")]
    Nd,
    #[serde(rename = "NCHW")]
    Nchw,
    #[serde(rename = "NHWC")]
    Nhwc,
    #[serde(rename = "NC1HWC0")]
    Nc1hwc0,
    #[serde(rename = "FRACTAL_Z")]
    FractalZ,
    #[serde(rename = "FRACTAL_NZ")]
    FractalNz,
    #[serde(rename = "NCDHW")]
    Ncdhw,
    #[serde(rename = "NDHWC")]
    Ndhwc,
    #[serde(rename = "HWCN")]
    Hwcn,
}

impl Format {
    pub const ALL: [Format; 10] = [
        Format::Default,
        Format::Nd,
        Format::Nchw,
        Format::Nhwc,
        Format::Nc1hwc0,
        Format::FractalZ,
        Format::FractalNz,
        Format::Ncdhw,
        Format::Ndhwc,
        Format::Hwcn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Default => "DefaultFormat",
            Format::Nd => "ND",
            Format::Nchw => "NCHW",
            Format::Nhwc => "NHWC",
            Format::Nc1hwc0 => "NC1HWC0",
            Format::FractalZ => "FRACTAL_Z",
            Format::FractalNz => "FRACTAL_NZ",
            Format::Ncdhw => "NCDHW",
            Format::Ndhwc => "NDHWC",
            Format::Hwcn => "HWCN",
        }
    }

    /// Suffix used by the short pair notation (`5HD` in `F16_5HD`).
    pub fn short_name(self) -> &'static str {
        match self {
            Format::Default => "Default",
            Format::Nd => "ND",
            Format::Nchw => "NCHW",
            Format::Nhwc => "NHWC",
            Format::Nc1hwc0 => "5HD",
            Format::FractalZ => "FracZ",
            Format::FractalNz => "FracNZ",
            Format::Ncdhw => "NCDHW",
            Format::Ndhwc => "NDHWC",
            Format::Hwcn => "HWCN",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = OpInfoError;

    fn from_str(raw: &str) -> OpInfoResult<Self> {
        Format::ALL
            .into_iter()
            .find(|format| format.as_str() == raw || format.short_name().eq_ignore_ascii_case(raw))
            .ok_or_else(|| OpInfoError::Parse {
                what: "format",
                value: raw.to_string(),
            })
    }
}

/// One operand's element type together with its layout.
///
/// Serialises as the `[dtype, format]` pair used inside op-info
/// `dtype_format` tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(DType, Format)", into = "(DType, Format)")]
pub struct DTypeFormat {
    pub dtype: DType,
    pub format: Format,
}

impl DTypeFormat {
    pub const fn new(dtype: DType, format: Format) -> Self {
        Self { dtype, format }
    }

    /// Whether a kernel declared with `self` can consume an operand of
    /// `requested`. A declared [`Format::Default`] accepts any layout.
    pub fn accepts(&self, requested: &DTypeFormat) -> bool {
        self.dtype == requested.dtype
            && (self.format == Format::Default || self.format == requested.format)
    }
}

impl From<(DType, Format)> for DTypeFormat {
    fn from((dtype, format): (DType, Format)) -> Self {
        Self::new(dtype, format)
    }
}

impl From<DTypeFormat> for (DType, Format) {
    fn from(pair: DTypeFormat) -> Self {
        (pair.dtype, pair.format)
    }
}

impl fmt::Display for DTypeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.dtype.short_name(), self.format.short_name())
    }
}

impl FromStr for DTypeFormat {
    type Err = OpInfoError;

    fn from_str(raw: &str) -> OpInfoResult<Self> {
        let parse_err = || OpInfoError::Parse {
            what: "dtype/format pair",
            value: raw.to_string(),
        };
        let (dtype, format) = raw.trim().split_once('_').ok_or_else(parse_err)?;
        let dtype = DType::from_short_name(dtype).ok_or_else(parse_err)?;
        let format = format.parse::<Format>().map_err(|_| parse_err())?;
        Ok(Self::new(dtype, format))
    }
}

macro_rules! default_format_pairs {
    ($($name:ident => $dtype:ident),* $(,)?) => {
        impl DTypeFormat {
            $(
                pub const $name: DTypeFormat = DTypeFormat::new(DType::$dtype, Format::Default);
            )*
        }
    };
}

default_format_pairs! {
    BOOL_DEFAULT => Bool,
    I8_DEFAULT => I8,
    I16_DEFAULT => I16,
    I32_DEFAULT => I32,
    I64_DEFAULT => I64,
    U8_DEFAULT => U8,
    U16_DEFAULT => U16,
    U32_DEFAULT => U32,
    U64_DEFAULT => U64,
    F16_DEFAULT => F16,
    F32_DEFAULT => F32,
    F64_DEFAULT => F64,
    BF16_DEFAULT => BF16,
    C64_DEFAULT => C64,
    C128_DEFAULT => C128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_notation() {
        assert_eq!(
            "F32_Default".parse::<DTypeFormat>().unwrap(),
            DTypeFormat::F32_DEFAULT
        );
        assert_eq!(
            "f16_5HD".parse::<DTypeFormat>().unwrap(),
            DTypeFormat::new(DType::F16, Format::Nc1hwc0)
        );
        assert_eq!(
            "C128_FracNZ".parse::<DTypeFormat>().unwrap().to_string(),
            "C128_FracNZ"
        );
        assert!("F32".parse::<DTypeFormat>().is_err());
        assert!("Q8_Default".parse::<DTypeFormat>().is_err());
        assert!("F32_Sideways".parse::<DTypeFormat>().is_err());
    }

    #[test]
    fn default_format_accepts_any_layout() {
        let declared = DTypeFormat::F32_DEFAULT;
        assert!(declared.accepts(&DTypeFormat::new(DType::F32, Format::Nchw)));
        assert!(!declared.accepts(&DTypeFormat::F16_DEFAULT));

        let strict = DTypeFormat::new(DType::F32, Format::Nhwc);
        assert!(strict.accepts(&DTypeFormat::new(DType::F32, Format::Nhwc)));
        assert!(!strict.accepts(&DTypeFormat::new(DType::F32, Format::Nchw)));
    }

    #[test]
    fn serialises_as_op_info_pair() {
        let json = serde_json::to_string(&DTypeFormat::I64_DEFAULT).unwrap();
        assert_eq!(json, r#"["int64","DefaultFormat"]"#);
        let back: DTypeFormat = serde_json::from_str(r#"["float16","NC1HWC0"]"#).unwrap();
        assert_eq!(back, DTypeFormat::new(DType::F16, Format::Nc1hwc0));
    }
}
