// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::descriptor::SlotRole;
use thiserror::Error;

pub type OpInfoResult<T> = std::result::Result<T, OpInfoError>;

/// Contract violations raised while declaring, registering or querying
/// operator descriptors. None of them are transient.
#[derive(Debug, Error)]
pub enum OpInfoError {
    #[error("operator '{0}' is already registered")]
    DuplicateRegistration(String),
    #[error("operator '{0}' not found")]
    NotFound(String),
    #[error("registry is sealed; cannot register operator '{0}'")]
    Sealed(String),
    #[error("operator name must not be empty")]
    EmptyName,
    #[error("operator '{op}': {role} '{slot}' declared with index {found}, expected {expected}")]
    SlotIndex {
        op: String,
        role: SlotRole,
        slot: String,
        expected: usize,
        found: usize,
    },
    #[error(
        "operator '{op}': dtype_format #{combo} has {found} entries but {expected} slots are declared"
    )]
    ComboArity {
        op: String,
        combo: usize,
        expected: usize,
        found: usize,
    },
    #[error("operator '{op}': dtype_format #{combo} repeats an earlier combination")]
    DuplicateCombination { op: String, combo: usize },
    #[error("operator '{op}': attribute '{attr}' declared twice")]
    DuplicateAttribute { op: String, attr: String },
    #[error("operator '{op}' declares {declared} inputs but {requested} were supplied")]
    InputArity {
        op: String,
        declared: usize,
        requested: usize,
    },
    #[error("operator '{op}' has no kernel accepting inputs [{requested}]")]
    Unsupported { op: String, requested: String },
    #[error("failed to parse {what} '{value}'")]
    Parse { what: &'static str, value: String },
    #[error("invalid op-info json: {0}")]
    Json(#[from] serde_json::Error),
}
