// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetricError>;

/// Contract violations raised by the metric accumulators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    #[error("length of result ({results}) does not match length of targets ({targets})")]
    LengthMismatch { results: usize, targets: usize },
    #[error("target label {label} exceeds the label range [0, {num_labels})")]
    LabelOutOfRange { label: i64, num_labels: usize },
    #[error("invalid result type: {0}")]
    InvalidResultType(String),
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("num_labels must be greater than zero")]
    InvalidLabelCount,
    #[error("model output dimension {found} does not match num_labels {expected}")]
    OutputDimMismatch { expected: usize, found: usize },
}
