// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Evaluation results and the labels they are scored against.
//!
//! Both are resolved to tagged enums at the call boundary; the JSON
//! conversions here are the only place a loosely typed value is inspected.

use crate::error::{MetricError, Result};
use serde_json::Value;

/// One evaluation result or a batch of them.
#[derive(Clone, Debug, PartialEq)]
pub enum MetricValue {
    Scalar(f64),
    Batch(Vec<f64>),
}

impl MetricValue {
    pub fn len(&self) -> usize {
        match self {
            MetricValue::Scalar(_) => 1,
            MetricValue::Batch(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> &[f64] {
        match self {
            MetricValue::Scalar(value) => std::slice::from_ref(value),
            MetricValue::Batch(values) => values,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Scalar(value)
    }
}

impl From<Vec<f64>> for MetricValue {
    fn from(values: Vec<f64>) -> Self {
        MetricValue::Batch(values)
    }
}

impl From<&[f64]> for MetricValue {
    fn from(values: &[f64]) -> Self {
        MetricValue::Batch(values.to_vec())
    }
}

impl TryFrom<&Value> for MetricValue {
    type Error = MetricError;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Number(number) => number
                .as_f64()
                .map(MetricValue::Scalar)
                .ok_or_else(|| MetricError::InvalidResultType(number.to_string())),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_f64().ok_or_else(|| {
                        MetricError::InvalidResultType(format!(
                            "batch entries must be numbers, got {}",
                            kind_of(item)
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()
                .map(MetricValue::Batch),
            other => Err(MetricError::InvalidResultType(format!(
                "expected a number or an array of numbers, got {}",
                kind_of(other)
            ))),
        }
    }
}

/// Label a result is scored against, or one label per batch entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Single(usize),
    Batch(Vec<usize>),
}

impl Target {
    pub fn labels(&self) -> &[usize] {
        match self {
            Target::Single(label) => std::slice::from_ref(label),
            Target::Batch(labels) => labels,
        }
    }

    /// Resolves a JSON label (or array of labels) and checks every label
    /// against `num_labels`.
    pub fn from_json(value: &Value, num_labels: usize) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| label_from_json(item, num_labels))
                .collect::<Result<Vec<usize>>>()
                .map(Target::Batch),
            other => label_from_json(other, num_labels).map(Target::Single),
        }
    }
}

impl From<usize> for Target {
    fn from(label: usize) -> Self {
        Target::Single(label)
    }
}

impl From<Vec<usize>> for Target {
    fn from(labels: Vec<usize>) -> Self {
        Target::Batch(labels)
    }
}

impl From<&[usize]> for Target {
    fn from(labels: &[usize]) -> Self {
        Target::Batch(labels.to_vec())
    }
}

fn label_from_json(value: &Value, num_labels: usize) -> Result<usize> {
    let Some(label) = value.as_i64() else {
        return Err(MetricError::InvalidTarget(format!(
            "labels must be integers, got {value}"
        )));
    };
    crate::verify_target(label, num_labels)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn results_resolve_from_json() {
        assert_eq!(
            MetricValue::try_from(&json!(0.25)).unwrap(),
            MetricValue::Scalar(0.25)
        );
        assert_eq!(
            MetricValue::try_from(&json!([1, 2.5])).unwrap(),
            MetricValue::Batch(vec![1.0, 2.5])
        );
        assert!(matches!(
            MetricValue::try_from(&json!("0.3")),
            Err(MetricError::InvalidResultType(_))
        ));
        assert!(matches!(
            MetricValue::try_from(&json!([1.0, null])),
            Err(MetricError::InvalidResultType(_))
        ));
    }

    #[test]
    fn targets_resolve_from_json() {
        assert_eq!(Target::from_json(&json!(2), 3).unwrap(), Target::Single(2));
        assert_eq!(
            Target::from_json(&json!([0, 1]), 3).unwrap(),
            Target::Batch(vec![0, 1])
        );
        assert!(matches!(
            Target::from_json(&json!(-1), 3),
            Err(MetricError::LabelOutOfRange {
                label: -1,
                num_labels: 3
            })
        ));
        assert!(matches!(
            Target::from_json(&json!([0, 3]), 3),
            Err(MetricError::LabelOutOfRange { label: 3, .. })
        ));
        assert!(matches!(
            Target::from_json(&json!(1.5), 3),
            Err(MetricError::InvalidTarget(_))
        ));
    }
}
