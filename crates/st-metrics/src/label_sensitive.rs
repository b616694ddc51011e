// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::error::{MetricError, Result};
use crate::value::{MetricValue, Target};
use crate::{AttributionMetric, ExplainerSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Per-class accumulator for label-sensitive metrics.
///
/// Holds one bucket of scalar results per label in `0..num_labels`. Buckets
/// only grow through [`MetricAccumulator::aggregate`] and are only emptied by
/// [`AttributionMetric::reset`]. Not meant for concurrent mutation; shard by
/// label or serialise calls when evaluating in parallel.
#[derive(Clone, Debug)]
pub struct MetricAccumulator {
    buckets: Vec<Vec<f64>>,
    explainer: ExplainerSlot,
}

impl MetricAccumulator {
    pub fn new(num_labels: usize) -> Result<Self> {
        if num_labels == 0 {
            return Err(MetricError::InvalidLabelCount);
        }
        Ok(Self {
            buckets: vec![Vec::new(); num_labels],
            explainer: ExplainerSlot::default(),
        })
    }

    pub fn num_labels(&self) -> usize {
        self.buckets.len()
    }

    /// Appends each result to the bucket of its label.
    ///
    /// A scalar pairs with a single label or a one-element label batch. A
    /// batch pairs either with a single label (every entry goes to it) or
    /// with a label batch of the same length. Every label of the target is
    /// range-checked even when there is nothing to append, and a failed call
    /// leaves the buckets untouched.
    pub fn aggregate(
        &mut self,
        result: impl Into<MetricValue>,
        target: impl Into<Target>,
    ) -> Result<()> {
        let result = result.into();
        let target = target.into();

        let num_labels = self.num_labels();
        if let Some(&label) = target.labels().iter().find(|&&label| label >= num_labels) {
            return Err(MetricError::LabelOutOfRange {
                label: i64::try_from(label).unwrap_or(i64::MAX),
                num_labels,
            });
        }

        let values = result.values();
        let pairs: Vec<(usize, f64)> = match target {
            Target::Single(label) => values.iter().map(|&value| (label, value)).collect(),
            Target::Batch(labels) => {
                if labels.len() != values.len() {
                    return Err(MetricError::LengthMismatch {
                        results: values.len(),
                        targets: labels.len(),
                    });
                }
                labels.into_iter().zip(values.iter().copied()).collect()
            }
        };

        for &(label, value) in &pairs {
            self.buckets[label].push(value);
        }
        trace!(samples = pairs.len(), "aggregated metric results");
        Ok(())
    }

    /// Per-label mean; labels without samples report 0.0.
    pub fn class_performances(&self) -> Vec<f64> {
        self.buckets.iter().map(|bucket| mean(bucket)).collect()
    }

    /// Unweighted mean of the per-label means, over labels with at least
    /// one sample. 0.0 when every bucket is empty.
    pub fn macro_performance(&self) -> f64 {
        let populated: Vec<f64> = self
            .buckets
            .iter()
            .filter(|bucket| !bucket.is_empty())
            .map(|bucket| mean(bucket))
            .collect();
        mean(&populated)
    }

    pub fn class_counts(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }

    /// Deep copy of every bucket keyed by label.
    pub fn get_results(&self) -> BTreeMap<usize, Vec<f64>> {
        self.buckets.iter().cloned().enumerate().collect()
    }

    /// Fails when a model's output width does not match the label count.
    pub fn ensure_output_dim(&self, output_dim: usize) -> Result<()> {
        if output_dim != self.num_labels() {
            return Err(MetricError::OutputDimMismatch {
                expected: self.num_labels(),
                found: output_dim,
            });
        }
        Ok(())
    }

    pub fn explainer(&self) -> Option<&str> {
        self.explainer.current()
    }

    pub fn summary(&self) -> MetricSummary {
        MetricSummary {
            explainer: self.explainer().map(str::to_string),
            num_labels: self.num_labels(),
            samples: self.sample_count(),
            performance: self.performance(),
            macro_performance: self.macro_performance(),
            class_performances: self.class_performances(),
            class_counts: self.class_counts(),
        }
    }
}

impl AttributionMetric for MetricAccumulator {
    fn performance(&self) -> f64 {
        let count = self.sample_count();
        if count == 0 {
            return 0.0;
        }
        let total: f64 = self.buckets.iter().flatten().sum();
        total / count as f64
    }

    fn sample_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    fn reset(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    fn record_explainer(&mut self, explainer: &str) {
        self.explainer.record(explainer);
    }
}

/// Serialisable snapshot of a [`MetricAccumulator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explainer: Option<String>,
    pub num_labels: usize,
    pub samples: usize,
    pub performance: f64,
    pub macro_performance: f64,
    pub class_performances: Vec<f64>,
    pub class_counts: Vec<usize>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
