// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::error::{MetricError, Result};
use crate::value::MetricValue;
use crate::{AttributionMetric, ExplainerSlot};

/// Single-list accumulator for metrics that do not depend on the target
/// label (e.g. robustness scores).
#[derive(Clone, Debug, Default)]
pub struct AgnosticAccumulator {
    results: Vec<f64>,
    explainer: ExplainerSlot,
}

impl AgnosticAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one evaluation result. A batch is accepted only when it holds
    /// exactly one value.
    pub fn aggregate(&mut self, result: impl Into<MetricValue>) -> Result<()> {
        match result.into() {
            MetricValue::Scalar(value) => self.results.push(value),
            MetricValue::Batch(values) if values.len() == 1 => self.results.push(values[0]),
            MetricValue::Batch(values) => {
                return Err(MetricError::InvalidResultType(format!(
                    "label-agnostic metrics take one value per call, got a batch of {}",
                    values.len()
                )))
            }
        }
        Ok(())
    }

    /// Copy of the aggregated results in arrival order.
    pub fn get_results(&self) -> Vec<f64> {
        self.results.clone()
    }

    pub fn explainer(&self) -> Option<&str> {
        self.explainer.current()
    }
}

impl AttributionMetric for AgnosticAccumulator {
    fn performance(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.results.iter().sum::<f64>() / self.results.len() as f64
    }

    fn sample_count(&self) -> usize {
        self.results.len()
    }

    fn reset(&mut self) {
        self.results.clear();
    }

    fn record_explainer(&mut self, explainer: &str) {
        self.explainer.record(explainer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_and_resets() {
        let mut metric = AgnosticAccumulator::new();
        assert_eq!(metric.performance(), 0.0);
        metric.aggregate(0.2).unwrap();
        metric.aggregate(vec![0.4]).unwrap();
        assert!((metric.performance() - 0.3).abs() < 1e-12);
        assert_eq!(metric.get_results(), vec![0.2, 0.4]);

        metric.reset();
        assert_eq!(metric.sample_count(), 0);
        assert_eq!(metric.performance(), 0.0);
    }

    #[test]
    fn multi_value_batch_is_rejected() {
        let mut metric = AgnosticAccumulator::new();
        assert!(matches!(
            metric.aggregate(vec![0.1, 0.2]),
            Err(MetricError::InvalidResultType(_))
        ));
        assert!(metric.get_results().is_empty());
    }
}
