// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Accumulators for attribution (XAI) benchmark metrics.
//!
//! An evaluation driver scores one explainer on many inputs and feeds each
//! score into an accumulator. Label-sensitive metrics keep one bucket per
//! class label; label-agnostic metrics keep a single list.

pub mod error;
pub mod label_agnostic;
pub mod label_sensitive;
pub mod value;

pub use error::{MetricError, Result};
pub use label_agnostic::AgnosticAccumulator;
pub use label_sensitive::{MetricAccumulator, MetricSummary};
pub use value::{MetricValue, Target};

use tracing::info;

/// Behaviour shared by every accumulator.
pub trait AttributionMetric {
    /// Mean over every aggregated result; 0.0 when nothing was aggregated.
    fn performance(&self) -> f64;

    /// Number of aggregated results.
    fn sample_count(&self) -> usize;

    /// Drop every aggregated result.
    fn reset(&mut self);

    /// Remember which explainer produced the results being aggregated.
    fn record_explainer(&mut self, explainer: &str);
}

/// Checks that `label` lies in `[0, num_labels)`.
pub fn verify_target(label: i64, num_labels: usize) -> Result<usize> {
    usize::try_from(label)
        .ok()
        .filter(|&label| label < num_labels)
        .ok_or(MetricError::LabelOutOfRange { label, num_labels })
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ExplainerSlot(Option<String>);

impl ExplainerSlot {
    pub(crate) fn record(&mut self, explainer: &str) {
        match self.0.as_deref() {
            None => self.0 = Some(explainer.to_string()),
            Some(previous) if previous == explainer => {}
            Some(previous) => {
                info!(
                    previous,
                    current = explainer,
                    "explainer changed without a reset; reset the metric to keep results separate"
                );
                self.0 = Some(explainer.to_string());
            }
        }
    }

    pub(crate) fn current(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_target_bounds() {
        assert_eq!(verify_target(0, 1).unwrap(), 0);
        assert_eq!(verify_target(9, 10).unwrap(), 9);
        assert_eq!(
            verify_target(10, 10).unwrap_err(),
            MetricError::LabelOutOfRange {
                label: 10,
                num_labels: 10
            }
        );
        assert!(verify_target(-3, 10).is_err());
    }

    #[test]
    fn explainer_slot_tracks_latest() {
        let mut slot = ExplainerSlot::default();
        assert_eq!(slot.current(), None);
        slot.record("gradient");
        slot.record("gradient");
        slot.record("occlusion");
        assert_eq!(slot.current(), Some("occlusion"));
    }
}
