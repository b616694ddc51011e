// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use st_metrics::{AttributionMetric, MetricAccumulator, MetricError, Target};

#[test]
fn per_class_means_follow_aggregation_order() {
    let mut metric = MetricAccumulator::new(3).unwrap();
    metric.aggregate(1.0, 0usize).unwrap();
    metric.aggregate(3.0, 0usize).unwrap();
    metric.aggregate(2.0, 1usize).unwrap();

    assert_eq!(metric.class_performances(), vec![2.0, 2.0, 0.0]);
    assert_eq!(metric.performance(), 2.0);
    assert_eq!(metric.get_results()[&0usize], vec![1.0, 3.0]);
}

#[test]
fn paired_batches_append_at_the_end() {
    let mut metric = MetricAccumulator::new(2).unwrap();
    metric.aggregate(0.9, 1usize).unwrap();
    metric
        .aggregate(vec![0.1, 0.2, 0.3], vec![1usize, 0, 1])
        .unwrap();

    let results = metric.get_results();
    assert_eq!(results[&0usize], vec![0.2]);
    assert_eq!(results[&1usize], vec![0.9, 0.1, 0.3]);
    assert_eq!(metric.sample_count(), 4);
}

#[test]
fn class_performances_cover_every_label() {
    for num_labels in [1usize, 4, 10] {
        let metric = MetricAccumulator::new(num_labels).unwrap();
        assert_eq!(metric.class_performances().len(), num_labels);
        assert!(metric.class_performances().iter().all(|&p| p == 0.0));
    }
}

#[test]
fn reset_empties_every_bucket() {
    let mut metric = MetricAccumulator::new(2).unwrap();
    metric.aggregate(vec![0.5, 0.7], Target::Batch(vec![0, 1])).unwrap();
    metric.reset();

    assert_eq!(metric.performance(), 0.0);
    assert_eq!(metric.class_counts(), vec![0, 0]);
    assert!(metric.get_results().values().all(Vec::is_empty));
}

#[test]
fn mismatched_lengths_are_rejected() {
    let mut metric = MetricAccumulator::new(3).unwrap();
    let err = metric
        .aggregate(vec![0.1, 0.2], vec![0usize, 1, 2])
        .unwrap_err();
    assert_eq!(
        err,
        MetricError::LengthMismatch {
            results: 2,
            targets: 3
        }
    );
    assert_eq!(metric.sample_count(), 0);
}

#[test]
fn out_of_range_label_leaves_state_untouched() {
    let mut metric = MetricAccumulator::new(2).unwrap();
    metric.aggregate(0.4, 0usize).unwrap();

    let err = metric
        .aggregate(vec![0.1, 0.2], vec![1usize, 2])
        .unwrap_err();
    assert_eq!(
        err,
        MetricError::LabelOutOfRange {
            label: 2,
            num_labels: 2
        }
    );
    assert_eq!(metric.class_counts(), vec![1, 0]);
    assert_eq!(metric.performance(), 0.4);
}

#[test]
fn out_of_range_label_rejected_without_results() {
    let mut metric = MetricAccumulator::new(3).unwrap();
    let err = metric.aggregate(Vec::<f64>::new(), 99usize).unwrap_err();
    assert_eq!(
        err,
        MetricError::LabelOutOfRange {
            label: 99,
            num_labels: 3
        }
    );
    assert!(metric
        .aggregate(Vec::<f64>::new(), Vec::<usize>::new())
        .is_ok());
    assert_eq!(metric.sample_count(), 0);
}

#[test]
fn results_snapshot_is_detached() {
    let mut metric = MetricAccumulator::new(2).unwrap();
    metric.aggregate(0.25, 1usize).unwrap();

    let mut snapshot = metric.get_results();
    if let Some(bucket) = snapshot.get_mut(&1usize) {
        bucket.push(99.0);
    }
    assert_eq!(metric.get_results()[&1usize], vec![0.25]);

    metric.aggregate(0.75, 1usize).unwrap();
    assert_eq!(snapshot[&1usize], vec![0.25, 99.0]);
}

#[test]
fn explainer_is_reported_in_summary() {
    let mut metric = MetricAccumulator::new(2).unwrap();
    metric.record_explainer("integrated_gradients");
    metric.aggregate(1.0, 0usize).unwrap();
    metric.record_explainer("occlusion");

    let summary = metric.summary();
    assert_eq!(summary.explainer.as_deref(), Some("occlusion"));
    assert_eq!(summary.samples, 1);
    assert_eq!(summary.class_performances, vec![1.0, 0.0]);
}
