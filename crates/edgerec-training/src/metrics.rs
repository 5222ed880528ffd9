//! Training metrics collection and recording.
//!
//! [`accuracy`] and [`roc_auc`] are pure functions over finished prediction
//! and label vectors. [`Metrics`] carries one step's or one evaluation's
//! values, and [`MetricsRecorder`] averages them over an epoch.

use serde::{Deserialize, Serialize};

/// Metrics collected during a training step, an epoch or an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean squared error.
    pub loss: f64,
    /// Classification accuracy (0.0 to 1.0).
    pub accuracy: Option<f64>,
    /// Area Under the ROC Curve.
    pub auc: Option<f64>,
    /// The global step at which these metrics were recorded.
    pub global_step: u64,
}

impl Metrics {
    /// Creates a new `Metrics` instance with the given loss and step.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgerec_training::metrics::Metrics;
    ///
    /// let metrics = Metrics::new(0.5, 100);
    /// assert_eq!(metrics.loss, 0.5);
    /// assert_eq!(metrics.global_step, 100);
    /// ```
    pub fn new(loss: f64, global_step: u64) -> Self {
        Self {
            loss,
            accuracy: None,
            auc: None,
            global_step,
        }
    }

    /// Sets the accuracy metric.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Sets the AUC metric.
    pub fn with_auc(mut self, auc: f64) -> Self {
        self.auc = Some(auc);
        self
    }
}

/// Accumulates metrics over multiple training steps.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    loss_sum: f64,
    accuracy_sum: f64,
    auc_sum: f64,
    accuracy_count: u64,
    auc_count: u64,
    count: u64,
}

impl MetricsRecorder {
    /// Creates a new empty `MetricsRecorder`.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgerec_training::metrics::{Metrics, MetricsRecorder};
    ///
    /// let mut recorder = MetricsRecorder::new();
    /// recorder.record(&Metrics::new(0.5, 1));
    /// recorder.record(&Metrics::new(0.3, 2));
    /// assert_eq!(recorder.count(), 2);
    /// assert!((recorder.average_loss() - 0.4).abs() < 1e-12);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a set of metrics.
    pub fn record(&mut self, metrics: &Metrics) {
        self.loss_sum += metrics.loss;
        self.count += 1;

        if let Some(acc) = metrics.accuracy {
            self.accuracy_sum += acc;
            self.accuracy_count += 1;
        }

        if let Some(auc) = metrics.auc {
            self.auc_sum += auc;
            self.auc_count += 1;
        }
    }

    /// Returns the number of metrics recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the average loss, or 0.0 if nothing has been recorded.
    pub fn average_loss(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.loss_sum / self.count as f64
        }
    }

    /// Returns the average accuracy, if any accuracy values were recorded.
    pub fn average_accuracy(&self) -> Option<f64> {
        (self.accuracy_count > 0).then(|| self.accuracy_sum / self.accuracy_count as f64)
    }

    /// Returns the average AUC, if any AUC values were recorded.
    pub fn average_auc(&self) -> Option<f64> {
        (self.auc_count > 0).then(|| self.auc_sum / self.auc_count as f64)
    }

    /// Averages everything recorded so far into one [`Metrics`].
    pub fn summary(&self, global_step: u64) -> Metrics {
        Metrics {
            loss: self.average_loss(),
            accuracy: self.average_accuracy(),
            auc: self.average_auc(),
            global_step,
        }
    }

    /// Clears all accumulated values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Fraction of examples where `round(prediction - label) == 0`.
///
/// Returns 0.0 for empty input.
///
/// ```
/// use edgerec_training::metrics::accuracy;
///
/// assert_eq!(accuracy(&[0.6, 0.4], &[1.0, 0.0]), 1.0);
/// assert_eq!(accuracy(&[0.4, 0.4], &[1.0, 0.0]), 0.5);
/// ```
pub fn accuracy(predictions: &[f32], labels: &[f32]) -> f64 {
    let n = predictions.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(p, y)| (**p - **y).round() == 0.0)
        .count();
    correct as f64 / n as f64
}

/// Rank-based area under the ROC curve.
///
/// An example is positive when its label equals 1.0. Tied predictions share
/// their average rank. Returns 0.5 when only one class is present.
pub fn roc_auc(predictions: &[f32], labels: &[f32]) -> f64 {
    let n = predictions.len().min(labels.len());
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| predictions[a].total_cmp(&predictions[b]));

    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && predictions[order[j]] == predictions[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j share their mean
        let rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        i = j;
    }

    let positives = labels[..n].iter().filter(|&&y| y == 1.0).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }
    let rank_sum: f64 = (0..n).filter(|&k| labels[k] == 1.0).map(|k| ranks[k]).sum();
    let p = positives as f64;
    (rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0.6, 0.4], &[1.0, 0.0]), 1.0);
        assert_eq!(accuracy(&[0.4, 0.4], &[1.0, 0.0]), 0.5);
        assert_eq!(accuracy(&[0.9, 0.1, 0.8, 0.3], &[0.0, 1.0, 1.0, 0.0]), 0.5);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_roc_auc_perfect_and_inverted() {
        let labels = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(roc_auc(&[0.1, 0.2, 0.8, 0.9], &labels), 1.0);
        assert_eq!(roc_auc(&[0.9, 0.8, 0.2, 0.1], &labels), 0.0);
    }

    #[test]
    fn test_roc_auc_ties() {
        // every prediction tied: AUC is exactly 0.5
        assert_eq!(roc_auc(&[0.5; 4], &[0.0, 1.0, 0.0, 1.0]), 0.5);

        // one positive tied with one negative, the other positive on top
        // pairs: (p1>n1) 1, (p1=n2) 0.5, (p2>n1) 1, (p2>n2) 1 => 3.5 / 4
        let auc = roc_auc(&[0.1, 0.5, 0.5, 0.9], &[0.0, 0.0, 1.0, 1.0]);
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_single_class() {
        assert_eq!(roc_auc(&[0.1, 0.9], &[1.0, 1.0]), 0.5);
        assert_eq!(roc_auc(&[0.1, 0.9], &[0.0, 0.0]), 0.5);
        assert_eq!(roc_auc(&[], &[]), 0.5);
    }

    #[test]
    fn test_recorder() {
        let mut recorder = MetricsRecorder::new();
        assert_eq!(recorder.average_loss(), 0.0);
        assert_eq!(recorder.average_accuracy(), None);

        recorder.record(&Metrics::new(1.0, 1).with_accuracy(0.5));
        recorder.record(&Metrics::new(3.0, 2).with_accuracy(1.0).with_auc(0.7));

        let summary = recorder.summary(2);
        assert_eq!(summary.loss, 2.0);
        assert_eq!(summary.accuracy, Some(0.75));
        assert_eq!(summary.auc, Some(0.7));
        assert_eq!(summary.global_step, 2);

        recorder.reset();
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_metrics_serde() {
        let metrics = Metrics::new(0.25, 10).with_auc(0.8);
        let json = serde_json::to_string(&metrics).unwrap();
        let back: Metrics = serde_json::from_str(&json).unwrap();
        assert_eq!(metrics, back);
    }
}
