use std::{fmt, hash::Hash};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The sorted set of distinct labels found across a truth and a predicted sequence.
///
/// Position `i` in the space is row `i` (true class) and column `i`
/// (predicted class) of the matching [`ConfusionMatrix`].
#[derive(Debug, Clone)]
pub struct LabelSpace<'a, L>(IndexSet<&'a L>);

impl<'a, L: Hash + Eq + Ord> LabelSpace<'a, L> {
    pub fn from_sequences(y_true: &'a [L], y_pred: &'a [L]) -> Self {
        let mut labels: IndexSet<&'a L> = y_true.iter().chain(y_pred.iter()).collect();
        labels.sort();
        Self(labels)
    }

    /// Matrix index of a label, if it was observed.
    pub fn index_of(&self, label: &'a L) -> Option<usize> {
        self.0.get_index_of(&label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &'a L> + '_ {
        self.0.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Square matrix of prediction counts. Rows are true classes, columns are
/// predicted classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix(Box<[Box<[usize]>]>);

impl ConfusionMatrix {
    #[inline]
    pub fn num_classes(&self) -> usize {
        self.0.len()
    }

    /// Count of samples of class `truth` predicted as `pred`.
    #[inline]
    pub fn get(&self, truth: usize, pred: usize) -> usize {
        self.0[truth][pred]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        self.0.iter().map(|row| &row[..])
    }

    pub fn to_vec(&self) -> Vec<Vec<usize>> {
        self.rows().map(<[usize]>::to_vec).collect()
    }

    pub fn total(&self) -> usize {
        self.0.iter().flatten().sum()
    }

    /// Number of samples on the diagonal.
    pub fn correct(&self) -> usize {
        self.0.iter().enumerate().map(|(i, row)| row[i]).sum()
    }

    /// Fraction of correctly classified samples, `0.0` for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        let total_samples = self.total();
        if total_samples == 0 {
            return 0.0;
        }
        self.correct() as f64 / total_samples as f64
    }

    /// Number of true instances of `class` (the row total).
    pub fn support(&self, class: usize) -> usize {
        self.0[class].iter().sum()
    }

    /// Number of samples predicted as `class` (the column total).
    pub fn predicted_count(&self, class: usize) -> usize {
        self.0.iter().map(|row| row[class]).sum()
    }

    /// `tp / (tp + fp)`, or `0.0` when `class` was never predicted.
    pub fn precision(&self, class: usize) -> f64 {
        ratio(self.0[class][class], self.predicted_count(class))
    }

    /// `tp / (tp + fn)`, or `0.0` when `class` never occurs in the truth.
    pub fn recall(&self, class: usize) -> f64 {
        ratio(self.0[class][class], self.support(class))
    }

    pub fn f1(&self, class: usize) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Share of row `truth` that was predicted as `pred`.
    ///
    /// Fails with [`Error::DivideByZero`] when the row holds no samples.
    pub fn row_fraction(&self, truth: usize, pred: usize) -> Result<f64> {
        let row_total = self.support(truth);
        if row_total == 0 {
            return Err(Error::DivideByZero(format!(
                "row {truth} of the confusion matrix has no samples"
            )));
        }
        Ok(self.0[truth][pred] as f64 / row_total as f64)
    }

    /// Smallest and largest cell counts.
    pub fn min_max(&self) -> (usize, usize) {
        self.0
            .iter()
            .flatten()
            .fold((usize::MAX, 0), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Compute the confusion matrix from a list of predicted and target class indices.
pub fn confusion_matrix(
    predicted: &[usize],
    real: &[usize],
    num_classes: usize,
) -> Result<ConfusionMatrix> {
    if predicted.len() != real.len() {
        return Err(Error::invalid(format!(
            "lengths of predicted ({}) and real ({}) labels must match",
            predicted.len(),
            real.len()
        )));
    }

    let mut matrix =
        vec![vec![0usize; num_classes].into_boxed_slice(); num_classes].into_boxed_slice();

    for (&p, &r) in predicted.iter().zip(real.iter()) {
        if p >= num_classes || r >= num_classes {
            return Err(Error::invalid(format!(
                "class index {} is out of range for {num_classes} classes",
                p.max(r)
            )));
        }
        matrix[r][p] += 1;
    }

    Ok(ConfusionMatrix(matrix))
}

/// Checks that both label sequences are non-empty and aligned.
pub fn validate_sequences<L>(y_true: &[L], y_pred: &[L]) -> Result<()> {
    if y_true.is_empty() || y_pred.is_empty() {
        return Err(Error::invalid("label sequences must not be empty"));
    }
    if y_true.len() != y_pred.len() {
        return Err(Error::invalid(format!(
            "y_true has {} labels but y_pred has {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    Ok(())
}

/// Build the confusion matrix of two label sequences over their sorted label space.
pub fn confusion_matrix_from_labels<'a, L: Hash + Eq + Ord>(
    y_true: &'a [L],
    y_pred: &'a [L],
) -> Result<(LabelSpace<'a, L>, ConfusionMatrix)> {
    validate_sequences(y_true, y_pred)?;

    let space = LabelSpace::from_sequences(y_true, y_pred);
    let to_indices = |labels: &'a [L]| -> Vec<usize> {
        labels
            .iter()
            .filter_map(|label| space.index_of(label))
            .collect()
    };
    let real = to_indices(y_true);
    let predicted = to_indices(y_pred);

    let matrix = confusion_matrix(&predicted, &real, space.len())?;
    Ok((space, matrix))
}

/// Scalar summary of a classifier's predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    /// Percentage of correct predictions, in `[0, 100]`.
    pub accuracy: f64,
    /// Support-weighted precision.
    pub precision: f64,
    /// Support-weighted recall.
    pub recall: f64,
    /// Support-weighted f1 score.
    pub f1: f64,
}

impl fmt::Display for MetricsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy: {:.2}%, precision: {:.4}, recall: {:.4}, f1: {:.4}",
            self.accuracy, self.precision, self.recall, self.f1
        )
    }
}

impl MetricsResult {
    /// Summarize an already built confusion matrix.
    pub fn from_matrix(matrix: &ConfusionMatrix) -> Self {
        let total_support = matrix.total() as f64;
        let weighted = |per_class: &dyn Fn(usize) -> f64| -> f64 {
            if total_support == 0.0 {
                return 0.0;
            }
            (0..matrix.num_classes())
                .map(|class| matrix.support(class) as f64 * per_class(class))
                .sum::<f64>()
                / total_support
        };

        Self {
            accuracy: matrix.accuracy() * 100.0,
            precision: weighted(&|c| matrix.precision(c)),
            recall: weighted(&|c| matrix.recall(c)),
            f1: weighted(&|c| matrix.f1(c)),
        }
    }
}

/// Compute accuracy (as a percentage) and the support-weighted precision,
/// recall and f1 score of `y_pred` against `y_true`.
pub fn compute_classification_metrics<L: Hash + Eq + Ord>(
    y_true: &[L],
    y_pred: &[L],
) -> Result<MetricsResult> {
    let (_, matrix) = confusion_matrix_from_labels(y_true, y_pred)?;
    let result = MetricsResult::from_matrix(&matrix);
    tracing::debug!(classes = matrix.num_classes(), %result, "computed classification metrics");
    Ok(result)
}
