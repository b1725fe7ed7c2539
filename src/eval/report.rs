//! Per-class precision/recall/F1 report for binary labels.

use serde::Serialize;
use std::fmt;

/// Scores for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// (label, metrics) for every label seen in truth or predictions, ascending.
    pub classes: Vec<(u8, ClassMetrics)>,
    pub accuracy: f32,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

fn f1(precision: f32, recall: f32) -> f32 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn class_metrics(truth: &[u8], pred: &[u8], class: u8) -> ClassMetrics {
    let mut tp = 0;
    let mut predicted = 0;
    let mut actual = 0;
    for (&t, &p) in truth.iter().zip(pred) {
        if p == class {
            predicted += 1;
        }
        if t == class {
            actual += 1;
            if p == class {
                tp += 1;
            }
        }
    }
    let precision = ratio(tp, predicted);
    let recall = ratio(tp, actual);
    ClassMetrics {
        precision,
        recall,
        f1: f1(precision, recall),
        support: actual,
    }
}

impl ClassificationReport {
    /// Build from parallel truth/prediction labels (0 or 1).
    ///
    /// A label that occurs in neither slice gets no row and is left out of the macro average.
    pub fn from_labels(truth: &[u8], pred: &[u8]) -> Self {
        let n = truth.len().min(pred.len());
        let (truth, pred) = (&truth[..n], &pred[..n]);

        let classes: Vec<(u8, ClassMetrics)> = [0u8, 1]
            .into_iter()
            .filter(|c| truth.contains(c) || pred.contains(c))
            .map(|c| (c, class_metrics(truth, pred, c)))
            .collect();

        let total: usize = classes.iter().map(|(_, m)| m.support).sum();
        let averaged = |f: fn(&ClassMetrics) -> f32, weighted: bool| {
            let den = if weighted { total as f32 } else { classes.len() as f32 };
            if den == 0.0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|(_, m)| if weighted { f(m) * m.support as f32 } else { f(m) })
                .sum::<f32>()
                / den
        };
        let macro_avg = ClassMetrics {
            precision: averaged(|m| m.precision, false),
            recall: averaged(|m| m.recall, false),
            f1: averaged(|m| m.f1, false),
            support: total,
        };
        let weighted_avg = ClassMetrics {
            precision: averaged(|m| m.precision, true),
            recall: averaged(|m| m.recall, true),
            f1: averaged(|m| m.f1, true),
            support: total,
        };

        Self {
            accuracy: super::metrics::binary_accuracy(truth, pred),
            classes,
            macro_avg,
            weighted_avg,
        }
    }

    pub fn class(&self, label: u8) -> Option<&ClassMetrics> {
        self.classes
            .iter()
            .find(|(c, _)| *c == label)
            .map(|(_, m)| m)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for (class, m) in &self.classes {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}
