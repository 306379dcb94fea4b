//! Agreement statistics between ground-truth and predicted labels.
//!
//! Only functions present in both label maps are evaluated. An empty overlap is
//! a valid evaluation with zero records, not an error.

mod report;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{LabelMap, CLASS_COUNT};

pub use report::render_report;

/// 6×6 count grid; rows are true labels, columns are predicted labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: [[usize; CLASS_COUNT]; CLASS_COUNT],
}

impl ConfusionMatrix {
    pub fn record(&mut self, truth: u8, predicted: u8) {
        self.counts[truth as usize][predicted as usize] += 1;
    }

    /// Count for a (true, predicted) pair; unobserved or out-of-range pairs are 0.
    pub fn get(&self, truth: u8, predicted: u8) -> usize {
        self.counts
            .get(truth as usize)
            .and_then(|row| row.get(predicted as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..CLASS_COUNT).map(|k| self.counts[k][k]).sum()
    }

    /// Non-zero cells as `((true, predicted), count)`.
    pub fn entries(&self) -> Vec<((u8, u8), usize)> {
        let mut out = Vec::new();
        for (t, row) in self.counts.iter().enumerate() {
            for (p, &count) in row.iter().enumerate() {
                if count > 0 {
                    out.push(((t as u8, p as u8), count));
                }
            }
        }
        out
    }
}

/// Per-class precision / recall / F1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class: u8,
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ClassMetrics {
    fn from_matrix(matrix: &ConfusionMatrix, class: u8) -> Self {
        let c = class as usize;
        let tp = matrix.counts[c][c];
        let fp = (0..CLASS_COUNT).filter(|&t| t != c).map(|t| matrix.counts[t][c]).sum();
        let fn_ = (0..CLASS_COUNT).filter(|&p| p != c).map(|p| matrix.counts[c][p]).sum();

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self { class, tp, fp, fn_, precision, recall, f1 }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Result of comparing predictions against ground truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Function names evaluated (present in both maps), sorted.
    pub evaluated: BTreeSet<String>,
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
}

impl Evaluation {
    pub fn compute(ground_truth: &LabelMap, predictions: &LabelMap) -> Self {
        let mut confusion = ConfusionMatrix::default();
        let mut evaluated = BTreeSet::new();

        for (name, &truth) in ground_truth {
            let Some(&predicted) = predictions.get(name) else {
                continue;
            };
            if (truth as usize) >= CLASS_COUNT || (predicted as usize) >= CLASS_COUNT {
                log::warn!("Skipping {name}: label out of range ({truth}, {predicted})");
                continue;
            }
            confusion.record(truth, predicted);
            evaluated.insert(name.clone());
        }

        let per_class =
            (0..CLASS_COUNT as u8).map(|c| ClassMetrics::from_matrix(&confusion, c)).collect();
        let accuracy = ratio(confusion.correct(), confusion.total());

        Self { evaluated, confusion, per_class, accuracy }
    }

    pub fn total(&self) -> usize {
        self.evaluated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluated.is_empty()
    }

    pub fn class(&self, class: u8) -> Option<&ClassMetrics> {
        self.per_class.get(class as usize)
    }
}
