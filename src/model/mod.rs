//! Scoring-function boundary. A scorer sees only the collated batch: id matrices, seasonal
//! tensor and lengths in, per-class scores out.

mod transition;

pub use transition::TransitionScorer;

use crate::collate::Batch;
use ndarray::{Array1, Array2};

/// Per-example class scores, rows aligned with the batch
#[derive(Debug, Clone, PartialEq)]
pub struct Scores {
    /// [B, num_actions]
    pub actions: Array2<f32>,
    /// [B, num_products]
    pub products: Option<Array2<f32>>,
}

pub trait Scorer {
    fn score(&self, batch: &Batch) -> Scores;
}

/// Fraction of rows whose highest-scoring class equals the target. Ties go to the lower id.
pub fn top1_accuracy(scores: &Array2<f32>, targets: &Array1<i64>) -> f32 {
    let rows = scores.nrows().min(targets.len());
    if rows == 0 {
        return 0.0;
    }
    let hits = (0..rows)
        .filter(|&i| {
            let row = scores.row(i);
            let mut best = 0usize;
            for (j, v) in row.iter().enumerate() {
                if *v > row[best] {
                    best = j;
                }
            }
            !row.is_empty() && best as i64 == targets[i]
        })
        .count();
    hits as f32 / rows as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn accuracy_counts_argmax_hits() {
        let scores = array![[0.1, 0.7, 0.2], [0.5, 0.1, 0.4], [0.0, 0.0, 0.0]];
        let targets = array![1, 2, 0];
        assert!((top1_accuracy(&scores, &targets) - 2.0 / 3.0).abs() < 1e-6);
    }
}
