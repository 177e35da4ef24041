//! First-order transition baseline: scores the next action by how often it followed the
//! entity's last action in batches seen so far. Empty histories score all zeros.

use super::{Scorer, Scores};
use crate::collate::Batch;
use ndarray::Array2;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct TransitionScorer {
    counts: HashMap<i64, HashMap<i64, u32>>,
    classes: usize,
    observed: u64,
}

impl TransitionScorer {
    pub fn new(classes: usize) -> Self {
        Self {
            classes,
            ..Self::default()
        }
    }

    /// Accumulate (last history action → target action) pairs from `batch`
    pub fn observe(&mut self, batch: &Batch) {
        for i in 0..batch.batch_size() {
            let target = batch.target_actions[i];
            self.classes = self.classes.max(target.max(0) as usize + 1);
            if let Some(last) = last_action(batch, i) {
                self.classes = self.classes.max(last.max(0) as usize + 1);
                *self.counts.entry(last).or_default().entry(target).or_insert(0) += 1;
                self.observed += 1;
            }
        }
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Transitions counted so far
    pub fn observed(&self) -> u64 {
        self.observed
    }
}

fn last_action(batch: &Batch, row: usize) -> Option<i64> {
    let len = batch.lengths[row];
    (len > 0).then(|| batch.action_hist[[row, len as usize - 1]])
}

impl Scorer for TransitionScorer {
    fn score(&self, batch: &Batch) -> Scores {
        let mut actions = Array2::<f32>::zeros((batch.batch_size(), self.classes));
        for i in 0..batch.batch_size() {
            let Some(next) = last_action(batch, i).and_then(|last| self.counts.get(&last)) else {
                continue;
            };
            let total: u32 = next.values().sum();
            for (&target, &n) in next {
                if target >= 0 && (target as usize) < self.classes {
                    actions[[i, target as usize]] = n as f32 / total as f32;
                }
            }
        }
        Scores {
            actions,
            products: None,
        }
    }
}
