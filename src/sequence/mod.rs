//! Per-entity history windowing: flat event stream → (history, next action) examples.

mod builder;
mod seasonal;

pub use builder::{build_sequences, SequenceBuilder, Sequences};
pub use seasonal::{seasonal_features, Seasonal, SEASONAL_DIM};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One supervised next-action example. History vectors are parallel and oldest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisedExample {
    pub user_id: String,
    pub history_actions: Vec<String>,
    /// Present when products are tracked; entries are `None` where an event had no product
    pub history_products: Option<Vec<Option<String>>>,
    pub history_seasonal: Vec<Seasonal>,
    pub target_action: String,
    pub target_product: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

impl SupervisedExample {
    pub fn history_len(&self) -> usize {
        self.history_actions.len()
    }
}

/// A past event as kept in a history buffer
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStep {
    pub action: String,
    pub product: Option<String>,
    pub seasonal: Seasonal,
}

/// Most-recent-`capacity` events of one entity; pushing onto a full buffer evicts the oldest.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    steps: VecDeque<HistoryStep>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            steps: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, step: HistoryStep) {
        if self.steps.len() == self.capacity {
            self.steps.pop_front();
        }
        self.steps.push_back(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryStep> {
        self.steps.iter()
    }
}
