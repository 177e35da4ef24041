//! Sequence builder: one bounded history buffer per entity, examples emitted in input order.
//!
//! The builder trusts arrival order as chronological order. For each usable record it
//! snapshots the entity's buffer as history, pairs it with the record as target, and only
//! then pushes the record into the buffer, so a target never appears in its own history.
//! Memory is O(entities × max_history), independent of stream length.

use super::{seasonal_features, HistoryBuffer, HistoryStep, SupervisedExample};
use crate::config::{FieldKeys, SequenceConfig};
use crate::error::{PipelineError, Result};
use crate::source::Record;
use std::collections::HashMap;
use tracing::trace;

pub struct SequenceBuilder {
    config: SequenceConfig,
    keys: FieldKeys,
    history: HashMap<String, HistoryBuffer>,
    skipped: u64,
}

impl SequenceBuilder {
    /// Fails when `max_history` is zero
    pub fn new(config: SequenceConfig, keys: FieldKeys) -> Result<Self> {
        if config.max_history == 0 {
            return Err(PipelineError::InvalidHistoryLength(config.max_history));
        }
        Ok(Self {
            config,
            keys,
            history: HashMap::new(),
            skipped: 0,
        })
    }

    /// Feed one record; returns the example it completes, if any.
    pub fn push(&mut self, record: &Record) -> Option<SupervisedExample> {
        let (Some(user), Some(action)) = (
            record.token(&self.keys.user),
            record.token(&self.keys.action),
        ) else {
            self.skipped += 1;
            trace!("record without entity or action skipped");
            return None;
        };

        let product = if self.config.include_product {
            record.token(&self.keys.product)
        } else {
            None
        };
        let ts = record.timestamp(&self.keys.timestamp);
        let step = HistoryStep {
            action,
            product,
            seasonal: seasonal_features(ts),
        };

        let capacity = self.config.max_history;
        let buffer = self
            .history
            .entry(user.clone())
            .or_insert_with(|| HistoryBuffer::new(capacity));

        if self.config.drop_until_history && buffer.is_empty() {
            buffer.push(step);
            return None;
        }

        let example = SupervisedExample {
            user_id: user,
            history_actions: buffer.iter().map(|s| s.action.clone()).collect(),
            history_products: self
                .config
                .include_product
                .then(|| buffer.iter().map(|s| s.product.clone()).collect()),
            history_seasonal: buffer.iter().map(|s| s.seasonal).collect(),
            target_action: step.action.clone(),
            target_product: step.product.clone(),
            timestamp: ts,
        };
        buffer.push(step);
        Some(example)
    }

    /// Distinct entities with a live history buffer
    pub fn entities(&self) -> usize {
        self.history.len()
    }

    /// Records dropped for lacking an entity or action
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }
}

/// Lazy example stream over filtered rows
pub struct Sequences<I> {
    rows: I,
    builder: SequenceBuilder,
}

impl<I> Sequences<I> {
    pub fn builder(&self) -> &SequenceBuilder {
        &self.builder
    }

    pub fn into_inner(self) -> I {
        self.rows
    }
}

impl<I: Iterator<Item = Record>> Iterator for Sequences<I> {
    type Item = SupervisedExample;

    fn next(&mut self) -> Option<SupervisedExample> {
        for record in self.rows.by_ref() {
            if let Some(example) = self.builder.push(&record) {
                return Some(example);
            }
        }
        None
    }
}

/// Turn a row stream into supervised examples
pub fn build_sequences<I>(rows: I, config: SequenceConfig, keys: FieldKeys) -> Result<Sequences<I::IntoIter>>
where
    I: IntoIterator<Item = Record>,
{
    Ok(Sequences {
        rows: rows.into_iter(),
        builder: SequenceBuilder::new(config, keys)?,
    })
}
