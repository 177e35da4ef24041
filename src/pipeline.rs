//! Driver: source → filter → sequence builder → batches → collator → scorer.
//!
//! Everything is pulled lazily, one record at a time. A shared stop flag (set from Ctrl-C in
//! the binary) is checked before each raw record is pulled, and the optional row limit
//! (0 meaning unlimited) before each filtered row.

use crate::collate::{batches, Collator};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::model::{top1_accuracy, Scorer, TransitionScorer};
use crate::sequence::build_sequences;
use crate::sink::NdjsonSink;
use crate::source::Record;
use crate::stream::{stream_filtered_rows, FilterStats, FilteredRows};
use crate::vocab::Vocabulary;
use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, info_span};
use uuid::Uuid;

/// Stops yielding once `stop` is set or `limit` items were yielded.
pub struct Guarded<'a, I> {
    inner: I,
    stop: &'a AtomicBool,
    remaining: Option<usize>,
}

impl<'a, I: Iterator> Guarded<'a, I> {
    pub fn new(inner: I, stop: &'a AtomicBool, limit: Option<usize>) -> Self {
        Self {
            inner,
            stop,
            remaining: limit,
        }
    }
}

impl<I: Iterator> Iterator for Guarded<'_, I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.stop.load(Ordering::Relaxed) || self.remaining == Some(0) {
            return None;
        }
        let item = self.inner.next()?;
        if let Some(ref mut n) = self.remaining {
            *n -= 1;
        }
        Some(item)
    }
}

/// Summary of a baseline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub rows: u64,
    pub examples: u64,
    pub batches: u64,
    pub longest_history: usize,
    pub action_vocab: usize,
    pub product_vocab: Option<usize>,
    /// Example-weighted top-1 accuracy, each batch scored before the baseline learns from it
    pub accuracy: f32,
    pub filter: FilterStats,
}

pub struct Pipeline {
    config: PipelineConfig,
    run_id: Uuid,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            run_id: Uuid::new_v4(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn action_vocabulary(&self) -> Vocabulary {
        Vocabulary::from_config(&self.config.vocab)
    }

    /// Product vocabulary, when products are tracked
    pub fn product_vocabulary(&self) -> Option<Vocabulary> {
        self.config
            .sequence
            .include_product
            .then(|| Vocabulary::from_config(&self.config.vocab))
    }

    fn rows<'a, I>(&self, source: I, stop: &'a AtomicBool) -> Guarded<'a, FilteredRows<Guarded<'a, I::IntoIter>>>
    where
        I: IntoIterator<Item = Record>,
    {
        // Skipped records never reach the outer guard, so the raw source is guarded too.
        let raw = Guarded::new(source.into_iter(), stop, None);
        let filtered = stream_filtered_rows(raw, self.config.stream.clone(), self.config.fields.clone());
        let limit = self.config.source.limit.filter(|&n| n > 0);
        Guarded::new(filtered, stop, limit)
    }

    /// Filter `source` into `sink`. Having no surviving row is an error.
    pub fn write_rows<I, W>(&self, source: I, sink: &mut NdjsonSink<W>, stop: &AtomicBool) -> Result<FilterStats>
    where
        I: IntoIterator<Item = Record>,
        W: Write,
    {
        let span = info_span!("stream", run_id = %self.run_id);
        let _enter = span.enter();

        let mut rows = self.rows(source, stop);
        for row in rows.by_ref() {
            sink.write(&row)?;
        }
        let stats = rows.inner.stats().clone();
        if sink.written() == 0 {
            return Err(PipelineError::NoRows);
        }
        info!(written = sink.written(), days = stats.days_seen, cut_off = stats.cut_off, "rows written");
        Ok(stats)
    }

    /// Filter and window `source`, writing examples to `sink`. Returns the number written.
    pub fn write_sequences<I, W>(&self, source: I, sink: &mut NdjsonSink<W>, stop: &AtomicBool) -> Result<u64>
    where
        I: IntoIterator<Item = Record>,
        W: Write,
    {
        let span = info_span!("sequences", run_id = %self.run_id);
        let _enter = span.enter();

        let mut examples = build_sequences(
            self.rows(source, stop),
            self.config.sequence.clone(),
            self.config.fields.clone(),
        )?;
        for example in examples.by_ref() {
            sink.write(&example)?;
        }
        info!(
            written = sink.written(),
            entities = examples.builder().entities(),
            skipped = examples.builder().skipped(),
            "examples written"
        );
        Ok(sink.written())
    }

    /// Full pass: collate examples into batches and evaluate the transition baseline on them.
    pub fn run_baseline<I>(&self, source: I, stop: &AtomicBool) -> Result<PipelineReport>
    where
        I: IntoIterator<Item = Record>,
    {
        let span = info_span!("baseline", run_id = %self.run_id);
        let _enter = span.enter();

        let mut actions = self.action_vocabulary();
        let mut products = self.product_vocabulary();
        let collator = Collator::new(self.config.collate.grow_vocabs);
        let mut scorer = TransitionScorer::default();

        let mut examples = build_sequences(
            self.rows(source, stop),
            self.config.sequence.clone(),
            self.config.fields.clone(),
        )?;
        let mut report = PipelineReport {
            run_id: self.run_id,
            rows: 0,
            examples: 0,
            batches: 0,
            longest_history: 0,
            action_vocab: 0,
            product_vocab: None,
            accuracy: 0.0,
            filter: FilterStats::default(),
        };
        let mut hits = 0.0f64;

        for chunk in batches(examples.by_ref(), self.config.collate.batch_size)? {
            let batch = collator.collate(&chunk, &mut actions, products.as_mut())?;
            let scores = scorer.score(&batch);
            let acc = top1_accuracy(&scores.actions, &batch.target_actions);
            scorer.observe(&batch);

            report.batches += 1;
            report.examples += batch.batch_size() as u64;
            report.longest_history = report.longest_history.max(batch.max_len());
            hits += f64::from(acc) * batch.batch_size() as f64;
            debug!(
                batch = report.batches,
                size = batch.batch_size(),
                max_len = batch.max_len(),
                accuracy = acc,
                "batch collated"
            );
        }

        let builder_entities = examples.builder().entities();
        let rows = examples.into_inner();
        report.filter = rows.inner.stats().clone();
        report.rows = report.filter.emitted;
        report.action_vocab = actions.len();
        report.product_vocab = products.as_ref().map(Vocabulary::len);
        if report.examples > 0 {
            report.accuracy = (hits / report.examples as f64) as f32;
        }
        info!(
            rows = report.rows,
            examples = report.examples,
            batches = report.batches,
            entities = builder_entities,
            action_vocab = report.action_vocab,
            accuracy = report.accuracy,
            "baseline pass finished"
        );
        Ok(report)
    }
}
