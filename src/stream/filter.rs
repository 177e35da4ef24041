//! Row filter: domain allow-list, action exclusion, projection and the distinct-day cutoff.

use crate::config::{FieldKeys, StreamConfig};
use crate::source::{day_of, FieldValue, Record};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Outcome of feeding one record to the filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterStep {
    Emit(Record),
    Skip(SkipReason),
    /// Day cutoff reached; the stream is over
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Domain,
    Action,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub seen: u64,
    pub emitted: u64,
    pub skipped_domain: u64,
    pub skipped_action: u64,
    pub days_seen: usize,
    pub cut_off: bool,
}

pub struct StreamFilter {
    config: StreamConfig,
    keys: FieldKeys,
    seen_days: HashSet<String>,
    stats: FilterStats,
}

impl StreamFilter {
    pub fn new(config: StreamConfig, keys: FieldKeys) -> Self {
        Self {
            config,
            keys,
            seen_days: HashSet::new(),
            stats: FilterStats::default(),
        }
    }

    /// Decide what happens to `record`. Once `Stop` is returned every later call returns `Stop`.
    pub fn step(&mut self, mut record: Record) -> FilterStep {
        if self.stats.cut_off {
            return FilterStep::Stop;
        }
        self.stats.seen += 1;

        if let Some(ref value) = self.config.domain_value {
            if !record.is_truthy(&self.keys.domain) {
                record.insert(self.keys.domain.clone(), FieldValue::Str(value.clone()));
            }
        }

        // An empty allow-list means every domain.
        if let Some(domains) = self.config.domains.as_ref().filter(|d| !d.is_empty()) {
            let domain = record.token(&self.keys.domain);
            if !domain.map(|d| domains.contains(&d)).unwrap_or(false) {
                self.stats.skipped_domain += 1;
                return FilterStep::Skip(SkipReason::Domain);
            }
        }

        if let Some(action) = record.token(&self.keys.action) {
            if self.config.exclude_actions.contains(&action) {
                self.stats.skipped_action += 1;
                return FilterStep::Skip(SkipReason::Action);
            }
        }

        if let Some(day) = day_of(&record, &self.keys) {
            if self.seen_days.insert(day.clone()) {
                self.stats.days_seen = self.seen_days.len();
                debug!(day = %day, days_seen = self.stats.days_seen, "new day bucket");
            }
            if let Some(max_days) = self.config.max_days {
                if self.seen_days.len() > max_days {
                    self.stats.cut_off = true;
                    info!(max_days, day = %day, seen = self.stats.seen, "day cutoff reached; stopping stream");
                    return FilterStep::Stop;
                }
            }
        }

        if let Some(ref keep) = self.config.keep_fields {
            record = record.project(keep);
        }
        self.stats.emitted += 1;
        FilterStep::Emit(record)
    }

    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    pub fn is_stopped(&self) -> bool {
        self.stats.cut_off
    }
}

/// Lazy filtered view over a record source. Stops pulling from the source at the cutoff.
pub struct FilteredRows<I> {
    source: I,
    filter: StreamFilter,
}

impl<I: Iterator<Item = Record>> FilteredRows<I> {
    pub fn new(source: I, filter: StreamFilter) -> Self {
        Self { source, filter }
    }

    pub fn stats(&self) -> &FilterStats {
        self.filter.stats()
    }
}

impl<I: Iterator<Item = Record>> Iterator for FilteredRows<I> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        while !self.filter.is_stopped() {
            let record = self.source.next()?;
            match self.filter.step(record) {
                FilterStep::Emit(r) => return Some(r),
                FilterStep::Skip(_) => continue,
                FilterStep::Stop => break,
            }
        }
        None
    }
}

/// Filter `source` with `config`
pub fn stream_filtered_rows<I>(source: I, config: StreamConfig, keys: FieldKeys) -> FilteredRows<I::IntoIter>
where
    I: IntoIterator<Item = Record>,
{
    FilteredRows::new(source.into_iter(), StreamFilter::new(config, keys))
}
