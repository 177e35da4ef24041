//! Next-action training data pipeline.
//!
//! Turns an unbounded event log into bounded, per-entity supervised examples and padded
//! numeric batches:
//! - [`source`] — Typed record view and JSON-lines record source
//! - [`stream`] — Domain/action filtering with a distinct-day cutoff
//! - [`sequence`] — Per-entity history windows and seasonal features
//! - [`vocab`] — Append-only token vocabularies
//! - [`collate`] — Padded batch assembly
//! - [`model`] — Scoring interface and a transition-count baseline
//! - [`sink`] — NDJSON output
//! - [`logging`] — Structured logging setup
//! - [`pipeline`] — Lazy driver wiring the stages together

pub mod config;
pub mod error;
pub mod source;
pub mod stream;
pub mod sequence;
pub mod vocab;
pub mod collate;
pub mod model;
pub mod sink;
pub mod logging;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use source::{FieldValue, JsonLinesSource, Record};
pub use stream::{stream_filtered_rows, FilterStep, StreamFilter};
pub use sequence::{build_sequences, SequenceBuilder, SupervisedExample};
pub use vocab::{SharedVocabulary, Vocabulary};
pub use collate::{Batch, Collator};
pub use model::{Scorer, TransitionScorer};
pub use logging::StructuredLogger;
pub use pipeline::{Pipeline, PipelineReport};
