//! Bounded consumption of a raw event stream.

mod filter;

pub use filter::{stream_filtered_rows, FilterStats, FilterStep, FilteredRows, SkipReason, StreamFilter};
