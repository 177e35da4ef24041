//! Output sinks for filtered rows and examples.

mod ndjson;

pub use ndjson::NdjsonSink;
