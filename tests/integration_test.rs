//! Integration test: config load, JSON-lines source, filtered rows, examples and baseline pass.

use recsys_pipeline::{
    config::PipelineConfig,
    pipeline::Pipeline,
    sink::NdjsonSink,
    source::JsonLinesSource,
    PipelineError, SupervisedExample,
};
use std::io::Write;
use std::path::Path;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

const EVENTS: &str = r#"{"user_id": "u1", "action_type": "VIEW", "product_id": "p0", "timestamp": "2024-01-01T08:00:00"}
{"user_id": "u1", "action_type": "ADD", "product_id": "p1", "timestamp": "2024-01-01T09:00:00"}
{"user_id": "u2", "action_type": "ADD", "product_id": "p2", "timestamp": "2024-01-01T09:30:00"}
not even json
{"user_id": "u1", "action_type": "BUY", "product_id": "p1", "timestamp": "2024-01-02T10:00:00"}
{"user_id": "u2", "action_type": "BUY", "timestamp": "2024-01-02T11:00:00"}
{"user_id": "u1", "action_type": "ADD", "product_id": "p3", "timestamp": "2024-01-03T12:00:00"}
{"user_id": "u1", "action_type": "BUY", "product_id": "p3", "timestamp": "2024-01-04T12:00:00"}
"#;

fn write_events(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("events.jsonl");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(EVENTS.as_bytes()).unwrap();
    path
}

fn config_with_days(max_days: usize) -> PipelineConfig {
    let mut c = PipelineConfig::default();
    c.stream.max_days = Some(max_days);
    c.sequence.max_history = 2;
    c.collate.batch_size = 2;
    c
}

#[test]
fn config_load_default() {
    let c = PipelineConfig::load(Path::new("nonexistent.json")).unwrap();
    assert_eq!(c.sequence.max_history, 20);
    assert_eq!(c.stream.max_days, Some(100));
    assert!(c.stream.exclude_actions.contains("VIEW"));
    assert_eq!(c.fields.user, "user_id");
}

#[test]
fn config_load_partial_and_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    std::fs::write(&path, r#"{"sequence": {"max_history": 5}, "collate": {"grow_vocabs": false}}"#).unwrap();
    let c = PipelineConfig::load(&path).unwrap();
    assert_eq!(c.sequence.max_history, 5);
    assert!(c.sequence.drop_until_history);
    assert!(!c.collate.grow_vocabs);
    assert_eq!(c.collate.batch_size, 64);

    std::fs::write(&path, r#"{"sequence": {"max_history": 0}}"#).unwrap();
    assert!(matches!(
        PipelineConfig::load(&path),
        Err(PipelineError::InvalidHistoryLength(0))
    ));

    std::fs::write(&path, "{ nope").unwrap();
    assert!(matches!(PipelineConfig::load(&path), Err(PipelineError::Json(_))));
}

#[test]
fn stream_rows_to_ndjson() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_events(dir.path());
    let output = dir.path().join("out").join("rows.jsonl");

    let pipeline = Pipeline::new(config_with_days(2)).unwrap();
    let mut source = JsonLinesSource::open(&input).unwrap();
    let mut sink = NdjsonSink::create(&output).unwrap();
    let stop = AtomicBool::new(false);
    let stats = pipeline.write_rows(source.by_ref(), &mut sink, &stop).unwrap();
    sink.finish().unwrap();

    // VIEW dropped, cut off at the first 2024-01-03 row.
    assert_eq!(stats.emitted, 4);
    assert_eq!(stats.skipped_action, 1);
    assert!(stats.cut_off);
    assert_eq!(source.malformed(), 1);

    let text = std::fs::read_to_string(&output).unwrap();
    let rows: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3]["action_type"], "BUY");
    assert_eq!(rows[3]["user_id"], "u2");
}

#[test]
fn stream_with_nothing_left_is_an_error() {
    let mut config = config_with_days(2);
    config.stream.domains = Some(["payments".to_string()].into_iter().collect());
    let pipeline = Pipeline::new(config).unwrap();
    let source = JsonLinesSource::new(EVENTS.as_bytes());
    let mut sink = NdjsonSink::new(Vec::new());
    let err = pipeline
        .write_rows(source, &mut sink, &AtomicBool::new(false))
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoRows));
}

#[test]
fn sequences_to_ndjson() {
    let pipeline = Pipeline::new(config_with_days(10)).unwrap();
    let mut sink = NdjsonSink::new(Vec::new());
    let written = pipeline
        .write_sequences(JsonLinesSource::new(EVENTS.as_bytes()), &mut sink, &AtomicBool::new(false))
        .unwrap();
    assert_eq!(written, 4);

    let out = String::from_utf8(sink.finish().unwrap()).unwrap();
    let examples: Vec<SupervisedExample> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    let summary: Vec<(&str, Vec<&str>, &str)> = examples
        .iter()
        .map(|e| {
            (
                e.user_id.as_str(),
                e.history_actions.iter().map(String::as_str).collect(),
                e.target_action.as_str(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("u1", vec!["ADD"], "BUY"),
            ("u2", vec!["ADD"], "BUY"),
            ("u1", vec!["ADD", "BUY"], "ADD"),
            ("u1", vec!["BUY", "ADD"], "BUY"),
        ]
    );
    assert_eq!(examples[1].target_product, None);
    assert_eq!(examples[0].history_products, Some(vec![Some("p1".to_string())]));
    assert!(examples[0].timestamp.is_some());
}

#[test]
fn baseline_pass_reports_batches() {
    let pipeline = Pipeline::new(config_with_days(10)).unwrap();
    let report = pipeline
        .run_baseline(JsonLinesSource::new(EVENTS.as_bytes()), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(report.rows, 6);
    assert_eq!(report.examples, 4);
    assert_eq!(report.batches, 2);
    assert_eq!(report.longest_history, 2);
    // pad, unk, ADD, BUY
    assert_eq!(report.action_vocab, 4);
    // pad, unk, p1, p2, p3
    assert_eq!(report.product_vocab, Some(5));
    assert!((0.0..=1.0).contains(&report.accuracy));
    assert!(!report.filter.cut_off);
}

#[test]
fn stop_flag_and_limit_end_the_pass_early() {
    let pipeline = Pipeline::new(config_with_days(10)).unwrap();
    let stopped = AtomicBool::new(true);
    let report = pipeline
        .run_baseline(JsonLinesSource::new(EVENTS.as_bytes()), &stopped)
        .unwrap();
    assert_eq!(report.rows, 0);
    assert_eq!(report.batches, 0);

    let mut config = config_with_days(10);
    config.source.limit = Some(3);
    let pipeline = Pipeline::new(config).unwrap();
    let report = pipeline
        .run_baseline(JsonLinesSource::new(EVENTS.as_bytes()), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(report.rows, 3);
    assert_eq!(report.examples, 1);
}

#[test]
fn zero_limit_reads_everything() {
    let mut config = config_with_days(10);
    config.source.limit = Some(0);
    let pipeline = Pipeline::new(config).unwrap();
    let report = pipeline
        .run_baseline(JsonLinesSource::new(EVENTS.as_bytes()), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(report.rows, 6);
}

#[test]
fn stop_flag_interrupts_a_run_of_skipped_records() {
    let mut events = String::new();
    for i in 0..50 {
        events.push_str(&format!(
            "{{\"user_id\": \"u{}\", \"action_type\": \"VIEW\", \"timestamp\": \"2024-01-01T08:00:00\"}}\n",
            i
        ));
    }
    events.push_str("{\"user_id\": \"u1\", \"action_type\": \"BUY\", \"timestamp\": \"2024-01-01T09:00:00\"}\n");

    let pipeline = Pipeline::new(config_with_days(10)).unwrap();
    let stop = AtomicBool::new(false);
    let pulled = Cell::new(0);
    let source = JsonLinesSource::new(events.as_bytes()).inspect(|_| {
        pulled.set(pulled.get() + 1);
        if pulled.get() == 5 {
            stop.store(true, Ordering::Relaxed);
        }
    });
    let mut sink = NdjsonSink::new(Vec::new());
    let err = pipeline.write_rows(source, &mut sink, &stop).unwrap_err();
    assert!(matches!(err, PipelineError::NoRows));
    assert_eq!(pulled.get(), 5);
}
