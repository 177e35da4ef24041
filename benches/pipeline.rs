//! Pipeline benchmark: raw records → filter → sequence examples.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recsys_pipeline::config::{FieldKeys, SequenceConfig, StreamConfig};
use recsys_pipeline::sequence::build_sequences;
use recsys_pipeline::source::Record;
use recsys_pipeline::stream::stream_filtered_rows;

fn make_dummy_records(n: usize, users: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::new()
                .with("user_id", format!("user_{}", i % users))
                .with("action_type", ["ADD", "BUY", "VIEW", "REMOVE"][i % 4])
                .with("product_id", format!("p{}", i % 97))
                .with("timestamp", format!("2024-01-{:02}T10:00:00", 1 + (i / 500) % 28))
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let records = make_dummy_records(10_000, 100);

    c.bench_function("filter_10k_records", |b| {
        b.iter(|| {
            let rows = stream_filtered_rows(black_box(records.clone()), StreamConfig::default(), FieldKeys::default());
            black_box(rows.count())
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let records = make_dummy_records(10_000, 100);

    c.bench_function("filter_and_build_10k_records", |b| {
        b.iter(|| {
            let rows = stream_filtered_rows(black_box(records.clone()), StreamConfig::default(), FieldKeys::default());
            let examples = build_sequences(rows, SequenceConfig::default(), FieldKeys::default()).unwrap();
            black_box(examples.count())
        })
    });
}

criterion_group!(benches, bench_filter, bench_full_pipeline);
criterion_main!(benches);
