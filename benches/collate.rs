//! Collation benchmark: examples → padded batch, by batch size.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recsys_pipeline::collate::Collator;
use recsys_pipeline::sequence::SupervisedExample;
use recsys_pipeline::vocab::Vocabulary;

fn make_examples(n: usize, max_history: usize) -> Vec<SupervisedExample> {
    (0..n)
        .map(|i| {
            let len = i % (max_history + 1);
            SupervisedExample {
                user_id: format!("user_{}", i),
                history_actions: (0..len).map(|j| format!("a{}", (i + j) % 13)).collect(),
                history_products: Some((0..len).map(|j| Some(format!("p{}", (i * j) % 211))).collect()),
                history_seasonal: vec![[0.1, 0.2, 0.3, 0.4]; len],
                target_action: format!("a{}", i % 13),
                target_product: Some(format!("p{}", i % 211)),
                timestamp: None,
            }
        })
        .collect()
}

fn bench_collate_warm_vocab(c: &mut Criterion) {
    let collator = Collator::new(true);
    let mut g = c.benchmark_group("collate_by_batch_size");
    for size in [16, 64, 256] {
        let examples = make_examples(size, 20);
        let mut actions = Vocabulary::default();
        let mut products = Vocabulary::default();
        collator.collate(&examples, &mut actions, Some(&mut products)).unwrap();

        g.bench_function(format!("batch_{}", size).as_str(), |b| {
            b.iter(|| {
                black_box(
                    collator
                        .collate(black_box(&examples), &mut actions, Some(&mut products))
                        .unwrap(),
                )
            })
        });
    }
    g.finish();
}

fn bench_collate_frozen_vocab(c: &mut Criterion) {
    let examples = make_examples(64, 20);
    let mut actions = Vocabulary::default();
    Collator::new(true).collate(&examples, &mut actions, None).unwrap();
    let frozen = Collator::new(false);

    c.bench_function("collate_64_no_growth", |b| {
        b.iter(|| black_box(frozen.collate(black_box(&examples), &mut actions, None).unwrap()))
    });
}

criterion_group!(benches, bench_collate_warm_vocab, bench_collate_frozen_vocab);
criterion_main!(benches);
