//! Store Performance Benchmarks
//!
//! Measures tree construction, leaf writes, structural writes, and
//! projections over stores of increasing width.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deepsignal_core::reactive::Effect;
use deepsignal_core::{deep_signal, Object, Value};

/// `width` records, each with a few leaves and one nested branch.
fn records(width: usize) -> Value {
    let records: Object = (0..width)
        .map(|i| {
            let record: Value = [
                ("name", Value::from(format!("record-{i}"))),
                ("count", Value::from(i)),
                (
                    "meta",
                    [("tags", Value::from(vec![Value::from("a"), Value::from("b")]))]
                        .into_iter()
                        .collect(),
                ),
            ]
            .into_iter()
            .collect();
            (format!("r{i}"), record)
        })
        .collect();
    [("records", Value::Object(records))].into_iter().collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for width in [10, 100, 1000] {
        let payload = records(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &payload, |b, payload| {
            b.iter(|| deep_signal(black_box(payload.clone())).unwrap())
        });
    }
    group.finish();
}

fn bench_leaf_write(c: &mut Criterion) {
    let store = deep_signal(records(100)).unwrap();
    let count = store.at(["records", "r50", "count"]).unwrap().into_leaf().unwrap();
    let _reader = {
        let count = count.clone();
        Effect::new(move || {
            black_box(count.get());
        })
    };

    let mut n = 0u64;
    c.bench_function("leaf_write", |b| {
        b.iter(|| {
            n += 1;
            count.set(Value::from(n))
        })
    });
}

fn bench_structural_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("structural_write");
    for width in [10, 100] {
        let store = deep_signal(records(width)).unwrap();
        let record_set = store.branch("records").unwrap();
        let full = record_set.peek();
        let mut trimmed = full.clone();
        trimmed.pop();

        let _reader = {
            let store = store.clone();
            Effect::new(move || {
                black_box(store.value());
            })
        };

        group.bench_function(BenchmarkId::from_parameter(width), |b| {
            b.iter(|| {
                record_set.set_value(trimmed.clone()).unwrap();
                record_set.set_value(full.clone()).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");
    for width in [10, 100, 1000] {
        let store = deep_signal(records(width)).unwrap();
        group.bench_with_input(BenchmarkId::new("peek", width), &store, |b, store| {
            b.iter(|| black_box(store.peek()))
        });
        group.bench_with_input(BenchmarkId::new("value", width), &store, |b, store| {
            b.iter(|| black_box(store.value()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_leaf_write,
    bench_structural_write,
    bench_projection
);
criterion_main!(benches);
