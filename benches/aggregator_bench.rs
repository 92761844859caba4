//! Benchmarks for the Sensorboard aggregator
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sensorboard::aggregator::*;
use sensorboard::storage::{FileStore, MemoryStore};
use std::sync::Arc;
use tempfile::tempdir;

fn create_test_readings(count: usize, sensors: usize) -> Vec<SensorReading> {
    (0..count)
        .map(|i| {
            SensorReading::new(format!("sensor-{}", i % sensors), 20.0 + (i % 10) as f64, 50.0)
                .region(if i % 2 == 0 { "Norte" } else { "Sur" })
        })
        .collect()
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    group.bench_function("single_memory", |b| {
        let mut aggregator = SensorAggregator::load(Arc::new(MemoryStore::new()));
        let reading = SensorReading::new("greenhouse", 24.5, 61.0);

        b.iter(|| aggregator.ingest(black_box(reading.clone())));
    });

    for size in [10, 100, 1000] {
        let readings = create_test_readings(size, 50);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("batch_memory_{}", size), |b| {
            let mut aggregator = SensorAggregator::load(Arc::new(MemoryStore::new()));
            b.iter(|| aggregator.ingest(black_box(readings.clone())));
        });
    }

    group.bench_function("batch_file_100", |b| {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let mut aggregator = SensorAggregator::load(store);
        let readings = create_test_readings(100, 50);

        b.iter(|| aggregator.ingest(black_box(readings.clone())));
    });

    group.finish();
}

fn bench_read_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_model");

    let mut aggregator = SensorAggregator::load(Arc::new(MemoryStore::new()));
    for _ in 0..HISTORY_CAPACITY {
        aggregator.ingest(create_test_readings(200, 200));
    }
    let snapshot = aggregator.snapshot();
    let state = aggregator.sensor("sensor-0").cloned().unwrap_or_default();

    group.bench_function("stats_full_window", |b| {
        b.iter(|| Stats::from_history(black_box(&state.history)))
    });

    group.bench_function("dashboard_200", |b| {
        let hidden = Default::default();
        let filter = DashboardFilter::default();
        b.iter(|| dashboard(black_box(&snapshot), &hidden, &filter))
    });

    group.bench_function("parse_persisted_200", |b| {
        let raw = serde_json::to_string(&snapshot).unwrap();
        b.iter(|| parse_persisted_state(black_box(&raw)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_read_model);
criterion_main!(benches);
