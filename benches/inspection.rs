//! Benchmarks for rule inspection and monitor ticks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use linewatch::{ControlLimits, Inspector, Monitor, SpcConfig};

fn generate_rates(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 0.012 + (i as f64 % 10.0) * 0.0005)
        .collect()
}

fn bench_inspection(c: &mut Criterion) {
    let mut group = c.benchmark_group("inspection");

    let rates = generate_rates(1000);
    let limits = ControlLimits::new(0.01375, 0.0217, 0.0058).unwrap();
    let inspector = Inspector::default();

    group.throughput(Throughput::Elements(1000));

    group.bench_function("inspect_1000_growing_histories", |b| {
        b.iter(|| {
            for end in 1..=rates.len() {
                let result = inspector.inspect(&rates[..end], &limits);
                black_box(result);
            }
        })
    });

    group.finish();
}

fn bench_monitor_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("monitor");

    let config = SpcConfig::default().with_seed(42);
    let mut monitor = Monitor::from_config(&config).unwrap();

    group.throughput(Throughput::Elements(config.lines.len() as u64));

    group.bench_function("tick_default_catalog", |b| {
        b.iter(|| {
            let reports = monitor.tick().unwrap();
            black_box(reports);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_inspection, bench_monitor_tick);
criterion_main!(benches);
