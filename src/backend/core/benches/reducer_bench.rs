//! Benchmarks for status reduction, URL validation, and report encoding.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use healthagg_core::health::{reduce_status, validate_url, AggregatedReport, ServiceResult};
use std::time::Duration;

fn results(n: usize, down_every: usize) -> Vec<ServiceResult> {
    (0..n)
        .map(|i| {
            let name = format!("service-{i}");
            if down_every > 0 && i % down_every == 0 {
                ServiceResult::down(name, "HTTP 503")
            } else {
                ServiceResult::healthy(name, Duration::from_micros(1500 + i as u64))
            }
        })
        .collect()
}

fn bench_reduce_status(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce_status");
    for size in [10, 100, 1_000] {
        let mixed = results(size, 3);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &mixed, |b, input| {
            b.iter(|| black_box(reduce_status(input)));
        });
    }
    group.finish();
}

fn bench_validate_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_url");
    for (label, url) in [
        ("valid", "http://inventory.internal:8080/health"),
        ("no_scheme", "example.com"),
        ("garbage", "not-a-valid-url"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), url, |b, input| {
            b.iter(|| black_box(validate_url(input).is_ok()));
        });
    }
    group.finish();
}

fn bench_report_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_serialization");
    for size in [10, 100] {
        let report = AggregatedReport::new("2026-01-01T00:00:00Z".to_string(), results(size, 4));
        group.bench_with_input(BenchmarkId::from_parameter(size), &report, |b, input| {
            b.iter(|| black_box(serde_json::to_vec(input).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_reduce_status,
    bench_validate_url,
    bench_report_serialization
);
criterion_main!(benches);
