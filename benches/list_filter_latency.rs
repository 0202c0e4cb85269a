use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use site_quota::ListQuery;
use site_quota_engine::{filter, TenantQuotaRecord, ThresholdFilter};
use site_quota_hub::NetworkFixture;

fn synthetic_records(count: usize) -> Vec<TenantQuotaRecord> {
    (0..count)
        .map(|index| {
            TenantQuotaRecord::from_raw(
                index as u64 + 1,
                format!("http://network.test/site-{index}/"),
                1_000,
                (index % 1_200) as f64,
            )
        })
        .collect()
}

fn bench_usage_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("usage_filter");
    let thresholds = ThresholdFilter::new(Some(900.0), Some(75.0)).unwrap();

    for size in [1_000usize, 10_000, 100_000] {
        let records = synthetic_records(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| filter(records.iter().cloned(), black_box(thresholds)).count())
        });
    }

    group.finish();
}

fn bench_network_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("network_listing");
    group
        .sample_size(20)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(2));

    for sites in [100usize, 1_000] {
        let fixture = NetworkFixture::with_sites(1_000, sites, |index| (index % 1_200) as u64);
        let query = ListQuery {
            thresholds: ThresholdFilter::new(None, Some(90.0)).unwrap(),
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::new("filtered", sites), &query, |b, query| {
            b.iter(|| {
                fixture
                    .service
                    .list(black_box(query))
                    .unwrap()
                    .filter_map(Result::ok)
                    .count()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_usage_filter, bench_network_listing);
criterion_main!(benches);
