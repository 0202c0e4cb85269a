//! End-to-end quota scenarios over a seeded SQLite network.

use site_quota::output::parse_fields;
use site_quota::{
    ListQuery, NetworkConfig, OutputFormat, RecordsWriter, SiteQuotaError, TenantListFilter,
};
use site_quota_engine::ThresholdFilter;
use site_quota_hub::{init_test_tracing, NetworkFixture, BYTES_PER_MB};

#[test]
fn test_report_then_grow_a_nearly_full_site() {
    init_test_tracing();
    let mut fixture = NetworkFixture::new(10_000);
    let id = fixture.add_site("/", 9_850 * BYTES_PER_MB);

    let record = fixture.service.get(id).expect("get site quota");
    assert_eq!(record.allocation_mb, 10_000);
    assert_eq!(record.used_mb, 9_850.0);
    assert_eq!(record.used_percent, 98.5);

    let change = fixture.service.add(id, "3g").expect("add quota");
    assert_eq!(change.allocation_mb, 13_072);
    assert_eq!(change.message(), "Quota is now 13072 MB for http://network.test/.");

    let record = fixture.service.get(id).unwrap();
    assert_eq!(record.used_percent, 75.35);
}

#[test]
fn test_network_default_change_applies_to_sites_without_override() {
    init_test_tracing();
    let fixture = NetworkFixture::with_sites(100, 3, |index| index as u64 * 40);
    let pinned = fixture.site_ids[0];
    fixture.service.set(pinned, "1g").unwrap();

    fixture.database.set_network_default(200).unwrap();
    assert_eq!(fixture.database.default_allocation_mb().unwrap(), 200);

    let quotas: Vec<i64> = fixture
        .service
        .list(&ListQuery::default())
        .unwrap()
        .map(|item| item.unwrap().allocation_mb)
        .collect();
    assert_eq!(quotas, vec![1_024, 200, 200]);

    // Setting the pinned site to the new default drops its override.
    let change = fixture.service.set(pinned, "200").unwrap();
    assert!(change.override_cleared);
}

#[test]
fn test_filtered_listing_renders_as_json() {
    init_test_tracing();
    let fixture = NetworkFixture::with_sites(100, 6, |index| [5, 95, 40, 100, 0, 60][index]);

    let query = ListQuery {
        columns: TenantListFilter::default(),
        thresholds: ThresholdFilter::new(Some(90.0), Some(60.0)).unwrap(),
    };
    let mut writer = RecordsWriter::new(Vec::new(), OutputFormat::Json)
        .with_columns(parse_fields("blog_id,quota_used_percent").unwrap());
    let written = writer
        .write_records(fixture.service.list(&query).unwrap())
        .unwrap();
    assert_eq!(written, 3);

    let rendered: serde_json::Value =
        serde_json::from_slice(&writer.into_inner()).expect("valid json");
    let ids: Vec<u64> = rendered
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["blog_id"].as_u64().unwrap())
        .collect();
    let expected: Vec<u64> = [1, 3, 5].iter().map(|&i| fixture.site_ids[i]).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_failed_mutation_does_not_write() {
    init_test_tracing();
    let mut fixture = NetworkFixture::new(100);
    let id = fixture.add_site("/docs", 0);

    assert!(matches!(
        fixture.service.subtract(id, "5.5"),
        Err(SiteQuotaError::Input(_))
    ));
    assert!(matches!(
        fixture.service.add(id + 1, "5"),
        Err(SiteQuotaError::NotFound(_))
    ));
    assert_eq!(fixture.database.get_tenant_override(id).unwrap(), None);
}
