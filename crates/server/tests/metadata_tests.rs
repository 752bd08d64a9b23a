//! Direct tests for the SQLite metadata store.

use dialcenter_metadata::models::{CaseRow, CaseSetRow, PackageRow};
use dialcenter_metadata::repos::{CaseRepo, CaseSetRepo, PackageRepo};
use dialcenter_metadata::{MetadataError, MetadataStore, SqliteStore};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

async fn new_store() -> (tempfile::TempDir, SqliteStore) {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(temp_dir.path().join("metadata.db"))
        .await
        .unwrap();
    (temp_dir, store)
}

fn case_set_row(name: &str, version: &str, created_at: OffsetDateTime) -> CaseSetRow {
    CaseSetRow {
        case_set_id: Uuid::new_v4(),
        set_name: name.to_string(),
        set_version: version.to_string(),
        format: "zip".to_string(),
        digest_hex: "ab".repeat(64),
        raw_archive: b"archive bytes".to_vec(),
        has_manifest: true,
        has_script_dir: true,
        case_count: 0,
        missing_script_count: 0,
        created_at,
    }
}

fn case_row(case_set_id: Uuid, position: i32, number: &str, script_exists: bool) -> CaseRow {
    CaseRow {
        case_set_id,
        position,
        case_name: format!("Case {number}"),
        case_number: number.to_string(),
        network_topology: "4G-Standalone".to_string(),
        business_category: "voice".to_string(),
        app_name: "dialer".to_string(),
        test_steps: "dial and hold".to_string(),
        expected_result: "call connects".to_string(),
        script_exists,
    }
}

fn package_row(name: &str, digest_hex: &str) -> PackageRow {
    PackageRow {
        package_id: Uuid::new_v4(),
        software_name: name.to_string(),
        platform: "android".to_string(),
        format: "apk".to_string(),
        digest_hex: digest_hex.to_string(),
        size_bytes: 7,
        payload: b"payload".to_vec(),
        created_at: OffsetDateTime::now_utc(),
    }
}

#[tokio::test]
async fn test_insert_and_query_case_set() {
    let (_temp, store) = new_store().await;
    let now = OffsetDateTime::now_utc();

    let mut header = case_set_row("caseset", "v1", now);
    header.case_count = 2;
    header.missing_script_count = 1;
    let cases = vec![
        case_row(header.case_set_id, 0, "TC001", true),
        case_row(header.case_set_id, 1, "TC002", false),
    ];
    store.insert_case_set(&header, &cases).await.unwrap();

    assert!(
        store
            .exists_by_name_and_version("caseset", "v1")
            .await
            .unwrap()
    );
    assert!(
        !store
            .exists_by_name_and_version("caseset", "v2")
            .await
            .unwrap()
    );

    let summary = store
        .get_case_set(header.case_set_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.set_name, "caseset");
    assert_eq!(summary.case_count, 2);
    assert_eq!(summary.missing_script_count, 1);
    assert_eq!(summary.archive_size, b"archive bytes".len() as i64);

    let archive = store
        .get_case_set_archive(header.case_set_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(archive.raw_archive, b"archive bytes");

    let rows = store.list_cases(header.case_set_id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].case_number, "TC001");
    assert!(rows[0].script_exists);
    assert_eq!(rows[1].case_number, "TC002");
    assert!(!rows[1].script_exists);
}

#[tokio::test]
async fn test_list_case_sets_newest_first() {
    let (_temp, store) = new_store().await;
    let now = OffsetDateTime::now_utc();

    let older = case_set_row("older", "v1", now - Duration::minutes(5));
    let newer = case_set_row("newer", "v1", now);
    store.insert_case_set(&older, &[]).await.unwrap();
    store.insert_case_set(&newer, &[]).await.unwrap();

    let sets = store.list_case_sets().await.unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].set_name, "newer");
    assert_eq!(sets[1].set_name, "older");
}

#[tokio::test]
async fn test_duplicate_name_version_hits_unique_index() {
    let (_temp, store) = new_store().await;
    let now = OffsetDateTime::now_utc();

    store
        .insert_case_set(&case_set_row("caseset", "v1", now), &[])
        .await
        .unwrap();

    // A second writer that passed the existence check still loses here.
    let result = store
        .insert_case_set(&case_set_row("caseset", "v1", now), &[])
        .await;
    assert!(matches!(result, Err(MetadataError::Constraint(_))));

    assert_eq!(store.list_case_sets().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_case_set_removes_case_rows() {
    let (_temp, store) = new_store().await;
    let header = case_set_row("caseset", "v1", OffsetDateTime::now_utc());
    let cases = vec![
        case_row(header.case_set_id, 0, "TC001", true),
        case_row(header.case_set_id, 1, "TC002", false),
    ];
    store.insert_case_set(&header, &cases).await.unwrap();

    store.delete_case_set(header.case_set_id).await.unwrap();

    assert!(
        store
            .get_case_set(header.case_set_id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(store.list_cases(header.case_set_id).await.unwrap().is_empty());

    let result = store.delete_case_set(header.case_set_id).await;
    assert!(matches!(result, Err(MetadataError::NotFound(_))));
}

#[tokio::test]
async fn test_missing_script_queries() {
    let (_temp, store) = new_store().await;
    let header = case_set_row("caseset", "v1", OffsetDateTime::now_utc());
    let cases = vec![
        case_row(header.case_set_id, 0, "TC001", true),
        case_row(header.case_set_id, 1, "TC002", false),
        case_row(header.case_set_id, 2, "TC003", false),
    ];
    store.insert_case_set(&header, &cases).await.unwrap();

    assert_eq!(
        store
            .count_missing_scripts(header.case_set_id)
            .await
            .unwrap(),
        2
    );
    let missing = store
        .list_missing_script_cases(header.case_set_id)
        .await
        .unwrap();
    assert_eq!(missing.len(), 2);
    assert_eq!(missing[0].case_number, "TC002");
    assert_eq!(missing[1].case_number, "TC003");
}

#[tokio::test]
async fn test_package_dedup_checks_are_independent() {
    let (_temp, store) = new_store().await;
    store
        .insert_package(&package_row("dialer.apk", &"aa".repeat(64)))
        .await
        .unwrap();

    let dedup = store
        .check_duplicate("dialer.apk", &"bb".repeat(64))
        .await
        .unwrap();
    assert!(dedup.by_file_name);
    assert!(!dedup.by_digest);
    assert!(dedup.is_duplicate());

    let dedup = store
        .check_duplicate("other.apk", &"aa".repeat(64))
        .await
        .unwrap();
    assert!(!dedup.by_file_name);
    assert!(dedup.by_digest);

    let dedup = store
        .check_duplicate("other.apk", &"bb".repeat(64))
        .await
        .unwrap();
    assert!(!dedup.is_duplicate());
}

#[tokio::test]
async fn test_package_unique_indexes_are_the_backstop() {
    let (_temp, store) = new_store().await;
    store
        .insert_package(&package_row("dialer.apk", &"aa".repeat(64)))
        .await
        .unwrap();

    let by_name = store
        .insert_package(&package_row("dialer.apk", &"bb".repeat(64)))
        .await;
    assert!(matches!(by_name, Err(MetadataError::Constraint(_))));

    let by_digest = store
        .insert_package(&package_row("other.apk", &"aa".repeat(64)))
        .await;
    assert!(matches!(by_digest, Err(MetadataError::Constraint(_))));
}

#[tokio::test]
async fn test_package_roundtrip_and_delete() {
    let (_temp, store) = new_store().await;
    let package = package_row("dialer.apk", &"cc".repeat(64));
    store.insert_package(&package).await.unwrap();

    let summary = store
        .get_package(package.package_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.software_name, "dialer.apk");
    assert_eq!(summary.size_bytes, 7);

    let full = store
        .get_package_payload(package.package_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(full.payload, b"payload");

    store.delete_package(package.package_id).await.unwrap();
    assert!(
        store
            .get_package(package.package_id)
            .await
            .unwrap()
            .is_none()
    );

    let result = store.delete_package(package.package_id).await;
    assert!(matches!(result, Err(MetadataError::NotFound(_))));
}

#[tokio::test]
async fn test_health_check() {
    let (_temp, store) = new_store().await;
    store.health_check().await.unwrap();
}
