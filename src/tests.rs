use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

use crate::domain::entities::client::{Client, ClientField};
use crate::domain::entities::query::{FieldName, FilterExpression, QueryStatus, SortKey, SortSpec};
use crate::domain::entities::shipment::{NewShipment, Shipment, ShipmentField, ShipmentStatus};
use crate::ensure_webview_data_dir;
use crate::infra::import::csv::import_shipments_csv;
use crate::infra::sqlite::queries::count_rows;
use crate::infra::sqlite::schema::init_db;
use crate::infra::sqlite::seed::seed_demo_data;
use crate::infra::sqlite::source::SqliteSource;
use crate::ui::format::{format_timestamp, sort_indicator, status_line};
use crate::usecase::aggregate::MetricScope;
use crate::usecase::filter::{build_filter, with_facets};
use crate::usecase::ports::source::PageSource;
use crate::usecase::services::list_query::ListQueryController;
use crate::usecase::services::shipment_service::ShipmentService;
use crate::usecase::sort::SortPolicy;

const NOW: i64 = 1_760_000_000;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("fleetdesk-{prefix}-{nanos}"))
}

fn seeded_db(prefix: &str) -> PathBuf {
    let temp_dir = unique_test_dir(prefix);
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    seed_demo_data(&db_path, NOW).expect("seed should succeed");
    db_path
}

fn shipment_source(db_path: &Path) -> Rc<dyn PageSource<Shipment, ShipmentField>> {
    Rc::new(SqliteSource::<Shipment>::new(db_path.to_path_buf()))
}

fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("should write csv fixture");
    path
}

#[test]
fn init_db_creates_required_tables() {
    let temp_dir = unique_test_dir("init-db");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");

    let result = init_db(&db_path);

    assert!(result.is_ok(), "init_db should succeed: {result:?}");

    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('client', 'driver', 'shipment')",
            [],
            |row| row.get(0),
        )
        .expect("should count tables");
    assert_eq!(table_count, 3);
}

#[test]
fn seed_only_fills_an_empty_database() {
    let db_path = seeded_db("seed");

    let seeded_again = seed_demo_data(&db_path, NOW).expect("second seed should succeed");

    assert!(!seeded_again);
    assert_eq!(count_rows(&db_path, "shipment").expect("should count"), 47);
    assert_eq!(count_rows(&db_path, "client").expect("should count"), 6);
    assert_eq!(count_rows(&db_path, "driver").expect("should count"), 5);
}

#[tokio::test]
async fn sqlite_source_serves_last_partial_page() {
    let db_path = seeded_db("last-page");
    let source = shipment_source(&db_path);

    let page = source
        .fetch_page(&FilterExpression::All, &ShipmentField::default_sort(), 40, 10)
        .await
        .expect("fetch should succeed");

    assert_eq!(page.count, 47);
    assert_eq!(page.items.len(), 7);
    assert_eq!(page.items[6].tracking_number, "FD-01000");
}

#[tokio::test]
async fn search_matches_any_field_case_insensitively() {
    let db_path = seeded_db("search");
    let source = shipment_source(&db_path);
    let filter = build_filter("DENVER", ShipmentField::searchable());

    let page = source
        .fetch_page(&filter, &ShipmentField::default_sort(), 0, 50)
        .await
        .expect("fetch should succeed");

    assert_eq!(page.count, 12);
    assert!(page
        .items
        .iter()
        .all(|shipment| shipment.origin == "Denver" || shipment.destination == "Denver"));
}

#[tokio::test]
async fn search_folds_case_beyond_ascii() {
    let db_path = seeded_db("search-unicode");
    let service = ShipmentService::new(db_path.clone());
    service
        .create(NewShipment {
            tracking_number: "FD-EU-1".to_string(),
            client_name: "Acme Freight".to_string(),
            origin: "Zürich".to_string(),
            destination: "Östersund".to_string(),
            driver_name: None,
            status: ShipmentStatus::Pending,
            weight_kg: 5.0,
            cost: 40.0,
            created_at: NOW + 60,
            due_at: NOW + 60 + 86_400,
            delivered_at: None,
        })
        .await
        .expect("create should succeed");
    let source = shipment_source(&db_path);

    for term in ["ZÜRICH", "zürich", "östersund", "ÖSTERSUND"] {
        let filter = build_filter(term, ShipmentField::searchable());
        let page = source
            .fetch_page(&filter, &ShipmentField::default_sort(), 0, 10)
            .await
            .expect("fetch should succeed");

        assert_eq!(page.count, 1, "term {term:?}");
        assert_eq!(page.items[0].tracking_number, "FD-EU-1");
    }
}

#[tokio::test]
async fn facet_narrows_search_results() {
    let db_path = seeded_db("facet");
    let source = shipment_source(&db_path);
    let filter = with_facets(
        build_filter("denver", ShipmentField::searchable()),
        &[(ShipmentField::Status, "delayed".to_string())],
    );

    let page = source
        .fetch_page(&filter, &ShipmentField::default_sort(), 0, 10)
        .await
        .expect("fetch should succeed");

    assert_eq!(page.count, 1);
    assert_eq!(page.items[0].tracking_number, "FD-01033");
    assert_eq!(page.items[0].status, ShipmentStatus::Delayed);
}

#[tokio::test]
async fn wildcard_characters_are_matched_literally() {
    let db_path = seeded_db("wildcard");
    let source = shipment_source(&db_path);

    let page = source
        .fetch_page(
            &build_filter("%", ShipmentField::searchable()),
            &ShipmentField::default_sort(),
            0,
            10,
        )
        .await
        .expect("fetch should succeed");

    assert_eq!(page.count, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn sort_keys_order_rows_in_the_database() {
    let db_path = seeded_db("sort");
    let source = shipment_source(&db_path);
    let sort = SortSpec::single(SortKey::asc(ShipmentField::Cost));

    let page = source
        .fetch_page(&FilterExpression::All, &sort, 0, 47)
        .await
        .expect("fetch should succeed");

    assert!(page
        .items
        .windows(2)
        .all(|pair| pair[0].cost <= pair[1].cost));
}

#[tokio::test]
async fn multi_column_sort_runs_against_clients() {
    let db_path = seeded_db("client-sort");
    let source: Rc<dyn PageSource<Client, ClientField>> =
        Rc::new(SqliteSource::<Client>::new(db_path.clone()));
    let controller = ListQueryController::new(source).with_sort_policy(SortPolicy::MultiColumn);

    controller.toggle_sort(ClientField::City).await;
    controller.toggle_sort(ClientField::CompanyName).await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, QueryStatus::Success);
    assert_eq!(snapshot.sort.keys.len(), 3);
    assert_eq!(snapshot.sort.keys[0], SortKey::asc(ClientField::CompanyName));
    assert_eq!(snapshot.items[0].company_name, "Acme Freight");
}

#[tokio::test]
async fn controller_pages_through_seeded_shipments() {
    let db_path = seeded_db("controller");
    let controller = ListQueryController::new(shipment_source(&db_path));

    controller.set_page(5).await;
    let last_page = controller.snapshot();
    assert_eq!(last_page.page_number, 5);
    assert_eq!(last_page.total_pages, 5);
    assert_eq!(last_page.items.len(), 7);

    controller.set_search_term("fd-0104").await;
    let searched = controller.snapshot();
    assert_eq!(searched.page_number, 1);
    assert_eq!(searched.total_count, 7);
    assert_eq!(searched.items[0].tracking_number, "FD-01046");
}

#[tokio::test]
async fn created_shipment_appears_after_refetch() {
    let db_path = seeded_db("create");
    let controller = ListQueryController::new(shipment_source(&db_path));
    controller.refetch().await;
    let service = ShipmentService::new(db_path.clone());

    service
        .create(NewShipment {
            tracking_number: "FD-NEW-1".to_string(),
            client_name: "Acme Freight".to_string(),
            origin: "Chicago".to_string(),
            destination: "Denver".to_string(),
            driver_name: None,
            status: ShipmentStatus::Pending,
            weight_kg: 10.0,
            cost: 99.0,
            created_at: NOW + 60,
            due_at: NOW + 60 + 86_400,
            delivered_at: None,
        })
        .await
        .expect("create should succeed");
    controller.refetch().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.total_count, 48);
    assert_eq!(snapshot.items[0].tracking_number, "FD-NEW-1");
}

#[tokio::test]
async fn duplicate_tracking_number_is_rejected() {
    let db_path = seeded_db("duplicate");
    let service = ShipmentService::new(db_path.clone());
    let duplicate = NewShipment {
        tracking_number: "FD-01000".to_string(),
        client_name: "Acme Freight".to_string(),
        origin: "Chicago".to_string(),
        destination: "Denver".to_string(),
        driver_name: None,
        status: ShipmentStatus::Pending,
        weight_kg: 0.0,
        cost: 0.0,
        created_at: NOW,
        due_at: NOW,
        delivered_at: None,
    };

    let result = service.create(duplicate).await;

    assert!(result.is_err());
    assert_eq!(count_rows(&db_path, "shipment").expect("should count"), 47);
}

#[tokio::test]
async fn collection_kpis_cover_every_shipment() {
    let db_path = seeded_db("kpis");
    let service = ShipmentService::new(db_path);

    let kpis = service
        .collection_kpis()
        .await
        .expect("kpis should load");

    assert_eq!(kpis.on_time_rate.scope, MetricScope::WholeCollection);
    assert!((kpis.on_time_rate.value - 18.0 / 28.0 * 100.0).abs() < 1e-9);
    assert_eq!(kpis.by_status.get(&ShipmentStatus::Delivered), Some(&28));
    assert_eq!(kpis.by_status.get(&ShipmentStatus::InTransit), Some(&7));
    assert_eq!(kpis.top_clients.len(), 5);
    assert!(kpis
        .top_clients
        .windows(2)
        .all(|pair| pair[0].value("revenue") >= pair[1].value("revenue")));
}

#[test]
fn csv_import_inserts_every_row() {
    let temp_dir = unique_test_dir("csv-import");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let csv_path = write_csv(
        &temp_dir,
        "shipments.csv",
        "Tracking_Number,client_name,origin,destination,status,cost,due_at\n\
         IMP-1,Acme Freight,Chicago,Denver,in transit,120.5,2025-10-10T12:00:00Z\n\
         IMP-2,Cobalt Parts,Dallas,Seattle,,80,\n",
    );

    let result = import_shipments_csv(&db_path, &csv_path, NOW).expect("import should succeed");

    assert_eq!(result.imported, 2);
    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let (status, due_at): (String, i64) = conn
        .query_row(
            "SELECT status, due_at FROM shipment WHERE tracking_number = 'IMP-1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("imported row should exist");
    assert_eq!(status, "in_transit");
    assert_eq!(due_at, 1_760_097_600);
    let pending: String = conn
        .query_row(
            "SELECT status FROM shipment WHERE tracking_number = 'IMP-2'",
            [],
            |row| row.get(0),
        )
        .expect("imported row should exist");
    assert_eq!(pending, "pending");
}

#[test]
fn csv_import_rejects_whole_file_on_bad_row() {
    let temp_dir = unique_test_dir("csv-bad-row");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let csv_path = write_csv(
        &temp_dir,
        "shipments.csv",
        "tracking_number,client_name,origin,destination,status\n\
         OK-1,Acme Freight,Chicago,Denver,pending\n\
         BAD-1,Acme Freight,Chicago,Denver,lost\n",
    );

    let err = import_shipments_csv(&db_path, &csv_path, NOW).expect_err("import should fail");

    assert!(format!("{err:#}").contains("line 3"), "unexpected error: {err:#}");
    assert_eq!(count_rows(&db_path, "shipment").expect("should count"), 0);
}

#[test]
fn csv_import_requires_core_columns() {
    let temp_dir = unique_test_dir("csv-missing-column");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let csv_path = write_csv(
        &temp_dir,
        "shipments.csv",
        "tracking_number,client_name,origin\nX-1,Acme Freight,Chicago\n",
    );

    let err = import_shipments_csv(&db_path, &csv_path, NOW).expect_err("import should fail");

    assert!(err.to_string().contains("destination"));
}

#[test]
fn webview_data_dir_is_created_under_base_dir() {
    let temp_dir = unique_test_dir("webview");

    let dir = ensure_webview_data_dir(&temp_dir).expect("should create webview dir");

    assert!(dir.is_dir());
    assert!(dir.starts_with(&temp_dir));
}

#[test]
fn sort_indicator_marks_key_position_for_multi_column_sorts() {
    let single = SortSpec::single(SortKey::desc(ShipmentField::Cost));
    let multi = SortSpec::new(vec![
        SortKey::asc(ShipmentField::Origin),
        SortKey::desc(ShipmentField::Cost),
    ]);

    assert_eq!(sort_indicator(&single, ShipmentField::Cost), " ▼");
    assert_eq!(sort_indicator(&single, ShipmentField::Origin), "");
    assert_eq!(sort_indicator(&multi, ShipmentField::Cost), " ▼2");
}

#[test]
fn status_line_and_timestamps_render_for_humans() {
    assert_eq!(status_line(QueryStatus::Success, 47), "47 records");
    assert_eq!(status_line(QueryStatus::Loading, 47), "Loading…");
    assert_eq!(format_timestamp(0), "1970-01-01 00:00");
}
