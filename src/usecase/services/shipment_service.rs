use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::entities::query::{FieldName, FilterExpression};
use crate::domain::entities::shipment::{NewShipment, Shipment, ShipmentField, ShipmentStatus};
use crate::infra::import::csv::{import_shipments_csv, ImportResult};
use crate::infra::sqlite::queries::insert_shipment;
use crate::infra::sqlite::source::SqliteSource;
use crate::platform::desktop::blocking::run_blocking;
use crate::usecase::aggregate::{
    average, count_by, rate, top_n, AggregateMetric, GroupMetric, GroupRanking, MetricScope, Reduce,
};
use crate::usecase::ports::source::SourceError;
use crate::usecase::services::list_query::collect_all;

const KPI_BATCH: u64 = 200;
const TOP_GROUPS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentKpis {
    pub on_time_rate: AggregateMetric,
    pub average_delivery_hours: AggregateMetric,
    pub top_clients: Vec<GroupRanking>,
    pub top_drivers: Vec<GroupRanking>,
    pub by_status: BTreeMap<ShipmentStatus, usize>,
}

/// On-time rate is taken over delivered shipments only; open shipments have
/// not had the chance to be late yet.
pub fn shipment_kpis(items: &[Shipment], scope: MetricScope) -> ShipmentKpis {
    let delivered: Vec<Shipment> = items
        .iter()
        .filter(|shipment| shipment.delivered_at.is_some())
        .cloned()
        .collect();

    let cost = |shipment: &Shipment| shipment.cost;
    let weight = |shipment: &Shipment| shipment.weight_kg;
    let client_metrics = [
        GroupMetric {
            name: "revenue",
            reduce: Reduce::Sum,
            selector: &cost,
        },
        GroupMetric {
            name: "avg_weight_kg",
            reduce: Reduce::Average,
            selector: &weight,
        },
    ];
    let on_time = |shipment: &Shipment| if shipment.is_on_time() { 1.0 } else { 0.0 };
    let driver_metrics = [GroupMetric {
        name: "on_time",
        reduce: Reduce::Sum,
        selector: &on_time,
    }];

    let assigned: Vec<Shipment> = delivered
        .iter()
        .filter(|shipment| shipment.driver_name.is_some())
        .cloned()
        .collect();

    ShipmentKpis {
        on_time_rate: AggregateMetric::new(
            "on_time_rate",
            rate(Shipment::is_on_time, &delivered),
            scope,
        ),
        average_delivery_hours: AggregateMetric::new(
            "average_delivery_hours",
            average(Shipment::delivery_hours, items),
            scope,
        ),
        top_clients: top_n(
            |shipment: &Shipment| shipment.client_name.clone(),
            &client_metrics,
            "revenue",
            items,
            TOP_GROUPS,
        ),
        top_drivers: top_n(
            |shipment: &Shipment| shipment.driver_name.clone().unwrap_or_default(),
            &driver_metrics,
            "on_time",
            &assigned,
            TOP_GROUPS,
        ),
        by_status: count_by(|shipment: &Shipment| shipment.status, items),
    }
}

/// Shipment use cases that sit beside the list controller: mutations and
/// whole-collection metrics.
pub struct ShipmentService {
    db_path: PathBuf,
    source: SqliteSource<Shipment>,
}

impl ShipmentService {
    pub fn new(db_path: PathBuf) -> Self {
        let source = SqliteSource::new(db_path.clone());
        Self { db_path, source }
    }

    pub async fn create(&self, shipment: NewShipment) -> Result<i64> {
        let db_path = self.db_path.clone();
        let tracking = shipment.tracking_number.clone();
        let id = run_blocking(move || insert_shipment(&db_path, &shipment))
            .await
            .context("shipment insert task failed")??;
        info!(id, tracking = %tracking, "shipment created");
        Ok(id)
    }

    pub async fn import_csv(&self, csv_path: &Path, now: i64) -> Result<ImportResult> {
        let db_path = self.db_path.clone();
        let csv_path = csv_path.to_path_buf();
        let result = run_blocking(move || import_shipments_csv(&db_path, &csv_path, now))
            .await
            .context("csv import task failed")??;
        info!(imported = result.imported, "shipments imported");
        Ok(result)
    }

    /// KPIs over every shipment, not just the page on screen.
    pub async fn collection_kpis(&self) -> Result<ShipmentKpis, SourceError> {
        let items = collect_all(
            &self.source,
            &FilterExpression::All,
            &ShipmentField::default_sort(),
            KPI_BATCH,
        )
        .await?;
        Ok(shipment_kpis(&items, MetricScope::WholeCollection))
    }
}
