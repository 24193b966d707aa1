use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use csv::StringRecord;

use crate::domain::entities::shipment::{NewShipment, ShipmentStatus};
use crate::infra::sqlite::queries::insert_shipment_with;
use crate::infra::sqlite::schema::{init_db, open_connection};

const REQUIRED_COLUMNS: [&str; 4] = ["tracking_number", "client_name", "origin", "destination"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
}

struct ColumnMap {
    headers: Vec<String>,
}

impl ColumnMap {
    fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers
                .iter()
                .map(|name| name.trim().to_ascii_lowercase())
                .collect(),
        }
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.headers
            .iter()
            .position(|header| header == name)
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Accepts unix seconds or RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<i64> {
    if let Ok(secs) = value.parse::<i64>() {
        return Ok(secs);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.timestamp())
        .with_context(|| format!("invalid timestamp: {value}"))
}

fn parse_record(columns: &ColumnMap, record: &StringRecord, now: i64) -> Result<NewShipment> {
    let text = |name: &str| columns.get(record, name).map(str::to_string);
    let required = |name: &str| text(name).with_context(|| format!("missing value for {name}"));
    let number = |name: &str| -> Result<f64> {
        columns
            .get(record, name)
            .map(|value| {
                value
                    .parse::<f64>()
                    .with_context(|| format!("invalid number for {name}: {value}"))
            })
            .transpose()
            .map(|value| value.unwrap_or(0.0))
    };
    let timestamp = |name: &str| columns.get(record, name).map(parse_timestamp).transpose();

    let status = match columns.get(record, "status") {
        Some(value) => value.parse::<ShipmentStatus>()?,
        None => ShipmentStatus::Pending,
    };
    let created_at = timestamp("created_at")?.unwrap_or(now);

    Ok(NewShipment {
        tracking_number: required("tracking_number")?,
        client_name: required("client_name")?,
        origin: required("origin")?,
        destination: required("destination")?,
        driver_name: text("driver_name"),
        status,
        weight_kg: number("weight_kg")?,
        cost: number("cost")?,
        created_at,
        due_at: timestamp("due_at")?.unwrap_or(created_at),
        delivered_at: timestamp("delivered_at")?,
    })
}

/// Imports shipments from a CSV with a header row. The whole file is rejected
/// if any row is invalid.
pub fn import_shipments_csv(db_path: &Path, csv_path: &Path, now: i64) -> Result<ImportResult> {
    init_db(db_path)?;

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .clone();

    let columns = ColumnMap::new(&headers);
    for required in REQUIRED_COLUMNS {
        if !columns.headers.iter().any(|header| header == required) {
            anyhow::bail!("csv is missing required column: {required}")
        }
    }

    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start transaction")?;

    let mut imported = 0;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.context("failed to parse csv record")?;
        let shipment = parse_record(&columns, &record, now)
            .with_context(|| format!("invalid shipment on line {}", row_idx + 2))?;
        insert_shipment_with(&tx, &shipment)?;
        imported += 1;
    }

    tx.commit().context("failed to commit import transaction")?;

    Ok(ImportResult { imported })
}
