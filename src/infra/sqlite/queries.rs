use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, types::Value, Connection};

use crate::domain::entities::client::Client;
use crate::domain::entities::driver::Driver;
use crate::domain::entities::query::{FilterExpression, SortSpec};
use crate::domain::entities::shipment::NewShipment;
use crate::infra::sqlite::records::SqlRecord;
use crate::infra::sqlite::schema::{open_connection, FOLD_CASE_FN};

/// Lowercases the needle and escapes `%`, `_` and the escape character itself
/// for a `LIKE ... ESCAPE '\'` against a `fold_case()` column.
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

pub fn where_clause<F: Copy>(
    filter: &FilterExpression<F>,
    column: &impl Fn(F) -> &'static str,
    params: &mut Vec<Value>,
) -> String {
    match filter {
        FilterExpression::All => "1 = 1".to_string(),
        FilterExpression::Contains { field, needle } => {
            params.push(Value::Text(like_pattern(needle)));
            format!("{FOLD_CASE_FN}({}) LIKE ? ESCAPE '\\'", column(*field))
        }
        FilterExpression::Equals { field, value } => {
            params.push(Value::Text(value.clone()));
            format!("{} = ? COLLATE NOCASE", column(*field))
        }
        FilterExpression::Or(clauses) => join_clauses(clauses, " OR ", "1 = 0", column, params),
        FilterExpression::And(clauses) => join_clauses(clauses, " AND ", "1 = 1", column, params),
    }
}

fn join_clauses<F: Copy>(
    clauses: &[FilterExpression<F>],
    separator: &str,
    empty: &str,
    column: &impl Fn(F) -> &'static str,
    params: &mut Vec<Value>,
) -> String {
    if clauses.is_empty() {
        return empty.to_string();
    }
    let parts = clauses
        .iter()
        .map(|clause| where_clause(clause, column, params))
        .collect::<Vec<_>>();
    format!("({})", parts.join(separator))
}

/// `ORDER BY` body; `id` is always the last key so pages never overlap.
pub fn order_clause<F: Copy>(sort: &SortSpec<F>, column: impl Fn(F) -> &'static str) -> String {
    let mut keys = sort
        .keys
        .iter()
        .map(|key| format!("{} {}", column(key.field), key.direction.as_sql()))
        .collect::<Vec<_>>();
    keys.push("id ASC".to_string());
    keys.join(", ")
}

pub fn query_page<E: SqlRecord>(
    db_path: &Path,
    filter: &FilterExpression<E::Field>,
    sort: &SortSpec<E::Field>,
    offset: u64,
    limit: u64,
) -> Result<(Vec<E>, u64)> {
    if limit == 0 {
        anyhow::bail!("limit must be greater than zero")
    }

    let conn = open_connection(db_path)?;

    let mut filter_params = Vec::<Value>::new();
    let where_sql = where_clause(filter, &E::column, &mut filter_params);

    let count_sql = format!("SELECT COUNT(*) FROM {} WHERE {where_sql}", E::TABLE);
    let total: i64 = conn
        .query_row(
            &count_sql,
            rusqlite::params_from_iter(filter_params.iter().cloned()),
            |row| row.get(0),
        )
        .with_context(|| format!("failed to count {} rows", E::TABLE))?;

    let row_sql = format!(
        "SELECT {} FROM {} WHERE {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
        E::COLUMNS,
        E::TABLE,
        order_clause(sort, E::column)
    );
    let mut row_params = filter_params;
    row_params.push(Value::Integer(to_sql_int(limit)));
    row_params.push(Value::Integer(to_sql_int(offset)));

    let mut stmt = conn
        .prepare(&row_sql)
        .with_context(|| format!("failed to prepare {} page query", E::TABLE))?;
    let items = stmt
        .query_map(rusqlite::params_from_iter(row_params), |row| E::from_row(row))
        .with_context(|| format!("failed to query {} page", E::TABLE))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to read {} rows", E::TABLE))?;

    Ok((items, total.max(0) as u64))
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub fn count_rows(db_path: &Path, table: &str) -> Result<u64> {
    let conn = open_connection(db_path)?;
    let total: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .with_context(|| format!("failed to count {table} rows"))?;
    Ok(total.max(0) as u64)
}

pub fn insert_shipment_with(conn: &Connection, shipment: &NewShipment) -> Result<i64> {
    conn.execute(
        "INSERT INTO shipment(
            tracking_number, client_name, origin, destination, driver_name,
            status, weight_kg, cost, created_at, due_at, delivered_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            shipment.tracking_number,
            shipment.client_name,
            shipment.origin,
            shipment.destination,
            shipment.driver_name,
            shipment.status.as_str(),
            shipment.weight_kg,
            shipment.cost,
            shipment.created_at,
            shipment.due_at,
            shipment.delivered_at,
        ],
    )
    .with_context(|| format!("failed to insert shipment {}", shipment.tracking_number))?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_shipment(db_path: &Path, shipment: &NewShipment) -> Result<i64> {
    let conn = open_connection(db_path)?;
    insert_shipment_with(&conn, shipment)
}

pub fn insert_client_with(conn: &Connection, client: &Client) -> Result<i64> {
    conn.execute(
        "INSERT INTO client(company_name, contact_name, email, phone, city, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            client.company_name,
            client.contact_name,
            client.email,
            client.phone,
            client.city,
            client.created_at,
        ],
    )
    .context("failed to insert client")?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_driver_with(conn: &Connection, driver: &Driver) -> Result<i64> {
    conn.execute(
        "INSERT INTO driver(full_name, license_number, phone, home_base, active, rating, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            driver.full_name,
            driver.license_number,
            driver.phone,
            driver.home_base,
            if driver.active { 1 } else { 0 },
            driver.rating,
            driver.created_at,
        ],
    )
    .context("failed to insert driver")?;
    Ok(conn.last_insert_rowid())
}
