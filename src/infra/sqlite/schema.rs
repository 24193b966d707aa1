use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// SQL function that lowercases text with full Unicode case folding.
/// The built-in `lower()` and `LIKE` only fold ASCII letters.
pub const FOLD_CASE_FN: &str = "fold_case";

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    register_fold_case(&conn)?;
    Ok(conn)
}

fn register_fold_case(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
    .with_context(|| format!("failed to register {FOLD_CASE_FN}()"))
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS client (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            company_name  TEXT NOT NULL,
            contact_name  TEXT NOT NULL,
            email         TEXT NOT NULL,
            phone         TEXT NOT NULL DEFAULT '',
            city          TEXT NOT NULL DEFAULT '',
            created_at    INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS driver (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name       TEXT NOT NULL,
            license_number  TEXT NOT NULL,
            phone           TEXT NOT NULL DEFAULT '',
            home_base       TEXT NOT NULL DEFAULT '',
            active          INTEGER NOT NULL DEFAULT 1,
            rating          REAL NOT NULL DEFAULT 0,
            created_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS shipment (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            tracking_number  TEXT NOT NULL UNIQUE,
            client_name      TEXT NOT NULL,
            origin           TEXT NOT NULL,
            destination      TEXT NOT NULL,
            driver_name      TEXT,
            status           TEXT NOT NULL,
            weight_kg        REAL NOT NULL DEFAULT 0,
            cost             REAL NOT NULL DEFAULT 0,
            created_at       INTEGER NOT NULL,
            due_at           INTEGER NOT NULL,
            delivered_at     INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_shipment_created
            ON shipment(created_at);

        CREATE INDEX IF NOT EXISTS idx_shipment_status
            ON shipment(status);

        CREATE INDEX IF NOT EXISTS idx_client_created
            ON client(created_at);

        CREATE INDEX IF NOT EXISTS idx_driver_created
            ON driver(created_at);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
