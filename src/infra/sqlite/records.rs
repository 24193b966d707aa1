use rusqlite::types::Type;
use rusqlite::Row;

use crate::domain::entities::client::{Client, ClientField};
use crate::domain::entities::driver::{Driver, DriverField};
use crate::domain::entities::query::FieldName;
use crate::domain::entities::shipment::{Shipment, ShipmentField, ShipmentStatus};

/// Table mapping for an entity served by `SqliteSource`.
pub trait SqlRecord: Sized + Send + 'static {
    type Field: FieldName + Send;

    const TABLE: &'static str;
    /// Select list, in the order `from_row` reads it.
    const COLUMNS: &'static str;

    fn column(field: Self::Field) -> &'static str {
        field.name()
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl SqlRecord for Shipment {
    type Field = ShipmentField;

    const TABLE: &'static str = "shipment";
    const COLUMNS: &'static str = "id, tracking_number, client_name, origin, destination, \
         driver_name, status, weight_kg, cost, created_at, due_at, delivered_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw_status: String = row.get(6)?;
        let status = raw_status
            .parse::<ShipmentStatus>()
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(err)))?;

        Ok(Shipment {
            id: row.get(0)?,
            tracking_number: row.get(1)?,
            client_name: row.get(2)?,
            origin: row.get(3)?,
            destination: row.get(4)?,
            driver_name: row.get(5)?,
            status,
            weight_kg: row.get(7)?,
            cost: row.get(8)?,
            created_at: row.get(9)?,
            due_at: row.get(10)?,
            delivered_at: row.get(11)?,
        })
    }
}

impl SqlRecord for Client {
    type Field = ClientField;

    const TABLE: &'static str = "client";
    const COLUMNS: &'static str = "id, company_name, contact_name, email, phone, city, created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Client {
            id: row.get(0)?,
            company_name: row.get(1)?,
            contact_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            city: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl SqlRecord for Driver {
    type Field = DriverField;

    const TABLE: &'static str = "driver";
    const COLUMNS: &'static str =
        "id, full_name, license_number, phone, home_base, active, rating, created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let active: i64 = row.get(5)?;
        Ok(Driver {
            id: row.get(0)?,
            full_name: row.get(1)?,
            license_number: row.get(2)?,
            phone: row.get(3)?,
            home_base: row.get(4)?,
            active: active != 0,
            rating: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}
