use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::entities::client::Client;
use crate::domain::entities::driver::Driver;
use crate::domain::entities::shipment::{NewShipment, ShipmentStatus};
use crate::infra::sqlite::queries::{
    count_rows, insert_client_with, insert_driver_with, insert_shipment_with,
};
use crate::infra::sqlite::schema::{init_db, open_connection};

const HOUR: i64 = 3600;
const DAY: i64 = 24 * HOUR;

const CITIES: [&str; 8] = [
    "Chicago", "Denver", "Dallas", "Atlanta", "Seattle", "Phoenix", "Memphis", "Columbus",
];

const CLIENTS: [(&str, &str, &str); 6] = [
    ("Acme Freight", "Dana Reyes", "dana@acmefreight.example"),
    ("Blue Ridge Foods", "Sam Patel", "sam@blueridge.example"),
    ("Cobalt Parts", "Jordan Lee", "jordan@cobalt.example"),
    ("Delta Home Goods", "Alex Kim", "alex@deltahome.example"),
    ("Evergreen Pharma", "Robin Cole", "robin@evergreen.example"),
    ("Foundry Steel", "Casey Moore", "casey@foundry.example"),
];

const DRIVERS: [&str; 5] = [
    "Morgan Hale",
    "Taylor Brooks",
    "Jamie Ortiz",
    "Riley Chen",
    "Avery Novak",
];

/// Fills an empty database with a deterministic demo fleet. Returns whether
/// anything was inserted.
pub fn seed_demo_data(db_path: &Path, now: i64) -> Result<bool> {
    init_db(db_path)?;
    if count_rows(db_path, "shipment")? > 0 {
        return Ok(false);
    }

    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start seed transaction")?;

    for (idx, (company, contact, email)) in CLIENTS.iter().enumerate() {
        insert_client_with(
            &tx,
            &Client {
                id: 0,
                company_name: company.to_string(),
                contact_name: contact.to_string(),
                email: email.to_string(),
                phone: format!("555-01{idx:02}"),
                city: CITIES[idx % CITIES.len()].to_string(),
                created_at: now - (idx as i64 + 1) * 30 * DAY,
            },
        )?;
    }

    for (idx, name) in DRIVERS.iter().enumerate() {
        insert_driver_with(
            &tx,
            &Driver {
                id: 0,
                full_name: name.to_string(),
                license_number: format!("CDL-{:05}", 40_000 + idx * 137),
                phone: format!("555-02{idx:02}"),
                home_base: CITIES[(idx * 3) % CITIES.len()].to_string(),
                active: idx != 4,
                rating: 3.5 + (idx % 3) as f64 * 0.5,
                created_at: now - (idx as i64 + 1) * 45 * DAY,
            },
        )?;
    }

    let shipments = demo_shipments(now, 47);
    for shipment in &shipments {
        insert_shipment_with(&tx, shipment)?;
    }

    tx.commit().context("failed to commit seed transaction")?;
    info!(shipments = shipments.len(), "seeded demo data");
    Ok(true)
}

pub fn demo_shipments(now: i64, count: usize) -> Vec<NewShipment> {
    (0..count)
        .map(|idx| {
            let created_at = now - (count - idx) as i64 * 10 * HOUR;
            let due_at = created_at + 2 * DAY;
            let status = match idx % 7 {
                0 | 1 | 2 | 3 => ShipmentStatus::Delivered,
                4 => ShipmentStatus::InTransit,
                5 => ShipmentStatus::Delayed,
                _ => ShipmentStatus::Pending,
            };
            let delivered_at = (status == ShipmentStatus::Delivered).then(|| {
                // every third delivery misses its window
                if idx % 3 == 0 {
                    due_at + 6 * HOUR
                } else {
                    created_at + (20 + (idx % 5) as i64 * 4) * HOUR
                }
            });
            let (client, _, _) = CLIENTS[idx % CLIENTS.len()];
            NewShipment {
                tracking_number: format!("FD-{:05}", 1000 + idx),
                client_name: client.to_string(),
                origin: CITIES[idx % CITIES.len()].to_string(),
                destination: CITIES[(idx + 3) % CITIES.len()].to_string(),
                driver_name: (status != ShipmentStatus::Pending)
                    .then(|| DRIVERS[idx % DRIVERS.len()].to_string()),
                status,
                weight_kg: 120.0 + (idx * 37 % 900) as f64,
                cost: 250.0 + (idx * 53 % 1200) as f64,
                created_at,
                due_at,
                delivered_at,
            }
        })
        .collect()
}
