use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::entities::query::{FieldName, SortKey, SortSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    Delivered,
    Delayed,
    Cancelled,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 5] = [
        ShipmentStatus::Pending,
        ShipmentStatus::InTransit,
        ShipmentStatus::Delivered,
        ShipmentStatus::Delayed,
        ShipmentStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Delayed => "delayed",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "Pending",
            ShipmentStatus::InTransit => "In transit",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::Delayed => "Delayed",
            ShipmentStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shipment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ShipmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        ShipmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == norm)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    pub id: i64,
    pub tracking_number: String,
    pub client_name: String,
    pub origin: String,
    pub destination: String,
    pub driver_name: Option<String>,
    pub status: ShipmentStatus,
    pub weight_kg: f64,
    pub cost: f64,
    /// Unix seconds.
    pub created_at: i64,
    pub due_at: i64,
    pub delivered_at: Option<i64>,
}

impl Shipment {
    /// Delivered no later than the promised date.
    pub fn is_on_time(&self) -> bool {
        matches!(self.delivered_at, Some(delivered) if delivered <= self.due_at)
    }

    pub fn delivery_hours(&self) -> Option<f64> {
        self.delivered_at
            .map(|delivered| (delivered - self.created_at).max(0) as f64 / 3600.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewShipment {
    pub tracking_number: String,
    pub client_name: String,
    pub origin: String,
    pub destination: String,
    pub driver_name: Option<String>,
    pub status: ShipmentStatus,
    pub weight_kg: f64,
    pub cost: f64,
    pub created_at: i64,
    pub due_at: i64,
    pub delivered_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipmentField {
    TrackingNumber,
    ClientName,
    Origin,
    Destination,
    DriverName,
    Status,
    Cost,
    CreatedAt,
    DueAt,
}

impl FieldName for ShipmentField {
    fn name(&self) -> &'static str {
        match self {
            ShipmentField::TrackingNumber => "tracking_number",
            ShipmentField::ClientName => "client_name",
            ShipmentField::Origin => "origin",
            ShipmentField::Destination => "destination",
            ShipmentField::DriverName => "driver_name",
            ShipmentField::Status => "status",
            ShipmentField::Cost => "cost",
            ShipmentField::CreatedAt => "created_at",
            ShipmentField::DueAt => "due_at",
        }
    }

    fn searchable() -> &'static [Self] {
        &[
            ShipmentField::TrackingNumber,
            ShipmentField::ClientName,
            ShipmentField::Origin,
            ShipmentField::Destination,
            ShipmentField::DriverName,
        ]
    }

    fn default_sort() -> SortSpec<Self> {
        SortSpec::single(SortKey::desc(ShipmentField::CreatedAt))
    }
}
