use chrono::DateTime;

use crate::domain::entities::query::{FieldName, QueryStatus, SortDirection, SortSpec};
use crate::domain::entities::shipment::Shipment;
use crate::usecase::aggregate::MetricScope;
use crate::usecase::ports::feedback::Severity;

pub fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub fn driver_label(shipment: &Shipment) -> &str {
    shipment.driver_name.as_deref().unwrap_or("Unassigned")
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn format_money(value: f64) -> String {
    format!("${value:.2}")
}

pub fn scope_label(scope: MetricScope) -> &'static str {
    match scope {
        MetricScope::PageLocal => "this page",
        MetricScope::WholeCollection => "all records",
    }
}

/// Arrow for a column header; multi-column sorts also show the key position.
pub fn sort_indicator<F: FieldName>(sort: &SortSpec<F>, field: F) -> String {
    let Some(position) = sort.keys.iter().position(|key| key.field == field) else {
        return String::new();
    };
    let arrow = match sort.keys[position].direction {
        SortDirection::Ascending => "▲",
        SortDirection::Descending => "▼",
    };
    if sort.keys.len() > 1 {
        format!(" {arrow}{}", position + 1)
    } else {
        format!(" {arrow}")
    }
}

pub fn status_line(status: QueryStatus, total_count: u64) -> String {
    match status {
        QueryStatus::Idle => "Idle".to_string(),
        QueryStatus::Loading => "Loading…".to_string(),
        QueryStatus::Success => format!("{total_count} records"),
        QueryStatus::Error => "Showing last loaded results".to_string(),
    }
}

pub fn toast_style(severity: Severity) -> String {
    let (background, border) = match severity {
        Severity::Info => ("#e8f1fb", "#b6d0f0"),
        Severity::Success => ("#e9f6ec", "#b7dfc0"),
        Severity::Warning => ("#fff6e0", "#f3d99a"),
        Severity::Error => ("#fdecea", "#f5c2c0"),
    };
    format!(
        "position: fixed; right: 16px; bottom: 16px; max-width: 360px; padding: 12px 16px; border-radius: 8px; background: {background}; border: 1px solid {border}; z-index: 10;"
    )
}

pub fn header_cell_style() -> &'static str {
    "position: sticky; top: 0; z-index: 1; background: #f5f5f5; padding: 6px 10px; text-align: left; cursor: pointer; border-bottom: 1px solid #ddd; white-space: nowrap;"
}

pub fn body_cell_style() -> &'static str {
    "padding: 6px 10px; border-bottom: 1px solid #eee; white-space: nowrap;"
}

pub fn card_style() -> &'static str {
    "border: 1px solid #ddd; border-radius: 8px; padding: 10px 14px; min-width: 160px; background: #fff;"
}
