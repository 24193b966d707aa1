use std::rc::Rc;
use std::time::Duration;

use dioxus::prelude::*;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use tracing::warn;

use crate::config::AppConfig;
use crate::domain::entities::client::{Client, ClientField};
use crate::domain::entities::driver::{Driver, DriverField};
use crate::domain::entities::query::{FieldName, SortSpec};
use crate::domain::entities::shipment::{NewShipment, Shipment, ShipmentField, ShipmentStatus};
use crate::infra::sqlite::records::SqlRecord;
use crate::ui::format::{
    body_cell_style, card_style, driver_label, format_money, format_percent,
    format_timestamp, header_cell_style, scope_label, sort_indicator, status_line, toast_style,
};
use crate::ui::state::app_state::{use_list_query, AppState, ListHandle};
use crate::usecase::aggregate::MetricScope;
use crate::usecase::filter::SearchInput;
use crate::usecase::ports::feedback::{Alert, Severity};
use crate::usecase::services::list_query::ListQueryController;
use crate::usecase::services::shipment_service::{shipment_kpis, ShipmentKpis, ShipmentService};
use crate::usecase::sort::SortPolicy;

const ALERT_TTL: Duration = Duration::from_secs(4);
const DUE_IN: i64 = 2 * 24 * 3600;

type Controller<E> = Rc<ListQueryController<E, <E as SqlRecord>::Field>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Shipments,
    Clients,
    Drivers,
}

impl Screen {
    const ALL: [Screen; 3] = [Screen::Shipments, Screen::Clients, Screen::Drivers];

    fn label(self) -> &'static str {
        match self {
            Screen::Shipments => "Shipments",
            Screen::Clients => "Clients",
            Screen::Drivers => "Drivers",
        }
    }
}

const SHIPMENT_COLUMNS: [(ShipmentField, &str); 9] = [
    (ShipmentField::TrackingNumber, "Tracking #"),
    (ShipmentField::ClientName, "Client"),
    (ShipmentField::Origin, "Origin"),
    (ShipmentField::Destination, "Destination"),
    (ShipmentField::DriverName, "Driver"),
    (ShipmentField::Status, "Status"),
    (ShipmentField::Cost, "Cost"),
    (ShipmentField::CreatedAt, "Created"),
    (ShipmentField::DueAt, "Due"),
];

const CLIENT_COLUMNS: [(ClientField, &str); 5] = [
    (ClientField::CompanyName, "Company"),
    (ClientField::ContactName, "Contact"),
    (ClientField::Email, "Email"),
    (ClientField::City, "City"),
    (ClientField::CreatedAt, "Since"),
];

const DRIVER_COLUMNS: [(DriverField, &str); 6] = [
    (DriverField::FullName, "Name"),
    (DriverField::LicenseNumber, "License"),
    (DriverField::HomeBase, "Home base"),
    (DriverField::Active, "Active"),
    (DriverField::Rating, "Rating"),
    (DriverField::CreatedAt, "Hired"),
];

#[component]
pub fn App() -> Element {
    let state = AppState::new();
    let app = use_context_provider(|| state.clone());
    let mut screen = use_signal(|| Screen::Shipments);

    let feedback = app.feedback;
    let mut alert_timer = app.alert_timer;
    let hub = app.hub.clone();
    use_effect(move || {
        if feedback.alert.read().is_none() {
            return;
        }
        let ticket = alert_timer.write().arm();
        let hub = hub.clone();
        let mut alert = feedback.alert;
        spawn(async move {
            tokio::time::sleep(ALERT_TTL).await;
            if alert_timer.peek().is_current(ticket) {
                alert.set(None);
                hub.dismiss_alert();
            }
        });
    });

    let loading = *feedback.loading.read();
    let alert = feedback.alert.read().clone();
    let status = app.status.read().clone();
    let dismiss_hub = app.hub.clone();

    rsx! {
        div { style: "font-family: sans-serif; display: flex; flex-direction: column; height: 100vh;",
            div { style: "height: 3px; background: {loading_bar_color(loading)};" }
            div { style: "display: flex; gap: 8px; padding: 8px 12px; border-bottom: 1px solid #ddd; align-items: center;",
                strong { "FleetDesk" }
                for tab in Screen::ALL {
                    button {
                        key: "{tab.label()}",
                        disabled: screen() == tab,
                        onclick: move |_| screen.set(tab),
                        "{tab.label()}"
                    }
                }
                span { style: "margin-left: auto; color: #666;", "{status}" }
            }
            if let Some(alert) = alert {
                div {
                    style: toast_style(alert.severity),
                    div { style: "display: flex; justify-content: space-between; gap: 12px;",
                        strong { "{alert.title}" }
                        button {
                            onclick: move |_| {
                                alert_timer.write().cancel();
                                let mut slot = feedback.alert;
                                slot.set(None);
                                dismiss_hub.dismiss_alert();
                            },
                            "×"
                        }
                    }
                    p { style: "margin: 6px 0 0;", "{alert.message}" }
                }
            }
            div { style: "flex: 1; overflow: auto; padding: 12px;",
                {match screen() {
                    Screen::Shipments => rsx! { ShipmentsPage {} },
                    Screen::Clients => rsx! { ClientsPage {} },
                    Screen::Drivers => rsx! { DriversPage {} },
                }}
            }
        }
    }
}

/// A select's value as a facet list; the empty option clears the facet.
fn facet<F>(field: F, value: String) -> Vec<(F, String)> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![(field, value)]
    }
}

fn loading_bar_color(loading: bool) -> &'static str {
    if loading {
        "#1976d2"
    } else {
        "transparent"
    }
}

fn spawn_search<E>(controller: Controller<E>, input: Signal<SearchInput>, delay: Duration)
    -> impl FnMut(FormEvent) + 'static
where
    E: SqlRecord + Clone,
{
    move |evt: FormEvent| {
        let mut input = input;
        let ticket = input.write().edit(evt.value());
        let controller = controller.clone();
        spawn(async move {
            tokio::time::sleep(delay).await;
            let committed = input.write().commit(ticket);
            if let Some(term) = committed {
                controller.set_search_term(&term).await;
            }
        });
    }
}

fn spawn_toggle_sort<E>(controller: &Controller<E>, field: E::Field) -> impl FnMut(MouseEvent) + 'static
where
    E: SqlRecord + Clone,
{
    let controller = controller.clone();
    move |_| {
        let controller = controller.clone();
        spawn(async move {
            controller.toggle_sort(field).await;
        });
    }
}

fn spawn_set_page<E>(controller: &Controller<E>, page: u64) -> impl FnMut(MouseEvent) + 'static
where
    E: SqlRecord + Clone,
{
    let controller = controller.clone();
    move |_| {
        let controller = controller.clone();
        spawn(async move {
            controller.set_page(page).await;
        });
    }
}

fn spawn_reset_sort<E>(controller: &Controller<E>) -> impl FnMut(MouseEvent) + 'static
where
    E: SqlRecord + Clone,
{
    let controller = controller.clone();
    move |_| {
        let controller = controller.clone();
        spawn(async move {
            controller.set_sort(<E::Field as FieldName>::default_sort()).await;
        });
    }
}

fn search_box<E>(list: &ListHandle<E>, input: Signal<SearchInput>, delay: Duration) -> Element
where
    E: SqlRecord + Clone,
{
    let draft = input.read().draft().to_string();
    rsx! {
        input {
            r#type: "search",
            placeholder: "Search…",
            style: "padding: 4px 8px; min-width: 240px;",
            value: "{draft}",
            oninput: spawn_search::<E>(list.controller.clone(), input, delay),
        }
    }
}

fn sortable_headers<E>(
    list: &ListHandle<E>,
    sort: &SortSpec<E::Field>,
    columns: &[(E::Field, &'static str)],
) -> Element
where
    E: SqlRecord + Clone,
{
    rsx! {
        tr {
            for (field, label) in columns.iter().copied() {
                th {
                    key: "{label}",
                    style: header_cell_style(),
                    onclick: spawn_toggle_sort::<E>(&list.controller, field),
                    "{label}{sort_indicator(sort, field)}"
                }
            }
        }
    }
}

fn pager<E>(list: &ListHandle<E>, page: u64, total_pages: u64, caption: String) -> Element
where
    E: SqlRecord + Clone,
{
    let last = total_pages.max(1);
    rsx! {
        div { style: "display: flex; gap: 8px; align-items: center; margin-top: 8px;",
            button {
                disabled: page <= 1,
                onclick: spawn_set_page::<E>(&list.controller, page.saturating_sub(1)),
                "‹ Prev"
            }
            span { "Page {page} / {last}" }
            button {
                disabled: page >= last,
                onclick: spawn_set_page::<E>(&list.controller, page + 1),
                "Next ›"
            }
            span { style: "color: #666;", "{caption}" }
        }
    }
}

fn reload_kpis(
    service: Rc<ShipmentService>,
    mut kpis: Signal<Option<ShipmentKpis>>,
    mut status: Signal<String>,
) {
    spawn(async move {
        match service.collection_kpis().await {
            Ok(loaded) => kpis.set(Some(loaded)),
            Err(err) => {
                warn!(error = %err, "failed to load shipment kpis");
                status.set(format!("Failed to load KPIs: {err}"));
            }
        }
    });
}

fn show_error_dialog(title: &str, err: &anyhow::Error) {
    let _ = MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(format!("{err:#}"))
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn kpi_cards(kpis: &ShipmentKpis) -> Element {
    let scope = scope_label(kpis.on_time_rate.scope);
    let average_hours = format!("{:.1} h", kpis.average_delivery_hours.value);
    let clients: Vec<(String, String)> = kpis
        .top_clients
        .iter()
        .map(|ranking| {
            let line = format!(
                "{}: {} ({})",
                ranking.key,
                format_money(ranking.value("revenue")),
                ranking.count
            );
            (ranking.key.clone(), line)
        })
        .collect();
    let drivers: Vec<(String, String)> = kpis
        .top_drivers
        .iter()
        .map(|ranking| {
            let line = format!("{}: {} on time", ranking.key, ranking.value("on_time"));
            (ranking.key.clone(), line)
        })
        .collect();
    rsx! {
        div { style: "display: flex; gap: 12px; flex-wrap: wrap; margin-bottom: 12px;",
            div { style: card_style(),
                div { style: "color: #666;", "On-time rate ({scope})" }
                h3 { style: "margin: 4px 0;", "{format_percent(kpis.on_time_rate.value)}" }
            }
            div { style: card_style(),
                div { style: "color: #666;", "Avg delivery time ({scope})" }
                h3 { style: "margin: 4px 0;", "{average_hours}" }
            }
            div { style: card_style(),
                div { style: "color: #666;", "Top clients by revenue" }
                for (key, line) in clients {
                    div { key: "{key}", "{line}" }
                }
            }
            div { style: card_style(),
                div { style: "color: #666;", "Top drivers by on-time deliveries" }
                for (key, line) in drivers {
                    div { key: "{key}", "{line}" }
                }
            }
            div { style: card_style(),
                div { style: "color: #666;", "By status" }
                for (status, count) in kpis.by_status.iter() {
                    div { key: "{status.as_str()}", "{status.label()}: {count}" }
                }
            }
        }
    }
}

#[component]
fn ShipmentsPage() -> Element {
    let config = use_context::<AppConfig>();
    let app = use_context::<AppState>();
    let mut status = app.status;
    let hub = app.hub.clone();
    let list = use_list_query::<Shipment>("shipments", SortPolicy::SingleColumn);
    let search = use_signal(SearchInput::default);
    let mut status_facet = use_signal(String::new);
    let kpis = use_signal(|| None::<ShipmentKpis>);

    let service = use_hook(|| Rc::new(ShipmentService::new(config.db_path.clone())));
    use_hook({
        let service = service.clone();
        move || reload_kpis(service, kpis, status)
    });

    let mut tracking = use_signal(String::new);
    let mut client = use_signal(String::new);
    let mut origin = use_signal(String::new);
    let mut destination = use_signal(String::new);
    let mut cost = use_signal(String::new);

    let _ = list.revision.read();
    let snapshot = list.controller.snapshot();
    let page_kpis = list
        .controller
        .with_items(|items| shipment_kpis(items, MetricScope::PageLocal));
    let delay = Duration::from_millis(config.search_debounce_ms);

    let on_facet = {
        let controller = list.controller.clone();
        move |evt: FormEvent| {
            let value = evt.value();
            status_facet.set(value.clone());
            let controller = controller.clone();
            spawn(async move {
                controller.set_facets(facet(ShipmentField::Status, value)).await;
            });
        }
    };

    let on_import = {
        let hub = hub.clone();
        let controller = list.controller.clone();
        let service = service.clone();
        move |_: MouseEvent| {
            let Some(path) = FileDialog::new().add_filter("CSV", &["csv"]).pick_file() else {
                return;
            };
            let hub = hub.clone();
            let controller = controller.clone();
            let service = service.clone();
                spawn(async move {
                let now = chrono::Utc::now().timestamp();
                match service.import_csv(&path, now).await {
                    Ok(result) => {
                        let message = format!("Imported {} shipments", result.imported);
                        let severity = if result.imported == 0 {
                            Severity::Info
                        } else {
                            Severity::Success
                        };
                        hub.notify(Alert::new("Import complete", message.clone(), severity));
                        status.set(message);
                        controller.refetch().await;
                        reload_kpis(service, kpis, status);
                    }
                    Err(err) => {
                        status.set("Import failed".to_string());
                        show_error_dialog("Import failed", &err);
                    }
                }
            });
        }
    };

    let on_create = {
        let hub = hub.clone();
        let controller = list.controller.clone();
        let service = service.clone();
        move |_: MouseEvent| {
            let fields = [tracking(), client(), origin(), destination()];
            if fields.iter().any(|value| value.trim().is_empty()) {
                hub.notify(Alert::new(
                    "Missing fields",
                    "Tracking #, client, origin and destination are required",
                    Severity::Warning,
                ));
                return;
            }
            let cost_text = cost();
            let parsed_cost = if cost_text.trim().is_empty() {
                0.0
            } else {
                match cost_text.trim().parse::<f64>() {
                    Ok(value) => value,
                    Err(_) => {
                        hub.notify(Alert::new(
                            "Invalid cost",
                            format!("Not a number: {cost_text}"),
                            Severity::Warning,
                        ));
                        return;
                    }
                }
            };
            let [tracking_number, client_name, origin_name, destination_name] =
                fields.map(|value| value.trim().to_string());
            let now = chrono::Utc::now().timestamp();
            let shipment = NewShipment {
                tracking_number,
                client_name,
                origin: origin_name,
                destination: destination_name,
                driver_name: None,
                status: ShipmentStatus::Pending,
                weight_kg: 0.0,
                cost: parsed_cost,
                created_at: now,
                due_at: now + DUE_IN,
                delivered_at: None,
            };

            let controller = controller.clone();
            let service = service.clone();
                spawn(async move {
                match service.create(shipment).await {
                    Ok(_) => {
                        status.set("Shipment created".to_string());
                        tracking.set(String::new());
                        controller.refetch().await;
                        reload_kpis(service, kpis, status);
                    }
                    Err(err) => {
                        status.set("Create failed".to_string());
                        show_error_dialog("Create failed", &err);
                    }
                }
            });
        }
    };

    let kpi_view = kpis.read().as_ref().map(kpi_cards);
    let caption = format!(
        "{} · on-time {} ({})",
        status_line(snapshot.status, snapshot.total_count),
        format_percent(page_kpis.on_time_rate.value),
        scope_label(page_kpis.on_time_rate.scope),
    );

    rsx! {
        {kpi_view}
        div { style: "display: flex; gap: 8px; align-items: center; margin-bottom: 8px; flex-wrap: wrap;",
            {search_box(&list, search, delay)}
            select {
                value: "{status_facet}",
                onchange: on_facet,
                option { value: "", "All statuses" }
                for option_status in ShipmentStatus::ALL {
                    option { key: "{option_status.as_str()}", value: "{option_status.as_str()}", "{option_status.label()}" }
                }
            }
            button { onclick: on_import, "Import CSV" }
        }
        div { style: "display: flex; gap: 6px; align-items: center; margin-bottom: 8px; flex-wrap: wrap;",
            input { placeholder: "Tracking #", value: "{tracking}", oninput: move |evt| tracking.set(evt.value()) }
            input { placeholder: "Client", value: "{client}", oninput: move |evt| client.set(evt.value()) }
            input { placeholder: "Origin", value: "{origin}", oninput: move |evt| origin.set(evt.value()) }
            input { placeholder: "Destination", value: "{destination}", oninput: move |evt| destination.set(evt.value()) }
            input { placeholder: "Cost", value: "{cost}", oninput: move |evt| cost.set(evt.value()) }
            button { onclick: on_create, "New shipment" }
        }
        table { style: "border-collapse: collapse; width: 100%;",
            thead { {sortable_headers(&list, &snapshot.sort, &SHIPMENT_COLUMNS)} }
            tbody {
                for shipment in snapshot.items.iter() {
                    tr { key: "{shipment.id}",
                        td { style: body_cell_style(), "{shipment.tracking_number}" }
                        td { style: body_cell_style(), "{shipment.client_name}" }
                        td { style: body_cell_style(), "{shipment.origin}" }
                        td { style: body_cell_style(), "{shipment.destination}" }
                        td { style: body_cell_style(), "{driver_label(shipment)}" }
                        td { style: body_cell_style(), "{shipment.status.label()}" }
                        td { style: body_cell_style(), "{format_money(shipment.cost)}" }
                        td { style: body_cell_style(), "{format_timestamp(shipment.created_at)}" }
                        td { style: body_cell_style(), "{format_timestamp(shipment.due_at)}" }
                    }
                }
            }
        }
        {pager(&list, snapshot.page_number, snapshot.total_pages, caption)}
    }
}

#[component]
fn ClientsPage() -> Element {
    let config = use_context::<AppConfig>();
    let list = use_list_query::<Client>("clients", SortPolicy::MultiColumn);
    let search = use_signal(SearchInput::default);

    let _ = list.revision.read();
    let snapshot = list.controller.snapshot();
    let delay = Duration::from_millis(config.search_debounce_ms);
    let caption = status_line(snapshot.status, snapshot.total_count);

    rsx! {
        div { style: "display: flex; gap: 8px; align-items: center; margin-bottom: 8px;",
            {search_box(&list, search, delay)}
            button { onclick: spawn_reset_sort::<Client>(&list.controller), "Reset sort" }
            span { style: "color: #666;", "Click headers to add sort keys" }
        }
        table { style: "border-collapse: collapse; width: 100%;",
            thead { {sortable_headers(&list, &snapshot.sort, &CLIENT_COLUMNS)} }
            tbody {
                for client in snapshot.items.iter() {
                    tr { key: "{client.id}",
                        td { style: body_cell_style(), "{client.company_name}" }
                        td { style: body_cell_style(), "{client.contact_name}" }
                        td { style: body_cell_style(), "{client.email}" }
                        td { style: body_cell_style(), "{client.city}" }
                        td { style: body_cell_style(), "{format_timestamp(client.created_at)}" }
                    }
                }
            }
        }
        {pager(&list, snapshot.page_number, snapshot.total_pages, caption)}
    }
}

#[component]
fn DriversPage() -> Element {
    let config = use_context::<AppConfig>();
    let list = use_list_query::<Driver>("drivers", SortPolicy::SingleColumn);
    let search = use_signal(SearchInput::default);
    let mut active_facet = use_signal(String::new);

    let _ = list.revision.read();
    let snapshot = list.controller.snapshot();
    let delay = Duration::from_millis(config.search_debounce_ms);
    let caption = status_line(snapshot.status, snapshot.total_count);

    let on_facet = {
        let controller = list.controller.clone();
        move |evt: FormEvent| {
            let value = evt.value();
            active_facet.set(value.clone());
            let controller = controller.clone();
            spawn(async move {
                controller.set_facets(facet(DriverField::Active, value)).await;
            });
        }
    };

    rsx! {
        div { style: "display: flex; gap: 8px; align-items: center; margin-bottom: 8px;",
            {search_box(&list, search, delay)}
            select {
                value: "{active_facet}",
                onchange: on_facet,
                option { value: "", "All drivers" }
                option { value: "1", "Active" }
                option { value: "0", "Inactive" }
            }
        }
        table { style: "border-collapse: collapse; width: 100%;",
            thead { {sortable_headers(&list, &snapshot.sort, &DRIVER_COLUMNS)} }
            tbody {
                for driver in snapshot.items.iter() {
                    tr { key: "{driver.id}",
                        td { style: body_cell_style(), "{driver.full_name}" }
                        td { style: body_cell_style(), "{driver.license_number}" }
                        td { style: body_cell_style(), "{driver.home_base}" }
                        td { style: body_cell_style(), if driver.active { "Yes" } else { "No" } }
                        td { style: body_cell_style(), "{driver.rating:.1}" }
                        td { style: body_cell_style(), "{format_timestamp(driver.created_at)}" }
                    }
                }
            }
        }
        {pager(&list, snapshot.page_number, snapshot.total_pages, caption)}
    }
}
