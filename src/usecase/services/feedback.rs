use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::domain::entities::query::QueryStatus;
use crate::usecase::ports::feedback::{Alert, FeedbackPort};

/// Shared state behind every binding of one screen (or the whole process).
///
/// The loading indicator is the OR of all bound controllers, kept as an
/// explicit count. The alert channel has a single slot.
#[derive(Clone)]
pub struct FeedbackHub {
    inner: Rc<HubInner>,
}

struct HubInner {
    port: Rc<dyn FeedbackPort>,
    loading: Cell<usize>,
    alert_open: Cell<bool>,
}

impl FeedbackHub {
    pub fn new(port: Rc<dyn FeedbackPort>) -> Self {
        Self {
            inner: Rc::new(HubInner {
                port,
                loading: Cell::new(0),
                alert_open: Cell::new(false),
            }),
        }
    }

    pub fn bind(&self, label: impl Into<String>) -> FeedbackBinding {
        FeedbackBinding {
            hub: self.clone(),
            label: label.into(),
            loading: Cell::new(false),
            alerted: Cell::new(false),
            released: Cell::new(false),
        }
    }

    #[cfg(test)]
    pub fn loading_count(&self) -> usize {
        self.inner.loading.get()
    }

    /// Shows an alert that is not tied to a list query, e.g. a mutation
    /// result. Shares the single alert slot.
    pub fn notify(&self, alert: Alert) {
        self.raise(alert);
    }

    /// Frees the alert slot once the toast is gone.
    pub fn dismiss_alert(&self) {
        self.inner.alert_open.set(false);
    }

    fn begin_loading(&self) {
        let count = self.inner.loading.get() + 1;
        self.inner.loading.set(count);
        if count == 1 {
            self.inner.port.show_loading();
        }
    }

    fn end_loading(&self) {
        let count = self.inner.loading.get().saturating_sub(1);
        self.inner.loading.set(count);
        if count == 0 {
            self.inner.port.hide_loading();
        }
    }

    fn raise(&self, alert: Alert) {
        if self.inner.alert_open.get() {
            debug!(title = %alert.title, "alert slot busy, dropping alert");
            return;
        }
        self.inner.alert_open.set(true);
        self.inner.port.show_alert(alert);
    }
}

/// Per-controller view of the hub. `observe` is idempotent for a given
/// status, so it may be called on every render.
pub struct FeedbackBinding {
    hub: FeedbackHub,
    label: String,
    loading: Cell<bool>,
    alerted: Cell<bool>,
    released: Cell<bool>,
}

impl FeedbackBinding {
    pub fn observe(&self, status: QueryStatus, error_message: Option<&str>) {
        if self.released.get() {
            return;
        }

        let now_loading = status == QueryStatus::Loading;
        if now_loading != self.loading.get() {
            self.loading.set(now_loading);
            if now_loading {
                self.hub.begin_loading();
            } else {
                self.hub.end_loading();
            }
        }

        if status == QueryStatus::Error {
            if !self.alerted.replace(true) {
                self.hub.raise(Alert::error(
                    format!("Could not load {}", self.label),
                    error_message.unwrap_or("unknown error"),
                ));
            }
        } else {
            self.alerted.set(false);
        }
    }

    /// Detaches from the hub; an in-flight request stops counting as loading.
    pub fn release(&self) {
        if self.released.replace(true) {
            return;
        }
        if self.loading.replace(false) {
            self.hub.end_loading();
        }
    }
}

impl Drop for FeedbackBinding {
    fn drop(&mut self) {
        self.release();
    }
}
