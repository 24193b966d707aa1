use std::rc::Rc;

use dioxus::prelude::*;

use crate::config::AppConfig;
use crate::infra::sqlite::records::SqlRecord;
use crate::infra::sqlite::source::SqliteSource;
use crate::usecase::ports::feedback::{Alert, FeedbackPort};
use crate::usecase::ports::source::PageSource;
use crate::usecase::services::feedback::FeedbackHub;
use crate::usecase::services::list_query::ListQueryController;
use crate::usecase::sort::SortPolicy;

/// Global loading bar and toast, backed by signals read by the app shell.
#[derive(Clone, Copy)]
pub struct SignalFeedback {
    pub loading: Signal<bool>,
    pub alert: Signal<Option<Alert>>,
}

impl FeedbackPort for SignalFeedback {
    fn show_loading(&self) {
        let mut loading = self.loading;
        loading.set(true);
    }

    fn hide_loading(&self) {
        let mut loading = self.loading;
        loading.set(false);
    }

    fn show_alert(&self, alert: Alert) {
        let mut slot = self.alert;
        slot.set(Some(alert));
    }
}

/// Generation ticket for the toast auto-hide timer. A timer only clears the
/// toast if no newer alert or manual close happened since it was armed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlertTimer {
    generation: u64,
}

impl AlertTimer {
    pub fn arm(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.generation
    }
}

#[derive(Clone)]
pub struct AppState {
    pub feedback: SignalFeedback,
    pub hub: FeedbackHub,
    pub status: Signal<String>,
    pub alert_timer: Signal<AlertTimer>,
}

impl AppState {
    pub fn new() -> Self {
        let feedback = SignalFeedback {
            loading: use_signal(|| false),
            alert: use_signal(|| None::<Alert>),
        };
        let hub = use_hook(|| FeedbackHub::new(Rc::new(feedback)));
        Self {
            feedback,
            hub,
            status: use_signal(|| "Ready".to_string()),
            alert_timer: use_signal(AlertTimer::default),
        }
    }
}

/// A presenter's controller plus the signal bumped on every state change.
pub struct ListHandle<E: SqlRecord> {
    pub controller: Rc<ListQueryController<E, E::Field>>,
    pub revision: Signal<u64>,
}

impl<E: SqlRecord> Clone for ListHandle<E> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            revision: self.revision,
        }
    }
}

/// One controller per mounted presenter; the first page is fetched on mount
/// and later responses are dropped once the presenter unmounts.
pub fn use_list_query<E>(label: &'static str, policy: SortPolicy) -> ListHandle<E>
where
    E: SqlRecord + Clone,
{
    let hub = use_context::<AppState>().hub;
    let config = use_context::<AppConfig>();
    let revision = use_signal(|| 0_u64);

    let controller = use_hook(move || {
        let source: Rc<dyn PageSource<E, E::Field>> =
            Rc::new(SqliteSource::<E>::new(config.db_path.clone()));
        let controller = Rc::new(
            ListQueryController::new(source)
                .with_feedback(hub.bind(label))
                .with_page_size(config.page_size)
                .with_sort_policy(policy),
        );
        controller.on_change(move || {
            let mut revision = revision;
            *revision.write() += 1;
        });

        let initial = controller.clone();
        spawn(async move {
            initial.refetch().await;
        });
        controller
    });

    let for_drop = controller.clone();
    use_drop(move || for_drop.dispose());

    ListHandle {
        controller,
        revision,
    }
}
