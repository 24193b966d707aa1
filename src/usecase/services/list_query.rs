use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::domain::entities::query::{
    next_status, FieldName, FilterExpression, PageRequest, QueryResult, QueryStatus, SortSpec,
    StatusEvent, DEFAULT_PAGE_SIZE,
};
use crate::usecase::filter::{build_filter, with_facets};
use crate::usecase::pagination::{
    clamp_to_last_page, reset_to_first_page, to_page_request, total_pages, FIRST_PAGE,
};
use crate::usecase::ports::source::{FetchedPage, PageSource, SourceError};
use crate::usecase::services::feedback::FeedbackBinding;
use crate::usecase::sort::{replace_sort, toggle_field, SortPolicy};

/// What a presenter renders from one list query.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T, F> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub status: QueryStatus,
    pub search_term: String,
    pub facets: Vec<(F, String)>,
    pub sort: SortSpec<F>,
    pub page_number: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub last_error: Option<String>,
}

struct ControllerState<T, F> {
    search_term: String,
    fields: Vec<F>,
    facets: Vec<(F, String)>,
    sort: SortSpec<F>,
    policy: SortPolicy,
    page_number: u64,
    page_size: u64,
    result: QueryResult<T>,
    has_result: bool,
    status: QueryStatus,
    last_error: Option<SourceError>,
    issued: u64,
    disposed: bool,
}

struct Ticket<F> {
    seq: u64,
    filter: FilterExpression<F>,
    sort: SortSpec<F>,
    page: PageRequest,
}

enum Completion {
    Applied,
    Discarded,
    OutOfRange,
}

/// Search/sort/page controller over one paginated collection.
///
/// Intents mutate the parameters and issue the request synchronously; the
/// returned future only waits for the response and must be driven (awaited
/// or spawned) or the controller stays `Loading`. Only the newest issued
/// request is ever applied.
pub struct ListQueryController<T, F: FieldName> {
    source: Rc<dyn PageSource<T, F>>,
    feedback: Option<FeedbackBinding>,
    state: RefCell<ControllerState<T, F>>,
    listener: RefCell<Option<Box<dyn Fn()>>>,
}

impl<T: Clone, F: FieldName> ListQueryController<T, F> {
    pub fn new(source: Rc<dyn PageSource<T, F>>) -> Self {
        Self {
            source,
            feedback: None,
            state: RefCell::new(ControllerState {
                search_term: String::new(),
                fields: F::searchable().to_vec(),
                facets: Vec::new(),
                sort: F::default_sort(),
                policy: SortPolicy::default(),
                page_number: FIRST_PAGE,
                page_size: DEFAULT_PAGE_SIZE,
                result: QueryResult::default(),
                has_result: false,
                status: QueryStatus::Idle,
                last_error: None,
                issued: 0,
                disposed: false,
            }),
            listener: RefCell::new(None),
        }
    }

    pub fn with_feedback(mut self, binding: FeedbackBinding) -> Self {
        self.feedback = Some(binding);
        self
    }

    pub fn with_page_size(self, page_size: u64) -> Self {
        self.state.borrow_mut().page_size = page_size.max(1);
        self
    }

    pub fn with_sort_policy(self, policy: SortPolicy) -> Self {
        self.state.borrow_mut().policy = policy;
        self
    }

    /// Called after every state change, e.g. to schedule a re-render.
    pub fn on_change(&self, listener: impl Fn() + 'static) {
        *self.listener.borrow_mut() = Some(Box::new(listener));
    }

    pub fn snapshot(&self) -> ListSnapshot<T, F> {
        let state = self.state.borrow();
        ListSnapshot {
            items: state.result.items.clone(),
            total_count: state.result.total_count,
            status: state.status,
            search_term: state.search_term.clone(),
            facets: state.facets.clone(),
            sort: state.sort.clone(),
            page_number: state.page_number,
            page_size: state.page_size,
            total_pages: total_pages(state.result.total_count, state.page_size),
            last_error: state.last_error.as_ref().map(ToString::to_string),
        }
    }

    /// Runs `f` over the loaded page without cloning it.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.state.borrow().result.items)
    }

    pub fn status(&self) -> QueryStatus {
        self.state.borrow().status
    }

    /// Re-applies the current status to the feedback binding. Safe to call on
    /// every render: an error already alerted is not alerted again.
    pub fn sync_feedback(&self) {
        let Some(binding) = &self.feedback else {
            return;
        };
        let (status, message) = {
            let state = self.state.borrow();
            (state.status, state.last_error.as_ref().map(ToString::to_string))
        };
        binding.observe(status, message.as_deref());
    }

    pub fn set_search_term(&self, term: &str) -> impl Future<Output = ()> + '_ {
        let changed = {
            let mut state = self.state.borrow_mut();
            let term = term.trim();
            if state.search_term == term {
                false
            } else {
                state.search_term = term.to_string();
                state.page_number = reset_to_first_page();
                true
            }
        };
        let ticket = if changed { self.issue() } else { None };
        self.drive(ticket)
    }

    pub fn set_facets(&self, facets: Vec<(F, String)>) -> impl Future<Output = ()> + '_ {
        let changed = {
            let mut state = self.state.borrow_mut();
            if state.facets == facets {
                false
            } else {
                state.facets = facets;
                state.page_number = reset_to_first_page();
                true
            }
        };
        let ticket = if changed { self.issue() } else { None };
        self.drive(ticket)
    }

    pub fn set_sort(&self, sort: SortSpec<F>) -> impl Future<Output = ()> + '_ {
        let changed = {
            let mut state = self.state.borrow_mut();
            let sort = replace_sort(sort);
            if state.sort == sort {
                false
            } else {
                state.sort = sort;
                state.page_number = reset_to_first_page();
                true
            }
        };
        let ticket = if changed { self.issue() } else { None };
        self.drive(ticket)
    }

    pub fn toggle_sort(&self, field: F) -> impl Future<Output = ()> + '_ {
        {
            let mut state = self.state.borrow_mut();
            state.sort = toggle_field(&state.sort, field, state.policy);
            state.page_number = reset_to_first_page();
        }
        let ticket = self.issue();
        self.drive(ticket)
    }

    pub fn set_page(&self, page_number: u64) -> impl Future<Output = ()> + '_ {
        let changed = {
            let mut state = self.state.borrow_mut();
            let target = if state.has_result {
                let pages = total_pages(state.result.total_count, state.page_size);
                clamp_to_last_page(page_number, pages)
            } else {
                page_number.max(FIRST_PAGE)
            };
            if target == state.page_number && state.has_result {
                false
            } else {
                state.page_number = target;
                true
            }
        };
        let ticket = if changed { self.issue() } else { None };
        self.drive(ticket)
    }

    /// Re-issues the current parameters unchanged, e.g. after a mutation.
    pub fn refetch(&self) -> impl Future<Output = ()> + '_ {
        let ticket = self.issue();
        self.drive(ticket)
    }

    /// Unmount: later responses are dropped and the loading indicator released.
    pub fn dispose(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.result = QueryResult::default();
        }
        if let Some(binding) = &self.feedback {
            binding.release();
        }
        debug!("list query disposed");
    }

    fn issue(&self) -> Option<Ticket<F>> {
        let ticket = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return None;
            }
            state.issued += 1;
            state.status = next_status(state.status, StatusEvent::Issued);
            let filter = with_facets(build_filter(&state.search_term, &state.fields), &state.facets);
            Ticket {
                seq: state.issued,
                filter,
                sort: state.sort.clone(),
                page: to_page_request(state.page_number, state.page_size),
            }
        };
        debug!(
            seq = ticket.seq,
            clauses = ticket.filter.clause_count(),
            offset = ticket.page.offset,
            limit = ticket.page.limit,
            "issuing list query"
        );
        self.notify();
        Some(ticket)
    }

    async fn drive(&self, ticket: Option<Ticket<F>>) {
        let Some(mut ticket) = ticket else {
            return;
        };
        loop {
            let outcome = self
                .source
                .fetch_page(&ticket.filter, &ticket.sort, ticket.page.offset, ticket.page.limit)
                .await;
            match self.complete(ticket.seq, outcome) {
                Completion::Applied | Completion::Discarded => return,
                Completion::OutOfRange => match self.issue() {
                    Some(next) => ticket = next,
                    None => return,
                },
            }
        }
    }

    fn complete(&self, seq: u64, outcome: Result<FetchedPage<T>, SourceError>) -> Completion {
        {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                debug!(seq, "response after dispose discarded");
                return Completion::Discarded;
            }
            if seq != state.issued {
                debug!(seq, latest = state.issued, "stale response discarded");
                return Completion::Discarded;
            }

            match outcome {
                Ok(page) => {
                    let total_count = page.count.max(page.items.len() as u64);
                    let pages = total_pages(total_count, state.page_size);
                    if page.items.is_empty() && state.page_number > FIRST_PAGE && state.page_number > pages {
                        let clamped = clamp_to_last_page(state.page_number, pages);
                        info!(from = state.page_number, to = clamped, "page out of range, clamping");
                        state.page_number = clamped;
                        return Completion::OutOfRange;
                    }
                    state.result = QueryResult {
                        items: page.items,
                        total_count,
                    };
                    state.has_result = true;
                    state.last_error = None;
                    state.status = next_status(state.status, StatusEvent::Resolved);
                    debug!(seq, total_count, "list query applied");
                }
                Err(err) => {
                    warn!(seq, error = %err, "list query failed");
                    state.last_error = Some(err);
                    state.status = next_status(state.status, StatusEvent::Rejected);
                }
            }
        }
        self.notify();
        Completion::Applied
    }

    fn notify(&self) {
        self.sync_feedback();
        if let Some(listener) = self.listener.borrow().as_ref() {
            listener();
        }
    }
}

/// Pages through the whole filtered collection, `batch` items at a time.
/// Used for metrics that describe the collection rather than the visible page.
pub async fn collect_all<T, F>(
    source: &dyn PageSource<T, F>,
    filter: &FilterExpression<F>,
    sort: &SortSpec<F>,
    batch: u64,
) -> Result<Vec<T>, SourceError> {
    let batch = batch.max(1);
    let mut items = Vec::new();
    loop {
        let page = source
            .fetch_page(filter, sort, items.len() as u64, batch)
            .await?;
        let fetched = page.items.len();
        items.extend(page.items);
        if fetched == 0 || items.len() as u64 >= page.count {
            return Ok(items);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::{HashMap, VecDeque};

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use super::*;
    use crate::domain::entities::shipment::ShipmentField;
    use crate::usecase::ports::feedback::Severity;
    use crate::usecase::services::feedback::tests::RecordingPort;
    use crate::usecase::services::feedback::FeedbackHub;

    type Outcome = Result<FetchedPage<u32>, SourceError>;

    #[derive(Default)]
    struct ScriptedSource {
        responses: RefCell<VecDeque<Outcome>>,
        requests: RefCell<Vec<(FilterExpression<ShipmentField>, u64, u64)>>,
    }

    impl ScriptedSource {
        fn push(&self, outcome: Outcome) {
            self.responses.borrow_mut().push_back(outcome);
        }

        fn last_offset(&self) -> Option<u64> {
            self.requests.borrow().last().map(|(_, offset, _)| *offset)
        }
    }

    #[async_trait(?Send)]
    impl PageSource<u32, ShipmentField> for ScriptedSource {
        async fn fetch_page(
            &self,
            filter: &FilterExpression<ShipmentField>,
            _sort: &SortSpec<ShipmentField>,
            offset: u64,
            limit: u64,
        ) -> Result<FetchedPage<u32>, SourceError> {
            self.requests.borrow_mut().push((filter.clone(), offset, limit));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(SourceError::Unavailable("no scripted response".to_string())))
        }
    }

    /// Responses released by the test, keyed by request offset.
    #[derive(Default)]
    struct GatedSource {
        gates: RefCell<HashMap<u64, oneshot::Receiver<Outcome>>>,
    }

    impl GatedSource {
        fn gate(&self, offset: u64) -> oneshot::Sender<Outcome> {
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().insert(offset, rx);
            tx
        }
    }

    #[async_trait(?Send)]
    impl PageSource<u32, ShipmentField> for GatedSource {
        async fn fetch_page(
            &self,
            _filter: &FilterExpression<ShipmentField>,
            _sort: &SortSpec<ShipmentField>,
            offset: u64,
            _limit: u64,
        ) -> Result<FetchedPage<u32>, SourceError> {
            let gate = self.gates.borrow_mut().remove(&offset);
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(SourceError::Unavailable("gate dropped".to_string()))),
                None => Err(SourceError::Unavailable("no gate".to_string())),
            }
        }
    }

    fn page(items: Vec<u32>, count: u64) -> Outcome {
        Ok(FetchedPage { items, count })
    }

    fn controller(source: Rc<dyn PageSource<u32, ShipmentField>>) -> ListQueryController<u32, ShipmentField> {
        ListQueryController::new(source)
    }

    #[tokio::test]
    async fn first_page_of_47_reports_five_pages() {
        let source = Rc::new(ScriptedSource::default());
        source.push(page((0..10).collect(), 47));
        let port = Rc::new(RecordingPort::default());
        let hub = FeedbackHub::new(port.clone());
        let ctrl = controller(source.clone()).with_feedback(hub.bind("shipments"));

        ctrl.refetch().await;

        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.items.len(), 10);
        assert_eq!(snapshot.total_pages, 5);
        assert_eq!(snapshot.status, QueryStatus::Success);
        assert!(!port.loading_visible());
        assert_eq!(hub.loading_count(), 0);
        assert_eq!(source.requests.borrow()[0].0, FilterExpression::All);
    }

    #[tokio::test]
    async fn new_search_term_returns_to_first_page() {
        let source = Rc::new(ScriptedSource::default());
        source.push(page((0..10).collect(), 47));
        source.push(page((20..30).collect(), 47));
        source.push(page(vec![1, 2], 2));
        let ctrl = controller(source.clone());

        ctrl.refetch().await;
        ctrl.set_page(3).await;
        assert_eq!(source.last_offset(), Some(20));

        ctrl.set_search_term("Chicago").await;

        assert_eq!(source.last_offset(), Some(0));
        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.page_number, 1);
        assert_eq!(snapshot.search_term, "Chicago");
        assert_eq!(
            source.requests.borrow()[2].0.clause_count(),
            ShipmentField::searchable().len()
        );
    }

    #[tokio::test]
    async fn sort_and_facet_changes_reset_page() {
        let source = Rc::new(ScriptedSource::default());
        source.push(page((0..10).collect(), 47));
        source.push(page((20..30).collect(), 47));
        source.push(page((0..10).collect(), 47));
        source.push(page((20..30).collect(), 47));
        source.push(page(vec![7], 1));
        let ctrl = controller(source.clone());

        ctrl.refetch().await;
        ctrl.set_page(3).await;
        ctrl.toggle_sort(ShipmentField::Cost).await;
        assert_eq!(source.last_offset(), Some(0));

        ctrl.set_page(3).await;
        ctrl.set_facets(vec![(ShipmentField::Status, "delayed".to_string())]).await;
        assert_eq!(source.last_offset(), Some(0));
        assert_eq!(ctrl.snapshot().items, vec![7]);
    }

    #[tokio::test]
    async fn page_beyond_total_is_clamped_before_fetch() {
        let source = Rc::new(ScriptedSource::default());
        source.push(page((0..10).collect(), 47));
        source.push(page((40..47).collect(), 47));
        let ctrl = controller(source.clone());

        ctrl.refetch().await;
        ctrl.set_page(9).await;

        assert_eq!(source.last_offset(), Some(40));
        assert_eq!(ctrl.snapshot().page_number, 5);
    }

    #[tokio::test]
    async fn huge_page_before_first_result_lands_on_last_page() {
        let source = Rc::new(ScriptedSource::default());
        source.push(page(Vec::new(), 47));
        source.push(page((40..47).collect(), 47));
        let ctrl = controller(source.clone());

        ctrl.set_page(u64::MAX).await;

        assert_eq!(source.requests.borrow()[0].1, u64::MAX);
        assert_eq!(source.last_offset(), Some(40));
        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.page_number, 5);
        assert_eq!(snapshot.items.len(), 7);
    }

    #[tokio::test]
    async fn shrunken_collection_clamps_and_refetches() {
        let source = Rc::new(ScriptedSource::default());
        source.push(page((0..10).collect(), 47));
        source.push(page((40..47).collect(), 47));
        source.push(page(Vec::new(), 12));
        source.push(page(vec![10, 11], 12));
        let ctrl = controller(source.clone());

        ctrl.refetch().await;
        ctrl.set_page(5).await;
        ctrl.refetch().await;

        assert_eq!(source.last_offset(), Some(10));
        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.page_number, 2);
        assert_eq!(snapshot.items, vec![10, 11]);
        assert_eq!(snapshot.status, QueryStatus::Success);
    }

    #[tokio::test]
    async fn last_issued_request_wins() {
        let source = Rc::new(GatedSource::default());
        let ctrl = controller(source.clone());
        let slow = source.gate(10);
        let middle = source.gate(20);
        let fast = source.gate(30);

        let r1 = ctrl.set_page(2);
        let r2 = ctrl.set_page(3);
        let r3 = ctrl.set_page(4);
        let script = async {
            slow.send(page(vec![1], 47)).ok();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            let snapshot = ctrl.snapshot();
            assert_eq!(snapshot.status, QueryStatus::Loading);
            assert!(snapshot.items.is_empty(), "stale R1 must not be shown");

            fast.send(page(vec![3], 47)).ok();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            middle.send(page(vec![2], 47)).ok();
        };

        tokio::join!(r1, r2, r3, script);

        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.items, vec![3]);
        assert_eq!(snapshot.page_number, 4);
        assert_eq!(snapshot.status, QueryStatus::Success);
    }

    #[tokio::test]
    async fn failure_alerts_once_and_keeps_items() {
        let source = Rc::new(ScriptedSource::default());
        source.push(page(vec![1, 2, 3], 3));
        source.push(Err(SourceError::Unavailable("network down".to_string())));
        let port = Rc::new(RecordingPort::default());
        let hub = FeedbackHub::new(port.clone());
        let ctrl = controller(source.clone()).with_feedback(hub.bind("shipments"));

        ctrl.refetch().await;
        ctrl.refetch().await;
        ctrl.sync_feedback();
        ctrl.sync_feedback();

        let alerts = port.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Error);
        assert_eq!(alerts[0].severity.as_str(), "error");
        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.status, QueryStatus::Error);
        assert_eq!(snapshot.items, vec![1, 2, 3]);
        assert_eq!(
            snapshot.last_error.as_deref(),
            Some("backend unavailable: network down")
        );
        assert!(!port.loading_visible());
    }

    #[tokio::test]
    async fn failure_without_prior_success_leaves_list_empty() {
        let source = Rc::new(ScriptedSource::default());
        source.push(Err(SourceError::Query("boom".to_string())));
        let ctrl = controller(source.clone());

        ctrl.refetch().await;

        let snapshot = ctrl.snapshot();
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.status, QueryStatus::Error);
    }

    #[tokio::test]
    async fn previous_page_stays_visible_while_loading() {
        let source = Rc::new(GatedSource::default());
        let ctrl = controller(source.clone());
        let first = source.gate(0);
        first.send(page(vec![1, 2], 20)).ok();
        ctrl.refetch().await;

        let second = source.gate(10);
        let pending = ctrl.set_page(2);
        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.status, QueryStatus::Loading);
        assert_eq!(snapshot.items, vec![1, 2]);

        second.send(page(vec![3, 4], 20)).ok();
        pending.await;
        assert_eq!(ctrl.snapshot().items, vec![3, 4]);
    }

    #[tokio::test]
    async fn responses_after_dispose_are_suppressed() {
        let source = Rc::new(GatedSource::default());
        let port = Rc::new(RecordingPort::default());
        let hub = FeedbackHub::new(port.clone());
        let ctrl = controller(source.clone()).with_feedback(hub.bind("shipments"));
        let gate = source.gate(0);

        let pending = ctrl.refetch();
        assert_eq!(hub.loading_count(), 1);
        ctrl.dispose();
        gate.send(page(vec![1], 1)).ok();
        pending.await;

        assert!(ctrl.snapshot().items.is_empty());
        assert_eq!(hub.loading_count(), 0);
        assert!(!port.loading_visible());
    }

    #[tokio::test]
    async fn unchanged_parameters_do_not_refetch() {
        let source = Rc::new(ScriptedSource::default());
        source.push(page(vec![1], 1));
        let ctrl = controller(source.clone());
        let notified = Rc::new(Cell::new(0));
        let counter = notified.clone();
        ctrl.on_change(move || counter.set(counter.get() + 1));

        ctrl.refetch().await;
        ctrl.set_search_term("   ").await;
        ctrl.set_page(1).await;
        ctrl.set_sort(ShipmentField::default_sort()).await;

        assert_eq!(source.requests.borrow().len(), 1);
        assert_eq!(notified.get(), 2, "one change for issue, one for apply");
    }

    #[tokio::test]
    async fn collect_all_walks_every_page() {
        let source = ScriptedSource::default();
        source.push(page(vec![1, 2], 5));
        source.push(page(vec![3, 4], 5));
        source.push(page(vec![5], 5));

        let items = collect_all(&source, &FilterExpression::All, &ShipmentField::default_sort(), 2)
            .await
            .expect("collect_all should succeed");

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        let offsets: Vec<u64> = source.requests.borrow().iter().map(|(_, o, _)| *o).collect();
        assert_eq!(offsets, vec![0, 2, 4]);
    }
}
