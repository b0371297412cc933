use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use skyfare::api::AirportSource;
use skyfare::controller::{
    ControllerConfig, FieldState, Outcome, SearchController, GENERIC_ERROR_MESSAGE,
    NO_RESULTS_MESSAGE, RATE_LIMIT_MESSAGE,
};
use skyfare::error::FlightError;
use skyfare::model::Airport;

#[derive(Default)]
struct FakeSource {
    calls: Mutex<Vec<String>>,
    latency: HashMap<String, Duration>,
    failures: Mutex<HashMap<String, VecDeque<FlightError>>>,
    empty: Vec<String>,
}

impl FakeSource {
    fn with_latency(mut self, query: &str, ms: u64) -> Self {
        self.latency
            .insert(query.to_string(), Duration::from_millis(ms));
        self
    }

    fn failing(self, query: &str, errors: Vec<FlightError>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(query.to_string(), errors.into());
        self
    }

    fn with_no_results(mut self, query: &str) -> Self {
        self.empty.push(query.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn airport_for(query: &str) -> Airport {
    Airport::from_route(&query.to_uppercase(), "1000", query, "Somewhere")
}

#[async_trait]
impl AirportSource for FakeSource {
    async fn search_airport(&self, query: &str) -> Result<Vec<Airport>, FlightError> {
        self.calls.lock().unwrap().push(query.to_string());

        if let Some(delay) = self.latency.get(query) {
            tokio::time::sleep(*delay).await;
        }

        let failure = {
            let mut failures = self.failures.lock().unwrap();
            failures.get_mut(query).and_then(|q| q.pop_front())
        };
        if let Some(err) = failure {
            return Err(err);
        }

        if self.empty.iter().any(|q| q == query) {
            return Ok(Vec::new());
        }
        Ok(vec![airport_for(query)])
    }
}

fn controller(source: FakeSource) -> (Arc<FakeSource>, SearchController<FakeSource>) {
    let source = Arc::new(source);
    let controller = SearchController::new(source.clone(), ControllerConfig::default());
    (source, controller)
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn displayed_query(state: &FieldState) -> Option<&str> {
    match state {
        FieldState::Displaying { query, .. } => Some(query.as_str()),
        _ => None,
    }
}

#[tokio::test(start_paused = true)]
async fn short_queries_never_hit_the_network() {
    let (source, mut c) = controller(FakeSource::default());

    c.on_input("N");
    sleep_ms(100).await;
    c.on_input("NY");
    sleep_ms(3000).await;

    assert!(source.calls().is_empty());
    assert_eq!(c.state(), FieldState::Idle);
    assert!(c.shown().is_empty());
}

#[tokio::test(start_paused = true)]
async fn three_characters_issue_one_request() {
    let (source, mut c) = controller(FakeSource::default());

    c.on_input("New");
    let state = c.settle().await;

    assert_eq!(source.calls(), vec!["New"]);
    assert_eq!(displayed_query(&state), Some("New"));
    assert_eq!(state.results().len(), 1);
    assert_eq!(state.results()[0].sky_id, "NEW");
}

#[tokio::test(start_paused = true)]
async fn rapid_keystrokes_collapse_into_last_query() {
    let (source, mut c) = controller(FakeSource::default());

    for text in ["Lon", "Lond", "Londo", "London"] {
        c.on_input(text);
        sleep_ms(100).await;
    }
    sleep_ms(1000).await;

    assert_eq!(source.calls(), vec!["London"]);
    assert_eq!(displayed_query(&c.state()), Some("London"));
}

#[tokio::test(start_paused = true)]
async fn waits_out_the_debounce_window() {
    let (source, mut c) = controller(FakeSource::default());

    c.on_input("Paris");
    sleep_ms(499).await;
    assert!(source.calls().is_empty());
    assert_eq!(
        c.state(),
        FieldState::Pending {
            query: "Paris".into()
        }
    );

    sleep_ms(2).await;
    assert_eq!(source.calls(), vec!["Paris"]);
    assert_eq!(displayed_query(&c.state()), Some("Paris"));
}

#[tokio::test(start_paused = true)]
async fn repeated_query_is_served_from_cache() {
    let (source, mut c) = controller(FakeSource::default());

    c.on_input("Paris");
    c.settle().await;
    c.clear();
    c.on_input("Paris");
    let state = c.settle().await;

    assert_eq!(source.calls(), vec!["Paris"]);
    assert_eq!(displayed_query(&state), Some("Paris"));
    assert!(c.is_cached("Paris"));
    assert!(!c.is_cached("paris"));
}

#[tokio::test(start_paused = true)]
async fn cache_key_is_exact_text() {
    let (source, mut c) = controller(FakeSource::default());

    c.on_input("Paris");
    c.settle().await;
    c.on_input("paris");
    c.settle().await;
    c.on_input("Paris ");
    c.settle().await;

    assert_eq!(source.calls(), vec!["Paris", "paris", "Paris "]);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_gets_its_own_message() {
    let source = FakeSource::default()
        .failing("Par", vec![FlightError::RateLimited, FlightError::RateLimited]);
    let (source, mut c) = controller(source);

    c.on_input("Par");
    let state = c.settle().await;

    assert_eq!(
        state,
        FieldState::Displaying {
            query: "Par".into(),
            outcome: Outcome::Failed {
                message: RATE_LIMIT_MESSAGE.into(),
                rate_limited: true,
            },
        }
    );
    // one retry after the first failure
    assert_eq!(source.calls(), vec!["Par", "Par"]);
    assert!(!c.is_cached("Par"));
}

#[tokio::test(start_paused = true)]
async fn other_failures_get_generic_message() {
    let source = FakeSource::default().failing(
        "Oslo",
        vec![FlightError::HttpStatus(500), FlightError::Timeout],
    );
    let (_source, mut c) = controller(source);

    c.on_input("Oslo");
    let state = c.settle().await;

    match state {
        FieldState::Displaying { outcome, .. } => {
            assert_eq!(outcome.message(), Some(GENERIC_ERROR_MESSAGE));
            assert!(matches!(outcome, Outcome::Failed { rate_limited: false, .. }));
        }
        other => panic!("expected Displaying, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn retry_after_delay_can_recover() {
    let source = FakeSource::default().failing("Rome", vec![FlightError::HttpStatus(502)]);
    let (source, mut c) = controller(source);

    c.on_input("Rome");
    sleep_ms(600).await;
    assert_eq!(
        c.state(),
        FieldState::Querying {
            query: "Rome".into()
        }
    );
    assert_eq!(source.calls().len(), 1);

    sleep_ms(1800).await;
    assert_eq!(source.calls().len(), 1, "retry waits the full delay");

    sleep_ms(200).await;
    assert_eq!(source.calls().len(), 2);
    assert_eq!(c.state().results().len(), 1);
    assert!(c.is_cached("Rome"));
}

#[tokio::test(start_paused = true)]
async fn empty_results_show_no_results_message() {
    let (_source, mut c) = controller(FakeSource::default().with_no_results("Xyzzy"));

    c.on_input("Xyzzy");
    let state = c.settle().await;

    match state {
        FieldState::Displaying { outcome, .. } => {
            assert_eq!(outcome, Outcome::Empty);
            assert_eq!(outcome.message(), Some(NO_RESULTS_MESSAGE));
        }
        other => panic!("expected Displaying, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn superseded_response_is_discarded() {
    let (source, mut c) = controller(FakeSource::default().with_latency("Lon", 1000));

    c.on_input("Lon");
    sleep_ms(600).await;
    assert_eq!(
        c.state(),
        FieldState::Querying {
            query: "Lon".into()
        }
    );

    c.on_input("Lond");
    let state = c.settle().await;
    assert_eq!(displayed_query(&state), Some("Lond"));

    // "Lon" lands at t=1500, after "Lond" was shown
    sleep_ms(2000).await;
    assert_eq!(displayed_query(&c.state()), Some("Lond"));
    assert_eq!(c.shown()[0].sky_id, "LOND");
    assert_eq!(source.calls(), vec!["Lon", "Lond"]);
    // the late answer still warms the cache
    assert!(c.is_cached("Lon"));
}

#[tokio::test(start_paused = true)]
async fn clearing_hides_results_but_lets_request_finish() {
    let (source, mut c) = controller(FakeSource::default().with_latency("Rome", 1000));

    c.on_input("Rome");
    sleep_ms(600).await;
    c.on_input("Ro");
    assert_eq!(c.state(), FieldState::Idle);

    sleep_ms(2000).await;
    assert_eq!(c.state(), FieldState::Idle);
    assert!(c.shown().is_empty());
    assert!(c.is_cached("Rome"));

    c.on_input("Rome");
    c.settle().await;
    assert_eq!(source.calls(), vec!["Rome"]);
}

#[tokio::test(start_paused = true)]
async fn select_returns_field_to_idle() {
    let (_source, mut c) = controller(FakeSource::default());

    c.on_input("Paris");
    c.settle().await;
    let generation = c.generation();

    let picked = c.select(0).expect("one result shown");
    assert_eq!(picked.sky_id, "PARIS");
    assert_eq!(c.state(), FieldState::Idle);
    assert_eq!(c.input(), "");
    assert!(c.generation() > generation);

    assert!(c.select(0).is_none());
}

#[tokio::test(start_paused = true)]
async fn select_out_of_range_changes_nothing() {
    let (_source, mut c) = controller(FakeSource::default());

    c.on_input("Paris");
    let before = c.settle().await;

    assert!(c.select(3).is_none());
    assert_eq!(c.state(), before);
    assert_eq!(c.input(), "Paris");
}

#[tokio::test(start_paused = true)]
async fn select_while_typing_abandons_pending_lookup() {
    let (source, mut c) = controller(FakeSource::default());

    c.on_input("Paris");
    c.settle().await;
    c.on_input("Parisx");

    let picked = c.select(0).expect("earlier results still shown");
    assert_eq!(picked.sky_id, "PARIS");

    sleep_ms(3000).await;
    assert_eq!(c.state(), FieldState::Idle);
    assert_eq!(source.calls(), vec!["Paris"]);
}

#[tokio::test(start_paused = true)]
async fn select_while_in_flight_ignores_late_response() {
    let (source, mut c) = controller(FakeSource::default().with_latency("Berlinx", 1000));

    c.on_input("Berlin");
    c.settle().await;
    c.on_input("Berlinx");
    sleep_ms(600).await;
    assert!(c.state().is_busy());

    let picked = c.select(0).expect("Berlin results still shown");
    assert_eq!(picked.sky_id, "BERLIN");

    sleep_ms(2000).await;
    assert_eq!(c.state(), FieldState::Idle);
    assert_eq!(source.calls(), vec!["Berlin", "Berlinx"]);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_each_phase() {
    let (_source, mut c) = controller(FakeSource::default().with_latency("Madrid", 100));
    let mut rx = c.subscribe();

    c.on_input("Madrid");
    rx.changed().await.unwrap();
    assert!(matches!(*rx.borrow_and_update(), FieldState::Pending { .. }));

    rx.changed().await.unwrap();
    assert!(matches!(*rx.borrow_and_update(), FieldState::Querying { .. }));

    rx.changed().await.unwrap();
    assert_eq!(displayed_query(&rx.borrow_and_update()), Some("Madrid"));
}
