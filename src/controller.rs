//! Debounced airport lookup for a single input field.
//!
//! Keystrokes bump a per-field generation and (re)arm the debounce slot. When
//! the slot fires, the lookup runs as its own task tagged with the generation
//! it was started for; anything it wants to show is dropped unless that
//! generation is still current. Successful results are cached by exact query
//! text for the lifetime of the controller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::AirportSource;
use crate::debounce::DelaySlot;
use crate::error::FlightError;
use crate::model::Airport;
use crate::query::MIN_QUERY_LEN;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please wait a moment and try again.";
pub const GENERIC_ERROR_MESSAGE: &str = "Error loading airports. Please try again.";
pub const NO_RESULTS_MESSAGE: &str = "No airports found";

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub debounce: Duration,
    pub retry_delay: Duration,
    pub retries: u32,
    pub min_query_len: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            retry_delay: Duration::from_millis(2000),
            retries: 1,
            min_query_len: MIN_QUERY_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Results(Vec<Airport>),
    Empty,
    Failed { message: String, rate_limited: bool },
}

impl Outcome {
    fn from_airports(airports: Vec<Airport>) -> Self {
        if airports.is_empty() {
            Self::Empty
        } else {
            Self::Results(airports)
        }
    }

    fn from_error(err: &FlightError) -> Self {
        let rate_limited = err.is_rate_limited();
        let message = if rate_limited {
            RATE_LIMIT_MESSAGE
        } else {
            GENERIC_ERROR_MESSAGE
        };
        Self::Failed {
            message: message.to_string(),
            rate_limited,
        }
    }

    /// The line a caller shows when there is no list to render.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Results(_) => None,
            Self::Empty => Some(NO_RESULTS_MESSAGE),
            Self::Failed { message, .. } => Some(message.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldState {
    Idle,
    Pending { query: String },
    Querying { query: String },
    Displaying { query: String, outcome: Outcome },
}

impl FieldState {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Pending { .. } | Self::Querying { .. })
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Pending { query } | Self::Querying { query } | Self::Displaying { query, .. } => {
                Some(query.as_str())
            }
        }
    }

    pub fn results(&self) -> &[Airport] {
        match self {
            Self::Displaying {
                outcome: Outcome::Results(airports),
                ..
            } => airports.as_slice(),
            _ => &[],
        }
    }
}

#[derive(Default)]
struct Shared {
    generation: u64,
    cache: HashMap<String, Vec<Airport>>,
    // last list put in front of the user; stays up while they keep typing
    shown: Vec<Airport>,
}

struct Field {
    shared: Mutex<Shared>,
    state: watch::Sender<FieldState>,
}

impl Field {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new generation and shows `state` in the same critical section,
    /// so a lookup finishing concurrently cannot slip in between.
    fn advance(&self, state: FieldState) -> u64 {
        let mut shared = self.lock();
        shared.generation += 1;
        if state == FieldState::Idle {
            shared.shown.clear();
        }
        self.state.send_replace(state);
        shared.generation
    }

    fn publish(&self, generation: u64, state: FieldState) -> bool {
        let mut shared = self.lock();
        if shared.generation != generation {
            debug!(generation, current = shared.generation, "dropping stale lookup result");
            return false;
        }
        if let FieldState::Displaying { .. } = state {
            shared.shown = state.results().to_vec();
        }
        self.state.send_replace(state);
        true
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }
}

pub struct SearchController<S: AirportSource + 'static> {
    source: Arc<S>,
    config: ControllerConfig,
    field: Arc<Field>,
    debounce: DelaySlot,
    input: String,
}

impl<S: AirportSource + 'static> SearchController<S> {
    pub fn new(source: Arc<S>, config: ControllerConfig) -> Self {
        let (state, _) = watch::channel(FieldState::Idle);
        Self {
            source,
            config,
            field: Arc::new(Field {
                shared: Mutex::new(Shared::default()),
                state,
            }),
            debounce: DelaySlot::new(),
            input: String::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FieldState> {
        self.field.state.subscribe()
    }

    pub fn state(&self) -> FieldState {
        self.field.state.borrow().clone()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn generation(&self) -> u64 {
        self.field.lock().generation
    }

    pub fn is_cached(&self, query: &str) -> bool {
        self.field.lock().cache.contains_key(query)
    }

    /// Feeds the full current text of the field. Must be called from within
    /// a tokio runtime.
    pub fn on_input(&mut self, text: &str) {
        self.input = text.to_string();

        if text.chars().count() < self.config.min_query_len {
            self.debounce.cancel();
            self.field.advance(FieldState::Idle);
            return;
        }

        let generation = self.field.advance(FieldState::Pending {
            query: text.to_string(),
        });

        let lookup = Lookup {
            source: self.source.clone(),
            field: self.field.clone(),
            query: text.to_string(),
            generation,
            retries: self.config.retries,
            retry_delay: self.config.retry_delay,
        };

        // the lookup outlives the slot: later keystrokes cancel the timer,
        // never a request already on the wire
        self.debounce.schedule(self.config.debounce, async move {
            tokio::spawn(lookup.run());
        });
    }

    /// Results currently in front of the user. A newer query that is still
    /// pending or in flight does not hide them.
    pub fn shown(&self) -> Vec<Airport> {
        self.field.lock().shown.clone()
    }

    /// Picks the `index`th shown result and returns the field to Idle,
    /// abandoning any pending or in-flight lookup. Returns `None`, leaving
    /// the field as it was, when there is no such result.
    pub fn select(&mut self, index: usize) -> Option<Airport> {
        let airport = self.field.lock().shown.get(index).cloned()?;
        self.reset();
        Some(airport)
    }

    pub fn clear(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.input.clear();
        self.debounce.cancel();
        self.field.advance(FieldState::Idle);
    }

    /// Resolves once the field is neither waiting out the debounce window nor
    /// waiting on the network.
    pub async fn settle(&self) -> FieldState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_busy()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}

struct Lookup<S: AirportSource> {
    source: Arc<S>,
    field: Arc<Field>,
    query: String,
    generation: u64,
    retries: u32,
    retry_delay: Duration,
}

impl<S: AirportSource> Lookup<S> {
    async fn run(self) {
        let cached = self.field.lock().cache.get(&self.query).cloned();
        if let Some(airports) = cached {
            debug!(query = %self.query, "airport lookup served from cache");
            self.field.publish(
                self.generation,
                FieldState::Displaying {
                    query: self.query.clone(),
                    outcome: Outcome::from_airports(airports),
                },
            );
            return;
        }

        let started = self.field.publish(
            self.generation,
            FieldState::Querying {
                query: self.query.clone(),
            },
        );
        if !started {
            return;
        }

        let mut attempt = 0;
        let result = loop {
            match self.source.search_airport(&self.query).await {
                Ok(airports) => break Ok(airports),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(query = %self.query, error = %e, attempt, "airport lookup failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                    if !self.field.is_current(self.generation) {
                        return;
                    }
                }
                Err(e) => break Err(e),
            }
        };

        let outcome = match result {
            Ok(airports) => {
                self.field
                    .lock()
                    .cache
                    .insert(self.query.clone(), airports.clone());
                Outcome::from_airports(airports)
            }
            Err(e) => {
                warn!(query = %self.query, error = %e, "airport lookup failed");
                Outcome::from_error(&e)
            }
        };

        self.field.publish(
            self.generation,
            FieldState::Displaying {
                query: self.query,
                outcome,
            },
        );
    }
}
