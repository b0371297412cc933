pub mod api;
pub mod app;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod mcp;
pub mod model;
pub mod parse;
pub mod prefs;
pub mod query;
pub mod storage;
pub mod table;

use error::FlightError;
use fetch::{FetchOptions, SkyClient};
use model::Airport;

/// One-shot airport lookup with a fresh client. Queries shorter than
/// [`query::MIN_QUERY_LEN`] resolve to no airports without touching the network.
pub async fn search_airport(query: &str, options: FetchOptions) -> Result<Vec<Airport>, FlightError> {
    if !query::is_searchable(query) {
        return Ok(Vec::new());
    }
    SkyClient::new(options)?.search_airport(query).await
}
