use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{Airport, FlightItinerary};

fn get_path<'a>(val: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(val, |cur, key| cur.get(key))
}

/// Decodes the list found at `path`, degrading to an empty list when any
/// step is missing, null, or the wrong shape.
pub fn list_at<T: DeserializeOwned>(envelope: &Value, path: &[&str]) -> Vec<T> {
    let Some(node) = get_path(envelope, path) else {
        debug!(path = %path.join("."), "field absent in response, using empty list");
        return Vec::new();
    };

    if node.is_null() {
        return Vec::new();
    }

    match serde_json::from_value::<Vec<T>>(node.clone()) {
        Ok(items) => items,
        Err(e) => {
            warn!(path = %path.join("."), error = %e, "malformed list in response, using empty list");
            Vec::new()
        }
    }
}

pub fn parse_airports(envelope: &Value) -> Vec<Airport> {
    list_at(envelope, &["data"])
}

pub fn parse_nearby(envelope: &Value) -> Vec<Airport> {
    list_at(envelope, &["data", "nearby"])
}

pub fn parse_itineraries(envelope: &Value) -> Vec<FlightItinerary> {
    list_at(envelope, &["data", "itineraries"])
}
