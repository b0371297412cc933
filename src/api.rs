use async_trait::async_trait;
use tracing::debug;

use crate::error::FlightError;
use crate::fetch::SkyClient;
use crate::model::{Airport, FlightItinerary, PopularDestination};
use crate::parse;
use crate::query::FlightSearchParams;

/// Anything that can resolve free text into airports. The search controller
/// is written against this so it can run over the live client or a fake.
#[async_trait]
pub trait AirportSource: Send + Sync {
    async fn search_airport(&self, query: &str) -> Result<Vec<Airport>, FlightError>;
}

impl SkyClient {
    pub async fn search_airport(&self, query: &str) -> Result<Vec<Airport>, FlightError> {
        let params = vec![("query".to_string(), query.to_string())];
        let envelope = self.fetch_json("searchAirport", &params).await?;
        let airports = parse::parse_airports(&envelope);
        debug!(query, count = airports.len(), "airport search");
        Ok(airports)
    }

    pub async fn get_nearby_airports(&self, lat: f64, lng: f64) -> Result<Vec<Airport>, FlightError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(FlightError::Validation(format!(
                "coordinates out of range: lat {lat}, lng {lng}"
            )));
        }
        let params = vec![
            ("lat".to_string(), lat.to_string()),
            ("lng".to_string(), lng.to_string()),
        ];
        let envelope = self.fetch_json("getNearByAirports", &params).await?;
        Ok(parse::parse_nearby(&envelope))
    }

    pub async fn search_flights(
        &self,
        params: &FlightSearchParams,
    ) -> Result<Vec<FlightItinerary>, FlightError> {
        let envelope = self.fetch_json("searchFlights", &params.to_url_params()).await?;
        let itineraries = parse::parse_itineraries(&envelope);
        debug!(
            from = %params.origin_sky_id,
            to = %params.destination_sky_id,
            count = itineraries.len(),
            "flight search"
        );
        Ok(itineraries)
    }
}

#[async_trait]
impl AirportSource for SkyClient {
    async fn search_airport(&self, query: &str) -> Result<Vec<Airport>, FlightError> {
        SkyClient::search_airport(self, query).await
    }
}

const POPULAR: &[(&str, &str, &str, &str, &str, &str)] = &[
    (
        "New York",
        "New York",
        "United States",
        "JFK",
        "https://images.unsplash.com/photo-1538970272646-f61fabb3a8a2?q=80&w=1974&auto=format&fit=crop",
        "$199",
    ),
    (
        "Paris",
        "Paris",
        "France",
        "CDG",
        "https://images.unsplash.com/photo-1502602898657-3e91760cbb34?q=80&w=2073&auto=format&fit=crop",
        "$399",
    ),
    (
        "Tokyo",
        "Tokyo",
        "Japan",
        "NRT",
        "https://images.unsplash.com/photo-1533929736458-ca588d08c8be?q=80&w=2070&auto=format&fit=crop",
        "$599",
    ),
    (
        "London",
        "London",
        "United Kingdom",
        "LHR",
        "https://images.unsplash.com/photo-1513635269975-59663e0ac1ad?q=80&w=2070&auto=format&fit=crop",
        "$349",
    ),
    (
        "Dubai",
        "Dubai",
        "United Arab Emirates",
        "DXB",
        "https://images.unsplash.com/photo-1512453979798-5ea266f8880c?q=80&w=2070&auto=format&fit=crop",
        "$499",
    ),
    (
        "Singapore",
        "Singapore",
        "Singapore",
        "SIN",
        "https://images.unsplash.com/photo-1525625293386-3f8f99389edd?q=80&w=2070&auto=format&fit=crop",
        "$449",
    ),
];

/// Placeholder destination list; served locally, never hits the network.
pub async fn get_popular_destinations() -> Vec<PopularDestination> {
    POPULAR
        .iter()
        .map(|&(name, city, country, code, image, price)| PopularDestination {
            name: name.to_string(),
            city: city.to_string(),
            country: country.to_string(),
            airport_code: code.to_string(),
            image: image.to_string(),
            price: price.to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Price,
    Duration,
}

impl SortKey {
    pub fn from_str_loose(s: &str) -> Result<Self, FlightError> {
        match s {
            "price" => Ok(Self::Price),
            "duration" => Ok(Self::Duration),
            _ => Err(FlightError::Validation(format!("invalid sort key: {s}"))),
        }
    }
}

/// Stable ascending sort. A missing price decodes as 0; NaN sorts last.
pub fn sort_itineraries(itineraries: &mut [FlightItinerary], key: SortKey) {
    match key {
        SortKey::Price => itineraries.sort_by(|a, b| a.price.amount.total_cmp(&b.price.amount)),
        SortKey::Duration => itineraries.sort_by_key(|it| it.duration),
    }
}

/// Applies the optional local ordering, then keeps the first `top` results.
pub fn rank_itineraries(
    itineraries: &mut Vec<FlightItinerary>,
    key: Option<SortKey>,
    top: Option<usize>,
) {
    if let Some(key) = key {
        sort_itineraries(itineraries, key);
    }
    if let Some(n) = top {
        itineraries.truncate(n);
    }
}
