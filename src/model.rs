use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Presentation {
    pub title: String,
    pub suggestion_title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelevantFlightParams {
    pub sky_id: String,
    pub entity_id: String,
    pub flight_place_type: String,
    pub localized_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelevantHotelParams {
    pub entity_id: String,
    pub entity_type: String,
    pub localized_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Navigation {
    pub entity_id: String,
    pub entity_type: String,
    pub localized_name: String,
    pub relevant_flight_params: RelevantFlightParams,
    pub relevant_hotel_params: RelevantHotelParams,
}

/// A place usable as a flight endpoint.
///
/// Identity is the `sky_id` alone: two airports compare equal (and hash the
/// same) whenever their `sky_id`s match, whatever their other fields hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Airport {
    pub sky_id: String,
    pub entity_id: String,
    pub presentation: Presentation,
    pub navigation: Navigation,
}

impl PartialEq for Airport {
    fn eq(&self, other: &Self) -> bool {
        self.sky_id == other.sky_id
    }
}

impl Eq for Airport {}

impl Hash for Airport {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sky_id.hash(state);
    }
}

impl Airport {
    /// Builds an airport from the bare route identifiers, mirroring them into
    /// the navigation block the way a search result would carry them.
    pub fn from_route(sky_id: &str, entity_id: &str, title: &str, subtitle: &str) -> Self {
        Self {
            sky_id: sky_id.to_string(),
            entity_id: entity_id.to_string(),
            presentation: Presentation {
                title: title.to_string(),
                suggestion_title: title.to_string(),
                subtitle: subtitle.to_string(),
            },
            navigation: Navigation {
                entity_id: entity_id.to_string(),
                entity_type: "AIRPORT".to_string(),
                localized_name: title.to_string(),
                relevant_flight_params: RelevantFlightParams {
                    sky_id: sky_id.to_string(),
                    entity_id: entity_id.to_string(),
                    flight_place_type: "AIRPORT".to_string(),
                    localized_name: title.to_string(),
                },
                relevant_hotel_params: RelevantHotelParams {
                    entity_id: entity_id.to_string(),
                    entity_type: "CITY".to_string(),
                    localized_name: subtitle.to_string(),
                },
            },
        }
    }

    pub fn title(&self) -> &str {
        if self.presentation.title.is_empty() {
            &self.sky_id
        } else {
            &self.presentation.title
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegAirport {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegEndpoint {
    pub airport: LegAirport,
    pub time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Airline {
    pub name: String,
    pub logo: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StopDetail {
    pub airport: LegAirport,
    pub duration: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightLeg {
    pub id: String,
    pub departure: LegEndpoint,
    pub arrival: LegEndpoint,
    pub duration: u32,
    pub airline: Airline,
    pub stops: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_details: Option<Vec<StopDetail>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightItinerary {
    pub id: String,
    pub price: Price,
    pub legs: Vec<FlightLeg>,
    pub agent: Agent,
    pub duration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularDestination {
    pub name: String,
    pub city: String,
    pub country: String,
    pub airport_code: String,
    pub image: String,
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSearch {
    pub origin: Option<Airport>,
    pub destination: Option<Airport>,
    pub date: Option<String>,
    pub return_date: Option<String>,
}

impl RecentSearch {
    pub fn is_route(&self, origin_sky_id: &str, destination_sky_id: &str) -> bool {
        self.origin.as_ref().map(|a| a.sky_id.as_str()) == Some(origin_sky_id)
            && self.destination.as_ref().map(|a| a.sky_id.as_str()) == Some(destination_sky_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub origin: Airport,
    pub destination: Airport,
}

impl Favorite {
    pub fn is_route(&self, origin_sky_id: &str, destination_sky_id: &str) -> bool {
        self.origin.sky_id == origin_sky_id && self.destination.sky_id == destination_sky_id
    }
}
