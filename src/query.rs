use serde::{Deserialize, Serialize};

use crate::error::FlightError;

/// Shortest airport query that is worth sending upstream.
pub const MIN_QUERY_LEN: usize = 3;
pub const MAX_PASSENGERS: u32 = 9;

pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_LEN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn from_str_loose(s: &str) -> Result<Self, FlightError> {
        match s {
            "economy" => Ok(Self::Economy),
            "premium-economy" | "premium_economy" => Ok(Self::PremiumEconomy),
            "business" => Ok(Self::Business),
            "first" => Ok(Self::First),
            _ => Err(FlightError::Validation(format!("invalid cabin class: {s}"))),
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::PremiumEconomy => "premium_economy",
            Self::Business => "business",
            Self::First => "first",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlightSearchParams {
    pub origin_sky_id: String,
    pub destination_sky_id: String,
    pub origin_entity_id: String,
    pub destination_entity_id: String,
    pub date: String,
    pub return_date: Option<String>,
    pub adults: Option<u32>,
    pub cabin_class: Option<CabinClass>,
    pub sort_by: Option<String>,
    pub childrens: Option<u32>,
    pub infants: Option<u32>,
    pub currency: Option<String>,
    pub market: Option<String>,
    pub country_code: Option<String>,
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if (year.is_multiple_of(4) && !year.is_multiple_of(100)) || year.is_multiple_of(400) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

pub fn validate_date(date: &str) -> Result<(), FlightError> {
    let invalid = || FlightError::InvalidDate(date.to_string());

    let parts: Vec<&str> = date.split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
        return Err(invalid());
    }
    let year: u32 = parts[0].parse().map_err(|_| invalid())?;
    let month: u32 = parts[1].parse().map_err(|_| invalid())?;
    let day: u32 = parts[2].parse().map_err(|_| invalid())?;

    if year < 2000 || !(1..=12).contains(&month) {
        return Err(invalid());
    }

    if day < 1 || day > days_in_month(year, month) {
        return Err(invalid());
    }

    Ok(())
}

fn require(value: &str, flag: &str) -> Result<(), FlightError> {
    if value.trim().is_empty() {
        return Err(FlightError::Validation(format!("{flag} is required")));
    }
    Ok(())
}

impl FlightSearchParams {
    /// Checks user-entered search input before it becomes a request. Front
    /// ends call this; `SkyClient::search_flights` itself sends whatever it
    /// is given.
    pub fn validate(&self) -> Result<(), FlightError> {
        require(&self.origin_sky_id, "--from")?;
        require(&self.destination_sky_id, "--to")?;
        require(&self.origin_entity_id, "--from-entity")?;
        require(&self.destination_entity_id, "--to-entity")?;

        validate_date(&self.date)?;
        if let Some(ref ret) = self.return_date {
            validate_date(ret)?;
            // zero-padded ISO dates order lexicographically
            if ret.as_str() < self.date.as_str() {
                return Err(FlightError::Validation(format!(
                    "return date {ret} is before departure date {}",
                    self.date
                )));
            }
        }

        let adults = self.adults.unwrap_or(1);
        let total = adults
            .checked_add(self.childrens.unwrap_or(0))
            .and_then(|n| n.checked_add(self.infants.unwrap_or(0)))
            .filter(|&n| n <= MAX_PASSENGERS);

        if total.is_none() {
            return Err(FlightError::Validation(format!(
                "total passengers exceeds maximum of {MAX_PASSENGERS}"
            )));
        }

        if adults == 0 {
            return Err(FlightError::Validation(
                "at least one adult passenger required".into(),
            ));
        }

        if self.infants.unwrap_or(0) > adults {
            return Err(FlightError::Validation(
                "infants cannot exceed number of adults".into(),
            ));
        }

        Ok(())
    }

    /// Query-string pairs in upstream field order; unset optionals are omitted.
    pub fn to_url_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("originSkyId".to_string(), self.origin_sky_id.clone()),
            ("destinationSkyId".to_string(), self.destination_sky_id.clone()),
            ("originEntityId".to_string(), self.origin_entity_id.clone()),
            ("destinationEntityId".to_string(), self.destination_entity_id.clone()),
            ("date".to_string(), self.date.clone()),
        ];

        let mut push = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                params.push((key.to_string(), v));
            }
        };

        push("returnDate", self.return_date.clone());
        push("adults", self.adults.map(|n| n.to_string()));
        push("cabinClass", self.cabin_class.map(|c| c.as_param().to_string()));
        push("sortBy", self.sort_by.clone());
        push("childrens", self.childrens.map(|n| n.to_string()));
        push("infants", self.infants.map(|n| n.to_string()));
        push("currency", self.currency.clone());
        push("market", self.market.clone());
        push("countryCode", self.country_code.clone());

        params
    }
}
