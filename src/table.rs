use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::model::{Airport, Favorite, FlightItinerary, PopularDestination, RecentSearch};

pub fn format_price(amount: f64, currency: &str) -> String {
    if amount <= 0.0 {
        return "—".to_string();
    }
    let p = format!("{amount:.0}");
    match currency {
        "USD" | "" => format!("${p}"),
        "EUR" => format!("€{p}"),
        "GBP" => format!("£{p}"),
        "JPY" | "CNY" => format!("¥{p}"),
        "KRW" => format!("₩{p}"),
        "INR" => format!("₹{p}"),
        "THB" => format!("฿{p}"),
        _ => format!("{p} {currency}"),
    }
}

pub fn format_duration(minutes: u32) -> String {
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

/// `HH:MM` from an ISO-8601 timestamp; anything else is shown as-is.
pub fn format_time(time: &str) -> String {
    time.split_once('T')
        .and_then(|(_, t)| t.get(..5))
        .filter(|hm| hm.as_bytes().get(2) == Some(&b':'))
        .map(String::from)
        .unwrap_or_else(|| time.to_string())
}

pub fn format_stops(stops: u32) -> String {
    match stops {
        0 => "Nonstop".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{n} stops"),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn render_airports(airports: &[Airport]) -> String {
    let mut table = new_table(vec!["#", "Sky ID", "Entity ID", "Name", "Location", "Type"]);

    for (i, airport) in airports.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            airport.sky_id.clone(),
            airport.entity_id.clone(),
            airport.title().to_string(),
            airport.presentation.subtitle.clone(),
            airport.navigation.entity_type.clone(),
        ]);
    }

    table.to_string()
}

pub fn render_itineraries(itineraries: &[FlightItinerary]) -> String {
    let mut table = new_table(vec![
        "Airlines", "Route", "Depart", "Arrive", "Duration", "Stops", "Agent", "Price",
    ]);

    for it in itineraries {
        let airlines: Vec<&str> = it.legs.iter().map(|l| l.airline.name.as_str()).collect();

        let route: Vec<String> = it
            .legs
            .iter()
            .map(|l| format!("{} → {}", l.departure.airport.code, l.arrival.airport.code))
            .collect();

        let depart = it
            .legs
            .first()
            .map(|l| format_time(&l.departure.time))
            .unwrap_or_else(|| "—".to_string());

        let arrive = it
            .legs
            .last()
            .map(|l| format_time(&l.arrival.time))
            .unwrap_or_else(|| "—".to_string());

        let stops: Vec<String> = it.legs.iter().map(|l| format_stops(l.stops)).collect();

        table.add_row(vec![
            airlines.join(", "),
            route.join("\n"),
            depart,
            arrive,
            format_duration(it.duration),
            stops.join("\n"),
            it.agent.name.clone(),
            format_price(it.price.amount, &it.price.currency),
        ]);
    }

    table.to_string()
}

pub fn render_destinations(destinations: &[PopularDestination]) -> String {
    let mut table = new_table(vec!["Destination", "Country", "Airport", "From"]);

    for d in destinations {
        table.add_row(vec![
            d.name.clone(),
            d.country.clone(),
            d.airport_code.clone(),
            d.price.clone(),
        ]);
    }

    table.to_string()
}

fn airport_cell(airport: Option<&Airport>) -> String {
    airport
        .map(|a| format!("{} ({})", a.title(), a.sky_id))
        .unwrap_or_else(|| "—".to_string())
}

pub fn render_recent(searches: &[RecentSearch]) -> String {
    let mut table = new_table(vec!["From", "To", "Date", "Return"]);

    for s in searches {
        table.add_row(vec![
            airport_cell(s.origin.as_ref()),
            airport_cell(s.destination.as_ref()),
            s.date.clone().unwrap_or_else(|| "—".to_string()),
            s.return_date.clone().unwrap_or_else(|| "—".to_string()),
        ]);
    }

    table.to_string()
}

pub fn render_favorites(favorites: &[Favorite]) -> String {
    let mut table = new_table(vec!["From", "To"]);

    for f in favorites {
        table.add_row(vec![
            airport_cell(Some(&f.origin)),
            airport_cell(Some(&f.destination)),
        ]);
    }

    table.to_string()
}
