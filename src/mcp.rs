use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{self, SortKey};
use crate::fetch::SkyClient;
use crate::query::{self, CabinClass, FlightSearchParams};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SearchAirportArgs {
    #[schemars(
        description = "Free-text airport or city name, at least 3 characters. Example: Paris, New York, LHR"
    )]
    query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct NearbyArgs {
    #[schemars(description = "Latitude in decimal degrees. Example: 40.7128")]
    lat: f64,
    #[schemars(description = "Longitude in decimal degrees. Example: -74.0060")]
    lng: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SearchFlightsArgs {
    #[schemars(description = "Origin skyId from search_airport. Example: JFK")]
    origin_sky_id: String,
    #[schemars(description = "Destination skyId from search_airport. Example: CDG")]
    destination_sky_id: String,
    #[schemars(description = "Origin entityId from search_airport. Example: 95565058")]
    origin_entity_id: String,
    #[schemars(description = "Destination entityId from search_airport. Example: 95565041")]
    destination_entity_id: String,
    #[schemars(description = "Departure date in YYYY-MM-DD format. Example: 2026-03-01")]
    date: String,
    #[schemars(description = "Return date in YYYY-MM-DD for round-trip")]
    return_date: Option<String>,
    #[schemars(description = "Adult passengers. Default: 1")]
    adults: Option<u32>,
    #[schemars(description = "Child passengers. Default: 0")]
    children: Option<u32>,
    #[schemars(description = "Infant passengers. Default: 0")]
    infants: Option<u32>,
    #[schemars(description = "One of: economy, premium-economy, business, first")]
    cabin_class: Option<String>,
    #[schemars(description = "Upstream ranking, passed through as-is. Example: best")]
    sort_by: Option<String>,
    #[schemars(description = "Currency code. Examples: USD, EUR")]
    currency: Option<String>,
    #[schemars(description = "Market code. Example: en-US")]
    market: Option<String>,
    #[schemars(description = "Country code. Example: US")]
    country_code: Option<String>,
    #[schemars(description = "Local ordering of results: price or duration")]
    sort: Option<String>,
    #[schemars(description = "Return only the first N results after sorting")]
    top: Option<usize>,
}

fn tool_error(msg: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.into())]))
}

fn tool_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
        Err(e) => tool_error(format!("failed to encode result: {e}")),
    }
}

#[derive(Debug, Clone)]
struct SkyfareMcp {
    client: SkyClient,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SkyfareMcp {
    fn new(client: SkyClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Look up airports and cities by name. Returns skyId and entityId for each match; pass them to search_flights. Queries shorter than 3 characters return an empty list."
    )]
    async fn search_airport(
        &self,
        Parameters(args): Parameters<SearchAirportArgs>,
    ) -> Result<CallToolResult, McpError> {
        if !query::is_searchable(&args.query) {
            return tool_json(&Vec::<crate::model::Airport>::new());
        }
        match self.client.search_airport(&args.query).await {
            Ok(airports) => tool_json(&airports),
            Err(e) => tool_error(e.to_string()),
        }
    }

    #[tool(description = "List airports near a coordinate.")]
    async fn nearby_airports(
        &self,
        Parameters(args): Parameters<NearbyArgs>,
    ) -> Result<CallToolResult, McpError> {
        match self.client.get_nearby_airports(args.lat, args.lng).await {
            Ok(airports) => tool_json(&airports),
            Err(e) => tool_error(e.to_string()),
        }
    }

    #[tool(
        description = "Search flight itineraries between two places. Get the sky and entity ids from search_airport first."
    )]
    async fn search_flights(
        &self,
        Parameters(args): Parameters<SearchFlightsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let cabin_class = match args
            .cabin_class
            .as_deref()
            .map(CabinClass::from_str_loose)
            .transpose()
        {
            Ok(c) => c,
            Err(e) => return tool_error(e.to_string()),
        };

        let sort = match args.sort.as_deref().map(SortKey::from_str_loose).transpose() {
            Ok(s) => s,
            Err(e) => return tool_error(e.to_string()),
        };

        let params = FlightSearchParams {
            origin_sky_id: args.origin_sky_id.to_uppercase(),
            destination_sky_id: args.destination_sky_id.to_uppercase(),
            origin_entity_id: args.origin_entity_id,
            destination_entity_id: args.destination_entity_id,
            date: args.date,
            return_date: args.return_date,
            adults: args.adults,
            cabin_class,
            sort_by: args.sort_by,
            childrens: args.children,
            infants: args.infants,
            currency: args.currency,
            market: args.market,
            country_code: args.country_code,
        };

        if let Err(e) = params.validate() {
            return tool_error(e.to_string());
        }

        match self.client.search_flights(&params).await {
            Ok(mut itineraries) => {
                api::rank_itineraries(&mut itineraries, sort, args.top);
                tool_json(&itineraries)
            }
            Err(e) => tool_error(e.to_string()),
        }
    }

    #[tool(description = "List a handful of popular destinations with indicative prices.")]
    async fn popular_destinations(&self) -> Result<CallToolResult, McpError> {
        tool_json(&api::get_popular_destinations().await)
    }
}

#[tool_handler]
impl ServerHandler for SkyfareMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "skyfare".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Flight search tools. Workflow: (1) search_airport for origin and destination to get skyId/entityId. (2) search_flights with those ids and a date.".into(),
            ),
        }
    }
}

pub async fn run(client: SkyClient) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("starting MCP server on stdio");
    let service = SkyfareMcp::new(client)
        .serve(rmcp::transport::stdio())
        .await?;
    service.waiting().await?;
    Ok(())
}
