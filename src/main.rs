use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use skyfare::api::{self, SortKey};
use skyfare::app::App;
use skyfare::controller::{ControllerConfig, FieldState, Outcome, SearchController};
use skyfare::error::{FlightError, StoreError};
use skyfare::fetch::{FetchOptions, SkyClient, BASE_URL};
use skyfare::model::Airport;
use skyfare::query::{self, CabinClass, FlightSearchParams};
use skyfare::storage::FileStore;
use skyfare::table;

#[derive(Parser)]
#[command(
    name = "skyfare",
    about = "Search airports and flights from the terminal",
    version,
    after_help = "\
Examples:
  skyfare airports Paris
  skyfare flights --from JFK --from-entity 95565058 --to CDG --to-entity 95565041 -d 2026-04-01
  skyfare nearby --lat 40.71 --lng -74.00
  skyfare favorite --from JFK --from-entity 95565058 --to CDG --to-entity 95565041
  skyfare lookup

Set RAPIDAPI_KEY to your Sky Scrapper API key."
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "RAPIDAPI_KEY",
        hide_env_values = true,
        default_value = "",
        value_name = "KEY",
        help = "RapidAPI key for the Sky Scrapper API"
    )]
    api_key: String,

    #[arg(
        long,
        global = true,
        env = "SKYFARE_BASE_URL",
        default_value = BASE_URL,
        value_name = "URL",
        help = "Flight API base URL"
    )]
    base_url: String,

    #[arg(
        long,
        global = true,
        env = "SKYFARE_DATA_DIR",
        value_name = "DIR",
        help = "Where recent searches and favorites are stored"
    )]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "URL", help = "HTTP or SOCKS5 proxy")]
    proxy: Option<String>,

    #[arg(
        long,
        global = true,
        default_value = "30",
        value_name = "SECS",
        help = "Request timeout"
    )]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(about = "Look up airports and cities by name")]
    Airports(AirportsArgs),
    #[command(about = "List airports near a coordinate")]
    Nearby(NearbyArgs),
    #[command(
        about = "Search flight itineraries",
        after_help = "\
Examples:
  One-way:      skyfare flights --from JFK --from-entity 95565058 --to CDG --to-entity 95565041 -d 2026-04-01
  Round-trip:   skyfare flights ... -d 2026-04-01 --return-date 2026-04-10
  Business:     skyfare flights ... --cabin business --adults 2
  Fastest 3:    skyfare flights ... --sort duration --top 3
  JSON output:  skyfare flights ... --json --pretty"
    )]
    Flights(FlightsArgs),
    #[command(about = "Show popular destinations")]
    Popular(OutputArgs),
    #[command(about = "Show recent searches")]
    Recent(OutputArgs),
    #[command(about = "Show favorite routes")]
    Favorites(OutputArgs),
    #[command(about = "Add or remove a favorite route")]
    Favorite(RouteArgs),
    #[command(
        about = "Interactive airport lookup",
        long_about = "Reads lines from stdin; each line replaces the search text.\n\
            Lookups are debounced and need at least 3 characters.\n\
            Type :N to pick result N, :clear to reset, :q to quit."
    )]
    Lookup,
    #[command(about = "Start MCP server for AI agents (stdio transport)")]
    Mcp,
}

#[derive(clap::Args)]
struct OutputArgs {
    #[arg(long, help = "Output as JSON")]
    json: bool,

    #[arg(long, help = "Output as pretty-printed JSON")]
    pretty: bool,
}

impl OutputArgs {
    fn is_json(&self) -> bool {
        self.json || self.pretty
    }
}

#[derive(clap::Args)]
struct AirportsArgs {
    #[arg(value_name = "QUERY", help = "Airport or city name (3+ characters)")]
    query: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
struct NearbyArgs {
    #[arg(long, allow_hyphen_values = true, value_name = "DEG", help = "Latitude")]
    lat: f64,

    #[arg(long, allow_hyphen_values = true, value_name = "DEG", help = "Longitude")]
    lng: f64,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
struct RouteArgs {
    #[arg(short, long, value_name = "SKY_ID", help = "Origin sky id (e.g. JFK)")]
    from: String,

    #[arg(long, value_name = "ID", help = "Origin entity id")]
    from_entity: String,

    #[arg(long, value_name = "NAME", help = "Origin display name")]
    from_name: Option<String>,

    #[arg(short, long, value_name = "SKY_ID", help = "Destination sky id (e.g. CDG)")]
    to: String,

    #[arg(long, value_name = "ID", help = "Destination entity id")]
    to_entity: String,

    #[arg(long, value_name = "NAME", help = "Destination display name")]
    to_name: Option<String>,
}

impl RouteArgs {
    fn airports(&self) -> (Airport, Airport) {
        let origin = Airport::from_route(
            &self.from.to_uppercase(),
            &self.from_entity,
            self.from_name.as_deref().unwrap_or("Origin Airport"),
            "",
        );
        let destination = Airport::from_route(
            &self.to.to_uppercase(),
            &self.to_entity,
            self.to_name.as_deref().unwrap_or("Destination Airport"),
            "",
        );
        (origin, destination)
    }
}

#[derive(clap::Args)]
struct FlightsArgs {
    #[command(flatten)]
    route: RouteArgs,

    #[arg(short, long, value_name = "YYYY-MM-DD", help = "Departure date")]
    date: String,

    #[arg(long, value_name = "YYYY-MM-DD", help = "Return date (round-trip)")]
    return_date: Option<String>,

    #[arg(long, value_name = "N", help = "Number of adult passengers")]
    adults: Option<u32>,

    #[arg(long, value_name = "N", help = "Number of child passengers")]
    children: Option<u32>,

    #[arg(long, value_name = "N", help = "Number of infants")]
    infants: Option<u32>,

    #[arg(
        long,
        value_name = "CLASS",
        help = "Cabin class [economy, premium-economy, business, first]"
    )]
    cabin: Option<String>,

    #[arg(long, value_name = "KEY", help = "Upstream ranking (passed through, e.g. best)")]
    sort_by: Option<String>,

    #[arg(
        long,
        default_value = "price",
        value_name = "KEY",
        help = "Local ordering [price, duration]"
    )]
    sort: String,

    #[arg(long, value_name = "CODE", help = "Currency code (e.g. USD, EUR)")]
    currency: Option<String>,

    #[arg(long, value_name = "CODE", help = "Market (e.g. en-US)")]
    market: Option<String>,

    #[arg(long, value_name = "CODE", help = "Country code (e.g. US)")]
    country: Option<String>,

    #[arg(long, value_name = "N", help = "Show only the first N results after sorting")]
    top: Option<usize>,

    #[command(flatten)]
    output: OutputArgs,
}

fn error_code(err: &FlightError) -> i32 {
    match err {
        FlightError::InvalidDate(_) | FlightError::Validation(_) => 2,
        FlightError::Timeout
        | FlightError::ConnectionFailed(_)
        | FlightError::DnsResolution(_)
        | FlightError::TlsError(_)
        | FlightError::ProxyError(_) => 3,
        FlightError::RateLimited => 4,
        FlightError::HttpStatus(_) => 5,
        FlightError::InvalidResponse(_) => 6,
    }
}

fn error_kind(err: &FlightError) -> &'static str {
    match err {
        FlightError::InvalidDate(_) => "invalid_date",
        FlightError::Validation(_) => "validation_error",
        FlightError::Timeout => "timeout",
        FlightError::ConnectionFailed(_) => "connection_failed",
        FlightError::DnsResolution(_) => "dns_error",
        FlightError::TlsError(_) => "tls_error",
        FlightError::ProxyError(_) => "proxy_error",
        FlightError::RateLimited => "rate_limited",
        FlightError::HttpStatus(_) => "http_error",
        FlightError::InvalidResponse(_) => "parse_error",
    }
}

fn fail(kind: &str, code: i32, message: &str, json_mode: bool) -> ! {
    if json_mode {
        let json = serde_json::json!({
            "error": {
                "kind": kind,
                "message": message,
            }
        });
        println!("{json}");
    } else {
        eprintln!("error: {message}");
    }
    process::exit(code);
}

fn die(err: &FlightError, json_mode: bool) -> ! {
    fail(error_kind(err), error_code(err), &err.to_string(), json_mode)
}

fn die_store(err: &StoreError, json_mode: bool) -> ! {
    fail("storage_error", 7, &err.to_string(), json_mode)
}

fn print_json<T: Serialize + ?Sized>(value: &T, output: &OutputArgs) {
    let encoded = if output.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match encoded {
        Ok(json) => println!("{json}"),
        Err(e) => fail("encode_error", 1, &e.to_string(), true),
    }
}

fn print_list<T: Serialize>(items: &[T], output: &OutputArgs, empty: &str, render: fn(&[T]) -> String) {
    if output.is_json() {
        print_json(items, output);
    } else if items.is_empty() {
        println!("{empty}");
    } else {
        println!("{}", render(items));
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("skyfare"))
        .unwrap_or_else(|| PathBuf::from(".skyfare"))
}

fn build_params(args: &FlightsArgs) -> Result<FlightSearchParams, FlightError> {
    let cabin_class = args
        .cabin
        .as_deref()
        .map(CabinClass::from_str_loose)
        .transpose()?;

    let params = FlightSearchParams {
        origin_sky_id: args.route.from.to_uppercase(),
        destination_sky_id: args.route.to.to_uppercase(),
        origin_entity_id: args.route.from_entity.clone(),
        destination_entity_id: args.route.to_entity.clone(),
        date: args.date.clone(),
        return_date: args.return_date.clone(),
        adults: args.adults,
        cabin_class,
        sort_by: args.sort_by.clone(),
        childrens: args.children,
        infants: args.infants,
        currency: args.currency.clone(),
        market: args.market.clone(),
        country_code: args.country.clone(),
    };
    params.validate()?;
    Ok(params)
}

fn print_field_state(state: &FieldState) {
    match state {
        FieldState::Idle | FieldState::Pending { .. } => {}
        FieldState::Querying { query } => eprintln!("searching \"{query}\"..."),
        FieldState::Displaying { outcome, .. } => match outcome {
            Outcome::Results(airports) => println!("{}", table::render_airports(airports)),
            other => println!("{}", other.message().unwrap_or_default()),
        },
    }
}

fn drain(rx: &mut watch::Receiver<FieldState>) {
    if rx.has_changed().unwrap_or(false) {
        let state = rx.borrow_and_update().clone();
        print_field_state(&state);
    }
}

enum Step {
    Continue,
    Quit,
}

async fn handle_line(
    line: &str,
    controller: &mut SearchController<SkyClient>,
    rx: &mut watch::Receiver<FieldState>,
) -> Step {
    let Some(command) = line.strip_prefix(':') else {
        controller.on_input(line);
        return Step::Continue;
    };

    match command.trim() {
        "q" | "quit" => Step::Quit,
        "clear" => {
            controller.clear();
            Step::Continue
        }
        n => {
            let Ok(index) = n.parse::<usize>() else {
                eprintln!("unknown command :{n}");
                return Step::Continue;
            };
            controller.settle().await;
            drain(rx);
            match index.checked_sub(1).and_then(|i| controller.select(i)) {
                Some(airport) => println!(
                    "Selected: {} ({} / {})",
                    airport.title(),
                    airport.sky_id,
                    airport.entity_id
                ),
                None => eprintln!("no result #{n}"),
            }
            Step::Continue
        }
    }
}

async fn run_lookup(client: SkyClient) {
    let mut controller = SearchController::new(Arc::new(client), ControllerConfig::default());
    let mut rx = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if let Step::Quit = handle_line(line.trim_end(), &mut controller, &mut rx).await {
                        break;
                    }
                }
                Ok(None) => {
                    stdin_open = false;
                    if !controller.state().is_busy() {
                        drain(&mut rx);
                        break;
                    }
                }
                Err(e) => fail("io_error", 1, &e.to_string(), false),
            },
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                print_field_state(&state);
                if !stdin_open && !state.is_busy() {
                    break;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let options = FetchOptions {
        base_url: cli.base_url.clone(),
        api_key: cli.api_key.clone(),
        proxy: cli.proxy.clone(),
        timeout: cli.timeout,
        ..Default::default()
    };

    let client = match SkyClient::new(options) {
        Ok(c) => c,
        Err(e) => die(&e, false),
    };

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let mut app = App::new(client, FileStore::new(data_dir));

    match cli.command {
        Commands::Mcp => {
            if let Err(e) = skyfare::mcp::run(app.client().clone()).await {
                fail("mcp_error", 1, &e.to_string(), false);
            }
        }
        Commands::Lookup => run_lookup(app.client().clone()).await,
        Commands::Popular(output) => {
            let destinations = api::get_popular_destinations().await;
            print_list(
                &destinations,
                &output,
                "No destinations.",
                table::render_destinations,
            );
        }
        Commands::Recent(output) => print_list(
            app.prefs().recent_searches(),
            &output,
            "No recent searches.",
            table::render_recent,
        ),
        Commands::Favorites(output) => print_list(
            app.prefs().favorites(),
            &output,
            "No favorites yet.",
            table::render_favorites,
        ),
        Commands::Favorite(route) => {
            let (origin, destination) = route.airports();
            match app.toggle_favorite(&origin, &destination) {
                Ok(true) => println!("★ {} → {} added to favorites", origin.sky_id, destination.sky_id),
                Ok(false) => println!("☆ {} → {} removed from favorites", origin.sky_id, destination.sky_id),
                Err(e) => die_store(&e, false),
            }
        }
        Commands::Airports(args) => {
            let json_mode = args.output.is_json();
            let airports = if query::is_searchable(&args.query) {
                match app.client().search_airport(&args.query).await {
                    Ok(a) => a,
                    Err(e) => die(&e, json_mode),
                }
            } else {
                Vec::new()
            };
            print_list(
                &airports,
                &args.output,
                "No airports found.",
                table::render_airports,
            );
        }
        Commands::Nearby(args) => {
            let json_mode = args.output.is_json();
            match app.client().get_nearby_airports(args.lat, args.lng).await {
                Ok(airports) => print_list(
                    &airports,
                    &args.output,
                    "No airports found.",
                    table::render_airports,
                ),
                Err(e) => die(&e, json_mode),
            }
        }
        Commands::Flights(args) => {
            let json_mode = args.output.is_json();
            let sort = match SortKey::from_str_loose(&args.sort) {
                Ok(s) => s,
                Err(e) => die(&e, json_mode),
            };
            let params = match build_params(&args) {
                Ok(p) => p,
                Err(e) => die(&e, json_mode),
            };
            let (origin, destination) = args.route.airports();

            match app.search_route(origin, destination, &params).await {
                Ok(mut itineraries) => {
                    api::rank_itineraries(&mut itineraries, Some(sort), args.top);
                    print_list(
                        &itineraries,
                        &args.output,
                        "No flights found.",
                        table::render_itineraries,
                    );
                }
                Err(e) => die(&e, json_mode),
            }
        }
    }
}
