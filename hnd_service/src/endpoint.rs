/// HTTP endpoint exposing station readings as Prometheus metrics
///
/// Endpoints:
/// - GET /metrics?station={pgnr} - Fetches and parses the station page,
///   returns its gauges in the Prometheus text format
/// - GET /health - Service health check
///
/// Each request is handled on a worker thread; requests share nothing but
/// the HTTP client and the resolved configuration.

use std::io::Cursor;
use std::sync::Arc;
use threadpool::ThreadPool;
use tracing::{error, info, warn};

use crate::civil_zone::CivilZone;
use crate::config::ServiceConfig;
use crate::ingest::hnd::{self, FetchError};
use crate::metrics;
use crate::parser::{self, warnings::TracingSink};

type HttpResponse = tiny_http::Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Health,
    /// `station` is `None` when the query parameter is missing or empty.
    Metrics { station: Option<String> },
    NotFound,
}

/// Maps a request line to a route.
pub fn route(method: &tiny_http::Method, url: &str) -> Route {
    if *method != tiny_http::Method::Get {
        return Route::NotFound;
    }

    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    };

    match path {
        "/health" => Route::Health,
        "/metrics" => Route::Metrics {
            station: query_param(query, "station").filter(|s| !s.is_empty()),
        },
        _ => Route::NotFound,
    }
}

/// Returns the decoded value of the first `key=value` pair named `key`.
fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| {
            let v = v.replace('+', " ");
            urlencoding::decode(&v)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(v)
        })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Shared, read-only state of the request handlers.
pub struct ServiceContext {
    pub client: reqwest::blocking::Client,
    pub base_url: String,
    pub zone: CivilZone,
}

impl ServiceContext {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: hnd::build_client(config.request_timeout())?,
            base_url: config.base_url.clone(),
            zone: config.civil_zone(),
        })
    }
}

/// Outcome of a metrics request, before it becomes an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsOutcome {
    Ok(String),
    MissingStation,
    GatewayError,
    NotFound,
    ServerError,
    ParserError,
}

impl MetricsOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            MetricsOutcome::Ok(_) => 200,
            MetricsOutcome::MissingStation => 400,
            MetricsOutcome::NotFound => 404,
            MetricsOutcome::ServerError => 500,
            MetricsOutcome::GatewayError | MetricsOutcome::ParserError => 502,
        }
    }
}

/// Maps a failed page fetch to the response the client sees.
pub fn fetch_outcome(err: &FetchError) -> MetricsOutcome {
    match err {
        FetchError::UnexpectedStatus(_) => MetricsOutcome::GatewayError,
        FetchError::StationNotFound => MetricsOutcome::NotFound,
        FetchError::Transport(_) => MetricsOutcome::ServerError,
    }
}

/// Parses a fetched page and renders its metrics.
pub fn render_page(station: &str, page: &[u8], zone: &CivilZone) -> MetricsOutcome {
    match parser::parse_html(page, zone, &mut TracingSink) {
        Ok(reading) => MetricsOutcome::Ok(metrics::render_metrics(&reading.with_station_id(station))),
        Err(failure) => {
            info!(station, error = %failure, "ParserError");
            MetricsOutcome::ParserError
        }
    }
}

/// Fetches, parses and renders one station.
pub fn handle_metrics(ctx: &ServiceContext, station: Option<&str>) -> MetricsOutcome {
    let Some(station) = station else {
        info!("bad request: no station id provided");
        return MetricsOutcome::MissingStation;
    };

    let url = hnd::build_station_url(&ctx.base_url, station);
    match hnd::fetch_station_page(&ctx.client, &url) {
        Ok(page) => render_page(station, &page, &ctx.zone),
        Err(e) => {
            error!(station, error = %e, "error while fetching station");
            fetch_outcome(&e)
        }
    }
}

fn metrics_response(outcome: MetricsOutcome) -> HttpResponse {
    let status = outcome.status_code();
    let (body, content_type) = match outcome {
        MetricsOutcome::Ok(text) => (text, metrics::CONTENT_TYPE),
        MetricsOutcome::MissingStation => ("Station ID not provided\n".to_string(), "text/plain"),
        MetricsOutcome::GatewayError => ("GatewayError\n".to_string(), "text/plain"),
        MetricsOutcome::NotFound => ("NotFound\n".to_string(), "text/plain"),
        MetricsOutcome::ServerError => ("ServerError\n".to_string(), "text/plain"),
        MetricsOutcome::ParserError => ("ParserError\n".to_string(), "text/plain"),
    };
    create_response(status, body.into_bytes(), content_type)
}

/// Handle /health endpoint
fn handle_health() -> HttpResponse {
    json_response(
        200,
        serde_json::json!({
            "status": "ok",
            "service": "hnd_service",
            "version": env!("CARGO_PKG_VERSION")
        }),
    )
}

fn handle_not_found() -> HttpResponse {
    json_response(
        404,
        serde_json::json!({
            "error": "Not found",
            "available_endpoints": ["/health", "/metrics?station={station_id}"]
        }),
    )
}

fn handle_request(ctx: &ServiceContext, request: tiny_http::Request) {
    let route = route(request.method(), request.url());
    info!(method = %request.method(), url = request.url(), "request");

    let response = match route {
        Route::Health => handle_health(),
        Route::Metrics { station } => metrics_response(handle_metrics(ctx, station.as_deref())),
        Route::NotFound => handle_not_found(),
    };

    if let Err(e) = request.respond(response) {
        warn!(error = %e, "failed to send response");
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server and serve requests until the listener closes.
pub fn start_endpoint_server(config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ctx = Arc::new(ServiceContext::from_config(config)?);
    let server = tiny_http::Server::http(&config.listen_addr)?;
    let pool = ThreadPool::new(config.workers);

    info!(
        addr = %config.listen_addr,
        timezone = ctx.zone.name(),
        workers = config.workers,
        "HTTP endpoint listening; GET /metrics?station={{station_id}}, GET /health"
    );

    for request in server.incoming_requests() {
        let ctx = Arc::clone(&ctx);
        pool.execute(move || handle_request(&ctx, request));
    }

    pool.join();
    Ok(())
}

fn json_response(status_code: u16, json: serde_json::Value) -> HttpResponse {
    let body = serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string());
    create_response(status_code, body.into_bytes(), "application/json")
}

/// Create HTTP response with the given body and content type
fn create_response(status_code: u16, body: Vec<u8>, content_type: &str) -> HttpResponse {
    let response = tiny_http::Response::from_data(body).with_status_code(tiny_http::StatusCode::from(status_code));
    match tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
