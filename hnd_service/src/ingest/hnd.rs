/// HND (Hochwassernachrichtendienst Bayern) station page client.
///
/// Retrieves the mobile gauge page for one station:
///   https://m.hnd.bayern.de/pegel.php?pgnr={station}
///
/// The service answers unknown station numbers with HTTP 200 and an empty
/// body, so an empty page is reported as `StationNotFound`.

use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const HND_BASE_URL: &str = "https://m.hnd.bayern.de/pegel.php";

const USER_AGENT: &str = concat!("hnd_service/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to HND failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("expected HTTP 200 from HND, got {0}")]
    UnexpectedStatus(u16),

    #[error("empty page returned, station probably invalid")]
    StationNotFound,
}

/// Builds the blocking HTTP client used for all page requests.
pub fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Builds the page URL for `station_id` under `base_url`.
///
/// # Example
/// ```
/// use hnd_service::ingest::hnd::{build_station_url, HND_BASE_URL};
///
/// let url = build_station_url(HND_BASE_URL, "16005701");
/// assert_eq!(url, "https://m.hnd.bayern.de/pegel.php?pgnr=16005701");
/// ```
pub fn build_station_url(base_url: &str, station_id: &str) -> String {
    format!("{}?pgnr={}", base_url, urlencoding::encode(station_id))
}

/// Fetches the raw page bytes.
pub fn fetch_station_page(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    debug!(url, "fetching station page");

    let response = client.get(url).send()?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(FetchError::UnexpectedStatus(status.as_u16()));
    }

    let body = response.bytes()?;
    check_body(body.to_vec())
}

fn check_body(body: Vec<u8>) -> Result<Vec<u8>, FetchError> {
    if body.is_empty() {
        return Err(FetchError::StationNotFound);
    }
    Ok(body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
