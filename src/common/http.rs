//! Blocking HTTP plumbing shared by the exchange clients

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use std::cell::Cell;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{ExchangeError, ExchangeResult};

/// Request timeout for every exchange client
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default delay between consecutive requests to one exchange (ms)
pub const REQUEST_DELAY_MS: u64 = 100;

/// Build the blocking HTTP client used by the exchange clients
pub fn build_client() -> ExchangeResult<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Send a request and return the body, mapping non-2xx responses to errors
pub fn send(request: RequestBuilder) -> ExchangeResult<String> {
    let response = request.send()?;
    let status = response.status();
    let body = response.text()?;

    if !status.is_success() {
        return Err(ExchangeError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Build `base + path` with url-encoded query parameters
pub fn endpoint_url(base: &str, path: &str, params: &[(&str, String)]) -> ExchangeResult<Url> {
    let mut url = Url::parse(&format!("{}{}", base, path))
        .map_err(|e| ExchangeError::Parse(format!("Invalid URL {}{}: {}", base, path, e)))?;
    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}

/// Minimum spacing between requests from one client
#[derive(Debug)]
pub struct RequestPacer {
    interval: Duration,
    last_request: Cell<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Cell::new(None),
        }
    }

    /// Block until `interval` has passed since the previous request
    pub fn wait(&self) {
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let remaining = self.interval - elapsed;
                debug!("Pacing request for {}ms", remaining.as_millis());
                sleep(remaining);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(REQUEST_DELAY_MS))
    }
}
