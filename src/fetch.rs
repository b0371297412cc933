use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use wreq::Client;

use crate::error::{self, FlightError};

pub const BASE_URL: &str = "https://sky-scrapper.p.rapidapi.com/api/v1/flights";
pub const API_HOST: &str = "sky-scrapper.p.rapidapi.com";

#[derive(Clone)]
pub struct FetchOptions {
    pub base_url: String,
    pub api_key: String,
    pub api_host: String,
    pub proxy: Option<String>,
    pub timeout: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_key: String::new(),
            api_host: API_HOST.to_string(),
            proxy: None,
            timeout: 30,
        }
    }
}

impl std::fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOptions")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("api_host", &self.api_host)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP transport for the flight-data API. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct SkyClient {
    client: Client,
    options: FetchOptions,
}

impl std::fmt::Debug for SkyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkyClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SkyClient {
    pub fn new(options: FetchOptions) -> Result<Self, FlightError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(options.timeout));

        if let Some(ref proxy) = options.proxy {
            builder = builder.proxy(wreq::Proxy::all(proxy).map_err(error::from_http_error)?);
        }

        let client = builder.build().map_err(error::from_http_error)?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.options.base_url.trim_end_matches('/'), path)
    }

    /// Issues `GET <base>/<path>?<params>` and returns the decoded JSON body.
    pub async fn fetch_json(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, FlightError> {
        let url = self.endpoint(path);
        debug!(%url, ?params, "upstream request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .header("X-RapidAPI-Key", self.options.api_key.as_str())
            .header("X-RapidAPI-Host", self.options.api_host.as_str())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(error::from_http_error)?;

        let status = response.status().as_u16();
        debug!(%url, status, "upstream response");
        match status {
            200..=299 => {}
            429 => return Err(FlightError::RateLimited),
            _ => return Err(FlightError::HttpStatus(status)),
        }

        let body = response.text().await.map_err(error::from_http_error)?;
        serde_json::from_str(&body).map_err(|e| FlightError::InvalidResponse(e.to_string()))
    }
}
