//! HTTP fetch gateway
//!
//! Builds the shared HTTP client and turns each request into either a fetched
//! page body or a typed [`FetchError`]. Transient failures (timeouts, 5xx)
//! get one internal retry; everything else fails fast and the engine drops
//! the task without aborting the crawl.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Typed fetch failure, never fatal to the crawl as a whole
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("malformed document from {url}: {message}")]
    Parse { url: String, message: String },
}

/// A successfully fetched page
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects; link resolution and context threading use
    /// this, not the requested URL
    pub final_url: Url,

    /// Raw HTML body
    pub body: String,
}

/// Builds the HTTP client shared by all fetches
///
/// # Arguments
///
/// * `user_agent` - User agent header value for every request
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page, retrying once on timeout or 5xx
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `url` - The URL to fetch
///
/// # Returns
///
/// * `Ok(FetchedPage)` - 2xx response with a readable body
/// * `Err(FetchError)` - Classified failure after retries are exhausted
pub async fn fetch_page(client: &Client, url: &Url) -> Result<FetchedPage, FetchError> {
    match fetch_once(client, url).await {
        Err(e) if is_transient(&e) => {
            tracing::debug!("Transient failure for {}, retrying once: {}", url, e);
            tokio::time::sleep(Duration::from_secs(1)).await;
            fetch_once(client, url).await
        }
        other => other,
    }
}

fn is_transient(error: &FetchError) -> bool {
    match error {
        FetchError::Timeout { .. } => true,
        FetchError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}

async fn fetch_once(client: &Client, url: &Url) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_request_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();

    let body = response.text().await.map_err(|e| FetchError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(FetchedPage { final_url, body })
}

fn classify_request_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
