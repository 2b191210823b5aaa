//! Single-page HTTP fetching with bounded retries and backoff.
//!
//! The retry ladder distinguishes server pushback from everything else:
//! 429/503 back off exponentially (capped at 8 s), transport errors and
//! timeouts retry after a flat 1 s, any other non-success status fails
//! immediately. Fetch failures are ordinary [`CertsweepError::Fetch`]
//! values — the engine treats them as "skip this URL".

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use certsweep_shared::{CertsweepError, CrawlConfig, Result};

use crate::extract::PageKind;

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("certsweep/", env!("CARGO_PKG_VERSION"));

/// Delay before retrying after a transport error or timeout.
const TRANSPORT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Backoff cap for 429/503 responses.
const BACKOFF_CAP_SECS: u64 = 8;

/// A successfully fetched page, consumed immediately by the extractor.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects (pre-normalization). May differ from the
    /// requested URL, including in host.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Declared `Content-Type` header value (empty when absent).
    pub content_type: String,
    /// Raw body, bytes for PDFs and text for everything else.
    pub body: PageBody,
}

/// Raw page body in the representation the extractor wants.
#[derive(Debug, Clone)]
pub enum PageBody {
    /// Decoded text body (HTML and any non-PDF type).
    Text(String),
    /// Raw bytes (PDF).
    Bytes(Vec<u8>),
}

/// Build the HTTP client shared by all site crawls.
///
/// One client means one connection pool, which is how cross-site
/// connection pressure is bounded.
pub fn build_client(config: &CrawlConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .connect_timeout(config.connect_timeout)
        .timeout(config.total_timeout)
        .pool_max_idle_per_host(config.pool_size)
        .build()
        .map_err(|e| CertsweepError::config(format!("failed to build HTTP client: {e}")))
}

/// Fetch one URL with bounded retries.
pub async fn fetch_with_retry(client: &Client, url: &Url, config: &CrawlConfig) -> Result<FetchedPage> {
    let mut attempt: u32 = 0;

    loop {
        match client.get(url.as_str()).send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return read_body(url, response).await;
                }

                if status == StatusCode::TOO_MANY_REQUESTS
                    || status == StatusCode::SERVICE_UNAVAILABLE
                {
                    if attempt >= config.max_retries {
                        return Err(CertsweepError::fetch(
                            url.as_str(),
                            format!("HTTP {status} after {attempt} retries"),
                        ));
                    }
                    let delay =
                        Duration::from_secs(2u64.saturating_pow(attempt).min(BACKOFF_CAP_SECS));
                    debug!(%url, %status, attempt, delay_secs = delay.as_secs(), "server busy, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                } else {
                    // Non-retryable status: fail immediately.
                    return Err(CertsweepError::fetch(url.as_str(), format!("HTTP {status}")));
                }
            }
            Err(e) => {
                if attempt >= config.max_retries {
                    warn!(%url, error = %e, "transport retries exhausted");
                    return Err(CertsweepError::fetch(
                        url.as_str(),
                        format!("transport error after {attempt} retries: {e}"),
                    ));
                }
                debug!(%url, error = %e, attempt, "transport error, retrying");
                tokio::time::sleep(TRANSPORT_RETRY_DELAY).await;
                attempt += 1;
            }
        }
    }
}

/// Read the response body, as bytes for PDFs and text otherwise.
async fn read_body(url: &Url, response: reqwest::Response) -> Result<FetchedPage> {
    let status = response.status().as_u16();
    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = if PageKind::classify(&content_type) == PageKind::Pdf {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CertsweepError::fetch(url.as_str(), format!("body read failed: {e}")))?;
        PageBody::Bytes(bytes.to_vec())
    } else {
        let text = response
            .text()
            .await
            .map_err(|e| CertsweepError::fetch(url.as_str(), format!("body read failed: {e}")))?;
        PageBody::Text(text)
    };

    Ok(FetchedPage {
        url: final_url,
        status,
        content_type,
        body,
    })
}
