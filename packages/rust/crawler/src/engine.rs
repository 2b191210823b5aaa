//! Per-site BFS crawl engine.
//!
//! One [`SiteCrawler`] traversal walks a single organization's website
//! breadth-first under depth and page budgets, scanning HTML and PDF pages
//! for certification keywords. Frontier and visited state are local to one
//! call of [`SiteCrawler::crawl`]; concurrency across sites lives in the
//! orchestrator, which hands every crawler the same pooled client.

use std::collections::{HashSet, VecDeque};

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use certsweep_shared::{CrawlConfig, KeywordTable, Result, SiteOutcome};

use crate::extract::{self, PageKind};
use crate::fetcher::{self, PageBody};
use crate::matcher;
use crate::urlnorm;

/// Crawls one site at a time within depth/page budgets.
pub struct SiteCrawler {
    client: Client,
    keywords: KeywordTable,
    config: CrawlConfig,
}

impl SiteCrawler {
    /// Create a crawler with its own HTTP client.
    pub fn new(keywords: KeywordTable, config: CrawlConfig) -> Result<Self> {
        let client = fetcher::build_client(&config)?;
        Ok(Self::with_client(client, keywords, config))
    }

    /// Create a crawler on a shared client (the orchestrator's pooled one).
    pub fn with_client(client: Client, keywords: KeywordTable, config: CrawlConfig) -> Self {
        Self {
            client,
            keywords,
            config,
        }
    }

    /// Crawl one site starting from `seed`.
    ///
    /// Infallible by contract: an invalid seed, an unreachable server, or
    /// any per-page failure degrades to fewer findings, never an error.
    #[instrument(skip_all, fields(seed = %seed))]
    pub async fn crawl(&self, seed: &str) -> SiteOutcome {
        let seed_url = match urlnorm::validate(seed) {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "seed rejected, skipping site");
                return SiteOutcome::default();
            }
        };

        let mut outcome = SiteOutcome::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<(Url, u32)> = VecDeque::new();
        frontier.push_back((seed_url.clone(), 0));

        while outcome.pages_fetched < self.config.page_limit {
            let Some((url, depth)) = frontier.pop_front() else {
                break;
            };

            if depth > self.config.max_depth {
                continue;
            }
            let normalized = urlnorm::normalize(&url);
            if visited.contains(&normalized) {
                continue;
            }
            if !urlnorm::same_site(&seed_url, &url) {
                debug!(%url, "out of scope, skipping");
                continue;
            }
            visited.insert(normalized.clone());

            // Politeness: rate-limit consecutive requests to the same site.
            if !self.config.politeness_delay.is_zero() {
                tokio::time::sleep(self.config.politeness_delay).await;
            }

            let page = match fetcher::fetch_with_retry(&self.client, &url, &self.config).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(%url, error = %e, "fetch failed, skipping URL");
                    continue;
                }
            };
            outcome.pages_fetched += 1;

            // Redirects can land anywhere; re-check scope on the final URL.
            if !urlnorm::same_site(&seed_url, &page.url) {
                debug!(%url, final_url = %page.url, "redirected off-site, not scanned");
                continue;
            }

            let kind = PageKind::classify(&page.content_type);
            let text = match (kind, &page.body) {
                (PageKind::Html, PageBody::Text(html)) => Some(extract::html_to_text(html)),
                (PageKind::Pdf, PageBody::Bytes(bytes)) => {
                    match extract::pdf_to_text(
                        bytes,
                        self.config.pdf_max_bytes,
                        self.config.pdf_max_pages,
                    ) {
                        Ok(text) => Some(text),
                        Err(e) => {
                            warn!(%url, error = %e, "PDF not scanned");
                            None
                        }
                    }
                }
                // Unscannable type: counted against the page limit but
                // neither scanned nor expanded.
                _ => None,
            };

            if let Some(text) = &text {
                for matched in matcher::match_keywords(text, &self.keywords) {
                    debug!(%url, kind = %matched, "keyword match");
                    outcome.findings.insert(matched, normalized.clone());
                }
            }

            if kind == PageKind::Html && depth < self.config.max_depth {
                if let PageBody::Text(html) = &page.body {
                    for link in extract::extract_links(html, &url) {
                        if !visited.contains(&urlnorm::normalize(&link)) {
                            frontier.push_back((link, depth + 1));
                        }
                    }
                }
            }
        }

        info!(
            pages_fetched = outcome.pages_fetched,
            evidence = outcome.findings.evidence_count(),
            "site crawl complete"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certsweep_shared::CertKind;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            politeness_delay: Duration::ZERO,
            max_retries: 0,
            ..CrawlConfig::default()
        }
    }

    fn crawler(config: CrawlConfig) -> SiteCrawler {
        SiteCrawler::new(KeywordTable::builtin(), config).expect("crawler")
    }

    async fn mount_html(server: &MockServer, at: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn invalid_seed_yields_empty_outcome() {
        let outcome = crawler(test_config()).crawl("ftp://nope").await;
        assert_eq!(outcome.pages_fetched, 0);
        assert!(outcome.findings.is_empty());
    }

    #[tokio::test]
    async fn finds_keyword_on_seed_page() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            "<html><body><p>Certified by the Aquaculture Stewardship Council.</p></body></html>",
        )
        .await;

        let outcome = crawler(test_config()).crawl(&server.uri()).await;

        assert_eq!(outcome.pages_fetched, 1);
        let asc = outcome.findings.urls(CertKind::Asc).expect("asc evidence");
        assert_eq!(asc.len(), 1);
        assert!(outcome.findings.urls(CertKind::Bap).is_none());
    }

    #[tokio::test]
    async fn follows_links_and_records_normalized_urls() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            r#"<html><body><a href="/Certs/index.html">certs</a></body></html>"#,
        )
        .await;
        mount_html(
            &server,
            "/Certs/index.html",
            "<html><body>Best Aquaculture Practices certified.</body></html>",
        )
        .await;

        let outcome = crawler(test_config()).crawl(&server.uri()).await;

        assert_eq!(outcome.pages_fetched, 2);
        let bap = outcome.findings.urls(CertKind::Bap).expect("bap evidence");
        let evidence = bap.iter().next().unwrap();
        // normalized: lowercased path, index segment stripped
        assert_eq!(evidence, &format!("{}/certs", server.uri()));
    }

    #[tokio::test]
    async fn respects_depth_bound() {
        let server = MockServer::start().await;
        mount_html(&server, "/", r#"<html><a href="/d1">1</a></html>"#).await;
        mount_html(&server, "/d1", r#"<html><a href="/d2">2</a></html>"#).await;
        mount_html(&server, "/d2", r#"<html><a href="/d3">3</a></html>"#).await;
        mount_html(&server, "/d3", "<html>too deep</html>").await;

        let config = CrawlConfig {
            max_depth: 2,
            ..test_config()
        };
        let outcome = crawler(config).crawl(&server.uri()).await;

        // seed (0) + d1 (1) + d2 (2); d3 would be depth 3
        assert_eq!(outcome.pages_fetched, 3);
    }

    #[tokio::test]
    async fn cycles_fetched_once() {
        let server = MockServer::start().await;
        mount_html(&server, "/", r#"<html><a href="/loop">go</a></html>"#).await;
        mount_html(&server, "/loop", r#"<html><a href="/">back</a></html>"#).await;

        let outcome = crawler(test_config()).crawl(&server.uri()).await;
        assert_eq!(outcome.pages_fetched, 2);
    }

    #[tokio::test]
    async fn page_limit_is_a_hard_stop() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            r#"<html><a href="/a">a</a><a href="/b">b</a><a href="/c">c</a></html>"#,
        )
        .await;
        for p in ["/a", "/b", "/c"] {
            mount_html(&server, p, "<html>leaf</html>").await;
        }

        let config = CrawlConfig {
            page_limit: 2,
            ..test_config()
        };
        let outcome = crawler(config).crawl(&server.uri()).await;
        assert_eq!(outcome.pages_fetched, 2);
    }

    #[tokio::test]
    async fn off_site_links_not_followed() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            r#"<html><a href="http://other.invalid/page">external</a></html>"#,
        )
        .await;

        let outcome = crawler(test_config()).crawl(&server.uri()).await;
        // only the seed is in scope; the external link is skipped unfetched
        assert_eq!(outcome.pages_fetched, 1);
    }

    #[tokio::test]
    async fn off_site_redirect_not_scanned() {
        let server = MockServer::start().await;
        // seed is 127.0.0.1; the redirect lands on a different host string
        // pointing at the same listener
        let elsewhere = format!("http://localhost:{}/asc", server.address().port());
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", elsewhere))
            .mount(&server)
            .await;
        mount_html(&server, "/asc", "<html>Aquaculture Stewardship Council</html>").await;

        let outcome = crawler(test_config()).crawl(&server.uri()).await;

        // fetched through the redirect, but the final host is out of scope
        // for this seed so the content is never scanned
        assert_eq!(outcome.pages_fetched, 1);
        assert!(outcome.findings.is_empty());
    }

    #[tokio::test]
    async fn unscannable_content_type_counts_but_stops_there() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    r#"<html><a href="/next">ASC</a></html>"#,
                    "application/octet-stream",
                ),
            )
            .mount(&server)
            .await;
        mount_html(&server, "/next", "<html>ASC</html>").await;

        let outcome = crawler(test_config()).crawl(&server.uri()).await;

        // fetched but neither scanned nor expanded
        assert_eq!(outcome.pages_fetched, 1);
        assert!(outcome.findings.is_empty());
    }

    #[tokio::test]
    async fn oversized_pdf_skipped_by_cap() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            r#"<html><a href="/report.pdf">annual report</a></html>"#,
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/report.pdf"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0u8; 64 * 1024], "application/pdf"),
            )
            .mount(&server)
            .await;

        let config = CrawlConfig {
            pdf_max_bytes: 32 * 1024,
            ..test_config()
        };
        let outcome = crawler(config).crawl(&server.uri()).await;

        // the PDF is fetched and counted but never scanned
        assert_eq!(outcome.pages_fetched, 2);
        assert!(outcome.findings.urls(CertKind::Bap).is_none());
    }

    #[tokio::test]
    async fn persistent_rate_limiting_yields_empty_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let config = CrawlConfig {
            max_retries: 1,
            ..test_config()
        };
        let outcome = crawler(config).crawl(&server.uri()).await;

        assert_eq!(outcome.pages_fetched, 0);
        assert!(outcome.findings.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_does_not_stop_traversal() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            r#"<html><a href="/missing">x</a><a href="/good">y</a></html>"#,
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_html(&server, "/good", "<html>Friend of the Sea</html>").await;

        let outcome = crawler(test_config()).crawl(&server.uri()).await;

        assert_eq!(outcome.pages_fetched, 2);
        assert!(outcome.findings.urls(CertKind::Fos).is_some());
    }
}
