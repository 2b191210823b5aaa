//! Site crawling and certification-keyword scanning.
//!
//! This crate provides:
//! - [`urlnorm`] — URL validation, normalization, and same-site scoping
//! - [`extract`] — HTML/PDF text and link extraction
//! - [`matcher`] — keyword matching against the certification table
//! - [`fetcher`] — single-page fetching with bounded retries
//! - [`engine`] — the per-site BFS crawler tying the above together

pub mod engine;
pub mod extract;
pub mod fetcher;
pub mod matcher;
pub mod urlnorm;

pub use engine::SiteCrawler;
pub use extract::PageKind;
pub use fetcher::{FetchedPage, PageBody, build_client, fetch_with_retry};
pub use matcher::match_keywords;
pub use urlnorm::{normalize, same_site, validate};
