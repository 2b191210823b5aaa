//! Format-aware text and link extraction from fetched page bodies.
//!
//! Extraction prepares pages for keyword scanning: markup stripped,
//! whitespace collapsed, everything lowercased. Failures here are never
//! fatal to a traversal — the engine treats a failed extraction as a page
//! with no text.

use scraper::{Html, Node, Selector};
use tracing::debug;
use url::Url;

use certsweep_shared::{CertsweepError, Result};

/// What a page's declared content-type says about its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// HTML page: scanned for keywords and expanded for links.
    Html,
    /// PDF document: scanned for keywords, never expanded.
    Pdf,
    /// Anything else: fetched (counts toward the page limit) but not
    /// scanned or expanded.
    Other,
}

impl PageKind {
    /// Classify a `Content-Type` header value, ignoring parameters.
    pub fn classify(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if mime.starts_with("text/html") || mime == "application/xhtml+xml" {
            PageKind::Html
        } else if mime == "application/pdf" {
            PageKind::Pdf
        } else {
            PageKind::Other
        }
    }
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

/// Extract scannable plain text from an HTML document.
///
/// Walks the DOM skipping `script`/`style`/`noscript` subtrees, then
/// collapses whitespace and lowercases.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(doc.tree.root(), &mut raw);
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn collect_text(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    if let Node::Element(el) = node.value() {
        if matches!(el.name(), "script" | "style" | "noscript") {
            return;
        }
    }
    if let Node::Text(text) = node.value() {
        out.push(' ');
        out.push_str(&text.text);
        return;
    }
    for child in node.children() {
        collect_text(child, out);
    }
}

/// Extract all hyperlinks from an HTML document, resolved against the page
/// URL with fragments stripped. Anchor-only, `javascript:`, and `mailto:`
/// hrefs are ignored.
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").expect("static selector");
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        if let Some(href) = el.value().attr("href") {
            if href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
            {
                continue;
            }

            if let Ok(mut resolved) = base_url.join(href) {
                resolved.set_fragment(None);
                links.push(resolved);
            }
        }
    }

    links
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

/// Extract scannable plain text from a PDF body.
///
/// Bodies over `max_bytes` are rejected outright; otherwise at most the
/// first `max_pages` pages are read, and a page whose extraction fails is
/// skipped rather than aborting the document.
pub fn pdf_to_text(bytes: &[u8], max_bytes: usize, max_pages: usize) -> Result<String> {
    if bytes.len() > max_bytes {
        return Err(CertsweepError::Extraction(format!(
            "PDF body of {} bytes exceeds the {max_bytes} byte cap",
            bytes.len()
        )));
    }

    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| CertsweepError::Extraction(format!("invalid PDF: {e}")))?;

    let mut text = String::new();
    for (page_no, _) in doc.get_pages().into_iter().take(max_pages) {
        match doc.extract_text(&[page_no]) {
            Ok(page_text) => {
                text.push(' ');
                text.push_str(&page_text);
            }
            Err(e) => {
                debug!(page = page_no, error = %e, "skipping unreadable PDF page");
            }
        }
    }

    Ok(text.to_lowercase())
}
