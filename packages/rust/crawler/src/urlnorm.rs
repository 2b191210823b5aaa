//! URL validation, normalization, and same-site scoping.
//!
//! Two URLs are "the same page" for dedup purposes iff their [`normalize`]d
//! forms are equal. Validation is fallible and callers skip rejected items;
//! normalization never fails and degrades to the input serialization.

use url::Url;

use certsweep_shared::{CertsweepError, Result};

/// Query parameters stripped during normalization.
const TRACKING_PARAMS: [&str; 5] = ["utm_source", "utm_medium", "utm_campaign", "fbclid", "gclid"];

/// Index-page segments stripped from the end of a path.
const INDEX_SEGMENTS: [&str; 3] = ["/index.html", "/index.php", "/index.asp"];

/// Validate a raw website string into a crawlable URL.
///
/// Prepends `http://` when no scheme is present, then requires a parseable
/// http(s) URL with a host.
pub fn validate(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CertsweepError::invalid_url(raw));
    }

    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let url = Url::parse(&candidate).map_err(|_| CertsweepError::invalid_url(raw))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(CertsweepError::invalid_url(raw)),
    }
    if url.host_str().is_none() {
        return Err(CertsweepError::invalid_url(raw));
    }

    Ok(url)
}

/// Normalize a URL to its canonical dedup form.
///
/// Lowercases host and path, drops the fragment, strips tracking query
/// parameters, strips a trailing `index.html|php|asp` segment, and strips a
/// single trailing slash unless the path is root. Never fails: on any
/// internal error the input serialization is returned unchanged, so callers
/// must tolerate non-canonical output.
pub fn normalize(url: &Url) -> String {
    try_normalize(url).unwrap_or_else(|| url.as_str().to_string())
}

fn try_normalize(url: &Url) -> Option<String> {
    let mut out = url.clone();
    out.set_fragment(None);

    let host = out.host_str()?.to_lowercase();
    out.set_host(Some(&host)).ok()?;

    let kept: Vec<(String, String)> = out
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        out.set_query(None);
    } else {
        out.query_pairs_mut().clear().extend_pairs(&kept);
    }

    let mut path = out.path().to_lowercase();
    for segment in INDEX_SEGMENTS {
        if let Some(stripped) = path.strip_suffix(segment) {
            path = if stripped.is_empty() {
                "/".to_string()
            } else {
                stripped.to_string()
            };
            break;
        }
    }
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    out.set_path(&path);

    Some(out.to_string())
}

/// Same-site scoping: the candidate host must equal the seed host or be a
/// subdomain of it (dot-boundary suffix match, so `notexample.com` is not
/// in scope for `example.com`).
pub fn same_site(seed: &Url, candidate: &Url) -> bool {
    if !matches!(candidate.scheme(), "http" | "https") {
        return false;
    }
    let (Some(seed_host), Some(host)) = (seed.host_str(), candidate.host_str()) else {
        return false;
    };
    let seed_host = seed_host.to_lowercase();
    let host = host.to_lowercase();
    host == seed_host || host.ends_with(&format!(".{seed_host}"))
}
