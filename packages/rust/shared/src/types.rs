//! Core domain types for certsweep crawls.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CertKind
// ---------------------------------------------------------------------------

/// A third-party certification scheme searched for during crawls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CertKind {
    /// Aquaculture Stewardship Council.
    Asc,
    /// Best Aquaculture Practices.
    Bap,
    /// Friend of the Sea.
    Fos,
    /// Fisheries Improvement Project.
    Fip,
    /// MarinTrust.
    MarinTrust,
}

impl CertKind {
    /// All certification kinds, in CSV column order.
    pub const ALL: [CertKind; 5] = [
        CertKind::Asc,
        CertKind::Bap,
        CertKind::Fos,
        CertKind::Fip,
        CertKind::MarinTrust,
    ];

    /// The CSV column header holding this kind's evidence URLs.
    pub fn column(&self) -> &'static str {
        match self {
            CertKind::Asc => "ASC Cert",
            CertKind::Bap => "BAP Cert",
            CertKind::Fos => "FOS Cert",
            CertKind::Fip => "FIP Cert",
            CertKind::MarinTrust => "MarinTrust Cert",
        }
    }

    /// Resolve a CSV column header back to a kind.
    pub fn from_column(header: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.column() == header)
    }

    /// Short identifier used in config keys and log fields.
    pub fn key(&self) -> &'static str {
        match self {
            CertKind::Asc => "asc",
            CertKind::Bap => "bap",
            CertKind::Fos => "fos",
            CertKind::Fip => "fip",
            CertKind::MarinTrust => "marintrust",
        }
    }
}

impl std::fmt::Display for CertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// KeywordTable
// ---------------------------------------------------------------------------

/// Immutable mapping from certification kind to its search keywords.
///
/// Keywords are stored lowercased; matching is case-insensitive substring
/// search over already-lowercased page text. The table is threaded through
/// the crawler explicitly rather than living in a global.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<(CertKind, Vec<String>)>,
}

impl KeywordTable {
    /// The built-in keyword sets.
    pub fn builtin() -> Self {
        let entries = vec![
            (
                CertKind::Asc,
                vec!["ASC", "A.S.C.", "Aquaculture Stewardship Council"],
            ),
            (
                CertKind::Bap,
                vec!["BAP", "Best Aquaculture Practices", "Global Seafood Alliance"],
            ),
            (
                CertKind::Fos,
                vec![
                    "Friend of the Sea",
                    "FOS",
                    "WSO",
                    "World Sustainability Organization",
                ],
            ),
            (CertKind::Fip, vec!["FIP", "Fisheries Improvement Project"]),
            (CertKind::MarinTrust, vec!["Marin Trust"]),
        ];

        Self::from_entries(
            entries
                .into_iter()
                .map(|(k, words)| (k, words.into_iter().map(String::from).collect())),
        )
    }

    /// Build a table from explicit per-kind keyword lists, lowercasing each
    /// keyword. Kinds with an empty list are kept (they simply never match).
    pub fn from_entries(entries: impl IntoIterator<Item = (CertKind, Vec<String>)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(kind, words)| (kind, words.iter().map(|w| w.to_lowercase()).collect()))
            .collect();
        Self { entries }
    }

    /// Replace the keyword list for one kind (config overrides).
    pub fn override_kind(&mut self, kind: CertKind, words: Vec<String>) {
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = lowered,
            None => self.entries.push((kind, lowered)),
        }
    }

    /// Iterate `(kind, keywords)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (CertKind, &[String])> {
        self.entries.iter().map(|(k, words)| (*k, words.as_slice()))
    }

    /// Keywords registered for one kind.
    pub fn keywords(&self, kind: CertKind) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, words)| words.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// SiteFindings / SiteOutcome
// ---------------------------------------------------------------------------

/// Evidence collected from one site: per-kind sets of normalized URLs.
///
/// BTree containers keep the sets deduplicated and in the stable sorted
/// order the CSV serialization requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteFindings {
    by_kind: BTreeMap<CertKind, BTreeSet<String>>,
}

impl SiteFindings {
    /// Empty findings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a normalized evidence URL for one certification kind.
    pub fn insert(&mut self, kind: CertKind, url: impl Into<String>) {
        self.by_kind.entry(kind).or_default().insert(url.into());
    }

    /// Union another findings set into this one.
    pub fn merge(&mut self, other: &SiteFindings) {
        for (kind, urls) in &other.by_kind {
            self.by_kind
                .entry(*kind)
                .or_default()
                .extend(urls.iter().cloned());
        }
    }

    /// Evidence URLs for one kind, sorted.
    pub fn urls(&self, kind: CertKind) -> Option<&BTreeSet<String>> {
        self.by_kind.get(&kind)
    }

    /// Iterate `(kind, urls)` in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (CertKind, &BTreeSet<String>)> {
        self.by_kind.iter().map(|(k, v)| (*k, v))
    }

    /// True when no evidence was found for any kind.
    pub fn is_empty(&self) -> bool {
        self.by_kind.values().all(BTreeSet::is_empty)
    }

    /// Total number of evidence URLs across all kinds.
    pub fn evidence_count(&self) -> usize {
        self.by_kind.values().map(BTreeSet::len).sum()
    }
}

/// Result of crawling one site: findings plus traversal accounting.
#[derive(Debug, Clone, Default)]
pub struct SiteOutcome {
    /// Per-kind evidence URLs.
    pub findings: SiteFindings,
    /// Pages successfully fetched (bounded by the page limit).
    pub pages_fetched: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cert_kind_column_roundtrip() {
        for kind in CertKind::ALL {
            assert_eq!(CertKind::from_column(kind.column()), Some(kind));
        }
        assert_eq!(CertKind::from_column("Company website"), None);
    }

    #[test]
    fn builtin_table_is_lowercased() {
        let table = KeywordTable::builtin();
        let asc = table.keywords(CertKind::Asc);
        assert!(asc.contains(&"aquaculture stewardship council".to_string()));
        assert!(asc.iter().all(|w| w == &w.to_lowercase()));
        assert_eq!(table.iter().count(), 5);
    }

    #[test]
    fn override_replaces_keywords() {
        let mut table = KeywordTable::builtin();
        table.override_kind(CertKind::Fip, vec!["Fishery Project".into()]);
        assert_eq!(table.keywords(CertKind::Fip), ["fishery project"]);
    }

    #[test]
    fn findings_merge_is_idempotent() {
        let mut a = SiteFindings::new();
        a.insert(CertKind::Asc, "http://x.com/a");

        let mut b = SiteFindings::new();
        b.insert(CertKind::Asc, "http://x.com/b");
        b.insert(CertKind::Bap, "http://x.com/c");

        a.merge(&b);
        let once = a.clone();
        a.merge(&b);
        assert_eq!(a, once);
        assert_eq!(a.evidence_count(), 3);
        assert_eq!(
            a.urls(CertKind::Asc)
                .unwrap()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
            ["http://x.com/a", "http://x.com/b"]
        );
    }
}
